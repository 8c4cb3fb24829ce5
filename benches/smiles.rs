use criterion::{black_box, criterion_group, criterion_main, Criterion};

use smilecrab::code::decompile;
use smilecrab::smiles::{parse, to_smiles};

const METHANE: &str = "C";
const CAFFEINE: &str = "Cn1cnc2c1c(=O)n(C)c(=O)n2C";
const ANTHRACENE: &str = "c1ccc2cc3ccccc3cc2c1";
const ATORVASTATIN: &str =
    "CC(C)c1c(C(=O)Nc2ccccc2)c(-c2ccccc2)c(-c2ccc(F)cc2)n1CC[C@@H](O)C[C@@H](O)CC(=O)O";
const TAXOL: &str = "CC1=C2[C@@]([C@]([C@H]([C@@H]3[C@]4([C@H](OC4)C[C@@H]([C@]3(C(=O)[C@@H]2OC(=O)C)C)O)OC(=O)C)OC(=O)c5ccccc5)(C[C@@H]1OC(=O)[C@@H](O)[C@@H](NC(=O)c6ccccc6)c7ccccc7)O)(C)C";

const INPUTS: [(&str, &str); 5] = [
    ("methane", METHANE),
    ("caffeine", CAFFEINE),
    ("anthracene", ANTHRACENE),
    ("atorvastatin", ATORVASTATIN),
    ("taxol", TAXOL),
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, smiles) in INPUTS {
        group.bench_function(name, |b| b.iter(|| black_box(parse(black_box(smiles)).unwrap())));
    }
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    for (name, smiles) in INPUTS {
        let node = parse(smiles).unwrap();
        group.bench_function(name, |b| b.iter(|| black_box(to_smiles(black_box(&node)))));
    }
    group.finish();
}

fn bench_decompile(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompile");
    for (name, smiles) in INPUTS {
        let node = parse(smiles).unwrap();
        group.bench_function(name, |b| b.iter(|| black_box(decompile(black_box(&node)))));
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_write, bench_decompile);
criterion_main!(benches);

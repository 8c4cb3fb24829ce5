use smilecrab::{
    attach, concat, decompile, evaluate, fuse, parse, substitute, to_smiles, Atom, Linear, Node,
    Ring,
};

const CORPUS: &[&str] = &[
    "CCO",
    "CC(=O)O",
    "c1ccccc1",
    "c1ccncc1",
    "Cc1ccccc1",
    "c1ccc2ccccc2c1",
    "c1ccc2cc3ccccc3cc2c1",
    "CC(C)Cc1ccc(cc1)C(C)C(=O)O",
    "OCC1OC(O)C(O)C(O)C1O",
    "[NH4+].[Cl-]",
];

/// Text of `node` with each main-line position in turn replaced by `*`.
fn marked_texts(node: &Node) -> Vec<String> {
    (0..node.position_count())
        .map(|pos| to_smiles(&substitute(node, pos, Atom::bare("*")).unwrap()).unwrap())
        .collect()
}

#[test]
fn parse_then_write_is_identity() {
    for s in CORPUS {
        let node = parse(s).unwrap();
        assert_eq!(to_smiles(&node).unwrap(), *s);
    }
}

#[test]
fn attach_inserts_branch_text_only() {
    let frag = parse("C(F)(F)F").unwrap();
    let frag_text = format!("({})", to_smiles(&frag).unwrap());
    for s in CORPUS {
        let node = parse(s).unwrap();
        let before = to_smiles(&node).unwrap();
        for pos in 0..node.position_count() {
            let after = to_smiles(&attach(&node, &frag, pos).unwrap()).unwrap();
            assert_eq!(after.len(), before.len() + frag_text.len(), "{s} @ {pos}");
            let at = (0..=before.len())
                .find(|&i| after[..i] == before[..i] && after[i..].starts_with(&frag_text))
                .filter(|&i| after[i + frag_text.len()..] == before[i..]);
            assert!(at.is_some(), "{s} @ {pos}: {after}");
        }
    }
}

#[test]
fn substitute_touches_one_position() {
    for s in CORPUS {
        let node = parse(s).unwrap();
        let original = to_smiles(&node).unwrap();
        let marked = marked_texts(&node);
        for (pos, text) in marked.iter().enumerate() {
            let star = text.find('*').unwrap();
            let (head, tail) = (&text[..star], &text[star + 1..]);
            assert!(original.starts_with(head) && original.ends_with(tail), "{s} @ {pos}: {text}");
            let replaced = &original[head.len()..original.len() - tail.len()];
            assert!(replaced.parse::<Atom>().is_ok(), "{s} @ {pos}: {replaced:?}");
        }
        let mut distinct = marked.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), marked.len(), "{s}");
    }
}

#[test]
fn fused_atom_count() {
    let a = Ring::new(Atom::bare("c"), 6, 1);
    let b = Ring::new(Atom::bare("c"), 6, 1);
    for offset in 0..a.size {
        let fused = fuse(&Node::from(a.clone()), &b, offset).unwrap();
        let shared = 2;
        assert_eq!(fused.position_count(), a.size + b.size - shared);
        let mol = Node::from(fused).to_mol().unwrap();
        assert_eq!(mol.atom_count(), 10);
        assert_eq!(mol.ring_count(), 2);
    }
}

#[test]
fn concat_associates() {
    let parts: Vec<Node> = CORPUS.iter().map(|s| parse(s).unwrap()).collect();
    for a in &parts {
        for b in &parts[..4] {
            for c in &parts[4..] {
                let left = concat(&concat(a, b).into(), c);
                let right = concat(a, &concat(b, c).into());
                assert_eq!(left.components, right.components);
                assert_eq!(left.bonds, right.bonds);
            }
        }
    }
}

#[test]
fn decompiled_code_rebuilds_tree() {
    for s in CORPUS {
        let node = parse(s).unwrap();
        let code = decompile(&node).unwrap();
        assert_eq!(evaluate(&code).unwrap(), node, "{code}");
    }
}

#[test]
fn attach_scenario() {
    let ring = Node::from(Ring::new(Atom::bare("c"), 6, 1));
    let methyl = Node::from(Linear::new(vec![Atom::bare("C")]));
    let out = to_smiles(&attach(&ring, &methyl, 1).unwrap()).unwrap();
    assert_eq!(out, "c1c(C)cccc1");
}

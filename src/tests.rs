use crate::*;

#[test]
fn mol_add_atoms_and_bonds() {
    let mut mol = Mol::new();
    let c = mol.add_atom(Atom::bare("C"));
    let o = mol.add_atom(Atom::bare("O"));
    let bond_idx = mol.add_bond(c, o, Bond::Double);

    assert_eq!(mol.atom_count(), 2);
    assert_eq!(mol.bond_count(), 1);
    assert_eq!(mol.atom(c).symbol, "C");
    assert_eq!(mol.atom(o).symbol, "O");
    assert_eq!(mol.bond(bond_idx), Bond::Double);
}

#[test]
fn mol_neighbors_and_bonds_of() {
    let mol = parse("CC(C)C").unwrap().to_mol().unwrap();
    let center = petgraph::graph::NodeIndex::new(1);

    let neighbors: Vec<_> = mol.neighbors(center).collect();
    assert_eq!(neighbors.len(), 3);

    let incident: Vec<_> = mol.bonds_of(center).collect();
    assert_eq!(incident.len(), 3);
}

#[test]
fn mol_bond_between_and_endpoints() {
    let mol = parse("C=CO").unwrap().to_mol().unwrap();
    let atoms: Vec<_> = mol.atoms().collect();
    let e = mol.bond_between(atoms[0], atoms[1]).unwrap();

    assert_eq!(mol.bond(e), Bond::Double);
    assert_eq!(mol.bond_between(atoms[0], atoms[2]), None);

    let (src, dst) = mol.bond_endpoints(e).unwrap();
    assert!((src == atoms[0] && dst == atoms[1]) || (src == atoms[1] && dst == atoms[0]));
}

#[test]
fn build_toluene_three_ways() {
    let parsed = parse("Cc1ccccc1").unwrap();

    let benzene = Node::from(Ring::new(Atom::bare("c"), 6, 1));
    let methyl = Node::from(Linear::new(vec![Atom::bare("C")]));
    let joined = concat(&methyl, &benzene);
    assert_eq!(Node::from(joined), parsed);

    let attached = attach(&benzene, &methyl, 0).unwrap();
    assert_eq!(to_smiles(&attached).unwrap(), "c1(C)ccccc1");
    assert_eq!(attached.to_mol().unwrap().atom_count(), 7);

    let from_code = evaluate(&decompile(&parsed).unwrap()).unwrap();
    assert_eq!(from_code, parsed);
}

#[test]
fn fused_system_from_fragments() {
    let phenyl = fragment("phenyl").unwrap();
    let Node::Ring(ring) = &phenyl else {
        panic!("phenyl should be a ring");
    };
    let naphthalene = fuse(&phenyl, ring, 3).unwrap();
    let text = to_smiles(&naphthalene.clone().into()).unwrap();
    assert_eq!(text, "c1ccc2ccccc2c1");
    assert_eq!(parse(&text).unwrap(), Node::from(naphthalene));
}

#[test]
fn substitute_then_attach() {
    let pyridine = substitute(&fragment("phenyl").unwrap(), 3, Atom::bare("n")).unwrap();
    let chloro = fragment("chloro").unwrap();
    let out = attach(&pyridine, &chloro, 1).unwrap();
    assert_eq!(to_smiles(&out).unwrap(), "c1c(Cl)cncc1");
    assert!(is_valid_round_trip("c1c(Cl)cncc1"));
}

#[test]
fn ast_json_round_trip() {
    for s in ["CC(=O)O", "c1ccc2ccccc2c1", "c1ccc(cc1)C", "[Na+].[Cl-]", "C=1CCCCC=1"] {
        let node = parse(s).unwrap();
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node, "{s}: {json}");
    }
}

#[test]
fn errors_convert_to_crate_error() {
    let e: Error = parse("C(").unwrap_err().into();
    assert!(matches!(e, Error::Smiles(SmilesError::MismatchedParen { .. })));
    assert!(e.to_string().starts_with("parse error"));

    let e: Error = attach(&parse("C").unwrap(), &parse("O").unwrap(), 3)
        .unwrap_err()
        .into();
    assert!(matches!(e, Error::Transform(TransformError::InvalidPosition { .. })));
}

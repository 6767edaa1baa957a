use asprov::{Atom, Term, analyze, decode_model};

#[test]
fn decodes_answer_set_of_reified_program() {
    let analysis = analyze("c(1). c(2). b(X) :- c(X), not a(X). d :- b(1).").expect("analysis");
    let h = &analysis.names.provenance;
    let model = format!("c(1) c(2) b(1) b(2) d {h}(1,b(1),(c(1),)) {h}(1,b(2),(c(2),)) {h}(2,d,(b(1),))");

    let derivations = decode_model(h, &model).expect("decode");
    assert_eq!(derivations.len(), 3);
    let d = &derivations["d"][0];
    assert_eq!(d.rule_nr, 2);
    assert_eq!(d.support, vec![Atom::new("b", vec![Term::Number(1)])]);
    assert_eq!(d.to_string(), "d <- [2] b(1)");
}

#[test]
fn several_derivations_of_one_atom_are_grouped() {
    let derivations =
        decode_model("h", "h(1,a,(b,)) h(2,a,(c,)) h(1,a,(b,))").expect("decode");
    assert_eq!(derivations["a"].len(), 2);
    assert_eq!(derivations["a"][0].rule_nr, 1);
    assert_eq!(derivations["a"][1].rule_nr, 2);
}

#[test]
fn classically_negated_atoms_decode() {
    let derivations = decode_model("h", "h(1,-a(1),(b,))").expect("decode");
    assert!(derivations["-a(1)"][0].atom.classical);
}

#[test]
fn other_predicates_are_ignored() {
    let derivations = decode_model("h_", "h(1,a,(b,)) a b").expect("decode");
    assert!(derivations.is_empty());
}

#[test]
fn malformed_provenance_atoms_are_reported() {
    let errors = decode_model("h", "h(x,a,(b,)) h(1,2,(b,))").expect_err("malformed");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|d| d.code == "E-PROVENANCE"));
}

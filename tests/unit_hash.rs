mod support;

use asprov::hash::rule_digest;
use asprov::{DependencyGraph, Transformation, hash_rules, hash_sequence, sequence};
use support::{rule, rules};

#[test]
fn hashing_is_idempotent() {
    let group = rules("a :- b, not c. b :- a.");
    assert_eq!(hash_rules(&group), hash_rules(&group));
}

#[test]
fn digest_is_lowercase_sha256_hex() {
    let digest = rule_digest(&rule("a :- b."));
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn changing_one_literal_changes_the_hash() {
    let before = hash_rules(&rules("a :- b, not c. b :- a."));
    let after = hash_rules(&rules("a :- b, c. b :- a."));
    assert_ne!(before, after);
}

#[test]
fn formatting_and_variable_names_do_not_matter() {
    assert_eq!(
        hash_rules(&rules("p(X,Y):-q(X),r(Y).")),
        hash_rules(&rules("p(A, B) :-\n    q(A),\n    r(B).")),
    );
}

#[test]
fn variable_sharing_matters() {
    assert_ne!(
        hash_rules(&rules("p(X) :- q(X).")),
        hash_rules(&rules("p(X) :- q(Y).")),
    );
}

#[test]
fn group_hash_ignores_rule_order_and_id() {
    let a = Transformation::new(1, rules("a :- b. b :- a."), true);
    let b = Transformation::new(9, rules("b :- a. a :- b."), true);
    assert_eq!(a.hash, b.hash);
}

#[test]
fn sequence_hash_depends_on_order() {
    let transformations = sequence(&DependencyGraph::build(&rules("c :- b. b :- a.")));
    let mut reversed = transformations.clone();
    reversed.reverse();
    assert_ne!(hash_sequence(&transformations), hash_sequence(&reversed));
}

#[test]
fn transformation_hash_matches_group_hash() {
    let t = Transformation::new(1, rules("a :- b."), false);
    assert_eq!(asprov::hash_transformation(&t), t.hash);
    assert_eq!(t.hash, hash_rules(&[rule("a :- b.")]));
}

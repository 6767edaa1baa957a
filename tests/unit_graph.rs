mod support;

use asprov::{DependencyGraph, sequence};
use support::{rule, rules};

#[test]
fn facts_are_not_nodes() {
    let graph = DependencyGraph::build(&rules("a. b :- a. c."));
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.rule(0), Some(&rule("b :- a.")));
}

#[test]
fn repeated_rules_are_one_node() {
    let graph = DependencyGraph::build(&rules("a. b :- a. c :- b. b :- a."));
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.edge_count(), 1);

    let transformations = sequence(&graph);
    assert_eq!(transformations.len(), 2);
    assert_eq!(transformations[0].rules, vec![rule("b :- a.")]);
    assert_eq!(transformations[1].rules, vec![rule("c :- b.")]);
}

#[test]
fn unknown_indices_are_absent() {
    let graph = DependencyGraph::build(&rules("c :- b. b :- a."));
    assert_eq!(graph.rule(5), None);
    assert!(!graph.has_edge(9, 0));
    assert!(!graph.has_edge(0, 9));
    assert_eq!(graph.successors(9).count(), 0);
}

#[test]
fn edges_follow_head_to_body() {
    let graph = DependencyGraph::build(&rules("c :- b. b :- a."));
    assert!(graph.has_edge(1, 0));
    assert!(!graph.has_edge(0, 1));
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn negative_body_literals_create_edges() {
    let graph = DependencyGraph::build(&rules("b :- not c. c :- d."));
    assert!(graph.has_edge(1, 0));
}

#[test]
fn signatures_must_match_on_arity() {
    let graph = DependencyGraph::build(&rules("p(X) :- q(X). r :- p."));
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn self_loops_are_kept() {
    let graph = DependencyGraph::build(&rules("p(X) :- p(X), q(X)."));
    assert!(graph.has_self_loop(0));
    assert!(graph.is_recursive(&[0]));
}

#[test]
fn choice_and_condition_atoms_take_part() {
    let graph = DependencyGraph::build(&rules("{ p(X) : q(X) } :- r. q(1) :- s. t :- p(1)."));
    assert!(graph.has_edge(1, 0));
    assert!(graph.has_edge(0, 2));
}

#[test]
fn tarjan_finds_mutual_recursion() {
    let graph = DependencyGraph::build(&rules(
        "a :- b. b :- a. c :- b. d :- c, d. e :- x.",
    ));
    let mut components = graph.strongly_connected_components();
    components.sort();
    assert_eq!(components, vec![vec![0, 1], vec![2], vec![3], vec![4]]);
    assert!(graph.is_recursive(&[0, 1]));
    assert!(!graph.is_recursive(&[2]));
    assert!(graph.is_recursive(&[3]));
}

#[test]
fn tarjan_handles_long_chains_without_recursion() {
    let mut src = String::new();
    for i in 1..=2000 {
        src.push_str(&format!("p{i} :- p{}.\n", i - 1));
    }
    let graph = DependencyGraph::build(&rules(&src));
    assert_eq!(graph.strongly_connected_components().len(), 2000);
}

#[test]
fn chain_is_sequenced_in_dependency_order() {
    let graph = DependencyGraph::build(&rules("c :- b. b :- a. a."));
    let transformations = sequence(&graph);
    assert_eq!(transformations.len(), 2);
    assert_eq!(transformations[0].id, 1);
    assert_eq!(transformations[0].rules, vec![rule("b :- a.")]);
    assert_eq!(transformations[1].id, 2);
    assert_eq!(transformations[1].rules, vec![rule("c :- b.")]);
}

#[test]
fn negative_cycle_is_one_transformation() {
    let graph = DependencyGraph::build(&rules("a. b :- not c, a. c :- not b, a."));
    let transformations = sequence(&graph);
    assert_eq!(transformations.len(), 1);
    assert_eq!(transformations[0].rules.len(), 2);
    assert!(transformations[0].recursive);
}

#[test]
fn independent_groups_keep_source_order() {
    let graph = DependencyGraph::build(&rules("z :- y. x :- w. v :- u."));
    let heads: Vec<String> = sequence(&graph)
        .iter()
        .map(|t| t.rules[0].to_string())
        .collect();
    assert_eq!(heads, vec!["z :- y.", "x :- w.", "v :- u."]);
}

#[test]
fn dependencies_win_over_source_order() {
    let graph = DependencyGraph::build(&rules("d :- c. x :- w. c :- b, x."));
    let heads: Vec<String> = sequence(&graph)
        .iter()
        .map(|t| t.rules[0].to_string())
        .collect();
    assert_eq!(heads, vec!["x :- w.", "c :- b; x.", "d :- c."]);
}

#[test]
fn transformation_equality_ignores_rule_order() {
    let forward = sequence(&DependencyGraph::build(&rules("a :- b. b :- a.")));
    let backward = sequence(&DependencyGraph::build(&rules("b :- a. a :- b.")));
    assert_eq!(forward, backward);
    assert_eq!(forward[0].hash, backward[0].hash);
}

#[test]
fn classified_input_keeps_only_supported_rules() {
    let program = asprov::parse_program("a. b :- a. x ; y. #minimize { 1 : b }. c :- b.")
        .expect("parse should succeed");
    let classified: Vec<_> = program.statements.iter().map(asprov::classify).collect();
    let graph = DependencyGraph::from_classified(&classified);
    assert_eq!(graph.len(), 2);
    assert!(graph.has_edge(0, 1));
}

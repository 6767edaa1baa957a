mod support;

use asprov::ast::StatementKind;
use asprov::{ReservedNames, transform, transform_source};
use support::{assert_rules_eq, rule};

fn reify(src: &str) -> Vec<asprov::Rule> {
    transform(&rule(src), 1, &ReservedNames::default())
}

#[test]
fn facts_pass_through_unchanged() {
    assert_eq!(reify("a."), vec![rule("a.")]);
}

#[test]
fn normal_rule_gets_provenance_head() {
    assert_rules_eq(
        &reify("b(X) :- c(X)."),
        "h(1, b(X), (c(X),)) :- b(X), c(X).",
    );
}

#[test]
fn negated_literals_stay_in_body_but_not_in_tuple() {
    assert_rules_eq(
        &reify("b(X) :- c(X), not a(X)."),
        "h(1, b(X), (c(X),)) :- b(X), c(X); not a(X).",
    );
}

#[test]
fn comparisons_are_not_support() {
    assert_rules_eq(
        &reify("b(X) :- c(X), X > 1."),
        "h(1, b(X), (c(X),)) :- b(X), c(X), X > 1.",
    );
}

#[test]
fn repeated_support_is_listed_once() {
    assert_rules_eq(&reify("b :- c, c."), "h(1, b, (c,)) :- b, c, c.");
}

#[test]
fn tuple_follows_body_order() {
    assert_rules_eq(
        &reify("l(x(X), y(Y)) :- x(X), y(Y)."),
        "h(1, l(x(X), y(Y)), (x(X), y(Y))) :- l(x(X), y(Y)), x(X), y(Y).",
    );
    assert_rules_eq(
        &reify("reached(V) :- reached(U), hc(U, V), edge(U, V)."),
        "h(1, reached(V), (reached(U), hc(U, V), edge(U, V))) :- reached(V), reached(U), hc(U, V), edge(U, V).",
    );
}

#[test]
fn rule_number_is_taken_from_caller() {
    let out = transform(&rule("b :- c."), 7, &ReservedNames::default());
    assert_rules_eq(&out, "h(7, b, (c,)) :- b, c.");
}

#[test]
fn provenance_name_is_taken_from_reserved_names() {
    let names = ReservedNames {
        provenance: "h__".to_string(),
        model: "model".to_string(),
    };
    let out = transform(&rule("b :- c."), 1, &names);
    assert_rules_eq(&out, "h__(1, b, (c,)) :- b, c.");
}

#[test]
fn constraints_are_forwarded() {
    assert_eq!(reify(":- a, not b."), vec![rule(":- a, not b.")]);
}

#[test]
fn disjunctive_rule_is_reified_per_disjunct() {
    assert_rules_eq(
        &reify("a ; b :- c."),
        "h(1, a, (c,)) :- a, c. h(1, b, (c,)) :- b, c.",
    );
}

#[test]
fn choice_elements_carry_their_condition() {
    assert_rules_eq(
        &reify("{ p(X) : q(X) } :- r."),
        "h(1, p(X), (r, q(X))) :- p(X), r, q(X).",
    );
}

#[test]
fn bodiless_choice_has_empty_tuple() {
    assert_rules_eq(
        &reify("{ a; b }."),
        "h(1, a, ()) :- a. h(1, b, ()) :- b.",
    );
}

#[test]
fn head_aggregate_elements_are_reified() {
    assert_rules_eq(
        &reify("#count { X : p(X) : q(X) } = 1 :- r."),
        "h(1, p(X), (r, q(X))) :- p(X), r, q(X).",
    );
}

#[test]
fn body_aggregate_condition_is_hoisted_with_fresh_variables() {
    assert_rules_eq(
        &reify("a :- #count { X : b(X) } > 1."),
        "h(1, a, (b(_X),)) :- a, #count { X : b(X) } > 1, b(_X).",
    );
}

#[test]
fn each_aggregate_element_gets_its_own_rule() {
    assert_rules_eq(
        &reify("a :- #count { X : b(X); Y : c(Y) } > 0."),
        r#"
            h(1, a, (b(_X),)) :- a, #count { X : b(X); Y : c(Y) } > 0, b(_X).
            h(1, a, (c(_Y),)) :- a, #count { X : b(X); Y : c(Y) } > 0, c(_Y).
        "#,
    );
}

#[test]
fn shared_variables_are_not_renamed() {
    assert_rules_eq(
        &reify("a(X) :- d(X), #count { X : b(X) } > 1."),
        "h(1, a(X), (d(X), b(X))) :- a(X), d(X), #count { X : b(X) } > 1, b(X).",
    );
}

#[test]
fn fresh_names_avoid_existing_variables() {
    assert_rules_eq(
        &reify("a(_X) :- d(_X), #count { X : b(X) } > 1."),
        "h(1, a(_X), (d(_X), b(__X))) :- a(_X), d(_X), #count { X : b(X) } > 1, b(__X).",
    );
}

#[test]
fn negated_aggregates_are_not_hoisted() {
    assert_rules_eq(
        &reify("a :- d, not #count { X : b(X) } > 1."),
        "h(1, a, (d,)) :- a, d, not #count { X : b(X) } > 1.",
    );
}

#[test]
fn transform_source_picks_free_name_for_the_program() {
    let statements = transform_source("h(1, 2). b :- h(1, 2).").expect("transform");
    let heads: Vec<String> = statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::Rule(rule) => Some(rule.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(heads.len(), 2);
    assert_eq!(heads[0], "h(1,2).");
    assert!(heads[1].starts_with("h_(1,b,(h(1,2),))"), "{heads:?}");
}

#[test]
fn transform_source_reports_parse_errors() {
    let errors = transform_source("b :- ").expect_err("should fail");
    assert!(errors.iter().any(|d| d.code == "E-PARSE"));
}

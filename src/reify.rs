//! Provenance rewriting.
//!
//! A rule `A :- B1, ..., Bn.` becomes `h(N, A, (P1, ..., Pk)) :- A, B1, ..., Bn.`
//! where the `Pi` are the positive atoms among the body literals. The
//! instrumented rules are meant to be grounded together with the atoms of an
//! answer set, so `A` in the body restricts them to derived atoms.
//!
//! Tuple order is part of the output format: the `Pi` follow body order,
//! hoisted aggregate literals take the aggregate's place, and a head
//! element's condition comes last. Repeated atoms keep their first position.
//! `l(x(X), y(Y)) :- x(X), y(Y).` yields the tuple `(x(X), y(Y))`, never
//! `(y(Y), x(X))`. Readers of `h/3` may rely on this order.

use std::collections::HashSet;

use crate::ast::{BodyLiteral, Head, Rule, Statement, StatementKind};
use crate::config::AnalyzerConfig;
use crate::diagnostics::Diagnostic;
use crate::naming::{NamingContext, ReservedNames, SignatureRegistry};
use crate::parser::parse_program;
use crate::types::{Atom, Literal, Sign, Term};

/// Instruments one rule. Facts and constraints come back unchanged.
pub fn transform(rule: &Rule, rule_nr: usize, names: &ReservedNames) -> Vec<Rule> {
    if rule.is_fact() || matches!(rule.head, Head::Empty) {
        return vec![rule.clone()];
    }

    let groups = head_groups(rule);
    let bodies = hoisted_bodies(rule);
    let mut out = Vec::with_capacity(groups.len() * bodies.len());
    for (atom, condition) in &groups {
        for body in &bodies {
            out.push(instrument(rule_nr, names, atom, body, condition));
        }
    }
    out
}

/// Parses `src` and instruments every rule with rule number 1, using names
/// that are conflict-free for that program. Other statements pass through.
pub fn transform_source(src: &str) -> Result<Vec<Statement>, Vec<Diagnostic>> {
    let program = parse_program(src)?;
    let config = AnalyzerConfig::default();
    let mut naming = NamingContext::new(
        SignatureRegistry::from_program(&program),
        config.max_suffix_depth,
    );
    let names = ReservedNames::resolve(&mut naming, &config.provenance_name, &config.model_name)
        .map_err(|err| vec![Diagnostic::from(err)])?;

    let mut out = Vec::new();
    for statement in &program.statements {
        match &statement.kind {
            StatementKind::Rule(rule) => out.extend(
                transform(rule, 1, &names)
                    .into_iter()
                    .map(|r| Statement::new(StatementKind::Rule(r), None)),
            ),
            _ => out.push(statement.clone()),
        }
    }
    Ok(out)
}

/// One derivable head atom per disjunct or element, with its own condition.
fn head_groups(rule: &Rule) -> Vec<(Atom, Vec<Literal>)> {
    match &rule.head {
        Head::Empty => Vec::new(),
        Head::Atom(atom) => vec![(atom.clone(), Vec::new())],
        Head::Disjunction(elements) => elements
            .iter()
            .filter_map(|e| e.literal.atom().map(|a| (a.clone(), e.condition.clone())))
            .collect(),
        Head::Choice(choice) => choice
            .elements
            .iter()
            .filter_map(|e| e.literal.atom().map(|a| (a.clone(), e.condition.clone())))
            .collect(),
        Head::Aggregate(agg) => agg
            .elements
            .iter()
            .filter_map(|e| {
                e.literal
                    .literal
                    .atom()
                    .map(|a| (a.clone(), e.literal.condition.clone()))
            })
            .collect(),
    }
}

/// The rule body once per combination of hoisted aggregate elements.
///
/// Each non-negated body aggregate keeps its place verbatim and is followed by
/// the literals of one of its elements, with element-local variables renamed
/// apart from everything else in the rule.
fn hoisted_bodies(rule: &Rule) -> Vec<Vec<BodyLiteral>> {
    let mut used: HashSet<String> = rule.variables().into_iter().collect();
    let mut bodies: Vec<Vec<BodyLiteral>> = vec![Vec::new()];

    for (idx, lit) in rule.body.iter().enumerate() {
        for body in &mut bodies {
            body.push(lit.clone());
        }

        let options: Vec<Vec<Literal>> = match lit {
            BodyLiteral::SetAggregate {
                sign: Sign::Positive,
                aggregate,
            } => aggregate
                .elements
                .iter()
                .map(|e| {
                    let mut lits = vec![e.literal.clone()];
                    lits.extend(e.condition.iter().cloned());
                    lits
                })
                .collect(),
            BodyLiteral::Aggregate {
                sign: Sign::Positive,
                aggregate,
            } => aggregate
                .elements
                .iter()
                .map(|e| e.condition.clone())
                .collect(),
            _ => continue,
        };
        if options.iter().all(Vec::is_empty) {
            continue;
        }

        let outside = variables_outside(rule, idx);
        let mut renamed: Vec<Vec<Literal>> = Vec::with_capacity(options.len());
        for lits in options {
            let lits = rename_locals(&lits, &outside, &mut used);
            if !renamed.contains(&lits) {
                renamed.push(lits);
            }
        }
        let options = renamed;

        let mut next = Vec::with_capacity(bodies.len() * options.len());
        for body in &bodies {
            for option in &options {
                let mut extended = body.clone();
                extended.extend(option.iter().cloned().map(BodyLiteral::Literal));
                next.push(extended);
            }
        }
        bodies = next;
    }

    bodies
}

/// Variables of the rule outside the elements of body literal `idx`.
fn variables_outside(rule: &Rule, idx: usize) -> HashSet<String> {
    let mut rest = rule.clone();
    let removed = rest.body.remove(idx);
    let mut outside: HashSet<String> = rest.variables().into_iter().collect();
    let guards = match &removed {
        BodyLiteral::SetAggregate { aggregate, .. } => [&aggregate.left, &aggregate.right],
        BodyLiteral::Aggregate { aggregate, .. } => [&aggregate.left, &aggregate.right],
        _ => return outside,
    };
    for guard in guards.into_iter().flatten() {
        guard.term.visit_vars(&mut |v| {
            outside.insert(v.to_string());
        });
    }
    outside
}

fn rename_locals(
    lits: &[Literal],
    outside: &HashSet<String>,
    used: &mut HashSet<String>,
) -> Vec<Literal> {
    let mut renames: Vec<(String, String)> = Vec::new();
    lits.iter()
        .map(|lit| {
            lit.map_vars(&mut |v| {
                if outside.contains(v) {
                    return v.to_string();
                }
                if let Some((_, fresh)) = renames.iter().find(|(old, _)| old == v) {
                    return fresh.clone();
                }
                let fresh = fresh_variable(v, used);
                renames.push((v.to_string(), fresh.clone()));
                fresh
            })
        })
        .collect()
}

fn fresh_variable(name: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = format!("_{name}");
    while used.contains(&candidate) {
        candidate.insert(0, '_');
    }
    used.insert(candidate.clone());
    candidate
}

fn instrument(
    rule_nr: usize,
    names: &ReservedNames,
    atom: &Atom,
    body: &[BodyLiteral],
    condition: &[Literal],
) -> Rule {
    let mut new_body = Vec::with_capacity(1 + body.len() + condition.len());
    new_body.push(BodyLiteral::Literal(Literal::positive(atom.clone())));
    new_body.extend(body.iter().cloned());
    new_body.extend(condition.iter().cloned().map(BodyLiteral::Literal));

    let mut seen = HashSet::new();
    let mut support = Vec::new();
    for lit in &new_body[1..] {
        if let BodyLiteral::Literal(lit) = lit {
            if let Some(positive) = lit.positive_atom() {
                let term = positive.to_term();
                if seen.insert(term.to_string()) {
                    support.push(term);
                }
            }
        }
    }

    let nr = Term::Number(i64::try_from(rule_nr).unwrap_or(i64::MAX));
    let head = Atom::new(
        names.provenance.clone(),
        vec![nr, atom.to_term(), Term::Tuple(support)],
    );
    Rule::new(Head::Atom(head), new_body)
}

//! Rule classification over a closed set of statement shapes.
//!
//! What is supported lives in two fixed tables. A shape listed in neither is
//! rejected as unknown, so a grammar addition cannot slip through unclassified.

use std::fmt;

use serde::Serialize;

use crate::ast::{Head, OptimizeKind, Statement, StatementKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailedReason {
    Warning,
    Failure,
}

impl fmt::Display for FailedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedReason::Warning => write!(f, "WARNING"),
            FailedReason::Failure => write!(f, "FAILURE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Fact,
    NormalRule,
    Constraint,
    ChoiceRule,
    HeadAggregateRule,
    DisjunctiveRule,
    DisjunctiveFact,
    Minimize,
    Maximize,
    WeakConstraint,
    Show,
    Const,
    ProgramDirective,
    External,
    UnknownDirective,
}

impl Shape {
    pub const ALL: [Shape; 15] = [
        Shape::Fact,
        Shape::NormalRule,
        Shape::Constraint,
        Shape::ChoiceRule,
        Shape::HeadAggregateRule,
        Shape::DisjunctiveRule,
        Shape::DisjunctiveFact,
        Shape::Minimize,
        Shape::Maximize,
        Shape::WeakConstraint,
        Shape::Show,
        Shape::Const,
        Shape::ProgramDirective,
        Shape::External,
        Shape::UnknownDirective,
    ];

    pub fn of(statement: &Statement) -> Shape {
        match &statement.kind {
            StatementKind::Rule(rule) => match (&rule.head, rule.body.is_empty()) {
                (Head::Atom(_), true) => Shape::Fact,
                (Head::Atom(_), false) => Shape::NormalRule,
                (Head::Empty, _) => Shape::Constraint,
                (Head::Choice(_), _) => Shape::ChoiceRule,
                (Head::Aggregate(_), _) => Shape::HeadAggregateRule,
                (Head::Disjunction(_), false) => Shape::DisjunctiveRule,
                (Head::Disjunction(_), true) => Shape::DisjunctiveFact,
            },
            StatementKind::Optimize {
                kind: OptimizeKind::Minimize,
                ..
            } => Shape::Minimize,
            StatementKind::Optimize {
                kind: OptimizeKind::Maximize,
                ..
            } => Shape::Maximize,
            StatementKind::WeakConstraint { .. } => Shape::WeakConstraint,
            StatementKind::ShowAll
            | StatementKind::ShowSignature(_)
            | StatementKind::ShowTerm { .. } => Shape::Show,
            StatementKind::Const { .. } => Shape::Const,
            StatementKind::Program { .. } => Shape::ProgramDirective,
            StatementKind::External { .. } => Shape::External,
            StatementKind::Directive { .. } => Shape::UnknownDirective,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Shape::Fact => "fact",
            Shape::NormalRule => "normal rule",
            Shape::Constraint => "integrity constraint",
            Shape::ChoiceRule => "choice rule",
            Shape::HeadAggregateRule => "head aggregate rule",
            Shape::DisjunctiveRule => "disjunctive rule",
            Shape::DisjunctiveFact => "disjunctive fact",
            Shape::Minimize => "minimize statement",
            Shape::Maximize => "maximize statement",
            Shape::WeakConstraint => "weak constraint",
            Shape::Show => "show statement",
            Shape::Const => "constant definition",
            Shape::ProgramDirective => "program directive",
            Shape::External => "external declaration",
            Shape::UnknownDirective => "unknown directive",
        }
    }
}

pub const SUPPORTED_SHAPES: &[Shape] = &[
    Shape::Fact,
    Shape::NormalRule,
    Shape::Constraint,
    Shape::ChoiceRule,
    Shape::HeadAggregateRule,
    // TODO: disjunctive heads are reified per disjunct, which over-reports
    // support when a single model picks one disjunct; needs minimality checks.
    Shape::DisjunctiveRule,
];

pub const UNSUPPORTED_SHAPES: &[(Shape, FailedReason)] = &[
    (Shape::DisjunctiveFact, FailedReason::Failure),
    (Shape::Minimize, FailedReason::Warning),
    (Shape::Maximize, FailedReason::Warning),
    (Shape::WeakConstraint, FailedReason::Warning),
    (Shape::Show, FailedReason::Warning),
    (Shape::Const, FailedReason::Warning),
    (Shape::ProgramDirective, FailedReason::Warning),
    (Shape::External, FailedReason::Warning),
    (Shape::UnknownDirective, FailedReason::Failure),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Supported,
    Unsupported(FailedReason),
}

pub fn support_of(shape: Shape) -> Classification {
    if SUPPORTED_SHAPES.contains(&shape) {
        return Classification::Supported;
    }
    UNSUPPORTED_SHAPES
        .iter()
        .find(|(s, _)| *s == shape)
        .map(|(_, reason)| Classification::Unsupported(*reason))
        .unwrap_or(Classification::Unsupported(FailedReason::Failure))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedStatement {
    pub statement: Statement,
    pub shape: Shape,
    pub classification: Classification,
}

impl ClassifiedStatement {
    pub fn reason(&self) -> Option<FailedReason> {
        match self.classification {
            Classification::Supported => None,
            Classification::Unsupported(reason) => Some(reason),
        }
    }
}

pub fn classify(statement: &Statement) -> ClassifiedStatement {
    let shape = Shape::of(statement);
    ClassifiedStatement {
        statement: statement.clone(),
        shape,
        classification: support_of(shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_tables_are_disjoint_and_exhaustive() {
        for shape in Shape::ALL {
            let supported = SUPPORTED_SHAPES.contains(&shape);
            let unsupported = UNSUPPORTED_SHAPES.iter().filter(|(s, _)| *s == shape).count();
            assert!(
                supported ^ (unsupported == 1),
                "{shape:?} must appear in exactly one table"
            );
        }
        assert_eq!(
            SUPPORTED_SHAPES.len() + UNSUPPORTED_SHAPES.len(),
            Shape::ALL.len()
        );
    }
}

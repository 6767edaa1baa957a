use std::collections::HashSet;
use std::fmt;

use crate::diagnostics::Span;
use crate::types::{Atom, CompOp, Literal, Sign, Signature, Term, write_joined};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.statements.iter().filter_map(Statement::rule)
    }
}

/// A parsed statement. Identity is structural: the span is carried for
/// diagnostics only and is ignored by equality and hashing.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Option<Span>,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Option<Span>) -> Self {
        Self { kind, span }
    }

    pub fn rule(&self) -> Option<&Rule> {
        match &self.kind {
            StatementKind::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn visit_atoms<F: FnMut(&Atom)>(&self, f: &mut F) {
        match &self.kind {
            StatementKind::Rule(rule) => rule.visit_atoms(f),
            StatementKind::Optimize { elements, .. } => {
                for element in elements {
                    visit_literal_atoms(&element.condition, f);
                }
            }
            StatementKind::WeakConstraint { body, .. }
            | StatementKind::ShowTerm { body, .. } => {
                for lit in body {
                    lit.visit_atoms(f);
                }
            }
            StatementKind::External { atom, body } => {
                f(atom);
                for lit in body {
                    lit.visit_atoms(f);
                }
            }
            StatementKind::ShowAll
            | StatementKind::ShowSignature(_)
            | StatementKind::Const { .. }
            | StatementKind::Program { .. }
            | StatementKind::Directive { .. } => {}
        }
    }

    /// Every predicate signature the statement mentions.
    pub fn signatures(&self) -> Vec<Signature> {
        let mut out = Vec::new();
        if let StatementKind::ShowSignature(sig) = &self.kind {
            out.push(sig.clone());
        }
        self.visit_atoms(&mut |atom| out.push(atom.signature()));
        out
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Statement {}

impl std::hash::Hash for Statement {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Rule(Rule),
    Optimize {
        kind: OptimizeKind,
        elements: Vec<OptimizeElement>,
    },
    WeakConstraint {
        body: Vec<BodyLiteral>,
        weight: Term,
        priority: Option<Term>,
        terms: Vec<Term>,
    },
    ShowAll,
    ShowSignature(Signature),
    ShowTerm {
        term: Term,
        body: Vec<BodyLiteral>,
    },
    Const {
        name: String,
        value: Term,
    },
    Program {
        name: String,
        params: Vec<String>,
    },
    External {
        atom: Atom,
        body: Vec<BodyLiteral>,
    },
    /// A `#directive` outside the known fragment, kept as raw text.
    Directive {
        name: String,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptimizeKind {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptimizeElement {
    pub weight: Term,
    pub priority: Option<Term>,
    pub terms: Vec<Term>,
    pub condition: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rule {
    pub head: Head,
    pub body: Vec<BodyLiteral>,
}

impl Rule {
    pub fn new(head: Head, body: Vec<BodyLiteral>) -> Self {
        Self { head, body }
    }

    pub fn is_fact(&self) -> bool {
        matches!(self.head, Head::Atom(_)) && self.body.is_empty()
    }

    /// Atoms the head may derive.
    pub fn head_atoms(&self) -> Vec<&Atom> {
        match &self.head {
            Head::Empty => Vec::new(),
            Head::Atom(atom) => vec![atom],
            Head::Disjunction(elements) => elements
                .iter()
                .filter_map(|e| e.literal.atom())
                .collect(),
            Head::Choice(choice) => choice
                .elements
                .iter()
                .filter_map(|e| e.literal.atom())
                .collect(),
            Head::Aggregate(agg) => agg
                .elements
                .iter()
                .filter_map(|e| e.literal.literal.atom())
                .collect(),
        }
    }

    pub fn head_signatures(&self) -> Vec<Signature> {
        let mut out: Vec<Signature> = Vec::new();
        for atom in self.head_atoms() {
            let sig = atom.signature();
            if !out.contains(&sig) {
                out.push(sig);
            }
        }
        out
    }

    /// Signatures the rule requires, including the conditions of head elements.
    pub fn body_signatures(&self) -> Vec<Signature> {
        let mut out: Vec<Signature> = Vec::new();
        let mut push = |atom: &Atom| {
            let sig = atom.signature();
            if !out.contains(&sig) {
                out.push(sig);
            }
        };
        match &self.head {
            Head::Empty | Head::Atom(_) => {}
            Head::Disjunction(elements) | Head::Choice(SetAggregate { elements, .. }) => {
                for element in elements {
                    visit_literal_atoms(&element.condition, &mut push);
                }
            }
            Head::Aggregate(agg) => {
                for element in &agg.elements {
                    visit_literal_atoms(&element.literal.condition, &mut push);
                }
            }
        }
        for lit in &self.body {
            lit.visit_atoms(&mut push);
        }
        out
    }

    pub fn visit_atoms<F: FnMut(&Atom)>(&self, f: &mut F) {
        self.head.visit_atoms(f);
        for lit in &self.body {
            lit.visit_atoms(f);
        }
    }

    /// Visits variables in printing order.
    pub fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        self.head.visit_vars(f);
        for lit in &self.body {
            lit.visit_vars(f);
        }
    }

    pub fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> Rule {
        let head = self.head.map_vars(f);
        let body = self.body.iter().map(|lit| lit.map_vars(f)).collect();
        Rule { head, body }
    }

    /// Distinct variable names in first-occurrence order.
    pub fn variables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.visit_vars(&mut |v| {
            if seen.insert(v.to_string()) {
                out.push(v.to_string());
            }
        });
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Head {
    Empty,
    Atom(Atom),
    Disjunction(Vec<ConditionalLiteral>),
    Choice(SetAggregate),
    Aggregate(HeadAggregate),
}

impl Head {
    fn visit_atoms<F: FnMut(&Atom)>(&self, f: &mut F) {
        match self {
            Head::Empty => {}
            Head::Atom(atom) => f(atom),
            Head::Disjunction(elements) => {
                for element in elements {
                    element.visit_atoms(f);
                }
            }
            Head::Choice(choice) => choice.visit_atoms(f),
            Head::Aggregate(agg) => {
                for element in &agg.elements {
                    element.literal.visit_atoms(f);
                }
            }
        }
    }

    fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        match self {
            Head::Empty => {}
            Head::Atom(atom) => atom.visit_vars(f),
            Head::Disjunction(elements) => {
                for element in elements {
                    element.visit_vars(f);
                }
            }
            Head::Choice(choice) => choice.visit_vars(f),
            Head::Aggregate(agg) => agg.visit_vars(f),
        }
    }

    fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> Head {
        match self {
            Head::Empty => Head::Empty,
            Head::Atom(atom) => Head::Atom(atom.map_vars(f)),
            Head::Disjunction(elements) => {
                Head::Disjunction(elements.iter().map(|e| e.map_vars(f)).collect())
            }
            Head::Choice(choice) => Head::Choice(choice.map_vars(f)),
            Head::Aggregate(agg) => Head::Aggregate(agg.map_vars(f)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyLiteral {
    Literal(Literal),
    Conditional(ConditionalLiteral),
    SetAggregate { sign: Sign, aggregate: SetAggregate },
    Aggregate { sign: Sign, aggregate: BodyAggregate },
}

impl BodyLiteral {
    pub fn visit_atoms<F: FnMut(&Atom)>(&self, f: &mut F) {
        match self {
            BodyLiteral::Literal(lit) => {
                if let Some(atom) = lit.atom() {
                    f(atom);
                }
            }
            BodyLiteral::Conditional(cond) => cond.visit_atoms(f),
            BodyLiteral::SetAggregate { aggregate, .. } => aggregate.visit_atoms(f),
            BodyLiteral::Aggregate { aggregate, .. } => {
                for element in &aggregate.elements {
                    visit_literal_atoms(&element.condition, f);
                }
            }
        }
    }

    pub fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        match self {
            BodyLiteral::Literal(lit) => lit.visit_vars(f),
            BodyLiteral::Conditional(cond) => cond.visit_vars(f),
            BodyLiteral::SetAggregate { aggregate, .. } => aggregate.visit_vars(f),
            BodyLiteral::Aggregate { aggregate, .. } => aggregate.visit_vars(f),
        }
    }

    pub fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> BodyLiteral {
        match self {
            BodyLiteral::Literal(lit) => BodyLiteral::Literal(lit.map_vars(f)),
            BodyLiteral::Conditional(cond) => BodyLiteral::Conditional(cond.map_vars(f)),
            BodyLiteral::SetAggregate { sign, aggregate } => BodyLiteral::SetAggregate {
                sign: *sign,
                aggregate: aggregate.map_vars(f),
            },
            BodyLiteral::Aggregate { sign, aggregate } => BodyLiteral::Aggregate {
                sign: *sign,
                aggregate: aggregate.map_vars(f),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionalLiteral {
    pub literal: Literal,
    pub condition: Vec<Literal>,
}

impl ConditionalLiteral {
    pub fn plain(literal: Literal) -> Self {
        Self {
            literal,
            condition: Vec::new(),
        }
    }

    fn visit_atoms<F: FnMut(&Atom)>(&self, f: &mut F) {
        if let Some(atom) = self.literal.atom() {
            f(atom);
        }
        visit_literal_atoms(&self.condition, f);
    }

    fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        self.literal.visit_vars(f);
        for lit in &self.condition {
            lit.visit_vars(f);
        }
    }

    fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> ConditionalLiteral {
        let literal = self.literal.map_vars(f);
        let condition = self.condition.iter().map(|l| l.map_vars(f)).collect();
        ConditionalLiteral { literal, condition }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guard {
    pub op: CompOp,
    pub term: Term,
}

impl Guard {
    fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> Guard {
        Guard {
            op: self.op,
            term: self.term.map_vars(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AggregateFunction {
    Count,
    Sum,
    SumPlus,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn from_directive(name: &str) -> Option<Self> {
        match name {
            "#count" => Some(AggregateFunction::Count),
            "#sum" => Some(AggregateFunction::Sum),
            "#sum+" => Some(AggregateFunction::SumPlus),
            "#min" => Some(AggregateFunction::Min),
            "#max" => Some(AggregateFunction::Max),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            AggregateFunction::Count => "#count",
            AggregateFunction::Sum => "#sum",
            AggregateFunction::SumPlus => "#sum+",
            AggregateFunction::Min => "#min",
            AggregateFunction::Max => "#max",
        }
    }
}

/// `l { lit : cond; ... } u`, used for choice heads and body set aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetAggregate {
    pub left: Option<Guard>,
    pub elements: Vec<ConditionalLiteral>,
    pub right: Option<Guard>,
}

impl SetAggregate {
    fn visit_atoms<F: FnMut(&Atom)>(&self, f: &mut F) {
        for element in &self.elements {
            element.visit_atoms(f);
        }
    }

    fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        if let Some(guard) = &self.left {
            guard.term.visit_vars(f);
        }
        for element in &self.elements {
            element.visit_vars(f);
        }
        if let Some(guard) = &self.right {
            guard.term.visit_vars(f);
        }
    }

    fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> SetAggregate {
        let left = self.left.as_ref().map(|g| g.map_vars(f));
        let elements = self.elements.iter().map(|e| e.map_vars(f)).collect();
        let right = self.right.as_ref().map(|g| g.map_vars(f));
        SetAggregate {
            left,
            elements,
            right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyAggregateElement {
    pub terms: Vec<Term>,
    pub condition: Vec<Literal>,
}

impl BodyAggregateElement {
    pub(crate) fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        for term in &self.terms {
            term.visit_vars(f);
        }
        for lit in &self.condition {
            lit.visit_vars(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyAggregate {
    pub left: Option<Guard>,
    pub function: AggregateFunction,
    pub elements: Vec<BodyAggregateElement>,
    pub right: Option<Guard>,
}

impl BodyAggregate {
    fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        if let Some(guard) = &self.left {
            guard.term.visit_vars(f);
        }
        for element in &self.elements {
            element.visit_vars(f);
        }
        if let Some(guard) = &self.right {
            guard.term.visit_vars(f);
        }
    }

    fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> BodyAggregate {
        let left = self.left.as_ref().map(|g| g.map_vars(f));
        let elements = self
            .elements
            .iter()
            .map(|e| BodyAggregateElement {
                terms: e.terms.iter().map(|t| t.map_vars(f)).collect(),
                condition: e.condition.iter().map(|l| l.map_vars(f)).collect(),
            })
            .collect();
        let right = self.right.as_ref().map(|g| g.map_vars(f));
        BodyAggregate {
            left,
            function: self.function,
            elements,
            right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadAggregateElement {
    pub terms: Vec<Term>,
    pub literal: ConditionalLiteral,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadAggregate {
    pub left: Option<Guard>,
    pub function: AggregateFunction,
    pub elements: Vec<HeadAggregateElement>,
    pub right: Option<Guard>,
}

impl HeadAggregate {
    fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        if let Some(guard) = &self.left {
            guard.term.visit_vars(f);
        }
        for element in &self.elements {
            for term in &element.terms {
                term.visit_vars(f);
            }
            element.literal.visit_vars(f);
        }
        if let Some(guard) = &self.right {
            guard.term.visit_vars(f);
        }
    }

    fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> HeadAggregate {
        let left = self.left.as_ref().map(|g| g.map_vars(f));
        let elements = self
            .elements
            .iter()
            .map(|e| {
                let terms = e.terms.iter().map(|t| t.map_vars(f)).collect();
                HeadAggregateElement {
                    terms,
                    literal: e.literal.map_vars(f),
                }
            })
            .collect();
        let right = self.right.as_ref().map(|g| g.map_vars(f));
        HeadAggregate {
            left,
            function: self.function,
            elements,
            right,
        }
    }
}

fn visit_literal_atoms<F: FnMut(&Atom)>(literals: &[Literal], f: &mut F) {
    for lit in literals {
        if let Some(atom) = lit.atom() {
            f(atom);
        }
    }
}

impl fmt::Display for ConditionalLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal)?;
        if !self.condition.is_empty() {
            write!(f, ": ")?;
            write_joined(f, &self.condition, ", ")?;
        }
        Ok(())
    }
}

fn write_left_guard(f: &mut fmt::Formatter<'_>, guard: &Option<Guard>) -> fmt::Result {
    if let Some(guard) = guard {
        write!(f, "{} {} ", guard.term, guard.op.symbol())?;
    }
    Ok(())
}

fn write_right_guard(f: &mut fmt::Formatter<'_>, guard: &Option<Guard>) -> fmt::Result {
    if let Some(guard) = guard {
        write!(f, " {} {}", guard.op.symbol(), guard.term)?;
    }
    Ok(())
}

impl fmt::Display for SetAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_left_guard(f, &self.left)?;
        write!(f, "{{ ")?;
        write_joined(f, &self.elements, "; ")?;
        write!(f, " }}")?;
        write_right_guard(f, &self.right)
    }
}

impl fmt::Display for BodyAggregateElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.terms, ",")?;
        if !self.condition.is_empty() {
            write!(f, ": ")?;
            write_joined(f, &self.condition, ", ")?;
        }
        Ok(())
    }
}

impl fmt::Display for BodyAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_left_guard(f, &self.left)?;
        write!(f, "{} {{ ", self.function.keyword())?;
        write_joined(f, &self.elements, "; ")?;
        write!(f, " }}")?;
        write_right_guard(f, &self.right)
    }
}

impl fmt::Display for HeadAggregateElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.terms, ",")?;
        write!(f, ": {}", self.literal)
    }
}

impl fmt::Display for HeadAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_left_guard(f, &self.left)?;
        write!(f, "{} {{ ", self.function.keyword())?;
        write_joined(f, &self.elements, "; ")?;
        write!(f, " }}")?;
        write_right_guard(f, &self.right)
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Head::Empty => Ok(()),
            Head::Atom(atom) => write!(f, "{atom}"),
            Head::Disjunction(elements) => write_joined(f, elements, "; "),
            Head::Choice(choice) => write!(f, "{choice}"),
            Head::Aggregate(agg) => write!(f, "{agg}"),
        }
    }
}

impl fmt::Display for BodyLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyLiteral::Literal(lit) => write!(f, "{lit}"),
            BodyLiteral::Conditional(cond) => write!(f, "{cond}"),
            BodyLiteral::SetAggregate { sign, aggregate } => {
                write!(f, "{}{aggregate}", sign.prefix())
            }
            BodyLiteral::Aggregate { sign, aggregate } => {
                write!(f, "{}{aggregate}", sign.prefix())
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            return match self.head {
                Head::Empty => write!(f, ":- #true."),
                _ => write!(f, "{}.", self.head),
            };
        }
        if matches!(self.head, Head::Empty) {
            write!(f, ":- ")?;
        } else {
            write!(f, "{} :- ", self.head)?;
        }
        write_joined(f, &self.body, "; ")?;
        write!(f, ".")
    }
}

fn write_body_suffix(f: &mut fmt::Formatter<'_>, body: &[BodyLiteral]) -> fmt::Result {
    if !body.is_empty() {
        write!(f, ": ")?;
        write_joined(f, body, "; ")?;
    }
    Ok(())
}

impl fmt::Display for OptimizeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.weight)?;
        if let Some(priority) = &self.priority {
            write!(f, "@{priority}")?;
        }
        for term in &self.terms {
            write!(f, ",{term}")?;
        }
        if !self.condition.is_empty() {
            write!(f, ": ")?;
            write_joined(f, &self.condition, ", ")?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Rule(rule) => write!(f, "{rule}"),
            StatementKind::Optimize { kind, elements } => {
                let keyword = match kind {
                    OptimizeKind::Minimize => "#minimize",
                    OptimizeKind::Maximize => "#maximize",
                };
                write!(f, "{keyword} {{ ")?;
                write_joined(f, elements, "; ")?;
                write!(f, " }}.")
            }
            StatementKind::WeakConstraint {
                body,
                weight,
                priority,
                terms,
            } => {
                write!(f, ":~ ")?;
                write_joined(f, body, "; ")?;
                write!(f, ". [{weight}")?;
                if let Some(priority) = priority {
                    write!(f, "@{priority}")?;
                }
                for term in terms {
                    write!(f, ",{term}")?;
                }
                write!(f, "]")
            }
            StatementKind::ShowAll => write!(f, "#show."),
            StatementKind::ShowSignature(sig) => write!(f, "#show {sig}."),
            StatementKind::ShowTerm { term, body } => {
                write!(f, "#show {term}")?;
                write_body_suffix(f, body)?;
                write!(f, ".")
            }
            StatementKind::Const { name, value } => write!(f, "#const {name} = {value}."),
            StatementKind::Program { name, params } => {
                write!(f, "#program {name}")?;
                if !params.is_empty() {
                    write!(f, "({})", params.join(","))?;
                }
                write!(f, ".")
            }
            StatementKind::External { atom, body } => {
                write!(f, "#external {atom}")?;
                write_body_suffix(f, body)?;
                write!(f, ".")
            }
            StatementKind::Directive { text, .. } => write!(f, "{text}"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }
        Ok(())
    }
}

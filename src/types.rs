use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "\\",
            BinOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Var(String),
    Anonymous,
    Number(i64),
    Str(String),
    Function { name: String, args: Vec<Term> },
    Tuple(Vec<Term>),
    Interval(Box<Term>, Box<Term>),
    Binary {
        op: BinOp,
        lhs: Box<Term>,
        rhs: Box<Term>,
    },
    Neg(Box<Term>),
    Inf,
    Sup,
}

impl Term {
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Function {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        match self {
            Term::Var(v) => f(v),
            Term::Anonymous | Term::Number(_) | Term::Str(_) | Term::Inf | Term::Sup => {}
            Term::Function { args, .. } | Term::Tuple(args) => {
                for arg in args {
                    arg.visit_vars(f);
                }
            }
            Term::Interval(lo, hi) => {
                lo.visit_vars(f);
                hi.visit_vars(f);
            }
            Term::Binary { lhs, rhs, .. } => {
                lhs.visit_vars(f);
                rhs.visit_vars(f);
            }
            Term::Neg(inner) => inner.visit_vars(f),
        }
    }

    pub fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> Term {
        match self {
            Term::Var(v) => Term::Var(f(v)),
            Term::Anonymous | Term::Number(_) | Term::Str(_) | Term::Inf | Term::Sup => {
                self.clone()
            }
            Term::Function { name, args } => Term::Function {
                name: name.clone(),
                args: args.iter().map(|a| a.map_vars(f)).collect(),
            },
            Term::Tuple(items) => Term::Tuple(items.iter().map(|t| t.map_vars(f)).collect()),
            Term::Interval(lo, hi) => {
                let lo = lo.map_vars(f);
                let hi = hi.map_vars(f);
                Term::Interval(Box::new(lo), Box::new(hi))
            }
            Term::Binary { op, lhs, rhs } => {
                let lhs = lhs.map_vars(f);
                let rhs = rhs.map_vars(f);
                Term::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            Term::Neg(inner) => Term::Neg(Box::new(inner.map_vars(f))),
        }
    }
}

/// A predicate atom; `classical` marks strong negation (`-p(X)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom {
    pub name: String,
    pub args: Vec<Term>,
    pub classical: bool,
}

impl Atom {
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            args,
            classical: false,
        }
    }

    pub fn signature(&self) -> Signature {
        let name = if self.classical {
            format!("-{}", self.name)
        } else {
            self.name.clone()
        };
        Signature {
            name,
            arity: self.args.len(),
        }
    }

    /// The atom as a term, as it appears inside provenance tuples.
    pub fn to_term(&self) -> Term {
        let fun = Term::Function {
            name: self.name.clone(),
            args: self.args.clone(),
        };
        if self.classical {
            Term::Neg(Box::new(fun))
        } else {
            fun
        }
    }

    pub fn from_term(term: Term) -> Option<Atom> {
        match term {
            Term::Function { name, args } => Some(Atom {
                name,
                args,
                classical: false,
            }),
            Term::Neg(inner) => match *inner {
                Term::Function { name, args } => Some(Atom {
                    name,
                    args,
                    classical: true,
                }),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        for arg in &self.args {
            arg.visit_vars(f);
        }
    }

    pub fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> Atom {
        Atom {
            name: self.name.clone(),
            args: self.args.iter().map(|a| a.map_vars(f)).collect(),
            classical: self.classical,
        }
    }
}

/// A predicate identity regardless of argument bindings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Signature {
    pub name: String,
    pub arity: usize,
}

impl Signature {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }

    /// Predicate name without the classical negation marker.
    pub fn base_name(&self) -> &str {
        self.name.strip_prefix('-').unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::Ne => "!=",
            CompOp::Lt => "<",
            CompOp::Le => "<=",
            CompOp::Gt => ">",
            CompOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sign {
    Positive,
    Negative,
    DoubleNegative,
}

impl Sign {
    pub fn prefix(self) -> &'static str {
        match self {
            Sign::Positive => "",
            Sign::Negative => "not ",
            Sign::DoubleNegative => "not not ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralKind {
    Atom(Atom),
    Comparison { lhs: Term, op: CompOp, rhs: Term },
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub sign: Sign,
    pub kind: LiteralKind,
}

impl Literal {
    pub fn positive(atom: Atom) -> Self {
        Self {
            sign: Sign::Positive,
            kind: LiteralKind::Atom(atom),
        }
    }

    pub fn atom(&self) -> Option<&Atom> {
        match &self.kind {
            LiteralKind::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// The atom of a positive atom literal, the only kind recorded as support.
    pub fn positive_atom(&self) -> Option<&Atom> {
        match (&self.sign, &self.kind) {
            (Sign::Positive, LiteralKind::Atom(atom)) => Some(atom),
            _ => None,
        }
    }

    pub fn visit_vars<F: FnMut(&str)>(&self, f: &mut F) {
        match &self.kind {
            LiteralKind::Atom(atom) => atom.visit_vars(f),
            LiteralKind::Comparison { lhs, rhs, .. } => {
                lhs.visit_vars(f);
                rhs.visit_vars(f);
            }
            LiteralKind::Boolean(_) => {}
        }
    }

    pub fn map_vars<F: FnMut(&str) -> String>(&self, f: &mut F) -> Literal {
        let kind = match &self.kind {
            LiteralKind::Atom(atom) => LiteralKind::Atom(atom.map_vars(f)),
            LiteralKind::Comparison { lhs, op, rhs } => {
                let lhs = lhs.map_vars(f);
                let rhs = rhs.map_vars(f);
                LiteralKind::Comparison { lhs, op: *op, rhs }
            }
            LiteralKind::Boolean(b) => LiteralKind::Boolean(*b),
        };
        Literal {
            sign: self.sign,
            kind,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(v) => write!(f, "{v}"),
            Term::Anonymous => write!(f, "_"),
            Term::Number(n) => write!(f, "{n}"),
            Term::Str(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Term::Function { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    write_joined(f, args, ",")?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            Term::Tuple(items) => {
                write!(f, "(")?;
                write_joined(f, items, ",")?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Term::Interval(lo, hi) => write!(f, "({lo}..{hi})"),
            Term::Binary { op, lhs, rhs } => write!(f, "({lhs}{}{rhs})", op.symbol()),
            Term::Neg(inner) => write!(f, "-{inner}"),
            Term::Inf => write!(f, "#inf"),
            Term::Sup => write!(f, "#sup"),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.classical {
            write!(f, "-")?;
        }
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            write_joined(f, &self.args, ",")?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sign.prefix())?;
        match &self.kind {
            LiteralKind::Atom(atom) => write!(f, "{atom}"),
            LiteralKind::Comparison { lhs, op, rhs } => write!(f, "{lhs}{}{rhs}", op.symbol()),
            LiteralKind::Boolean(true) => write!(f, "#true"),
            LiteralKind::Boolean(false) => write!(f, "#false"),
        }
    }
}

pub(crate) fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    sep: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

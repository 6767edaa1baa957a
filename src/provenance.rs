//! Reading provenance atoms back out of an answer set.

use std::collections::BTreeMap;
use std::fmt;

use crate::diagnostics::Diagnostic;
use crate::parser::parse_terms;
use crate::types::{Atom, Term};

/// One way an atom was derived: the rule number and the positive atoms the
/// rule body relied on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Derivation {
    pub rule_nr: usize,
    pub atom: Atom,
    pub support: Vec<Atom>,
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- [{}]", self.atom, self.rule_nr)?;
        for (i, atom) in self.support.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{atom}")?;
        }
        Ok(())
    }
}

/// Decodes every `provenance_name/3` atom in `atoms_text`, grouped by the
/// printed derived atom. Other atoms are ignored.
pub fn decode_model(
    provenance_name: &str,
    atoms_text: &str,
) -> Result<BTreeMap<String, Vec<Derivation>>, Vec<Diagnostic>> {
    let terms = parse_terms(atoms_text)?;
    let mut out: BTreeMap<String, Vec<Derivation>> = BTreeMap::new();
    let mut errors = Vec::new();

    for term in terms {
        let Term::Function { name, args } = &term else {
            continue;
        };
        if name != provenance_name {
            continue;
        }
        match decode_derivation(args) {
            Some(derivation) => {
                let entry = out.entry(derivation.atom.to_string()).or_default();
                if !entry.contains(&derivation) {
                    entry.push(derivation);
                }
            }
            None => errors.push(Diagnostic::new(
                "E-PROVENANCE",
                format!("malformed provenance atom `{term}`"),
                None,
            )),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    for derivations in out.values_mut() {
        derivations.sort();
    }
    Ok(out)
}

fn decode_derivation(args: &[Term]) -> Option<Derivation> {
    let [nr, atom, support] = args else {
        return None;
    };
    let rule_nr = match nr {
        Term::Number(n) => usize::try_from(*n).ok()?,
        _ => return None,
    };
    let atom = Atom::from_term(atom.clone())?;
    let support = match support {
        Term::Tuple(items) => items
            .iter()
            .cloned()
            .map(Atom::from_term)
            .collect::<Option<Vec<_>>>()?,
        other => vec![Atom::from_term(other.clone())?],
    };
    Some(Derivation {
        rule_nr,
        atom,
        support,
    })
}

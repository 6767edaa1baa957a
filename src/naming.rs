use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use crate::ast::Program;
use crate::diagnostics::Diagnostic;
use crate::types::Signature;

/// Predicate signatures in use by one program.
#[derive(Debug, Clone, Default)]
pub struct SignatureRegistry {
    signatures: BTreeSet<Signature>,
    names: BTreeSet<String>,
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_program(program: &Program) -> Self {
        let mut registry = Self::new();
        for statement in &program.statements {
            for sig in statement.signatures() {
                registry.insert(sig);
            }
        }
        registry
    }

    pub fn insert(&mut self, signature: Signature) {
        self.names.insert(signature.base_name().to_string());
        self.signatures.insert(signature);
    }

    pub fn contains(&self, signature: &Signature) -> bool {
        self.signatures.contains(signature)
    }

    /// Marks `name` as taken without adding a signature.
    pub fn reserve_name(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    /// True when any signature uses `name`, at any arity and either polarity.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("no conflict-free name for `{base}` within {max_depth} suffixes")]
    Exhausted { base: String, max_depth: usize },
}

impl From<NamingError> for Diagnostic {
    fn from(err: NamingError) -> Self {
        Diagnostic::new("E-NAMING", err.to_string(), None)
    }
}

/// Per-run collision counters. Created fresh for every analysis.
#[derive(Debug, Clone)]
pub struct NamingContext {
    registry: SignatureRegistry,
    depths: BTreeMap<String, usize>,
    max_depth: usize,
}

impl NamingContext {
    pub fn new(registry: SignatureRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            depths: BTreeMap::new(),
            max_depth,
        }
    }

    pub fn registry(&self) -> &SignatureRegistry {
        &self.registry
    }

    /// `base` followed by the fewest `_` that no program predicate uses.
    pub fn conflict_free(&mut self, base: &str) -> Result<String, NamingError> {
        if let Some(depth) = self.depths.get(base) {
            return Ok(suffixed(base, *depth));
        }
        for depth in 0..=self.max_depth {
            let candidate = suffixed(base, depth);
            if !self.registry.contains_name(&candidate) {
                self.depths.insert(base.to_string(), depth);
                return Ok(candidate);
            }
        }
        Err(NamingError::Exhausted {
            base: base.to_string(),
            max_depth: self.max_depth,
        })
    }

    /// Keeps later `conflict_free` calls from handing out `name`.
    pub fn reserve(&mut self, name: &str) {
        self.registry.reserve_name(name);
    }

    pub fn depth(&self, base: &str) -> Option<usize> {
        self.depths.get(base).copied()
    }
}

fn suffixed(base: &str, depth: usize) -> String {
    format!("{base}{}", "_".repeat(depth))
}

/// Synthetic predicate names chosen for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservedNames {
    pub provenance: String,
    pub model: String,
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self {
            provenance: "h".to_string(),
            model: "model".to_string(),
        }
    }
}

impl ReservedNames {
    pub fn resolve(
        naming: &mut NamingContext,
        provenance_base: &str,
        model_base: &str,
    ) -> Result<Self, NamingError> {
        let provenance = naming.conflict_free(provenance_base)?;
        naming.reserve(&provenance);
        let model = naming.conflict_free(model_base)?;
        Ok(Self { provenance, model })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(sigs: &[(&str, usize)]) -> SignatureRegistry {
        let mut registry = SignatureRegistry::new();
        for (name, arity) in sigs {
            registry.insert(Signature::new(*name, *arity));
        }
        registry
    }

    #[test]
    fn depth_is_cached_per_base() {
        let mut naming = NamingContext::new(registry(&[("h", 2)]), 4);
        assert_eq!(naming.conflict_free("h").expect("name"), "h_");
        assert_eq!(naming.depth("h"), Some(1));
        assert_eq!(naming.conflict_free("h").expect("name"), "h_");
    }

    #[test]
    fn classical_negation_counts_as_collision() {
        let mut naming = NamingContext::new(registry(&[("-h", 3)]), 4);
        assert_eq!(naming.conflict_free("h").expect("name"), "h_");
    }

    #[test]
    fn model_name_skips_the_chosen_provenance_name() {
        let mut naming = NamingContext::new(registry(&[("h", 2)]), 4);
        let names = ReservedNames::resolve(&mut naming, "h", "h_").expect("names");
        assert_eq!(names.provenance, "h_");
        assert_eq!(names.model, "h__");
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut naming = NamingContext::new(registry(&[("h", 1), ("h_", 1)]), 1);
        let err = naming.conflict_free("h").expect_err("should exhaust");
        assert_eq!(
            err,
            NamingError::Exhausted {
                base: "h".to_string(),
                max_depth: 1
            }
        );
    }
}

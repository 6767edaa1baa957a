//! Content hashes used as identity keys for transformations.

use sha2::{Digest, Sha256};

use crate::ast::Rule;
use crate::fmt::canonical_rule_text;
use crate::sequence::Transformation;

pub fn rule_digest(rule: &Rule) -> String {
    format!("{:x}", Sha256::digest(canonical_rule_text(rule).as_bytes()))
}

/// Order-independent digest of a rule group.
pub fn hash_rules(rules: &[Rule]) -> String {
    let mut digests: Vec<String> = rules.iter().map(rule_digest).collect();
    digests.sort_unstable();
    let mut hasher = Sha256::new();
    for digest in &digests {
        hasher.update(digest.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

pub fn hash_transformation(transformation: &Transformation) -> String {
    hash_rules(&transformation.rules)
}

/// Order-sensitive digest of a whole sequence.
pub fn hash_sequence(transformations: &[Transformation]) -> String {
    let mut hasher = Sha256::new();
    for transformation in transformations {
        hasher.update(transformation.hash.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

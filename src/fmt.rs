use std::collections::HashMap;

use crate::ast::{Program, Rule};
use crate::diagnostics::Diagnostic;
use crate::parser::parse_program;

/// Prints a program one statement per line in canonical spacing.
pub fn format_program(program: &Program) -> String {
    program.to_string()
}

pub fn format_source(src: &str) -> Result<String, Vec<Diagnostic>> {
    let program = parse_program(src)?;
    Ok(format_program(&program))
}

/// Renames variables to `V0, V1, ...` in order of first occurrence. Anonymous
/// variables are left alone.
pub fn normalize_variables(rule: &Rule) -> Rule {
    let mut renames: HashMap<String, String> = HashMap::new();
    rule.map_vars(&mut |name| {
        let next = renames.len();
        renames
            .entry(name.to_string())
            .or_insert_with(|| format!("V{next}"))
            .clone()
    })
}

/// Text used as hashing input: canonical spacing, normalized variables.
pub fn canonical_rule_text(rule: &Rule) -> String {
    normalize_variables(rule).to_string()
}

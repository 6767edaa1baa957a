pub mod analyzer;
pub mod ast;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod fmt;
pub mod graph;
pub mod hash;
pub mod naming;
pub mod parser;
pub mod provenance;
pub mod reify;
pub mod sequence;
pub mod types;

pub use analyzer::{
    Analysis, AnalysisReport, ProgramAnalyzer, REPORT_SCHEMA_VERSION, TransformationError, analyze,
};
pub use ast::{Program, Rule, Statement};
pub use classify::{Classification, ClassifiedStatement, FailedReason, Shape, classify};
pub use config::{AnalyzerConfig, ConfigError};
pub use diagnostics::{Diagnostic, Span};
pub use fmt::format_source;
pub use graph::DependencyGraph;
pub use hash::{hash_rules, hash_sequence, hash_transformation};
pub use naming::{NamingContext, NamingError, ReservedNames, SignatureRegistry};
pub use parser::{parse_program, parse_terms};
pub use provenance::{Derivation, decode_model};
pub use reify::{transform, transform_source};
pub use sequence::{Transformation, sequence};
pub use types::{Atom, Signature, Term};

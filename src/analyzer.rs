//! The analysis pipeline.
//!
//! parse -> classify -> partition -> dependency graph -> sequence -> reify.
//! Every run builds its own naming context and graph; nothing survives
//! between calls.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ast::{Program, Rule, Statement, StatementKind};
use crate::classify::{Classification, FailedReason, Shape, classify};
use crate::config::AnalyzerConfig;
use crate::diagnostics::Diagnostic;
use crate::graph::DependencyGraph;
use crate::hash::hash_sequence;
use crate::naming::{NamingContext, ReservedNames, SignatureRegistry};
use crate::parser::parse_program;
use crate::reify::transform;
use crate::sequence::{Transformation, sequence};

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// A statement that was not reified, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationError {
    pub statement: Statement,
    pub reason: FailedReason,
    pub shape: Shape,
}

impl TransformationError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self.reason {
            FailedReason::Warning => "W-UNSUPPORTED",
            FailedReason::Failure => "E-UNSUPPORTED",
        };
        Diagnostic::new(
            code,
            format!("{} `{}`", self.shape.describe(), self.statement),
            self.statement.span.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub transformations: Vec<Transformation>,
    pub facts: Vec<Rule>,
    pub pass_through: Vec<Statement>,
    pub errors: Vec<TransformationError>,
    pub names: ReservedNames,
    pub sequence_hash: String,
}

impl Analysis {
    pub fn has_failures(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.reason == FailedReason::Failure)
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors
            .iter()
            .map(TransformationError::to_diagnostic)
            .collect()
    }

    /// Facts, forwarded statements and reified rules as one program, to be
    /// solved together with the atoms of an answer set.
    pub fn reified_program(&self) -> Program {
        let mut program = Program::new();
        for fact in &self.facts {
            program
                .statements
                .push(Statement::new(StatementKind::Rule(fact.clone()), None));
        }
        program.statements.extend(self.pass_through.iter().cloned());
        for transformation in &self.transformations {
            for rule in &transformation.reified {
                program
                    .statements
                    .push(Statement::new(StatementKind::Rule(rule.clone()), None));
            }
        }
        program
    }

    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            schema_version: REPORT_SCHEMA_VERSION,
            provenance_name: self.names.provenance.clone(),
            model_name: self.names.model.clone(),
            sequence_hash: self.sequence_hash.clone(),
            transformations: self
                .transformations
                .iter()
                .map(|t| TransformationReport {
                    id: t.id,
                    hash: t.hash.clone(),
                    recursive: t.recursive,
                    rules: t.rules.iter().map(ToString::to_string).collect(),
                    reified: t.reified.iter().map(ToString::to_string).collect(),
                })
                .collect(),
            facts: self.facts.iter().map(ToString::to_string).collect(),
            pass_through: self.pass_through.iter().map(ToString::to_string).collect(),
            errors: self
                .errors
                .iter()
                .map(|e| ErrorReport {
                    rule: e.statement.to_string(),
                    reason: e.reason,
                    shape: e.shape,
                    line: e.statement.span.as_ref().map(|s| s.line),
                    column: e.statement.span.as_ref().map(|s| s.column),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub schema_version: &'static str,
    pub provenance_name: String,
    pub model_name: String,
    pub sequence_hash: String,
    pub transformations: Vec<TransformationReport>,
    pub facts: Vec<String>,
    pub pass_through: Vec<String>,
    pub errors: Vec<ErrorReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformationReport {
    pub id: usize,
    pub hash: String,
    pub recursive: bool,
    pub rules: Vec<String>,
    pub reified: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub rule: String,
    pub reason: FailedReason,
    pub shape: Shape,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ProgramAnalyzer {
    config: AnalyzerConfig,
}

impl ProgramAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Parse errors and naming exhaustion are fatal. Rejected statements are
    /// collected in [`Analysis::errors`] and the rest is still analyzed.
    pub fn analyze(&self, src: &str) -> Result<Analysis, Vec<Diagnostic>> {
        let program = parse_program(src)?;
        self.analyze_program(&program)
    }

    pub fn analyze_program(&self, program: &Program) -> Result<Analysis, Vec<Diagnostic>> {
        let mut facts = Vec::new();
        let mut supported = Vec::new();
        let mut pass_through = Vec::new();
        let mut errors = Vec::new();

        for statement in &program.statements {
            let classified = classify(statement);
            match classified.classification {
                Classification::Supported => match classified.statement.kind {
                    StatementKind::Rule(rule) if classified.shape == Shape::Fact => {
                        facts.push(rule)
                    }
                    StatementKind::Rule(rule) => supported.push(rule),
                    _ => {}
                },
                Classification::Unsupported(reason) => {
                    warn!(
                        shape = ?classified.shape,
                        %reason,
                        statement = %classified.statement,
                        "statement not reified"
                    );
                    if reason == FailedReason::Warning {
                        pass_through.push(classified.statement.clone());
                    }
                    errors.push(TransformationError {
                        statement: classified.statement,
                        reason,
                        shape: classified.shape,
                    });
                }
            }
        }
        debug!(
            facts = facts.len(),
            rules = supported.len(),
            pass_through = pass_through.len(),
            errors = errors.len(),
            "classified program"
        );

        let mut naming = NamingContext::new(
            SignatureRegistry::from_program(program),
            self.config.max_suffix_depth,
        );
        let names = ReservedNames::resolve(
            &mut naming,
            &self.config.provenance_name,
            &self.config.model_name,
        )
        .map_err(|err| vec![Diagnostic::from(err)])?;
        debug!(provenance = %names.provenance, model = %names.model, "reserved names");

        let graph = DependencyGraph::build(&supported);
        debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            "built dependency graph"
        );

        let mut transformations = sequence(&graph);
        for transformation in &mut transformations {
            let reified = transformation
                .rules
                .iter()
                .flat_map(|rule| transform(rule, transformation.id, &names))
                .collect();
            transformation.reified = reified;
        }
        let sequence_hash = hash_sequence(&transformations);

        info!(
            transformations = transformations.len(),
            errors = errors.len(),
            sequence_hash = %sequence_hash,
            "analysis finished"
        );

        Ok(Analysis {
            transformations,
            facts,
            pass_through,
            errors,
            names,
            sequence_hash,
        })
    }
}

/// Analyzes `src` with the default configuration.
pub fn analyze(src: &str) -> Result<Analysis, Vec<Diagnostic>> {
    ProgramAnalyzer::default().analyze(src)
}

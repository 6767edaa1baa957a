use std::fs;
use std::path::{Path, PathBuf};

use asprov::{Analysis, AnalyzerConfig, Diagnostic, ProgramAnalyzer, decode_model, format_source};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "asprov")]
#[command(about = "Provenance instrumentation for answer set programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify, group and reify a program.
    Analyze {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the instrumented program.
    Reify {
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the program in canonical form.
    Fmt { file: PathBuf },
    /// Print the hash of every transformation and of the whole sequence.
    Hash { file: PathBuf },
    /// Decode provenance atoms from an answer set of the reified program.
    Explain {
        program: PathBuf,
        model: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Command::Analyze {
            file,
            format,
            config,
        } => run_analyze(&file, format, config.as_deref()),
        Command::Reify { file, config } => run_reify(&file, config.as_deref()),
        Command::Fmt { file } => run_fmt(&file),
        Command::Hash { file } => run_hash(&file),
        Command::Explain {
            program,
            model,
            config,
        } => run_explain(&program, &model, config.as_deref()),
    };
    std::process::exit(exit_code);
}

fn read_source(file: &Path) -> Option<String> {
    match fs::read_to_string(file) {
        Ok(src) => Some(src),
        Err(err) => {
            eprintln!("E-IO: failed to read {}: {}", file.display(), err);
            None
        }
    }
}

/// Prints diagnostics, naming `file` on those that carry no source yet.
fn report(file: &Path, diags: &[Diagnostic]) {
    for d in diags {
        if d.source().is_some() {
            eprintln!("{d}");
        } else {
            eprintln!("{}", d.clone().with_source(file.display().to_string()));
        }
    }
}

fn load_analyzer(config: Option<&Path>) -> Result<ProgramAnalyzer, Vec<Diagnostic>> {
    let config = match config {
        Some(path) => AnalyzerConfig::load(path).map_err(|err| {
            vec![Diagnostic::from(err).with_source(path.display().to_string())]
        })?,
        None => AnalyzerConfig::default(),
    };
    Ok(ProgramAnalyzer::new(config))
}

fn analyze_file(file: &Path, config: Option<&Path>) -> Option<Analysis> {
    let src = read_source(file)?;
    let result = load_analyzer(config).and_then(|analyzer| analyzer.analyze(&src));
    match result {
        Ok(analysis) => Some(analysis),
        Err(diags) => {
            report(file, &diags);
            None
        }
    }
}

fn run_analyze(file: &Path, format: OutputFormat, config: Option<&Path>) -> i32 {
    let Some(analysis) = analyze_file(file, config) else {
        return 1;
    };

    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&analysis.report()) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("E-IO: failed to serialize report: {err}");
                return 1;
            }
        },
        OutputFormat::Text => {
            for t in &analysis.transformations {
                let marker = if t.recursive { " recursive" } else { "" };
                println!("transformation {} {}{marker}", t.id, t.hash);
                for rule in &t.rules {
                    println!("  {rule}");
                }
            }
            if !analysis.pass_through.is_empty() {
                println!("pass-through");
                for statement in &analysis.pass_through {
                    println!("  {statement}");
                }
            }
            println!("sequence {}", analysis.sequence_hash);
        }
    }

    report(file, &analysis.diagnostics());
    if analysis.has_failures() { 1 } else { 0 }
}

fn run_reify(file: &Path, config: Option<&Path>) -> i32 {
    let Some(analysis) = analyze_file(file, config) else {
        return 1;
    };
    print!("{}", analysis.reified_program());
    report(file, &analysis.diagnostics());
    if analysis.has_failures() { 1 } else { 0 }
}

fn run_fmt(file: &Path) -> i32 {
    let Some(src) = read_source(file) else {
        return 1;
    };
    match format_source(&src) {
        Ok(out) => {
            print!("{out}");
            0
        }
        Err(diags) => {
            report(file, &diags);
            1
        }
    }
}

fn run_hash(file: &Path) -> i32 {
    let Some(analysis) = analyze_file(file, None) else {
        return 1;
    };
    for t in &analysis.transformations {
        println!("{} {}", t.id, t.hash);
    }
    println!("sequence {}", analysis.sequence_hash);
    0
}

fn run_explain(program: &Path, model: &Path, config: Option<&Path>) -> i32 {
    let Some(analysis) = analyze_file(program, config) else {
        return 1;
    };
    let Some(atoms) = read_source(model) else {
        return 1;
    };
    match decode_model(&analysis.names.provenance, &atoms) {
        Ok(derivations) => {
            for derivation in derivations.values().flatten() {
                println!("{derivation}");
            }
            0
        }
        Err(diags) => {
            report(model, &diags);
            1
        }
    }
}

//! Story Codegen CLI
//!
//! Usage:
//!   story-codegen [OPTIONS] <DICTIONARY> --model <FILE> --format <NAME>
//!
//! Options:
//!   -m, --model <FILE>      Story model (TOML)
//!   -f, --format <NAME>     Entry format to generate
//!   -r, --root <ID>         Root entity id (defaults to the model's root)
//!   -l, --language <FILE>   Target language definition (TOML)
//!   --check                 Lint the dictionary and exit
//!   -v, --verbose           Raise log verbosity (repeatable)
//!   -h, --help              Print help

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use story_codegen::{Dictionary, Generator, LanguageDefinition, LoadError, StoryGraph};

#[derive(Parser)]
#[command(name = "story-codegen")]
#[command(about = "Generate scripting code from a story model and a format dictionary")]
struct Cli {
    /// Format dictionary file
    dictionary: PathBuf,

    /// Story model file (TOML)
    #[arg(short, long, required_unless_present = "check")]
    model: Option<PathBuf>,

    /// Entry format to generate
    #[arg(short, long, required_unless_present = "check")]
    format: Option<String>,

    /// Root entity id
    #[arg(short, long)]
    root: Option<String>,

    /// Target language definition (TOML)
    #[arg(short, long)]
    language: Option<PathBuf>,

    /// Lint the dictionary, print warnings and exit
    #[arg(long)]
    check: bool,

    /// Log verbosity: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = match fs::read_to_string(&cli.dictionary) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", cli.dictionary.display(), e);
            std::process::exit(1);
        }
    };

    let dictionary = match Dictionary::parse(&source) {
        Ok(d) => d,
        Err(LoadError::Parse(errors)) => {
            let filename = cli.dictionary.display().to_string();
            for error in &errors {
                eprint!("{}", error.format(&source, &filename));
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error loading dictionary '{}': {}", cli.dictionary.display(), e);
            std::process::exit(1);
        }
    };

    if cli.check {
        let warnings = dictionary.lint();
        for warning in &warnings {
            eprintln!("{}", warning);
        }
        if !warnings.is_empty() {
            std::process::exit(1);
        }
        return;
    }

    // clap enforces both when --check is absent
    let (Some(model_path), Some(format)) = (cli.model.as_ref(), cli.format.as_deref()) else {
        eprintln!("Error: --model and --format are required");
        std::process::exit(2);
    };

    let model = match StoryGraph::from_file(model_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error loading model '{}': {}", model_path.display(), e);
            std::process::exit(1);
        }
    };

    let root = match &cli.root {
        Some(id) => match model.entity_id(id) {
            Some(root) => root,
            None => {
                eprintln!("Error: unknown root entity '{}'", id);
                std::process::exit(1);
            }
        },
        None => model.root(),
    };

    let language = match &cli.language {
        Some(path) => match LanguageDefinition::from_file(path) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error loading language '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => LanguageDefinition::default(),
    };

    let generator = Generator::new(dictionary, language);
    match generator.generate(&model, root, format) {
        Ok(code) => print!("{}", code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// RUST_LOG wins over `-v`; diagnostics go to stderr
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

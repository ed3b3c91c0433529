#![doc = include_str!("../README.md")]

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sgml_dtd::{DtdError, ParseOptions, SUBSET_NAME, SgmlDtd};
use tracing::debug;

mod render;

// ============================================================================
// Exit codes
// ============================================================================

const EXIT_SUCCESS: i32 = 0;
const EXIT_DTD_ERROR: i32 = 1;
const EXIT_USAGE_ERROR: i32 = 2;
const EXIT_IO_ERROR: i32 = 3;
const EXIT_NOT_CONTAINED: i32 = 4;

// ============================================================================
// CLI argument structures
// ============================================================================

/// Parse and inspect SGML document type definitions.
#[derive(Parser, Debug)]
#[command(name = "sgmldtd", version)]
struct Args {
    /// Document type name
    #[arg(long, global = true)]
    name: Option<String>,

    /// Internal subset file, read before the DTD
    #[arg(long, global = true)]
    subset: Option<PathBuf>,

    /// Skip parameter entities whose content cannot be read
    #[arg(long, global = true)]
    lenient: bool,

    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a DTD and report errors
    Check {
        /// DTD file (or "-" for stdin)
        file: String,
    },

    /// Print declarations
    Tree {
        /// DTD file (or "-" for stdin)
        file: String,

        /// Only this element
        #[arg(long)]
        element: Option<String>,
    },

    /// Dump the grammar as JSON
    Json {
        /// DTD file (or "-" for stdin)
        file: String,

        /// Output file (default stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask whether one element may contain another
    Contains {
        /// DTD file (or "-" for stdin)
        file: String,
        parent: String,
        child: String,
    },
}

impl Command {
    fn file(&self) -> &str {
        match self {
            Command::Check { file }
            | Command::Tree { file, .. }
            | Command::Json { file, .. }
            | Command::Contains { file, .. } => file,
        }
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let code = match run(&args) {
        Ok(code) => code,
        Err(e) => {
            match &e {
                CliError::Dtd {
                    error,
                    source,
                    filename,
                } => error.write_report(filename, source, io::stderr()),
                _ => eprintln!("error: {e}"),
            }
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<i32, CliError> {
    let file = args.command.file();
    let dtd = load(args, file)?;

    match &args.command {
        Command::Check { .. } => {
            println!(
                "{file}: {} elements, {} entities, {} parameter entities",
                dtd.element_count(),
                dtd.entities().len(),
                dtd.parameter_entities().len()
            );
        }
        Command::Tree { element: None, .. } => print!("{}", render::dtd_tree(&dtd)),
        Command::Tree {
            element: Some(name),
            ..
        } => {
            let element = dtd
                .find_element(name)
                .ok_or_else(|| CliError::Usage(format!("element '{name}' is not declared")))?;
            print!("{}", render::element_tree(element));
        }
        Command::Json { output, .. } => {
            let json = serde_json::to_string_pretty(&render::dtd_json(&dtd))
                .map_err(|e| CliError::Io(io::Error::other(e)))?;
            match output {
                Some(path) => std::fs::write(path, json + "\n")?,
                None => println!("{json}"),
            }
        }
        Command::Contains { parent, child, .. } => {
            let element = dtd
                .find_element(parent)
                .ok_or_else(|| CliError::Usage(format!("element '{parent}' is not declared")))?;
            let contained = element.can_contain(child, &dtd);
            println!("{contained}");
            if !contained {
                return Ok(EXIT_NOT_CONTAINED);
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

/// Read, decode and parse the DTD named on the command line.
fn load(args: &Args, file: &str) -> Result<SgmlDtd, CliError> {
    let bytes = read_input(file)?;
    let filename = if file == "-" { "<stdin>" } else { file };
    let source = sgml_scanner::decode(filename, &bytes)
        .map_err(|e| CliError::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string())))?;

    let mut options = ParseOptions::default().lenient_entities(args.lenient);
    if file != "-" {
        options = options.base_uri(file);
    }
    if let Some(name) = &args.name {
        options = options.name(name.as_str());
    }
    let mut subset_file = None;
    if let Some(path) = &args.subset {
        let subset_name = path.to_string_lossy().into_owned();
        let subset = sgml_scanner::decode(&subset_name, &std::fs::read(path)?)
            .map_err(|e| CliError::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string())))?;
        options = options.subset(subset.as_str());
        subset_file = Some((subset_name, subset));
    }
    debug!(?options, "parsing");

    sgml_dtd::parse_with(&source, &options)
        .map_err(|error| dtd_error(error, filename.to_string(), source, subset_file))
}

/// Pair a parse error with the text it was raised in: the DTD, or the
/// `--subset` file.
fn dtd_error(
    error: DtdError,
    filename: String,
    source: String,
    subset_file: Option<(String, String)>,
) -> CliError {
    let in_subset = error
        .source_frame()
        .is_some_and(|frame| frame.entity == SUBSET_NAME);
    let (filename, source) = match subset_file {
        Some(subset_file) if in_subset => subset_file,
        _ => (filename, source),
    };
    CliError::Dtd {
        error,
        source,
        filename,
    }
}

fn read_input(file: &str) -> Result<Vec<u8>, io::Error> {
    if file == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(file)
    }
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Dtd {
        error: DtdError,
        source: String,
        filename: String,
    },
    Usage(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Io(_) => EXIT_IO_ERROR,
            CliError::Dtd { .. } => EXIT_DTD_ERROR,
            CliError::Usage(_) => EXIT_USAGE_ERROR,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Dtd { error, .. } => write!(f, "{error}"),
            CliError::Usage(e) => write!(f, "{e}"),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

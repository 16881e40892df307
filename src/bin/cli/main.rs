//! CLI tool for docpack document archives.

mod commands;
mod exit_codes;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Document archive tool
#[derive(Parser)]
#[command(name = "docpack")]
#[command(author, version, about = "Inspect and build docpack document archives", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress informational output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List container entries (alias: l)
    #[command(alias = "l")]
    List {
        /// Document archive to list
        archive: PathBuf,

        /// Show packed size, method and CRC
        #[arg(long)]
        technical: bool,
    },

    /// Show document information (alias: i)
    #[command(alias = "i")]
    Info {
        /// Document archive to inspect
        archive: PathBuf,
    },

    /// Extract embedded images (alias: x)
    #[command(alias = "x")]
    Extract {
        /// Document archive to extract from
        archive: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = ".")]
        output: PathBuf,
    },

    /// Test archive integrity (alias: t)
    #[command(alias = "t")]
    Test {
        /// Document archive to test
        archive: PathBuf,
    },

    /// Build a document from text and image files (alias: a)
    #[command(alias = "a")]
    Pack {
        /// Document archive to create
        archive: PathBuf,

        /// Input files, in document order; images become image items and
        /// everything else is read as text
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Compression method
        #[arg(short = 'm', long, value_enum, default_value = "deflate")]
        method: CompressionMethod,

        /// Compression level (0-9)
        #[arg(short = 'l', long, default_value = "6")]
        level: u32,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum CompressionMethod {
    Stored,
    Deflate,
}

impl From<CompressionMethod> for docpack::codec::Method {
    fn from(method: CompressionMethod) -> Self {
        match method {
            CompressionMethod::Stored => docpack::codec::Method::Stored,
            CompressionMethod::Deflate => docpack::codec::Method::Deflate,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::List { archive, technical } => commands::list(&archive, technical, cli.format),

        Commands::Info { archive } => commands::info(&archive, cli.format),

        Commands::Extract { archive, output } => {
            commands::extract(&archive, &output, cli.format, cli.quiet)
        }

        Commands::Test { archive } => commands::test(&archive, cli.format),

        Commands::Pack {
            archive,
            files,
            method,
            level,
        } => commands::pack(&commands::PackConfig {
            archive_path: &archive,
            files: &files,
            method,
            level,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}

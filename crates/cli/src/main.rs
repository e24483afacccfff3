mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_instantiate, cmd_roots, cmd_show};
use output::{OutputFormat, print_error};

/// storix - instantiate derivations into a content-addressed store
#[derive(Parser)]
#[command(name = "storix")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Store directory (defaults to $STORIX_STORE, then the data directory)
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Instantiate the derivation described by a JSON module
  Instantiate {
    /// Path to the module
    file: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show a persisted store expression
  Show {
    /// Path of the store expression
    path: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// List the roots declared by a persisted store expression
  Roots {
    /// Path of the store expression
    path: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let store = cli.store.as_deref();
  let result = match cli.command {
    Commands::Instantiate { file, output } => cmd_instantiate(&file, store, output),
    Commands::Show { path, output } => cmd_show(&path, store, output),
    Commands::Roots { path, output } => cmd_roots(&path, store, output),
  };

  if let Err(err) = result {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}

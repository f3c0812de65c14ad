// gridpaste CLI - headless paste-driven table editing

mod check;
mod exit_codes;
mod paste;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::*;

#[derive(Parser)]
#[command(name = "gpaste")]
#[command(about = "Paste spreadsheet selections into a typed table (headless)")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Paste clipboard text into a dataset and report the resulting edit state
    #[command(after_help = "\
Examples:
  printf '1\\tUpdated\\t100' | gpaste paste --table items.toml --data items.json
  gpaste paste --table items.toml --data items.csv --clipboard sel.tsv --at 2:name
  gpaste paste --table items.toml --data items.json --clipboard sel.tsv --at ghost:id
  gpaste paste --table items.toml --data items.json --apply --output changed.json")]
    Paste {
        /// Table definition (.toml or .json)
        #[arg(long, short = 't')]
        table: PathBuf,

        /// Source dataset (.csv, .tsv, .txt or .json)
        #[arg(long, short = 'd')]
        data: PathBuf,

        /// File holding the clipboard text (default: stdin)
        #[arg(long, short = 'c')]
        clipboard: Option<PathBuf>,

        /// Anchor the paste at a cell: <row key>:<column> or ghost:<column>
        #[arg(long)]
        at: Option<String>,

        /// Validate and persist the dirty rows
        #[arg(long)]
        apply: bool,

        /// Where --apply writes the dirty rows (default: stdout)
        #[arg(long, short = 'o', requires = "apply")]
        output: Option<PathBuf>,

        /// Print one JSON document instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Validate every row of a dataset against a table definition
    #[command(after_help = "\
Exit codes:
  0  all rows valid
  6  one or more rows invalid")]
    Check {
        /// Table definition (.toml or .json)
        #[arg(long, short = 't')]
        table: PathBuf,

        /// Dataset to check
        #[arg(long, short = 'd')]
        data: PathBuf,

        /// Print one JSON document instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Table definition commands
    Table {
        #[command(subcommand)]
        command: TableCommands,
    },
}

#[derive(Subcommand)]
enum TableCommands {
    /// Parse and validate a table definition
    Validate {
        /// Table definition (.toml or .json)
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  gridpaste-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
        "\nprofile: ", env!("BUILD_PROFILE"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: gpaste <command> [options]");
            eprintln!("       gpaste --help for more information");
            Ok(())
        }
        Some(Commands::Paste {
            table,
            data,
            clipboard,
            at,
            apply,
            output,
            json,
        }) => paste::cmd_paste(paste::PasteArgs {
            table,
            data,
            clipboard,
            at,
            apply,
            output,
            json,
        }),
        Some(Commands::Check { table, data, json }) => check::cmd_check(table, data, json),
        Some(Commands::Table { command }) => match command {
            TableCommands::Validate { file, json } => check::cmd_table_validate(file, json),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Exit with `code` without printing anything (the report is already out).
    pub fn silent(code: u8) -> Self {
        Self::new(code, "")
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<gridpaste_config::ConfigError> for CliError {
    fn from(err: gridpaste_config::ConfigError) -> Self {
        Self::new(config_exit_code(&err), err.to_string())
    }
}

impl From<gridpaste_io::IoError> for CliError {
    fn from(err: gridpaste_io::IoError) -> Self {
        Self::new(io_exit_code(&err), err.to_string())
    }
}

impl From<gridpaste_engine::EngineError> for CliError {
    fn from(err: gridpaste_engine::EngineError) -> Self {
        Self::new(EXIT_CONFIG, err.to_string())
    }
}

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI definition for the `ibdsdi` binary.
#[derive(Parser)]
#[command(name = "ibdsdi")]
#[command(about = "Extract SDI dictionary objects and table DDL from InnoDB .ibd files")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Controls when colored output is emitted.
#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Available subcommands for the `ibdsdi` CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Show tablespace geometry and SDI root metadata
    ///
    /// Resolves the logical and physical page size from the FSP flags word
    /// of page 0 and reports the SDI version and root page number stored
    /// behind the extent descriptor array.
    Info {
        /// Path to InnoDB data file (.ibd)
        file: String,
    },

    /// Dump SDI records as an ibd2sdi-compatible JSON array
    ///
    /// Walks the SDI index B-tree, inflates every dictionary object, and
    /// prints `["ibd2sdi", {"type":..,"id":..,"object":..}, ...]` in
    /// B-tree key order.
    Sdi {
        /// Path to InnoDB data file (.ibd)
        file: String,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Reconstruct CREATE TABLE statements from SDI
    ///
    /// Renders one CREATE TABLE statement per table object found in the
    /// SDI, in the shape SHOW CREATE TABLE prints.
    Ddl {
        /// Path to InnoDB data file (.ibd)
        file: String,
    },
}

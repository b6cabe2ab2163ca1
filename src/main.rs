#[cfg(not(feature = "cli"))]
compile_error!("The `ibdsdi` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use ibdsdi::cli;
use ibdsdi::cli::app::{Cli, ColorMode, Commands};
use ibdsdi::IbdError;

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, IbdError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| IbdError::Io(format!("cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };
    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Info { file } => {
            cli::info::execute(&cli::info::InfoOptions { file }, &mut writer)
        }
        Commands::Sdi { file, pretty } => {
            cli::sdi::execute(&cli::sdi::SdiOptions { file, pretty }, &mut writer)
        }
        Commands::Ddl { file } => cli::ddl::execute(&cli::ddl::DdlOptions { file }, &mut writer),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

//! CLI subcommand implementations.
//!
//! Each subcommand has an `Options` struct and a
//! `pub fn execute(opts, writer) -> Result<(), IbdError>` entry point.
//! The `writer: &mut dyn Write` parameter allows output to be captured
//! in tests or redirected to a file.

pub mod app;
pub mod ddl;
pub mod info;
pub mod sdi;

use std::fs::File;
use std::io::BufReader;

use crate::innodb::tablespace::TableSpace;
use crate::IbdError;

/// Write a line to the given writer, converting io::Error to IbdError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::IbdError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::IbdError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;

/// Open a tablespace file for streaming reads.
pub(crate) fn open_tablespace(path: &str) -> Result<TableSpace<BufReader<File>>, IbdError> {
    let file =
        File::open(path).map_err(|e| IbdError::Io(format!("cannot open {}: {}", path, e)))?;
    TableSpace::new(BufReader::new(file))
}

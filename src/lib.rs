#[cfg(feature = "cli")]
pub mod cli;
pub mod innodb;

use thiserror::Error;

/// Errors reported while reading a tablespace or rendering DDL.
///
/// Every variant is fatal: extraction stops at the first error and no
/// partial record stream is returned. Variants carry the page number,
/// offset, or expected-vs-got values needed for diagnostics.
#[derive(Error, Debug)]
pub enum IbdError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("short read: needed the stream up to byte {needed}, it ended at byte {available}")]
    ShortRead { needed: u64, available: u64 },

    #[error("corrupt tablespace flags {flags:#010x}: {reason}")]
    CorruptFlags { flags: u32, reason: &'static str },

    #[error("first page number is {0}, expected 0: not a file-per-table tablespace")]
    NotFilePerTable(u32),

    #[error("unsupported {kind} page size {size}")]
    UnsupportedPageSize { kind: &'static str, size: u32 },

    #[error("page {page}: expected page type {expected}, got {got}")]
    WrongPageType { page: u32, expected: u16, got: u16 },

    #[error("tablespace carries no SDI records")]
    EmptySdi,

    #[error("page {page}: level {got} does not follow parent level {parent}")]
    LevelSkew { page: u32, parent: u16, got: u16 },

    #[error("B-tree references reserved page {0}")]
    ReservedPageRef(u32),

    #[error("page {page}: corrupt record link at offset {offset}: {reason}")]
    CorruptRecordLink {
        page: u32,
        offset: u32,
        reason: String,
    },

    #[error("page {page}: compressed page directory mismatch: {reason}")]
    DirMismatch { page: u32, reason: String },

    #[error("{what}: declared length {declared}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        declared: u64,
        actual: u64,
    },

    #[error("SDI blob chain broken at page {page}: {reason}")]
    BlobChainBroken { page: u32, reason: String },

    #[error("page {page}: zlib inflate failed: {reason}")]
    DecompressionFailed { page: u32, reason: String },

    #[error("SDI object {id}: unreadable JSON: {reason}")]
    JsonUnreadable { id: u64, reason: String },
}

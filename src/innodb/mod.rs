//! InnoDB on-disk format parsing for SDI extraction.
//!
//! This module reads the binary structures of a MySQL 8.x file-per-table
//! tablespace (`.ibd`) far enough to reach its embedded data dictionary:
//! the file-space header on page 0, the SDI index B-tree, compact-format
//! records, compressed page images, and off-page BLOB chains.
//!
//! Start with [`tablespace::TableSpace`] to open a byte stream, then drain
//! [`tablespace::TableSpace::sdi_records`] and hand type-1 records to
//! [`schema::table_ddl`].
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`tablespace`] | Stream-backed tablespace session, page fetch, SDI B-tree walk |
//! | [`page_size`] | Page geometry derived from the FSP flags word |
//! | [`page`] | Per-page image, header fields, compressed-page reconstruction |
//! | [`record`] | Compact record format: status bits, delete mark, next-record links |
//! | [`sdi`] | SDI record type, payload inflation, `ibd2sdi` JSON envelope |
//! | [`lob`] | Off-page SDI BLOB page headers |
//! | [`schema`] | `CREATE TABLE` reconstruction from SDI dictionary JSON |
//! | [`collation`] | Static MySQL collation id catalog |
//! | [`constants`] | Page/file structure constants from the MySQL source headers |

pub mod collation;
pub mod constants;
pub mod lob;
pub mod page;
pub mod page_size;
pub mod record;
pub mod schema;
pub mod sdi;
pub mod tablespace;

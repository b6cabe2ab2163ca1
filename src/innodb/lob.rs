//! Off-page SDI BLOB pages.
//!
//! A dictionary value too large for its record is stored as a chain of
//! BLOB pages. Each carries a 10-byte header at `FIL_PAGE_DATA` whose
//! first 4 bytes give the part length on that page; the chain is linked
//! through the FIL next-page pointer and ends at `FIL_NULL`.

use byteorder::{BigEndian, ByteOrder};

use crate::innodb::constants::*;

/// Number of value bytes stored on a BLOB page.
pub fn part_len(page: &[u8]) -> u32 {
    BigEndian::read_u32(&page[FIL_PAGE_DATA + LOB_HDR_PART_LEN..])
}

/// The page type SDI BLOB pages carry, which depends on whether the
/// tablespace stores compressed pages.
pub fn expected_blob_type(is_compressed: bool) -> u16 {
    if is_compressed {
        FIL_PAGE_SDI_ZBLOB
    } else {
        FIL_PAGE_SDI_BLOB
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_len_reads_the_lob_header() {
        let mut page = vec![0u8; 256];
        BigEndian::write_u32(&mut page[FIL_PAGE_DATA..], 8000);
        assert_eq!(part_len(&page), 8000);
    }

    #[test]
    fn blob_type_follows_the_tablespace_format() {
        assert_eq!(expected_blob_type(false), FIL_PAGE_SDI_BLOB);
        assert_eq!(expected_blob_type(true), FIL_PAGE_SDI_ZBLOB);
    }
}

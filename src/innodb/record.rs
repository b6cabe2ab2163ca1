//! Compact record format helpers.
//!
//! Each new-style record is preceded by 5 extra bytes holding the info
//! bits, the heap number and status, and a relative next-record offset.
//! The walker only needs three things from this header: the record status,
//! the delete mark, and a validated link to the next record on the page.

use byteorder::{BigEndian, ByteOrder};

use crate::innodb::constants::*;
use crate::innodb::page::Page;
use crate::IbdError;

/// Record status from the low 3 bits of the byte at origin minus 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// Ordinary user record on a leaf page.
    Ordinary,
    /// Node pointer record on a non-leaf page.
    NodePtr,
    /// Infimum system record.
    Infimum,
    /// Supremum system record.
    Supremum,
}

impl RecordStatus {
    /// Decode a status value. Values above 3 are unused by InnoDB and
    /// indicate corruption.
    ///
    /// # Examples
    ///
    /// ```
    /// use ibdsdi::innodb::record::RecordStatus;
    ///
    /// assert_eq!(RecordStatus::from_bits(0), Some(RecordStatus::Ordinary));
    /// assert_eq!(RecordStatus::from_bits(3), Some(RecordStatus::Supremum));
    /// assert_eq!(RecordStatus::from_bits(5), None);
    /// ```
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0 => Some(RecordStatus::Ordinary),
            1 => Some(RecordStatus::NodePtr),
            2 => Some(RecordStatus::Infimum),
            3 => Some(RecordStatus::Supremum),
            _ => None,
        }
    }
}

/// Record-format capability of one index page, selected once from the
/// compact flag in the page header. Only the new-style compact format is
/// implemented; SDI indexes are always created compact.
#[derive(Debug, Clone, Copy)]
pub enum RecordFormat {
    Compact,
}

impl RecordFormat {
    /// Select the record format for a page, rejecting old-style pages.
    pub fn for_page(page: &Page) -> Result<Self, IbdError> {
        if page.is_compact() {
            Ok(RecordFormat::Compact)
        } else {
            Err(IbdError::CorruptRecordLink {
                page: page.page_num(),
                offset: 0,
                reason: "page is not in new-style compact format".to_string(),
            })
        }
    }

    /// Status of the record at `offset`.
    pub fn status(&self, page: &Page, offset: u16) -> Result<RecordStatus, IbdError> {
        let RecordFormat::Compact = *self;
        let bits = page.data()[offset as usize - REC_OFF_TYPE];
        RecordStatus::from_bits(bits).ok_or_else(|| IbdError::CorruptRecordLink {
            page: page.page_num(),
            offset: offset as u32,
            reason: format!("unknown record status {}", bits & 0x07),
        })
    }

    /// True when the record at `offset` carries the delete mark.
    pub fn is_delete_marked(&self, page: &Page, offset: u16) -> bool {
        let RecordFormat::Compact = *self;
        page.data()[offset as usize - REC_NEW_INFO_BITS] & REC_INFO_DELETED_FLAG != 0
    }

    /// Follow the next-record link of the record at `offset`.
    ///
    /// The stored field is a 16-bit delta added to the record origin modulo
    /// the logical page size. A zero delta, a delta smaller than the record
    /// header, or a target outside the user-record area is corruption:
    /// forward traversal always ends at the supremum record, never by
    /// running off the chain.
    pub fn next_offset(&self, page: &Page, offset: u16) -> Result<u16, IbdError> {
        let RecordFormat::Compact = *self;
        let data = page.data();
        let delta = BigEndian::read_u16(&data[offset as usize - REC_NEXT..]);

        let corrupt = |reason: String| IbdError::CorruptRecordLink {
            page: page.page_num(),
            offset: offset as u32,
            reason,
        };

        if delta == 0 {
            return Err(corrupt("zero next-record delta".to_string()));
        }
        // Consecutive records are at least one record header apart.
        if (delta as i16).unsigned_abs() as usize <= REC_N_NEW_EXTRA_BYTES {
            return Err(corrupt(format!("implausible next-record delta {}", delta as i16)));
        }

        let logical = page.size().logical;
        let next = (offset.wrapping_add(delta)) & (logical - 1) as u16;
        let upper = (logical as usize - PAGE_EMPTY_DIR_START) as u16;
        if next < PAGE_NEW_INFIMUM as u16 || next > upper {
            return Err(corrupt(format!("next record offset {} outside the page", next)));
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::page_size::PageSize;

    fn page_with(edit: impl FnOnce(&mut [u8])) -> Page {
        let mut data = vec![0u8; 16384];
        BigEndian::write_u16(&mut data[PAGE_HEADER + PAGE_N_HEAP..], 0x8000 | 4);
        edit(&mut data);
        Page::new(3, PageSize::from_flags(0).unwrap(), data)
    }

    #[test]
    fn redundant_pages_are_rejected() {
        let page = page_with(|d| {
            BigEndian::write_u16(&mut d[PAGE_HEADER + PAGE_N_HEAP..], 4);
        });
        assert!(matches!(
            RecordFormat::for_page(&page).unwrap_err(),
            IbdError::CorruptRecordLink { page: 3, .. }
        ));
    }

    #[test]
    fn status_and_delete_mark() {
        let page = page_with(|d| {
            d[200 - REC_OFF_TYPE] = 0x08; // heap bits set, status ordinary
            d[200 - REC_NEW_INFO_BITS] = REC_INFO_DELETED_FLAG;
            d[300 - REC_OFF_TYPE] = 3;
        });
        let fmt = RecordFormat::for_page(&page).unwrap();
        assert_eq!(fmt.status(&page, 200).unwrap(), RecordStatus::Ordinary);
        assert_eq!(fmt.status(&page, 300).unwrap(), RecordStatus::Supremum);
        assert!(fmt.is_delete_marked(&page, 200));
        assert!(!fmt.is_delete_marked(&page, 300));
    }

    #[test]
    fn unknown_status_is_corruption() {
        let page = page_with(|d| d[200 - REC_OFF_TYPE] = 5);
        let fmt = RecordFormat::for_page(&page).unwrap();
        assert!(fmt.status(&page, 200).is_err());
    }

    #[test]
    fn forward_and_backward_links() {
        let page = page_with(|d| {
            BigEndian::write_u16(&mut d[200 - REC_NEXT..], 100);
            // 150 -> 112 (supremum) via a negative delta
            BigEndian::write_u16(&mut d[150 - REC_NEXT..], (112u16).wrapping_sub(150));
        });
        let fmt = RecordFormat::for_page(&page).unwrap();
        assert_eq!(fmt.next_offset(&page, 200).unwrap(), 300);
        assert_eq!(fmt.next_offset(&page, 150).unwrap(), 112);
    }

    #[test]
    fn invalid_links_are_rejected() {
        let page = page_with(|d| {
            // delta 0 at 200, delta 3 at 210, target below infimum at 220
            BigEndian::write_u16(&mut d[210 - REC_NEXT..], 3);
            BigEndian::write_u16(&mut d[220 - REC_NEXT..], (50u16).wrapping_sub(220));
        });
        let fmt = RecordFormat::for_page(&page).unwrap();
        assert!(fmt.next_offset(&page, 200).is_err());
        assert!(fmt.next_offset(&page, 210).is_err());
        assert!(fmt.next_offset(&page, 220).is_err());
    }
}

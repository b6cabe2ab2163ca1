//! Tablespace page geometry derived from the FSP flags word.
//!
//! Page 0 of every tablespace stores a flags word in its space header. Two
//! "log2 minus 9" fields in it determine the logical page size (the size of
//! a page image in memory) and, for compressed tablespaces, the smaller
//! physical page size stored on disk. [`PageSize`] captures both together
//! with their shift exponents; it is plumbed through every consumer so that
//! no global page-size state exists.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::innodb::constants::*;
use crate::IbdError;

/// Page size descriptor: physical and logical page size, shift exponents,
/// and whether the tablespace stores compressed pages.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageSize {
    /// On-disk page size in bytes.
    pub physical: u32,
    /// log2 of the physical size.
    pub physical_shift: u32,
    /// In-memory page size in bytes.
    pub logical: u32,
    /// log2 of the logical size.
    pub logical_shift: u32,
    /// Compressed page size as an ssize, 0 when uncompressed.
    pub ssize: u32,
    /// True when the physical size is a compressed page size.
    pub is_compressed: bool,
}

impl PageSize {
    /// Derive the page geometry from the FSP flags word of page 0.
    ///
    /// A zero PAGE_SSIZE field means the legacy 16 KiB page size; a zero
    /// ZIP_SSIZE field means the tablespace is not compressed and the
    /// physical size equals the logical size.
    ///
    /// # Examples
    ///
    /// ```
    /// use ibdsdi::innodb::page_size::PageSize;
    ///
    /// // flags = 0: legacy 16 KiB, uncompressed
    /// let ps = PageSize::from_flags(0).unwrap();
    /// assert_eq!(ps.logical, 16384);
    /// assert_eq!(ps.physical, 16384);
    /// assert!(!ps.is_compressed);
    /// ```
    pub fn from_flags(flags: u32) -> Result<Self, IbdError> {
        let mut ssize = fsp_flags_page_ssize(flags);
        if ssize == 0 {
            // Zero in fsp_flags means the legacy 16 KiB page size.
            ssize = UNIV_PAGE_SSIZE_ORIG;
        }
        // Convert from a 'log2 minus 9' to a page size in bytes.
        let logical = (UNIV_ZIP_SIZE_MIN >> 1) << ssize;

        let zip_ssize = fsp_flags_zip_ssize(flags);
        let (physical, is_compressed) = if zip_ssize == 0 {
            // No compressed pages: the physical page size is the logical one.
            (logical, false)
        } else {
            ((UNIV_ZIP_SIZE_MIN >> 1) << zip_ssize, true)
        };

        if is_compressed && physical > logical {
            return Err(IbdError::CorruptFlags {
                flags,
                reason: "compressed page size exceeds the logical page size",
            });
        }

        let mut ps = PageSize {
            physical,
            physical_shift: 0,
            logical,
            logical_shift: 0,
            ssize: 0,
            is_compressed,
        };
        ps.derive_shifts()?;
        Ok(ps)
    }

    /// Find the shift exponents for the logical and physical sizes, failing
    /// when either size falls outside the supported ranges.
    fn derive_shifts(&mut self) -> Result<(), IbdError> {
        for n in UNIV_PAGE_SIZE_SHIFT_MIN..=UNIV_PAGE_SIZE_SHIFT_MAX {
            if self.logical == 1 << n {
                self.logical_shift = n;
                break;
            }
        }
        if self.logical_shift == 0 {
            return Err(IbdError::UnsupportedPageSize {
                kind: "logical",
                size: self.logical,
            });
        }

        let (min, max) = if self.is_compressed {
            (UNIV_ZIP_SIZE_SHIFT_MIN, UNIV_ZIP_SIZE_SHIFT_MAX)
        } else {
            (UNIV_PAGE_SIZE_SHIFT_MIN, UNIV_PAGE_SIZE_SHIFT_MAX)
        };
        for n in min..=max {
            if self.physical == 1 << n {
                self.physical_shift = n;
                break;
            }
        }
        if self.physical_shift == 0 {
            return Err(IbdError::UnsupportedPageSize {
                kind: "physical",
                size: self.physical,
            });
        }

        if self.is_compressed {
            self.ssize = self.physical_shift - UNIV_ZIP_SIZE_SHIFT_MIN + 1;
        }
        Ok(())
    }

    /// File space extent size in pages.
    ///
    /// | page size | extent |
    /// |-----------|--------|
    /// |  4 KiB    | 256 pages = 1 MiB |
    /// |  8 KiB    | 128 pages = 1 MiB |
    /// | 16 KiB    |  64 pages = 1 MiB |
    /// | 32 KiB    |  64 pages = 2 MiB |
    /// | 64 KiB    |  64 pages = 4 MiB |
    pub fn extent_size(&self) -> u32 {
        const KIB: u32 = 1024;
        const MIB: u32 = 1024 * 1024;
        match self.logical {
            s if s <= 16 * KIB => MIB / s,
            s if s <= 32 * KIB => 2 * MIB / s,
            s => 4 * MIB / s,
        }
    }

    /// Size of one extent descriptor entry on page 0.
    pub fn xdes_size(&self) -> u32 {
        XDES_BITMAP as u32 + bits_in_bytes(self.extent_size() * XDES_BITS_PER_PAGE)
    }

    /// Number of extent descriptor entries on page 0.
    pub fn xdes_arr_size(&self) -> u32 {
        self.physical / self.extent_size()
    }

    /// Byte offset on page 0 of the SDI version and root page number, right
    /// after the extent descriptor array and the encryption info block.
    pub fn sdi_meta_offset(&self) -> u32 {
        XDES_ARR_OFFSET as u32
            + self.xdes_size() * self.xdes_arr_size()
            + ENCRYPTION_INFO_MAX_SIZE as u32
    }
}

/// Minimum number of bytes needed to store the given number of bits.
fn bits_in_bytes(bits: u32) -> u32 {
    (bits + 7) / 8
}

/// Read a 32-bit field from the space header of page 0.
///
/// The space header reader is the single little-endian path in the on-disk
/// format handling; every other multi-byte field is big-endian.
pub fn fsp_header_read_field(page: &[u8], field: usize) -> u32 {
    LittleEndian::read_u32(&page[FSP_HEADER_OFFSET + field..])
}

/// Read the tablespace flags from the first page of a tablespace.
pub fn fsp_header_flags(page: &[u8]) -> u32 {
    fsp_header_read_field(page, FSP_SPACE_FLAGS)
}

/// Extract the PAGE_SSIZE field from the tablespace flags.
pub fn fsp_flags_page_ssize(flags: u32) -> u32 {
    (flags & FSP_FLAGS_MASK_PAGE_SSIZE) >> FSP_FLAGS_POS_PAGE_SSIZE
}

/// Extract the ZIP_SSIZE field from the tablespace flags.
pub fn fsp_flags_zip_ssize(flags: u32) -> u32 {
    (flags & FSP_FLAGS_MASK_ZIP_SSIZE) >> FSP_FLAGS_POS_ZIP_SSIZE
}

/// True when the SDI flag is set in the tablespace flags.
pub fn fsp_flags_has_sdi(flags: u32) -> bool {
    flags & FSP_FLAGS_MASK_SDI != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flags with the given page ssize and zip ssize fields.
    fn flags(page_ssize: u32, zip_ssize: u32) -> u32 {
        (1 << FSP_FLAGS_POS_POST_ANTELOPE)
            | (zip_ssize << FSP_FLAGS_POS_ZIP_SSIZE)
            | (1 << FSP_FLAGS_POS_ATOMIC_BLOBS)
            | (page_ssize << FSP_FLAGS_POS_PAGE_SSIZE)
            | FSP_FLAGS_MASK_SDI
    }

    #[test]
    fn legacy_flags_mean_16k_uncompressed() {
        let ps = PageSize::from_flags(0).unwrap();
        assert_eq!(ps.logical, 16384);
        assert_eq!(ps.logical_shift, 14);
        assert_eq!(ps.physical, 16384);
        assert_eq!(ps.physical_shift, 14);
        assert!(!ps.is_compressed);
        assert_eq!(ps.ssize, 0);
    }

    #[test]
    fn explicit_page_sizes() {
        for (ssize, size) in [(3u32, 4096u32), (4, 8192), (5, 16384), (6, 32768), (7, 65536)] {
            let ps = PageSize::from_flags(flags(ssize, 0)).unwrap();
            assert_eq!(ps.logical, size);
            assert_eq!(ps.physical, size);
        }
    }

    #[test]
    fn compressed_geometry() {
        // 16 KiB logical, 8 KiB physical
        let ps = PageSize::from_flags(flags(5, 4)).unwrap();
        assert_eq!(ps.logical, 16384);
        assert_eq!(ps.physical, 8192);
        assert_eq!(ps.physical_shift, 13);
        assert!(ps.is_compressed);
        assert_eq!(ps.ssize, 13 - UNIV_ZIP_SIZE_SHIFT_MIN + 1);
    }

    #[test]
    fn undersized_logical_page_is_rejected() {
        // page_ssize = 2 decodes to a 2 KiB logical page
        let err = PageSize::from_flags(flags(2, 0)).unwrap_err();
        assert!(matches!(
            err,
            IbdError::UnsupportedPageSize { kind: "logical", size: 2048 }
        ));
    }

    #[test]
    fn zip_size_larger_than_logical_is_corrupt() {
        // 4 KiB logical with a 16 KiB zip size
        let err = PageSize::from_flags(flags(3, 5)).unwrap_err();
        assert!(matches!(err, IbdError::CorruptFlags { .. }));
    }

    #[test]
    fn sdi_meta_offsets_per_page_size() {
        for (page_ssize, expected) in [(3u32, 1673u32), (4, 3849), (5, 10505), (6, 20745), (7, 41225)] {
            let ps = PageSize::from_flags(flags(page_ssize, 0)).unwrap();
            assert_eq!(ps.sdi_meta_offset(), expected, "page_ssize {}", page_ssize);
        }
        // compressed 16 KiB / 8 KiB: fewer descriptor entries fit the physical page
        let ps = PageSize::from_flags(flags(5, 4)).unwrap();
        assert_eq!(ps.sdi_meta_offset(), 150 + 40 * 128 + 115);
    }

    #[test]
    fn fsp_field_reads_are_little_endian() {
        let mut page = vec![0u8; 256];
        page[FSP_HEADER_OFFSET + FSP_SPACE_FLAGS] = 0x21;
        page[FSP_HEADER_OFFSET + FSP_SPACE_FLAGS + 1] = 0x43;
        assert_eq!(fsp_header_flags(&page), 0x4321);
    }

    #[test]
    fn sdi_flag() {
        assert!(fsp_flags_has_sdi(FSP_FLAGS_MASK_SDI));
        assert!(!fsp_flags_has_sdi(0));
    }
}

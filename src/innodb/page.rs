//! Per-page image handling: FIL header fields, index page header fields,
//! and reconstruction of the uncompressed image of a compressed page.
//!
//! A [`Page`] always owns its on-disk bytes (`origin`). For uncompressed
//! tablespaces the uncompressed image is the origin itself; for compressed
//! tablespaces [`Page::decode`] rebuilds the full logical image by copying
//! the headers, regenerating the sparse page directory from the dense
//! directory at the tail of the physical page, restoring the infimum and
//! supremum system records, and inflating the zlib payload.

use byteorder::{BigEndian, ByteOrder};
use flate2::read::ZlibDecoder;
use std::io::Read;

use crate::innodb::constants::*;
use crate::innodb::page_size::PageSize;
use crate::IbdError;

/// Extra bytes of the infimum record: info_bits=0, n_owned=1, heap_no=0,
/// status=infimum. The trailing 2-byte next pointer is written separately.
const INFIMUM_EXTRA: [u8; 3] = [0x01, 0x00, 0x02];

/// Data bytes of the infimum record.
const INFIMUM_DATA: [u8; 8] = *b"infimum\0";

/// Extra bytes (minus the leading info byte) and data bytes of the
/// supremum record: heap_no=1, status=supremum, next=0, "supremum".
const SUPREMUM_EXTRA_DATA: [u8; 12] = [
    0x00, 0x0b, 0x00, 0x00, b's', b'u', b'p', b'r', b'e', b'm', b'u', b'm',
];

/// One page of a tablespace.
///
/// The origin holds exactly one physical page as stored on disk. The
/// uncompressed image is a distinct allocation only for decoded compressed
/// pages; otherwise it is the origin itself.
#[derive(Debug)]
pub struct Page {
    page_num: u32,
    size: PageSize,
    origin: Vec<u8>,
    uncompressed: Option<Vec<u8>>,
    heap_offsets: Vec<u16>,
}

impl Page {
    /// Wrap one physical page. Decoding of compressed pages is deferred to
    /// [`Page::decode`] so that non-index pages (BLOB chains) can be read
    /// without running the index-page reconstruction.
    pub fn new(page_num: u32, size: PageSize, origin: Vec<u8>) -> Self {
        Page {
            page_num,
            size,
            origin,
            uncompressed: None,
            heap_offsets: Vec::new(),
        }
    }

    /// Page number this image was fetched as.
    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    /// Geometry of the owning tablespace.
    pub fn size(&self) -> &PageSize {
        &self.size
    }

    /// The raw physical page bytes.
    pub fn origin(&self) -> &[u8] {
        &self.origin
    }

    /// The uncompressed page image.
    ///
    /// Valid for record-level access only after [`Page::decode`] on a
    /// compressed page; FIL and index header fields are readable either way
    /// because decoding retains the header bytes verbatim.
    pub fn data(&self) -> &[u8] {
        self.uncompressed.as_deref().unwrap_or(&self.origin)
    }

    /// Page type from the FIL header.
    pub fn page_type(&self) -> u16 {
        BigEndian::read_u16(&self.origin[FIL_PAGE_TYPE..])
    }

    /// Next-page pointer from the FIL header; `FIL_NULL` when there is no
    /// successor.
    pub fn next_page(&self) -> u32 {
        BigEndian::read_u32(&self.origin[FIL_PAGE_NEXT..])
    }

    /// A 2-byte index page header field.
    fn header_field(&self, field: usize) -> u16 {
        BigEndian::read_u16(&self.origin[PAGE_HEADER + field..])
    }

    /// Level of the page in the index tree; 0 is a leaf.
    pub fn page_level(&self) -> u16 {
        self.header_field(PAGE_LEVEL)
    }

    /// Number of user records on the page (infimum and supremum are not
    /// user records).
    pub fn n_recs(&self) -> u16 {
        self.header_field(PAGE_N_RECS)
    }

    /// Number of directory slots in the sparse page directory.
    pub fn n_dir_slots(&self) -> u16 {
        self.header_field(PAGE_N_DIR_SLOTS)
    }

    /// Number of records in the heap, with the format flag masked off.
    pub fn n_heap(&self) -> u16 {
        self.header_field(PAGE_N_HEAP) & 0x7fff
    }

    /// True when the page is in the new-style compact format (bit 15 of
    /// PAGE_N_HEAP).
    pub fn is_compact(&self) -> bool {
        self.header_field(PAGE_N_HEAP) & 0x8000 != 0
    }

    /// True when the page holds no user records.
    pub fn is_empty(&self) -> bool {
        self.n_recs() == 0
    }

    /// Record offsets recovered from the dense directory of a decoded
    /// compressed page, ascending. Empty for uncompressed pages.
    pub fn heap_offsets(&self) -> &[u16] {
        &self.heap_offsets
    }

    /// Read the nth entry of the dense page directory, which grows down
    /// from the end of the physical page.
    fn zip_dir_get(&self, slot: u32) -> u16 {
        let offset = self.size.physical as usize - PAGE_ZIP_DIR_SLOT_SIZE * (slot as usize + 1);
        BigEndian::read_u16(&self.origin[offset..])
    }

    /// Reconstruct the uncompressed image of a compressed page.
    ///
    /// No-op for uncompressed tablespaces and for pages already decoded.
    pub fn decode(&mut self) -> Result<(), IbdError> {
        if !self.size.is_compressed || self.uncompressed.is_some() {
            return Ok(());
        }

        let n_heap = self.n_heap();
        if n_heap < PAGE_HEAP_NO_USER_LOW {
            return Err(self.dir_mismatch(format!("heap holds {} records", n_heap)));
        }
        // Dense directory entries, excluding infimum and supremum.
        let n_dense = n_heap - PAGE_HEAP_NO_USER_LOW;
        if n_dense as usize * PAGE_ZIP_DIR_SLOT_SIZE >= self.size.physical as usize {
            return Err(self.dir_mismatch(format!(
                "dense directory of {} entries does not fit a {}-byte page",
                n_dense, self.size.physical
            )));
        }

        let mut image = vec![0u8; self.size.logical as usize];
        // The FIL and index page headers are stored uncompressed.
        image[..PAGE_DATA].copy_from_slice(&self.origin[..PAGE_DATA]);

        let (first_rec, heap_offsets) = self.rebuild_directory(&mut image)?;

        // Restore the infimum and supremum records, which are omitted from
        // the compressed image.
        image[PAGE_NEW_INFIMUM - REC_N_NEW_EXTRA_BYTES..PAGE_NEW_INFIMUM - REC_NEXT]
            .copy_from_slice(&INFIMUM_EXTRA);
        let infimum_next = match first_rec {
            Some(rec) => rec,
            None => PAGE_NEW_SUPREMUM as u16,
        };
        rec_set_next(&mut image, PAGE_NEW_INFIMUM, infimum_next);
        image[PAGE_NEW_INFIMUM..PAGE_NEW_INFIMUM + INFIMUM_DATA.len()]
            .copy_from_slice(&INFIMUM_DATA);
        image[PAGE_NEW_SUPREMUM - REC_N_NEW_EXTRA_BYTES + 1..PAGE_NEW_SUPREMUM_END]
            .copy_from_slice(&SUPREMUM_EXTRA_DATA);

        // The record heap is a single zlib stream covering everything past
        // the system records.
        let input = &self.origin[PAGE_DATA..self.size.physical as usize - 1];
        let mut decoder = ZlibDecoder::new(input);
        decoder
            .read_exact(&mut image[PAGE_ZIP_START..])
            .map_err(|e| IbdError::DecompressionFailed {
                page: self.page_num,
                reason: e.to_string(),
            })?;

        self.uncompressed = Some(image);
        self.heap_offsets = heap_offsets;
        Ok(())
    }

    /// Populate the sparse page directory of `image` from the dense
    /// directory at the tail of the physical page.
    ///
    /// Returns the offset of the first user record in collation order (or
    /// `None` when the page is empty) and every heap record offset in
    /// ascending order.
    fn rebuild_directory(&self, image: &mut [u8]) -> Result<(Option<u16>, Vec<u16>), IbdError> {
        let n_dense = self.n_heap() - PAGE_HEAP_NO_USER_LOW;
        let n_recs = self.n_recs();
        if n_recs > n_dense {
            return Err(self.dir_mismatch(format!(
                "{} user records exceed {} dense entries",
                n_recs, n_dense
            )));
        }

        let logical = self.size.logical as usize;
        let mut slot = logical - PAGE_DIR - PAGE_DIR_SLOT_SIZE;
        BigEndian::write_u16(&mut image[slot..], PAGE_NEW_INFIMUM as u16);
        slot -= PAGE_DIR_SLOT_SIZE;

        // Walk the stored records in collation order; an entry owning a
        // directory run fills the next sparse slot.
        for i in 0..n_recs as u32 {
            let entry = self.zip_dir_get(i);
            let offs = entry & PAGE_ZIP_DIR_SLOT_MASK;
            if entry & PAGE_ZIP_DIR_SLOT_OWNED != 0 {
                if slot < PAGE_ZIP_START {
                    return Err(
                        self.dir_mismatch("sparse directory grows into the record heap".into())
                    );
                }
                BigEndian::write_u16(&mut image[slot..], offs);
                slot -= PAGE_DIR_SLOT_SIZE;
            }
            if (offs as usize) < PAGE_ZIP_START + REC_N_NEW_EXTRA_BYTES {
                return Err(self.dir_mismatch(format!(
                    "entry {} points at offset {} inside the system area",
                    i, offs
                )));
            }
        }
        BigEndian::write_u16(&mut image[slot..], PAGE_NEW_SUPREMUM as u16);

        let expected = logical - PAGE_DIR - self.n_dir_slots() as usize * PAGE_DIR_SLOT_SIZE;
        if slot != expected {
            return Err(self.dir_mismatch(format!(
                "directory ends at {}, header says {} slots (offset {})",
                slot,
                self.n_dir_slots(),
                expected
            )));
        }

        // The remaining dense entries cover the free list; collect every
        // record offset in ascending order.
        let mut recs = Vec::with_capacity(n_dense as usize);
        for i in 0..n_dense as u32 {
            let offs = self.zip_dir_get(i) & PAGE_ZIP_DIR_SLOT_MASK;
            if (offs as usize) < PAGE_ZIP_START + REC_N_NEW_EXTRA_BYTES {
                return Err(self.dir_mismatch(format!(
                    "dense entry {} points at offset {} inside the system area",
                    i, offs
                )));
            }
            recs.push(offs);
        }
        recs.sort_unstable();

        let first = if n_recs == 0 {
            None
        } else {
            Some(self.zip_dir_get(0) & PAGE_ZIP_DIR_SLOT_MASK)
        };
        Ok((first, recs))
    }

    fn dir_mismatch(&self, reason: String) -> IbdError {
        IbdError::DirMismatch {
            page: self.page_num,
            reason,
        }
    }
}

/// Set the next-record offset field of a new-style record: the field holds
/// `next - current` modulo 64 KiB.
fn rec_set_next(image: &mut [u8], current: usize, next: u16) {
    let delta = next.wrapping_sub(current as u16);
    BigEndian::write_u16(&mut image[current - REC_NEXT..], delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::page_size::PageSize;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn compressed_16k_8k() -> PageSize {
        // post_antelope | zip_ssize=4 | atomic_blobs | page_ssize=5 | sdi
        PageSize::from_flags(1 | (4 << 1) | (1 << 5) | (5 << 6) | (1 << 14)).unwrap()
    }

    fn uncompressed_16k() -> PageSize {
        PageSize::from_flags(0).unwrap()
    }

    /// Build a compressed SDI page holding one record at `rec`, and the
    /// logical image it should decode to.
    fn build_zip_page(rec: usize) -> (Vec<u8>, Vec<u8>) {
        let size = compressed_16k_8k();
        let logical = size.logical as usize;
        let physical = size.physical as usize;

        let mut image = vec![0u8; logical];
        BigEndian::write_u16(&mut image[FIL_PAGE_TYPE..], FIL_PAGE_SDI);
        BigEndian::write_u32(&mut image[FIL_PAGE_NEXT..], FIL_NULL);
        BigEndian::write_u16(&mut image[PAGE_HEADER + PAGE_N_HEAP..], 0x8000 | 3);
        BigEndian::write_u16(&mut image[PAGE_HEADER + PAGE_N_RECS..], 1);
        BigEndian::write_u16(&mut image[PAGE_HEADER + PAGE_N_DIR_SLOTS..], 3);

        // Record body: a recognizable byte pattern.
        for (i, b) in image[rec..rec + 16].iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        // Record links: infimum -> rec -> supremum.
        BigEndian::write_u16(&mut image[rec - REC_NEXT..], (112u16).wrapping_sub(rec as u16));

        // Sparse directory, bottom-up: supremum, record, infimum.
        BigEndian::write_u16(&mut image[logical - 10..], PAGE_NEW_INFIMUM as u16);
        BigEndian::write_u16(&mut image[logical - 12..], rec as u16);
        BigEndian::write_u16(&mut image[logical - 14..], PAGE_NEW_SUPREMUM as u16);

        // System records as the decoder restores them.
        image[PAGE_NEW_INFIMUM - 5..PAGE_NEW_INFIMUM - 2].copy_from_slice(&INFIMUM_EXTRA);
        rec_set_next(&mut image, PAGE_NEW_INFIMUM, rec as u16);
        image[PAGE_NEW_INFIMUM..PAGE_NEW_INFIMUM + 8].copy_from_slice(&INFIMUM_DATA);
        image[PAGE_NEW_SUPREMUM - 4..PAGE_NEW_SUPREMUM_END].copy_from_slice(&SUPREMUM_EXTRA_DATA);

        // Physical page: headers, deflated heap, dense directory at the tail.
        let mut origin = vec![0u8; physical];
        origin[..PAGE_DATA].copy_from_slice(&image[..PAGE_DATA]);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&image[PAGE_ZIP_START..]).unwrap();
        let stream = encoder.finish().unwrap();
        assert!(PAGE_DATA + stream.len() < physical - 1);
        origin[PAGE_DATA..PAGE_DATA + stream.len()].copy_from_slice(&stream);
        BigEndian::write_u16(
            &mut origin[physical - 2..],
            rec as u16 | PAGE_ZIP_DIR_SLOT_OWNED,
        );

        (origin, image)
    }

    #[test]
    fn uncompressed_page_aliases_origin() {
        let mut origin = vec![0u8; 16384];
        BigEndian::write_u16(&mut origin[FIL_PAGE_TYPE..], FIL_PAGE_SDI);
        BigEndian::write_u16(&mut origin[PAGE_HEADER + PAGE_LEVEL..], 2);
        let mut page = Page::new(3, uncompressed_16k(), origin);
        page.decode().unwrap();
        assert_eq!(page.page_type(), FIL_PAGE_SDI);
        assert_eq!(page.page_level(), 2);
        assert_eq!(page.data().len(), 16384);
        assert_eq!(page.data().as_ptr(), page.origin().as_ptr());
    }

    #[test]
    fn decode_rebuilds_the_logical_image() {
        let rec = 200;
        let (origin, expected) = build_zip_page(rec);
        let mut page = Page::new(4, compressed_16k_8k(), origin);
        page.decode().unwrap();

        let data = page.data();
        assert_eq!(data.len(), expected.len());
        assert_eq!(&data[rec..rec + 16], &expected[rec..rec + 16]);
        assert_eq!(&data[PAGE_NEW_INFIMUM..PAGE_NEW_INFIMUM + 8], b"infimum\0");
        assert_eq!(&data[PAGE_NEW_SUPREMUM..PAGE_NEW_SUPREMUM + 8], b"supremum");
        // Infimum links to the first (only) record.
        let delta = BigEndian::read_u16(&data[PAGE_NEW_INFIMUM - REC_NEXT..]);
        assert_eq!(
            (PAGE_NEW_INFIMUM as u16).wrapping_add(delta),
            rec as u16
        );
        assert_eq!(data, &expected[..]);
        assert_eq!(page.heap_offsets(), &[rec as u16]);
    }

    #[test]
    fn slot_count_mismatch_is_reported() {
        let (origin, _) = build_zip_page(200);
        let mut page = Page::new(4, compressed_16k_8k(), origin);
        // Claim four directory slots while the dense directory yields three.
        BigEndian::write_u16(&mut page.origin[PAGE_HEADER + PAGE_N_DIR_SLOTS..], 4);
        let err = page.decode().unwrap_err();
        assert!(matches!(err, IbdError::DirMismatch { page: 4, .. }));
    }

    #[test]
    fn dense_entry_below_heap_start_is_reported() {
        let (mut origin, _) = build_zip_page(200);
        let physical = origin.len();
        BigEndian::write_u16(
            &mut origin[physical - 2..],
            100 | PAGE_ZIP_DIR_SLOT_OWNED,
        );
        let mut page = Page::new(4, compressed_16k_8k(), origin);
        assert!(matches!(
            page.decode().unwrap_err(),
            IbdError::DirMismatch { .. }
        ));
    }

    #[test]
    fn truncated_stream_is_a_decompression_failure() {
        let (mut origin, _) = build_zip_page(200);
        // Deflate a stream that inflates to far fewer bytes than the heap.
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0u8; 64]).unwrap();
        let stream = encoder.finish().unwrap();
        origin[PAGE_DATA..].iter_mut().for_each(|b| *b = 0);
        origin[PAGE_DATA..PAGE_DATA + stream.len()].copy_from_slice(&stream);
        let physical = origin.len();
        BigEndian::write_u16(
            &mut origin[physical - 2..],
            200 | PAGE_ZIP_DIR_SLOT_OWNED,
        );
        let mut page = Page::new(4, compressed_16k_8k(), origin);
        assert!(matches!(
            page.decode().unwrap_err(),
            IbdError::DecompressionFailed { page: 4, .. }
        ));
    }
}

//! Stream-backed tablespace session.
//!
//! [`TableSpace`] wraps any `Read` whose prefix is a file-per-table `.ibd`
//! file. The stream is consumed strictly in order into a single growing
//! buffer; random page access below the high-water mark is served from the
//! buffer, access beyond it draws more bytes from the stream.
//!
//! Opening a tablespace resolves the page geometry from the flags word of
//! page 0 and locates the SDI root page behind the extent-descriptor array.
//! [`TableSpace::sdi_records`] then descends the SDI B-tree to its leftmost
//! leaf and streams every dictionary record in key order.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use byteorder::{BigEndian, ByteOrder};

use crate::innodb::constants::*;
use crate::innodb::lob;
use crate::innodb::page::Page;
use crate::innodb::page_size::{self, PageSize};
use crate::innodb::record::{RecordFormat, RecordStatus};
use crate::innodb::sdi::{self, SdiRecord};
use crate::IbdError;

/// An open tablespace: the input stream, the buffered prefix, the resolved
/// geometry, and the SDI root location.
pub struct TableSpace<R> {
    reader: R,
    buf: Vec<u8>,
    space_id: u32,
    flags: u32,
    page_size: PageSize,
    sdi_version: u32,
    sdi_root_page_num: u32,
}

impl<R> std::fmt::Debug for TableSpace<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSpace")
            .field("space_id", &self.space_id)
            .field("flags", &self.flags)
            .field("page_size", &self.page_size)
            .field("sdi_version", &self.sdi_version)
            .field("sdi_root_page_num", &self.sdi_root_page_num)
            .finish()
    }
}

impl<R: Read> TableSpace<R> {
    /// Open a tablespace from a byte stream.
    ///
    /// Reads the smallest possible physical page (1 KiB) to resolve the
    /// geometry, completes page 0, verifies the file starts at page number
    /// 0, and locates the SDI root. Fails with [`IbdError::EmptySdi`] when
    /// the tablespace carries no SDI.
    pub fn new(reader: R) -> Result<Self, IbdError> {
        let mut ts = TableSpace {
            reader,
            buf: Vec::new(),
            space_id: 0,
            flags: 0,
            page_size: PageSize::from_flags(0)?,
            sdi_version: 0,
            sdi_root_page_num: 0,
        };

        // The smallest supported physical page: enough for the FIL header
        // and the space header, including the flags word.
        ts.read_to_offset(UNIV_ZIP_SIZE_MIN as u64)?;
        ts.space_id = BigEndian::read_u32(&ts.buf[FIL_PAGE_SPACE_ID..]);
        let first_page_num = BigEndian::read_u32(&ts.buf[FIL_PAGE_OFFSET..]);

        ts.flags = page_size::fsp_header_flags(&ts.buf);
        ts.page_size = PageSize::from_flags(ts.flags)?;

        // Complete page 0 before touching anything past the first kibibyte.
        ts.read_to_offset(ts.page_size.physical as u64)?;

        if first_page_num != 0 {
            return Err(IbdError::NotFilePerTable(first_page_num));
        }

        let sdi_offset = ts.page_size.sdi_meta_offset() as usize;
        ts.sdi_version = BigEndian::read_u32(&ts.buf[sdi_offset..]);
        ts.sdi_root_page_num = BigEndian::read_u32(&ts.buf[sdi_offset + 4..]);
        if ts.sdi_root_page_num == 0 {
            return Err(IbdError::EmptySdi);
        }

        Ok(ts)
    }

    /// Space id from the FIL header of page 0.
    pub fn space_id(&self) -> u32 {
        self.space_id
    }

    /// The tablespace flags word.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// True when the flags word advertises an SDI index.
    pub fn has_sdi_flag(&self) -> bool {
        page_size::fsp_flags_has_sdi(self.flags)
    }

    /// Resolved page geometry.
    pub fn page_size(&self) -> &PageSize {
        &self.page_size
    }

    /// SDI version stored on page 0.
    pub fn sdi_version(&self) -> u32 {
        self.sdi_version
    }

    /// Page number of the SDI index root.
    pub fn sdi_root_page_num(&self) -> u32 {
        self.sdi_root_page_num
    }

    /// Draw bytes from the stream until the buffer covers `offset`.
    fn read_to_offset(&mut self, offset: u64) -> Result<(), IbdError> {
        let have = self.buf.len() as u64;
        if offset <= have {
            return Ok(());
        }
        let need = offset - have;
        let got = (&mut self.reader)
            .take(need)
            .read_to_end(&mut self.buf)
            .map_err(|e| IbdError::Io(e.to_string()))? as u64;
        if got < need {
            return Err(IbdError::ShortRead {
                needed: offset,
                available: have + got,
            });
        }
        Ok(())
    }

    /// Fetch a physical page by number, without decoding it.
    pub fn fetch_page(&mut self, page_num: u32) -> Result<Page, IbdError> {
        let physical = self.page_size.physical as u64;
        let start = page_num as u64 * physical;
        self.read_to_offset(start + physical)?;
        let origin = self.buf[start as usize..(start + physical) as usize].to_vec();
        Ok(Page::new(page_num, self.page_size, origin))
    }

    /// Fetch a page that must belong to the SDI index, decoding its
    /// uncompressed image.
    fn fetch_sdi_page(&mut self, page_num: u32) -> Result<Page, IbdError> {
        let mut page = self.fetch_page(page_num)?;
        let got = page.page_type();
        if got != FIL_PAGE_SDI {
            return Err(IbdError::WrongPageType {
                page: page_num,
                expected: FIL_PAGE_SDI,
                got,
            });
        }
        page.decode()?;
        Ok(page)
    }

    /// Descend the SDI B-tree from the root to its leftmost leaf.
    ///
    /// At every non-leaf page the infimum record links to the first user
    /// record, whose node pointer (right after the 12-byte key) names the
    /// child page. Each step must decrease the page level by exactly one.
    fn leftmost_leaf(&mut self) -> Result<Page, IbdError> {
        let root = self.fetch_sdi_page(self.sdi_root_page_num)?;
        if root.n_recs() == 0 {
            return Err(IbdError::EmptySdi);
        }

        let mut cur = root;
        while cur.page_level() > 0 {
            let fmt = RecordFormat::for_page(&cur)?;
            if fmt.status(&cur, PAGE_NEW_INFIMUM as u16)? != RecordStatus::Infimum {
                return Err(IbdError::CorruptRecordLink {
                    page: cur.page_num(),
                    offset: PAGE_NEW_INFIMUM as u32,
                    reason: "infimum record not found".to_string(),
                });
            }
            let first = fmt.next_offset(&cur, PAGE_NEW_INFIMUM as u16)?;

            let ptr = first as usize + REC_DATA_TYPE_LEN + REC_DATA_ID_LEN;
            let child = BigEndian::read_u32(&cur.data()[ptr..]);
            if child < SDI_BLOB_ALLOWED {
                return Err(IbdError::ReservedPageRef(child));
            }

            let next = self.fetch_sdi_page(child)?;
            if next.page_level() != cur.page_level() - 1 {
                return Err(IbdError::LevelSkew {
                    page: child,
                    parent: cur.page_level(),
                    got: next.page_level(),
                });
            }
            cur = next;
        }
        Ok(cur)
    }

    /// Stream every SDI record in B-tree leaf order (ascending by the
    /// `(type, id)` key). The iterator is lazy; the first error is
    /// terminal.
    pub fn sdi_records(&mut self) -> Result<SdiRecords<'_, R>, IbdError> {
        let leaf = self.leftmost_leaf()?;
        let format = RecordFormat::for_page(&leaf)?;
        let cur_page = leaf.page_num();
        let mut pages = HashMap::new();
        pages.insert(cur_page, leaf);
        Ok(SdiRecords {
            space: self,
            pages,
            format,
            cur_page,
            cur_offset: PAGE_NEW_INFIMUM as u16,
            finished: false,
        })
    }

    /// Collect every SDI record. Fails with [`IbdError::EmptySdi`] when the
    /// index yields no records at all.
    pub fn dump_sdi(&mut self) -> Result<Vec<SdiRecord>, IbdError> {
        let records = self.sdi_records()?.collect::<Result<Vec<_>, _>>()?;
        if records.is_empty() {
            return Err(IbdError::EmptySdi);
        }
        Ok(records)
    }

    /// Append the off-page part of an externally stored value to `out` by
    /// walking the BLOB chain starting at `first_page`.
    ///
    /// `total` is the declared external length; the concatenated part
    /// lengths must match it exactly.
    fn copy_blob(&mut self, first_page: u32, total: u64, out: &mut Vec<u8>) -> Result<(), IbdError> {
        let expected = lob::expected_blob_type(self.page_size.is_compressed);
        let physical = self.page_size.physical as usize;

        let mut page_num = first_page;
        let mut got: u64 = 0;
        let mut visited = HashSet::new();
        loop {
            if page_num == FIL_NULL {
                return Err(IbdError::BlobChainBroken {
                    page: page_num,
                    reason: "chain references FIL_NULL".to_string(),
                });
            }
            if page_num < SDI_BLOB_ALLOWED {
                return Err(IbdError::BlobChainBroken {
                    page: page_num,
                    reason: "chain references a reserved page".to_string(),
                });
            }
            if !visited.insert(page_num) {
                return Err(IbdError::BlobChainBroken {
                    page: page_num,
                    reason: "chain loops back on itself".to_string(),
                });
            }

            let page = self.fetch_page(page_num)?;
            let page_type = page.page_type();
            if page_type != expected {
                return Err(IbdError::BlobChainBroken {
                    page: page_num,
                    reason: format!("page type {}, expected {}", page_type, expected),
                });
            }

            let part = lob::part_len(page.origin()) as u64;
            if LOB_PAGE_DATA as u64 + part > physical as u64 {
                return Err(IbdError::BlobChainBroken {
                    page: page_num,
                    reason: format!("part length {} exceeds the page", part),
                });
            }
            if got + part > total {
                return Err(IbdError::BlobChainBroken {
                    page: page_num,
                    reason: format!("chain exceeds the declared {} bytes", total),
                });
            }
            out.extend_from_slice(&page.origin()[LOB_PAGE_DATA..LOB_PAGE_DATA + part as usize]);
            got += part;

            let next = page.next_page();
            if next == FIL_NULL {
                break;
            }
            page_num = next;
        }

        if got != total {
            return Err(IbdError::BlobChainBroken {
                page: first_page,
                reason: format!("chain ends after {} of {} bytes", got, total),
            });
        }
        Ok(())
    }
}

/// Lazy stream of SDI records off the leaf level of the SDI index.
///
/// Visited leaves are kept by page number, so no page is read twice and
/// a leaf chain that loops is detected.
pub struct SdiRecords<'a, R> {
    space: &'a mut TableSpace<R>,
    pages: HashMap<u32, Page>,
    format: RecordFormat,
    cur_page: u32,
    cur_offset: u16,
    finished: bool,
}

impl<R: Read> SdiRecords<'_, R> {
    /// Advance to the next live user record, skipping delete-marked
    /// records and crossing to the next leaf at supremum. Returns `None`
    /// at the end of the leaf chain.
    fn advance(&mut self) -> Result<Option<u16>, IbdError> {
        let mut offset = self.cur_offset;
        loop {
            let page = match self.pages.get(&self.cur_page) {
                Some(p) => p,
                None => {
                    return Err(IbdError::CorruptRecordLink {
                        page: self.cur_page,
                        offset: offset as u32,
                        reason: "walker lost its current page".to_string(),
                    })
                }
            };
            let next = self.format.next_offset(page, offset)?;
            match self.format.status(page, next)? {
                RecordStatus::Supremum => {
                    // Last record on this page: follow the leaf chain. Every
                    // leaf is visited exactly once going right, so a pointer
                    // back into a visited page is a cycle.
                    let next_page = page.next_page();
                    if next_page == FIL_NULL {
                        return Ok(None);
                    }
                    if self.pages.contains_key(&next_page) {
                        return Err(IbdError::CorruptRecordLink {
                            page: self.cur_page,
                            offset: next as u32,
                            reason: format!("leaf chain revisits page {}", next_page),
                        });
                    }
                    let leaf = self.space.fetch_sdi_page(next_page)?;
                    if leaf.page_level() != 0 {
                        return Err(IbdError::LevelSkew {
                            page: next_page,
                            parent: 0,
                            got: leaf.page_level(),
                        });
                    }
                    self.pages.insert(next_page, leaf);
                    self.cur_page = next_page;
                    offset = PAGE_NEW_INFIMUM as u16;
                }
                _ if self.format.is_delete_marked(page, next) => {
                    offset = next;
                }
                RecordStatus::Ordinary => {
                    return Ok(Some(next));
                }
                status => {
                    return Err(IbdError::CorruptRecordLink {
                        page: self.cur_page,
                        offset: next as u32,
                        reason: format!("unexpected {:?} record on the leaf level", status),
                    });
                }
            }
        }
    }

    /// Extract the SDI record at `offset` of the current page: fixed key
    /// and length fields, then the compressed payload (inline, or inline
    /// prefix plus BLOB chain), then the inflated JSON.
    fn parse_record(
        space: &mut TableSpace<R>,
        page: &Page,
        offset: u16,
    ) -> Result<SdiRecord, IbdError> {
        let data = page.data();
        let o = offset as usize;

        let overrun = |what: &str| IbdError::CorruptRecordLink {
            page: page.page_num(),
            offset: offset as u32,
            reason: format!("{} runs past the page end", what),
        };

        if o + REC_OFF_DATA_VARCHAR > data.len() {
            return Err(overrun("record header"));
        }
        let sdi_type = BigEndian::read_u32(&data[o + REC_OFF_DATA_TYPE..]) as u64;
        let sdi_id = BigEndian::read_u64(&data[o + REC_OFF_DATA_ID..]);
        let uncompressed_len = BigEndian::read_u32(&data[o + REC_OFF_DATA_UNCOMP_LEN..]);
        let compressed_len = BigEndian::read_u32(&data[o + REC_OFF_DATA_COMP_LEN..]);

        // The length prefix sits in front of the record header. One byte
        // for values up to 127; otherwise two bytes, with bit 6 marking an
        // externally stored value that keeps a 768-byte prefix inline.
        let len_byte = data[o - REC_N_NEW_EXTRA_BYTES - 1];
        let (total_len, inline_len, external) = if len_byte & 0x80 == 0 {
            (len_byte as u64, len_byte as u32, false)
        } else {
            let hi = ((len_byte & 0x3f) as u32) << 8;
            if len_byte & 0x40 != 0 {
                let ext = o + REC_OFF_DATA_VARCHAR + hi as usize;
                if ext + BTR_EXTERN_LEN + 8 > data.len() {
                    return Err(overrun("external reference"));
                }
                let ext_len =
                    BigEndian::read_u64(&data[ext + BTR_EXTERN_LEN..]) & BTR_EXTERN_LEN_MASK;
                (ext_len + hi as u64, hi, true)
            } else {
                let len = hi | data[o - REC_N_NEW_EXTRA_BYTES - 2] as u32;
                (len as u64, len, false)
            }
        };

        let value = o + REC_OFF_DATA_VARCHAR;
        if value + inline_len as usize > data.len() {
            return Err(overrun("record value"));
        }
        let mut payload = Vec::with_capacity(total_len as usize);
        payload.extend_from_slice(&data[value..value + inline_len as usize]);

        if external {
            let ext = value + inline_len as usize;
            let first_blob_page = BigEndian::read_u32(&data[ext + BTR_EXTERN_PAGE_NO..]);
            space.copy_blob(first_blob_page, total_len - inline_len as u64, &mut payload)?;
        }

        if total_len != compressed_len as u64 {
            return Err(IbdError::LengthMismatch {
                what: "compressed SDI payload",
                declared: compressed_len as u64,
                actual: total_len,
            });
        }

        let json = sdi::inflate_exact(&payload, uncompressed_len, page.page_num(), sdi_id)?;
        Ok(SdiRecord {
            sdi_type,
            sdi_id,
            uncompressed_len,
            compressed_len,
            data: json,
        })
    }
}

impl<R: Read> Iterator for SdiRecords<'_, R> {
    type Item = Result<SdiRecord, IbdError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let offset = match self.advance() {
            Ok(Some(offset)) => offset,
            Ok(None) => {
                self.finished = true;
                return None;
            }
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };
        self.cur_offset = offset;

        let page = match self.pages.get(&self.cur_page) {
            Some(p) => p,
            None => {
                self.finished = true;
                return Some(Err(IbdError::CorruptRecordLink {
                    page: self.cur_page,
                    offset: offset as u32,
                    reason: "walker lost its current page".to_string(),
                }));
            }
        };
        match Self::parse_record(self.space, page, offset) {
            Ok(rec) => Some(Ok(rec)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

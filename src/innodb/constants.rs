//! InnoDB page and file structure constants.
//!
//! Values are taken from the MySQL source headers:
//! - univ.i (page size limits)
//! - fil0fil.h (FIL header, page types)
//! - fsp0fsp.h / fsp0types.h (FSP header, tablespace flags)
//! - page0page.h / page0zip.h (index page header, page directory)
//! - rec0rec.h (compact record format)
//! - btr0types.h / lob0lob.h (external field references, BLOB pages)

// --- Universal page size limits ---------------------------------------------

/// Minimum page size shift (power of 2).
pub const UNIV_PAGE_SIZE_SHIFT_MIN: u32 = 12;
/// Maximum page size shift (power of 2).
pub const UNIV_PAGE_SIZE_SHIFT_MAX: u32 = 16;
/// Original 16 KiB page size shift.
pub const UNIV_PAGE_SIZE_SHIFT_ORIG: u32 = 14;
/// Smallest page size InnoDB supports (4 KiB).
pub const UNIV_PAGE_SIZE_MIN: u32 = 1 << UNIV_PAGE_SIZE_SHIFT_MIN;
/// Largest page size InnoDB supports (64 KiB).
pub const UNIV_PAGE_SIZE_MAX: u32 = 1 << UNIV_PAGE_SIZE_SHIFT_MAX;

/// log2 of the smallest compressed page size (1 KiB). This must never change.
pub const UNIV_ZIP_SIZE_SHIFT_MIN: u32 = 10;
/// log2 of the largest compressed page size (16 KiB). A compressed page
/// directory entry reserves 14 bits for the start offset and 2 bits for
/// flags, which limits the uncompressed page size to 16 KiB.
pub const UNIV_ZIP_SIZE_SHIFT_MAX: u32 = 14;
/// Smallest compressed page size.
pub const UNIV_ZIP_SIZE_MIN: u32 = 1 << UNIV_ZIP_SIZE_SHIFT_MIN;

/// Original 16 KiB page size as an ssize (log2 minus 9).
pub const UNIV_PAGE_SSIZE_ORIG: u32 = UNIV_PAGE_SIZE_SHIFT_ORIG - 9;

// --- FIL header --------------------------------------------------------------

/// Offset of the page number within the FIL header.
pub const FIL_PAGE_OFFSET: usize = 4;
/// Offset of the next-page pointer (FIL_NULL when there is no successor).
pub const FIL_PAGE_NEXT: usize = 12;
/// Offset of the 2-byte page type.
pub const FIL_PAGE_TYPE: usize = 24;
/// Offset of the space id.
pub const FIL_PAGE_SPACE_ID: usize = 34;
/// Size of the FIL header; page payload starts here.
pub const FIL_PAGE_DATA: usize = 38;
/// Size of the FIL trailer at the end of every page.
pub const FIL_PAGE_DATA_END: usize = 8;

/// "Null" page reference.
pub const FIL_NULL: u32 = 0xFFFF_FFFF;

/// File address size (page number + byte offset).
pub const FIL_ADDR_SIZE: usize = 6;
/// Physical size of a list base node.
pub const FLST_BASE_NODE_SIZE: usize = 4 + 2 * FIL_ADDR_SIZE;
/// Physical size of a list node.
pub const FLST_NODE_SIZE: usize = 2 * FIL_ADDR_SIZE;

// --- Page types read by this crate -------------------------------------------

/// File space header (page 0 of every tablespace).
pub const FIL_PAGE_TYPE_FSP_HDR: u16 = 8;
/// Uncompressed SDI BLOB page.
pub const FIL_PAGE_SDI_BLOB: u16 = 18;
/// Compressed SDI BLOB page.
pub const FIL_PAGE_SDI_ZBLOB: u16 = 19;
/// Tablespace SDI index page.
pub const FIL_PAGE_SDI: u16 = 17853;
/// B-tree index page.
pub const FIL_PAGE_INDEX: u16 = 17855;

// --- FSP header (page 0) ------------------------------------------------------

/// Offset of the space header within page 0.
pub const FSP_HEADER_OFFSET: usize = FIL_PAGE_DATA;
/// fsp_space_t.flags within the space header.
pub const FSP_SPACE_FLAGS: usize = 16;
/// File space header size.
pub const FSP_HEADER_SIZE: usize = 32 + 5 * FLST_BASE_NODE_SIZE;

/// Shift of the POST_ANTELOPE flag.
pub const FSP_FLAGS_POS_POST_ANTELOPE: u32 = 0;
/// Width of the POST_ANTELOPE flag.
pub const FSP_FLAGS_WIDTH_POST_ANTELOPE: u32 = 1;
/// Shift of the ZIP_SSIZE field.
pub const FSP_FLAGS_POS_ZIP_SSIZE: u32 =
    FSP_FLAGS_POS_POST_ANTELOPE + FSP_FLAGS_WIDTH_POST_ANTELOPE;
/// Width of the ZIP_SSIZE field.
pub const FSP_FLAGS_WIDTH_ZIP_SSIZE: u32 = 4;
/// Shift of the ATOMIC_BLOBS flag.
pub const FSP_FLAGS_POS_ATOMIC_BLOBS: u32 = FSP_FLAGS_POS_ZIP_SSIZE + FSP_FLAGS_WIDTH_ZIP_SSIZE;
/// Width of the ATOMIC_BLOBS flag.
pub const FSP_FLAGS_WIDTH_ATOMIC_BLOBS: u32 = 1;
/// Shift of the PAGE_SSIZE field.
pub const FSP_FLAGS_POS_PAGE_SSIZE: u32 =
    FSP_FLAGS_POS_ATOMIC_BLOBS + FSP_FLAGS_WIDTH_ATOMIC_BLOBS;
/// Width of the PAGE_SSIZE field.
pub const FSP_FLAGS_WIDTH_PAGE_SSIZE: u32 = 4;
/// Shift of the DATA_DIR flag.
pub const FSP_FLAGS_POS_DATA_DIR: u32 = FSP_FLAGS_POS_PAGE_SSIZE + FSP_FLAGS_WIDTH_PAGE_SSIZE;
/// Shift of the SHARED flag.
pub const FSP_FLAGS_POS_SHARED: u32 = FSP_FLAGS_POS_DATA_DIR + 1;
/// Shift of the TEMPORARY flag.
pub const FSP_FLAGS_POS_TEMPORARY: u32 = FSP_FLAGS_POS_SHARED + 1;
/// Shift of the ENCRYPTION flag.
pub const FSP_FLAGS_POS_ENCRYPTION: u32 = FSP_FLAGS_POS_TEMPORARY + 1;
/// Shift of the SDI flag. Indicates the presence of a tablespace dictionary.
pub const FSP_FLAGS_POS_SDI: u32 = FSP_FLAGS_POS_ENCRYPTION + 1;

/// Bit mask of the ZIP_SSIZE field.
pub const FSP_FLAGS_MASK_ZIP_SSIZE: u32 =
    ((1 << FSP_FLAGS_WIDTH_ZIP_SSIZE) - 1) << FSP_FLAGS_POS_ZIP_SSIZE;
/// Bit mask of the PAGE_SSIZE field.
pub const FSP_FLAGS_MASK_PAGE_SSIZE: u32 =
    ((1 << FSP_FLAGS_WIDTH_PAGE_SSIZE) - 1) << FSP_FLAGS_POS_PAGE_SSIZE;
/// Bit mask of the SDI field.
pub const FSP_FLAGS_MASK_SDI: u32 = 1 << FSP_FLAGS_POS_SDI;

// --- Extent descriptors (page 0) ----------------------------------------------

/// Offset of the page-state bitmap within an XDES entry.
pub const XDES_BITMAP: usize = FLST_NODE_SIZE + 12;
/// State bits per page in the XDES bitmap.
pub const XDES_BITS_PER_PAGE: u32 = 2;
/// Offset of the descriptor array on a descriptor page.
pub const XDES_ARR_OFFSET: usize = FSP_HEADER_OFFSET + FSP_HEADER_SIZE;

// --- Encryption info block (page 0) -------------------------------------------

/// Encryption magic bytes size.
pub const ENCRYPTION_MAGIC_SIZE: usize = 3;
/// Encryption key length.
pub const ENCRYPTION_KEY_LEN: usize = 32;
/// Length of the server UUID used in master key names.
pub const ENCRYPTION_SERVER_UUID_LEN: usize = 36;
/// Encryption information size: magic + master key id + key + iv + uuid + checksum.
pub const ENCRYPTION_INFO_SIZE: usize =
    ENCRYPTION_MAGIC_SIZE + 4 + 2 * ENCRYPTION_KEY_LEN + ENCRYPTION_SERVER_UUID_LEN + 4;
/// Maximum encryption info size across formats v1, v2 and v3.
pub const ENCRYPTION_INFO_MAX_SIZE: usize = ENCRYPTION_INFO_SIZE + 4;

// --- Index page header ---------------------------------------------------------

/// The index page header starts right after the FIL header.
pub const PAGE_HEADER: usize = FIL_PAGE_DATA;
/// Number of slots in the page directory.
pub const PAGE_N_DIR_SLOTS: usize = 0;
/// Pointer to the record heap top.
pub const PAGE_HEAP_TOP: usize = 2;
/// Number of records in the heap; bit 15 flags the new-style compact format.
pub const PAGE_N_HEAP: usize = 4;
/// Number of user records on the page.
pub const PAGE_N_RECS: usize = 16;
/// Level of the node in the index tree; the leaf level is 0.
pub const PAGE_LEVEL: usize = 26;
/// Index id where the page belongs.
pub const PAGE_INDEX_ID: usize = 28;

/// File segment header size.
pub const FSEG_HEADER_SIZE: usize = 10;
/// Start of record data on an index page.
pub const PAGE_DATA: usize = PAGE_HEADER + 36 + 2 * FSEG_HEADER_SIZE;

/// Heap number of the first user record.
pub const PAGE_HEAP_NO_USER_LOW: u16 = 2;

/// Offset of the directory start, counted down from the page end.
pub const PAGE_DIR: usize = FIL_PAGE_DATA_END;
/// A page directory slot is two bytes.
pub const PAGE_DIR_SLOT_SIZE: usize = 2;
/// The offset of the physically lower end of the directory, counted from
/// the page end, when the page is empty.
pub const PAGE_EMPTY_DIR_START: usize = PAGE_DIR + 2 * PAGE_DIR_SLOT_SIZE;

/// Size of a compressed page directory entry.
pub const PAGE_ZIP_DIR_SLOT_SIZE: usize = 2;
/// Mask of record offsets in a dense directory entry.
pub const PAGE_ZIP_DIR_SLOT_MASK: u16 = 0x3fff;
/// "Owned" flag of a dense directory entry.
pub const PAGE_ZIP_DIR_SLOT_OWNED: u16 = 0x4000;

/// Offset of the infimum record on a new-style compact page.
pub const PAGE_NEW_INFIMUM: usize = PAGE_DATA + REC_N_NEW_EXTRA_BYTES;
/// Offset of the supremum record on a new-style compact page.
pub const PAGE_NEW_SUPREMUM: usize = PAGE_DATA + 2 * REC_N_NEW_EXTRA_BYTES + 8;
/// Offset of the supremum record end on a new-style compact page.
pub const PAGE_NEW_SUPREMUM_END: usize = PAGE_NEW_SUPREMUM + 8;
/// Start offset of the area that is compressed on a zipped page.
pub const PAGE_ZIP_START: usize = PAGE_NEW_SUPREMUM_END;

// --- Compact record format -----------------------------------------------------

/// Extra bytes of a new-style record, in addition to the data and offsets.
pub const REC_N_NEW_EXTRA_BYTES: usize = 5;
/// The 2-byte next-record offset is stored at origin minus this.
pub const REC_NEXT: usize = 2;
/// The record status lives in the low 3 bits of the byte at origin minus this.
pub const REC_OFF_TYPE: usize = 3;
/// The info bits byte of a new-style record is at origin minus this.
pub const REC_NEW_INFO_BITS: usize = 5;
/// Delete-mark bit within the info bits byte.
pub const REC_INFO_DELETED_FLAG: u8 = 0x20;

// --- SDI index record layout (offsets from the record origin) ------------------

/// Length of the TYPE key field.
pub const REC_DATA_TYPE_LEN: usize = 4;
/// Length of the ID key field.
pub const REC_DATA_ID_LEN: usize = 8;
/// Transaction id system column size.
pub const DATA_TRX_ID_LEN: usize = 6;
/// Rollback pointer system column size.
pub const DATA_ROLL_PTR_LEN: usize = 7;

/// Offset of the TYPE field.
pub const REC_OFF_DATA_TYPE: usize = 0;
/// Offset of the ID field.
pub const REC_OFF_DATA_ID: usize = REC_OFF_DATA_TYPE + REC_DATA_TYPE_LEN;
/// Offset of the 6-byte transaction id.
pub const REC_OFF_DATA_TRX_ID: usize = REC_OFF_DATA_ID + REC_DATA_ID_LEN;
/// Offset of the 7-byte rollback pointer.
pub const REC_OFF_DATA_ROLL_PTR: usize = REC_OFF_DATA_TRX_ID + DATA_TRX_ID_LEN;
/// Offset of the 4-byte uncompressed data length.
pub const REC_OFF_DATA_UNCOMP_LEN: usize = REC_OFF_DATA_ROLL_PTR + DATA_ROLL_PTR_LEN;
/// Offset of the 4-byte compressed data length.
pub const REC_OFF_DATA_COMP_LEN: usize = REC_OFF_DATA_UNCOMP_LEN + 4;
/// Offset of the variable-length data field.
pub const REC_OFF_DATA_VARCHAR: usize = REC_OFF_DATA_COMP_LEN + 4;

// --- External field references and BLOB pages ----------------------------------

/// Page number where the externally stored part begins, within the 20-byte
/// external reference.
pub const BTR_EXTERN_PAGE_NO: usize = 4;
/// 8 bytes containing the length of the externally stored part. The two
/// highest bits are reserved for flags.
pub const BTR_EXTERN_LEN: usize = 12;
/// Mask clearing the flag bits of the external length field.
pub const BTR_EXTERN_LEN_MASK: u64 = !(3 << 62);

/// Offset of the part length within a BLOB page header.
pub const LOB_HDR_PART_LEN: usize = 0;
/// BLOB page header size.
pub const LOB_HDR_SIZE: usize = 10;
/// Start of BLOB part data on a BLOB page.
pub const LOB_PAGE_DATA: usize = FIL_PAGE_DATA + LOB_HDR_SIZE;

/// SDI BLOB pages are not expected before this page number:
/// 0 (tablespace header), 1 (tablespace bitmap), 2 (ibuf bitmap),
/// 3 (SDI index root).
pub const SDI_BLOB_ALLOWED: u32 = 4;

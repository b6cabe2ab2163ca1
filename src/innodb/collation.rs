//! Static catalog of MySQL collation ids.
//!
//! The data dictionary references collations by numeric id only; rendering
//! `CHARACTER SET` / `COLLATE` clauses and index prefix lengths needs the
//! collation name, its character set, and the maximum bytes per character.
//! This table covers the collations MySQL 8.x ships for the common
//! character sets. The reader core never consults it; only the DDL
//! renderer does.

/// One entry of the collation catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collation {
    /// Numeric collation id as stored in the data dictionary.
    pub id: u32,
    /// Collation name, e.g. `utf8mb4_0900_ai_ci`.
    pub name: &'static str,
    /// Character set name, e.g. `utf8mb4`.
    pub charset: &'static str,
    /// Maximum bytes per character for the character set.
    pub maxlen: u32,
}

const fn c(id: u32, name: &'static str, charset: &'static str, maxlen: u32) -> Collation {
    Collation {
        id,
        name,
        charset,
        maxlen,
    }
}

/// Catalog sorted by id for binary search.
static COLLATIONS: &[Collation] = &[
    c(1, "big5_chinese_ci", "big5", 2),
    c(2, "latin2_czech_cs", "latin2", 1),
    c(3, "dec8_swedish_ci", "dec8", 1),
    c(4, "cp850_general_ci", "cp850", 1),
    c(5, "latin1_german1_ci", "latin1", 1),
    c(6, "hp8_english_ci", "hp8", 1),
    c(7, "koi8r_general_ci", "koi8r", 1),
    c(8, "latin1_swedish_ci", "latin1", 1),
    c(9, "latin2_general_ci", "latin2", 1),
    c(10, "swe7_swedish_ci", "swe7", 1),
    c(11, "ascii_general_ci", "ascii", 1),
    c(12, "ujis_japanese_ci", "ujis", 3),
    c(13, "sjis_japanese_ci", "sjis", 2),
    c(14, "cp1251_bulgarian_ci", "cp1251", 1),
    c(15, "latin1_danish_ci", "latin1", 1),
    c(16, "hebrew_general_ci", "hebrew", 1),
    c(18, "tis620_thai_ci", "tis620", 1),
    c(19, "euckr_korean_ci", "euckr", 2),
    c(20, "latin7_estonian_cs", "latin7", 1),
    c(21, "latin2_hungarian_ci", "latin2", 1),
    c(22, "koi8u_general_ci", "koi8u", 1),
    c(23, "cp1251_ukrainian_ci", "cp1251", 1),
    c(24, "gb2312_chinese_ci", "gb2312", 2),
    c(25, "greek_general_ci", "greek", 1),
    c(26, "cp1250_general_ci", "cp1250", 1),
    c(27, "latin2_croatian_ci", "latin2", 1),
    c(28, "gbk_chinese_ci", "gbk", 2),
    c(29, "cp1257_lithuanian_ci", "cp1257", 1),
    c(30, "latin5_turkish_ci", "latin5", 1),
    c(31, "latin1_german2_ci", "latin1", 1),
    c(32, "armscii8_general_ci", "armscii8", 1),
    c(33, "utf8mb3_general_ci", "utf8mb3", 3),
    c(34, "cp1250_czech_cs", "cp1250", 1),
    c(35, "ucs2_general_ci", "ucs2", 2),
    c(36, "cp866_general_ci", "cp866", 1),
    c(37, "keybcs2_general_ci", "keybcs2", 1),
    c(38, "macce_general_ci", "macce", 1),
    c(39, "macroman_general_ci", "macroman", 1),
    c(40, "cp852_general_ci", "cp852", 1),
    c(41, "latin7_general_ci", "latin7", 1),
    c(42, "latin7_general_cs", "latin7", 1),
    c(43, "macce_bin", "macce", 1),
    c(44, "cp1250_croatian_ci", "cp1250", 1),
    c(45, "utf8mb4_general_ci", "utf8mb4", 4),
    c(46, "utf8mb4_bin", "utf8mb4", 4),
    c(47, "latin1_bin", "latin1", 1),
    c(48, "latin1_general_ci", "latin1", 1),
    c(49, "latin1_general_cs", "latin1", 1),
    c(50, "cp1251_bin", "cp1251", 1),
    c(51, "cp1251_general_ci", "cp1251", 1),
    c(52, "cp1251_general_cs", "cp1251", 1),
    c(53, "macroman_bin", "macroman", 1),
    c(54, "utf16_general_ci", "utf16", 4),
    c(55, "utf16_bin", "utf16", 4),
    c(56, "utf16le_general_ci", "utf16le", 4),
    c(57, "cp1256_general_ci", "cp1256", 1),
    c(58, "cp1257_bin", "cp1257", 1),
    c(59, "cp1257_general_ci", "cp1257", 1),
    c(60, "utf32_general_ci", "utf32", 4),
    c(61, "utf32_bin", "utf32", 4),
    c(62, "utf16le_bin", "utf16le", 4),
    c(63, "binary", "binary", 1),
    c(64, "armscii8_bin", "armscii8", 1),
    c(65, "ascii_bin", "ascii", 1),
    c(66, "cp1250_bin", "cp1250", 1),
    c(67, "cp866_bin", "cp866", 1),
    c(68, "cp852_bin", "cp852", 1),
    c(69, "dec8_bin", "dec8", 1),
    c(70, "greek_bin", "greek", 1),
    c(71, "hebrew_bin", "hebrew", 1),
    c(72, "hp8_bin", "hp8", 1),
    c(73, "keybcs2_bin", "keybcs2", 1),
    c(74, "koi8r_bin", "koi8r", 1),
    c(75, "koi8u_bin", "koi8u", 1),
    c(76, "utf8mb3_tolower_ci", "utf8mb3", 3),
    c(77, "latin2_bin", "latin2", 1),
    c(78, "latin5_bin", "latin5", 1),
    c(79, "latin7_bin", "latin7", 1),
    c(80, "cp850_bin", "cp850", 1),
    c(83, "utf8mb3_bin", "utf8mb3", 3),
    c(84, "big5_bin", "big5", 2),
    c(85, "euckr_bin", "euckr", 2),
    c(86, "gb2312_bin", "gb2312", 2),
    c(87, "gbk_bin", "gbk", 2),
    c(88, "sjis_bin", "sjis", 2),
    c(90, "ucs2_bin", "ucs2", 2),
    c(91, "ujis_bin", "ujis", 3),
    c(92, "geostd8_general_ci", "geostd8", 1),
    c(93, "geostd8_bin", "geostd8", 1),
    c(95, "cp932_japanese_ci", "cp932", 2),
    c(96, "cp932_bin", "cp932", 2),
    c(97, "eucjpms_japanese_ci", "eucjpms", 3),
    c(98, "eucjpms_bin", "eucjpms", 3),
    c(192, "utf8mb3_unicode_ci", "utf8mb3", 3),
    c(224, "utf8mb4_unicode_ci", "utf8mb4", 4),
    c(246, "utf8mb4_unicode_520_ci", "utf8mb4", 4),
    c(248, "gb18030_chinese_ci", "gb18030", 4),
    c(249, "gb18030_bin", "gb18030", 4),
    c(255, "utf8mb4_0900_ai_ci", "utf8mb4", 4),
    c(278, "utf8mb4_0900_as_cs", "utf8mb4", 4),
    c(305, "utf8mb4_0900_bin", "utf8mb4", 4),
];

/// Look up a collation by its numeric id.
///
/// # Examples
///
/// ```
/// use ibdsdi::innodb::collation::by_id;
///
/// let coll = by_id(255).unwrap();
/// assert_eq!(coll.name, "utf8mb4_0900_ai_ci");
/// assert_eq!(coll.charset, "utf8mb4");
/// assert_eq!(coll.maxlen, 4);
/// assert!(by_id(9999).is_none());
/// ```
pub fn by_id(id: u32) -> Option<&'static Collation> {
    COLLATIONS
        .binary_search_by_key(&id, |coll| coll.id)
        .ok()
        .map(|i| &COLLATIONS[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_sorted_and_unique() {
        for pair in COLLATIONS.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn well_known_ids() {
        assert_eq!(by_id(8).unwrap().name, "latin1_swedish_ci");
        assert_eq!(by_id(33).unwrap().charset, "utf8mb3");
        assert_eq!(by_id(45).unwrap().maxlen, 4);
        assert_eq!(by_id(63).unwrap().name, "binary");
        assert_eq!(by_id(224).unwrap().name, "utf8mb4_unicode_ci");
        assert_eq!(by_id(255).unwrap().charset, "utf8mb4");
    }

    #[test]
    fn unknown_id() {
        assert!(by_id(17).is_none());
        assert!(by_id(100_000).is_none());
    }
}

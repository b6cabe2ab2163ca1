//! SDI records and their zlib-compressed JSON payload.
//!
//! Each record in the SDI index maps a `(type, id)` key to one data
//! dictionary object serialized as zlib-compressed JSON. Type 1 is a
//! table, type 2 a tablespace.

use flate2::read::ZlibDecoder;
use serde::Serialize;
use std::io::Read;

use crate::IbdError;

/// Table dictionary object.
pub const SDI_TYPE_TABLE: u64 = 1;
/// Tablespace dictionary object.
pub const SDI_TYPE_TABLESPACE: u64 = 2;

/// One dictionary object extracted from the SDI index, with its payload
/// already inflated.
#[derive(Debug, Clone, Serialize)]
pub struct SdiRecord {
    /// Object type (1 = Table, 2 = Tablespace).
    pub sdi_type: u64,
    /// Object id.
    pub sdi_id: u64,
    /// Declared length of the inflated payload.
    pub uncompressed_len: u32,
    /// Declared length of the compressed payload.
    pub compressed_len: u32,
    /// The dictionary object as JSON bytes.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl SdiRecord {
    /// Human-readable name of the record type.
    pub fn type_name(&self) -> &'static str {
        match self.sdi_type {
            SDI_TYPE_TABLE => "Table",
            SDI_TYPE_TABLESPACE => "Tablespace",
            _ => "Unknown",
        }
    }

    /// Render the per-record `ibd2sdi` envelope:
    /// `{"type":T,"id":I,"object":<json>}`.
    pub fn json_object(&self) -> Vec<u8> {
        let mut out = format!("{{\"type\":{},\"id\":{},\"object\":", self.sdi_type, self.sdi_id)
            .into_bytes();
        out.extend_from_slice(&self.data);
        out.push(b'}');
        out
    }
}

/// Render the `ibd2sdi`-compatible dump of a record set:
/// `["ibd2sdi",{...},{...}]`.
pub fn json_envelope(records: &[SdiRecord]) -> Vec<u8> {
    let mut out = Vec::from(&b"[\"ibd2sdi\""[..]);
    for rec in records {
        out.push(b',');
        out.extend_from_slice(&rec.json_object());
    }
    out.push(b']');
    out
}

/// Inflate a zlib stream that must decompress to exactly `expected` bytes.
///
/// `page` and `id` provide error context: the leaf page holding the record
/// and the record's object id.
pub fn inflate_exact(
    input: &[u8],
    expected: u32,
    page: u32,
    id: u64,
) -> Result<Vec<u8>, IbdError> {
    let mut decoder = ZlibDecoder::new(input);
    let mut out = vec![0u8; expected as usize];
    decoder
        .read_exact(&mut out)
        .map_err(|e| IbdError::DecompressionFailed {
            page,
            reason: format!("object {}: {}", id, e),
        })?;
    // The declared length must consume the whole stream.
    let mut probe = [0u8; 1];
    match decoder.read(&mut probe) {
        Ok(0) => Ok(out),
        Ok(_) => Err(IbdError::LengthMismatch {
            what: "inflated SDI payload",
            declared: expected as u64,
            actual: expected as u64 + 1,
        }),
        Err(e) => Err(IbdError::DecompressionFailed {
            page,
            reason: format!("object {}: {}", id, e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn inflate_round_trip() {
        let json = br#"{"dd_object_type":"Table"}"#;
        let out = inflate_exact(&deflate(json), json.len() as u32, 3, 1).unwrap();
        assert_eq!(out, json);
    }

    #[test]
    fn declared_length_too_long_fails() {
        let json = b"{}";
        let err = inflate_exact(&deflate(json), 10, 3, 1).unwrap_err();
        assert!(matches!(err, IbdError::DecompressionFailed { page: 3, .. }));
    }

    #[test]
    fn declared_length_too_short_fails() {
        let json = b"{\"a\":1}";
        let err = inflate_exact(&deflate(json), 2, 3, 1).unwrap_err();
        assert!(matches!(err, IbdError::LengthMismatch { .. }));
    }

    #[test]
    fn envelope_shape() {
        let rec = SdiRecord {
            sdi_type: SDI_TYPE_TABLE,
            sdi_id: 7,
            uncompressed_len: 2,
            compressed_len: 2,
            data: b"{}".to_vec(),
        };
        assert_eq!(rec.type_name(), "Table");
        assert_eq!(rec.json_object(), br#"{"type":1,"id":7,"object":{}}"#);
        assert_eq!(
            json_envelope(&[rec]),
            br#"["ibd2sdi",{"type":1,"id":7,"object":{}}]"#
        );
    }
}

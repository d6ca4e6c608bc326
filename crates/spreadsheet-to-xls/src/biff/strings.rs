//! BIFF8 Unicode string decoding.
//!
//! BIFF8 strings have a complex encoding:
//! - Header: char_count (2 bytes) + flags (1 byte)
//! - Flags bit 0 (`fHighByte`): 0 = compressed Latin-1, 1 = uncompressed UTF-16LE
//! - Flags bit 2 (`fExtSt`): extended string data follows (Asian phonetic)
//! - Flags bit 3 (`fRichSt`): rich text run array follows
//! - If fRichSt: 2-byte run count follows the flags
//! - If fExtSt: 4-byte extended data size follows
//! - Then the character data
//! - Then the rich text runs (4 bytes each) if fRichSt
//! - Then the extended data if fExtSt
//!
//! Character data can span CONTINUE records. Each continuation that lands
//! inside character data starts with a fresh flags byte, which may switch
//! between compressed and uncompressed encoding mid-string.

use super::parser::RecordReader;
use crate::error::{XlsError, XlsResult};

/// Read a BIFF8 "short" string (1-byte length prefix, used in BOUNDSHEET).
pub fn read_short_string(r: &mut RecordReader<'_>) -> XlsResult<String> {
    let char_count = r.u8()? as usize;
    let flags = r.u8()?;
    read_character_data(r, char_count, flags)
}

/// Read a BIFF8 Unicode string with a 2-byte length prefix (SST entries,
/// LABEL, RSTRING, STRING).
pub fn read_unicode_string(r: &mut RecordReader<'_>) -> XlsResult<String> {
    let char_count = r.u16()? as usize;
    let flags = r.u8()?;

    let is_rich = (flags & 0x08) != 0;
    let has_ext = (flags & 0x04) != 0;

    let run_count = if is_rich { r.u16()? as usize } else { 0 };
    let ext_size = if has_ext { r.u32()? as usize } else { 0 };

    let text = read_character_data(r, char_count, flags)?;

    // Rich text runs (4 bytes each: char_pos u16 + font_idx u16)
    r.skip(run_count * 4);
    r.skip(ext_size);

    Ok(text)
}

/// Read `char_count` characters, honoring CONTINUE boundaries.
fn read_character_data(r: &mut RecordReader<'_>, char_count: usize, flags: u8) -> XlsResult<String> {
    let mut is_wide = (flags & 0x01) != 0;
    let mut units: Vec<u16> = Vec::with_capacity(char_count);
    let mut remaining = char_count;

    while remaining > 0 {
        if r.at_boundary() {
            is_wide = (r.u8()? & 0x01) != 0;
        }

        let width = if is_wide { 2 } else { 1 };
        let available = (r.next_boundary() - r.pos()) / width;
        let take = available.min(remaining);
        if take == 0 {
            return Err(XlsError::Parse(format!(
                "string data too short: {} characters missing at offset {}",
                remaining,
                r.pos()
            )));
        }

        if is_wide {
            for _ in 0..take {
                units.push(r.u16()?);
            }
        } else {
            // Compressed Latin-1: each byte is the low half of a UTF-16 unit
            units.extend(r.bytes(take)?.iter().map(|&b| b as u16));
        }
        remaining -= take;
    }

    String::from_utf16(&units).map_err(|e| XlsError::Parse(format!("invalid UTF-16 string: {e}")))
}

/// Parse the entire SST (Shared String Table) from the merged SST record.
///
/// The SST body starts with:
/// - `total_strings` (4 bytes, u32) - total string refs in workbook
/// - `unique_strings` (4 bytes, u32) - number of unique strings in this table
/// - Then `unique_strings` Unicode string entries
pub fn parse_sst(r: &mut RecordReader<'_>) -> XlsResult<Vec<String>> {
    let _total_strings = r.u32()?;
    let unique_count = r.u32()? as usize;

    // Cap the allocation: the count comes from the file
    let mut strings = Vec::with_capacity(unique_count.min(r.remaining()));

    for i in 0..unique_count {
        match read_unicode_string(r) {
            Ok(s) => strings.push(s),
            Err(e) => {
                // Some XLS files have SST padding or truncation issues.
                log::warn!("SST parse error at string {i}/{unique_count}: {e}");
                break;
            }
        }
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biff::BiffRecord;

    #[test]
    fn test_read_compressed_string() {
        // char_count = 3 (u16 LE), flags = 0x00, data = "ABC"
        let data = [0x03, 0x00, 0x00, b'A', b'B', b'C'];
        let mut r = RecordReader::from_bytes(&data);
        assert_eq!(read_unicode_string(&mut r).unwrap(), "ABC");
        assert_eq!(r.pos(), 6);
    }

    #[test]
    fn test_read_wide_string() {
        // char_count = 2 (u16 LE), flags = 0x01, data = H\0i\0
        let data = [0x02, 0x00, 0x01, b'H', 0x00, b'i', 0x00];
        let mut r = RecordReader::from_bytes(&data);
        assert_eq!(read_unicode_string(&mut r).unwrap(), "Hi");
        assert_eq!(r.pos(), 7);
    }

    #[test]
    fn test_read_rich_string_skips_runs() {
        // "Ab" with one rich text run, followed by a trailing marker byte
        let data = [0x02, 0x00, 0x08, 0x01, 0x00, b'A', b'b', 0, 0, 1, 0, 0x7F];
        let mut r = RecordReader::from_bytes(&data);
        assert_eq!(read_unicode_string(&mut r).unwrap(), "Ab");
        assert_eq!(r.u8().unwrap(), 0x7F);
    }

    #[test]
    fn test_read_short_string() {
        let data = [0x02, 0x00, b'O', b'K'];
        let mut r = RecordReader::from_bytes(&data);
        assert_eq!(read_short_string(&mut r).unwrap(), "OK");
    }

    #[test]
    fn test_truncated_string_is_error() {
        let data = [0x05, 0x00, 0x00, b'A'];
        let mut r = RecordReader::from_bytes(&data);
        assert!(read_unicode_string(&mut r).is_err());
    }

    #[test]
    fn test_parse_sst() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes()); // total
        buf.extend_from_slice(&2u32.to_le_bytes()); // unique
        buf.extend_from_slice(&[0x01, 0x00, 0x00, b'A']);
        buf.extend_from_slice(&[0x02, 0x00, 0x00, b'B', b'C']);

        let strings = parse_sst(&mut RecordReader::from_bytes(&buf)).unwrap();
        assert_eq!(strings, vec!["A", "BC"]);
    }

    #[test]
    fn test_parse_sst_string_switches_encoding_at_continue() {
        // "ABCD": "AB" compressed in the SST body, then a CONTINUE whose
        // flags byte switches to UTF-16 for "CD".
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[0x04, 0x00, 0x00, b'A', b'B']);
        let boundary = data.len();
        data.extend_from_slice(&[0x01, b'C', 0x00, b'D', 0x00]);

        let record = BiffRecord {
            record_type: crate::biff::records::SST,
            data,
            continues: vec![boundary],
            stream_offset: 0,
        };
        let strings = parse_sst(&mut RecordReader::new(&record)).unwrap();
        assert_eq!(strings, vec!["ABCD"]);
    }

    #[test]
    fn test_parse_sst_string_starting_at_continue() {
        // A CONTINUE that begins with a new string header has no extra flags byte
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0x01, 0x00, 0x00, b'x']);
        let boundary = data.len();
        data.extend_from_slice(&[0x01, 0x00, 0x00, b'y']);

        let record = BiffRecord {
            record_type: crate::biff::records::SST,
            data,
            continues: vec![boundary],
            stream_offset: 0,
        };
        let strings = parse_sst(&mut RecordReader::new(&record)).unwrap();
        assert_eq!(strings, vec!["x", "y"]);
    }

    #[test]
    fn test_parse_sst_truncated_tail_keeps_prefix() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&[0x01, 0x00, 0x00, b'A']);
        buf.extend_from_slice(&[0x09, 0x00, 0x00, b'B']);

        let strings = parse_sst(&mut RecordReader::from_bytes(&buf)).unwrap();
        assert_eq!(strings, vec!["A"]);
    }
}

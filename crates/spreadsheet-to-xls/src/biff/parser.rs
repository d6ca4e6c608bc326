//! Low-level binary parsing helpers for BIFF8 records.
//!
//! All multi-byte integers in BIFF8 are little-endian.

use super::BiffRecord;
use crate::error::{XlsError, XlsResult};

/// Sequential little-endian reader over one record body.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    continues: &'a [usize],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    /// Read a merged record, aware of its CONTINUE boundaries
    pub fn new(record: &'a BiffRecord) -> Self {
        Self {
            data: &record.data,
            continues: &record.continues,
            pos: 0,
        }
    }

    /// Read a plain byte slice with no CONTINUE boundaries
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self {
            data,
            continues: &[],
            pos: 0,
        }
    }

    /// Current offset into the record body
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Total body length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Bytes left after the current offset
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// The first CONTINUE boundary strictly after the current offset,
    /// or the end of the body.
    pub fn next_boundary(&self) -> usize {
        self.continues
            .iter()
            .copied()
            .find(|&b| b > self.pos)
            .unwrap_or(self.data.len())
    }

    /// Whether the current offset is exactly where a CONTINUE body starts
    pub fn at_boundary(&self) -> bool {
        self.continues.contains(&self.pos)
    }

    /// Skip `n` bytes, clamping at the end of the body.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.data.len());
    }

    /// Borrow the next `n` bytes, advancing past them.
    pub fn bytes(&mut self, n: usize) -> XlsResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(XlsError::Parse(format!(
                "unexpected end of data at offset {}, need {} bytes",
                self.pos, n
            )));
        }
        let data: &'a [u8] = self.data;
        let slice = &data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a `u8`.
    #[inline]
    pub fn u8(&mut self) -> XlsResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    /// Read a little-endian `u16`.
    #[inline]
    pub fn u16(&mut self) -> XlsResult<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian `u32`.
    #[inline]
    pub fn u32(&mut self) -> XlsResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read an IEEE 754 double.
    #[inline]
    pub fn f64(&mut self) -> XlsResult<f64> {
        let b = self.bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(f64::from_le_bytes(raw))
    }

    /// Read a 4-byte RK-encoded number.
    #[inline]
    pub fn rk(&mut self) -> XlsResult<f64> {
        self.u32().map(decode_rk)
    }
}

/// Decode an RK-encoded number.
///
/// RK encoding (4 bytes):
/// - Bit 0: if 1, the decoded number should be divided by 100
/// - Bit 1: if 1, value is an integer (bits 2..31 as signed 30-bit int)
///           if 0, value is an IEEE 754 double (bits 2..31 are the upper 30 bits,
///           lower 34 bits of the double are zero)
#[inline]
pub fn decode_rk(rk: u32) -> f64 {
    let div100 = (rk & 0x01) != 0;
    let is_integer = (rk & 0x02) != 0;

    let value = if is_integer {
        ((rk as i32) >> 2) as f64
    } else {
        let upper = (rk & 0xFFFF_FFFC) as u64;
        f64::from_bits(upper << 32)
    };

    if div100 {
        value / 100.0
    } else {
        value
    }
}

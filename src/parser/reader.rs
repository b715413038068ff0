//! Byte cursor over a WebAssembly binary.
//!
//! All reads are bounds-checked and report absolute offsets, so a reader over
//! a section body still produces errors that point into the whole module.

use super::error::{DecodeError, DecodeErrorKind};
use byteorder::{ByteOrder, LittleEndian};

pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Absolute offset of `bytes[0]` within the module
    base: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader { bytes, pos: 0, base: 0 }
    }

    fn with_base(bytes: &'a [u8], base: usize) -> Reader<'a> {
        Reader { bytes, pos: 0, base }
    }

    // Basic operations --------------------------------------------------------

    /// Absolute offset of the next byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Position relative to the start of this reader.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(self.offset(), kind)
    }

    fn eof(&self, what: &'static str) -> DecodeError {
        self.error(DecodeErrorKind::UnexpectedEof(what))
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        match self.bytes.get(self.pos) {
            Some(byte) => {
                self.pos += 1;
                Ok(*byte)
            }
            None => Err(self.eof("byte")),
        }
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(self.eof("bytes"));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Split off the next `len` bytes as an independent reader, advancing past
    /// them. Used for sections and function bodies.
    pub fn sub_reader(&mut self, len: usize, what: &'static str) -> Result<Reader<'a>, DecodeError> {
        if len > self.remaining() {
            return Err(self.eof(what));
        }
        let start = self.pos;
        self.pos += len;
        Ok(Reader::with_base(&self.bytes[start..start + len], self.base + start))
    }

    // Read and interpret types ------------------------------------------------

    /// Fixed-width little-endian u32, as used by the module header.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(LittleEndian::read_u32(bytes))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        let bytes = self.read_bytes(4).map_err(|_| self.eof("f32"))?;
        Ok(LittleEndian::read_f32(bytes))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        let bytes = self.read_bytes(8).map_err(|_| self.eof("f64"))?;
        Ok(LittleEndian::read_f64(bytes))
    }

    pub fn read_vu32(&mut self) -> Result<u32, DecodeError> {
        let value = self.read_unsigned_leb(32)?;
        Ok(value as u32)
    }

    pub fn read_vs32(&mut self) -> Result<i32, DecodeError> {
        let value = self.read_signed_leb(32)?;
        Ok(value as i32)
    }

    /// Signed 33-bit integer, used for block type indices.
    pub fn read_vs33(&mut self) -> Result<i64, DecodeError> {
        self.read_signed_leb(33)
    }

    pub fn read_vs64(&mut self) -> Result<i64, DecodeError> {
        self.read_signed_leb(64)
    }

    fn read_unsigned_leb(&mut self, bits: u32) -> Result<u64, DecodeError> {
        let max_bytes = (bits + 6) / 7;
        let mut result: u64 = 0;
        let mut shift = 0;
        for i in 0..max_bytes {
            let byte = self.read_byte().map_err(|_| self.eof("LEB128 integer"))?;
            let payload = (byte & 0x7f) as u64;
            if i == max_bytes - 1 {
                // the final byte may only carry the bits that still fit
                let used = bits - shift;
                if byte & 0x80 != 0 {
                    return Err(self.error(DecodeErrorKind::IntegerTooLarge));
                }
                if used < 7 && payload >> used != 0 {
                    return Err(self.error(DecodeErrorKind::IntegerTooLarge));
                }
            }
            result |= payload << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(self.error(DecodeErrorKind::MalformedLeb128))
    }

    fn read_signed_leb(&mut self, bits: u32) -> Result<i64, DecodeError> {
        let max_bytes = (bits + 6) / 7;
        let mut result: i64 = 0;
        let mut shift = 0;
        for i in 0..max_bytes {
            let byte = self.read_byte().map_err(|_| self.eof("LEB128 integer"))?;
            let payload = (byte & 0x7f) as i64;
            if i == max_bytes - 1 {
                if byte & 0x80 != 0 {
                    return Err(self.error(DecodeErrorKind::IntegerTooLarge));
                }
                // the unused high bits must all equal the sign bit
                let used = bits - shift;
                if used < 7 {
                    let extended = ((byte << 1) as i8) >> 1;
                    let high = extended >> (used - 1);
                    if high != 0 && high != -1 {
                        return Err(self.error(DecodeErrorKind::IntegerTooLarge));
                    }
                }
            }
            result |= payload << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                if shift < 64 && byte & 0x40 != 0 {
                    result |= -1i64 << shift;
                }
                return Ok(result);
            }
        }
        Err(self.error(DecodeErrorKind::MalformedLeb128))
    }

    /// Length-prefixed UTF-8 name.
    pub fn read_name(&mut self) -> Result<String, DecodeError> {
        let len = self.read_vu32()? as usize;
        let start = self.offset();
        let bytes = self.read_bytes(len).map_err(|_| self.eof("name"))?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::new(start, DecodeErrorKind::InvalidUtf8))
    }

    /// Length-prefixed byte vector.
    pub fn read_byte_vec(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_vu32()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// A vector length, bounded by `limit` and by the bytes left (every
    /// element takes at least one byte) so a hostile count cannot force a huge
    /// allocation.
    pub fn read_count(&mut self, what: &'static str, limit: u32) -> Result<u32, DecodeError> {
        let offset = self.offset();
        let count = self.read_vu32()?;
        if count > limit {
            return Err(DecodeError::new(
                offset,
                DecodeErrorKind::LimitExceeded {
                    what,
                    count: count as u64,
                    limit,
                },
            ));
        }
        if count as usize > self.remaining() {
            return Err(self.eof(what));
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![0x00], 0)]
    #[case(vec![0x01], 1)]
    #[case(vec![0x7f], 127)]
    #[case(vec![0x80, 0x01], 128)]
    #[case(vec![0xe5, 0x8e, 0x26], 624_485)]
    #[case(vec![0x80, 0x80, 0x80, 0x80, 0x00], 0)]
    #[case(vec![0xff, 0xff, 0xff, 0xff, 0x0f], u32::MAX)]
    fn test_read_vu32(#[case] bytes: Vec<u8>, #[case] expected: u32) {
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_vu32().unwrap(), expected);
        assert!(reader.is_empty());
    }

    #[rstest]
    #[case(vec![0xff, 0xff, 0xff, 0xff, 0x1f])]
    #[case(vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x00])]
    #[case(vec![0xff, 0xff, 0xff, 0xff, 0x4f])]
    fn test_read_vu32_too_long(#[case] bytes: Vec<u8>) {
        let mut reader = Reader::new(&bytes);
        let err = reader.read_vu32().unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::IntegerTooLarge);
    }

    #[test]
    fn test_read_vu32_eof() {
        let bytes = [0x80, 0x80];
        let mut reader = Reader::new(&bytes);
        let err = reader.read_vu32().unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::UnexpectedEof(_)));
        assert_eq!(err.offset, 2);
    }

    #[rstest]
    #[case(vec![0x00], 0)]
    #[case(vec![0x7f], -1)]
    #[case(vec![0x3f], 63)]
    #[case(vec![0x40], -64)]
    #[case(vec![0x80, 0x7f], -128)]
    #[case(vec![0xff, 0xff, 0xff, 0xff, 0x07], i32::MAX)]
    #[case(vec![0x80, 0x80, 0x80, 0x80, 0x78], i32::MIN)]
    fn test_read_vs32(#[case] bytes: Vec<u8>, #[case] expected: i32) {
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_vs32().unwrap(), expected);
    }

    #[rstest]
    #[case(vec![0xff, 0xff, 0xff, 0xff, 0x0f])]
    #[case(vec![0x80, 0x80, 0x80, 0x80, 0x70])]
    fn test_read_vs32_unused_bits(#[case] bytes: Vec<u8>) {
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_vs32().unwrap_err().kind, DecodeErrorKind::IntegerTooLarge);
    }

    #[rstest]
    #[case(vec![0x7f], -1)]
    #[case(vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00], i64::MAX)]
    #[case(vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7f], i64::MIN)]
    fn test_read_vs64(#[case] bytes: Vec<u8>, #[case] expected: i64) {
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_vs64().unwrap(), expected);
    }

    #[test]
    fn test_read_floats() {
        let bytes = [0x00, 0x00, 0x80, 0x3f, 0, 0, 0, 0, 0, 0, 0xf0, 0xbf];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert_eq!(reader.read_f64().unwrap(), -1.0);
    }

    #[test]
    fn test_read_name() {
        let bytes = [0x03, b'a', b'd', b'd'];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_name().unwrap(), "add");

        let bad = [0x02, 0xc3, 0x28];
        let mut reader = Reader::new(&bad);
        assert_eq!(reader.read_name().unwrap_err().kind, DecodeErrorKind::InvalidUtf8);
    }

    #[test]
    fn test_sub_reader_offsets() {
        let bytes = [0xaa, 0xbb, 0xcc, 0xdd];
        let mut reader = Reader::new(&bytes);
        reader.read_byte().unwrap();
        let mut sub = reader.sub_reader(2, "section").unwrap();
        assert_eq!(sub.offset(), 1);
        assert_eq!(sub.read_byte().unwrap(), 0xbb);
        assert_eq!(sub.read_byte().unwrap(), 0xcc);
        let err = sub.read_byte().unwrap_err();
        assert_eq!(err.offset, 3);
        assert_eq!(reader.read_byte().unwrap(), 0xdd);
    }

    #[test]
    fn test_read_count_rejects_oversized() {
        let bytes = [0x05, 0x01];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_count("types", 100).unwrap_err().kind,
            DecodeErrorKind::UnexpectedEof(_)
        ));
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_count("types", 2).unwrap_err().kind,
            DecodeErrorKind::LimitExceeded { .. }
        ));
    }
}

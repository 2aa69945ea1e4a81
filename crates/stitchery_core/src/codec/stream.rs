//! Primitive readers and writers for the binary pattern format.
//!
//! # Responsibility
//! - Encode/decode fixed-width big-endian integers, booleans, chars,
//!   length-prefixed UTF-8 strings and raw blobs.
//! - Attribute every read failure to the section being decoded.
//!
//! # Invariants
//! - A short read surfaces as `CorruptSection`, never as partial data.
//! - Length prefixes are bounds-checked before allocation.

use crate::codec::{CodecError, CodecResult};
use std::io::{ErrorKind, Read, Write};

/// Longest accepted string payload; anything above is a corrupt prefix.
const MAX_STRING_BYTES: u32 = 1 << 20;
/// Longest accepted blob payload (background image rasters).
const MAX_BLOB_BYTES: u32 = 1 << 26;

/// Section-aware reader over a byte stream.
pub struct StreamReader<R: Read> {
    inner: R,
    section: &'static str,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            section: "header",
        }
    }

    /// Names the section subsequent read failures are attributed to.
    pub fn enter(&mut self, section: &'static str) {
        self.section = section;
    }

    pub fn section(&self) -> &'static str {
        self.section
    }

    fn fill(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        self.inner.read_exact(buf).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                CodecError::corrupt(self.section, "stream ended mid-section")
            } else {
                CodecError::Io(err)
            }
        })
    }

    /// Reads exactly `N` raw bytes.
    pub fn exact<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn u8(&mut self) -> CodecResult<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    pub fn u16(&mut self) -> CodecResult<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    pub fn u32(&mut self) -> CodecResult<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    pub fn i32(&mut self) -> CodecResult<i32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    pub fn f64(&mut self) -> CodecResult<f64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }

    pub fn bool(&mut self) -> CodecResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::corrupt(
                self.section,
                format!("invalid boolean byte {other}"),
            )),
        }
    }

    pub fn char(&mut self) -> CodecResult<char> {
        let scalar = self.u32()?;
        char::from_u32(scalar).ok_or_else(|| {
            CodecError::corrupt(self.section, format!("invalid char scalar {scalar}"))
        })
    }

    pub fn string(&mut self) -> CodecResult<String> {
        let len = self.u32()?;
        if len > MAX_STRING_BYTES {
            return Err(CodecError::corrupt(
                self.section,
                format!("string length {len} out of range"),
            ));
        }
        let mut buf = vec![0u8; len as usize];
        self.fill(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|_| CodecError::corrupt(self.section, "string is not valid UTF-8"))
    }

    pub fn blob(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.u32()?;
        if len > MAX_BLOB_BYTES {
            return Err(CodecError::corrupt(
                self.section,
                format!("blob length {len} out of range"),
            ));
        }
        let mut buf = vec![0u8; len as usize];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}

/// Writer emitting the same primitive encodings.
pub struct StreamWriter<W: Write> {
    inner: W,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    fn put(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn u8(&mut self, value: u8) -> CodecResult<()> {
        self.put(&[value])
    }

    pub fn u16(&mut self, value: u16) -> CodecResult<()> {
        self.put(&value.to_be_bytes())
    }

    pub fn u32(&mut self, value: u32) -> CodecResult<()> {
        self.put(&value.to_be_bytes())
    }

    pub fn i32(&mut self, value: i32) -> CodecResult<()> {
        self.put(&value.to_be_bytes())
    }

    pub fn f64(&mut self, value: f64) -> CodecResult<()> {
        self.put(&value.to_be_bytes())
    }

    pub fn bool(&mut self, value: bool) -> CodecResult<()> {
        self.u8(u8::from(value))
    }

    pub fn char(&mut self, value: char) -> CodecResult<()> {
        self.u32(value as u32)
    }

    pub fn string(&mut self, value: &str) -> CodecResult<()> {
        self.u32(value.len() as u32)?;
        self.put(value.as_bytes())
    }

    pub fn blob(&mut self, value: &[u8]) -> CodecResult<()> {
        self.u32(value.len() as u32)?;
        self.put(value)
    }

    pub fn raw(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.put(bytes)
    }

    pub fn flush(&mut self) -> CodecResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{StreamReader, StreamWriter};
    use crate::codec::CodecError;
    use std::io::Cursor;

    #[test]
    fn primitives_round_trip() {
        let mut buf = Vec::new();
        {
            let mut writer = StreamWriter::new(&mut buf);
            writer.u16(0xBEEF).unwrap();
            writer.u32(42).unwrap();
            writer.i32(-7).unwrap();
            writer.f64(14.5).unwrap();
            writer.bool(true).unwrap();
            writer.char('Ω').unwrap();
            writer.string("backstitch").unwrap();
            writer.blob(&[1, 2, 3]).unwrap();
        }

        let mut reader = StreamReader::new(Cursor::new(buf));
        assert_eq!(reader.u16().unwrap(), 0xBEEF);
        assert_eq!(reader.u32().unwrap(), 42);
        assert_eq!(reader.i32().unwrap(), -7);
        assert_eq!(reader.f64().unwrap(), 14.5);
        assert!(reader.bool().unwrap());
        assert_eq!(reader.char().unwrap(), 'Ω');
        assert_eq!(reader.string().unwrap(), "backstitch");
        assert_eq!(reader.blob().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn short_read_names_the_active_section() {
        let mut reader = StreamReader::new(Cursor::new(vec![0u8; 2]));
        reader.enter("palette");
        let err = reader.u32().unwrap_err();
        match err {
            CodecError::CorruptSection { section, .. } => assert_eq!(section, "palette"),
            other => panic!("expected CorruptSection, got {other:?}"),
        }
    }

    #[test]
    fn oversized_string_prefix_is_rejected() {
        let mut reader = StreamReader::new(Cursor::new(u32::MAX.to_be_bytes().to_vec()));
        reader.enter("properties");
        assert!(matches!(
            reader.string(),
            Err(CodecError::CorruptSection { .. })
        ));
    }
}

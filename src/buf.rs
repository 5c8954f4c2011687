use std::mem::size_of;

use bytes::{Buf, BufMut};

use crate::error::Error;

macro_rules! try_read {
    ($name:ident, $ty:ty, $get:ident) => {
        fn $name(&mut self) -> Result<$ty, Error> {
            if self.remaining() < size_of::<$ty>() {
                return Err(Error::BadMessage(format!(
                    "{} bytes left, {} expected",
                    self.remaining(),
                    size_of::<$ty>()
                )));
            }

            Ok(self.$get())
        }
    };
}

pub trait TryBuf: Buf {
    fn try_read_u8(&mut self) -> Result<u8, Error>;
    fn try_read_u16(&mut self) -> Result<u16, Error>;
    fn try_read_u32(&mut self) -> Result<u32, Error>;
    fn try_read_u64(&mut self) -> Result<u64, Error>;
    fn try_read_i32(&mut self) -> Result<i32, Error>;
    fn try_read_i64(&mut self) -> Result<i64, Error>;
    fn try_read_bytes(&mut self) -> Result<Vec<u8>, Error>;
    fn try_read_string(&mut self) -> Result<String, Error>;
}

impl<T: Buf> TryBuf for T {
    try_read!(try_read_u8, u8, get_u8);
    try_read!(try_read_u16, u16, get_u16);
    try_read!(try_read_u32, u32, get_u32);
    try_read!(try_read_u64, u64, get_u64);
    try_read!(try_read_i32, i32, get_i32);
    try_read!(try_read_i64, i64, get_i64);

    fn try_read_bytes(&mut self) -> Result<Vec<u8>, Error> {
        let len = self.try_read_u32()? as usize;
        if self.remaining() < len {
            return Err(Error::BadMessage(format!(
                "length {len} exceeds {} remaining bytes",
                self.remaining()
            )));
        }

        Ok(self.copy_to_bytes(len).to_vec())
    }

    fn try_read_string(&mut self) -> Result<String, Error> {
        let bytes = self.try_read_bytes()?;
        String::from_utf8(bytes).map_err(|e| Error::BadMessage(e.to_string()))
    }
}

pub trait PutBuf: BufMut {
    /// Writes a `u32` length prefix followed by the bytes of `str`
    fn put_str(&mut self, str: &str) -> Result<(), Error>;
}

impl<T: BufMut> PutBuf for T {
    fn put_str(&mut self, str: &str) -> Result<(), Error> {
        let bytes = str.as_bytes();
        let len = u32::try_from(bytes.len())
            .map_err(|_| Error::BadMessage(format!("string of {} bytes", bytes.len())))?;

        self.put_u32(len);
        self.put_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::*;

    #[test]
    fn test_string_roundtrip() {
        let mut bytes = BytesMut::new();
        bytes.put_str("220 ready").unwrap();

        let mut bytes = bytes.freeze();
        assert_eq!(bytes.try_read_string().unwrap(), "220 ready");
        assert_eq!(bytes.len(), 0);
    }

    #[test]
    fn test_short_buffer() {
        let mut bytes = Bytes::from_static(&[0x00, 0x01]);
        assert!(matches!(bytes.try_read_u32(), Err(Error::BadMessage(_))));
    }

    #[test]
    fn test_truncated_string() {
        let mut bytes = Bytes::from_static(&[0x00, 0x00, 0x00, 0x05, b'a', b'b']);
        assert!(bytes.try_read_string().is_err());
    }
}

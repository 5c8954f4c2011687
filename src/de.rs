//! Deserializer for the binary envelope format written by [`crate::ser`].
//!
//! The format is not self-describing, so `deserialize_any` and friends
//! are rejected.

use bytes::Bytes;
use serde::de::{
    DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, SeqAccess, VariantAccess,
    Visitor,
};

use crate::{buf::TryBuf, error::Error};

pub struct Deserializer<'a> {
    input: &'a mut Bytes,
}

/// Decodes a value, consuming the bytes it reads
pub fn from_bytes<T: DeserializeOwned>(bytes: &mut Bytes) -> Result<T, Error> {
    let mut deserializer = Deserializer { input: bytes };
    T::deserialize(&mut deserializer)
}

impl Deserializer<'_> {
    fn tag(&mut self, what: &str) -> Result<bool, Error> {
        match self.input.try_read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(Error::BadMessage(format!("invalid {what} byte {b}"))),
        }
    }

    fn len(&mut self) -> Result<usize, Error> {
        let len = self.input.try_read_u32()? as usize;
        // each element takes at least one byte
        if len > self.input.len() {
            return Err(Error::UnexpectedEof);
        }
        Ok(len)
    }
}

macro_rules! get {
    ($($method:ident => $visit:ident($get:ident)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
                visitor.$visit(self.input.$get()?)
            }
        )*
    };
}

macro_rules! unsupported {
    ($($method:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Error> {
                Err(Error::BadMessage(format!("{} not supported", stringify!($method))))
            }
        )*
    };
}

impl<'de> serde::Deserializer<'de> for &mut Deserializer<'_> {
    type Error = Error;

    get! {
        deserialize_u8 => visit_u8(try_read_u8),
        deserialize_u16 => visit_u16(try_read_u16),
        deserialize_u32 => visit_u32(try_read_u32),
        deserialize_u64 => visit_u64(try_read_u64),
        deserialize_i32 => visit_i32(try_read_i32),
        deserialize_i64 => visit_i64(try_read_i64),
        deserialize_str => visit_string(try_read_string),
        deserialize_string => visit_string(try_read_string),
        deserialize_bytes => visit_byte_buf(try_read_bytes),
        deserialize_byte_buf => visit_byte_buf(try_read_bytes),
    }

    unsupported! {
        deserialize_any,
        deserialize_i8,
        deserialize_i16,
        deserialize_f32,
        deserialize_f64,
        deserialize_char,
        deserialize_map,
        deserialize_identifier,
        deserialize_ignored_any,
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_bool(self.tag("bool")?)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        if self.tag("option")? {
            visitor.visit_some(self)
        } else {
            visitor.visit_none()
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let len = self.len()?;
        visitor.visit_seq(Elements { de: self, len })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_seq(Elements { de: self, len })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_tuple(fields.len(), visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_enum(self)
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

/// Fixed number of consecutive values
struct Elements<'a, 'b> {
    de: &'a mut Deserializer<'b>,
    len: usize,
}

impl<'de> SeqAccess<'de> for Elements<'_, '_> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Error> {
        if self.len == 0 {
            return Ok(None);
        }

        self.len -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len)
    }
}

impl<'de> EnumAccess<'de> for &mut Deserializer<'_> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self), Error> {
        let index = self.input.try_read_u32()?;
        let value = seed.deserialize(IntoDeserializer::<Error>::into_deserializer(index))?;
        Ok((value, self))
    }
}

impl<'de> VariantAccess<'de> for &mut Deserializer<'_> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Error> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, Error> {
        serde::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        serde::Deserializer::deserialize_tuple(self, fields.len(), visitor)
    }
}

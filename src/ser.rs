//! Serializer for the binary envelope format.
//!
//! Integers are big-endian, strings and sequences carry a `u32` length
//! prefix, `Option` a presence byte and enums a `u32` variant index.
//! Structs and tuples are written field after field with no framing.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{
    ser::{
        Impossible, SerializeSeq, SerializeStruct, SerializeStructVariant, SerializeTuple,
        SerializeTupleStruct, SerializeTupleVariant,
    },
    Serialize,
};

use crate::{buf::PutBuf, error::Error};

pub struct Serializer {
    output: BytesMut,
}

/// Encodes a value into the binary envelope format
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, Error> {
    let mut serializer = Serializer {
        output: BytesMut::new(),
    };
    value.serialize(&mut serializer)?;
    Ok(serializer.output.freeze())
}

impl Serializer {
    fn put_len(&mut self, len: usize) -> Result<(), Error> {
        let len = u32::try_from(len)
            .map_err(|_| Error::BadMessage(format!("length {len} exceeds u32")))?;
        self.output.put_u32(len);
        Ok(())
    }
}

macro_rules! put {
    ($($method:ident($ty:ty) => $put:ident),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<(), Error> {
                self.output.$put(v);
                Ok(())
            }
        )*
    };
}

macro_rules! unsupported {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<(), Error> {
                Err(Error::BadMessage(format!("{} not supported", stringify!($ty))))
            }
        )*
    };
}

impl<'a> serde::Serializer for &'a mut Serializer {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    put! {
        serialize_u8(u8) => put_u8,
        serialize_u16(u16) => put_u16,
        serialize_u32(u32) => put_u32,
        serialize_u64(u64) => put_u64,
        serialize_i32(i32) => put_i32,
        serialize_i64(i64) => put_i64,
    }

    unsupported! {
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
    }

    fn serialize_str(self, v: &str) -> Result<(), Error> {
        self.output.put_str(v)
    }

    fn serialize_bool(self, v: bool) -> Result<(), Error> {
        self.serialize_u8(u8::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), Error> {
        self.put_len(v.len())?;
        self.output.put_slice(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<(), Error> {
        self.serialize_u8(0)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Error> {
        self.output.put_u8(1);
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Error> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), Error> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        index: u32,
        _variant: &'static str,
    ) -> Result<(), Error> {
        self.serialize_u32(index)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.output.put_u32(index);
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self, Error> {
        let len =
            len.ok_or_else(|| Error::BadMessage("sequence without a length".to_owned()))?;
        self.put_len(len)?;
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, Error> {
        self.output.put_u32(index);
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Error> {
        Err(Error::BadMessage("maps not supported".to_owned()))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, Error> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, Error> {
        self.output.put_u32(index);
        Ok(self)
    }
}

/// Compound values are plain concatenations of their elements
macro_rules! compound {
    ($trait:ident, $method:ident $(, $key:ident)?) => {
        impl $trait for &mut Serializer {
            type Ok = ();
            type Error = Error;

            fn $method<T: Serialize + ?Sized>(
                &mut self,
                $($key: &'static str,)?
                value: &T,
            ) -> Result<(), Error> {
                value.serialize(&mut **self)
            }

            fn end(self) -> Result<(), Error> {
                Ok(())
            }
        }
    };
}

compound!(SerializeSeq, serialize_element);
compound!(SerializeTuple, serialize_element);
compound!(SerializeTupleStruct, serialize_field);
compound!(SerializeTupleVariant, serialize_field);
compound!(SerializeStruct, serialize_field, _key);
compound!(SerializeStructVariant, serialize_field, _key);

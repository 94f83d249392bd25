//! Serializer recording primitive shapes directly as [`FieldValue`]s.
//!
//! Scalars keep their exact kind and bits. Sequences, maps and structs are
//! reported as [`ShapeError::Composite`] so the caller can fall back to a
//! JSON value.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use serde::ser::{self, Impossible, Serializer};
use thiserror::Error;

use super::{FieldValue, Kind};

#[derive(Debug, Error)]
pub(super) enum ShapeError {
    #[error("value has a composite shape")]
    Composite,
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for ShapeError {
    fn custom<T: fmt::Display>(message: T) -> Self {
        Self::Custom(message.to_string())
    }
}

pub(super) struct ShapeSerializer;

type Composite = Impossible<FieldValue, ShapeError>;

impl Serializer for ShapeSerializer {
    type Ok = FieldValue;
    type Error = ShapeError;
    type SerializeSeq = Composite;
    type SerializeTuple = Composite;
    type SerializeTupleStruct = Composite;
    type SerializeTupleVariant = Composite;
    type SerializeMap = Composite;
    type SerializeStruct = Composite;
    type SerializeStructVariant = Composite;

    fn serialize_bool(self, v: bool) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::I8(v))
    }

    fn serialize_i16(self, v: i16) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::I16(v))
    }

    fn serialize_i32(self, v: i32) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::I32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::I64(v))
    }

    fn serialize_i128(self, v: i128) -> Result<FieldValue, ShapeError> {
        i64::try_from(v)
            .map(FieldValue::I64)
            .or_else(|_| u64::try_from(v).map(FieldValue::U64))
            .map_err(|_| ShapeError::Custom(format!("{v} does not fit in 64 bits")))
    }

    fn serialize_u8(self, v: u8) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::U8(v))
    }

    fn serialize_u16(self, v: u16) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::U16(v))
    }

    fn serialize_u32(self, v: u32) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::U32(v))
    }

    fn serialize_u64(self, v: u64) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::U64(v))
    }

    fn serialize_u128(self, v: u128) -> Result<FieldValue, ShapeError> {
        u64::try_from(v)
            .map(FieldValue::U64)
            .map_err(|_| ShapeError::Custom(format!("{v} does not fit in 64 bits")))
    }

    fn serialize_f32(self, v: f32) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::F32(v))
    }

    fn serialize_f64(self, v: f64) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::Str(Cow::Owned(v.to_string())))
    }

    fn serialize_str(self, v: &str) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::Str(Cow::Owned(v.to_owned())))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<FieldValue, ShapeError> {
        Err(ShapeError::Composite)
    }

    fn serialize_none(self) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::Null(Kind::Object))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<FieldValue, ShapeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::Null(Kind::Object))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::Null(Kind::Object))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<FieldValue, ShapeError> {
        Ok(FieldValue::Str(Cow::Borrowed(variant)))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<FieldValue, ShapeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<FieldValue, ShapeError> {
        Err(ShapeError::Composite)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Composite, ShapeError> {
        Err(ShapeError::Composite)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Composite, ShapeError> {
        Err(ShapeError::Composite)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Composite, ShapeError> {
        Err(ShapeError::Composite)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Composite, ShapeError> {
        Err(ShapeError::Composite)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Composite, ShapeError> {
        Err(ShapeError::Composite)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Composite, ShapeError> {
        Err(ShapeError::Composite)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Composite, ShapeError> {
        Err(ShapeError::Composite)
    }
}

//! crates/record/src/field.rs
//! Tagged values carried by log records.
//!
//! A [`Field`] pairs a key with a [`FieldValue`], the closed sum type holding
//! exactly one payload per [`Kind`]. Scalars are stored inline; composite
//! shapes (arrays, objects) keep their [`serde_json::Value`] representation so
//! encoders can embed them without another conversion pass.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use shape::{ShapeError, ShapeSerializer};

mod shape;

/// Suffix marking a vary field: omitted from output while its value is zero.
pub const VARY_SUFFIX: char = '?';

/// Prefix of chain-internal system keys that encoders never render.
pub const RESERVED_PREFIX: char = '_';

/// Base type of a [`FieldValue`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Kind {
    /// Value that could not be represented; dropped by encoders.
    Invalid,
    /// Boolean.
    Bool,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// UTF-8 string.
    Str,
    /// Complex number with 32-bit parts.
    Complex64,
    /// Complex number with 64-bit parts.
    Complex128,
    /// Calendar timestamp.
    Time,
    /// Elapsed duration.
    Duration,
    /// Ordered sequence.
    Array,
    /// Struct or map.
    Object,
}

impl Kind {
    /// Reports whether values of this kind render as plain text rather than an
    /// embedded structured fragment.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(
            self,
            Self::Array | Self::Object | Self::Complex64 | Self::Complex128
        )
    }

    /// Lowercase kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Str => "str",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::Time => "time",
            Self::Duration => "duration",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a [`Field`].
///
/// Exactly one payload exists per variant; the [`Kind`] is derived from the
/// variant rather than stored alongside it.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Unsupported input shape.
    Invalid,
    /// Absent value of the given kind (a `None` passed where a value was expected).
    Null(Kind),
    /// Boolean payload.
    Bool(bool),
    /// `i8` payload.
    I8(i8),
    /// `i16` payload.
    I16(i16),
    /// `i32` payload.
    I32(i32),
    /// `i64` payload.
    I64(i64),
    /// `u8` payload.
    U8(u8),
    /// `u16` payload.
    U16(u16),
    /// `u32` payload.
    U32(u32),
    /// `u64` payload.
    U64(u64),
    /// `f32` payload.
    F32(f32),
    /// `f64` payload.
    F64(f64),
    /// String payload.
    Str(Cow<'static, str>),
    /// Complex number with `f32` parts.
    Complex64 {
        /// Real part.
        re: f32,
        /// Imaginary part.
        im: f32,
    },
    /// Complex number with `f64` parts.
    Complex128 {
        /// Real part.
        re: f64,
        /// Imaginary part.
        im: f64,
    },
    /// Timestamp payload.
    Time(OffsetDateTime),
    /// Duration payload.
    Duration(Duration),
    /// Array payload.
    Array(Vec<Value>),
    /// Struct or map payload.
    Object(Map<String, Value>),
}

impl FieldValue {
    /// Returns the base kind of the value. Null values report the kind they stand in for.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Invalid => Kind::Invalid,
            Self::Null(kind) => *kind,
            Self::Bool(_) => Kind::Bool,
            Self::I8(_) => Kind::I8,
            Self::I16(_) => Kind::I16,
            Self::I32(_) => Kind::I32,
            Self::I64(_) => Kind::I64,
            Self::U8(_) => Kind::U8,
            Self::U16(_) => Kind::U16,
            Self::U32(_) => Kind::U32,
            Self::U64(_) => Kind::U64,
            Self::F32(_) => Kind::F32,
            Self::F64(_) => Kind::F64,
            Self::Str(_) => Kind::Str,
            Self::Complex64 { .. } => Kind::Complex64,
            Self::Complex128 { .. } => Kind::Complex128,
            Self::Time(_) => Kind::Time,
            Self::Duration(_) => Kind::Duration,
            Self::Array(_) => Kind::Array,
            Self::Object(_) => Kind::Object,
        }
    }

    /// Reports whether the value is a null stand-in.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    /// Reports whether the value was produced from an unsupported input.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Reports whether the value holds its kind's zero.
    ///
    /// Numbers compare their bit pattern against zero (so `-0.0` is not zero),
    /// strings are zero when empty, composites when empty, durations when
    /// zero and timestamps at the unix epoch. Null and invalid values are
    /// always zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Invalid | Self::Null(_) => true,
            Self::Bool(value) => !value,
            Self::I8(value) => *value == 0,
            Self::I16(value) => *value == 0,
            Self::I32(value) => *value == 0,
            Self::I64(value) => *value == 0,
            Self::U8(value) => *value == 0,
            Self::U16(value) => *value == 0,
            Self::U32(value) => *value == 0,
            Self::U64(value) => *value == 0,
            Self::F32(value) => value.to_bits() == 0,
            Self::F64(value) => value.to_bits() == 0,
            Self::Str(value) => value.is_empty(),
            Self::Complex64 { re, im } => re.to_bits() == 0 && im.to_bits() == 0,
            Self::Complex128 { re, im } => re.to_bits() == 0 && im.to_bits() == 0,
            Self::Time(value) => *value == OffsetDateTime::UNIX_EPOCH,
            Self::Duration(value) => value.is_zero(),
            Self::Array(values) => values.is_empty(),
            Self::Object(entries) => entries.is_empty(),
        }
    }

    /// Builds a value from the serialized shape of `value`.
    ///
    /// Primitives keep their exact kind and bits (an `f32` stays
    /// [`FieldValue::F32`], a `u8` stays [`FieldValue::U8`]), strings and
    /// unit variants become [`FieldValue::Str`], sequences
    /// [`FieldValue::Array`] and structs or maps [`FieldValue::Object`]. A
    /// serialized `None` or unit becomes a null object and a serialization
    /// failure (for example a map with non-string keys) yields
    /// [`FieldValue::Invalid`].
    pub fn from_serialize<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        match value.serialize(ShapeSerializer) {
            Ok(scalar) => scalar,
            Err(ShapeError::Composite) => {
                serde_json::to_value(value).map_or(Self::Invalid, Self::from_json)
            }
            Err(ShapeError::Custom(_)) => Self::Invalid,
        }
    }

    /// Converts an already-built JSON value.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null(Kind::Object),
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => {
                if let Some(signed) = number.as_i64() {
                    Self::I64(signed)
                } else if let Some(unsigned) = number.as_u64() {
                    Self::U64(unsigned)
                } else {
                    number.as_f64().map_or(Self::Invalid, Self::F64)
                }
            }
            Value::String(text) => Self::Str(Cow::Owned(text)),
            Value::Array(values) => Self::Array(values),
            Value::Object(entries) => Self::Object(entries),
        }
    }
}

impl fmt::Display for FieldValue {
    /// Plain-text form used by the template encoder for scalar kinds.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => f.write_str("<invalid>"),
            Self::Null(_) => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::I8(value) => write!(f, "{value}"),
            Self::I16(value) => write!(f, "{value}"),
            Self::I32(value) => write!(f, "{value}"),
            Self::I64(value) => write!(f, "{value}"),
            Self::U8(value) => write!(f, "{value}"),
            Self::U16(value) => write!(f, "{value}"),
            Self::U32(value) => write!(f, "{value}"),
            Self::U64(value) => write!(f, "{value}"),
            Self::F32(value) => write!(f, "{value}"),
            Self::F64(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
            Self::Complex64 { re, im } => write!(f, "({re}{im:+}i)"),
            Self::Complex128 { re, im } => write!(f, "({re}{im:+}i)"),
            Self::Time(value) => match value.format(&Rfc3339) {
                Ok(text) => f.write_str(&text),
                Err(_) => write!(f, "{}", value.unix_timestamp()),
            },
            Self::Duration(value) => write!(f, "{value:?}"),
            Self::Array(values) => write!(f, "{}", Value::Array(values.clone())),
            Self::Object(entries) => write!(f, "{}", Value::Object(entries.clone())),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Invalid | Self::Null(_) => serializer.serialize_none(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::I8(value) => serializer.serialize_i8(*value),
            Self::I16(value) => serializer.serialize_i16(*value),
            Self::I32(value) => serializer.serialize_i32(*value),
            Self::I64(value) => serializer.serialize_i64(*value),
            Self::U8(value) => serializer.serialize_u8(*value),
            Self::U16(value) => serializer.serialize_u16(*value),
            Self::U32(value) => serializer.serialize_u32(*value),
            Self::U64(value) => serializer.serialize_u64(*value),
            Self::F32(value) => serializer.serialize_f32(*value),
            Self::F64(value) => serializer.serialize_f64(*value),
            Self::Str(value) => serializer.serialize_str(value),
            Self::Complex64 { .. } | Self::Complex128 { .. } | Self::Time(_) | Self::Duration(_) => {
                serializer.collect_str(self)
            }
            Self::Array(values) => values.serialize(serializer),
            Self::Object(entries) => entries.serialize(serializer),
        }
    }
}

/// Scalar Rust types with a fixed [`Kind`], usable with [`Field::optional`].
pub trait Scalar: Into<FieldValue> {
    /// Kind recorded when the value is absent.
    const KIND: Kind;
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl Scalar for $ty {
                const KIND: Kind = Kind::$variant;
            }
        )*
    };
}

scalar_conversions! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    OffsetDateTime => Time,
    Duration => Duration,
}

impl From<&'static str> for FieldValue {
    fn from(value: &'static str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl From<Cow<'static, str>> for FieldValue {
    fn from(value: Cow<'static, str>) -> Self {
        Self::Str(value)
    }
}

impl Scalar for &'static str {
    const KIND: Kind = Kind::Str;
}

impl Scalar for String {
    const KIND: Kind = Kind::Str;
}

/// A keyed value attached to a [`LogRecord`](crate::LogRecord).
///
/// # Examples
///
/// ```
/// use record::{Field, Kind};
///
/// let retries = Field::u32("retries?", 0);
/// assert_eq!(retries.key(), "retries");
/// assert!(retries.is_vary());
/// assert!(retries.is_zero());
///
/// let missing = Field::optional::<i64>("offset", None);
/// assert!(missing.is_null());
/// assert_eq!(missing.kind(), Kind::I64);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: FieldValue,
    frame: usize,
    system: bool,
    vary: bool,
}

impl Field {
    /// Creates a top-level field. A trailing `?` on `key` marks a vary field
    /// and is stripped before storage.
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        let (key, vary) = strip_vary_suffix(key.into());
        Self {
            key,
            value: value.into(),
            frame: 0,
            system: false,
            vary,
        }
    }

    /// Creates a system field carrying chain metadata.
    pub fn system(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            system: true,
            ..Self::new(key, value)
        }
    }

    /// Boolean field.
    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, value)
    }

    /// `i8` field.
    pub fn i8(key: impl Into<Cow<'static, str>>, value: i8) -> Self {
        Self::new(key, value)
    }

    /// `i16` field.
    pub fn i16(key: impl Into<Cow<'static, str>>, value: i16) -> Self {
        Self::new(key, value)
    }

    /// `i32` field.
    pub fn i32(key: impl Into<Cow<'static, str>>, value: i32) -> Self {
        Self::new(key, value)
    }

    /// `i64` field.
    pub fn i64(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, value)
    }

    /// `u8` field.
    pub fn u8(key: impl Into<Cow<'static, str>>, value: u8) -> Self {
        Self::new(key, value)
    }

    /// `u16` field.
    pub fn u16(key: impl Into<Cow<'static, str>>, value: u16) -> Self {
        Self::new(key, value)
    }

    /// `u32` field.
    pub fn u32(key: impl Into<Cow<'static, str>>, value: u32) -> Self {
        Self::new(key, value)
    }

    /// `u64` field.
    pub fn u64(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::new(key, value)
    }

    /// `f32` field.
    pub fn f32(key: impl Into<Cow<'static, str>>, value: f32) -> Self {
        Self::new(key, value)
    }

    /// `f64` field.
    pub fn f64(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self::new(key, value)
    }

    /// String field.
    pub fn str(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, FieldValue::Str(value.into()))
    }

    /// Timestamp field.
    pub fn time(key: impl Into<Cow<'static, str>>, value: OffsetDateTime) -> Self {
        Self::new(key, value)
    }

    /// Duration field.
    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, value)
    }

    /// Complex field with `f32` parts.
    pub fn complex64(key: impl Into<Cow<'static, str>>, re: f32, im: f32) -> Self {
        Self::new(key, FieldValue::Complex64 { re, im })
    }

    /// Complex field with `f64` parts.
    pub fn complex128(key: impl Into<Cow<'static, str>>, re: f64, im: f64) -> Self {
        Self::new(key, FieldValue::Complex128 { re, im })
    }

    /// Field for an optional scalar: `None` records a null of `T`'s kind.
    pub fn optional<T: Scalar>(key: impl Into<Cow<'static, str>>, value: Option<T>) -> Self {
        match value {
            Some(value) => Self::new(key, value),
            None => Self::new(key, FieldValue::Null(T::KIND)),
        }
    }

    /// Field built from the serialized shape of an arbitrary value.
    pub fn any<T>(key: impl Into<Cow<'static, str>>, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        Self::new(key, FieldValue::from_serialize(value))
    }

    /// String field built through the value's [`Display`](fmt::Display) implementation.
    pub fn display<T>(key: impl Into<Cow<'static, str>>, value: &T) -> Self
    where
        T: fmt::Display + ?Sized,
    {
        Self::new(key, FieldValue::Str(Cow::Owned(value.to_string())))
    }

    /// Tags the field with the captured frame it belongs to.
    pub fn at_frame(mut self, frame: usize) -> Self {
        self.frame = frame;
        self
    }

    pub(crate) fn set_frame(&mut self, frame: usize) {
        self.frame = frame;
    }

    pub(crate) fn mark_system(&mut self) {
        self.system = true;
    }

    /// Returns the key without the vary marker; empty for unnamed fields.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the payload.
    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Returns the captured-frame index (0 for top-level fields).
    #[must_use]
    pub const fn frame(&self) -> usize {
        self.frame
    }

    /// Reports whether the field carries chain metadata.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        self.system
    }

    /// Reports whether the key was suffixed with the vary marker.
    #[must_use]
    pub const fn is_vary(&self) -> bool {
        self.vary
    }

    /// Reports whether the field has no key.
    #[must_use]
    pub fn is_unnamed(&self) -> bool {
        self.key.is_empty()
    }

    /// Returns the base kind of the payload.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.value.kind()
    }

    /// Reports whether the payload is a null stand-in.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Reports whether the payload is its kind's zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Reports whether the key is reserved for chain-internal bookkeeping.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.system && self.key.starts_with(RESERVED_PREFIX)
    }

    /// Decides whether an encoder emits the field.
    ///
    /// Invalid and reserved fields are never emitted; zero vary fields are
    /// emitted only when `allow_empty` is set.
    #[must_use]
    pub fn is_rendered(&self, allow_empty: bool) -> bool {
        if self.value.is_invalid() || self.is_reserved() {
            return false;
        }
        allow_empty || !self.vary || !self.value.is_zero()
    }
}

fn strip_vary_suffix(key: Cow<'static, str>) -> (Cow<'static, str>, bool) {
    if !key.ends_with(VARY_SUFFIX) {
        return (key, false);
    }

    let stripped = match key {
        Cow::Borrowed(text) => Cow::Borrowed(&text[..text.len() - VARY_SUFFIX.len_utf8()]),
        Cow::Owned(mut text) => {
            text.pop();
            Cow::Owned(text)
        }
    };
    (stripped, true)
}

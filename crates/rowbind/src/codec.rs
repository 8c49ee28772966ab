//! Codec resolution
//!
//! Every supported field type maps to a [`Codec`]: a pair of plain function
//! pointers operating on type-erased field slots. The [`CodecRegistry`] is the
//! dispatch table from a declared type's [`TypeId`] to its codec. Optional
//! wrappers compose: `Option<T>` maps an empty cell to `None` and delegates
//! everything else to `T`, whatever `T` is. Registering a value type also
//! registers `Option<T>` and `Option<Option<T>>`.

use crate::config::CodecContext;
use crate::error::ConversionError;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::num::IntErrorKind;

/// Decode raw cell text into a field slot
pub type DecodeFn = fn(&CodecContext, &mut dyn Any, &str, &str) -> Result<(), ConversionError>;

/// Encode a field slot into cell text
pub type EncodeFn = fn(&CodecContext, &dyn Any, &str) -> Result<String, ConversionError>;

/// Value category of a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Signed integer of any width
    SignedInteger,
    /// Unsigned integer of any width
    UnsignedInteger,
    /// Floating point number of any width
    Float,
    /// Raw text
    Text,
    /// Point in time, rendered with a format string
    Temporal,
    /// User registered value type
    Custom,
}

impl Category {
    /// Check whether fields of this category need a format string
    pub fn requires_format(self) -> bool {
        matches!(self, Self::Temporal)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SignedInteger => "signed integer",
            Self::UnsignedInteger => "unsigned integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Temporal => "temporal",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// A value type that can be stored in a single column
pub trait ColumnValue: Sized + Any + Send + Sync {
    /// Category reported for this type
    const CATEGORY: Category;

    /// Whether an empty cell means an absent value
    const OPTIONAL: bool = false;

    /// Convert cell text into a value
    fn decode_column(
        raw: &str,
        format: &str,
        context: &CodecContext,
    ) -> Result<Self, ConversionError>;

    /// Convert a value into cell text
    fn encode_column(
        &self,
        format: &str,
        context: &CodecContext,
    ) -> Result<String, ConversionError>;
}

/// Resolved conversion functions for one declared field type
#[derive(Clone, Copy)]
pub struct Codec {
    decode: DecodeFn,
    encode: EncodeFn,
    category: Category,
    optional: bool,
    type_name: &'static str,
}

impl Codec {
    /// Codec for a value type
    pub fn of<T: ColumnValue>() -> Self {
        Self {
            decode: decode_value::<T>,
            encode: encode_value::<T>,
            category: T::CATEGORY,
            optional: T::OPTIONAL,
            type_name: type_name::<T>(),
        }
    }

    /// Codec for `Option<T>`, delegating present values to `T`
    pub fn optional<T: ColumnValue>() -> Self {
        Self::of::<Option<T>>()
    }

    /// Decode `raw` into `slot`
    pub fn decode(
        &self,
        context: &CodecContext,
        slot: &mut dyn Any,
        raw: &str,
        format: &str,
    ) -> Result<(), ConversionError> {
        (self.decode)(context, slot, raw, format)
    }

    /// Encode `slot` into cell text
    pub fn encode(
        &self,
        context: &CodecContext,
        slot: &dyn Any,
        format: &str,
    ) -> Result<String, ConversionError> {
        (self.encode)(context, slot, format)
    }

    /// Category of the (unwrapped) value type
    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether this codec handles an `Option<T>` field
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Declared type this codec was built for
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("type_name", &self.type_name)
            .field("category", &self.category)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

fn decode_value<T: ColumnValue>(
    context: &CodecContext,
    slot: &mut dyn Any,
    raw: &str,
    format: &str,
) -> Result<(), ConversionError> {
    let slot = slot
        .downcast_mut::<T>()
        .ok_or(ConversionError::TypeMismatch {
            expected: type_name::<T>(),
        })?;
    *slot = T::decode_column(raw, format, context)?;
    Ok(())
}

fn encode_value<T: ColumnValue>(
    context: &CodecContext,
    slot: &dyn Any,
    format: &str,
) -> Result<String, ConversionError> {
    slot.downcast_ref::<T>()
        .ok_or(ConversionError::TypeMismatch {
            expected: type_name::<T>(),
        })?
        .encode_column(format, context)
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    const CATEGORY: Category = T::CATEGORY;
    const OPTIONAL: bool = true;

    fn decode_column(
        raw: &str,
        format: &str,
        context: &CodecContext,
    ) -> Result<Self, ConversionError> {
        if raw.is_empty() {
            return Ok(None);
        }
        T::decode_column(raw, format, context).map(Some)
    }

    fn encode_column(
        &self,
        format: &str,
        context: &CodecContext,
    ) -> Result<String, ConversionError> {
        match self {
            Some(value) => value.encode_column(format, context),
            None => Ok(String::new()),
        }
    }
}

/// Dispatch table from declared field type to codec
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<TypeId, Codec>,
}

impl CodecRegistry {
    /// Create a registry with no codecs
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in codec
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry
            .register::<i8>()
            .register::<i16>()
            .register::<i32>()
            .register::<i64>()
            .register::<i128>()
            .register::<isize>()
            .register::<u8>()
            .register::<u16>()
            .register::<u32>()
            .register::<u64>()
            .register::<u128>()
            .register::<usize>()
            .register::<f32>()
            .register::<f64>()
            .register::<String>();
        crate::temporal::register_builtin(&mut registry);

        registry
    }

    /// Register `T`, `Option<T>` and `Option<Option<T>>`, replacing any
    /// previous codecs
    ///
    /// Deeper wrappers can be added with `register_exact::<Option<..>>()`.
    pub fn register<T: ColumnValue>(&mut self) -> &mut Self {
        self.register_exact::<T>()
            .register_exact::<Option<T>>()
            .register_exact::<Option<Option<T>>>()
    }

    /// Register `T` alone, replacing any previous codec
    pub fn register_exact<T: ColumnValue>(&mut self) -> &mut Self {
        self.codecs.insert(TypeId::of::<T>(), Codec::of::<T>());
        self
    }

    /// Look up the codec for a declared type
    pub fn resolve(&self, type_id: TypeId) -> Option<Codec> {
        self.codecs.get(&type_id).copied()
    }

    /// Look up the codec for `T`
    pub fn resolve_type<T: Any>(&self) -> Option<Codec> {
        self.resolve(TypeId::of::<T>())
    }

    /// Number of registered declared types
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn integer_error(raw: &str, type_name: &'static str, kind: &IntErrorKind) -> ConversionError {
    match kind {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ConversionError::Overflow {
            raw: raw.to_string(),
            type_name,
        },
        _ => ConversionError::InvalidInteger {
            raw: raw.to_string(),
        },
    }
}

macro_rules! integer_column {
    ($category:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl ColumnValue for $ty {
                const CATEGORY: Category = $category;

                fn decode_column(
                    raw: &str,
                    _format: &str,
                    _context: &CodecContext,
                ) -> Result<Self, ConversionError> {
                    raw.parse::<$ty>()
                        .map_err(|err| integer_error(raw, stringify!($ty), err.kind()))
                }

                fn encode_column(
                    &self,
                    _format: &str,
                    _context: &CodecContext,
                ) -> Result<String, ConversionError> {
                    Ok(self.to_string())
                }
            }
        )+
    };
}

integer_column!(Category::SignedInteger => i8, i16, i32, i64, i128, isize);
integer_column!(Category::UnsignedInteger => u8, u16, u32, u64, u128, usize);

/// Parse at the target width, rejecting text whose magnitude only fits as infinity
fn parse_float<F>(raw: &str, type_name: &'static str) -> Result<F, ConversionError>
where
    F: std::str::FromStr + Into<f64> + Copy,
{
    let value = raw.parse::<F>().map_err(|_| ConversionError::InvalidFloat {
        raw: raw.to_string(),
    })?;

    if value.into().is_infinite() && !is_infinity_literal(raw) {
        return Err(ConversionError::Overflow {
            raw: raw.to_string(),
            type_name,
        });
    }
    Ok(value)
}

fn is_infinity_literal(raw: &str) -> bool {
    let unsigned = raw.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

impl ColumnValue for f64 {
    const CATEGORY: Category = Category::Float;

    fn decode_column(
        raw: &str,
        _format: &str,
        _context: &CodecContext,
    ) -> Result<Self, ConversionError> {
        parse_float::<Self>(raw, "f64")
    }

    fn encode_column(
        &self,
        _format: &str,
        _context: &CodecContext,
    ) -> Result<String, ConversionError> {
        Ok(self.to_string())
    }
}

impl ColumnValue for f32 {
    const CATEGORY: Category = Category::Float;

    fn decode_column(
        raw: &str,
        _format: &str,
        _context: &CodecContext,
    ) -> Result<Self, ConversionError> {
        parse_float::<Self>(raw, "f32")
    }

    fn encode_column(
        &self,
        _format: &str,
        _context: &CodecContext,
    ) -> Result<String, ConversionError> {
        Ok(self.to_string())
    }
}

impl ColumnValue for String {
    const CATEGORY: Category = Category::Text;

    fn decode_column(
        raw: &str,
        _format: &str,
        _context: &CodecContext,
    ) -> Result<Self, ConversionError> {
        Ok(raw.to_string())
    }

    fn encode_column(
        &self,
        _format: &str,
        _context: &CodecContext,
    ) -> Result<String, ConversionError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn decode<T: ColumnValue>(raw: &str) -> Result<T, ConversionError> {
        T::decode_column(raw, "", &CodecContext::default())
    }

    #[test]
    fn test_integer_width_overflow() {
        assert_eq!(decode::<i32>("-32").unwrap(), -32);
        assert_eq!(decode::<i64>("4294967296").unwrap(), 4_294_967_296);
        assert_eq!(
            decode::<i32>("4294967296"),
            Err(ConversionError::Overflow {
                raw: "4294967296".to_string(),
                type_name: "i32",
            })
        );
        assert!(matches!(
            decode::<i8>("-129"),
            Err(ConversionError::Overflow { type_name: "i8", .. })
        ));
        assert!(matches!(
            decode::<u16>("65536"),
            Err(ConversionError::Overflow { type_name: "u16", .. })
        ));
    }

    #[test]
    fn test_integer_parse_errors() {
        assert!(matches!(
            decode::<i64>("12x"),
            Err(ConversionError::InvalidInteger { .. })
        ));
        assert!(matches!(
            decode::<u32>("-1"),
            Err(ConversionError::InvalidInteger { .. })
        ));
        assert!(matches!(
            decode::<i32>(""),
            Err(ConversionError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_float_width_overflow() {
        assert!((decode::<f32>("3.2").unwrap() - 3.2).abs() < f32::EPSILON);
        assert!((decode::<f64>("1e300").unwrap() - 1e300).abs() < 1e285);
        assert!(matches!(
            decode::<f32>("1e300"),
            Err(ConversionError::Overflow { type_name: "f32", .. })
        ));
        assert!(matches!(
            decode::<f64>("1e400"),
            Err(ConversionError::Overflow { type_name: "f64", .. })
        ));
        assert!(decode::<f64>("-inf").unwrap().is_infinite());
        assert!(matches!(
            decode::<f64>("abc"),
            Err(ConversionError::InvalidFloat { .. })
        ));
    }

    #[test]
    fn test_float_encoding() {
        let context = CodecContext::default();
        assert_eq!(3.2_f32.encode_column("", &context).unwrap(), "3.2");
        assert_eq!(6.4_f64.encode_column("", &context).unwrap(), "6.4");
        assert_eq!((-0.5_f64).encode_column("", &context).unwrap(), "-0.5");
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(decode::<String>(" a,\"b\" ").unwrap(), " a,\"b\" ");
        assert_eq!(decode::<String>("").unwrap(), "");
    }

    #[test]
    fn test_registry_resolves_optional_wrapper() {
        let registry = CodecRegistry::new();

        let plain = registry.resolve_type::<u64>().unwrap();
        assert!(!plain.is_optional());
        assert_eq!(plain.category(), Category::UnsignedInteger);

        let optional = registry.resolve_type::<Option<u64>>().unwrap();
        assert!(optional.is_optional());
        assert_eq!(optional.category(), Category::UnsignedInteger);

        assert!(registry.resolve_type::<BTreeMap<String, String>>().is_none());
        assert!(registry.resolve_type::<Option<Option<Option<u64>>>>().is_none());
        assert!(registry.resolve_type::<bool>().is_none());
    }

    #[test]
    fn test_optional_codec_roundtrip() {
        let context = CodecContext::default();
        let codec = Codec::optional::<i32>();
        let mut slot: Option<i32> = Some(7);

        codec.decode(&context, &mut slot, "", "").unwrap();
        assert_eq!(slot, None);
        assert_eq!(codec.encode(&context, &slot, "").unwrap(), "");

        codec.decode(&context, &mut slot, "-5", "").unwrap();
        assert_eq!(slot, Some(-5));
        assert_eq!(codec.encode(&context, &slot, "").unwrap(), "-5");
    }

    #[test]
    fn test_nested_optional_codec() {
        let context = CodecContext::default();
        let registry = CodecRegistry::new();
        let codec = registry.resolve_type::<Option<Option<u64>>>().unwrap();
        assert!(codec.is_optional());
        assert_eq!(codec.category(), Category::UnsignedInteger);

        let mut slot: Option<Option<u64>> = None;
        codec.decode(&context, &mut slot, "5", "").unwrap();
        assert_eq!(slot, Some(Some(5)));
        assert_eq!(codec.encode(&context, &slot, "").unwrap(), "5");

        codec.decode(&context, &mut slot, "", "").unwrap();
        assert_eq!(slot, None);
        assert_eq!(codec.encode(&context, &slot, "").unwrap(), "");
        assert_eq!(codec.encode(&context, &Some(None::<u64>), "").unwrap(), "");

        let mut deeper = CodecRegistry::empty();
        deeper.register_exact::<Option<Option<Option<u64>>>>();
        let codec = deeper
            .resolve_type::<Option<Option<Option<u64>>>>()
            .unwrap();
        let mut slot: Option<Option<Option<u64>>> = None;
        codec.decode(&context, &mut slot, "9", "").unwrap();
        assert_eq!(slot, Some(Some(Some(9))));
    }

    #[test]
    fn test_f32_matches_native_parsing() {
        // Rounds differently through f64 than when parsed directly
        let raw = "1.00000005960464477550";
        assert_eq!(
            decode::<f32>(raw).unwrap().to_bits(),
            raw.parse::<f32>().unwrap().to_bits()
        );
        assert_eq!(
            decode::<f32>("3.4028235e38").unwrap().to_bits(),
            f32::MAX.to_bits()
        );
        assert!(matches!(
            decode::<f32>("3.5e38"),
            Err(ConversionError::Overflow { type_name: "f32", .. })
        ));
        assert!(decode::<f32>("-infinity").unwrap().is_infinite());
        assert!(matches!(
            decode::<f32>("1.2.3"),
            Err(ConversionError::InvalidFloat { .. })
        ));
    }

    #[test]
    fn test_slot_type_mismatch() {
        let context = CodecContext::default();
        let codec = Codec::of::<i32>();
        let mut wrong = String::new();
        assert_eq!(
            codec.decode(&context, &mut wrong, "1", ""),
            Err(ConversionError::TypeMismatch { expected: "i32" })
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = CodecRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.resolve_type::<i32>().is_none());
        assert!(CodecRegistry::new().len() > 20);
    }
}

//! Custom conversion overrides
//!
//! A hook sees every field before its codec does and may claim it. The
//! [`FieldMeta`] argument carries the field path, column binding and format,
//! so a hook can pick fields by name, by category or by declared type.
//!
//! ```
//! use chrono::{DateTime, Utc};
//! use rowbind::{Category, ConversionError, FieldMeta};
//! use rowbind::hook::EncodeHook;
//! use std::any::Any;
//!
//! // Render unset timestamps as "N/A"
//! let hook: EncodeHook = Box::new(
//!     |meta: &FieldMeta, value: &dyn Any| -> Result<Option<String>, ConversionError> {
//!         if meta.category() != Category::Temporal {
//!             return Ok(None);
//!         }
//!         match value.downcast_ref::<DateTime<Utc>>() {
//!             Some(at) if at.timestamp() == 0 => Ok(Some("N/A".to_string())),
//!             _ => Ok(None),
//!         }
//!     },
//! );
//! # let _ = hook;
//! ```

use crate::descriptor::FieldMeta;
use crate::error::ConversionError;
use std::any::Any;

/// Decode override: `Ok(true)` when the hook stored a value itself
pub type DecodeHook =
    Box<dyn Fn(&FieldMeta, &mut dyn Any, &str) -> Result<bool, ConversionError> + Send + Sync>;

/// Encode override: `Ok(Some(text))` when the hook produced the cell itself
pub type EncodeHook =
    Box<dyn Fn(&FieldMeta, &dyn Any) -> Result<Option<String>, ConversionError> + Send + Sync>;

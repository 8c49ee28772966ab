//! Record to row encoding

use crate::cache::DescriptorCache;
use crate::config::{CodecConfig, CodecContext};
use crate::descriptor::{FieldDescriptor, FieldMeta};
use crate::error::{ConversionError, Error, Result};
use crate::hook::EncodeHook;
use crate::row::RowWriter;
use crate::schema::Record;
use chrono::FixedOffset;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Writes records as rows into a [`RowWriter`]
///
/// Rows are handed to the writer as they are produced; buffering and
/// flushing stay with the writer.
pub struct Encoder<W> {
    writer: W,
    context: CodecContext,
    hook: Option<EncodeHook>,
    cache: Arc<DescriptorCache>,
}

impl<W: RowWriter> Encoder<W> {
    /// Create an encoder rendering temporal columns in UTC
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            context: CodecContext::default(),
            hook: None,
            cache: DescriptorCache::global(),
        }
    }

    /// Render temporal columns in `zone`
    #[must_use]
    pub fn with_zone(mut self, zone: FixedOffset) -> Self {
        self.context = CodecContext::new(zone);
        self
    }

    /// Apply a codec configuration
    pub fn with_config(mut self, config: &CodecConfig) -> Result<Self> {
        self.context = CodecContext::from_config(config)?;
        Ok(self)
    }

    /// Use `cache` instead of the process-wide one
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DescriptorCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Install a hook consulted before each field's codec
    #[must_use]
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FieldMeta, &dyn Any) -> std::result::Result<Option<String>, ConversionError>
            + Send
            + Sync
            + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Conversion context in use
    pub fn context(&self) -> &CodecContext {
        &self.context
    }

    /// Write the column names of `R` in field order
    pub fn write_header<R: Record>(&mut self) -> Result<()> {
        let layout = self.cache.layout::<R>()?;
        self.write(&layout.column_names())
    }

    /// Encode `record` and write it as one row
    ///
    /// The row has one cell per bound field, in field order. Nothing is
    /// written when any field fails.
    pub fn encode_one<R: Record>(&mut self, record: &R) -> Result<()> {
        let layout = self.cache.layout::<R>()?;
        let row = layout
            .iter()
            .map(|field| self.encode_field(field, record))
            .collect::<Result<Vec<_>>>()?;
        self.write(&row)
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|err| Error::Write(Box::new(err)))
    }

    /// Get a reference to the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Get a mutable reference to the underlying writer
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Get the underlying writer without flushing it
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, row: &[String]) -> Result<()> {
        self.writer
            .write_row(row)
            .map_err(|err| Error::Write(Box::new(err)))
    }

    fn encode_field<R>(&self, field: &FieldDescriptor<R>, record: &R) -> Result<String> {
        let meta = field.meta();
        let value = field.field(record);

        let claimed = match &self.hook {
            Some(hook) => hook(meta, value),
            None => Ok(None),
        };

        claimed
            .and_then(|claimed| match claimed {
                Some(text) => Ok(text),
                None => field.codec().encode(&self.context, value, meta.format()),
            })
            .map_err(|source| Error::Encode {
                field: meta.qualified_name(),
                source,
            })
    }
}

impl<W> fmt::Debug for Encoder<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("context", &self.context)
            .field("hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

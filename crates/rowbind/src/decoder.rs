//! Row to record decoding

use crate::cache::DescriptorCache;
use crate::config::{CodecConfig, CodecContext};
use crate::descriptor::{FieldDescriptor, FieldMeta};
use crate::error::{ConversionError, Error, Result};
use crate::hook::DecodeHook;
use crate::row::RowReader;
use crate::schema::Record;
use chrono::FixedOffset;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// Fills records from the rows of a [`RowReader`]
///
/// A decoder is driven from one thread at a time; independent decoders over
/// independent readers share nothing but their descriptor cache.
pub struct Decoder<Rd> {
    reader: Rd,
    context: CodecContext,
    hook: Option<DecodeHook>,
    cache: Arc<DescriptorCache>,
    row: u64,
}

impl<Rd: RowReader> Decoder<Rd> {
    /// Create a decoder reading temporal columns as UTC
    pub fn new(reader: Rd) -> Self {
        Self {
            reader,
            context: CodecContext::default(),
            hook: None,
            cache: DescriptorCache::global(),
            row: 0,
        }
    }

    /// Interpret temporal columns in `zone`
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
        F: Fn(&FieldMeta, &mut dyn Any, &str) -> std::result::Result<bool, ConversionError>
            + Send
            + Sync
            + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Rows successfully read from the reader so far
    pub fn row(&self) -> u64 {
        self.row
    }

    /// Conversion context in use
    pub fn context(&self) -> &CodecContext {
        &self.context
    }

    /// Get a reference to the underlying reader
    pub fn get_ref(&self) -> &Rd {
        &self.reader
    }

    /// Get a mutable reference to the underlying reader
    pub fn get_mut(&mut self) -> &mut Rd {
        &mut self.reader
    }

    /// Get the underlying reader
    pub fn into_inner(self) -> Rd {
        self.reader
    }

    /// Read the next row into `record`
    ///
    /// Fields are written in declaration order. When a field fails the fields
    /// before it keep their new values and the rest are left untouched.
    ///
    /// The row counter advances only when the reader returns a row. End of
    /// input and reader failures leave it unchanged; a row whose fields fail
    /// to convert is still counted.
    pub fn decode_next<R: Record>(&mut self, record: &mut R) -> Result<()> {
        let layout = self.cache.layout::<R>()?;
        let row = self.next_row()?;

        for field in layout.iter() {
            self.decode_field(field, record, &row)?;
        }

        trace!(
            record = layout.record_name(),
            row = self.row,
            "decoded row"
        );
        Ok(())
    }

    /// Consume one row without decoding it, e.g. a header line
    pub fn skip_row(&mut self) -> Result<Vec<String>> {
        self.next_row()
    }

    /// Iterate over the remaining rows as fresh records
    ///
    /// Rows that fail to convert are yielded as errors and iteration goes on;
    /// reader and layout failures are yielded once and end the iteration.
    pub fn records<R: Record + Default>(&mut self) -> Records<'_, Rd, R> {
        Records {
            decoder: self,
            done: false,
            _record: PhantomData,
        }
    }

    fn next_row(&mut self) -> Result<Vec<String>> {
        let row = self
            .reader
            .read_row()
            .map_err(|err| Error::Read(Box::new(err)))?
            .ok_or(Error::EndOfInput)?;
        self.row += 1;
        Ok(row)
    }

    fn decode_field<R>(
        &self,
        field: &FieldDescriptor<R>,
        record: &mut R,
        row: &[String],
    ) -> Result<()> {
        let raw = field.cell(row);
        let meta = field.meta();
        let slot = field.field_mut(record);

        let handled = match &self.hook {
            Some(hook) => hook(meta, &mut *slot, raw),
            None => Ok(false),
        };

        handled
            .and_then(|handled| {
                if handled {
                    Ok(())
                } else {
                    field.codec().decode(&self.context, slot, raw, meta.format())
                }
            })
            .map_err(|source| Error::Decode {
                field: meta.qualified_name(),
                row: self.row,
                source,
            })
    }
}

impl<Rd> fmt::Debug for Decoder<Rd> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("context", &self.context)
            .field("hook", &self.hook.is_some())
            .field("row", &self.row)
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`Decoder::records`]
pub struct Records<'a, Rd, R> {
    decoder: &'a mut Decoder<Rd>,
    done: bool,
    _record: PhantomData<fn() -> R>,
}

impl<Rd: RowReader, R: Record + Default> Iterator for Records<'_, Rd, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut record = R::default();
        match self.decoder.decode_next(&mut record) {
            Ok(()) => Some(Ok(record)),
            Err(Error::EndOfInput) => {
                self.done = true;
                None
            }
            Err(err @ Error::Decode { .. }) => Some(Err(err)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

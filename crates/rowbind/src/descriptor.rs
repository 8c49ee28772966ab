//! Field descriptors
//!
//! A [`FieldDescriptor`] binds one record field to a column: where the field
//! lives inside the record, which column it maps to, and the codec that
//! converts between the two. The ordered descriptors of a record type form
//! its [`RecordLayout`].

use crate::codec::{Category, Codec};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased access to one field of a record
pub trait FieldSlot<R>: Send + Sync {
    /// Borrow the field
    fn get<'a>(&self, record: &'a R) -> &'a dyn Any;

    /// Borrow the field mutably
    fn get_mut<'a>(&self, record: &'a mut R) -> &'a mut dyn Any;
}

/// Field stored directly in `R`
pub(crate) struct DirectSlot<R, T> {
    pub(crate) get: fn(&R) -> &T,
    pub(crate) get_mut: fn(&mut R) -> &mut T,
}

impl<R: 'static, T: Any> FieldSlot<R> for DirectSlot<R, T> {
    fn get<'a>(&self, record: &'a R) -> &'a dyn Any {
        (self.get)(record)
    }

    fn get_mut<'a>(&self, record: &'a mut R) -> &'a mut dyn Any {
        (self.get_mut)(record)
    }
}

/// Field of an embedded record `S` stored in `R`
pub(crate) struct NestedSlot<R, S> {
    pub(crate) get: fn(&R) -> &S,
    pub(crate) get_mut: fn(&mut R) -> &mut S,
    pub(crate) inner: Arc<dyn FieldSlot<S>>,
}

impl<R: 'static, S: 'static> FieldSlot<R> for NestedSlot<R, S> {
    fn get<'a>(&self, record: &'a R) -> &'a dyn Any {
        self.inner.get((self.get)(record))
    }

    fn get_mut<'a>(&self, record: &'a mut R) -> &'a mut dyn Any {
        self.inner.get_mut((self.get_mut)(record))
    }
}

/// Binding metadata of one field, independent of the record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    pub(crate) path: Vec<&'static str>,
    pub(crate) column_name: String,
    pub(crate) column_index: Option<usize>,
    pub(crate) format: String,
    pub(crate) type_name: &'static str,
    pub(crate) category: Category,
    pub(crate) optional: bool,
}

impl FieldMeta {
    /// Field access steps from the record root, embedded records included
    pub fn path(&self) -> &[&'static str] {
        &self.path
    }

    /// Name of the field itself
    pub fn field_name(&self) -> &'static str {
        self.path.last().copied().unwrap_or_default()
    }

    /// Dotted path used in diagnostics, e.g. `audit.created`
    pub fn qualified_name(&self) -> String {
        self.path.join(".")
    }

    /// Declared column name
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Zero-based column position, `None` when the annotation had no usable index
    pub fn column_index(&self) -> Option<usize> {
        self.column_index
    }

    /// Format string, empty for non-temporal fields
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Declared field type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Value category of the field
    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether the field is an `Option<T>`
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Column binding plus resolved codec for one field of `R`
pub struct FieldDescriptor<R> {
    meta: FieldMeta,
    codec: Codec,
    slot: Arc<dyn FieldSlot<R>>,
}

impl<R> FieldDescriptor<R> {
    pub(crate) fn new(meta: FieldMeta, codec: Codec, slot: Arc<dyn FieldSlot<R>>) -> Self {
        Self { meta, codec, slot }
    }

    /// Binding metadata
    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    /// Resolved codec
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Borrow this field of `record`
    pub fn field<'a>(&self, record: &'a R) -> &'a dyn Any {
        self.slot.get(record)
    }

    /// Borrow this field of `record` mutably
    pub fn field_mut<'a>(&self, record: &'a mut R) -> &'a mut dyn Any {
        self.slot.get_mut(record)
    }

    /// Pick this field's cell from a row; missing cells read as empty
    pub fn cell<'r>(&self, row: &'r [String]) -> &'r str {
        self.meta
            .column_index
            .and_then(|index| row.get(index))
            .map_or("", String::as_str)
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("meta", &self.meta)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/// Ordered field descriptors of a record type
pub struct RecordLayout<R> {
    record: &'static str,
    fields: Vec<FieldDescriptor<R>>,
}

impl<R> RecordLayout<R> {
    pub(crate) fn new(record: &'static str, fields: Vec<FieldDescriptor<R>>) -> Self {
        Self { record, fields }
    }

    /// Record type name
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    /// Descriptors in declaration order
    pub fn fields(&self) -> &[FieldDescriptor<R>] {
        &self.fields
    }

    /// Iterate over descriptors in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor<R>> {
        self.fields.iter()
    }

    /// Number of bound fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field is bound
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Binding metadata of every field, in order
    pub fn metas(&self) -> Vec<FieldMeta> {
        self.fields.iter().map(|field| field.meta.clone()).collect()
    }

    /// Declared column names, in descriptor order
    pub fn column_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| field.meta.column_name.clone())
            .collect()
    }
}

impl<'a, R> IntoIterator for &'a RecordLayout<R> {
    type Item = &'a FieldDescriptor<R>;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<R> fmt::Debug for RecordLayout<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLayout")
            .field("record", &self.record)
            .field("fields", &self.fields)
            .finish()
    }
}

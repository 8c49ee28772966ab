//! Record metadata attachment
//!
//! A record type lists its fields once, in declaration order, through
//! [`Record::describe`]. Each field carries its column annotation and a pair of
//! accessors; embedded records are spliced in with [`SchemaBuilder::flatten`].
//! The derive macro generates exactly these calls:
//!
//! ```
//! use rowbind::{Record, SchemaBuilder};
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     scratch: Vec<u8>,
//! }
//!
//! impl Record for User {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .field("id", "0,id", |user| &user.id, |user| &mut user.id)
//!             .field("name", "1,name", |user| &user.name, |user| &mut user.name);
//!     }
//! }
//! ```

use crate::descriptor::{DirectSlot, FieldSlot, NestedSlot};
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

/// A structured type whose fields map to row columns
pub trait Record: Sized + 'static {
    /// Register every column-bound field of `Self`
    fn describe(schema: &mut SchemaBuilder<Self>);
}

/// Field declaration before tag parsing and codec resolution
pub(crate) struct DeclaredField<R> {
    pub(crate) path: Vec<&'static str>,
    pub(crate) tag: String,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) slot: Arc<dyn FieldSlot<R>>,
}

/// Collects the field declarations of a record type
pub struct SchemaBuilder<R> {
    fields: Vec<DeclaredField<R>>,
}

impl<R: 'static> SchemaBuilder<R> {
    pub(crate) fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare a field with its column annotation
    ///
    /// `tag` follows `"<index>,<name>[,<format>]"`; an empty tag or `"-"`
    /// leaves the field out of the row.
    pub fn field<T: Any>(
        &mut self,
        name: &'static str,
        tag: &str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        self.fields.push(DeclaredField {
            path: vec![name],
            tag: tag.to_string(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            slot: Arc::new(DirectSlot { get, get_mut }),
        });
        self
    }

    /// Splice the fields of an embedded record into this one
    pub fn flatten<S: Record>(
        &mut self,
        name: &'static str,
        get: fn(&R) -> &S,
        get_mut: fn(&mut R) -> &mut S,
    ) -> &mut Self {
        let mut inner = SchemaBuilder::<S>::new();
        S::describe(&mut inner);

        for field in inner.fields {
            let mut path = Vec::with_capacity(field.path.len() + 1);
            path.push(name);
            path.extend(field.path);

            self.fields.push(DeclaredField {
                path,
                tag: field.tag,
                type_id: field.type_id,
                type_name: field.type_name,
                slot: Arc::new(NestedSlot {
                    get,
                    get_mut,
                    inner: field.slot,
                }),
            });
        }
        self
    }

    /// Number of declared fields, bound or not
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if nothing was declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_fields(self) -> Vec<DeclaredField<R>> {
        self.fields
    }
}

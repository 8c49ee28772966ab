//! Descriptor cache
//!
//! Layouts are derived once per record type and shared afterwards. The cache
//! owns the [`CodecRegistry`] used for derivation, so a layout always reflects
//! the codecs of the cache it lives in. [`DescriptorCache::global`] is the
//! process-wide instance: created on first use and never torn down.

use crate::codec::CodecRegistry;
use crate::descriptor::{FieldDescriptor, FieldMeta, RecordLayout};
use crate::error::{Error, Result};
use crate::schema::{Record, SchemaBuilder};
use crate::tag::FieldTag;
use crate::temporal::is_valid_format;
use dashmap::DashMap;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, trace, warn};

static GLOBAL: LazyLock<Arc<DescriptorCache>> =
    LazyLock::new(|| Arc::new(DescriptorCache::new()));

type CachedLayout = Arc<dyn Any + Send + Sync>;

/// Memoized record layouts keyed by record type
#[derive(Debug)]
pub struct DescriptorCache {
    registry: CodecRegistry,
    layouts: DashMap<TypeId, CachedLayout>,
}

impl DescriptorCache {
    /// Create a cache using the built-in codecs
    pub fn new() -> Self {
        Self::with_registry(CodecRegistry::new())
    }

    /// Create a cache using a custom codec registry
    pub fn with_registry(registry: CodecRegistry) -> Self {
        Self {
            registry,
            layouts: DashMap::new(),
        }
    }

    /// Process-wide cache shared by decoders and encoders by default
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Codecs used for derivation
    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Get the layout of `R`, deriving and storing it on first use
    ///
    /// Concurrent first use may derive twice; the first stored layout is
    /// returned to every caller. Failed derivations are not stored.
    pub fn layout<R: Record>(&self) -> Result<Arc<RecordLayout<R>>> {
        if let Some(layout) = self.lookup::<R>() {
            return Ok(layout);
        }

        let derived = Arc::new(derive_layout::<R>(&self.registry)?);
        let stored = Arc::clone(
            self.layouts
                .entry(TypeId::of::<R>())
                .or_insert_with(|| Arc::clone(&derived) as CachedLayout)
                .value(),
        );

        Ok(stored.downcast::<RecordLayout<R>>().unwrap_or(derived))
    }

    /// Get the layout of `R` only if it was already derived
    pub fn cached<R: Record>(&self) -> Option<Arc<RecordLayout<R>>> {
        self.lookup::<R>()
    }

    /// Number of record types cached
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Check if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    fn lookup<R: Record>(&self) -> Option<Arc<RecordLayout<R>>> {
        let entry = self
            .layouts
            .get(&TypeId::of::<R>())
            .map(|entry| Arc::clone(entry.value()))?;
        entry.downcast::<RecordLayout<R>>().ok()
    }
}

impl Default for DescriptorCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the layout of `R` from its declared fields
///
/// Any field without a codec, or a temporal field without a usable format,
/// fails the whole record type.
pub fn derive_layout<R: Record>(registry: &CodecRegistry) -> Result<RecordLayout<R>> {
    let record = type_name::<R>();
    let mut schema = SchemaBuilder::<R>::new();
    R::describe(&mut schema);

    let declared = schema.into_fields();
    let mut fields = Vec::with_capacity(declared.len());
    let mut columns: HashMap<usize, String> = HashMap::new();

    for field in declared {
        let qualified = field.path.join(".");
        let Some(tag) = FieldTag::parse(&field.tag) else {
            trace!(record, field = %qualified, "field has no column binding, skipping");
            continue;
        };

        let codec = registry
            .resolve(field.type_id)
            .ok_or_else(|| Error::UnsupportedType {
                record,
                field: qualified.clone(),
                type_name: field.type_name,
            })?;

        let (column_index, column_name, format) = tag.into_parts();

        if codec.category().requires_format() {
            if format.is_empty() {
                return Err(Error::MissingFormat {
                    record,
                    field: qualified,
                });
            }
            if !is_valid_format(&format) {
                return Err(Error::InvalidFormat {
                    record,
                    field: qualified,
                    format,
                });
            }
        }

        match column_index {
            Some(index) => {
                if let Some(previous) = columns.insert(index, qualified.clone()) {
                    warn!(
                        record,
                        column = index,
                        "fields '{previous}' and '{qualified}' share a column"
                    );
                }
            }
            None => warn!(record, field = %qualified, "field has no usable column index"),
        }

        let meta = FieldMeta {
            path: field.path,
            column_name,
            column_index,
            format,
            type_name: field.type_name,
            category: codec.category(),
            optional: codec.is_optional(),
        };
        fields.push(FieldDescriptor::new(meta, codec, field.slot));
    }

    debug!(record, fields = fields.len(), "derived record layout");
    Ok(RecordLayout::new(record, fields))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::Category;
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;

    #[derive(Debug, Default)]
    struct Audit {
        created: Option<DateTime<Utc>>,
        note: String,
    }

    impl Record for Audit {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("created", "2,created,%Y-%m-%d", |a| &a.created, |a| &mut a.created)
                .field("note", "", |a| &a.note, |a| &mut a.note);
        }
    }

    #[derive(Debug, Default)]
    struct Item {
        id: u32,
        label: String,
        audit: Audit,
    }

    impl Record for Item {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("id", "0,id", |i| &i.id, |i| &mut i.id)
                .field("label", "x,label", |i| &i.label, |i| &mut i.label)
                .flatten("audit", |i| &i.audit, |i| &mut i.audit);
        }
    }

    #[derive(Debug, Default)]
    struct WithMap {
        id: u32,
        extra: BTreeMap<String, String>,
    }

    impl Record for WithMap {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("id", "0,id", |r| &r.id, |r| &mut r.id)
                .field("extra", "1,extra", |r| &r.extra, |r| &mut r.extra);
        }
    }

    #[derive(Debug, Default)]
    struct NoFormat {
        at: DateTime<Utc>,
    }

    impl Record for NoFormat {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.field("at", "0,at", |r| &r.at, |r| &mut r.at);
        }
    }

    #[test]
    fn test_derive_flattens_and_skips() {
        let layout = derive_layout::<Item>(&CodecRegistry::new()).unwrap();
        let metas = layout.metas();

        assert_eq!(metas.len(), 3);
        assert_eq!(metas[0].path(), ["id"]);
        assert_eq!(metas[0].column_index(), Some(0));
        assert_eq!(metas[0].category(), Category::UnsignedInteger);

        assert_eq!(metas[1].column_index(), None);
        assert_eq!(metas[1].column_name(), "label");

        assert_eq!(metas[2].path(), ["audit", "created"]);
        assert_eq!(metas[2].field_name(), "created");
        assert_eq!(metas[2].qualified_name(), "audit.created");
        assert_eq!(metas[2].format(), "%Y-%m-%d");
        assert!(metas[2].is_optional());
        assert_eq!(metas[2].category(), Category::Temporal);
    }

    #[test]
    fn test_unsupported_type_fails_derivation() {
        let cache = DescriptorCache::new();
        let err = cache.layout::<WithMap>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedType { ref field, .. } if field == "extra"
        ));
        assert!(cache.is_empty());
        assert!(cache.cached::<WithMap>().is_none());
    }

    #[test]
    fn test_temporal_requires_format() {
        let err = derive_layout::<NoFormat>(&CodecRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::MissingFormat { .. }));
    }

    #[test]
    fn test_layout_is_memoized() {
        let cache = DescriptorCache::new();
        let first = cache.layout::<Item>().unwrap();
        let second = cache.layout::<Item>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.metas(), second.metas());
        assert_eq!(cache.len(), 1);

        let rederived = derive_layout::<Item>(cache.registry()).unwrap();
        assert_eq!(rederived.metas(), first.metas());
    }

    #[test]
    fn test_custom_registry_controls_support() {
        let cache = DescriptorCache::with_registry(CodecRegistry::empty());
        assert!(matches!(
            cache.layout::<Item>(),
            Err(Error::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_concurrent_first_use() {
        let cache = Arc::new(DescriptorCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.layout::<Item>().unwrap())
            })
            .collect();

        let layouts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cache.cached::<Item>().unwrap();
        for layout in &layouts {
            assert!(Arc::ptr_eq(layout, &stored));
        }
    }
}

//! Column annotation parsing
//!
//! A field's column binding is written as `"<index>,<name>[,<format>]"`:
//!
//! ```
//! use rowbind::FieldTag;
//!
//! let tag = FieldTag::parse("8,created,%Y-%m-%dT%H:%M:%S").expect("bound field");
//! assert_eq!(tag.column_index(), Some(8));
//! assert_eq!(tag.column_name(), "created");
//! assert_eq!(tag.format(), "%Y-%m-%dT%H:%M:%S");
//! ```

/// Annotation marking a field as not part of the row
pub const SKIP_TAG: &str = "-";

/// Parsed column annotation of a single field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldTag {
    column_index: Option<usize>,
    column_name: String,
    format: String,
}

impl FieldTag {
    /// Create a tag directly
    pub fn new(
        column_index: Option<usize>,
        column_name: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            column_index,
            column_name: column_name.into(),
            format: format.into(),
        }
    }

    /// Parse an annotation string
    ///
    /// Returns `None` for an empty annotation or [`SKIP_TAG`]. An index that is
    /// not a non-negative integer leaves the field unbound instead of failing.
    /// The format is everything after the second comma, so it may contain commas.
    pub fn parse(tag: &str) -> Option<Self> {
        if tag.is_empty() || tag == SKIP_TAG {
            return None;
        }

        let mut parts = tag.splitn(3, ',');
        let column_index = parts.next().and_then(|index| index.parse::<usize>().ok());
        let column_name = parts.next().unwrap_or_default();
        let format = parts.next().unwrap_or_default();

        Some(Self::new(column_index, column_name, format))
    }

    /// Zero-based column position, `None` when unbound
    pub fn column_index(&self) -> Option<usize> {
        self.column_index
    }

    /// Declared column name
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Format string for temporal fields, empty otherwise
    pub fn format(&self) -> &str {
        &self.format
    }

    pub(crate) fn into_parts(self) -> (Option<usize>, String, String) {
        (self.column_index, self.column_name, self.format)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_and_name() {
        let tag = FieldTag::parse("0,str").unwrap();
        assert_eq!(tag.column_index(), Some(0));
        assert_eq!(tag.column_name(), "str");
        assert_eq!(tag.format(), "");
    }

    #[test]
    fn test_parse_format_keeps_commas() {
        let tag = FieldTag::parse("3,when,%d %b, %Y").unwrap();
        assert_eq!(tag.column_index(), Some(3));
        assert_eq!(tag.column_name(), "when");
        assert_eq!(tag.format(), "%d %b, %Y");
    }

    #[test]
    fn test_malformed_index_is_unbound() {
        assert_eq!(FieldTag::parse("x,name").unwrap().column_index(), None);
        assert_eq!(FieldTag::parse("-1,name").unwrap().column_index(), None);
        assert_eq!(FieldTag::parse(",name").unwrap().column_index(), None);
    }

    #[test]
    fn test_missing_name() {
        let tag = FieldTag::parse("4").unwrap();
        assert_eq!(tag.column_index(), Some(4));
        assert_eq!(tag.column_name(), "");
    }

    #[test]
    fn test_skipped_tags() {
        assert!(FieldTag::parse("").is_none());
        assert!(FieldTag::parse(SKIP_TAG).is_none());
    }
}

//! Temporal column codecs
//!
//! Temporal fields carry a strftime format (`%Y-%m-%dT%H:%M:%S`). When the
//! format has no offset specifier the text is read as local time in the
//! codec's zone; when it has one, the offset in the text wins. Formats with no
//! time of day produce midnight.

use crate::codec::{Category, CodecRegistry, ColumnValue};
use crate::config::CodecContext;
use crate::error::ConversionError;
use chrono::format::{Item, ParseErrorKind, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt::{Display, Write};

pub(crate) fn register_builtin(registry: &mut CodecRegistry) {
    registry
        .register::<DateTime<Utc>>()
        .register::<DateTime<FixedOffset>>()
        .register::<NaiveDateTime>()
        .register::<NaiveDate>();
}

/// Check that chrono understands every specifier in `format`
pub fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

fn invalid_time(raw: &str, format: &str, err: &chrono::ParseError) -> ConversionError {
    ConversionError::InvalidTime {
        raw: raw.to_string(),
        format: format.to_string(),
        reason: err.to_string(),
    }
}

fn parse_naive(raw: &str, format: &str) -> Result<NaiveDateTime, ConversionError> {
    match NaiveDateTime::parse_from_str(raw, format) {
        Ok(value) => Ok(value),
        Err(err) if err.kind() == ParseErrorKind::NotEnough => NaiveDate::parse_from_str(raw, format)
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|_| invalid_time(raw, format, &err)),
        Err(err) => Err(invalid_time(raw, format, &err)),
    }
}

/// Parse `raw` as a point in time, falling back to the context zone
fn parse_in_zone(
    raw: &str,
    format: &str,
    context: &CodecContext,
) -> Result<DateTime<FixedOffset>, ConversionError> {
    match DateTime::parse_from_str(raw, format) {
        Ok(value) => return Ok(value),
        Err(err) if err.kind() != ParseErrorKind::NotEnough => {
            return Err(invalid_time(raw, format, &err));
        }
        Err(_) => {}
    }

    let zone = context.zone();
    let local = parse_naive(raw, format)?;
    zone.from_local_datetime(&local)
        .single()
        .ok_or_else(|| ConversionError::NonexistentLocalTime {
            raw: raw.to_string(),
            zone: zone.to_string(),
        })
}

/// Render without panicking on formats chrono rejects
fn render(value: impl Display, format: &str) -> Result<String, ConversionError> {
    let mut out = String::new();
    write!(out, "{value}").map_err(|_| ConversionError::TimeFormat {
        format: format.to_string(),
    })?;
    Ok(out)
}

impl ColumnValue for DateTime<Utc> {
    const CATEGORY: Category = Category::Temporal;

    fn decode_column(
        raw: &str,
        format: &str,
        context: &CodecContext,
    ) -> Result<Self, ConversionError> {
        parse_in_zone(raw, format, context).map(|value| value.with_timezone(&Utc))
    }

    fn encode_column(
        &self,
        format: &str,
        context: &CodecContext,
    ) -> Result<String, ConversionError> {
        render(self.with_timezone(&context.zone()).format(format), format)
    }
}

impl ColumnValue for DateTime<FixedOffset> {
    const CATEGORY: Category = Category::Temporal;

    fn decode_column(
        raw: &str,
        format: &str,
        context: &CodecContext,
    ) -> Result<Self, ConversionError> {
        parse_in_zone(raw, format, context)
    }

    fn encode_column(
        &self,
        format: &str,
        context: &CodecContext,
    ) -> Result<String, ConversionError> {
        render(self.with_timezone(&context.zone()).format(format), format)
    }
}

impl ColumnValue for NaiveDateTime {
    const CATEGORY: Category = Category::Temporal;

    fn decode_column(
        raw: &str,
        format: &str,
        _context: &CodecContext,
    ) -> Result<Self, ConversionError> {
        parse_naive(raw, format)
    }

    fn encode_column(
        &self,
        format: &str,
        _context: &CodecContext,
    ) -> Result<String, ConversionError> {
        render(self.format(format), format)
    }
}

impl ColumnValue for NaiveDate {
    const CATEGORY: Category = Category::Temporal;

    fn decode_column(
        raw: &str,
        format: &str,
        _context: &CodecContext,
    ) -> Result<Self, ConversionError> {
        Self::parse_from_str(raw, format).map_err(|err| invalid_time(raw, format, &err))
    }

    fn encode_column(
        &self,
        format: &str,
        _context: &CodecContext,
    ) -> Result<String, ConversionError> {
        render(self.format(format), format)
    }
}

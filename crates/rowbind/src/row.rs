//! Row readers and writers
//!
//! Decoders pull rows from a [`RowReader`] and encoders push rows into a
//! [`RowWriter`]. Both traits are implemented for `&mut T`, so a caller can
//! keep ownership of the underlying stream. [`DelimitedReader`] and
//! [`DelimitedWriter`] handle delimited text through the `csv` crate;
//! `VecDeque<Vec<String>>` and `Vec<Vec<String>>` serve as in-memory sources
//! and sinks.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::io::{Read, Write};
use thiserror::Error;

/// Default cell delimiter
pub const DEFAULT_DELIMITER: u8 = b',';

/// Source of rows
pub trait RowReader {
    /// Failure reading a row
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the next row, `None` once the input is exhausted
    fn read_row(&mut self) -> Result<Option<Vec<String>>, Self::Error>;
}

/// Sink for rows
pub trait RowWriter {
    /// Failure writing a row
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write one row; may be buffered until [`RowWriter::flush`]
    fn write_row(&mut self, row: &[String]) -> Result<(), Self::Error>;

    /// Flush buffered rows
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: RowReader + ?Sized> RowReader for &mut T {
    type Error = T::Error;

    fn read_row(&mut self) -> Result<Option<Vec<String>>, Self::Error> {
        (**self).read_row()
    }
}

impl<T: RowWriter + ?Sized> RowWriter for &mut T {
    type Error = T::Error;

    fn write_row(&mut self, row: &[String]) -> Result<(), Self::Error> {
        (**self).write_row(row)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

impl RowReader for VecDeque<Vec<String>> {
    type Error = Infallible;

    fn read_row(&mut self) -> Result<Option<Vec<String>>, Self::Error> {
        Ok(self.pop_front())
    }
}

impl RowWriter for Vec<Vec<String>> {
    type Error = Infallible;

    fn write_row(&mut self, row: &[String]) -> Result<(), Self::Error> {
        self.push(row.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Delimited text errors
#[derive(Debug, Error)]
pub enum RowError {
    /// Malformed delimited text, invalid UTF-8 or a failure of the stream under it
    #[error("Delimited text error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error on the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delimited text row reader
///
/// Rows may have any number of cells and there is no header handling; use
/// [`crate::Decoder::skip_row`] for a header line. Empty lines are skipped.
pub struct DelimitedReader<R> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
}

impl<R: Read> DelimitedReader<R> {
    /// Create a comma-delimited reader
    pub fn new(reader: R) -> Self {
        Self::with_delimiter(reader, DEFAULT_DELIMITER)
    }

    /// Create a reader splitting cells on `delimiter`
    pub fn with_delimiter(reader: R, delimiter: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);
        Self {
            reader,
            record: csv::StringRecord::new(),
        }
    }

    /// Get the inner reader
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<'a> DelimitedReader<&'a [u8]> {
    /// Create a reader over in-memory text
    #[must_use]
    pub fn from_text(content: &'a str) -> Self {
        Self::new(content.as_bytes())
    }
}

impl DelimitedReader<std::fs::File> {
    /// Create a reader from a file path
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, RowError> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> RowReader for DelimitedReader<R> {
    type Error = RowError;

    fn read_row(&mut self) -> Result<Option<Vec<String>>, Self::Error> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        Ok(Some(self.record.iter().map(str::to_string).collect()))
    }
}

/// Delimited text row writer
///
/// Cells holding the delimiter, a double quote or a line break are quoted.
pub struct DelimitedWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> DelimitedWriter<W> {
    /// Create a comma-delimited writer
    pub fn new(writer: W) -> Self {
        Self::with_delimiter(writer, DEFAULT_DELIMITER)
    }

    /// Create a writer joining cells with `delimiter`
    pub fn with_delimiter(writer: W, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_writer(writer);
        Self { writer }
    }

    /// Flush and get the inner writer
    pub fn into_inner(self) -> Result<W, RowError> {
        self.writer
            .into_inner()
            .map_err(|err| RowError::Io(err.into_error()))
    }
}

impl DelimitedWriter<std::fs::File> {
    /// Create a writer that truncates or creates a file
    pub fn create<P: AsRef<std::path::Path>>(path: P) -> Result<Self, RowError> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> RowWriter for DelimitedWriter<W> {
    type Error = RowError;

    fn write_row(&mut self, row: &[String]) -> Result<(), Self::Error> {
        self.writer.write_record(row)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.writer.flush()?;
        Ok(())
    }
}

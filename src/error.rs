use std::io;
use std::result;

use thiserror::Error as ThisError;

use crate::reader::Position;

/// A type alias for `Result<T, tinycsv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading or writing CSV data.
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error from the underlying reader or writer, propagated
    /// unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The input ended while the parser was inside a quoted field.
    ///
    /// This surfaces truncated input instead of silently closing the field.
    /// No partial record is returned.
    #[error(
        "CSV parse error: record {} (byte {}, line {}): \
         unterminated quoted field",
        pos.record(), pos.byte(), pos.line()
    )]
    UnterminatedQuote {
        /// The position at which the input ended.
        pos: Position,
    },

    /// A field contained invalid UTF-8.
    #[error(
        "CSV parse error: record {} (byte {}, line {}): {err}",
        pos.record(), pos.byte(), pos.line()
    )]
    Utf8 {
        /// The position of the record in which the error occurred.
        pos: Position,
        /// The underlying UTF-8 validation error.
        err: Utf8Error,
    },

    /// A record that cannot be written, e.g. a record with zero fields or a
    /// field that requires quotes while quoting is disabled.
    #[error("CSV write error: {0}")]
    Write(String),
}

/// A UTF-8 validation error for a single field.
///
/// The error includes the index of the offending field within its record and
/// the offset into that field up to which valid UTF-8 was verified.
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("invalid UTF-8 in field {field} near byte index {valid_up_to}")]
pub struct Utf8Error {
    field: usize,
    valid_up_to: usize,
}

impl Utf8Error {
    pub(crate) fn new(field: usize, valid_up_to: usize) -> Utf8Error {
        Utf8Error { field, valid_up_to }
    }

    /// The index of the field in which UTF-8 validation failed.
    pub fn field(&self) -> usize {
        self.field
    }

    /// The offset into the field up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}

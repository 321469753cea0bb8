//! Error and Result types.

use crate::twkb::GeometryType;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The input ended at the given byte offset while more data was expected.
    Truncated(usize),
    /// Geometry type nibble outside `1..=7`.
    UnsupportedGeometryType(u8),
    Malformed(String),
    UnexpectedGeometryType {
        expected: GeometryType,
        found: GeometryType,
    },
    Write(String),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Truncated(offset) => {
                write!(f, "unexpected end of TWKB input at offset {}", offset)
            }
            Error::UnsupportedGeometryType(code) => {
                write!(f, "unsupported TWKB geometry type {}", code)
            }
            Error::Malformed(msg) => write!(f, "malformed TWKB input: {}", msg),
            Error::UnexpectedGeometryType { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            Error::Write(msg) => write!(f, "error while writing: {}", msg),
            Error::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Write(format!("{:?}", e))
    }
}

//! Reading of PDF files.
//!
//! A PDF document is a graph of typed values: null, booleans, numbers,
//! strings, names, dictionaries, arrays, and streams. This crate exposes
//! that graph through [`Value`], a view whose accessors return zero values
//! on kind mismatch so that deep traversals need no per-step error
//! handling, and builds structured text extraction on top of it.
//!
//! [`Reader`] parses the cross-reference data once at open time and resolves
//! indirect objects lazily. [`Reader::text`] interprets each page's content
//! streams through a small PostScript-style evaluator, tracks the PDF text
//! state machine, decodes glyphs through font encodings and ToUnicode
//! character maps, and merges the positioned runs into [`Text`]: an ordered
//! sequence of [`Part`]s annotated with font size and weight, with paragraph
//! and line breaks inferred from glyph placement.
//!
//! Encrypted files using the standard security handler are supported for
//! revisions 2, 3, 4 (RC4 and AES-128) and 6 (AES-256); an incorrect
//! password surfaces as [`Error::InvalidPassword`] so callers can retry.

use std::fmt;
use std::io;

mod crypt;
mod encoding;
mod filters;
mod font;
mod matrix;
mod model;
mod page;
mod parser;
mod ps;
mod reader;
mod state;
mod text;
mod tokenizer;
mod value;

pub use model::{Dict, ObjPtr, Object, XrefEntry};
pub use reader::Reader;
pub use text::{Part, Text};
pub use value::{Value, ValueKind};

/// Errors reported while opening or reading a PDF file.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// Structurally invalid PDF data.
    Malformed(String),
    /// Valid but unsupported PDF feature (encryption scheme, filter).
    Unsupported(String),
    /// The password does not open this encrypted file; retry with another.
    InvalidPassword,
    /// Content interpretation failed for one page.
    Page {
        number: usize,
        detail: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "{}", err),
            Error::Malformed(msg) => write!(f, "malformed PDF: {}", msg),
            Error::Unsupported(msg) => write!(f, "unsupported PDF: {}", msg),
            Error::InvalidPassword => write!(f, "encrypted PDF: invalid password"),
            Error::Page { number, detail } => {
                write!(f, "failed to read text of page {}: {}", number, detail)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

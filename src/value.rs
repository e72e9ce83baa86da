use std::fmt;

use crate::encoding;
use crate::filters;
use crate::model::{ObjPtr, Object};
use crate::reader::Reader;
use crate::Error;

/// The kind of data underlying a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Real,
    String,
    Name,
    Dict,
    Array,
    Stream,
}

/// A single PDF value: an integer, dictionary, array, and so on.
///
/// Accessors return a view of the data as the requested type, and a zero
/// result when there is no appropriate view: `name()` on a non-name is `""`,
/// `key()` on a non-dictionary is null. This makes deep traversals cheap to
/// write at the cost of silently absorbing mistakes. Indirect references
/// are resolved on access through the owning [`Reader`].
#[derive(Debug, Clone)]
pub struct Value<'r> {
    r: Option<&'r Reader>,
    ptr: ObjPtr,
    data: Object,
}

impl<'r> Value<'r> {
    pub(crate) fn new(r: &'r Reader, ptr: ObjPtr, data: Object) -> Value<'r> {
        Value {
            r: Some(r),
            ptr,
            data,
        }
    }

    /// A value with no reader backing it, used for content-stream operands
    /// where indirect references cannot occur.
    pub(crate) fn bare(data: Object) -> Value<'r> {
        Value {
            r: None,
            ptr: ObjPtr::default(),
            data,
        }
    }

    pub(crate) fn null() -> Value<'r> {
        Value::bare(Object::Null)
    }

    pub(crate) fn ptr(&self) -> ObjPtr {
        self.ptr
    }

    pub(crate) fn obj(&self) -> &Object {
        &self.data
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, Object::Null)
    }

    pub fn kind(&self) -> ValueKind {
        match self.data {
            Object::Boolean(_) => ValueKind::Bool,
            Object::Integer(_) => ValueKind::Integer,
            Object::Real(_) => ValueKind::Real,
            Object::String(_) => ValueKind::String,
            Object::Name(_) => ValueKind::Name,
            Object::Dictionary(_) => ValueKind::Dict,
            Object::Array(_) => ValueKind::Array,
            Object::Stream { .. } => ValueKind::Stream,
            _ => ValueKind::Null,
        }
    }

    pub fn bool(&self) -> bool {
        matches!(self.data, Object::Boolean(true))
    }

    pub fn int64(&self) -> i64 {
        self.data.as_i64().unwrap_or(0)
    }

    pub fn float64(&self) -> f64 {
        self.data.as_f64().unwrap_or(0.0)
    }

    /// The raw bytes of a string value.
    pub fn raw_string(&self) -> &[u8] {
        self.data.as_string().unwrap_or(&[])
    }

    /// The string value interpreted as a PDF text string: UTF-16BE when it
    /// carries the byte order mark, PDFDocEncoding when clean, raw bytes
    /// otherwise.
    pub fn text(&self) -> String {
        let raw = self.raw_string();
        if encoding::is_utf16(raw) {
            return encoding::utf16_decode(&raw[2..]);
        }
        if encoding::is_pdf_doc_encoded(raw) {
            return encoding::pdf_doc_decode(raw);
        }
        String::from_utf8_lossy(raw).into_owned()
    }

    /// The name value without its leading slash.
    pub fn name(&self) -> &str {
        self.data.as_name().unwrap_or("")
    }

    /// The value for a dictionary key, with indirect references resolved.
    /// On a stream this reads the header dictionary.
    pub fn key(&self, key: &str) -> Value<'r> {
        let dict = match self.data.as_dict() {
            Some(dict) => dict,
            None => return Value::null(),
        };
        match dict.get(key) {
            Some(child) => self.resolve_child(child),
            None => Value::null(),
        }
    }

    /// The sorted keys of a dictionary or stream header.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.data.as_dict() {
            Some(dict) => dict.keys().cloned().collect(),
            None => Vec::new(),
        };
        keys.sort();
        keys
    }

    pub fn index(&self, i: usize) -> Value<'r> {
        match self.data.as_array().and_then(|items| items.get(i)) {
            Some(child) => self.resolve_child(child),
            None => Value::null(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.as_array().map_or(0, <[Object]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve_child(&self, child: &Object) -> Value<'r> {
        match (child, self.r) {
            (Object::Reference(_), Some(r)) => r.resolve(self.ptr, child.clone()),
            (Object::Reference(_), None) => Value::null(),
            _ => Value {
                r: self.r,
                ptr: self.ptr,
                data: child.clone(),
            },
        }
    }

    /// The decoded bytes of a stream value: the body is sliced at the
    /// recorded offset, decrypted if the file is encrypted, then passed
    /// through the `/Filter` chain with its `/DecodeParms`.
    pub fn stream_data(&self) -> Result<Vec<u8>, Error> {
        let (ptr, offset) = match self.data {
            Object::Stream { ptr, offset, .. } => (ptr, offset),
            _ => return Err(Error::Malformed("stream not present".to_string())),
        };
        let r = self
            .r
            .ok_or_else(|| Error::Malformed("stream without reader".to_string()))?;

        let length = self.key("Length").int64();
        if length < 0 {
            return Err(Error::Malformed(format!("stream Length {}", length)));
        }
        let end = offset.saturating_add(length as usize).min(r.data().len());
        let mut raw = r.data()[offset.min(end)..end].to_vec();

        if let Some(decrypter) = r.decrypter() {
            raw = decrypter.decrypt(ptr, &raw)?;
        }

        let filter = self.key("Filter");
        let parms = self.key("DecodeParms");
        match filter.kind() {
            ValueKind::Null => {}
            ValueKind::Name => raw = filters::apply(filter.name(), raw, &parms)?,
            ValueKind::Array => {
                for i in 0..filter.len() {
                    raw = filters::apply(filter.index(i).name(), raw, &parms.index(i))?;
                }
            }
            _ => {
                return Err(Error::Unsupported(format!("filter {}", filter)));
            }
        }
        Ok(raw)
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dict;

    #[test]
    fn zero_values_on_mismatch() {
        let v = Value::bare(Object::Name("Helvetica".to_string()));
        assert_eq!(v.kind(), ValueKind::Name);
        assert_eq!(v.name(), "Helvetica");
        assert_eq!(v.int64(), 0);
        assert_eq!(v.raw_string(), b"");
        assert!(v.key("Anything").is_null());
        assert_eq!(v.index(0).kind(), ValueKind::Null);
    }

    #[test]
    fn integer_widens_to_float() {
        assert_eq!(Value::bare(Object::Integer(3)).float64(), 3.0);
        assert_eq!(Value::bare(Object::Real(1.5)).float64(), 1.5);
    }

    #[test]
    fn key_without_reader_returns_plain_children() {
        let mut dict = Dict::new();
        dict.insert("N".to_string(), Object::Integer(4));
        let v = Value::bare(Object::Dictionary(dict));
        assert_eq!(v.key("N").int64(), 4);
        assert!(v.key("Missing").is_null());
    }

    #[test]
    fn text_decoding_paths() {
        let bom = Value::bare(Object::String(vec![0xFE, 0xFF, 0x00, 0x41]));
        assert_eq!(bom.text(), "A");

        let doc = Value::bare(Object::String(b"plain".to_vec()));
        assert_eq!(doc.text(), "plain");

        // 0xA0 is the euro sign in PDFDocEncoding.
        let euro = Value::bare(Object::String(vec![0xA0]));
        assert_eq!(euro.text(), "\u{20AC}");
    }
}

use std::collections::HashMap;
use std::fmt;

use crate::encoding;

pub type Dict = HashMap<String, Object>;

/// A reference to an indirect object, the `12 0 R` form.
///
/// The zero pointer (`id == 0`) never refers to a real object; it doubles as
/// the "no active object" marker while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjPtr {
    pub id: u32,
    pub gen: u16,
}

impl ObjPtr {
    pub(crate) fn is_zero(&self) -> bool {
        self.id == 0 && self.gen == 0
    }
}

/// A single PDF syntax object.
///
/// Strings are raw bytes; interpreting them as text is a separate decoding
/// step (see [`crate::Value::text`]). A `Stream` records only its header and
/// the byte offset of its body; the body is read and defiltered on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    Name(String),
    Array(Vec<Object>),
    Dictionary(Dict),
    Stream {
        dict: Dict,
        ptr: ObjPtr,
        offset: usize,
    },
    Reference(ObjPtr),
    Definition {
        ptr: ObjPtr,
        obj: Box<Object>,
    },
}

impl Object {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Real(v) => Some(*v),
            Object::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(v) => Some(v),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => write!(f, "null"),
            Object::Boolean(v) => write!(f, "{}", v),
            Object::Integer(v) => write!(f, "{}", v),
            Object::Real(v) => write!(f, "{}", v),
            Object::String(v) => {
                if encoding::is_utf16(v) {
                    write!(f, "{:?}", encoding::utf16_decode(&v[2..]))
                } else if encoding::is_pdf_doc_encoded(v) {
                    write!(f, "{:?}", encoding::pdf_doc_decode(v))
                } else {
                    write!(f, "{:?}", String::from_utf8_lossy(v))
                }
            }
            Object::Name(v) => write!(f, "/{}", v),
            Object::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Object::Dictionary(dict) => write_dict(f, dict),
            Object::Stream { dict, offset, .. } => {
                write_dict(f, dict)?;
                write!(f, "@{}", offset)
            }
            Object::Reference(ptr) => write!(f, "{} {} R", ptr.id, ptr.gen),
            Object::Definition { ptr, obj } => {
                write!(f, "{{{} {} obj}}{}", ptr.id, ptr.gen, obj)
            }
        }
    }
}

fn write_dict(f: &mut fmt::Formatter<'_>, dict: &Dict) -> fmt::Result {
    let mut keys: Vec<&String> = dict.keys().collect();
    keys.sort();
    write!(f, "<<")?;
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "/{} {}", key, dict[*key])?;
    }
    write!(f, ">>")
}

/// One cross-reference table entry.
///
/// Free entries keep the default `ptr`; in-file entries carry a byte offset;
/// compressed entries name the object stream and the index within it.
#[derive(Debug, Clone, Copy, Default)]
pub struct XrefEntry {
    pub ptr: ObjPtr,
    pub in_stream: bool,
    pub stream: ObjPtr,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_none_on_mismatch() {
        assert_eq!(Object::Null.as_i64(), None);
        assert_eq!(Object::Integer(7).as_i64(), Some(7));
        assert_eq!(Object::Integer(7).as_f64(), Some(7.0));
        assert_eq!(Object::Real(2.5).as_f64(), Some(2.5));
        assert_eq!(Object::Boolean(true).as_name(), None);
    }

    #[test]
    fn display_renders_pdf_syntax() {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::Name("Page".to_string()));
        dict.insert("Count".to_string(), Object::Integer(3));
        let rendered = format!("{}", Object::Dictionary(dict));
        assert_eq!(rendered, "<</Count 3 /Type /Page>>");

        let arr = Object::Array(vec![
            Object::Integer(1),
            Object::Reference(ObjPtr { id: 4, gen: 0 }),
        ]);
        assert_eq!(format!("{}", arr), "[1 4 0 R]");
    }
}

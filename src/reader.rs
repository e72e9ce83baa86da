use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::debug;
use memchr::memmem;

use crate::crypt::Decrypter;
use crate::model::{Dict, ObjPtr, Object, XrefEntry};
use crate::parser::ObjectParser;
use crate::tokenizer::Token;
use crate::value::{Value, ValueKind};
use crate::Error;

/// A single PDF file open for reading.
///
/// The trailer and cross-reference data are parsed once at construction and
/// stay immutable for the reader's lifetime; everything else resolves
/// lazily, so the same object may be parsed more than once on repeated
/// traversals.
#[derive(Debug)]
pub struct Reader {
    data: Vec<u8>,
    xref: Vec<XrefEntry>,
    trailer: Dict,
    trailer_ptr: ObjPtr,
    decrypter: Option<Decrypter>,
}

impl Reader {
    /// Opens the PDF file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Reader, Error> {
        Reader::new(fs::read(path)?)
    }

    /// Opens an unencrypted (or empty-password) PDF held in memory.
    pub fn new(data: Vec<u8>) -> Result<Reader, Error> {
        Reader::new_encrypted(data, "")
    }

    /// Opens a PDF held in memory, trying `password` if the file is
    /// encrypted and the empty password does not open it. A wrong password
    /// is reported as [`Error::InvalidPassword`].
    pub fn new_encrypted(data: Vec<u8>, password: &str) -> Result<Reader, Error> {
        if data.len() < 10
            || !data.starts_with(b"%PDF-1.")
            || !data[7].is_ascii_digit()
            || data[7] > b'7'
            || (data[8] != b'\r' && data[8] != b'\n')
        {
            return Err(Error::Malformed("invalid header".to_string()));
        }

        let tail_start = data.len().saturating_sub(100);
        let mut tail = &data[tail_start..];
        while let Some((&last, rest)) = tail.split_last() {
            if matches!(last, b'\r' | b'\n' | b'\t' | b' ') {
                tail = rest;
            } else {
                break;
            }
        }
        if !tail.ends_with(b"%%EOF") {
            return Err(Error::Malformed("missing %%EOF".to_string()));
        }
        let i = find_last_line(tail, b"startxref")
            .ok_or_else(|| Error::Malformed("missing final startxref".to_string()))?;

        let mut parser = ObjectParser::new(&data);
        parser.seek(tail_start + i);
        match parser.next_token()? {
            Some(tok) if tok.is_keyword("startxref") => {}
            _ => return Err(Error::Malformed("missing startxref".to_string())),
        }
        let startxref = match parser.next_token()? {
            Some(Token::Integer(v)) if v >= 0 => v as usize,
            _ => {
                return Err(Error::Malformed(
                    "startxref not followed by integer".to_string(),
                ));
            }
        };
        drop(parser);

        let mut r = Reader {
            data,
            xref: Vec::new(),
            trailer: Dict::new(),
            trailer_ptr: ObjPtr::default(),
            decrypter: None,
        };
        let (xref, trailer_ptr, trailer) = r.read_xref(startxref)?;
        r.xref = xref;
        r.trailer = trailer;
        r.trailer_ptr = trailer_ptr;

        if !r.trailer.contains_key("Encrypt") {
            return Ok(r);
        }
        match r.init_encrypt("") {
            Ok(()) => Ok(r),
            Err(Error::InvalidPassword) if !password.is_empty() => {
                r.init_encrypt(password)?;
                Ok(r)
            }
            Err(err) => Err(err),
        }
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn decrypter(&self) -> Option<&Decrypter> {
        self.decrypter.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn xref(&self) -> &[XrefEntry] {
        &self.xref
    }

    /// The trailer dictionary as a [`Value`], the root of the object graph.
    pub fn trailer(&self) -> Value<'_> {
        Value::new(
            self,
            self.trailer_ptr,
            Object::Dictionary(self.trailer.clone()),
        )
    }

    /// Resolves `obj` to a concrete value; an indirect reference is loaded
    /// through the xref, and failures of any sort collapse to null so that
    /// traversal chains stay check-free.
    pub(crate) fn resolve(&self, parent: ObjPtr, obj: Object) -> Value<'_> {
        let mut parent = parent;
        let mut obj = obj;
        for _ in 0..8 {
            match obj {
                Object::Reference(ptr) => match self.load(ptr) {
                    Some(inner) => {
                        parent = ptr;
                        obj = inner;
                    }
                    None => return Value::null(),
                },
                Object::Definition { .. } => return Value::null(),
                other => return Value::new(self, parent, other),
            }
        }
        debug!("reference chain too deep at {} {} R", parent.id, parent.gen);
        Value::null()
    }

    fn load(&self, ptr: ObjPtr) -> Option<Object> {
        let entry = *self.xref.get(ptr.id as usize)?;
        if entry.ptr != ptr || (!entry.in_stream && entry.offset == 0) {
            return None;
        }
        if entry.in_stream {
            return self.load_from_object_stream(ptr, entry.stream);
        }

        let mut parser = ObjectParser::with_decrypter(&self.data, self.decrypter.as_ref());
        parser.seek(entry.offset as usize);
        match parser.read_object() {
            Ok(Object::Definition { ptr: got, obj }) if got == ptr => Some(*obj),
            Ok(other) => {
                debug!("loading {} {} R: found {}", ptr.id, ptr.gen, other);
                None
            }
            Err(err) => {
                debug!("loading {} {} R: {}", ptr.id, ptr.gen, err);
                None
            }
        }
    }

    /// Finds `ptr` inside a `/Type /ObjStm` stream, chasing `Extends` links
    /// with a visited set so reference cycles cannot loop forever.
    fn load_from_object_stream(&self, ptr: ObjPtr, stream_ptr: ObjPtr) -> Option<Object> {
        let mut visited: HashSet<ObjPtr> = HashSet::new();
        let mut strm = self.resolve(ObjPtr::default(), Object::Reference(stream_ptr));
        loop {
            if strm.kind() != ValueKind::Stream {
                debug!("object stream for {} {} R is not a stream", ptr.id, ptr.gen);
                return None;
            }
            if !visited.insert(strm.ptr()) {
                debug!("object stream Extends cycle at {} {} R", ptr.id, ptr.gen);
                return None;
            }
            if strm.key("Type").name() != "ObjStm" {
                debug!("stream for {} {} R is not an ObjStm", ptr.id, ptr.gen);
                return None;
            }
            let n = strm.key("N").int64();
            let first = strm.key("First").int64();
            if first <= 0 || n < 0 {
                return None;
            }
            let data = match strm.stream_data() {
                Ok(data) => data,
                Err(err) => {
                    debug!("decoding object stream: {}", err);
                    return None;
                }
            };

            let mut parser = ObjectParser::new(&data);
            let mut found = None;
            for _ in 0..n {
                let id = match parser.next_token().ok()? {
                    Some(Token::Integer(v)) => v,
                    _ => break,
                };
                let off = match parser.next_token().ok()? {
                    Some(Token::Integer(v)) => v,
                    _ => break,
                };
                if id as u32 == ptr.id {
                    found = Some(first + off);
                    break;
                }
            }
            if let Some(pos) = found {
                if pos < 0 || pos as usize >= data.len() {
                    return None;
                }
                parser.seek(pos as usize);
                return match parser.read_object() {
                    Ok(obj) => Some(obj),
                    Err(err) => {
                        debug!("reading {} {} R from object stream: {}", ptr.id, ptr.gen, err);
                        None
                    }
                };
            }

            let ext = strm.key("Extends");
            if ext.kind() != ValueKind::Stream {
                debug!("cannot find {} {} R in object stream chain", ptr.id, ptr.gen);
                return None;
            }
            strm = ext;
        }
    }

    fn read_xref(&self, offset: usize) -> Result<(Vec<XrefEntry>, ObjPtr, Dict), Error> {
        let mut parser = ObjectParser::new(&self.data);
        parser.seek(offset);
        let tok = parser
            .next_token()?
            .ok_or_else(|| Error::Malformed("cross-reference table not found".to_string()))?;
        if tok.is_keyword("xref") {
            return self.read_xref_table(parser);
        }
        if matches!(tok, Token::Integer(_)) {
            parser.unread_token(tok);
            return self.read_xref_stream(parser);
        }
        Err(Error::Malformed(format!(
            "cross-reference table not found: {:?}",
            tok
        )))
    }

    fn read_xref_table(
        &self,
        mut parser: ObjectParser<'_>,
    ) -> Result<(Vec<XrefEntry>, ObjPtr, Dict), Error> {
        let mut table = Vec::new();
        read_xref_table_data(&mut parser, &mut table)?;
        let trailer = match parser.read_object()? {
            Object::Dictionary(dict) => dict,
            _ => {
                return Err(Error::Malformed(
                    "xref table not followed by trailer dictionary".to_string(),
                ));
            }
        };

        let mut prev = trailer.get("Prev").cloned();
        while let Some(prev_obj) = prev {
            let off = prev_obj
                .as_i64()
                .ok_or_else(|| Error::Malformed(format!("xref Prev is not integer: {}", prev_obj)))?;
            let mut parser = ObjectParser::new(&self.data);
            parser.seek(off.max(0) as usize);
            match parser.next_token()? {
                Some(tok) if tok.is_keyword("xref") => {}
                _ => {
                    return Err(Error::Malformed(
                        "xref Prev does not point to xref".to_string(),
                    ));
                }
            }
            read_xref_table_data(&mut parser, &mut table)?;
            let prev_trailer = match parser.read_object()? {
                Object::Dictionary(dict) => dict,
                _ => {
                    return Err(Error::Malformed(
                        "xref Prev table not followed by trailer dictionary".to_string(),
                    ));
                }
            };
            prev = prev_trailer.get("Prev").cloned();
        }

        let size = trailer
            .get("Size")
            .and_then(Object::as_i64)
            .ok_or_else(|| Error::Malformed("trailer missing /Size entry".to_string()))?;
        if (size as usize) < table.len() {
            table.truncate(size as usize);
        }
        Ok((table, ObjPtr::default(), trailer))
    }

    fn read_xref_stream(
        &self,
        mut parser: ObjectParser<'_>,
    ) -> Result<(Vec<XrefEntry>, ObjPtr, Dict), Error> {
        let (strm_ptr, strm) = match parser.read_object()? {
            Object::Definition { ptr, obj } => (ptr, *obj),
            other => {
                return Err(Error::Malformed(format!(
                    "cross-reference table not found: {}",
                    other
                )));
            }
        };
        let hdr = match &strm {
            Object::Stream { dict, .. } => dict.clone(),
            other => {
                return Err(Error::Malformed(format!(
                    "cross-reference table not found: {}",
                    other
                )));
            }
        };
        if hdr.get("Type").and_then(Object::as_name) != Some("XRef") {
            return Err(Error::Malformed(
                "xref stream does not have type XRef".to_string(),
            ));
        }
        let size = hdr
            .get("Size")
            .and_then(Object::as_i64)
            .ok_or_else(|| Error::Malformed("xref stream missing Size".to_string()))?;

        let mut table = vec![XrefEntry::default(); size.max(0) as usize];
        self.read_xref_stream_data(&strm, &mut table)?;

        let mut prev = hdr.get("Prev").cloned();
        while let Some(prev_obj) = prev {
            let off = prev_obj
                .as_i64()
                .ok_or_else(|| Error::Malformed(format!("xref Prev is not integer: {}", prev_obj)))?;
            let mut parser = ObjectParser::new(&self.data);
            parser.seek(off.max(0) as usize);
            let Object::Definition { obj, .. } = parser.read_object()? else {
                return Err(Error::Malformed("xref prev stream not found".to_string()));
            };
            let prev_strm = *obj;
            let prev_hdr = match &prev_strm {
                Object::Stream { dict, .. } => dict.clone(),
                _ => {
                    return Err(Error::Malformed("xref prev stream not found".to_string()));
                }
            };
            if prev_hdr.get("Type").and_then(Object::as_name) != Some("XRef") {
                return Err(Error::Malformed(
                    "xref prev stream does not have type XRef".to_string(),
                ));
            }
            let psize = prev_hdr.get("Size").and_then(Object::as_i64).unwrap_or(0);
            if psize > size {
                return Err(Error::Malformed(
                    "xref prev stream larger than last stream".to_string(),
                ));
            }
            prev = prev_hdr.get("Prev").cloned();
            self.read_xref_stream_data(&prev_strm, &mut table)?;
        }

        Ok((table, strm_ptr, hdr))
    }

    /// Decodes one xref stream's rows into `table`, never overwriting an
    /// entry already populated by a newer section.
    fn read_xref_stream_data(
        &self,
        strm: &Object,
        table: &mut Vec<XrefEntry>,
    ) -> Result<(), Error> {
        let v = Value::new(self, ObjPtr::default(), strm.clone());

        let index = v.key("Index");
        let mut ranges = Vec::new();
        if index.is_null() {
            ranges.push((0i64, v.key("Size").int64()));
        } else {
            if index.len() % 2 != 0 {
                return Err(Error::Malformed(format!("invalid Index array {}", index)));
            }
            for i in (0..index.len()).step_by(2) {
                ranges.push((index.index(i).int64(), index.index(i + 1).int64()));
            }
        }

        let ww = v.key("W");
        if ww.kind() != ValueKind::Array || ww.len() < 3 {
            return Err(Error::Malformed(format!("invalid W array {}", ww)));
        }
        let mut w = Vec::with_capacity(ww.len());
        for i in 0..ww.len() {
            let width = ww.index(i).int64();
            if width < 0 || width > 8 {
                return Err(Error::Malformed(format!("invalid W array {}", ww)));
            }
            w.push(width as usize);
        }
        let wtotal: usize = w.iter().sum();
        if wtotal == 0 {
            return Err(Error::Malformed(format!("invalid W array {}", ww)));
        }

        let data = v.stream_data()?;
        let mut rows = data.chunks_exact(wtotal);
        for (start, n) in ranges {
            for i in 0..n {
                let row = rows
                    .next()
                    .ok_or_else(|| Error::Malformed("truncated xref stream".to_string()))?;
                let v1 = if w[0] == 0 { 1 } else { decode_int(&row[..w[0]]) };
                let v2 = decode_int(&row[w[0]..w[0] + w[1]]);
                let v3 = decode_int(&row[w[0] + w[1]..w[0] + w[1] + w[2]]);

                let x = (start + i).max(0) as usize;
                if table.len() <= x {
                    table.resize(x + 1, XrefEntry::default());
                }
                if table[x].ptr != ObjPtr::default() {
                    continue;
                }
                match v1 {
                    0 => {
                        table[x] = XrefEntry {
                            ptr: ObjPtr { id: 0, gen: 65535 },
                            ..XrefEntry::default()
                        };
                    }
                    1 => {
                        table[x] = XrefEntry {
                            ptr: ObjPtr {
                                id: x as u32,
                                gen: v3 as u16,
                            },
                            offset: v2,
                            ..XrefEntry::default()
                        };
                    }
                    2 => {
                        table[x] = XrefEntry {
                            ptr: ObjPtr {
                                id: x as u32,
                                gen: 0,
                            },
                            in_stream: true,
                            stream: ObjPtr {
                                id: v2 as u32,
                                gen: 0,
                            },
                            offset: v3,
                        };
                    }
                    other => {
                        debug!("invalid xref stream row type {}", other);
                    }
                }
            }
        }
        Ok(())
    }

    fn init_encrypt(&mut self, password: &str) -> Result<(), Error> {
        // See ISO 32000-2 §7.6.
        let encrypt = self.trailer.get("Encrypt").cloned().unwrap_or(Object::Null);
        let encrypt = self.resolve(ObjPtr::default(), encrypt);
        let encrypt_dict = match encrypt.obj().as_dict() {
            Some(dict) => dict.clone(),
            None => {
                return Err(Error::Malformed("Encrypt is not a dictionary".to_string()));
            }
        };
        if encrypt_dict.get("Filter").and_then(Object::as_name) != Some("Standard") {
            return Err(Error::Unsupported(format!(
                "encryption filter {}",
                encrypt_dict.get("Filter").unwrap_or(&Object::Null)
            )));
        }

        let id = self
            .trailer
            .get("ID")
            .and_then(Object::as_array)
            .and_then(|ids| ids.first())
            .and_then(Object::as_string)
            .ok_or_else(|| Error::Malformed("missing ID in trailer".to_string()))?;

        self.decrypter = Some(Decrypter::new(password, &encrypt_dict, id)?);
        Ok(())
    }
}

fn read_xref_table_data(
    parser: &mut ObjectParser<'_>,
    table: &mut Vec<XrefEntry>,
) -> Result<(), Error> {
    loop {
        let tok = parser
            .next_token()?
            .ok_or_else(|| Error::Malformed("malformed xref table".to_string()))?;
        if tok.is_keyword("trailer") {
            break;
        }
        let start = match tok {
            Token::Integer(v) => v,
            _ => return Err(Error::Malformed("malformed xref table".to_string())),
        };
        let n = match parser.next_token()? {
            Some(Token::Integer(v)) => v,
            _ => return Err(Error::Malformed("malformed xref table".to_string())),
        };
        for i in 0..n {
            let off = match parser.next_token()? {
                Some(Token::Integer(v)) => v,
                _ => return Err(Error::Malformed("malformed xref table".to_string())),
            };
            let gen = match parser.next_token()? {
                Some(Token::Integer(v)) => v,
                _ => return Err(Error::Malformed("malformed xref table".to_string())),
            };
            let alloc = match parser.next_token()? {
                Some(Token::Keyword(kw)) if kw == "f" || kw == "n" => kw,
                _ => return Err(Error::Malformed("malformed xref table".to_string())),
            };
            let x = (start + i).max(0) as usize;
            if table.len() <= x {
                table.resize(x + 1, XrefEntry::default());
            }
            // First write wins; a newer section has already claimed the slot
            // when the offset is nonzero.
            if alloc == "n" && table[x].offset == 0 {
                table[x] = XrefEntry {
                    ptr: ObjPtr {
                        id: x as u32,
                        gen: gen as u16,
                    },
                    offset: off,
                    ..XrefEntry::default()
                };
            }
        }
    }
    Ok(())
}

fn decode_int(bytes: &[u8]) -> i64 {
    let mut x: i64 = 0;
    for &b in bytes {
        x = (x << 8) | i64::from(b);
    }
    x
}

/// Finds the last occurrence of `needle` that sits on its own line.
fn find_last_line(buf: &[u8], needle: &[u8]) -> Option<usize> {
    let mut max = buf.len();
    loop {
        let i = memmem::rfind(&buf[..max], needle)?;
        if i == 0 || i + needle.len() >= buf.len() {
            return None;
        }
        if matches!(buf[i - 1], b'\n' | b'\r') && matches!(buf[i + needle.len()], b'\n' | b'\r') {
            return Some(i);
        }
        max = i;
    }
}

use crate::crypt::Decrypter;
use crate::model::{Dict, ObjPtr, Object};
use crate::tokenizer::{Lexer, Token};
use crate::Error;

/// Reads single objects from a byte slice: scalars, dictionaries, arrays,
/// `id gen R` references, `id gen obj … endobj` definitions, and stream
/// headers. Strings read inside an indirect object definition are decrypted
/// with the enclosing object's pointer as key material.
pub(crate) struct ObjectParser<'a> {
    lexer: Lexer<'a>,
    unread: Vec<Token>,
    /// Recognize `id gen R` / `id gen obj` forms. Off inside content
    /// streams, where bare integers are operands.
    pub(crate) allow_objptr: bool,
    /// Recognize the `stream` keyword after a dictionary.
    pub(crate) allow_stream: bool,
    objptr: ObjPtr,
    decrypter: Option<&'a Decrypter>,
}

impl<'a> ObjectParser<'a> {
    pub(crate) fn new(input: &'a [u8]) -> ObjectParser<'a> {
        ObjectParser {
            lexer: Lexer::new(input),
            unread: Vec::new(),
            allow_objptr: true,
            allow_stream: true,
            objptr: ObjPtr::default(),
            decrypter: None,
        }
    }

    pub(crate) fn with_decrypter(
        input: &'a [u8],
        decrypter: Option<&'a Decrypter>,
    ) -> ObjectParser<'a> {
        let mut parser = ObjectParser::new(input);
        parser.decrypter = decrypter;
        parser
    }

    pub(crate) fn seek(&mut self, pos: usize) {
        self.unread.clear();
        self.lexer.set_position(pos);
    }

    pub(crate) fn next_token(&mut self) -> Result<Option<Token>, Error> {
        if let Some(tok) = self.unread.pop() {
            return Ok(Some(tok));
        }
        self.lexer.next_token()
    }

    pub(crate) fn unread_token(&mut self, tok: Token) {
        self.unread.push(tok);
    }

    pub(crate) fn read_object(&mut self) -> Result<Object, Error> {
        let tok = self
            .next_token()?
            .ok_or_else(|| Error::Malformed("unexpected end of input".to_string()))?;
        self.read_object_from(tok)
    }

    pub(crate) fn read_object_from(&mut self, tok: Token) -> Result<Object, Error> {
        match tok {
            Token::Boolean(v) => Ok(Object::Boolean(v)),
            Token::Real(v) => Ok(Object::Real(v)),
            Token::Name(v) => Ok(Object::Name(v)),
            Token::String(v) => {
                let v = match (self.decrypter, self.objptr.is_zero()) {
                    (Some(decrypter), false) => decrypter.decrypt(self.objptr, &v)?,
                    _ => v,
                };
                Ok(Object::String(v))
            }
            Token::Integer(v) => self.read_number_or_indirect(v),
            Token::Keyword(kw) => match kw.as_str() {
                "null" => Ok(Object::Null),
                "<<" => self.read_dict(),
                "[" => self.read_array(),
                _ => Err(Error::Malformed(format!(
                    "unexpected keyword {:?} parsing object",
                    kw
                ))),
            },
        }
    }

    fn read_number_or_indirect(&mut self, t1: i64) -> Result<Object, Error> {
        if !self.allow_objptr || i64::from(t1 as u32) != t1 {
            return Ok(Object::Integer(t1));
        }
        let tok2 = match self.next_token()? {
            Some(tok2) => tok2,
            None => return Ok(Object::Integer(t1)),
        };
        if let Token::Integer(t2) = &tok2 {
            let t2 = *t2;
            if i64::from(t2 as u16) == t2 {
                let ptr = ObjPtr {
                    id: t1 as u32,
                    gen: t2 as u16,
                };
                match self.next_token()? {
                    Some(tok3) if tok3.is_keyword("R") => return Ok(Object::Reference(ptr)),
                    Some(tok3) if tok3.is_keyword("obj") => return self.read_definition(ptr),
                    Some(tok3) => self.unread_token(tok3),
                    None => {}
                }
            }
        }
        self.unread_token(tok2);
        Ok(Object::Integer(t1))
    }

    fn read_definition(&mut self, ptr: ObjPtr) -> Result<Object, Error> {
        let old = self.objptr;
        self.objptr = ptr;
        let obj = self.read_object()?;
        // After a stream the body follows immediately and endobj is read
        // past the data, so only require it for plain objects.
        if !matches!(obj, Object::Stream { .. }) {
            match self.next_token()? {
                Some(tok) if tok.is_keyword("endobj") => {}
                _ => {
                    return Err(Error::Malformed(
                        "missing endobj after indirect object definition".to_string(),
                    ));
                }
            }
        }
        self.objptr = old;
        Ok(Object::Definition {
            ptr,
            obj: Box::new(obj),
        })
    }

    fn read_array(&mut self) -> Result<Object, Error> {
        let mut items = Vec::new();
        loop {
            let tok = self
                .next_token()?
                .ok_or_else(|| Error::Malformed("input ended with open array".to_string()))?;
            if tok.is_keyword("]") {
                break;
            }
            self.unread_token(tok);
            items.push(self.read_object()?);
        }
        Ok(Object::Array(items))
    }

    fn read_dict(&mut self) -> Result<Object, Error> {
        let mut dict = Dict::new();
        loop {
            let tok = self
                .next_token()?
                .ok_or_else(|| Error::Malformed("input ended with open dict".to_string()))?;
            if tok.is_keyword(">>") {
                break;
            }
            let key = match tok {
                Token::Name(key) => key,
                other => {
                    return Err(Error::Malformed(format!(
                        "non-name key {:?} parsing dictionary",
                        other
                    )));
                }
            };
            dict.insert(key, self.read_object()?);
        }

        if !self.allow_stream {
            return Ok(Object::Dictionary(dict));
        }
        match self.next_token()? {
            Some(tok) if tok.is_keyword("stream") => {}
            Some(tok) => {
                self.unread_token(tok);
                return Ok(Object::Dictionary(dict));
            }
            None => return Ok(Object::Dictionary(dict)),
        }

        if !self.lexer.skip_stream_eol() {
            return Err(Error::Malformed(
                "stream keyword not followed by newline".to_string(),
            ));
        }
        Ok(Object::Stream {
            dict,
            ptr: self.objptr,
            offset: self.lexer.position(),
        })
    }
}

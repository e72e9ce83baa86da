use crate::model::{Dict, Object};
use crate::parser::ObjectParser;
use crate::tokenizer::Token;
use crate::Error;

/// Operand stack for the PostScript evaluator. Popping an empty stack
/// yields null, in keeping with the crate's zero-value traversal style.
#[derive(Debug, Default)]
pub(crate) struct Stack {
    values: Vec<Object>,
}

impl Stack {
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn push(&mut self, v: Object) {
        self.values.push(v);
    }

    pub(crate) fn pop(&mut self) -> Object {
        self.values.pop().unwrap_or(Object::Null)
    }
}

/// Interprets `data` as a basic PostScript program, pushing operand values
/// and calling `handler` for every operator it does not handle itself.
///
/// The reserved operators `dict`, `currentdict`, `begin`, `end`, `def`,
/// `pop`, and `dup` are executed internally, and keywords bound in an open
/// dictionary push their value instead of dispatching. This is nowhere near
/// a full PostScript interpreter; it covers the restricted programs found
/// in supporting formats embedded in PDF files, such as ToUnicode CMaps.
pub(crate) fn interpret<F>(data: &[u8], mut handler: F) -> Result<(), Error>
where
    F: FnMut(&mut Stack, &str) -> Result<(), Error>,
{
    let mut parser = ObjectParser::new(data);
    parser.allow_objptr = false;
    parser.allow_stream = false;

    let mut stack = Stack::default();
    let mut dicts: Vec<Dict> = Vec::new();

    'reading: while let Some(tok) = parser.next_token()? {
        if let Token::Keyword(kw) = &tok {
            match kw.as_str() {
                // Structural keywords fall through to the object reader.
                "null" | "[" | "]" | "<<" | ">>" => {}
                "dict" => {
                    stack.pop();
                    stack.push(Object::Dictionary(Dict::new()));
                    continue;
                }
                "currentdict" => {
                    let dict = dicts
                        .last()
                        .ok_or_else(|| Error::Malformed("no current dictionary".to_string()))?;
                    stack.push(Object::Dictionary(dict.clone()));
                    continue;
                }
                "begin" => {
                    match stack.pop() {
                        Object::Dictionary(dict) => dicts.push(dict),
                        other => {
                            return Err(Error::Malformed(format!(
                                "cannot begin non-dict {}",
                                other
                            )));
                        }
                    }
                    continue;
                }
                "end" => {
                    if dicts.pop().is_none() {
                        return Err(Error::Malformed("mismatched begin/end".to_string()));
                    }
                    continue;
                }
                "def" => {
                    let val = stack.pop();
                    match stack.pop() {
                        Object::Name(key) => {
                            if let Some(dict) = dicts.last_mut() {
                                dict.insert(key, val);
                            } else {
                                return Err(Error::Malformed(
                                    "def without open dict".to_string(),
                                ));
                            }
                        }
                        other => {
                            return Err(Error::Malformed(format!("def of non-name {}", other)));
                        }
                    }
                    continue;
                }
                "pop" => {
                    stack.pop();
                    continue;
                }
                "dup" => {
                    let val = stack.pop();
                    stack.push(val.clone());
                    stack.push(val);
                    continue;
                }
                op => {
                    for dict in dicts.iter().rev() {
                        if let Some(bound) = dict.get(op) {
                            stack.push(bound.clone());
                            continue 'reading;
                        }
                    }
                    handler(&mut stack, op)?;
                    continue;
                }
            }
        }
        parser.unread_token(tok);
        stack.push(parser.read_object()?);
    }
    Ok(())
}

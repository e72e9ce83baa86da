use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::warn;

use crate::font::Font;
use crate::model::{ObjPtr, Object};
use crate::ps;
use crate::reader::Reader;
use crate::state::Graphics;
use crate::text::{Builder, Text};
use crate::value::{Value, ValueKind};
use crate::Error;

impl Reader {
    /// The number of pages in the file.
    pub fn n_pages(&self) -> usize {
        self.trailer()
            .key("Root")
            .key("Pages")
            .key("Count")
            .int64()
            .max(0) as usize
    }

    /// The structured text of the page with the given 1-indexed number.
    /// A page number outside the document yields empty text.
    pub fn page(&self, number: usize) -> Result<Text, Error> {
        match self.find_page(number) {
            Some(page) => page.text().map_err(|err| Error::Page {
                number,
                detail: err.to_string(),
            }),
            None => Ok(Text::default()),
        }
    }

    /// The structured text of every page, in order. A page whose content
    /// cannot be interpreted is logged and yields empty text, so one bad
    /// page does not abort the file.
    pub fn text(&self) -> Result<Vec<Text>, Error> {
        let mut out = Vec::with_capacity(self.n_pages());
        for number in 1..=self.n_pages() {
            match self.page(number) {
                Ok(text) => out.push(text),
                Err(err) => {
                    warn!("{}", err);
                    out.push(Text::default());
                }
            }
        }
        Ok(out)
    }

    /// Walks the page tree to the `number`th leaf (1-indexed).
    fn find_page(&self, number: usize) -> Option<Page<'_>> {
        if number == 0 {
            return None;
        }
        let mut num = (number - 1) as i64;
        let mut page = self.trailer().key("Root").key("Pages");

        'search: while page.key("Type").name() == "Pages" {
            if page.key("Count").int64() < num {
                return None;
            }
            let kids = page.key("Kids");
            for i in 0..kids.len() {
                let kid = kids.index(i);
                match kid.key("Type").name() {
                    "Pages" => {
                        let count = kid.key("Count").int64();
                        if num < count {
                            page = kid;
                            continue 'search;
                        }
                        num -= count;
                    }
                    "Page" => {
                        if num == 0 {
                            return Some(Page { v: kid });
                        }
                        num -= 1;
                    }
                    _ => {}
                }
            }
            // Every kid was scanned without descending.
            return None;
        }
        None
    }
}

/// A single page: a value holding a `/Page` dictionary.
struct Page<'r> {
    v: Value<'r>,
}

impl<'r> Page<'r> {
    /// Looks `key` up on the page, walking up the `Parent` chain until a
    /// non-null value is found. The visited set breaks reference cycles.
    fn find_inherited(&self, key: &str) -> Value<'r> {
        let mut visited: HashSet<ObjPtr> = HashSet::new();
        let mut v = self.v.clone();
        while !v.is_null() {
            let found = v.key(key);
            if !found.is_null() {
                return found;
            }
            if !v.ptr().is_zero() && !visited.insert(v.ptr()) {
                break;
            }
            v = v.key("Parent");
        }
        Value::null()
    }

    fn resources(&self) -> Value<'r> {
        self.find_inherited("Resources")
    }

    fn fonts(&self) -> HashMap<String, Rc<Font>> {
        let font_dict = self.resources().key("Font");
        let mut fonts = HashMap::new();
        for name in font_dict.keys() {
            let font = Rc::new(Font::new(&font_dict.key(&name)));
            fonts.insert(name, font);
        }
        fonts
    }

    /// The page's content streams, decoded and concatenated.
    fn contents(&self) -> Result<Vec<u8>, Error> {
        let v = self.v.key("Contents");
        if v.kind() == ValueKind::Stream {
            return v.stream_data();
        }
        let mut out = Vec::new();
        for i in 0..v.len() {
            let part = v.index(i);
            if part.kind() == ValueKind::Stream {
                out.extend_from_slice(&part.stream_data()?);
                out.push(b'\n');
            }
        }
        Ok(out)
    }

    /// Interprets the content streams, driving the graphics and text state
    /// and collecting positioned glyph runs into a text builder.
    fn text(&self) -> Result<Text, Error> {
        let fonts = self.fonts();
        let content = self.contents()?;

        let mut out = Builder::new();
        let mut g = Graphics::default();

        ps::interpret(&content, |stk, op| {
            let n = stk.len();
            let mut args = vec![Object::Null; n];
            for i in (0..n).rev() {
                args[i] = stk.pop();
            }
            let num = |i: usize| args.get(i).and_then(Object::as_f64).unwrap_or(0.0);

            match op {
                "q" => g.push(),
                "Q" => g.pop(),
                "cm" => g.cm(num(0), num(1), num(2), num(3), num(4), num(5)),

                "Tc" => g.text().tc(num(0)),
                "Tw" => g.text().tw(num(0)),
                "Tz" => g.text().tz(num(0)),
                "TL" => g.text().tl(num(0)),
                "BT" => g.text().bt(),
                "ET" => g.text().et(),
                "Td" => g.text().td(num(0), num(1)),
                "TD" => g.text().td_set_leading(num(0), num(1)),
                "Tm" => g
                    .text()
                    .tm(num(0), num(1), num(2), num(3), num(4), num(5)),
                "T*" => g.text().t_star(),
                "Tf" => {
                    let font = args
                        .first()
                        .and_then(Object::as_name)
                        .and_then(|name| fonts.get(name))
                        .cloned();
                    g.text().tf(font, num(1));
                }

                "\"" => {
                    g.text().tw(num(0));
                    g.text().tc(num(1));
                    g.text().t_star();
                    if let Some(s) = args.get(2).and_then(Object::as_string) {
                        g.tj(&mut out, s);
                    }
                }
                "'" => {
                    g.text().t_star();
                    if let Some(s) = args.first().and_then(Object::as_string) {
                        g.tj(&mut out, s);
                    }
                }
                "Tj" => {
                    if let Some(s) = args.first().and_then(Object::as_string) {
                        g.tj(&mut out, s);
                    }
                }
                "TJ" => {
                    if let Some(items) = args.first().and_then(Object::as_array) {
                        for item in items {
                            match item {
                                Object::String(s) => g.tj(&mut out, s),
                                Object::Integer(_) | Object::Real(_) => {
                                    g.tj_displace(item.as_f64().unwrap_or(0.0));
                                }
                                _ => {}
                            }
                        }
                    }
                }

                _ => {}
            }
            Ok(())
        })?;

        Ok(out.text())
    }
}

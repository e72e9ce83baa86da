use std::collections::HashMap;

use log::{debug, warn};

use crate::encoding::{self, BFChar, BFDest, BFRange, ByteRange, CMap, NO_RUNE};
use crate::model::Object;
use crate::ps;
use crate::value::{Value, ValueKind};
use crate::Error;

/// Per-glyph advance widths in design units: ordered spans with a default
/// outside all of them.
#[derive(Debug, Clone, Default)]
pub(crate) struct Widths {
    pub default: f64,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone)]
pub(crate) struct Span {
    pub first: i64,
    pub last: i64,
    pub width: SpanWidth,
}

#[derive(Debug, Clone)]
pub(crate) enum SpanWidth {
    Fixed(f64),
    Linear(Vec<f64>),
}

impl Widths {
    pub(crate) fn lookup(&self, code: u32) -> f64 {
        let code = i64::from(code);
        for span in &self.spans {
            if code >= span.first && code <= span.last {
                return match &span.width {
                    SpanWidth::Fixed(w) => *w,
                    SpanWidth::Linear(ww) => ww
                        .get((code - span.first) as usize)
                        .copied()
                        .unwrap_or(self.default),
                };
            }
        }
        self.default
    }
}

/// A font taken from a page's resources: its base name and the decoder that
/// turns raw string bytes into text plus summed advance widths.
#[derive(Debug)]
pub(crate) struct Font {
    name: String,
    decoder: Decoder,
}

impl Font {
    pub(crate) fn new(v: &Value<'_>) -> Font {
        Font {
            name: v.key("BaseFont").name().to_string(),
            decoder: decoder_for(v),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn decode(&self, raw: &[u8]) -> (String, f64) {
        self.decoder.decode(raw)
    }
}

#[derive(Debug)]
enum Decoder {
    /// Single-byte table decoding with `/Differences` overrides.
    Table {
        base: &'static [u16; 256],
        diffs: HashMap<u8, char>,
        widths: Widths,
    },
    /// ToUnicode character map decoding.
    CharMap(CMap),
    /// PDFDocEncoding fallback for fonts with no usable encoding.
    PdfDoc(Widths),
}

impl Decoder {
    fn decode(&self, raw: &[u8]) -> (String, f64) {
        match self {
            Decoder::Table {
                base,
                diffs,
                widths,
            } => {
                let mut out = String::with_capacity(raw.len());
                let mut width = 0.0;
                for &b in raw {
                    width += widths.lookup(u32::from(b));
                    if let Some(ch) = diffs.get(&b) {
                        out.push(*ch);
                        continue;
                    }
                    match char::from_u32(u32::from(base[b as usize])) {
                        Some(ch) if base[b as usize] != 0 => out.push(ch),
                        _ => out.push(NO_RUNE),
                    }
                }
                (out, width)
            }
            Decoder::CharMap(cmap) => cmap.decode(raw),
            Decoder::PdfDoc(widths) => {
                let width = raw.iter().map(|&b| widths.lookup(u32::from(b))).sum();
                (encoding::pdf_doc_decode(raw), width)
            }
        }
    }
}

/// Decoder selection, ISO 32000-2 §9.6.5 and §9.10: named base encodings
/// first, then an encoding dictionary with `/Differences`, then the
/// `/ToUnicode` map, and PDFDocEncoding as the last resort.
fn decoder_for(v: &Value<'_>) -> Decoder {
    let widths = widths_for(v);

    let enc = v.key("Encoding");
    match enc.kind() {
        ValueKind::Name => match enc.name() {
            "WinAnsiEncoding" => {
                return Decoder::Table {
                    base: &encoding::WIN_ANSI,
                    diffs: HashMap::new(),
                    widths,
                };
            }
            "MacRomanEncoding" => {
                return Decoder::Table {
                    base: &encoding::MAC_ROMAN,
                    diffs: HashMap::new(),
                    widths,
                };
            }
            _ => {}
        },
        ValueKind::Dict => {
            let diffs = differences(&enc);
            match enc.key("BaseEncoding").name() {
                "WinAnsiEncoding" => {
                    return Decoder::Table {
                        base: &encoding::WIN_ANSI,
                        diffs,
                        widths,
                    };
                }
                "MacRomanEncoding" => {
                    return Decoder::Table {
                        base: &encoding::MAC_ROMAN,
                        diffs,
                        widths,
                    };
                }
                _ => {
                    // No usable base: prefer the ToUnicode map, but keep
                    // the differences over WinAnsi when there is none.
                    let to_unicode = v.key("ToUnicode");
                    if !to_unicode.is_null() {
                        return charmap_decoder(&to_unicode, widths);
                    }
                    if !diffs.is_empty() {
                        return Decoder::Table {
                            base: &encoding::WIN_ANSI,
                            diffs,
                            widths,
                        };
                    }
                    return Decoder::PdfDoc(widths);
                }
            }
        }
        _ => {}
    }

    let to_unicode = v.key("ToUnicode");
    if !to_unicode.is_null() {
        return charmap_decoder(&to_unicode, widths);
    }
    Decoder::PdfDoc(widths)
}

/// `/W` and `/Widths` extraction. Type0 fonts read their first descendant
/// CID font; `/W` alternates `first last w` and `first [w0 w1 …]` shapes.
fn widths_for(v: &Value<'_>) -> Widths {
    match v.key("Subtype").name() {
        "Type0" => widths_for(&v.key("DescendantFonts").index(0)),
        "CIDFontType0" | "CIDFontType2" => {
            let default = v.key("DW").float64();
            let ww = v.key("W");
            let mut spans = Vec::new();
            let mut i = 1;
            while i < ww.len() {
                let first = ww.index(i - 1).int64();
                let next = ww.index(i);
                match next.kind() {
                    ValueKind::Integer | ValueKind::Real => {
                        spans.push(Span {
                            first,
                            last: next.int64(),
                            width: SpanWidth::Fixed(ww.index(i + 1).float64()),
                        });
                        i += 3;
                    }
                    ValueKind::Array => {
                        let linear: Vec<f64> =
                            (0..next.len()).map(|j| next.index(j).float64()).collect();
                        spans.push(Span {
                            first,
                            last: first + linear.len() as i64 - 1,
                            width: SpanWidth::Linear(linear),
                        });
                        i += 2;
                    }
                    _ => {
                        warn!("bad W array: {}", ww);
                        break;
                    }
                }
            }
            Widths { default, spans }
        }
        _ => {
            let default = v.key("FontDescriptor").key("MissingWidth").float64();
            let ww = v.key("Widths");
            let linear: Vec<f64> = (0..ww.len()).map(|i| ww.index(i).float64()).collect();
            let span = Span {
                first: v.key("FirstChar").int64(),
                last: v.key("LastChar").int64(),
                width: SpanWidth::Linear(linear),
            };
            Widths {
                default,
                spans: vec![span],
            }
        }
    }
}

/// `/Differences` arrays alternate a starting code with runs of glyph
/// names; see ISO 32000-2 Table 112.
fn differences(enc: &Value<'_>) -> HashMap<u8, char> {
    let mut out = HashMap::new();
    let diffs = enc.key("Differences");
    let mut code: i64 = -1;
    for i in 0..diffs.len() {
        let e = diffs.index(i);
        match e.kind() {
            ValueKind::Integer => code = e.int64(),
            ValueKind::Name => {
                if !(0..=255).contains(&code) {
                    debug!("differences code {} out of range", code);
                    continue;
                }
                match encoding::glyph_rune(e.name()) {
                    Some(ch) => {
                        out.insert(code as u8, ch);
                    }
                    None => debug!("unknown glyph name /{}", e.name()),
                }
                code += 1;
            }
            _ => debug!("bad differences entry {}", e),
        }
    }
    out
}

fn charmap_decoder(to_unicode: &Value<'_>, widths: Widths) -> Decoder {
    if to_unicode.kind() != ValueKind::Stream {
        return Decoder::PdfDoc(widths);
    }
    let data = match to_unicode.stream_data() {
        Ok(data) => data,
        Err(err) => {
            warn!("reading ToUnicode stream: {}", err);
            return Decoder::PdfDoc(widths);
        }
    };
    match build_cmap(&data, widths.clone()) {
        Ok(cmap) => Decoder::CharMap(cmap),
        Err(err) => {
            warn!("bad ToUnicode stream: {}", err);
            Decoder::PdfDoc(widths)
        }
    }
}

/// Runs the PostScript interpreter over a ToUnicode program, collecting
/// codespace ranges, bfchars, and bfranges from the operand stack.
fn build_cmap(data: &[u8], widths: Widths) -> Result<CMap, Error> {
    let mut cmap = CMap {
        widths,
        ..CMap::default()
    };
    let mut count: i64 = -1;

    ps::interpret(data, |stk, op| {
        match op {
            "findresource" => {
                stk.pop(); // category
                stk.pop(); // key
                stk.push(Object::Dictionary(Default::default()));
            }
            "begincmap" => stk.push(Object::Dictionary(Default::default())),
            "endcmap" => {
                stk.pop();
            }
            "begincodespacerange" | "beginbfchar" | "beginbfrange" => {
                count = stk.pop().as_i64().unwrap_or(-1);
            }
            "endcodespacerange" => {
                if count < 0 {
                    return Err(Error::Malformed("missing begincodespacerange".to_string()));
                }
                for _ in 0..count {
                    let hi = stk.pop();
                    let lo = stk.pop();
                    let (Some(hi), Some(lo)) = (hi.as_string(), lo.as_string()) else {
                        return Err(Error::Malformed("bad codespace range".to_string()));
                    };
                    if lo.is_empty() || lo.len() != hi.len() || lo.len() > 4 {
                        return Err(Error::Malformed(format!(
                            "bad codespace range {:?}..{:?}",
                            lo, hi
                        )));
                    }
                    cmap.space[lo.len() - 1].push(ByteRange {
                        lo: lo.to_vec(),
                        hi: hi.to_vec(),
                    });
                }
                count = -1;
            }
            "endbfchar" => {
                if count < 0 {
                    return Err(Error::Malformed("missing beginbfchar".to_string()));
                }
                for _ in 0..count {
                    let repl = stk.pop();
                    let orig = stk.pop();
                    let (Some(repl), Some(orig)) = (repl.as_string(), orig.as_string()) else {
                        return Err(Error::Malformed("bad bfchar pair".to_string()));
                    };
                    cmap.bfchars.push(BFChar {
                        orig: orig.to_vec(),
                        repl: repl.to_vec(),
                    });
                }
                count = -1;
            }
            "endbfrange" => {
                if count < 0 {
                    return Err(Error::Malformed("missing beginbfrange".to_string()));
                }
                for _ in 0..count {
                    let dst = stk.pop();
                    let hi = stk.pop();
                    let lo = stk.pop();
                    let (Some(hi), Some(lo)) = (hi.as_string(), lo.as_string()) else {
                        return Err(Error::Malformed("bad bfrange bounds".to_string()));
                    };
                    let dst = match dst {
                        Object::String(s) => BFDest::Chars(s),
                        Object::Array(items) => BFDest::Array(
                            items
                                .iter()
                                .filter_map(|item| item.as_string().map(<[u8]>::to_vec))
                                .collect(),
                        ),
                        other => {
                            return Err(Error::Malformed(format!(
                                "bad bfrange destination {}",
                                other
                            )));
                        }
                    };
                    cmap.bfranges.push(BFRange {
                        lo: lo.to_vec(),
                        hi: hi.to_vec(),
                        dst,
                    });
                }
                count = -1;
            }
            "defineresource" => {
                stk.pop(); // category
                let value = stk.pop();
                stk.pop(); // key
                stk.push(value);
            }
            other => debug!("unhandled CMap op {}", other),
        }
        Ok(())
    })?;

    Ok(cmap)
}

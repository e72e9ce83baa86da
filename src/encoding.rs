use log::debug;
use unicode_normalization::UnicodeNormalization;

use crate::font::Widths;

/// Replacement character emitted for unmappable codes.
pub(crate) const NO_RUNE: char = '\u{FFFD}';

/// WinAnsiEncoding (CP-1252), 0 for undefined codes.
pub(crate) const WIN_ANSI: [u16; 256] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0020, 0x0021, 0x0022, 0x0023,
    0x0024, 0x0025, 0x0026, 0x0027, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B,
    0x003C, 0x003D, 0x003E, 0x003F, 0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047,
    0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050, 0x0051, 0x0052, 0x0053,
    0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B,
    0x006C, 0x006D, 0x006E, 0x006F, 0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077,
    0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000, 0x20AC, 0x0000, 0x201A, 0x0192,
    0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x0000, 0x017D, 0x0000,
    0x0000, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A,
    0x0153, 0x0000, 0x017E, 0x0178, 0x00A0, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7,
    0x00A8, 0x00A9, 0x00AA, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x00AF, 0x00B0, 0x00B1, 0x00B2, 0x00B3,
    0x00B4, 0x00B5, 0x00B6, 0x00B7, 0x00B8, 0x00B9, 0x00BA, 0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7, 0x00C8, 0x00C9, 0x00CA, 0x00CB,
    0x00CC, 0x00CD, 0x00CE, 0x00CF, 0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7,
    0x00D8, 0x00D9, 0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00DF, 0x00E0, 0x00E1, 0x00E2, 0x00E3,
    0x00E4, 0x00E5, 0x00E6, 0x00E7, 0x00E8, 0x00E9, 0x00EA, 0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    0x00F0, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7, 0x00F8, 0x00F9, 0x00FA, 0x00FB,
    0x00FC, 0x00FD, 0x00FE, 0x00FF,
];

/// MacRomanEncoding, 0 for undefined codes.
pub(crate) const MAC_ROMAN: [u16; 256] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0020, 0x0021, 0x0022, 0x0023,
    0x0024, 0x0025, 0x0026, 0x0027, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B,
    0x003C, 0x003D, 0x003E, 0x003F, 0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047,
    0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050, 0x0051, 0x0052, 0x0053,
    0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B,
    0x006C, 0x006D, 0x006E, 0x006F, 0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077,
    0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000, 0x00C4, 0x00C5, 0x00C7, 0x00C9,
    0x00D1, 0x00D6, 0x00DC, 0x00E1, 0x00E0, 0x00E2, 0x00E4, 0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8,
    0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3, 0x00F2, 0x00F4, 0x00F6, 0x00F5,
    0x00FA, 0x00F9, 0x00FB, 0x00FC, 0x2020, 0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF,
    0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8, 0x221E, 0x00B1, 0x2264, 0x2265,
    0x00A5, 0x00B5, 0x2202, 0x2211, 0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8,
    0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB, 0x00BB, 0x2026, 0x00A0, 0x00C0,
    0x00C3, 0x00D5, 0x0152, 0x0153, 0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA,
    0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02, 0x2021, 0x00B7, 0x201A, 0x201E,
    0x2030, 0x00C2, 0x00CA, 0x00C1, 0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x00D3, 0x00D4,
    0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC, 0x00AF, 0x02D8, 0x02D9, 0x02DA,
    0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

/// PDFDocEncoding, 0xFFFD for undefined codes.
pub(crate) const PDF_DOC: [u16; 256] = [
    0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0x0009, 0x000A, 0xFFFD,
    0xFFFD, 0x000D, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD, 0xFFFD,
    0x02D8, 0x02C7, 0x02C6, 0x02D9, 0x02DD, 0x02DB, 0x02DA, 0x02DC, 0x0020, 0x0021, 0x0022, 0x0023,
    0x0024, 0x0025, 0x0026, 0x0027, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B,
    0x003C, 0x003D, 0x003E, 0x003F, 0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047,
    0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050, 0x0051, 0x0052, 0x0053,
    0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B,
    0x006C, 0x006D, 0x006E, 0x006F, 0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077,
    0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0xFFFD, 0x2022, 0x2020, 0x2021, 0x2026,
    0x2014, 0x2013, 0x0192, 0x2044, 0x2039, 0x203A, 0x2212, 0x2030, 0x201E, 0x201C, 0x201D, 0x2018,
    0x2019, 0x201A, 0x2122, 0xFB01, 0xFB02, 0x0141, 0x0152, 0x0160, 0x0178, 0x017D, 0x0131, 0x0142,
    0x0153, 0x0161, 0x017E, 0xFFFD, 0x20AC, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7,
    0x00A8, 0x00A9, 0x00AA, 0x00AB, 0x00AC, 0xFFFD, 0x00AE, 0x00AF, 0x00B0, 0x00B1, 0x00B2, 0x00B3,
    0x00B4, 0x00B5, 0x00B6, 0x00B7, 0x00B8, 0x00B9, 0x00BA, 0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7, 0x00C8, 0x00C9, 0x00CA, 0x00CB,
    0x00CC, 0x00CD, 0x00CE, 0x00CF, 0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7,
    0x00D8, 0x00D9, 0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00DF, 0x00E0, 0x00E1, 0x00E2, 0x00E3,
    0x00E4, 0x00E5, 0x00E6, 0x00E7, 0x00E8, 0x00E9, 0x00EA, 0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    0x00F0, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7, 0x00F8, 0x00F9, 0x00FA, 0x00FB,
    0x00FC, 0x00FD, 0x00FE, 0x00FF,
];

pub(crate) fn is_utf16(s: &[u8]) -> bool {
    s.len() >= 2 && s[0] == 0xFE && s[1] == 0xFF && s.len() % 2 == 0
}

pub(crate) fn is_pdf_doc_encoded(s: &[u8]) -> bool {
    if is_utf16(s) {
        return false;
    }
    s.iter().all(|&b| PDF_DOC[b as usize] != 0xFFFD)
}

pub(crate) fn pdf_doc_decode(s: &[u8]) -> String {
    if s
        .iter()
        .all(|&b| b < 0x80 && PDF_DOC[b as usize] == u16::from(b))
    {
        return String::from_utf8_lossy(s).into_owned();
    }
    s.iter()
        .map(|&b| char::from_u32(u32::from(PDF_DOC[b as usize])).unwrap_or(NO_RUNE))
        .collect()
}

/// Decodes big-endian UTF-16 (no BOM expected) and normalizes to NFKC.
pub(crate) fn utf16_decode(s: &[u8]) -> String {
    let units: Vec<u16> = s
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(NO_RUNE))
        .nfkc()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ByteRange {
    pub lo: Vec<u8>,
    pub hi: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BFChar {
    pub orig: Vec<u8>,
    pub repl: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BFDest {
    Chars(Vec<u8>),
    Array(Vec<Vec<u8>>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BFRange {
    pub lo: Vec<u8>,
    pub hi: Vec<u8>,
    pub dst: BFDest,
}

/// A ToUnicode character map: codespace ranges bucketed by code length
/// (1–4 bytes) plus bfchar/bfrange mappings to UTF-16BE strings.
#[derive(Debug, Clone, Default)]
pub(crate) struct CMap {
    pub widths: Widths,
    pub space: [Vec<ByteRange>; 4],
    pub bfchars: Vec<BFChar>,
    pub bfranges: Vec<BFRange>,
}

impl CMap {
    /// Decodes raw font bytes, returning the text and the summed glyph
    /// widths (design units) of every code that matched a codespace range.
    pub(crate) fn decode(&self, raw: &[u8]) -> (String, f64) {
        let mut out = String::new();
        let mut width = 0.0;
        let mut raw = raw;

        'parse: while !raw.is_empty() {
            let mut code: u32 = 0;
            for n in 1..=raw.len().min(4) {
                code = (code << 8) | u32::from(raw[n - 1]);
                let text = &raw[..n];
                for space in &self.space[n - 1] {
                    if space.lo.as_slice() <= text && text <= space.hi.as_slice() {
                        width += self.widths.lookup(code);
                        self.emit(text, n, &mut out);
                        raw = &raw[n..];
                        continue 'parse;
                    }
                }
            }
            debug!("no code space found for byte {:#04x}", raw[0]);
            out.push(NO_RUNE);
            raw = &raw[1..];
        }
        (out, width)
    }

    fn emit(&self, text: &[u8], n: usize, out: &mut String) {
        for bfchar in &self.bfchars {
            if bfchar.orig.len() == n && bfchar.orig == text {
                out.push_str(&utf16_decode(&bfchar.repl));
                return;
            }
        }
        for bfrange in &self.bfranges {
            if bfrange.lo.len() == n
                && bfrange.lo.as_slice() <= text
                && text <= bfrange.hi.as_slice()
            {
                let delta = text[n - 1].wrapping_sub(bfrange.lo[n - 1]);
                match &bfrange.dst {
                    BFDest::Chars(s) if !s.is_empty() => {
                        let mut s = s.clone();
                        if let Some(last) = s.last_mut() {
                            // Offset from the range start lands in the final
                            // byte of the destination.
                            *last = last.wrapping_add(delta);
                        }
                        out.push_str(&utf16_decode(&s));
                    }
                    BFDest::Array(a) => match a.get(delta as usize) {
                        Some(s) => out.push_str(&utf16_decode(s)),
                        None => {
                            debug!("bfrange array too short for offset {}", delta);
                            out.push(NO_RUNE);
                        }
                    },
                    _ => {
                        debug!("empty bfrange destination");
                        out.push(NO_RUNE);
                    }
                }
                return;
            }
        }
        out.push(NO_RUNE);
    }
}

/// Maps an Adobe glyph name to its character, for `/Differences` arrays.
/// Covers the working set of the Adobe Glyph List plus the `uniXXXX` and
/// `uXXXX+` conventions.
pub(crate) fn glyph_rune(name: &str) -> Option<char> {
    if let Some(ch) = agl_rune(name) {
        return Some(ch);
    }
    if name.len() == 1 {
        let b = name.as_bytes()[0];
        if b.is_ascii_graphic() {
            return Some(b as char);
        }
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            if let Ok(cp) = u32::from_str_radix(hex, 16) {
                return char::from_u32(cp);
            }
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Ok(cp) = u32::from_str_radix(hex, 16) {
                return char::from_u32(cp);
            }
        }
    }
    None
}

fn agl_rune(name: &str) -> Option<char> {
    let ch = match name {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "exclamdown" => '\u{00A1}',
        "cent" => '\u{00A2}',
        "sterling" => '\u{00A3}',
        "currency" => '\u{00A4}',
        "yen" => '\u{00A5}',
        "brokenbar" => '\u{00A6}',
        "section" => '\u{00A7}',
        "dieresis" => '\u{00A8}',
        "copyright" => '\u{00A9}',
        "ordfeminine" => '\u{00AA}',
        "guillemotleft" => '\u{00AB}',
        "logicalnot" => '\u{00AC}',
        "registered" => '\u{00AE}',
        "macron" => '\u{00AF}',
        "degree" => '\u{00B0}',
        "plusminus" => '\u{00B1}',
        "twosuperior" => '\u{00B2}',
        "threesuperior" => '\u{00B3}',
        "acute" => '\u{00B4}',
        "mu" => '\u{00B5}',
        "paragraph" => '\u{00B6}',
        "periodcentered" => '\u{00B7}',
        "cedilla" => '\u{00B8}',
        "onesuperior" => '\u{00B9}',
        "ordmasculine" => '\u{00BA}',
        "guillemotright" => '\u{00BB}',
        "onequarter" => '\u{00BC}',
        "onehalf" => '\u{00BD}',
        "threequarters" => '\u{00BE}',
        "questiondown" => '\u{00BF}',
        "Agrave" => '\u{00C0}',
        "Aacute" => '\u{00C1}',
        "Acircumflex" => '\u{00C2}',
        "Atilde" => '\u{00C3}',
        "Adieresis" => '\u{00C4}',
        "Aring" => '\u{00C5}',
        "AE" => '\u{00C6}',
        "Ccedilla" => '\u{00C7}',
        "Egrave" => '\u{00C8}',
        "Eacute" => '\u{00C9}',
        "Ecircumflex" => '\u{00CA}',
        "Edieresis" => '\u{00CB}',
        "Igrave" => '\u{00CC}',
        "Iacute" => '\u{00CD}',
        "Icircumflex" => '\u{00CE}',
        "Idieresis" => '\u{00CF}',
        "Eth" => '\u{00D0}',
        "Ntilde" => '\u{00D1}',
        "Ograve" => '\u{00D2}',
        "Oacute" => '\u{00D3}',
        "Ocircumflex" => '\u{00D4}',
        "Otilde" => '\u{00D5}',
        "Odieresis" => '\u{00D6}',
        "multiply" => '\u{00D7}',
        "Oslash" => '\u{00D8}',
        "Ugrave" => '\u{00D9}',
        "Uacute" => '\u{00DA}',
        "Ucircumflex" => '\u{00DB}',
        "Udieresis" => '\u{00DC}',
        "Yacute" => '\u{00DD}',
        "Thorn" => '\u{00DE}',
        "germandbls" => '\u{00DF}',
        "agrave" => '\u{00E0}',
        "aacute" => '\u{00E1}',
        "acircumflex" => '\u{00E2}',
        "atilde" => '\u{00E3}',
        "adieresis" => '\u{00E4}',
        "aring" => '\u{00E5}',
        "ae" => '\u{00E6}',
        "ccedilla" => '\u{00E7}',
        "egrave" => '\u{00E8}',
        "eacute" => '\u{00E9}',
        "ecircumflex" => '\u{00EA}',
        "edieresis" => '\u{00EB}',
        "igrave" => '\u{00EC}',
        "iacute" => '\u{00ED}',
        "icircumflex" => '\u{00EE}',
        "idieresis" => '\u{00EF}',
        "eth" => '\u{00F0}',
        "ntilde" => '\u{00F1}',
        "ograve" => '\u{00F2}',
        "oacute" => '\u{00F3}',
        "ocircumflex" => '\u{00F4}',
        "otilde" => '\u{00F5}',
        "odieresis" => '\u{00F6}',
        "divide" => '\u{00F7}',
        "oslash" => '\u{00F8}',
        "ugrave" => '\u{00F9}',
        "uacute" => '\u{00FA}',
        "ucircumflex" => '\u{00FB}',
        "udieresis" => '\u{00FC}',
        "yacute" => '\u{00FD}',
        "thorn" => '\u{00FE}',
        "ydieresis" => '\u{00FF}',
        "Amacron" => '\u{0100}',
        "amacron" => '\u{0101}',
        "Abreve" => '\u{0102}',
        "abreve" => '\u{0103}',
        "Aogonek" => '\u{0104}',
        "aogonek" => '\u{0105}',
        "Cacute" => '\u{0106}',
        "cacute" => '\u{0107}',
        "Ccaron" => '\u{010C}',
        "ccaron" => '\u{010D}',
        "Dcaron" => '\u{010E}',
        "dcaron" => '\u{010F}',
        "Dcroat" => '\u{0110}',
        "dcroat" => '\u{0111}',
        "Emacron" => '\u{0112}',
        "emacron" => '\u{0113}',
        "Edotaccent" => '\u{0116}',
        "edotaccent" => '\u{0117}',
        "Eogonek" => '\u{0118}',
        "eogonek" => '\u{0119}',
        "Ecaron" => '\u{011A}',
        "ecaron" => '\u{011B}',
        "Gbreve" => '\u{011E}',
        "gbreve" => '\u{011F}',
        "Gcommaaccent" => '\u{0122}',
        "gcommaaccent" => '\u{0123}',
        "Imacron" => '\u{012A}',
        "imacron" => '\u{012B}',
        "Iogonek" => '\u{012E}',
        "iogonek" => '\u{012F}',
        "Idotaccent" => '\u{0130}',
        "dotlessi" => '\u{0131}',
        "Kcommaaccent" => '\u{0136}',
        "kcommaaccent" => '\u{0137}',
        "Lacute" => '\u{0139}',
        "lacute" => '\u{013A}',
        "Lcommaaccent" => '\u{013B}',
        "lcommaaccent" => '\u{013C}',
        "Lcaron" => '\u{013D}',
        "lcaron" => '\u{013E}',
        "Lslash" => '\u{0141}',
        "lslash" => '\u{0142}',
        "Nacute" => '\u{0143}',
        "nacute" => '\u{0144}',
        "Ncommaaccent" => '\u{0145}',
        "ncommaaccent" => '\u{0146}',
        "Ncaron" => '\u{0147}',
        "ncaron" => '\u{0148}',
        "Omacron" => '\u{014C}',
        "omacron" => '\u{014D}',
        "Ohungarumlaut" => '\u{0150}',
        "ohungarumlaut" => '\u{0151}',
        "OE" => '\u{0152}',
        "oe" => '\u{0153}',
        "Racute" => '\u{0154}',
        "racute" => '\u{0155}',
        "Rcommaaccent" => '\u{0156}',
        "rcommaaccent" => '\u{0157}',
        "Rcaron" => '\u{0158}',
        "rcaron" => '\u{0159}',
        "Sacute" => '\u{015A}',
        "sacute" => '\u{015B}',
        "Scedilla" => '\u{015E}',
        "scedilla" => '\u{015F}',
        "Scaron" => '\u{0160}',
        "scaron" => '\u{0161}',
        "Tcaron" => '\u{0164}',
        "tcaron" => '\u{0165}',
        "Umacron" => '\u{016A}',
        "umacron" => '\u{016B}',
        "Uring" => '\u{016E}',
        "uring" => '\u{016F}',
        "Uhungarumlaut" => '\u{0170}',
        "uhungarumlaut" => '\u{0171}',
        "Uogonek" => '\u{0172}',
        "uogonek" => '\u{0173}',
        "Ydieresis" => '\u{0178}',
        "Zacute" => '\u{0179}',
        "zacute" => '\u{017A}',
        "Zdotaccent" => '\u{017B}',
        "zdotaccent" => '\u{017C}',
        "Zcaron" => '\u{017D}',
        "zcaron" => '\u{017E}',
        "florin" => '\u{0192}',
        "circumflex" => '\u{02C6}',
        "caron" => '\u{02C7}',
        "breve" => '\u{02D8}',
        "dotaccent" => '\u{02D9}',
        "ring" => '\u{02DA}',
        "ogonek" => '\u{02DB}',
        "tilde" => '\u{02DC}',
        "hungarumlaut" => '\u{02DD}',
        "Alpha" => '\u{0391}',
        "Beta" => '\u{0392}',
        "Gamma" => '\u{0393}',
        "Delta" => '\u{0394}',
        "Epsilon" => '\u{0395}',
        "Zeta" => '\u{0396}',
        "Eta" => '\u{0397}',
        "Theta" => '\u{0398}',
        "Iota" => '\u{0399}',
        "Kappa" => '\u{039A}',
        "Lambda" => '\u{039B}',
        "Mu" => '\u{039C}',
        "Nu" => '\u{039D}',
        "Xi" => '\u{039E}',
        "Omicron" => '\u{039F}',
        "Pi" => '\u{03A0}',
        "Rho" => '\u{03A1}',
        "Sigma" => '\u{03A3}',
        "Tau" => '\u{03A4}',
        "Upsilon" => '\u{03A5}',
        "Phi" => '\u{03A6}',
        "Chi" => '\u{03A7}',
        "Psi" => '\u{03A8}',
        "Omega" => '\u{03A9}',
        "alpha" => '\u{03B1}',
        "beta" => '\u{03B2}',
        "gamma" => '\u{03B3}',
        "delta" => '\u{03B4}',
        "epsilon" => '\u{03B5}',
        "zeta" => '\u{03B6}',
        "eta" => '\u{03B7}',
        "theta" => '\u{03B8}',
        "iota" => '\u{03B9}',
        "kappa" => '\u{03BA}',
        "lambda" => '\u{03BB}',
        "nu" => '\u{03BD}',
        "xi" => '\u{03BE}',
        "omicron" => '\u{03BF}',
        "pi" => '\u{03C0}',
        "rho" => '\u{03C1}',
        "sigma1" => '\u{03C2}',
        "sigma" => '\u{03C3}',
        "tau" => '\u{03C4}',
        "upsilon" => '\u{03C5}',
        "phi" => '\u{03C6}',
        "chi" => '\u{03C7}',
        "psi" => '\u{03C8}',
        "omega" => '\u{03C9}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotesinglbase" => '\u{201A}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "quotedblbase" => '\u{201E}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "perthousand" => '\u{2030}',
        "guilsinglleft" => '\u{2039}',
        "guilsinglright" => '\u{203A}',
        "fraction" => '\u{2044}',
        "Euro" => '\u{20AC}',
        "trademark" => '\u{2122}',
        "partialdiff" => '\u{2202}',
        "product" => '\u{220F}',
        "summation" => '\u{2211}',
        "minus" => '\u{2212}',
        "radical" => '\u{221A}',
        "infinity" => '\u{221E}',
        "integral" => '\u{222B}',
        "approxequal" => '\u{2248}',
        "notequal" => '\u{2260}',
        "lessequal" => '\u{2264}',
        "greaterequal" => '\u{2265}',
        "lozenge" => '\u{25CA}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        "nbspace" => '\u{00A0}',
        "nonbreakingspace" => '\u{00A0}',
        "softhyphen" => '\u{00AD}',
        "middot" => '\u{00B7}',
        "apple" => '\u{F8FF}',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{Span, SpanWidth, Widths};

    fn widths() -> Widths {
        Widths {
            default: 500.0,
            spans: vec![Span {
                first: 0x41,
                last: 0x41,
                width: SpanWidth::Fixed(600.0),
            }],
        }
    }

    #[test]
    fn bfchar_match_and_no_rune_fallback() {
        let cmap = CMap {
            widths: widths(),
            space: [
                vec![ByteRange {
                    lo: vec![0x00],
                    hi: vec![0xFF],
                }],
                Vec::new(),
                Vec::new(),
                Vec::new(),
            ],
            bfchars: vec![BFChar {
                orig: vec![0x41],
                repl: vec![0x00, 0x41],
            }],
            bfranges: Vec::new(),
        };
        let (text, w) = cmap.decode(&[0x41, 0x42]);
        assert_eq!(text, "A\u{FFFD}");
        assert_eq!(w, 600.0 + 500.0);
    }

    #[test]
    fn bfrange_string_destination_scales_last_byte() {
        let cmap = CMap {
            widths: Widths::default(),
            space: [
                vec![ByteRange {
                    lo: vec![0x00],
                    hi: vec![0xFF],
                }],
                Vec::new(),
                Vec::new(),
                Vec::new(),
            ],
            bfchars: Vec::new(),
            bfranges: vec![BFRange {
                lo: vec![0x00],
                hi: vec![0x7F],
                dst: BFDest::Chars(vec![0x00, 0x00]),
            }],
        };
        let (text, _) = cmap.decode(b"Hi\n");
        assert_eq!(text, "Hi\n");
    }

    #[test]
    fn bfrange_array_destination_indexes_by_offset() {
        let cmap = CMap {
            widths: Widths::default(),
            space: [
                vec![ByteRange {
                    lo: vec![0x01],
                    hi: vec![0x03],
                }],
                Vec::new(),
                Vec::new(),
                Vec::new(),
            ],
            bfchars: Vec::new(),
            bfranges: vec![BFRange {
                lo: vec![0x01],
                hi: vec![0x03],
                dst: BFDest::Array(vec![
                    vec![0x00, 0x58],
                    vec![0x00, 0x59],
                    vec![0x00, 0x5A],
                ]),
            }],
        };
        let (text, _) = cmap.decode(&[0x02, 0x03, 0x01]);
        assert_eq!(text, "YZX");
    }

    #[test]
    fn two_byte_codespace_consumes_pairs() {
        let cmap = CMap {
            widths: Widths::default(),
            space: [
                Vec::new(),
                vec![ByteRange {
                    lo: vec![0x00, 0x00],
                    hi: vec![0xFF, 0xFF],
                }],
                Vec::new(),
                Vec::new(),
            ],
            bfchars: vec![BFChar {
                orig: vec![0x00, 0x42],
                repl: vec![0x00, 0x62],
            }],
            bfranges: Vec::new(),
        };
        let (text, _) = cmap.decode(&[0x00, 0x42, 0x00, 0x42]);
        assert_eq!(text, "bb");
    }

    #[test]
    fn unmatched_byte_emits_replacement_and_advances_one() {
        let cmap = CMap {
            widths: Widths::default(),
            space: [
                vec![ByteRange {
                    lo: vec![0x20],
                    hi: vec![0x7E],
                }],
                Vec::new(),
                Vec::new(),
                Vec::new(),
            ],
            bfchars: Vec::new(),
            bfranges: Vec::new(),
        };
        let (text, _) = cmap.decode(&[0x01, 0x01]);
        assert_eq!(text, "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn utf16_bom_string_normalizes() {
        // U+FB01 (fi ligature) NFKC-normalizes to "fi".
        assert_eq!(utf16_decode(&[0xFB, 0x01]), "fi");
        assert_eq!(utf16_decode(&[0x00, 0x41, 0x00, 0x42]), "AB");
    }

    #[test]
    fn utf16_surrogate_pair() {
        // U+1D11E musical G clef.
        assert_eq!(utf16_decode(&[0xD8, 0x34, 0xDD, 0x1E]), "\u{1D11E}");
    }

    #[test]
    fn pdf_doc_detection() {
        assert!(is_pdf_doc_encoded(b"plain text"));
        assert!(!is_pdf_doc_encoded(&[0xFE, 0xFF, 0x00, 0x41]));
        assert!(!is_pdf_doc_encoded(&[0x7F]));
        assert_eq!(pdf_doc_decode(b"abc"), "abc");
        assert_eq!(pdf_doc_decode(&[0xA0]), "\u{20AC}");
    }

    #[test]
    fn glyph_names_resolve() {
        assert_eq!(glyph_rune("A"), Some('A'));
        assert_eq!(glyph_rune("bullet"), Some('\u{2022}'));
        assert_eq!(glyph_rune("germandbls"), Some('\u{00DF}'));
        assert_eq!(glyph_rune("uni0041"), Some('A'));
        assert_eq!(glyph_rune("u1D11E"), Some('\u{1D11E}'));
        assert_eq!(glyph_rune("notaglyphname"), None);
    }
}

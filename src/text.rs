use std::fmt::Write as _;

/// A run of extracted text sharing one size and weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub size: f64,
    /// Bitmask of styles; bit 0 is bold.
    pub weight: i32,
    pub content: String,
}

/// Minimally structured text extracted from one page: an ordered sequence of
/// sized parts with paragraph and line breaks already inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Text {
    parts: Vec<Part>,
}

impl Text {
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The plain text without sizing information.
    pub fn string(&self) -> String {
        let mut out = String::new();
        for p in &self.parts {
            out.push_str(&p.content);
        }
        out
    }

    /// The text annotated as `[size|weight]content` at each style change.
    pub fn debug_string(&self) -> String {
        let mut out = String::new();
        for p in &self.parts {
            let _ = write!(out, "[{:.1}|{:b}]", p.size, p.weight);
            out.push_str(&p.content);
        }
        out
    }

    /// The maximum size of any part, nudged by weight so that a bold run
    /// outranks a plain run of equal size.
    pub fn size(&self) -> f64 {
        let mut ms = 0.0f64;
        for p in &self.parts {
            ms = ms.max(p.size + f64::from(p.weight) / 100.0);
        }
        ms
    }

    /// Trims whitespace from both ends, dropping parts left empty.
    pub fn trim_space(&self) -> Text {
        let n = self.parts.len();
        let mut trimmed = Vec::new();
        for (i, p) in self.parts.iter().enumerate() {
            let mut content = p.content.as_str();
            if i == 0 {
                content = content.trim_start();
            }
            if i == n - 1 {
                content = content.trim_end();
            }
            if !content.is_empty() {
                trimmed.push(Part {
                    size: p.size,
                    weight: p.weight,
                    content: content.to_string(),
                });
            }
        }
        Text { parts: trimmed }
    }

    /// Splits on a separator, preserving part styling across the pieces.
    pub fn split(&self, sep: &str) -> Vec<Text> {
        let mut out = Vec::new();
        let mut current = Builder::new();
        for p in &self.parts {
            for (i, piece) in p.content.split(sep).enumerate() {
                if i > 0 {
                    out.push(current.text());
                    current = Builder::new();
                }
                current.add(p.size, p.weight, piece, Whitespace::None);
            }
        }
        if !current.buf.is_empty() {
            out.push(current.text());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Whitespace {
    None,
    Word,
    Line,
    Paragraph,
}

/// Accumulates positioned glyph runs into a [`Text`], inserting paragraph
/// and line separators from the vertical motion between consecutive runs.
#[derive(Debug, Default)]
pub struct Builder {
    x: f64,
    y: f64,
    word_gaps: bool,
    buf: Vec<Part>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Also inserts a single space when x jumps more than one line height
    /// along the same baseline.
    pub fn with_word_gaps() -> Builder {
        Builder {
            word_gaps: true,
            ..Builder::default()
        }
    }

    /// Adds a rendered run at page position (x, y) with advance w, line
    /// height h, and the producing font's name.
    pub fn render(&mut self, x: f64, y: f64, w: f64, h: f64, font: &str, content: &str) {
        if content.is_empty() {
            return;
        }

        let mut ws = Whitespace::None;
        if !self.buf.is_empty() {
            if y > self.y || y < self.y - 2.0 * h {
                ws = Whitespace::Paragraph;
            } else if y < self.y {
                ws = Whitespace::Line;
            } else if self.word_gaps && x > self.x + h {
                ws = Whitespace::Word;
            }
        }
        self.x = x + w;
        self.y = y;

        let weight = i32::from(font.ends_with("-Bold"));
        self.add(h, weight, content, ws);
    }

    fn add(&mut self, size: f64, weight: i32, content: &str, ws: Whitespace) {
        let is_whitespace = content.trim().is_empty();
        if let Some(last) = self.buf.last() {
            if is_whitespace || (last.size == size && last.weight == weight) {
                self.append(content, ws);
                return;
            }
        }
        self.buf.push(Part {
            size,
            weight,
            content: String::new(),
        });
        self.append(content, ws);
    }

    fn append(&mut self, s: &str, ws: Whitespace) {
        let last = match self.buf.last_mut() {
            Some(last) => last,
            None => return,
        };
        let mut s = s;
        match ws {
            Whitespace::None => {}
            Whitespace::Word => {
                let joined = last.content.ends_with(char::is_whitespace)
                    || s.starts_with(char::is_whitespace);
                if !joined {
                    last.content.push(' ');
                }
            }
            Whitespace::Line => {
                let joined = last.content.ends_with('\n') || s.starts_with('\n');
                if !joined {
                    last.content.push('\n');
                }
            }
            Whitespace::Paragraph => {
                last.content.truncate(last.content.trim_end().len());
                s = s.trim_start();
                last.content.push_str("\n\n");
            }
        }
        last.content.push_str(s);
    }

    pub fn text(&self) -> Text {
        Text {
            parts: self.buf.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_and_line_breaks_from_vertical_motion() {
        let mut b = Builder::new();
        b.render(0.0, 100.0, 10.0, 10.0, "F", "a");
        b.render(0.0, 90.0, 10.0, 10.0, "F", "b");
        b.render(0.0, 60.0, 10.0, 10.0, "F", "c");
        let text = b.text();
        assert_eq!(
            text.parts(),
            &[Part {
                size: 10.0,
                weight: 0,
                content: "a\nb\n\nc".to_string()
            }]
        );
    }

    #[test]
    fn upward_motion_starts_a_paragraph() {
        let mut b = Builder::new();
        b.render(0.0, 100.0, 10.0, 10.0, "F", "a");
        b.render(0.0, 110.0, 10.0, 10.0, "F", "b");
        assert_eq!(b.text().string(), "a\n\nb");
    }

    #[test]
    fn bold_font_splits_parts_and_sets_weight() {
        let mut b = Builder::new();
        b.render(0.0, 100.0, 10.0, 10.0, "Helvetica", "plain ");
        b.render(60.0, 100.0, 10.0, 10.0, "Helvetica-Bold", "bold");
        let text = b.text();
        assert_eq!(text.parts().len(), 2);
        assert_eq!(text.parts()[0].weight, 0);
        assert_eq!(text.parts()[1].weight, 1);
        assert_eq!(text.parts()[1].content, "bold");
    }

    #[test]
    fn whitespace_run_merges_into_previous_part() {
        let mut b = Builder::new();
        b.render(0.0, 100.0, 10.0, 10.0, "F", "a");
        b.render(10.0, 100.0, 5.0, 12.0, "F", " ");
        b.render(15.0, 100.0, 10.0, 10.0, "F", "b");
        assert_eq!(b.text().parts().len(), 1);
        assert_eq!(b.text().string(), "a b");
    }

    #[test]
    fn word_gap_injection_is_off_by_default() {
        let mut plain = Builder::new();
        plain.render(0.0, 100.0, 10.0, 10.0, "F", "a");
        plain.render(50.0, 100.0, 10.0, 10.0, "F", "b");
        assert_eq!(plain.text().string(), "ab");

        let mut gapped = Builder::with_word_gaps();
        gapped.render(0.0, 100.0, 10.0, 10.0, "F", "a");
        gapped.render(50.0, 100.0, 10.0, 10.0, "F", "b");
        assert_eq!(gapped.text().string(), "a b");
    }

    #[test]
    fn paragraph_break_trims_the_junction() {
        let mut b = Builder::new();
        b.render(0.0, 100.0, 10.0, 10.0, "F", "end of one  ");
        b.render(0.0, 60.0, 10.0, 10.0, "F", "  next");
        assert_eq!(b.text().string(), "end of one\n\nnext");
    }

    #[test]
    fn line_break_not_doubled() {
        let mut b = Builder::new();
        b.render(0.0, 100.0, 10.0, 10.0, "F", "a\n");
        b.render(0.0, 90.0, 10.0, 10.0, "F", "b");
        assert_eq!(b.text().string(), "a\nb");
    }

    #[test]
    fn split_preserves_styles() {
        let mut b = Builder::new();
        b.render(0.0, 100.0, 10.0, 10.0, "F", "one");
        b.render(0.0, 90.0, 10.0, 10.0, "F", "two");
        let lines = b.text().split("\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].string(), "one");
        assert_eq!(lines[1].string(), "two");
        assert_eq!(lines[1].parts()[0].size, 10.0);
    }

    #[test]
    fn trim_space_drops_empty_edges() {
        let text = Text {
            parts: vec![
                Part {
                    size: 10.0,
                    weight: 0,
                    content: "  ".to_string(),
                },
                Part {
                    size: 12.0,
                    weight: 0,
                    content: " mid ".to_string(),
                },
                Part {
                    size: 10.0,
                    weight: 0,
                    content: " \n".to_string(),
                },
            ],
        };
        let trimmed = text.trim_space();
        assert_eq!(trimmed.parts().len(), 1);
        assert_eq!(trimmed.string(), " mid ");
    }

    #[test]
    fn size_is_max_with_weight_nudge() {
        let text = Text {
            parts: vec![
                Part {
                    size: 10.0,
                    weight: 0,
                    content: "a".to_string(),
                },
                Part {
                    size: 10.0,
                    weight: 1,
                    content: "b".to_string(),
                },
            ],
        };
        assert!((text.size() - 10.01).abs() < 1e-9);
    }

    #[test]
    fn debug_string_annotates_style_changes() {
        let mut b = Builder::new();
        b.render(0.0, 100.0, 10.0, 10.0, "F-Bold", "hi");
        assert_eq!(b.text().debug_string(), "[10.0|1]hi");
    }
}

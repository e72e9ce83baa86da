use std::rc::Rc;

use log::debug;

use crate::font::Font;
use crate::matrix::Matrix;
use crate::text::Builder;

/// Text state parameters (ISO 32000-2 Table 102) plus the text and text
/// line matrices, live only between `BT` and `ET`.
#[derive(Debug, Clone, Default)]
pub(crate) struct TextState {
    tc: f64,
    tw: f64,
    /// Stored as ln(Th); the zero value is the default scale of 100%.
    log_th: f64,
    tl: f64,
    tf: Option<Rc<Font>>,
    tfs: f64,
    tm: Option<Matrix>,
    tlm: Option<Matrix>,
}

#[derive(Debug, Clone, Default)]
struct GState {
    ctm: Option<Matrix>,
    text: TextState,
}

/// Graphics state with its `q`/`Q` stack. The embedded text state travels
/// with it, so `Q` restores text parameters too.
#[derive(Debug, Default)]
pub(crate) struct Graphics {
    state: GState,
    stack: Vec<GState>,
}

impl Graphics {
    pub(crate) fn push(&mut self) {
        if self.state.ctm.is_none() {
            self.state.ctm = Some(Matrix::identity());
        }
        self.stack.push(self.state.clone());
    }

    pub(crate) fn pop(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => debug!("Q with empty graphics state stack"),
        }
    }

    pub(crate) fn cm(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let m = Matrix::from_ops(a, b, c, d, e, f);
        self.state.ctm = Some(match &self.state.ctm {
            Some(ctm) => m.mul(ctm),
            None => m,
        });
    }

    pub(crate) fn text(&mut self) -> &mut TextState {
        &mut self.state.text
    }

    pub(crate) fn tj(&mut self, out: &mut Builder, raw: &[u8]) {
        let ctm = *self.state.ctm.get_or_insert_with(Matrix::identity);
        self.state.text.tj(&ctm, out, raw);
    }

    pub(crate) fn tj_displace(&mut self, v: f64) {
        self.state.text.tj_displace(v);
    }
}

impl TextState {
    pub(crate) fn tc(&mut self, v: f64) {
        self.tc = v;
    }

    pub(crate) fn tw(&mut self, v: f64) {
        self.tw = v;
    }

    pub(crate) fn tz(&mut self, v: f64) {
        self.log_th = (v / 100.0).ln();
    }

    pub(crate) fn tl(&mut self, v: f64) {
        self.tl = v;
    }

    pub(crate) fn tf(&mut self, font: Option<Rc<Font>>, size: f64) {
        self.tf = font;
        self.tfs = size;
    }

    pub(crate) fn bt(&mut self) {
        self.tm = Some(Matrix::identity());
        self.tlm = Some(Matrix::identity());
    }

    pub(crate) fn et(&mut self) {
        self.tm = None;
        self.tlm = None;
    }

    pub(crate) fn td(&mut self, tx: f64, ty: f64) {
        let Some(tlm) = &self.tlm else {
            debug!("Td outside BT/ET");
            return;
        };
        let moved = Matrix::translate(tx, ty).mul(tlm);
        self.tlm = Some(moved);
        self.tm = Some(moved);
    }

    /// `TD`: set leading from -ty, then `Td`.
    pub(crate) fn td_set_leading(&mut self, tx: f64, ty: f64) {
        self.tl(-ty);
        self.td(tx, ty);
    }

    pub(crate) fn tm(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let m = Matrix::from_ops(a, b, c, d, e, f);
        self.tlm = Some(m);
        self.tm = Some(m);
    }

    pub(crate) fn t_star(&mut self) {
        self.td_set_leading(0.0, -self.tl);
    }

    /// `TJ` numeric element: displace the text matrix by
    /// -v/1000 * Tfs * Th along x. Only `tm` moves; the line matrix is the
    /// anchor for the next `Td`/`T*`.
    pub(crate) fn tj_displace(&mut self, v: f64) {
        let Some(tm) = &self.tm else {
            debug!("TJ displacement outside BT/ET");
            return;
        };
        let tx = -v / 1000.0 * self.tfs * self.log_th.exp();
        self.tm = Some(Matrix::translate(tx, 0.0).mul(tm));
    }

    /// Shows a string: decodes it through the current font, computes the
    /// rendered position, height, and advance (ISO 32000-2 §9.4.4), emits
    /// the run, and advances the text matrix.
    pub(crate) fn tj(&mut self, ctm: &Matrix, out: &mut Builder, raw: &[u8]) {
        let Some(tm) = self.tm else {
            debug!("Tj outside BT/ET");
            return;
        };

        let (font_name, text, w0) = match &self.tf {
            Some(font) => {
                let (text, w0) = font.decode(raw);
                (font.name().to_string(), text, w0)
            }
            None => {
                debug!("Tj with no font selected");
                (String::new(), crate::encoding::pdf_doc_decode(raw), 0.0)
            }
        };

        let th = self.log_th.exp();
        let scale = Matrix::from_ops(self.tfs * th, 0.0, 0.0, self.tfs, 0.0, 0.0);
        let pre = scale.mul(&tm).mul(ctm);
        let (x, y) = (pre.0[2][0], pre.0[2][1]);
        let h = pre.0[1][1];

        let mut nc = 0usize;
        let mut nw = 0usize;
        for ch in text.chars() {
            if ch == ' ' {
                nw += 1;
            } else {
                nc += 1;
            }
        }
        let tx = (w0 / 1000.0 * self.tfs + nc as f64 * self.tc + nw as f64 * self.tw) * th;
        let moved = Matrix::translate(tx, 0.0).mul(&tm);
        self.tm = Some(moved);

        let post = scale.mul(&moved).mul(ctm);
        let w = post.0[2][0] - pre.0[2][0];

        out.render(x, y, w, h, &font_name, &text);
    }

    #[cfg(test)]
    pub(crate) fn matrices(&self) -> (Option<Matrix>, Option<Matrix>) {
        (self.tm, self.tlm)
    }
}

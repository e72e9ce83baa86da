#![allow(dead_code)]

/// Assembles syntactically exact PDF files in memory, keeping the xref
/// table consistent with the real byte offsets of each object.
pub struct PdfBuilder {
    data: Vec<u8>,
    offsets: Vec<(u32, usize)>,
}

impl PdfBuilder {
    pub fn new() -> PdfBuilder {
        PdfBuilder {
            data: b"%PDF-1.7\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    /// Appends `id 0 obj <body> endobj`.
    pub fn object(&mut self, id: u32, body: &str) -> &mut Self {
        self.offsets.push((id, self.data.len()));
        self.data
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
        self
    }

    /// Appends a stream object; `/Length` is filled in automatically and
    /// `dict_extra` lands inside the header dictionary.
    pub fn stream(&mut self, id: u32, dict_extra: &str, body: &[u8]) -> &mut Self {
        self.offsets.push((id, self.data.len()));
        self.data.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Length {} {} >>\nstream\n",
                id,
                body.len(),
                dict_extra
            )
            .as_bytes(),
        );
        self.data.extend_from_slice(body);
        self.data.extend_from_slice(b"\nendstream\nendobj\n");
        self
    }

    pub fn offset_of(&self, id: u32) -> usize {
        self.offsets
            .iter()
            .find(|(got, _)| *got == id)
            .map(|(_, off)| *off)
            .expect("object not added")
    }

    fn max_id(&self) -> u32 {
        self.offsets.iter().map(|(id, _)| *id).max().unwrap_or(0)
    }

    /// Closes the file with a classic xref table and trailer.
    pub fn finish(&mut self, trailer_extra: &str) -> Vec<u8> {
        let size = self.max_id() + 1;
        let xref_off = self.data.len();
        self.data
            .extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());
        self.data.extend_from_slice(b"0000000000 65535 f \n");
        for id in 1..size {
            match self.offsets.iter().find(|(got, _)| *got == id) {
                Some((_, off)) => self
                    .data
                    .extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes()),
                None => self.data.extend_from_slice(b"0000000000 65535 f \n"),
            }
        }
        self.data.extend_from_slice(
            format!("trailer\n<< /Size {} /Root 1 0 R {} >>\n", size, trailer_extra).as_bytes(),
        );
        self.data
            .extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_off).as_bytes());
        std::mem::take(&mut self.data)
    }

    /// Closes the file with an xref *stream* instead of a table. Rows are
    /// provided per object id; missing ids become free entries.
    pub fn finish_with_xref_stream(&mut self, xref_id: u32, rows: &[XrefRow]) -> Vec<u8> {
        let size = self.max_id().max(xref_id) + 1;

        let xref_off = self.data.len();
        let mut body = Vec::new();
        for id in 0..size {
            if id == xref_id {
                body.extend_from_slice(&[1, 0, 0, 0]);
                continue;
            }
            match rows.iter().find(|row| row.id() == id) {
                Some(XrefRow::InFile { id }) => {
                    let off = self.offset_of(*id) as u16;
                    body.push(1);
                    body.extend_from_slice(&off.to_be_bytes());
                    body.push(0);
                }
                Some(XrefRow::InStream { stream, index, .. }) => {
                    body.push(2);
                    body.extend_from_slice(&(*stream as u16).to_be_bytes());
                    body.push(*index);
                }
                None => body.extend_from_slice(&[0, 0, 0, 0]),
            }
        }
        // Patch the xref stream's own offset now that it is known.
        let own = (xref_off as u16).to_be_bytes();
        let own_row = (xref_id as usize) * 4;
        body[own_row..own_row + 4].copy_from_slice(&[1, own[0], own[1], 0]);

        self.offsets.push((xref_id, xref_off));
        self.data.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Type /XRef /Size {} /W [1 2 1] /Root 1 0 R /Length {} >>\nstream\n",
                xref_id,
                size,
                body.len()
            )
            .as_bytes(),
        );
        self.data.extend_from_slice(&body);
        self.data.extend_from_slice(b"\nendstream\nendobj\n");
        self.data
            .extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_off).as_bytes());
        std::mem::take(&mut self.data)
    }
}

pub enum XrefRow {
    InFile { id: u32 },
    InStream { id: u32, stream: u32, index: u8 },
}

impl XrefRow {
    fn id(&self) -> u32 {
        match self {
            XrefRow::InFile { id } => *id,
            XrefRow::InStream { id, .. } => *id,
        }
    }
}

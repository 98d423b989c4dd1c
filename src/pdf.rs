//! Minimal single-page PDF writer using the standard Helvetica fonts.
//!
//! Only what invoices need: positioned text in two weights and straight
//! lines. Text is encoded as WinAnsi (Latin-1 for the characters used in
//! Danish), so `æ`, `ø` and `å` render without embedding a font.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        }
    }
}

/// A page being drawn. Coordinates are PDF points from the bottom-left corner.
#[derive(Debug, Clone)]
pub struct PdfPage {
    width: f32,
    height: f32,
    content: String,
}

impl PdfPage {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            content: String::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) {
        self.content.push_str(&format!(
            "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
            font.resource(),
            num(size),
            num(x),
            num(y),
            escape_text(text)
        ));
    }

    /// Straight stroke in a grey level (`0.0` black to `1.0` white).
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, grey: f32) {
        let grey = num(grey);
        self.content.push_str(&format!(
            "{} w {grey} {grey} {grey} RG {} {} m {} {} l S\n",
            num(thickness),
            num(from.0),
            num(from.1),
            num(to.0),
            num(to.1)
        ));
    }

    /// Serializes the page into a complete PDF file.
    pub fn finish(self) -> Vec<u8> {
        let content = self.content.into_bytes();

        let objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 5 0 R /F2 6 0 R >> >> /Contents 4 0 R >>",
                num(self.width),
                num(self.height)
            )
            .into_bytes(),
            {
                let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
                stream.extend_from_slice(&content);
                stream.extend_from_slice(b"\nendstream");
                stream
            },
            font_object("Helvetica"),
            font_object("Helvetica-Bold"),
        ];

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        ));
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

fn font_object(base: &str) -> Vec<u8> {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
        .into_bytes()
}

/// Formats a coordinate without a trailing `.0`.
fn num(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let text = format!("{value:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Escapes a literal string. Characters outside ASCII become octal
/// escapes of their Latin-1 code; anything beyond Latin-1 becomes `?`.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\n' | '\r' | '\t' => out.push(' '),
            c if (c as u32) >= 0xA0 && (c as u32) <= 0xFF => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            _ => out.push('?'),
        }
    }
    out
}

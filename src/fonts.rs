use pdf_writer::{Name, Pdf, Ref};

/// The two base-14 faces the report uses. Neither is embedded; every PDF
/// viewer ships them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub(crate) const ALL: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

    /// Resource name used in content streams.
    pub(crate) fn pdf_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
        }
    }

    fn base_font(self) -> &'static [u8] {
        match self {
            StandardFont::Helvetica => b"Helvetica",
            StandardFont::HelveticaBold => b"Helvetica-Bold",
        }
    }

    /// Advance width of a WinAnsi byte at 1000 units/em.
    fn width_1000(self, byte: u8) -> f32 {
        let table = match self {
            StandardFont::Helvetica => &HELVETICA_ASCII,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_ASCII,
        };
        match byte {
            32..=126 => table[(byte - 32) as usize] as f32,
            // Latin-1 and punctuation above ASCII: average lowercase width.
            _ => 556.0,
        }
    }

    pub(crate) fn text_width(self, text: &str, font_size: f32) -> f32 {
        to_winansi_bytes(text)
            .iter()
            .map(|&b| self.width_1000(b) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn char_width(self, ch: char, font_size: f32) -> f32 {
        self.width_1000(char_to_winansi(ch)) * font_size / 1000.0
    }
}

// Helvetica AFM advance widths for printable ASCII (0x20..=0x7E).
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // 0-9
    278, 278, 584, 584, 584, 556, 1015,                                             // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // N-Z
    278, 278, 278, 469, 556, 333,                                                   // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // n-z
    334, 260, 334, 584,                                                             // {..~
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Map a single Unicode char to its WinAnsi (Windows-1252) byte, or `?`
/// when the encoding has no slot for it.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        // Tabs and other controls would render as nothing; show them as spaces.
        0x0009 | 0x000A | 0x000D => b' ',
        _ => b'?',
    }
}

/// Encode text for a `Str` operand of a WinAnsi-encoded simple font.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().map(char_to_winansi).collect()
}

/// Write both font dictionaries and return `(font, ref)` pairs for the page
/// resources.
pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
) -> Vec<(StandardFont, Ref)> {
    StandardFont::ALL
        .into_iter()
        .map(|font| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(font.base_font()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            (font, font_ref)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_ascii_with_afm_widths() {
        // H(722) e(556) l(222) l(222) o(556) = 2278
        let w = StandardFont::Helvetica.text_width("Hello", 10.0);
        assert!((w - 22.78).abs() < 1e-3);
        assert!(StandardFont::HelveticaBold.text_width("Hello", 10.0) > w);
    }

    #[test]
    fn unmappable_chars_become_question_marks() {
        assert_eq!(to_winansi_bytes("a\u{4e2d}€"), vec![b'a', b'?', 0x80]);
        assert_eq!(to_winansi_bytes("é\t"), vec![0xE9, b' ']);
    }
}

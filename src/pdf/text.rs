use pdf_writer::{Content, Name, Str};

use crate::fonts::{StandardFont, to_winansi_bytes};

// Helvetica ascent/descent at 1000 units/em, as fractions of the font size.
const ASCENT: f32 = 0.718;
const DESCENT: f32 = 0.207;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Alignment {
    Left,
    Center,
}

/// Greedy word wrap to `max_width`. Words wider than a whole line are
/// broken between characters so nothing runs past the edge. Always
/// returns at least one line.
pub(super) fn wrap_text(
    text: &str,
    font: StandardFont,
    font_size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let space_w = font.text_width(" ", font_size);
        let mut line = String::new();
        let mut line_w = 0.0f32;

        for word in paragraph.split_whitespace() {
            let word_w = font.text_width(word, font_size);
            let gap = if line.is_empty() { 0.0 } else { space_w };

            if line_w + gap + word_w <= max_width {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
                line_w += gap + word_w;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_w = 0.0;
            }

            if word_w <= max_width {
                line.push_str(word);
                line_w = word_w;
                continue;
            }

            for ch in word.chars() {
                let ch_w = font.char_width(ch, font_size);
                if !line.is_empty() && line_w + ch_w > max_width {
                    lines.push(std::mem::take(&mut line));
                    line_w = 0.0;
                }
                line.push(ch);
                line_w += ch_w;
            }
        }

        lines.push(line);
    }

    lines
}

/// Baseline that centres the glyph box vertically in a line of height `line_h`.
pub(super) fn baseline_in_line(line_top: f32, line_h: f32, font_size: f32) -> f32 {
    line_top - (line_h + (ASCENT - DESCENT) * font_size) / 2.0
}

/// Draw pre-wrapped lines starting at `first_baseline_y`, one `line_h` apart.
pub(super) fn draw_lines(
    content: &mut Content,
    lines: &[String],
    font: StandardFont,
    font_size: f32,
    alignment: Alignment,
    x: f32,
    width: f32,
    first_baseline_y: f32,
    line_h: f32,
) {
    content.begin_text();
    content.set_font(Name(font.pdf_name().as_bytes()), font_size);

    let mut td_x = 0.0f32;
    let mut td_y = 0.0f32;
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let line_x = match alignment {
            Alignment::Left => x,
            Alignment::Center => x + (width - font.text_width(line, font_size)) / 2.0,
        };
        let y = first_baseline_y - i as f32 * line_h;

        content.next_line(line_x - td_x, y - td_y);
        td_x = line_x;
        td_y = y;
        content.show(Str(&to_winansi_bytes(line)));
    }

    content.end_text();
}

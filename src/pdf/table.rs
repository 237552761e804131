use crate::error::Error;
use crate::fonts::StandardFont;
use crate::model::TableFragment;

use super::text::{Alignment, baseline_in_line, draw_lines, wrap_text};
use super::PageFlow;

const FONT_SIZE: f32 = 10.0;
const LINE_H: f32 = 12.0;
const PAD_X: f32 = 6.0;
const PAD_Y: f32 = 3.0;
const GRID_WIDTH: f32 = 1.0;

const HEADER_FILL: f32 = 0.502; // grey
const HEADER_TEXT: f32 = 0.961; // whitesmoke
const BODY_FILL: f32 = 1.0;
const BODY_TEXT: f32 = 0.0;

struct RowLayout {
    height: f32,
    header: bool,
    cell_lines: Vec<Vec<String>>,
}

fn compute_row_layouts(fragment: &TableFragment, col_widths: &[f32]) -> Vec<RowLayout> {
    fragment
        .cells
        .iter()
        .enumerate()
        .map(|(ri, row)| {
            let header = fragment.header_row && ri == 0;
            let font = if header {
                StandardFont::HelveticaBold
            } else {
                StandardFont::Helvetica
            };
            let cell_lines: Vec<Vec<String>> = row
                .iter()
                .zip(col_widths)
                .map(|(text, &col_w)| {
                    wrap_text(text, font, FONT_SIZE, (col_w - 2.0 * PAD_X).max(FONT_SIZE))
                })
                .collect();
            let max_lines = cell_lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
            RowLayout {
                height: max_lines as f32 * LINE_H + 2.0 * PAD_Y,
                header,
                cell_lines,
            }
        })
        .collect()
}

/// Widths the fragment is drawn at. A fragment wider than the usable width
/// (a lone column wider than the page) is narrowed to fit; its text wraps
/// at the narrower width instead of running off the page.
fn fitted_widths(col_widths: &[f32], usable_width: f32) -> Vec<f32> {
    let total: f32 = col_widths.iter().sum();
    if total <= usable_width || total <= 0.0 {
        return col_widths.to_vec();
    }
    log::debug!("TABLE width {total:.1}pt narrowed to {usable_width:.1}pt");
    let scale = usable_width / total;
    col_widths.iter().map(|w| w * scale).collect()
}

/// Draw one fragment at the flow's cursor. Rows that no longer fit move to
/// a fresh page; a fragment is never clipped at the bottom margin or the
/// right edge.
pub(super) fn render_table(flow: &mut PageFlow, fragment: &TableFragment) -> Result<(), Error> {
    let ncols = fragment.col_widths.len();
    if let Some((ri, row)) = fragment
        .cells
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != ncols)
    {
        return Err(Error::Render(format!(
            "table row {ri} has {} cells but {ncols} column widths",
            row.len()
        )));
    }

    let col_widths = fitted_widths(&fragment.col_widths, flow.width);
    let total_w: f32 = col_widths.iter().sum();
    let table_left = flow.left + ((flow.width - total_w) / 2.0).max(0.0);
    let col_x: Vec<f32> = col_widths
        .iter()
        .scan(table_left, |x, w| {
            let start = *x;
            *x += w;
            Some(start)
        })
        .collect();

    for (ri, layout) in compute_row_layouts(fragment, &col_widths).iter().enumerate() {
        let row_h = layout.height;
        if !flow.at_page_top() && flow.y - row_h < flow.bottom {
            log::debug!("TABLE row={ri} row_h={row_h:.2} continues on a new page");
            flow.new_page();
        }
        if flow.y - row_h < flow.bottom {
            log::warn!(
                "table row {ri} is {row_h:.1}pt tall and overflows the page bottom margin"
            );
        }

        let row_top = flow.y;
        let row_bottom = row_top - row_h;
        let (fill, text_gray, font) = if layout.header {
            (HEADER_FILL, HEADER_TEXT, StandardFont::HelveticaBold)
        } else {
            (BODY_FILL, BODY_TEXT, StandardFont::Helvetica)
        };

        let content = &mut flow.content;
        content.save_state();
        content.set_fill_gray(fill);
        content.rect(table_left, row_bottom, total_w, row_h);
        content.fill_nonzero();
        content.restore_state();

        content.set_fill_gray(text_gray);
        for ((lines, &cell_x), &col_w) in layout
            .cell_lines
            .iter()
            .zip(&col_x)
            .zip(&col_widths)
        {
            // Centre the block of lines vertically within the row.
            let block_h = lines.len() as f32 * LINE_H;
            let offset = (row_h - block_h) / 2.0;
            let first_baseline = baseline_in_line(row_top - offset, LINE_H, FONT_SIZE);
            draw_lines(
                content,
                lines,
                font,
                FONT_SIZE,
                Alignment::Center,
                cell_x + PAD_X,
                col_w - 2.0 * PAD_X,
                first_baseline,
                LINE_H,
            );
        }
        content.set_fill_gray(0.0);

        content.save_state();
        content.set_line_width(GRID_WIDTH);
        content.set_stroke_rgb(0.0, 0.0, 0.0);
        for (&cell_x, &col_w) in col_x.iter().zip(&col_widths) {
            content.rect(cell_x, row_bottom, col_w, row_h);
        }
        content.stroke();
        content.restore_state();

        flow.y = row_bottom;
        flow.mark_used();
    }

    Ok(())
}

mod table;
mod text;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::config::PageSetup;
use crate::error::Error;
use crate::fonts::{StandardFont, register_fonts};
use crate::model::ReportItem;

use table::render_table;
use text::{Alignment, baseline_in_line, draw_lines, wrap_text};

const TITLE_SIZE: f32 = 18.0;
const TITLE_LINE_H: f32 = 22.0;
const BODY_SIZE: f32 = 10.0;
const BODY_LINE_H: f32 = 12.0;

/// Top-down cursor over a sequence of pages. `y` is the top of the free
/// space on the current page, in PDF coordinates.
pub(super) struct PageFlow {
    pub(super) content: Content,
    pages: Vec<Content>,
    pub(super) y: f32,
    top: f32,
    pub(super) bottom: f32,
    pub(super) left: f32,
    pub(super) width: f32,
    used: bool,
}

impl PageFlow {
    fn new(page: &PageSetup) -> Self {
        let top = page.height - page.margin_top;
        Self {
            content: Content::new(),
            pages: Vec::new(),
            y: top,
            top,
            bottom: page.margin_bottom,
            left: page.margin_left,
            width: page.usable_width(),
            used: false,
        }
    }

    pub(super) fn at_page_top(&self) -> bool {
        !self.used
    }

    pub(super) fn mark_used(&mut self) {
        self.used = true;
    }

    pub(super) fn new_page(&mut self) {
        self.pages
            .push(std::mem::replace(&mut self.content, Content::new()));
        self.y = self.top;
        self.used = false;
    }

    fn ensure_room(&mut self, height: f32) {
        if !self.at_page_top() && self.y - height < self.bottom {
            self.new_page();
        }
    }

    fn finish(mut self) -> Vec<Content> {
        self.pages.push(self.content);
        self.pages
    }
}

fn render_paragraph(
    flow: &mut PageFlow,
    text: &str,
    font: StandardFont,
    font_size: f32,
    line_h: f32,
    alignment: Alignment,
) {
    let lines = wrap_text(text, font, font_size, flow.width);
    for line in &lines {
        flow.ensure_room(line_h);
        let baseline = baseline_in_line(flow.y, line_h, font_size);
        draw_lines(
            &mut flow.content,
            std::slice::from_ref(line),
            font,
            font_size,
            alignment,
            flow.left,
            flow.width,
            baseline,
            line_h,
        );
        flow.y -= line_h;
        flow.mark_used();
    }
}

/// Lay the report items out onto pages and serialize the PDF. Nothing is
/// returned unless every item rendered.
pub fn render(items: &[ReportItem], page: &PageSetup) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    if page.usable_width() <= 0.0 || page.usable_height() <= 0.0 {
        return Err(Error::Render(format!(
            "page {:.1}x{:.1}pt has no room inside its margins",
            page.width, page.height
        )));
    }

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();
    let fonts = register_fonts(&mut pdf, &mut alloc);

    // Phase 1: flow items onto pages
    let mut flow = PageFlow::new(page);
    let mut title = None;
    for item in items {
        match item {
            ReportItem::Title(text) => {
                title.get_or_insert(text.as_str());
                render_paragraph(
                    &mut flow,
                    text,
                    StandardFont::HelveticaBold,
                    TITLE_SIZE,
                    TITLE_LINE_H,
                    Alignment::Center,
                );
            }
            ReportItem::Spacer(h) => {
                // Space is swallowed at a page bottom, never carried over.
                flow.y = (flow.y - h).max(flow.bottom);
            }
            ReportItem::Table(fragment) => render_table(&mut flow, fragment)?,
            ReportItem::PageBreak => flow.new_page(),
            ReportItem::Footer(text) => render_paragraph(
                &mut flow,
                text,
                StandardFont::Helvetica,
                BODY_SIZE,
                BODY_LINE_H,
                Alignment::Left,
            ),
        }
    }
    let all_contents = flow.finish();
    let t_layout = t0.elapsed();

    // Phase 2: allocate page and content IDs now that page count is known
    let n = all_contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in all_contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    {
        let mut info = pdf.document_info(info_id);
        info.producer(TextStr("merge-report"));
        if let Some(title) = title {
            info.title(TextStr(title));
        }
    }

    for i in 0..n {
        let mut pdf_page = pdf.page(page_ids[i]);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, page.width, page.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = pdf_page.resources();
        let mut font_dict = resources.fonts();
        for (font, font_ref) in &fonts {
            font_dict.pair(Name(font.pdf_name().as_bytes()), *font_ref);
        }
    }

    log::info!(
        "Render phases: layout={:.1}ms, assembly={:.1}ms ({} pages)",
        t_layout.as_secs_f64() * 1000.0,
        (t0.elapsed() - t_layout).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}

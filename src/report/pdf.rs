//! A4 page layout and PDF output for [`ReportDocument`].
//!
//! Layout runs first and produces positioned draw operations per page, in
//! points measured from the bottom-left corner. Painting then replays those
//! operations through `printpdf` using the built-in Helvetica faces, so no
//! font files are needed at runtime.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};

use super::document::{Block, ReportDocument};
use crate::error::AppError;

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 72.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const MM_PER_PT: f32 = 25.4 / 72.0;

const CELL_PADDING_X: f32 = 6.0;
const CELL_PADDING_Y: f32 = 8.0;

pub type Rgb3 = [f32; 3];

const DARK: Rgb3 = [0.173, 0.243, 0.314]; // #2C3E50
const SLATE: Rgb3 = [0.204, 0.286, 0.369]; // #34495E
const BLACK: Rgb3 = [0.0, 0.0, 0.0];
const GRID: Rgb3 = [0.867, 0.867, 0.867]; // #DDDDDD
const MUTED: Rgb3 = [0.5, 0.5, 0.5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    leading: f32,
    space_before: f32,
    space_after: f32,
    weight: Weight,
    color: Rgb3,
    align: Align,
}

const TITLE: TextStyle = TextStyle {
    size: 24.0,
    leading: 29.0,
    space_before: 0.0,
    space_after: 30.0,
    weight: Weight::Bold,
    color: DARK,
    align: Align::Center,
};

const SUBTITLE: TextStyle = TextStyle {
    size: 16.0,
    leading: 19.0,
    space_before: 0.0,
    space_after: 20.0,
    weight: Weight::Regular,
    color: SLATE,
    align: Align::Center,
};

const HEADING: TextStyle = TextStyle {
    size: 14.0,
    leading: 17.0,
    space_before: 20.0,
    space_after: 12.0,
    weight: Weight::Bold,
    color: DARK,
    align: Align::Left,
};

const BODY: TextStyle = TextStyle {
    size: 11.0,
    leading: 14.0,
    space_before: 0.0,
    space_after: 12.0,
    weight: Weight::Regular,
    color: BLACK,
    align: Align::Left,
};

const FOOTER_SIZE: f32 = 9.0;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        weight: Weight,
        color: Rgb3,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        color: Rgb3,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

pub fn render_pdf(document: &ReportDocument) -> Result<Vec<u8>, AppError> {
    let pages = layout(document);
    paint(&document.title, &pages)
}

pub fn layout(document: &ReportDocument) -> Vec<PageLayout> {
    let mut cursor = Cursor::new();

    for block in &document.blocks {
        match block {
            Block::Title(text) => cursor.paragraph(text, TITLE),
            Block::Subtitle(text) => cursor.paragraph(text, SUBTITLE),
            Block::Heading(text) => cursor.heading(text),
            Block::Paragraph(text) => cursor.paragraph(text, BODY),
            Block::KeyValue(rows) => {
                let rows: Vec<Vec<String>> = rows
                    .iter()
                    .map(|(key, value)| vec![key.clone(), value.clone()])
                    .collect();
                cursor.table(None, &rows, &[0.35, 0.65], true);
            }
            Block::Table { headers, rows } => {
                let share = 1.0 / headers.len().max(1) as f32;
                let widths = vec![share; headers.len().max(1)];
                cursor.table(Some(headers), rows, &widths, false);
            }
            Block::Spacer(points) => cursor.space(*points),
            Block::PageBreak => cursor.page_break(),
        }
    }

    cursor.finish()
}

struct Cursor {
    pages: Vec<PageLayout>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn page(&mut self) -> &mut PageLayout {
        // `pages` starts with one page and only grows
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn is_fresh_page(&self) -> bool {
        self.pages.last().is_none_or(|p| p.ops.is_empty()) && self.y >= PAGE_HEIGHT - MARGIN
    }

    fn remaining(&self) -> f32 {
        self.y - MARGIN
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn page_break(&mut self) {
        if !self.is_fresh_page() {
            self.new_page();
        }
    }

    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.is_fresh_page() {
            self.new_page();
        }
    }

    fn space(&mut self, points: f32) {
        if points >= self.remaining() {
            self.new_page();
        } else {
            self.y -= points;
        }
    }

    fn text(&mut self, text: String, x: f32, size: f32, weight: Weight, color: Rgb3) {
        let y = self.y - size;
        self.page().ops.push(DrawOp::Text {
            text,
            x,
            y,
            size,
            weight,
            color,
        });
    }

    fn paragraph(&mut self, text: &str, style: TextStyle) {
        let lines = wrap(&to_pdf_text(text), style.size, style.weight, CONTENT_WIDTH);
        if lines.is_empty() {
            return;
        }

        if !self.is_fresh_page() {
            self.space(style.space_before);
        }

        for line in lines {
            self.ensure(style.leading);
            let x = match style.align {
                Align::Left => MARGIN,
                Align::Center => {
                    MARGIN + (CONTENT_WIDTH - text_width(&line, style.size, style.weight)) / 2.0
                }
            };
            self.text(line, x, style.size, style.weight, style.color);
            self.y -= style.leading;
        }

        self.space(style.space_after);
    }

    fn heading(&mut self, text: &str) {
        // keep the heading on the same page as the first body line
        let needed = HEADING.space_before + HEADING.leading + HEADING.space_after + BODY.leading;
        self.ensure(needed);
        self.paragraph(text, HEADING);
    }

    fn table(
        &mut self,
        headers: Option<&Vec<String>>,
        rows: &[Vec<String>],
        widths: &[f32],
        bold_first_column: bool,
    ) {
        let columns: Vec<f32> = widths.iter().map(|share| share * CONTENT_WIDTH).collect();

        if let Some(headers) = headers {
            self.table_row(headers, &columns, |_| (Weight::Bold, DARK));
        }
        for row in rows {
            self.table_row(row, &columns, |column| {
                if bold_first_column && column == 0 {
                    (Weight::Bold, DARK)
                } else {
                    (Weight::Regular, BLACK)
                }
            });
        }

        self.space(BODY.space_after);
    }

    fn table_row(
        &mut self,
        cells: &[String],
        columns: &[f32],
        style: impl Fn(usize) -> (Weight, Rgb3),
    ) {
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(columns)
            .enumerate()
            .map(|(index, (cell, width))| {
                let (weight, _) = style(index);
                wrap(&to_pdf_text(cell), BODY.size, weight, width - 2.0 * CELL_PADDING_X)
            })
            .collect();

        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);

        // A row that fits on a page is moved whole; a taller one is split
        // across pages.
        let page_lines = lines_within(PAGE_HEIGHT - 2.0 * MARGIN);
        let mut start = 0;
        loop {
            let left = line_count - start;
            let fits = lines_within(self.remaining());
            let move_whole = start == 0 && left <= page_lines;
            if fits < left && (move_whole || fits == 0) && !self.is_fresh_page() {
                self.new_page();
                continue;
            }

            let take = left.min(fits.max(1));
            self.row_slice(&wrapped, columns, &style, start, take);
            start += take;
            if start >= line_count {
                break;
            }
            self.new_page();
        }
    }

    fn row_slice(
        &mut self,
        wrapped: &[Vec<String>],
        columns: &[f32],
        style: &impl Fn(usize) -> (Weight, Rgb3),
        start: usize,
        take: usize,
    ) {
        let top = self.y;
        self.rule(top, GRID);

        let mut x = MARGIN;
        for (index, (lines, width)) in wrapped.iter().zip(columns).enumerate() {
            let (weight, color) = style(index);
            self.y = top - CELL_PADDING_Y;
            for line in lines.iter().skip(start).take(take) {
                self.text(line.clone(), x + CELL_PADDING_X, BODY.size, weight, color);
                self.y -= BODY.leading;
            }
            x += width;
        }

        self.y = top - (take as f32 * BODY.leading + 2.0 * CELL_PADDING_Y);
        self.rule(self.y, GRID);
    }

    fn rule(&mut self, y: f32, color: Rgb3) {
        self.page().ops.push(DrawOp::Rule {
            x1: MARGIN,
            x2: PAGE_WIDTH - MARGIN,
            y,
            color,
        });
    }

    fn finish(mut self) -> Vec<PageLayout> {
        if self.pages.len() > 1 && self.pages.last().is_some_and(|p| p.ops.is_empty()) {
            self.pages.pop();
        }

        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            let label = format!("Page {} of {total}", index + 1);
            let x = PAGE_WIDTH - MARGIN - text_width(&label, FOOTER_SIZE, Weight::Regular);
            page.ops.push(DrawOp::Text {
                text: label,
                x,
                y: MARGIN / 2.0,
                size: FOOTER_SIZE,
                weight: Weight::Regular,
                color: MUTED,
            });
        }
        self.pages
    }
}

/// Table lines that fit in `height` points, cell padding included.
fn lines_within(height: f32) -> usize {
    ((height - 2.0 * CELL_PADDING_Y) / BODY.leading).floor().max(0.0) as usize
}

/// Approximate Helvetica advance widths, in thousandths of an em.
fn char_width(c: char) -> f32 {
    match c {
        '\'' => 191.0,
        'i' | 'j' | 'l' => 222.0,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'I' | 'f' | 't' | '/' => 278.0,
        'r' | '-' | '(' | ')' => 333.0,
        'm' | 'M' => 833.0,
        'W' => 944.0,
        'w' => 722.0,
        '0'..='9' => 556.0,
        'A'..='Z' => 667.0,
        _ => 556.0,
    }
}

pub fn text_width(text: &str, size: f32, weight: Weight) -> f32 {
    let factor = match weight {
        Weight::Regular => 1.0,
        Weight::Bold => 1.06,
    };
    text.chars().map(char_width).sum::<f32>() * size * factor / 1000.0
}

/// Greedy word wrap. Leading spaces indent the first line; words wider than
/// the line are split.
pub fn wrap(text: &str, size: f32, weight: Weight, max_width: f32) -> Vec<String> {
    let indent: String = text.chars().take_while(|c| *c == ' ').collect();
    let mut lines = Vec::new();
    let mut current = indent;

    for word in text.split_whitespace() {
        let candidate = if current.trim().is_empty() {
            format!("{current}{word}")
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, size, weight) <= max_width {
            current = candidate;
            continue;
        }

        if !current.trim().is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        let mut piece = String::new();
        for c in word.chars() {
            piece.push(c);
            if text_width(&piece, size, weight) > max_width && piece.chars().count() > 1 {
                piece.pop();
                lines.push(std::mem::take(&mut piece));
                piece.push(c);
            }
        }
        current = piece;
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }
    lines
}

/// Maps text onto the characters the built-in fonts can encode.
pub fn to_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{25CF}' | '\u{25AA}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\t' | '\u{00A0}' | '\u{2002}'..='\u{200A}' => out.push(' '),
            '\u{200B}' | '\u{FEFF}' => {}
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            '\u{00A1}'..='\u{00FF}' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn mm(points: f32) -> Mm {
    Mm(points * MM_PER_PT)
}

fn color(rgb: Rgb3) -> Color {
    Color::Rgb(Rgb::new(rgb[0], rgb[1], rgb[2], None))
}

fn render_error(err: printpdf::Error) -> AppError {
    AppError::Render(err.to_string())
}

fn paint(title: &str, pages: &[PageLayout]) -> Result<Vec<u8>, AppError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(to_pdf_text(title), mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Page 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_error)?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(
                mm(PAGE_WIDTH),
                mm(PAGE_HEIGHT),
                format!("Page {}", index + 1),
            );
            doc.get_page(page_index).get_layer(layer_index)
        };
        paint_page(&layer, page, &regular, &bold);
    }

    doc.save_to_bytes().map_err(render_error)
}

fn paint_page(
    layer: &PdfLayerReference,
    page: &PageLayout,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    for op in &page.ops {
        match op {
            DrawOp::Text {
                text,
                x,
                y,
                size,
                weight,
                color: rgb,
            } => {
                let font = match weight {
                    Weight::Regular => regular,
                    Weight::Bold => bold,
                };
                layer.set_fill_color(color(*rgb));
                layer.use_text(text.as_str(), *size, mm(*x), mm(*y), font);
            }
            DrawOp::Rule {
                x1,
                x2,
                y,
                color: rgb,
            } => {
                layer.set_outline_color(color(*rgb));
                layer.set_outline_thickness(0.5);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(mm(*x1), mm(*y)), false),
                        (Point::new(mm(*x2), mm(*y)), false),
                    ],
                    is_closed: false,
                });
            }
        }
    }
}

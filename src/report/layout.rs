use super::fonts::{fit_text, measure, sanitize, FontFace, FontSet};
use super::{Sheet, Variant};
use crate::attendance::Status;
use crate::config::LayoutConfig;
use crate::error::AppError;
use crate::roster::Roster;

/// A4 portrait, in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

pub const ROLL_WIDTH: f32 = 56.0;
pub const STATUS_WIDTH: f32 = 64.0;
pub const SIGNATURE_WIDTH: f32 = 170.0;
pub const MIN_TEXT_WIDTH: f32 = 72.0;

const FOOTER_RESERVE: f32 = 20.0;
const BLOCK_GAP: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub header_font_size: f32,
    pub title_font_size: f32,
    pub padding: f32,
    pub row_height: f32,
}

impl Geometry {
    pub fn from_config(cfg: &LayoutConfig) -> Geometry {
        Geometry {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: cfg.margin_mm * POINTS_PER_MM,
            font_size: cfg.font_size,
            header_font_size: cfg.header_font_size,
            title_font_size: cfg.title_font_size,
            padding: cfg.padding,
            row_height: cfg.row_height,
        }
    }

    pub fn usable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    fn content_bottom(&self) -> f32 {
        self.page_height - self.margin - FOOTER_RESERVE
    }

    fn line_height(&self, size: f32) -> f32 {
        size * 1.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey {
    RollNo,
    Name,
    Group,
    Signature,
    Status,
}

impl ColumnKey {
    pub fn label(self) -> &'static str {
        match self {
            ColumnKey::RollNo => "Roll No.",
            ColumnKey::Name => "Name",
            ColumnKey::Group => "Group",
            ColumnKey::Signature => "Signature",
            ColumnKey::Status => "Status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub key: ColumnKey,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub columns: Vec<Column>,
}

impl ColumnLayout {
    pub fn width_of(&self, key: ColumnKey) -> Option<f32> {
        self.columns.iter().find(|c| c.key == key).map(|c| c.width)
    }

    pub fn total(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    fn set_width(&mut self, key: ColumnKey, width: f32) {
        if let Some(c) = self.columns.iter_mut().find(|c| c.key == key) {
            c.width = width;
        }
    }
}

/// `max(header, widest cell) + padding`, header in bold and cells in regular.
pub fn text_column_width<'a, I>(header: &str, cells: I, fonts: &FontSet, g: &Geometry) -> f32
where
    I: IntoIterator<Item = &'a str>,
{
    let header_width = measure(header, &fonts.bold, g.header_font_size);
    cells
        .into_iter()
        .map(|c| measure(c, &fonts.regular, g.font_size))
        .fold(header_width, f32::max)
        + g.padding
}

pub fn column_layout(
    roster: &Roster,
    variant: Variant,
    fonts: &FontSet,
    g: &Geometry,
) -> Result<ColumnLayout, AppError> {
    if roster.is_empty() {
        return Err(AppError::EmptyRoster);
    }
    let students = roster.students();
    let name = text_column_width(
        ColumnKey::Name.label(),
        students.iter().map(|s| s.name.as_str()),
        fonts,
        g,
    );
    let group = text_column_width(
        ColumnKey::Group.label(),
        students.iter().map(|s| s.group_name.as_str()),
        fonts,
        g,
    );
    let rolls: Vec<String> = roster.roll_numbers().map(|r| r.to_string()).collect();
    let roll = text_column_width(
        ColumnKey::RollNo.label(),
        rolls.iter().map(String::as_str),
        fonts,
        g,
    )
    .max(ROLL_WIDTH);
    let col = |key, width| Column { key, width };
    let usable = g.usable_width();

    let mut layout = match variant {
        Variant::PlainList => ColumnLayout {
            columns: vec![
                col(ColumnKey::RollNo, roll),
                col(ColumnKey::Name, name),
                col(ColumnKey::Group, group),
            ],
        },
        Variant::SignatureSheet => ColumnLayout {
            columns: vec![
                col(ColumnKey::RollNo, roll),
                col(ColumnKey::Name, name),
                col(ColumnKey::Group, group),
                col(ColumnKey::Signature, SIGNATURE_WIDTH),
            ],
        },
        Variant::AttendanceSheet => {
            // Name takes whatever the other columns leave.
            let fixed = roll + STATUS_WIDTH;
            let group = group.min((usable - fixed - MIN_TEXT_WIDTH).max(0.0));
            ColumnLayout {
                columns: vec![
                    col(ColumnKey::RollNo, roll),
                    col(ColumnKey::Name, usable - fixed - group),
                    col(ColumnKey::Group, group),
                    col(ColumnKey::Status, STATUS_WIDTH),
                ],
            }
        }
    };

    // Content wider than the page: give up name width first, then group, then
    // the blank signature space. Roll numbers are never squeezed.
    for key in [ColumnKey::Name, ColumnKey::Group, ColumnKey::Signature] {
        let excess = layout.total() - usable;
        if excess <= 0.0 {
            break;
        }
        if let Some(w) = layout.width_of(key) {
            layout.set_width(key, (w - excess).max(MIN_TEXT_WIDTH.min(w)));
        }
    }
    Ok(layout)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    HeaderBand,
    AbsentRow,
}

/// Coordinates are points from the top-left corner; `y` of text is its baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: Weight,
        text: String,
    },
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        shade: Shade,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub columns: ColumnLayout,
    pub pages: Vec<PageLayout>,
}

struct Row {
    cells: Vec<String>,
    absent: bool,
}

struct Cursor<'a> {
    g: &'a Geometry,
    fonts: &'a FontSet,
    pages: Vec<PageLayout>,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(g: &'a Geometry, fonts: &'a FontSet) -> Cursor<'a> {
        Cursor {
            g,
            fonts,
            pages: vec![PageLayout::default()],
            y: g.margin,
        }
    }

    fn page(&mut self) -> &mut PageLayout {
        if self.pages.is_empty() {
            self.pages.push(PageLayout::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= self.g.content_bottom()
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = self.g.margin;
    }

    fn face(&self, weight: Weight) -> &'a FontFace {
        match weight {
            Weight::Regular => &self.fonts.regular,
            Weight::Bold => &self.fonts.bold,
        }
    }

    fn line(&mut self, text: &str, size: f32, weight: Weight) {
        let height = self.g.line_height(size);
        if !self.fits(height) {
            self.new_page();
        }
        let face = self.face(weight);
        let text = fit_text(text, face, size, self.g.usable_width());
        let (x, y) = (self.g.margin, self.y + size);
        self.page().ops.push(DrawOp::Text {
            x,
            y,
            size,
            weight,
            text,
        });
        self.y += height;
    }

    fn gap(&mut self, height: f32) {
        self.y += height;
    }

    fn table_row(&mut self, columns: &ColumnLayout, cells: &[String], weight: Weight, shade: Option<Shade>) {
        let g = self.g;
        let size = match weight {
            Weight::Bold => g.header_font_size,
            Weight::Regular => g.font_size,
        };
        let face = self.face(weight);
        let top = self.y;
        let height = g.row_height;
        let total = columns.total();
        let mut ops = Vec::with_capacity(columns.columns.len() * 2 + 3);

        if let Some(shade) = shade {
            ops.push(DrawOp::Fill {
                x: g.margin,
                y: top,
                width: total,
                height,
                shade,
            });
        }
        ops.push(DrawOp::Rule {
            x1: g.margin,
            y1: top,
            x2: g.margin + total,
            y2: top,
        });
        ops.push(DrawOp::Rule {
            x1: g.margin,
            y1: top + height,
            x2: g.margin + total,
            y2: top + height,
        });

        let baseline = top + height / 2.0 + size * 0.35;
        let mut x = g.margin;
        for (i, col) in columns.columns.iter().enumerate() {
            ops.push(DrawOp::Rule {
                x1: x,
                y1: top,
                x2: x,
                y2: top + height,
            });
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            if !cell.is_empty() {
                let text = if col.key == ColumnKey::RollNo {
                    sanitize(cell, face)
                } else {
                    fit_text(cell, face, size, (col.width - g.padding).max(0.0))
                };
                ops.push(DrawOp::Text {
                    x: x + g.padding / 2.0,
                    y: baseline,
                    size,
                    weight,
                    text,
                });
            }
            x += col.width;
        }
        ops.push(DrawOp::Rule {
            x1: x,
            y1: top,
            x2: x,
            y2: top + height,
        });

        self.page().ops.extend(ops);
        self.y += height;
    }

    fn table(&mut self, columns: &ColumnLayout, rows: &[Row]) {
        let header: Vec<String> = columns
            .columns
            .iter()
            .map(|c| c.key.label().to_string())
            .collect();
        let needed = 2.0 * self.g.row_height;
        if !self.fits(needed) {
            self.new_page();
        }
        self.table_row(columns, &header, Weight::Bold, Some(Shade::HeaderBand));
        for row in rows {
            if !self.fits(self.g.row_height) {
                self.new_page();
                self.table_row(columns, &header, Weight::Bold, Some(Shade::HeaderBand));
            }
            let shade = row.absent.then_some(Shade::AbsentRow);
            self.table_row(columns, &row.cells, Weight::Regular, shade);
        }
    }

    fn finish(mut self) -> Vec<PageLayout> {
        let count = self.pages.len();
        let g = self.g;
        let size = g.font_size * 0.8;
        let face = &self.fonts.regular;
        for (i, page) in self.pages.iter_mut().enumerate() {
            let text = sanitize(&format!("Page {} of {}", i + 1, count), face);
            let width = measure(&text, face, size);
            page.ops.push(DrawOp::Text {
                x: g.page_width - g.margin - width,
                y: g.page_height - g.margin,
                size,
                weight: Weight::Regular,
                text,
            });
        }
        self.pages
    }
}

fn build_rows(roster: &Roster, sheet: Sheet<'_>) -> Result<Vec<Row>, AppError> {
    roster
        .students()
        .iter()
        .map(|s| {
            let mut cells = vec![s.roll_no.to_string(), s.name.clone(), s.group_name.clone()];
            let mut absent = false;
            match sheet {
                Sheet::PlainList => {}
                Sheet::SignatureSheet => cells.push(String::new()),
                Sheet::Attendance { reconciliation, .. } => {
                    let status = reconciliation.status_of(s.roll_no).ok_or_else(|| {
                        AppError::RenderFailed(format!(
                            "no attendance mark for roll number {}",
                            s.roll_no
                        ))
                    })?;
                    absent = status == Status::Absent;
                    cells.push(status.label().to_string());
                }
            }
            Ok(Row { cells, absent })
        })
        .collect()
}

/// Lays out the whole sheet. Rows keep roster order.
pub fn layout_sheet(
    roster: &Roster,
    sheet: Sheet<'_>,
    fonts: &FontSet,
    g: &Geometry,
    title: &str,
) -> Result<SheetLayout, AppError> {
    let columns = column_layout(roster, sheet.variant(), fonts, g)?;
    let rows = build_rows(roster, sheet)?;

    let mut cur = Cursor::new(g, fonts);
    cur.line(title, g.title_font_size, Weight::Bold);
    cur.line(sheet.variant().heading(), g.font_size + 2.0, Weight::Regular);

    if let Sheet::Attendance { course, .. } = sheet {
        cur.gap(BLOCK_GAP / 2.0);
        cur.line(&format!("Date: {}", course.display_date()), g.font_size, Weight::Regular);
        cur.line(&format!("Course: {}", course.heading()), g.font_size, Weight::Regular);
        cur.line(
            &format!("Classes Held: {}", course.num_classes_held),
            g.font_size,
            Weight::Regular,
        );
    }
    cur.gap(BLOCK_GAP);
    cur.table(&columns, &rows);

    if let Sheet::Attendance { reconciliation, .. } = sheet {
        let present = reconciliation.present_count();
        let absent = roster.len() - present;
        let needed = g.line_height(g.header_font_size) + 3.0 * g.line_height(g.font_size) + BLOCK_GAP;
        if !cur.fits(needed) {
            cur.new_page();
        } else {
            cur.gap(BLOCK_GAP);
        }
        cur.line("Summary", g.header_font_size, Weight::Bold);
        cur.line(&format!("Present: {}", present), g.font_size, Weight::Regular);
        cur.line(&format!("Absent: {}", absent), g.font_size, Weight::Regular);
        cur.line(
            &format!("Total Students: {}", roster.len()),
            g.font_size,
            Weight::Regular,
        );
    }

    Ok(SheetLayout {
        columns,
        pages: cur.finish(),
    })
}

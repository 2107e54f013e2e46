use super::fonts::{Builtin, FontFace, FontSet};
use super::layout::{DrawOp, Geometry, Shade, SheetLayout, Weight, POINTS_PER_MM};
use crate::error::AppError;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, Point, Rect,
    Rgb,
};
use std::io::Cursor;

const LAYER_NAME: &str = "Sheet";
const RULE_THICKNESS: f32 = 0.5;

fn mm(points: f32) -> Mm {
    Mm(points / POINTS_PER_MM)
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn shade_color(shade: Shade) -> Color {
    match shade {
        Shade::HeaderBand => rgb(0.86, 0.86, 0.86),
        Shade::AbsentRow => rgb(1.0, 0.85, 0.85),
    }
}

fn add_font(doc: &PdfDocumentReference, face: &FontFace) -> Result<IndirectFontRef, AppError> {
    let font = match face {
        FontFace::Builtin(Builtin::Helvetica) => doc.add_builtin_font(BuiltinFont::Helvetica),
        FontFace::Builtin(Builtin::HelveticaBold) => {
            doc.add_builtin_font(BuiltinFont::HelveticaBold)
        }
        FontFace::TrueType(t) => doc.add_external_font(Cursor::new(t.data().to_vec())),
    };
    font.map_err(|e| match face {
        FontFace::TrueType(t) => AppError::RenderFailed(format!("cannot embed {}: {}", t.path, e)),
        FontFace::Builtin(_) => AppError::RenderFailed(format!("cannot embed font: {}", e)),
    })
}

/// Emits the laid-out pages. Layout coordinates are flipped to PDF's
/// bottom-left origin here and nowhere else.
pub fn write_pdf(
    sheet: &SheetLayout,
    fonts: &FontSet,
    g: &Geometry,
    doc_title: &str,
) -> Result<Vec<u8>, AppError> {
    if sheet.pages.is_empty() {
        return Err(AppError::RenderFailed("nothing to render".to_string()));
    }
    let (width, height) = (mm(g.page_width), mm(g.page_height));
    let (doc, first_page, first_layer) = PdfDocument::new(doc_title, width, height, LAYER_NAME);
    let regular = add_font(&doc, &fonts.regular)?;
    let bold = add_font(&doc, &fonts.bold)?;
    let black = rgb(0.0, 0.0, 0.0);

    for (i, page) in sheet.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, LAYER_NAME)
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        layer.set_outline_color(black.clone());
        layer.set_outline_thickness(RULE_THICKNESS);
        layer.set_fill_color(black.clone());

        for op in &page.ops {
            match op {
                DrawOp::Text {
                    x,
                    y,
                    size,
                    weight,
                    text,
                } => {
                    let font = match weight {
                        Weight::Regular => &regular,
                        Weight::Bold => &bold,
                    };
                    layer.use_text(text.as_str(), *size, mm(*x), mm(g.page_height - *y), font);
                }
                DrawOp::Fill {
                    x,
                    y,
                    width,
                    height,
                    shade,
                } => {
                    layer.set_fill_color(shade_color(*shade));
                    let rect = Rect::new(
                        mm(*x),
                        mm(g.page_height - *y - *height),
                        mm(*x + *width),
                        mm(g.page_height - *y),
                    )
                    .with_mode(PaintMode::Fill);
                    layer.add_rect(rect);
                    layer.set_fill_color(black.clone());
                }
                DrawOp::Rule { x1, y1, x2, y2 } => {
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(mm(*x1), mm(g.page_height - *y1)), false),
                            (Point::new(mm(*x2), mm(g.page_height - *y2)), false),
                        ],
                        is_closed: false,
                    });
                }
            }
        }
    }

    doc.save_to_bytes().map_err(AppError::from)
}

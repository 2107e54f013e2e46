use crate::config::FontConfig;
use crate::error::AppError;
use std::path::Path;

/// Drawn in place of any character the active face cannot represent.
pub const PLACEHOLDER: char = '?';

/// Advance widths (1/1000 em) for printable ASCII 0x20..=0x7E, WinAnsi encoding.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Helvetica,
    HelveticaBold,
}

impl Builtin {
    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            Builtin::Helvetica => &HELVETICA_WIDTHS,
            Builtin::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    fn covers(self, c: char) -> bool {
        matches!(c, ' '..='~') || (matches!(c, '\u{C0}'..='\u{FF}') && c != '×' && c != '÷')
    }

    fn advance(self, c: char) -> u16 {
        let table = self.ascii_widths();
        let ascii = |a: char| table[(a as usize) - 0x20];
        match c {
            ' '..='~' => ascii(c),
            'Æ' => 1000,
            'æ' => 889,
            'ß' => 611,
            'ì'..='ï' => 278,
            // Remaining Latin-1 letters share their base glyph's advance.
            _ => match fold_latin1(c) {
                Some(base) => ascii(base),
                None => ascii(PLACEHOLDER),
            },
        }
    }
}

fn fold_latin1(c: char) -> Option<char> {
    let base = match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ð' => 'D',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'Þ' => 'P',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ð' | 'ò'..='ö' | 'ø' => 'o',
        'ñ' => 'n',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'þ' => 'p',
        _ => return None,
    };
    Some(base)
}

#[derive(Debug, Clone)]
pub struct TrueTypeFace {
    pub path: String,
    data: Vec<u8>,
    units_per_em: f32,
}

impl TrueTypeFace {
    pub fn load(path: &Path) -> Result<TrueTypeFace, AppError> {
        let resource = path.to_string_lossy().to_string();
        let data = std::fs::read(path).map_err(|e| AppError::RenderResourceMissing {
            resource: resource.clone(),
            message: e.to_string(),
        })?;
        let units_per_em = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| AppError::RenderResourceMissing {
                resource: resource.clone(),
                message: format!("not a usable TrueType font: {}", e),
            })?
            .units_per_em();
        if units_per_em == 0 {
            return Err(AppError::RenderResourceMissing {
                resource,
                message: "font reports zero units per em".to_string(),
            });
        }
        Ok(TrueTypeFace {
            path: resource,
            data,
            units_per_em: units_per_em as f32,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, 0).ok()
    }
}

#[derive(Debug, Clone)]
pub enum FontFace {
    Builtin(Builtin),
    TrueType(TrueTypeFace),
}

impl FontFace {
    pub fn covers(&self, c: char) -> bool {
        match self {
            FontFace::Builtin(b) => b.covers(c),
            FontFace::TrueType(t) => c == ' ' || t.face().and_then(|f| f.glyph_index(c)).is_some(),
        }
    }
}

/// The regular and bold faces used by one render.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: FontFace,
    pub bold: FontFace,
}

impl FontSet {
    pub fn builtin() -> FontSet {
        FontSet {
            regular: FontFace::Builtin(Builtin::Helvetica),
            bold: FontFace::Builtin(Builtin::HelveticaBold),
        }
    }

    pub fn load(cfg: &FontConfig) -> Result<FontSet, AppError> {
        let Some(regular_path) = cfg.regular.as_deref() else {
            return Ok(FontSet::builtin());
        };
        let regular = TrueTypeFace::load(regular_path)?;
        let bold = match cfg.bold.as_deref() {
            Some(p) => TrueTypeFace::load(p)?,
            None => regular.clone(),
        };
        Ok(FontSet {
            regular: FontFace::TrueType(regular),
            bold: FontFace::TrueType(bold),
        })
    }
}

/// Replaces control characters with spaces and anything the face cannot draw
/// with [`PLACEHOLDER`].
pub fn sanitize(text: &str, face: &FontFace) -> String {
    text.chars().map(|c| sanitize_char(c, face)).collect()
}

fn sanitize_char(c: char, face: &FontFace) -> char {
    if c.is_control() {
        ' '
    } else if face.covers(c) {
        c
    } else {
        PLACEHOLDER
    }
}

/// Width of `text` in points when set in `face` at `size` points.
pub fn measure(text: &str, face: &FontFace, size: f32) -> f32 {
    match face {
        FontFace::Builtin(b) => {
            let units: u32 = text
                .chars()
                .map(|c| b.advance(sanitize_char(c, face)) as u32)
                .sum();
            units as f32 * size / 1000.0
        }
        FontFace::TrueType(t) => {
            let Some(f) = t.face() else { return 0.0 };
            let units: u32 = text
                .chars()
                .map(|c| {
                    let c = sanitize_char(c, face);
                    f.glyph_index(c)
                        .or_else(|| f.glyph_index(PLACEHOLDER))
                        .and_then(|g| f.glyph_hor_advance(g))
                        .unwrap_or(0) as u32
                })
                .sum();
            units as f32 * size / t.units_per_em
        }
    }
}

/// Sanitizes `text` and, if it is wider than `max_width`, cuts it and appends
/// an ellipsis so the result fits.
pub fn fit_text(text: &str, face: &FontFace, size: f32, max_width: f32) -> String {
    let clean = sanitize(text, face);
    if measure(&clean, face, size) <= max_width {
        return clean;
    }
    const ELLIPSIS: &str = "...";
    let budget = max_width - measure(ELLIPSIS, face, size);
    if budget < 0.0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0.0;
    let mut buf = [0u8; 4];
    for c in clean.chars() {
        let w = measure(c.encode_utf8(&mut buf), face, size);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ELLIPSIS);
    out
}

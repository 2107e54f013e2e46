//! Roster and attendance sheets as paginated PDF documents.
//!
//! Rendering runs in three steps: load the font set, lay the sheet out as
//! per-page drawing operations, then emit those operations through printpdf.
//! A failure at any step returns an error and no bytes.

pub mod fonts;
pub mod layout;
pub mod pdf;

use crate::attendance::Reconciliation;
use crate::config::Config;
use crate::course::CourseContext;
use crate::error::AppError;
use crate::roster::Roster;
use anyhow::Context;
use log::debug;
use std::io::Write;
use std::path::Path;

pub const MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    PlainList,
    SignatureSheet,
    AttendanceSheet,
}

impl Variant {
    pub const ALL: [Variant; 3] = [
        Variant::PlainList,
        Variant::SignatureSheet,
        Variant::AttendanceSheet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::PlainList => "plainList",
            Variant::SignatureSheet => "signatureSheet",
            Variant::AttendanceSheet => "attendanceSheet",
        }
    }

    pub fn parse(raw: &str) -> Option<Variant> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(t))
    }

    pub fn heading(self) -> &'static str {
        match self {
            Variant::PlainList => "Student List",
            Variant::SignatureSheet => "Signature Sheet",
            Variant::AttendanceSheet => "Attendance Sheet",
        }
    }

    pub fn default_filename(self) -> &'static str {
        match self {
            Variant::PlainList => "student_list.pdf",
            Variant::SignatureSheet => "signature_sheet.pdf",
            Variant::AttendanceSheet => "attendance_sheet.pdf",
        }
    }
}

/// What to print next to the roster.
#[derive(Debug, Clone, Copy)]
pub enum Sheet<'a> {
    PlainList,
    SignatureSheet,
    Attendance {
        reconciliation: &'a Reconciliation,
        course: &'a CourseContext,
    },
}

impl Sheet<'_> {
    pub fn variant(&self) -> Variant {
        match self {
            Sheet::PlainList => Variant::PlainList,
            Sheet::SignatureSheet => Variant::SignatureSheet,
            Sheet::Attendance { .. } => Variant::AttendanceSheet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

pub fn render(roster: &Roster, sheet: Sheet<'_>, cfg: &Config) -> Result<RenderedDocument, AppError> {
    if roster.is_empty() {
        return Err(AppError::EmptyRoster);
    }
    let fonts = fonts::FontSet::load(&cfg.font)?;
    let geometry = layout::Geometry::from_config(&cfg.layout);
    let laid_out = layout::layout_sheet(roster, sheet, &fonts, &geometry, &cfg.title)?;
    debug!(
        "column widths: {:?}",
        laid_out
            .columns
            .columns
            .iter()
            .map(|c| (c.key.label(), c.width))
            .collect::<Vec<_>>()
    );
    let doc_title = format!("{} - {}", cfg.title, sheet.variant().heading());
    let bytes = pdf::write_pdf(&laid_out, &fonts, &geometry, &doc_title)?;
    debug!(
        "rendered {} ({} pages, {} bytes)",
        sheet.variant().as_str(),
        laid_out.pages.len(),
        bytes.len()
    );
    Ok(RenderedDocument {
        bytes,
        page_count: laid_out.pages.len(),
    })
}

/// Writes to a temporary sibling first so a failed write never leaves a
/// truncated document at `out_path`.
pub fn write_document(out_path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    let mut tmp_name = out_path.as_os_str().to_os_string();
    tmp_name.push(".writing");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    let result = (|| -> anyhow::Result<()> {
        let mut f = std::fs::File::create(&tmp_path).with_context(|| {
            format!("failed to create output file {}", tmp_path.to_string_lossy())
        })?;
        f.write_all(bytes).context("failed to write document")?;
        f.sync_all().context("failed to flush document")?;
        std::fs::rename(&tmp_path, out_path).with_context(|| {
            format!("failed to move document to {}", out_path.to_string_lossy())
        })?;
        Ok(())
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "rollcall.json";
pub const ENV_WORKSPACE: &str = "ROLLCALL_WORKSPACE";
pub const ENV_FONT: &str = "ROLLCALL_FONT";

/// Keeps enough of an A4 page for every table's minimum column widths.
pub const MAX_MARGIN_MM: f32 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub database_file: String,
    pub title: String,
    pub font: FontConfig,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_file: "students.db".to_string(),
            title: "Class Roster".to_string(),
            font: FontConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

/// TrueType font files. When `regular` is unset the built-in Helvetica faces
/// are used; `bold` falls back to `regular`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontConfig {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}

/// Sizes in points, except `margin_mm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub font_size: f32,
    pub header_font_size: f32,
    pub title_font_size: f32,
    pub padding: f32,
    pub margin_mm: f32,
    pub row_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            header_font_size: 10.0,
            title_font_size: 14.0,
            padding: 6.0,
            margin_mm: 10.0,
            row_height: 18.0,
        }
    }
}

impl Config {
    /// Reads `<workspace>/rollcall.json` if present, then applies env overrides.
    pub fn load(workspace: &Path) -> anyhow::Result<Config> {
        let path = workspace.join(CONFIG_FILE);
        let mut cfg = if path.is_file() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
            serde_json::from_str::<Config>(&text)
                .with_context(|| format!("{} is invalid", path.to_string_lossy()))?
        } else {
            Config::default()
        };
        cfg.apply_env(std::env::var_os(ENV_FONT).map(PathBuf::from));

        // Relative font paths are resolved against the workspace.
        for p in [&mut cfg.font.regular, &mut cfg.font.bold].into_iter().flatten() {
            if p.is_relative() {
                *p = workspace.join(&*p);
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self, font: Option<PathBuf>) {
        if let Some(p) = font {
            if !p.as_os_str().is_empty() {
                self.font.regular = Some(p);
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database_file.trim().is_empty() {
            anyhow::bail!("databaseFile must not be empty");
        }
        let l = &self.layout;
        for (name, v) in [
            ("fontSize", l.font_size),
            ("headerFontSize", l.header_font_size),
            ("titleFontSize", l.title_font_size),
            ("rowHeight", l.row_height),
        ] {
            if !(v.is_finite() && v > 0.0) {
                anyhow::bail!("layout.{} must be positive", name);
            }
        }
        if !(l.padding.is_finite() && l.padding >= 0.0) {
            anyhow::bail!("layout.padding must not be negative");
        }
        if !(l.margin_mm.is_finite() && (0.0..=MAX_MARGIN_MM).contains(&l.margin_mm)) {
            anyhow::bail!("layout.marginMm must be between 0 and {}", MAX_MARGIN_MM);
        }
        Ok(())
    }

    pub fn database_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.database_file)
    }
}

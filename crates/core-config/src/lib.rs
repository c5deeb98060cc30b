//! Configuration loading and parsing for the rendering core.
//!
//! Parses `veneer.toml` (or an override path supplied by the host) into
//! render/scroll/cursor/gutter settings. Unknown fields are ignored (TOML
//! deserialization tolerance) so the file format can grow without breaking
//! older cores. Autoscroll margins are stored raw and clamped against the
//! live viewport in `Config::apply_context`: opposing margins must never
//! overlap, so the effective margin is at most half the visible extent. The
//! raw values are retained for re-clamping after viewport changes.

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};
use tracing::info;

/// Static facts about the host platform that change input interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformTraits {
    /// Whether holding shift should swap wheel deltaX/deltaY in this core.
    /// False where the OS convention already delivers swapped deltas.
    pub shift_swaps_wheel_axes: bool,
    /// Whether the add-caret click modifier is the meta key (cmd) rather
    /// than ctrl.
    pub add_caret_with_meta: bool,
}

impl PlatformTraits {
    pub const fn macos() -> Self {
        Self {
            shift_swaps_wheel_axes: false,
            add_caret_with_meta: true,
        }
    }

    pub const fn windows() -> Self {
        Self {
            shift_swaps_wheel_axes: true,
            add_caret_with_meta: false,
        }
    }

    pub const fn linux() -> Self {
        Self {
            shift_swaps_wheel_axes: true,
            add_caret_with_meta: false,
        }
    }
}

impl Default for PlatformTraits {
    fn default() -> Self {
        Self::linux()
    }
}

/// Viewport facts needed to clamp configured values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigContext {
    /// Visible text rows.
    pub viewport_rows: usize,
    /// Visible text columns in base character widths.
    pub viewport_columns: usize,
}

impl ConfigContext {
    pub const fn new(viewport_rows: usize, viewport_columns: usize) -> Self {
        Self {
            viewport_rows,
            viewport_columns,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RenderConfig {
    #[serde(default = "RenderConfig::default_rows_per_tile")]
    pub rows_per_tile: usize,
    /// Run flushes inline instead of deferring to the driver tick.
    #[serde(default)]
    pub synchronous: bool,
}

impl RenderConfig {
    fn default_rows_per_tile() -> usize {
        6
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            rows_per_tile: Self::default_rows_per_tile(),
            synchronous: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MarginConfig {
    /// Vertical autoscroll margin in rows.
    #[serde(default = "MarginConfig::default_vertical")]
    pub vertical: usize,
    /// Horizontal autoscroll margin in base character widths.
    #[serde(default = "MarginConfig::default_horizontal")]
    pub horizontal: usize,
}

impl MarginConfig {
    fn default_vertical() -> usize {
        2
    }
    fn default_horizontal() -> usize {
        6
    }
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            vertical: Self::default_vertical(),
            horizontal: Self::default_horizontal(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScrollConfig {
    #[serde(default)]
    pub margin: MarginConfig,
    /// Multiplier applied to raw wheel deltas.
    #[serde(default = "ScrollConfig::default_sensitivity")]
    pub sensitivity: f64,
}

impl ScrollConfig {
    fn default_sensitivity() -> f64 {
        0.4
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            margin: MarginConfig::default(),
            sensitivity: Self::default_sensitivity(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct CursorConfig {
    /// Render carets even when their backing selection is non-empty.
    #[serde(default)]
    pub show_on_selection: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct GutterConfig {
    #[serde(default = "GutterConfig::default_line_numbers")]
    pub line_numbers: bool,
}

impl GutterConfig {
    fn default_line_numbers() -> bool {
        true
    }
}

impl Default for GutterConfig {
    fn default() -> Self {
        Self {
            line_numbers: true,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub gutter: GutterConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Parsed (or default) file data; margins here are raw, pre-clamp.
    pub file: ConfigFile,
    /// Margins clamped against the last applied context.
    pub effective_vertical_margin: usize,
    pub effective_horizontal_margin: usize,
}

impl Config {
    /// Load from an explicit path, or the default location, or fall back to
    /// defaults when no file exists. A present-but-invalid file is an error;
    /// silent fallback there would hide typos.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate: Option<PathBuf> = path.map(Path::to_path_buf).or_else(default_path);
        let file = match candidate {
            Some(p) if p.exists() => {
                let raw = fs::read_to_string(&p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                let parsed: ConfigFile = toml::from_str(&raw)
                    .with_context(|| format!("parsing config {}", p.display()))?;
                info!(path = %p.display(), "loaded config");
                parsed
            }
            _ => {
                info!("no config file; using defaults");
                ConfigFile::default()
            }
        };
        let mut config = Self {
            file,
            effective_vertical_margin: 0,
            effective_horizontal_margin: 0,
        };
        // Until a context arrives, effective margins equal the raw values.
        config.effective_vertical_margin = config.file.scroll.margin.vertical;
        config.effective_horizontal_margin = config.file.scroll.margin.horizontal;
        Ok(config)
    }

    /// Re-clamp margins for the current viewport. Effective margins never
    /// exceed half the visible extent.
    pub fn apply_context(&mut self, ctx: ConfigContext) {
        self.effective_vertical_margin = self
            .file
            .scroll
            .margin
            .vertical
            .min(ctx.viewport_rows / 2);
        self.effective_horizontal_margin = self
            .file
            .scroll
            .margin
            .horizontal
            .min(ctx.viewport_columns / 2);
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("veneer").join("veneer.toml"))
}

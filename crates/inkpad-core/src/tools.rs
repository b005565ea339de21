//! Tool system: tool kinds, per-tool stroke defaults and the active-tool manager.

use crate::eraser::EraserMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Pencil,
    Highlighter,
    Brush,
    Calligraphy,
    Eraser,
    Tape,
    /// Freehand stroke that is recognized into a primitive on release.
    Shape,
    Square,
    Rectangle,
    Circle,
    Triangle,
    Oval,
    Text,
    Sticky,
    Comment,
    Fill,
}

impl ToolKind {
    /// Tools producing text-like objects.
    pub fn is_text_like(self) -> bool {
        matches!(self, ToolKind::Text | ToolKind::Sticky | ToolKind::Comment)
    }

    /// Explicit primitive tools (not auto-shape).
    pub fn is_explicit_shape(self) -> bool {
        matches!(
            self,
            ToolKind::Square | ToolKind::Rectangle | ToolKind::Circle | ToolKind::Triangle | ToolKind::Oval
        )
    }

    /// Tools whose pan gesture accumulates a live point stream.
    pub fn draws(self) -> bool {
        !self.is_text_like() && !matches!(self, ToolKind::Eraser | ToolKind::Fill)
    }
}

/// Stroke defaults applied to every point of a new freehand stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolDefaults {
    pub pressure: f64,
    pub thickness: f64,
    pub stabilization: f64,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            pressure: 0.5,
            thickness: 2.0,
            stabilization: 0.0,
        }
    }
}

/// Errors raised while loading tool settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {tool:?}: {field}")]
    InvalidValue { tool: ToolKind, field: &'static str },
}

/// Caller-supplied tool configuration shared by all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Per-tool stroke defaults.
    pub defaults: HashMap<ToolKind, ToolDefaults>,
    /// Rendered stroke width per tool.
    pub widths: HashMap<ToolKind, f64>,
    /// Diameter of the eraser.
    pub eraser_size: f64,
    /// Eraser mode selected when a page is created.
    pub eraser_mode: EraserMode,
}

impl Default for ToolSettings {
    fn default() -> Self {
        let defaults = HashMap::from([
            (ToolKind::Pen, ToolDefaults { pressure: 0.5, thickness: 2.0, stabilization: 0.3 }),
            (ToolKind::Pencil, ToolDefaults { pressure: 0.3, thickness: 1.5, stabilization: 0.1 }),
            (ToolKind::Highlighter, ToolDefaults { pressure: 0.5, thickness: 12.0, stabilization: 0.5 }),
            (ToolKind::Brush, ToolDefaults { pressure: 0.7, thickness: 6.0, stabilization: 0.4 }),
            (ToolKind::Calligraphy, ToolDefaults { pressure: 0.6, thickness: 4.0, stabilization: 0.6 }),
            (ToolKind::Tape, ToolDefaults { pressure: 0.5, thickness: 16.0, stabilization: 0.0 }),
        ]);
        let widths = HashMap::from([
            (ToolKind::Pen, 2.0),
            (ToolKind::Pencil, 1.5),
            (ToolKind::Highlighter, 12.0),
            (ToolKind::Brush, 6.0),
            (ToolKind::Calligraphy, 4.0),
            (ToolKind::Tape, 16.0),
            (ToolKind::Shape, 2.0),
            (ToolKind::Eraser, 6.0),
        ]);
        Self {
            defaults,
            widths,
            eraser_size: 6.0,
            eraser_mode: EraserMode::default(),
        }
    }
}

impl ToolSettings {
    /// Fallback stroke width for tools without an entry.
    pub const DEFAULT_WIDTH: f64 = 2.0;

    /// Parse settings from JSON; absent entries keep the built-in defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let parsed: ToolSettings = serde_json::from_str(json)?;
        let mut settings = Self::default();
        settings.defaults.extend(parsed.defaults);
        settings.widths.extend(parsed.widths);
        settings.eraser_size = parsed.eraser_size;
        settings.eraser_mode = parsed.eraser_mode;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (&tool, d) in &self.defaults {
            if !(0.0..=1.0).contains(&d.pressure) {
                return Err(ConfigError::InvalidValue { tool, field: "pressure" });
            }
            if !(d.thickness.is_finite() && d.thickness > 0.0) {
                return Err(ConfigError::InvalidValue { tool, field: "thickness" });
            }
            if !d.stabilization.is_finite() {
                return Err(ConfigError::InvalidValue { tool, field: "stabilization" });
            }
        }
        for (&tool, &w) in &self.widths {
            if !(w.is_finite() && w > 0.0) {
                return Err(ConfigError::InvalidValue { tool, field: "width" });
            }
        }
        if !(self.eraser_size.is_finite() && self.eraser_size > 0.0) {
            return Err(ConfigError::InvalidValue { tool: ToolKind::Eraser, field: "eraser_size" });
        }
        Ok(())
    }

    /// Stroke defaults consulted when a new freehand stroke begins.
    pub fn defaults_for(&self, tool: ToolKind) -> ToolDefaults {
        self.defaults.get(&tool).copied().unwrap_or_default()
    }

    /// Width for strokes drawn with `tool`.
    pub fn width_for(&self, tool: ToolKind) -> f64 {
        self.widths.get(&tool).copied().unwrap_or(Self::DEFAULT_WIDTH)
    }
}

/// Manages the active tool and its per-page settings.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Color applied to new objects.
    pub current_color: String,
    pub eraser_mode: EraserMode,
    pub eraser_size: f64,
    settings: Arc<ToolSettings>,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(Arc::new(ToolSettings::default()))
    }
}

impl ToolManager {
    /// Create a tool manager backed by shared settings.
    pub fn new(settings: Arc<ToolSettings>) -> Self {
        Self {
            current_tool: ToolKind::default(),
            current_color: "#000000".to_string(),
            eraser_mode: settings.eraser_mode,
            eraser_size: settings.eraser_size,
            settings,
        }
    }

    /// Set the current tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        log::debug!("tool: {:?} -> {:?}", self.current_tool, tool);
        self.current_tool = tool;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.current_color = color.into();
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Width of new strokes with the current tool.
    pub fn current_width(&self) -> f64 {
        self.settings.width_for(self.current_tool)
    }
}

//! Renderer read contract.
//!
//! A renderer receives a [`RenderFrame`] once per frame and must not mutate
//! anything it borrows. [`build_commands`] lowers the frame into backend
//! independent [`DrawCommand`]s.

use crate::geometry::{alpha_blend, path_from_points};
use crate::objects::{Drawable, DrawableObject, SerializableColor, TextStyle};
use crate::tools::{ToolKind, ToolSettings};
use kurbo::{BezPath, Point, Rect, Shape};
use peniko::Color;
use std::collections::HashMap;
use std::sync::Arc;

/// Alpha applied to pencil strokes.
pub const PENCIL_ALPHA: f64 = 0.6;

/// Alpha applied to highlighter strokes.
pub const HIGHLIGHTER_ALPHA: f64 = 0.35;

/// Everything a renderer reads for one frame.
#[derive(Debug, Clone)]
pub struct RenderFrame<'a> {
    /// Store snapshot, back to front.
    pub strokes: Arc<Vec<DrawableObject>>,
    /// Points of the gesture in progress, as published by the last frame tick.
    pub live_points: &'a [Point],
    pub active_tool: ToolKind,
    pub active_color: &'a str,
    pub widths: &'a HashMap<ToolKind, f64>,
}

/// A backend-independent drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Stroke { path: BezPath, color: Color, width: f64 },
    Fill { path: BezPath, color: Color },
    Text { anchor: Point, text: String, style: TextStyle, color: Color },
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Draw one command.
    fn draw(&mut self, command: &DrawCommand);

    /// Draw a whole frame.
    fn render(&mut self, frame: &RenderFrame<'_>) {
        for command in build_commands(frame) {
            self.draw(&command);
        }
    }
}

/// Parse `#hex` or `rgba(r, g, b, a)` colors.
pub fn parse_color(css: &str) -> Option<Color> {
    if let Some(color) = SerializableColor::from_hex(css) {
        return Some(color.into());
    }
    let inner = css.trim().strip_prefix("rgba(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let r = parts.next()?.parse::<u8>().ok()?;
    let g = parts.next()?.parse::<u8>().ok()?;
    let b = parts.next()?.parse::<u8>().ok()?;
    let a = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let a = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
    Some(Color::from_rgba8(r, g, b, a))
}

fn resolve(css: &str) -> Color {
    parse_color(css).unwrap_or_else(|| {
        log::warn!("unparsable color {css:?}, drawing black");
        SerializableColor::black().into()
    })
}

fn rect_path(rect: Rect) -> BezPath {
    rect.to_path(0.1)
}

/// Lower a frame into draw commands, back to front, live gesture last.
pub fn build_commands(frame: &RenderFrame<'_>) -> Vec<DrawCommand> {
    let mut commands = Vec::with_capacity(frame.strokes.len() + 1);

    for object in frame.strokes.iter() {
        match object {
            DrawableObject::Freehand(stroke) => {
                let color = match stroke.tool {
                    ToolKind::Eraser => continue,
                    ToolKind::Pencil => resolve(&alpha_blend(&stroke.color, PENCIL_ALPHA)),
                    ToolKind::Highlighter => resolve(&alpha_blend(&stroke.color, HIGHLIGHTER_ALPHA)),
                    _ => resolve(&stroke.color),
                };
                let path = stroke.to_path();
                if let Some(fill) = &stroke.fill {
                    let mut closed = path.clone();
                    closed.close_path();
                    commands.push(DrawCommand::Fill { path: closed, color: resolve(fill) });
                }
                commands.push(DrawCommand::Stroke {
                    path,
                    color: color.multiply_alpha(stroke.opacity.clamp(0.0, 1.0) as f32),
                    width: stroke.width,
                });
            }
            DrawableObject::Shape(shape) => {
                let path = shape.shape.to_path();
                if let Some(fill) = &shape.fill {
                    commands.push(DrawCommand::Fill { path: path.clone(), color: resolve(fill) });
                }
                commands.push(DrawCommand::Stroke { path, color: resolve(&shape.color), width: shape.width });
            }
            DrawableObject::Text(text) => {
                if let Some(background) = &text.style.background_color {
                    commands.push(DrawCommand::Fill {
                        path: rect_path(text.layout_rect()),
                        color: resolve(background),
                    });
                }
                commands.push(DrawCommand::Text {
                    anchor: text.anchor(),
                    text: text.text.clone(),
                    style: text.style.clone(),
                    color: resolve(&text.style.color),
                });
            }
        }
    }

    if frame.active_tool.draws() && !frame.live_points.is_empty() {
        let width = frame
            .widths
            .get(&frame.active_tool)
            .copied()
            .unwrap_or(ToolSettings::DEFAULT_WIDTH);
        commands.push(DrawCommand::Stroke {
            path: path_from_points(frame.live_points.iter().copied()),
            color: resolve(frame.active_color),
            width,
        });
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{FreehandStroke, ShapeGeometry, ShapeKind, ShapeObject, StrokePoint, TextObject};
    use crate::tools::ToolDefaults;

    #[derive(Default)]
    struct Recorder {
        commands: Vec<DrawCommand>,
    }

    impl Renderer for Recorder {
        fn draw(&mut self, command: &DrawCommand) {
            self.commands.push(command.clone());
        }
    }

    fn stroke(tool: ToolKind) -> DrawableObject {
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 10.0)]
            .into_iter()
            .map(|p| StrokePoint::new(p, ToolDefaults::default()))
            .collect();
        FreehandStroke::from_points(tool, "#ff0000", 2.0, points).into()
    }

    fn frame_of<'a>(objects: Vec<DrawableObject>, live: &'a [Point], widths: &'a HashMap<ToolKind, f64>) -> RenderFrame<'a> {
        RenderFrame {
            strokes: Arc::new(objects),
            live_points: live,
            active_tool: ToolKind::Pen,
            active_color: "#0000ff",
            widths,
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000"), Some(Color::from_rgba8(255, 0, 0, 255)));
        assert_eq!(parse_color("rgba(255, 0, 0, 0.5)"), Some(Color::from_rgba8(255, 0, 0, 128)));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("rgba(1, 2, 3)"), None);
    }

    #[test]
    fn test_pencil_is_translucent() {
        let widths = HashMap::new();
        let commands = build_commands(&frame_of(vec![stroke(ToolKind::Pencil)], &[], &widths));
        let DrawCommand::Stroke { color, .. } = &commands[0] else {
            panic!("expected a stroke");
        };
        assert_eq!(color.to_rgba8().a, 153);
    }

    #[test]
    fn test_eraser_strokes_are_not_drawn() {
        let widths = HashMap::new();
        let commands = build_commands(&frame_of(vec![stroke(ToolKind::Eraser)], &[], &widths));
        assert!(commands.is_empty());
    }

    #[test]
    fn test_order_and_live_stroke() {
        let widths = HashMap::from([(ToolKind::Pen, 5.0)]);
        let mut sticky = TextObject::new(ToolKind::Sticky, Point::new(0.0, 50.0), "hi".into(), TextStyle::default());
        sticky.style.background_color = Some("#ffff00".into());
        let mut shape = ShapeObject::new(
            ToolKind::Circle,
            ShapeKind::Circle,
            ShapeGeometry::Circle { cx: 5.0, cy: 5.0, r: 5.0 },
            2.0,
            "#000000",
        );
        shape.fill = Some("#00ff00".into());
        let live = [Point::new(0.0, 0.0), Point::new(20.0, 0.0)];

        let mut recorder = Recorder::default();
        recorder.render(&frame_of(vec![stroke(ToolKind::Pen), shape.into(), sticky.into()], &live, &widths));

        let kinds: Vec<&str> = recorder
            .commands
            .iter()
            .map(|c| match c {
                DrawCommand::Stroke { .. } => "stroke",
                DrawCommand::Fill { .. } => "fill",
                DrawCommand::Text { .. } => "text",
            })
            .collect();
        assert_eq!(kinds, ["stroke", "fill", "stroke", "fill", "text", "stroke"]);
        let Some(DrawCommand::Stroke { width, .. }) = recorder.commands.last() else {
            panic!("expected the live stroke last");
        };
        assert!((width - 5.0).abs() < f64::EPSILON);
    }
}

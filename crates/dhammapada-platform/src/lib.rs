//! Host abstraction traits so `dhammapada-core` stays runtime-agnostic.
//!
//! A host (terminal, OS screensaver bundle, test harness) owns the view
//! lifecycle and the drawing surface. The core only ever talks to these
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Linear blend from `self` towards `other`; `t` is clamped to `[0, 1]`.
    pub fn blend(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: Rgb,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(color: Rgb, alpha: f32) -> Self {
        Self {
            color,
            alpha: alpha.clamp(0.0, 1.0),
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Input forwarded by the host while the saver is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostInput {
    /// Request to move on to the next item.
    Advance,
    /// Any other key or pointer activity.
    Activity,
}

/// Drawing target provided by the host. Coordinates are in the host's own
/// units (cells for a terminal, points for a window).
pub trait Surface {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }
    fn bounds(&self) -> ScreenRect;
    fn begin_frame(&mut self, background: Rgb) -> Result<()>;
    fn draw_text(&mut self, x: i32, y: i32, text: &str, style: TextStyle) -> Result<()>;
    fn draw_point(&mut self, x: i32, y: i32, color: Rgb, brightness: f32) -> Result<()>;
    fn end_frame(&mut self) -> Result<()>;
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Lifecycle contract a screensaver host drives: start, one call per frame,
/// stop.
pub trait ScreenSaverView {
    fn start_animation(&mut self, bounds: ScreenRect) -> Result<()>;
    fn animate_one_frame(&mut self, surface: &mut dyn Surface) -> Result<()>;
    /// Returns `true` when this call released live resources.
    fn stop_animation(&mut self) -> Result<bool>;
    fn resize(&mut self, _bounds: ScreenRect) -> Result<()> {
        Ok(())
    }
    /// Returns `true` if the view consumed the input; the host dismisses the
    /// saver otherwise.
    fn handle_input(&mut self, _input: HostInput) -> bool {
        false
    }
    fn animation_interval(&self) -> Duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        let a = Rgb(10, 20, 30);
        let b = Rgb(110, 220, 130);
        assert_eq!(a.blend(b, 0.0), a);
        assert_eq!(a.blend(b, 1.0), b);
        assert_eq!(a.blend(b, 0.5), Rgb(60, 120, 80));
        assert_eq!(a.blend(b, 7.0), b);
    }

    #[test]
    fn text_style_clamps_alpha() {
        assert_eq!(TextStyle::new(Rgb::WHITE, 1.5).alpha, 1.0);
        assert_eq!(TextStyle::new(Rgb::WHITE, -0.5).alpha, 0.0);
    }

    #[test]
    fn rect_center_and_empty() {
        let r = ScreenRect::new(80, 24);
        assert_eq!(r.center(), (40, 12));
        assert!(!r.is_empty());
        assert!(ScreenRect::new(0, 24).is_empty());
    }
}

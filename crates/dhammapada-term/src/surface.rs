use std::io::Write;

use crossterm::style::{
    Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::{cursor, queue, terminal};
use dhammapada_platform::{Result, Rgb, ScreenRect, Surface, TextStyle};

/// Below this opacity text is not drawn at all.
const MIN_VISIBLE_ALPHA: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Rgb,
    bold: bool,
}

impl Cell {
    fn blank(background: Rgb) -> Self {
        Self {
            ch: ' ',
            fg: background,
            bold: false,
        }
    }
}

/// Character-cell surface. Each frame is composed into a buffer and only the
/// cells that changed since the previous frame are written out.
pub struct TermSurface<W: Write> {
    out: W,
    width: u16,
    height: u16,
    background: Rgb,
    cells: Vec<Cell>,
    shown: Vec<Cell>,
    full_redraw: bool,
}

impl<W: Write> TermSurface<W> {
    pub fn new(out: W, width: u16, height: u16) -> Self {
        let background = Rgb::BLACK;
        let len = width as usize * height as usize;
        Self {
            out,
            width,
            height,
            background,
            cells: vec![Cell::blank(background); len],
            shown: vec![Cell::blank(background); len],
            full_redraw: true,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = width as usize * height as usize;
        self.cells = vec![Cell::blank(self.background); len];
        self.shown = vec![Cell::blank(self.background); len];
        self.full_redraw = true;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Character at `(x, y)` in the composed buffer.
    pub fn char_at(&self, x: u16, y: u16) -> Option<char> {
        self.index(x as i32, y as i32).map(|i| self.cells[i].ch)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn flush_changes(&mut self) -> std::io::Result<()> {
        let bg = to_color(self.background);
        queue!(self.out, SetBackgroundColor(bg))?;
        if self.full_redraw {
            queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
        }

        let width = self.width as usize;
        let mut last: Option<(usize, Rgb, bool)> = None;
        for (i, cell) in self.cells.iter().enumerate() {
            if !self.full_redraw && self.shown[i] == *cell {
                continue;
            }
            if self.full_redraw && cell.ch == ' ' {
                continue;
            }
            let (x, y) = ((i % width) as u16, (i / width) as u16);
            // Skip the cursor move when this cell follows the previous write.
            if last.map(|(j, _, _)| j + 1) != Some(i) || x == 0 {
                queue!(self.out, cursor::MoveTo(x, y))?;
            }
            if last.map(|(_, fg, bold)| (fg, bold)) != Some((cell.fg, cell.bold)) {
                let weight = if cell.bold {
                    Attribute::Bold
                } else {
                    Attribute::NormalIntensity
                };
                queue!(
                    self.out,
                    SetAttribute(weight),
                    SetForegroundColor(to_color(cell.fg))
                )?;
            }
            queue!(self.out, Print(cell.ch))?;
            last = Some((i, cell.fg, cell.bold));
        }

        self.shown.copy_from_slice(&self.cells);
        self.full_redraw = false;
        self.out.flush()
    }
}

impl<W: Write> Surface for TermSurface<W> {
    fn bounds(&self) -> ScreenRect {
        ScreenRect::new(self.width as u32, self.height as u32)
    }

    fn begin_frame(&mut self, background: Rgb) -> Result<()> {
        if background != self.background {
            self.background = background;
            self.full_redraw = true;
        }
        self.cells.fill(Cell::blank(background));
        Ok(())
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, style: TextStyle) -> Result<()> {
        if style.alpha < MIN_VISIBLE_ALPHA {
            return Ok(());
        }
        let fg = self.background.blend(style.color, style.alpha);
        for (offset, ch) in text.chars().enumerate() {
            if let Some(i) = self.index(x + offset as i32, y) {
                self.cells[i] = Cell {
                    ch,
                    fg,
                    bold: style.bold,
                };
            }
        }
        Ok(())
    }

    fn draw_point(&mut self, x: i32, y: i32, color: Rgb, brightness: f32) -> Result<()> {
        let Some(ch) = glyph_for(brightness) else {
            return Ok(());
        };
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Cell {
                ch,
                fg: self.background.blend(color, brightness),
                bold: false,
            };
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.flush_changes()?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            crossterm::style::ResetColor
        )?;
        self.out.flush()?;
        Ok(())
    }
}

fn glyph_for(brightness: f32) -> Option<char> {
    match brightness {
        b if b < 0.15 => None,
        b if b < 0.45 => Some('\u{b7}'),
        b if b < 0.75 => Some('\u{2022}'),
        _ => Some('*'),
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.0,
        g: rgb.1,
        b: rgb.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> TermSurface<Vec<u8>> {
        TermSurface::new(Vec::new(), 10, 3)
    }

    fn output(s: TermSurface<Vec<u8>>) -> String {
        String::from_utf8(s.into_inner()).unwrap()
    }

    #[test]
    fn text_is_clipped_to_bounds() {
        let mut s = surface();
        s.begin_frame(Rgb::BLACK).unwrap();
        s.draw_text(7, 1, "hello", TextStyle::new(Rgb::WHITE, 1.0)).unwrap();
        s.draw_text(-2, 0, "abc", TextStyle::new(Rgb::WHITE, 1.0)).unwrap();
        s.draw_text(0, 5, "gone", TextStyle::new(Rgb::WHITE, 1.0)).unwrap();
        assert_eq!(s.char_at(7, 1), Some('h'));
        assert_eq!(s.char_at(9, 1), Some('l'));
        assert_eq!(s.char_at(0, 0), Some('c'));
        assert_eq!(s.char_at(10, 1), None);
    }

    #[test]
    fn invisible_text_is_skipped() {
        let mut s = surface();
        s.begin_frame(Rgb::BLACK).unwrap();
        s.draw_text(0, 0, "x", TextStyle::new(Rgb::WHITE, 0.0)).unwrap();
        assert_eq!(s.char_at(0, 0), Some(' '));
    }

    #[test]
    fn points_map_brightness_to_glyphs() {
        assert_eq!(glyph_for(0.0), None);
        assert_eq!(glyph_for(0.3), Some('\u{b7}'));
        assert_eq!(glyph_for(0.6), Some('\u{2022}'));
        assert_eq!(glyph_for(1.0), Some('*'));

        let mut s = surface();
        s.begin_frame(Rgb::BLACK).unwrap();
        s.draw_point(2, 2, Rgb::WHITE, 0.9).unwrap();
        s.draw_point(99, 2, Rgb::WHITE, 0.9).unwrap();
        assert_eq!(s.char_at(2, 2), Some('*'));
    }

    #[test]
    fn unchanged_frames_write_no_cells() {
        let mut s = surface();
        s.begin_frame(Rgb::BLACK).unwrap();
        s.draw_text(0, 0, "verse", TextStyle::new(Rgb::WHITE, 1.0)).unwrap();
        s.end_frame().unwrap();
        let first_len = s.out.len();
        assert!(output_contains(&s.out, "verse"));

        s.begin_frame(Rgb::BLACK).unwrap();
        s.draw_text(0, 0, "verse", TextStyle::new(Rgb::WHITE, 1.0)).unwrap();
        s.end_frame().unwrap();
        let second = &s.out[first_len..];
        assert!(!output_contains(second, "verse"));
        assert!(!output_contains(second, "v"));

        s.begin_frame(Rgb::BLACK).unwrap();
        s.draw_text(0, 0, "vers!", TextStyle::new(Rgb::WHITE, 1.0)).unwrap();
        s.end_frame().unwrap();
        assert!(output(s).ends_with('!'));
    }

    #[test]
    fn resize_forces_full_redraw() {
        let mut s = surface();
        s.begin_frame(Rgb::BLACK).unwrap();
        s.end_frame().unwrap();
        s.resize(20, 4);
        assert_eq!(s.bounds(), ScreenRect::new(20, 4));
        s.begin_frame(Rgb::BLACK).unwrap();
        s.draw_text(15, 3, "z", TextStyle::new(Rgb::WHITE, 1.0)).unwrap();
        assert_eq!(s.char_at(15, 3), Some('z'));
    }

    fn output_contains(bytes: &[u8], needle: &str) -> bool {
        String::from_utf8_lossy(bytes).contains(needle)
    }
}

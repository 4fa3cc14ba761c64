//! Drawing surface abstraction
//!
//! The view only needs to draw a row of text segments, paint a highlight
//! block, and ask for the terminal size. `TerminalSurface` does that with
//! crossterm; `MemorySurface` keeps a character grid in memory and counts
//! what was drawn.

use std::io;

/// Foreground treatment of a text segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Title,
    Summary,
    Notice,
}

/// State color block drawn over the highlight column of a body row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Offline,
    Running,
    Neutral,
}

impl Highlight {
    /// Picks the class for a record value. "Offline" wins over "Run".
    pub fn for_value(value: &str) -> Highlight {
        if value.contains("Offline") {
            Highlight::Offline
        } else if value.contains("Run") {
            Highlight::Running
        } else {
            Highlight::Neutral
        }
    }
}

/// Text starting at a given column of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub col: u16,
    pub text: String,
    pub tone: Tone,
}

impl Segment {
    /// Builds a segment cut so that it does not run past `cols`.
    pub fn fit<S: AsRef<str>>(col: usize, text: S, tone: Tone, cols: usize) -> Segment {
        let room = cols.saturating_sub(col);
        Segment {
            col: col.min(u16::MAX as usize) as u16,
            text: text.as_ref().chars().take(room).collect(),
            tone,
        }
    }
}

/// A full screen row. Rows are compared as a whole to decide whether they
/// need to be redrawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub segments: Vec<Segment>,
    pub highlight: Option<Highlight>,
}

impl Line {
    pub fn new(segments: Vec<Segment>) -> Line {
        Line {
            segments,
            highlight: None,
        }
    }

    pub fn blank() -> Line {
        Line::default()
    }
}

pub trait Surface {
    /// Current size as `(cols, rows)`.
    fn size(&mut self) -> io::Result<(u16, u16)>;

    /// Reinitializes the surface and clears it entirely.
    fn reset(&mut self) -> io::Result<()>;

    /// Clears `row` and draws the segments of `line` on it.
    fn draw_line(&mut self, row: u16, line: &Line) -> io::Result<()>;

    /// Paints a `width` wide block of the highlight color at `row`, `col`.
    fn highlight(&mut self, row: u16, col: u16, width: u16, class: Highlight) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        (**self).size()
    }

    fn reset(&mut self) -> io::Result<()> {
        (**self).reset()
    }

    fn draw_line(&mut self, row: u16, line: &Line) -> io::Result<()> {
        (**self).draw_line(row, line)
    }

    fn highlight(&mut self, row: u16, col: u16, width: u16, class: Highlight) -> io::Result<()> {
        (**self).highlight(row, col, width, class)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// In-memory surface, mainly for tests and headless runs.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    cols: u16,
    rows: u16,
    screen: Vec<Vec<char>>,
    highlights: Vec<Option<Highlight>>,
    /// Number of `draw_line` calls so far.
    pub lines_drawn: usize,
    pub resets: usize,
    pub flushes: usize,
}

impl MemorySurface {
    pub fn new(cols: u16, rows: u16) -> MemorySurface {
        let mut surface = MemorySurface {
            cols,
            rows,
            screen: Vec::new(),
            highlights: Vec::new(),
            lines_drawn: 0,
            resets: 0,
            flushes: 0,
        };
        surface.blank();
        surface
    }

    /// Changes the reported size, as a terminal resize would. The grid is
    /// rebuilt on the next `reset`.
    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    fn blank(&mut self) {
        self.screen = vec![vec![' '; self.cols as usize]; self.rows as usize];
        self.highlights = vec![None; self.rows as usize];
    }

    /// Text of `row`, with trailing spaces removed.
    pub fn row_text(&self, row: usize) -> String {
        self.screen
            .get(row)
            .map(|r| r.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    pub fn highlight_at(&self, row: usize) -> Option<Highlight> {
        self.highlights.get(row).copied().flatten()
    }
}

impl Surface for MemorySurface {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        Ok((self.cols, self.rows))
    }

    fn reset(&mut self) -> io::Result<()> {
        self.blank();
        self.resets += 1;
        Ok(())
    }

    fn draw_line(&mut self, row: u16, line: &Line) -> io::Result<()> {
        self.lines_drawn += 1;
        let row = row as usize;
        let cells = match self.screen.get_mut(row) {
            Some(cells) => cells,
            None => return Ok(()),
        };
        cells.iter_mut().for_each(|c| *c = ' ');
        for segment in &line.segments {
            for (i, ch) in segment.text.chars().enumerate() {
                if let Some(cell) = cells.get_mut(segment.col as usize + i) {
                    *cell = ch;
                }
            }
        }
        self.highlights[row] = None;
        Ok(())
    }

    fn highlight(&mut self, row: u16, col: u16, width: u16, class: Highlight) -> io::Result<()> {
        let row = row as usize;
        if let Some(cells) = self.screen.get_mut(row) {
            for cell in cells.iter_mut().skip(col as usize).take(width as usize) {
                *cell = ' ';
            }
            self.highlights[row] = Some(class);
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_classes() {
        assert_eq!(Highlight::for_value("Offline"), Highlight::Offline);
        assert_eq!(Highlight::for_value("Run Offline"), Highlight::Offline);
        assert_eq!(Highlight::for_value("00:19:34 Running"), Highlight::Running);
        assert_eq!(Highlight::for_value("No Activities"), Highlight::Neutral);
    }

    #[test]
    fn segment_is_clipped_to_width() {
        let seg = Segment::fit(6, "Page 1 of 2", Tone::Plain, 10);
        assert_eq!(seg.text, "Page");
        assert_eq!(Segment::fit(12, "x", Tone::Plain, 10).text, "");
    }

    #[test]
    fn memory_surface_overlays_segments() {
        let mut surface = MemorySurface::new(20, 2);
        let line = Line::new(vec![
            Segment::fit(0, "left", Tone::Plain, 20),
            Segment::fit(15, "right", Tone::Title, 20),
        ]);
        surface.draw_line(1, &line).unwrap();
        surface.highlight(1, 2, 2, Highlight::Running).unwrap();
        assert_eq!(surface.row_text(1), "le             right");
        assert_eq!(surface.highlight_at(1), Some(Highlight::Running));
        assert_eq!(surface.lines_drawn, 1);

        // Out of range rows are ignored.
        surface.draw_line(5, &line).unwrap();
        assert_eq!(surface.row_text(5), "");
    }
}

//! crossterm backed drawing surface.

use super::surface::{Highlight, Line, Surface, Tone};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, terminal, ExecutableCommand, QueueableCommand};
use std::io::{self, Write};

fn tone_color(tone: Tone) -> Option<Color> {
    match tone {
        Tone::Plain => None,
        Tone::Title => Some(Color::Yellow),
        Tone::Summary => Some(Color::Green),
        Tone::Notice => Some(Color::Red),
    }
}

fn highlight_color(class: Highlight) -> Color {
    match class {
        Highlight::Offline => Color::Red,
        Highlight::Running => Color::Green,
        Highlight::Neutral => Color::Cyan,
    }
}

/// Surface drawing to a terminal through crossterm commands. Output is
/// queued and only written out on `flush`.
pub struct TerminalSurface<W: Write = io::Stdout> {
    out: W,
}

impl TerminalSurface<io::Stdout> {
    /// Puts the terminal in raw mode on the alternate screen.
    pub fn setup() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        out.execute(terminal::EnterAlternateScreen)?;
        out.execute(cursor::Hide)?;
        Ok(TerminalSurface { out })
    }

    /// Puts the terminal back the way it was. Safe to call from a panic
    /// hook, and more than once.
    pub fn restore() {
        let mut out = io::stdout();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = out.flush();
    }

    pub fn teardown(&mut self) {
        let _ = self.out.flush();
        TerminalSurface::restore();
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Wraps an arbitrary writer, without touching terminal modes.
    pub fn new(out: W) -> Self {
        TerminalSurface { out }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn reset(&mut self) -> io::Result<()> {
        self.out.queue(ResetColor)?;
        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        self.out.queue(cursor::Hide)?;
        self.out.flush()
    }

    fn draw_line(&mut self, row: u16, line: &Line) -> io::Result<()> {
        self.out.queue(cursor::MoveTo(0, row))?;
        self.out
            .queue(terminal::Clear(terminal::ClearType::CurrentLine))?;
        for segment in &line.segments {
            if segment.text.is_empty() {
                continue;
            }
            self.out.queue(cursor::MoveTo(segment.col, row))?;
            match tone_color(segment.tone) {
                Some(color) => {
                    self.out.queue(SetForegroundColor(color))?;
                    self.out.queue(Print(&segment.text))?;
                    self.out.queue(ResetColor)?;
                }
                None => {
                    self.out.queue(Print(&segment.text))?;
                }
            }
        }
        Ok(())
    }

    fn highlight(&mut self, row: u16, col: u16, width: u16, class: Highlight) -> io::Result<()> {
        self.out.queue(cursor::MoveTo(col, row))?;
        self.out
            .queue(SetBackgroundColor(highlight_color(class)))?;
        self.out.queue(Print(" ".repeat(width as usize)))?;
        self.out.queue(ResetColor)?;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

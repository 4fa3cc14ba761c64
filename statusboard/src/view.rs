//! Paginated status view
//!
//! The screen is laid out as:
//! - row 0: status clock, centered title, `Page p of n`;
//! - row 1: current activity, paging key hint;
//! - row 2: blank;
//! - body: one record per row, `rows - 6` of them;
//! - a blank row, then the channelizer and detector summaries, the latter
//!   with the detector frequency range on its right when there is one.
//!
//! The view remembers what it last drew on every row and only redraws rows
//! whose content changed. A resize, or a page change, drops that memory
//! and forces a full repaint.

mod surface;
mod terminal;

pub use surface::{Highlight, Line, MemorySurface, Segment, Surface, Tone};
pub use terminal::TerminalSurface;

use crate::config::Config;
use crate::input::ResizeFlag;
use crate::status::{Record, Snapshot};
use std::io;
use tracing::{debug, trace};

/// Title, activity and spacer rows.
pub const HEADER_ROWS: usize = 3;
/// Spacer and the two summary rows.
pub const FOOTER_ROWS: usize = 3;

static TOO_SMALL: &str = "Terminal too small";

/// Rows left for records on a terminal `rows` high.
pub fn body_rows_for(rows: u16) -> usize {
    (rows as usize).saturating_sub(HEADER_ROWS + FOOTER_ROWS)
}

/// What a single `render` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Rows redrawn, header and footer included.
    pub rows_drawn: usize,
    /// Rows redrawn within the body region.
    pub body_rows_drawn: usize,
    pub page: usize,
    pub page_count: usize,
}

pub struct PaginatedView {
    /// 1-based, clamped to the page count on every render.
    page: usize,
    /// Last drawn content of each screen row.
    cache: Vec<Option<Line>>,
    /// `(cols, rows)`, known after the first render.
    size: Option<(u16, u16)>,
    full_redraw: bool,
    resize: ResizeFlag,
    title: String,
    key_width: usize,
    prev_key: char,
    next_key: char,
    highlight_col: u16,
    highlight_width: u16,
}

impl PaginatedView {
    pub fn new(config: &Config, resize: ResizeFlag) -> PaginatedView {
        PaginatedView {
            page: 1,
            cache: Vec::new(),
            size: None,
            full_redraw: true,
            resize,
            title: config.title.clone(),
            key_width: config.key_width,
            prev_key: config.prev_page_key,
            next_key: config.next_page_key,
            highlight_col: config.highlight_col,
            highlight_width: config.highlight_width,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> Option<(u16, u16)> {
        self.size
    }

    /// Body rows for the current terminal size; zero before the first render.
    pub fn body_rows(&self) -> usize {
        self.size.map(|(_, rows)| body_rows_for(rows)).unwrap_or(0)
    }

    /// Handles a key press. Returns true if the key is one of the paging
    /// keys, in which case the caller should repaint right away.
    pub fn handle_key(&mut self, key: char, snapshot: &Snapshot) -> bool {
        let page_count = snapshot.page_count_for(self.body_rows());
        let target = if key == self.prev_key {
            self.page.saturating_sub(1).max(1)
        } else if key == self.next_key {
            (self.page + 1).min(page_count)
        } else {
            trace!("Ignoring key {:?}", key);
            return false;
        };
        if target != self.page {
            debug!("Page {} -> {} of {}", self.page, target, page_count);
            self.page = target;
            self.full_redraw = true;
        }
        true
    }

    /// Draws `snapshot` on `surface`, redrawing only rows that changed
    /// since the previous call.
    pub fn render<S: Surface>(&mut self, snapshot: &Snapshot, surface: &mut S) -> io::Result<RenderStats> {
        if let Some((cols, rows)) = self.resize.take() {
            debug!("Terminal resized to {}x{}", cols, rows);
            surface.reset()?;
            self.size = Some((cols, rows));
            self.full_redraw = true;
        }
        let (cols, rows) = match self.size {
            Some(size) => size,
            None => {
                let size = surface.size()?;
                surface.reset()?;
                self.size = Some(size);
                size
            }
        };
        if self.full_redraw {
            self.cache.clear();
            self.full_redraw = false;
        }

        let body_rows = body_rows_for(rows);
        let page_count = snapshot.page_count_for(body_rows);
        self.page = self.page.clamp(1, page_count);

        let frame = self.compose(snapshot, cols as usize, rows as usize);
        self.cache.resize(frame.len(), None);

        let mut stats = RenderStats {
            page: self.page,
            page_count,
            ..Default::default()
        };
        for (row, line) in frame.into_iter().enumerate() {
            if self.cache[row].as_ref() == Some(&line) {
                continue;
            }
            surface.draw_line(row as u16, &line)?;
            if let Some(class) = line.highlight {
                surface.highlight(row as u16, self.highlight_col, self.highlight_width, class)?;
            }
            stats.rows_drawn += 1;
            if body_rows > 0 && (HEADER_ROWS..HEADER_ROWS + body_rows).contains(&row) {
                stats.body_rows_drawn += 1;
            }
            self.cache[row] = Some(line);
        }
        if stats.rows_drawn > 0 {
            surface.flush()?;
        }
        trace!(
            "Rendered page {}/{}: {} rows drawn",
            stats.page,
            stats.page_count,
            stats.rows_drawn
        );
        Ok(stats)
    }

    /// Builds the full screen content, one `Line` per terminal row.
    fn compose(&self, snapshot: &Snapshot, cols: usize, rows: usize) -> Vec<Line> {
        let mut frame = Vec::with_capacity(rows);
        let body_rows = rows.saturating_sub(HEADER_ROWS + FOOTER_ROWS);
        if body_rows == 0 {
            if rows > 0 {
                frame.push(Line::new(vec![Segment::fit(0, TOO_SMALL, Tone::Notice, cols)]));
            }
            frame.resize(rows, Line::blank());
            return frame;
        }
        let page_count = snapshot.page_count_for(body_rows);

        let page_label = format!("Page {} of {}", self.page, page_count);
        frame.push(Line::new(vec![
            Segment::fit(0, &snapshot.clock, Tone::Plain, cols),
            Segment::fit(
                (cols / 2).saturating_sub(self.title.chars().count() / 2),
                &self.title,
                Tone::Title,
                cols,
            ),
            Segment::fit(right_aligned(cols, &page_label, 0), &page_label, Tone::Plain, cols),
        ]));

        let hint = self.key_hint(page_count);
        frame.push(Line::new(vec![
            Segment::fit(0, format!("Activity: {}", snapshot.activity), Tone::Plain, cols),
            Segment::fit(right_aligned(cols, &hint, 0), &hint, Tone::Plain, cols),
        ]));
        frame.push(Line::blank());

        let start = (self.page - 1) * body_rows;
        for index in start..start + body_rows {
            frame.push(match snapshot.get(index) {
                Some(record) => self.body_line(record, cols),
                None => Line::blank(),
            });
        }

        frame.push(Line::blank());
        frame.push(Line::new(vec![Segment::fit(
            0,
            &snapshot.channel_summary,
            Tone::Summary,
            cols,
        )]));
        let mut last = vec![Segment::fit(0, &snapshot.detector_summary, Tone::Summary, cols)];
        if snapshot.frequencies.is_active() {
            let label = snapshot.frequencies.label();
            last.push(Segment::fit(right_aligned(cols, &label, 1), &label, Tone::Summary, cols));
        }
        frame.push(Line::new(last));
        frame
    }

    /// Key column padded or cut to `key_width`, then the value.
    fn body_line(&self, record: &Record, cols: usize) -> Line {
        let key: String = record.key.chars().take(self.key_width).collect();
        let text = format!("{:<width$}{}", key, record.value, width = self.key_width);
        Line {
            segments: vec![Segment::fit(0, text, Tone::Plain, cols)],
            highlight: Some(Highlight::for_value(&record.value)),
        }
    }

    fn key_hint(&self, page_count: usize) -> String {
        let prev = format!("{}=Prev", self.prev_key);
        let next = format!("{}=Next", self.next_key);
        if page_count <= 1 {
            String::new()
        } else if self.page >= page_count {
            prev
        } else if self.page == 1 {
            next
        } else {
            format!("{}, {}", prev, next)
        }
    }
}

/// Start column placing `text` flush right, `margin` columns from the edge.
fn right_aligned(cols: usize, text: &str, margin: usize) -> usize {
    cols.saturating_sub(text.chars().count() + margin)
}

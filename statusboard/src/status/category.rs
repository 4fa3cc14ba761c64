//! Status line classification
//!
//! Each line of the status file starts with a fixed token naming what it
//! describes. Matching is case sensitive and done in a fixed order: the
//! system marker first, then the cycle boundary, then the component
//! categories. Lines matching none of them are ignored.

/// Token starting the line that opens a new status cycle.
pub static SYSTEM_MARKER_PREFIX: &str = "NSS";

/// Shortest run of `=` recognized as a cycle boundary.
pub static BOUNDARY_PREFIX: &str = "=========";

/// Boundary line fed to the store when the writer is late with its own.
pub static SYNTHETIC_BOUNDARY: &str = "====================================";

/// Component categories found in the status file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Channelizer (frequency channel unit).
    Channelizer,
    /// Detector (signal detection unit).
    Detector,
    Archiver,
    Telescope,
    Beam,
    Array,
    Primary,
}

impl Category {
    /// All categories, in matching order.
    pub const ALL: [Category; 7] = [
        Category::Channelizer,
        Category::Detector,
        Category::Archiver,
        Category::Telescope,
        Category::Beam,
        Category::Array,
        Category::Primary,
    ];

    pub const COUNT: usize = Category::ALL.len();

    pub fn prefix(self) -> &'static str {
        match self {
            Category::Channelizer => "chan",
            Category::Detector => "dx",
            Category::Archiver => "arch",
            Category::Telescope => "tscope",
            Category::Beam => "beam",
            Category::Array => "array",
            Category::Primary => "primary",
        }
    }

    /// Plural name used in the footer summaries.
    pub fn label(self) -> &'static str {
        match self {
            Category::Channelizer => "Channelizers",
            Category::Detector => "Dxs",
            Category::Archiver => "Archivers",
            Category::Telescope => "Telescopes",
            Category::Beam => "Beams",
            Category::Array => "Arrays",
            Category::Primary => "Primaries",
        }
    }

    /// Sub-states counted for this category, in summary order.
    pub fn sub_states(self) -> &'static [SubState] {
        match self {
            Category::Channelizer => &[SubState::Running],
            Category::Detector => &[
                SubState::Offline,
                SubState::Idle,
                SubState::BaseAccum,
                SubState::DataColl,
                SubState::SigDet,
            ],
            _ => &[],
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Activity states recognized inside a component line. Each is detected
/// by plain substring search, independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubState {
    Running,
    Offline,
    Idle,
    BaseAccum,
    DataColl,
    SigDet,
}

impl SubState {
    pub const COUNT: usize = 6;

    /// Substring whose presence signals this state.
    pub fn marker(self) -> &'static str {
        match self {
            SubState::Running => "Run",
            // Matches both "Offline" and "offline".
            SubState::Offline => "ffline",
            SubState::Idle => "No Activities",
            SubState::BaseAccum => "Base Accum",
            SubState::DataColl => "Data Coll",
            SubState::SigDet => "Sig Det",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubState::Running => "Running",
            SubState::Offline => "Offline",
            SubState::Idle => "Idle",
            SubState::BaseAccum => "Base Accum",
            SubState::DataColl => "Data Coll",
            SubState::SigDet => "Sig Det",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the states of `category` whose marker occurs in `line`.
    pub fn present_in(category: Category, line: &str) -> impl Iterator<Item = SubState> + '_ {
        category
            .sub_states()
            .iter()
            .copied()
            .filter(move |s| line.contains(s.marker()))
    }
}

/// What a normalized status line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    SystemMarker,
    Boundary,
    Component(Category),
}

/// Classifies a normalized line by its leading token.
pub fn classify(line: &str) -> Option<LineKind> {
    if line.starts_with(SYSTEM_MARKER_PREFIX) {
        return Some(LineKind::SystemMarker);
    }
    if line.starts_with(BOUNDARY_PREFIX) {
        return Some(LineKind::Boundary);
    }
    Category::ALL
        .iter()
        .find(|c| line.starts_with(c.prefix()))
        .map(|&c| LineKind::Component(c))
}

/// Returns up to `len` bytes of `line` starting at `start`, clamped to the
/// end of the line. `None` if `start` is past the end or either bound
/// falls inside a multi-byte character.
pub fn window(line: &str, start: usize, len: usize) -> Option<&str> {
    let end = start.saturating_add(len).min(line.len());
    line.get(start..end)
}

/// Parses the number at the start of `text`, after leading whitespace,
/// ignoring whatever follows it. `"13 MHz"` gives 13.
pub fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let candidate: &str = {
        let end = text
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        &text[..end]
    };
    // Longest prefix that parses wins, so "8424.914-" still yields a value.
    (1..=candidate.len())
        .rev()
        .find_map(|end| candidate[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

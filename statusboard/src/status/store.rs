//! The record store: one status cycle worth of records plus the counters
//! aggregated over it.
//!
//! A cycle opens with a system marker line, which clears everything.
//! Component lines are then counted and appended. A boundary line freezes
//! the counters into summary strings and a display snapshot, but does not
//! clear the records; only the next system marker does.

use super::category::{self, Category, LineKind, SubState};
use super::record::{normalize, Record, Records};
use chrono::NaiveDateTime;
use tracing::{debug, trace};

static DEFAULT_CLOCK: &str = "00:00:00 UTC";
static DEFAULT_DATE: &str = "0000-00-00";
static DEFAULT_ACTIVITY: &str = "None";

/// Number of pages needed to show `count` records `body_rows` at a time.
/// Always at least one, so an empty store still has a (blank) page.
pub fn page_count(count: usize, body_rows: usize) -> usize {
    if body_rows == 0 {
        return 1;
    }
    count.div_ceil(body_rows).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// No system marker seen yet.
    AwaitingSystemMarker,
    AccumulatingCycle,
}

/// Per-category counters for the current cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    states: [usize; SubState::COUNT],
}

impl Tally {
    pub fn count(&self, state: SubState) -> usize {
        self.states[state.index()]
    }

    fn record(&mut self, category: Category, line: &str) {
        self.total += 1;
        for state in SubState::present_in(category, line) {
            self.states[state.index()] += 1;
        }
    }

    /// `Total <Label>=N`, followed by `, <State>=N` for each non-zero state.
    pub fn summary(&self, category: Category) -> String {
        let mut text = format!("Total {}={}", category.label(), self.total);
        for &state in category.sub_states() {
            let n = self.count(state);
            if n > 0 {
                text.push_str(&format!(", {}={}", state.label(), n));
            }
        }
        text
    }
}

/// Running minimum and maximum of detector sky frequencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange {
    pub min_mhz: f64,
    pub max_mhz: f64,
}

impl Default for FrequencyRange {
    fn default() -> Self {
        FrequencyRange {
            min_mhz: 9999999.0,
            max_mhz: -1.0,
        }
    }
}

impl FrequencyRange {
    pub fn observe(&mut self, mhz: f64) {
        if mhz < self.min_mhz {
            self.min_mhz = mhz;
        }
        if mhz > self.max_mhz {
            self.max_mhz = mhz;
        }
    }

    /// Whether detectors reported a plausible sky frequency this cycle.
    pub fn is_active(&self) -> bool {
        self.max_mhz > 50.0 && self.min_mhz > -1.0
    }

    pub fn label(&self) -> String {
        format!("{:.4} to {:.4} MHz", self.min_mhz, self.max_mhz)
    }
}

/// Everything the view needs from one completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub records: Vec<Record>,
    pub clock: String,
    pub date: String,
    pub activity: String,
    pub channel_summary: String,
    pub detector_summary: String,
    pub frequencies: FrequencyRange,
    /// Sequence number of the boundary that produced this snapshot.
    pub cycle: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            records: Vec::new(),
            clock: DEFAULT_CLOCK.to_string(),
            date: DEFAULT_DATE.to_string(),
            activity: DEFAULT_ACTIVITY.to_string(),
            channel_summary: String::new(),
            detector_summary: String::new(),
            frequencies: FrequencyRange::default(),
            cycle: 0,
        }
    }
}

impl Snapshot {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn page_count_for(&self, body_rows: usize) -> usize {
        page_count(self.records.len(), body_rows)
    }
}

/// Removes the first `UTC` token (and one following space) from `line`.
/// With `inner_only`, a token in the last few characters is left alone.
fn strip_utc(line: &str, inner_only: bool) -> String {
    match line.find("UTC") {
        Some(pos) if !inner_only || pos + 5 < line.len() => {
            let mut end = pos + 3;
            if line[end..].starts_with(' ') {
                end += 1;
            }
            format!("{}{}", &line[..pos], &line[end..])
        }
        _ => line.to_string(),
    }
}

/// Text between `start_token` and the next `end_token` following it.
fn between<'a>(line: &'a str, start_token: &str, end_token: &str) -> Option<&'a str> {
    let start = line.find(start_token)? + start_token.len();
    let len = line[start..].find(end_token)?;
    Some(&line[start..start + len])
}

pub struct RecordStore {
    records: Records,
    state: CycleState,
    tallies: [Tally; Category::COUNT],
    frequencies: FrequencyRange,
    clock: String,
    date: String,
    activity: String,
    channel_summary: String,
    detector_summary: String,
    /// Record count at the most recent boundary.
    finalized_count: usize,
    /// Double buffer of frozen cycles; `slot` indexes the newest.
    slots: [Snapshot; 2],
    slot: usize,
    cycles: u64,
}

impl Default for RecordStore {
    fn default() -> Self {
        RecordStore::new()
    }
}

impl RecordStore {
    pub fn new() -> RecordStore {
        RecordStore {
            records: Records::new(),
            state: CycleState::AwaitingSystemMarker,
            tallies: Default::default(),
            frequencies: FrequencyRange::default(),
            clock: DEFAULT_CLOCK.to_string(),
            date: DEFAULT_DATE.to_string(),
            activity: DEFAULT_ACTIVITY.to_string(),
            channel_summary: String::new(),
            detector_summary: String::new(),
            finalized_count: 0,
            slots: [Snapshot::default(), Snapshot::default()],
            slot: 0,
            cycles: 0,
        }
    }

    /// Feeds one raw status line. Returns true when the line completed a
    /// cycle and the display should be repainted.
    pub fn classify_and_add(&mut self, raw: &str) -> bool {
        let line = normalize(raw);
        match category::classify(&line) {
            Some(LineKind::SystemMarker) => {
                self.begin_cycle(&line);
                false
            }
            Some(LineKind::Boundary) => {
                self.finalize_cycle();
                true
            }
            Some(LineKind::Component(category)) => {
                self.add_component(category, &line);
                false
            }
            None => {
                trace!("Ignoring status line {:?}", line);
                false
            }
        }
    }

    fn begin_cycle(&mut self, line: &str) {
        self.records.clear();
        if let Some(pos) = line.find("UTC") {
            if let Some(clock) = pos.checked_sub(9).and_then(|s| category::window(line, s, 12)) {
                self.clock = clock.to_string();
            }
            if let Some(date) = pos.checked_sub(20).and_then(|s| category::window(line, s, 10)) {
                self.date = date.to_string();
            }
        }
        self.tallies = Default::default();
        self.frequencies = FrequencyRange::default();
        self.state = CycleState::AccumulatingCycle;
        debug!("Status cycle started at {} {}", self.date, self.clock);
    }

    fn finalize_cycle(&mut self) {
        self.channel_summary = self.tally(Category::Channelizer).summary(Category::Channelizer);
        self.detector_summary = self.tally(Category::Detector).summary(Category::Detector);
        self.finalized_count = self.records.len();

        self.slot ^= 1;
        self.slots[self.slot] = Snapshot {
            records: self.records.to_vec(),
            clock: self.clock.clone(),
            date: self.date.clone(),
            activity: self.activity.clone(),
            channel_summary: self.channel_summary.clone(),
            detector_summary: self.detector_summary.clone(),
            frequencies: self.frequencies,
            cycle: self.cycles,
        };
        self.cycles += 1;
        debug!(
            "Cycle {} complete with {} records: {} / {}",
            self.cycles, self.finalized_count, self.channel_summary, self.detector_summary
        );
    }

    fn add_component(&mut self, category: Category, line: &str) {
        let line = match category {
            Category::Channelizer => strip_utc(line, false),
            Category::Detector => strip_utc(line, true),
            _ => line.to_string(),
        };
        let record = match Record::parse(&line) {
            Some(record) => record,
            None => {
                trace!("Ignoring {:?} line without a value: {:?}", category, line);
                return;
            }
        };
        self.tallies[category.index()].record(category, &line);
        if category == Category::Detector {
            self.track_detector(&line);
        }
        self.records.push(record);
    }

    /// Picks the activity id and sky frequency out of a detector line, e.g.
    /// `dx1001 (beam1) 2010-08-07 00:19:34 Act 2735: Init Sky: 8424.914 MHz Chan: 13`
    fn track_detector(&mut self, line: &str) {
        if let Some(activity) = between(line, "Act ", ": ") {
            self.activity = activity.to_string();
        }
        let channel = line
            .find("Chan:")
            .and_then(|pos| category::leading_number(&line[pos + 5..]))
            .map(|c| c as i64)
            .unwrap_or(-1);
        if channel > 0 {
            if let Some(freq) = between(line, "Sky:", "MHz").and_then(category::leading_number) {
                self.frequencies.observe(freq);
            }
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Record at `index`, or an empty record when out of range.
    pub fn record_at(&self, index: usize) -> Record {
        self.records.record_at(index)
    }

    pub fn get(&self, index: usize) -> Option<Record> {
        self.records.get(index)
    }

    pub fn page_count_for(&self, body_rows: usize) -> usize {
        page_count(self.record_count(), body_rows)
    }

    /// Channelizer and detector summaries from the last boundary.
    pub fn summary_strings(&self) -> (&str, &str) {
        (&self.channel_summary, &self.detector_summary)
    }

    pub fn tally(&self, category: Category) -> &Tally {
        &self.tallies[category.index()]
    }

    pub fn frequencies(&self) -> FrequencyRange {
        self.frequencies
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn clock(&self) -> &str {
        &self.clock
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Date and time carried by the last system marker, if they parse.
    pub fn marker_time(&self) -> Option<NaiveDateTime> {
        let time = category::window(&self.clock, 0, 8)?;
        NaiveDateTime::parse_from_str(&format!("{} {}", self.date, time), "%Y-%m-%d %H:%M:%S").ok()
    }

    pub fn finalized_count(&self) -> usize {
        self.finalized_count
    }

    /// Number of boundaries processed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The most recently completed cycle. Before the first boundary this
    /// is an empty snapshot with placeholder clock and date.
    pub fn snapshot(&self) -> &Snapshot {
        &self.slots[self.slot]
    }
}

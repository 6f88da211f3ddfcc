//! Progress rendering, milestone tracking, and the worker/poller state cell.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Width of the progress bar shown in status messages.
pub const DEFAULT_BAR_WIDTH: usize = 20;

/// Percent granularity between status edits.
const MILESTONE_STEP: u8 = 5;

const FILLED_GLYPH: &str = "⭐";
const EMPTY_GLYPH: &str = "☆";

/// Which half of the relay is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Fetching bytes from remote storage.
    Downloading,
    /// Sending bytes to the upload host.
    Uploading,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloading => f.write_str("download"),
            Self::Uploading => f.write_str("upload"),
        }
    }
}

/// Render `percent` as a bracketed bar of `width` glyphs followed by the
/// literal percentage, e.g. `[⭐⭐☆☆] 50%` for width 4.
///
/// Percentages above 100 are clamped.
#[must_use]
pub fn render_bar(percent: u8, width: usize) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent).saturating_mul(width) / 100;
    let empty = width.saturating_sub(filled);
    format!(
        "[{}{}] {percent}%",
        FILLED_GLYPH.repeat(filled),
        EMPTY_GLYPH.repeat(empty)
    )
}

/// [`render_bar`] at [`DEFAULT_BAR_WIDTH`].
#[must_use]
pub fn render_default_bar(percent: u8) -> String {
    render_bar(percent, DEFAULT_BAR_WIDTH)
}

/// `min(100, floor(100 * moved / total))`, or `None` when the total is unknown.
#[must_use]
pub fn percent_of(moved: u64, total: u64) -> Option<u8> {
    let scaled = u128::from(moved)
        .saturating_mul(100)
        .checked_div(u128::from(total))?;
    Some(u8::try_from(scaled.min(100)).unwrap_or(100))
}

/// Decides which percentages are worth a status edit.
///
/// A percentage is reported as the multiple of five at or below it, and
/// only when that multiple is higher than the last one reported. Reported
/// values therefore never repeat and never go backwards.
#[derive(Debug, Clone, Default)]
pub struct Milestones {
    last: Option<u8>,
}

impl Milestones {
    /// Start with nothing reported.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a freshly observed percentage; returns the milestone to report.
    pub fn observe(&mut self, percent: u8) -> Option<u8> {
        let percent = percent.min(100);
        let milestone = percent.saturating_sub(percent % MILESTONE_STEP);
        match self.last {
            Some(last) if milestone <= last => None,
            _ => {
                self.last = Some(milestone);
                Some(milestone)
            },
        }
    }
}

/// Shared state between one background worker and the polling loop.
///
/// Holds the running byte count and the worker's terminal outcome. The
/// outcome is written at most once; later writes are ignored.
#[derive(Debug)]
pub struct ProgressCell<T> {
    state: Mutex<CellState<T>>,
}

#[derive(Debug)]
struct CellState<T> {
    bytes: u64,
    outcome: Option<Result<T, String>>,
    finished: bool,
}

impl<T> Default for ProgressCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ProgressCell<T> {
    /// A running cell with zero bytes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CellState {
                bytes: 0,
                outcome: None,
                finished: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CellState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bytes moved so far.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.lock().bytes
    }

    /// Overwrite the byte count with a fresh sample.
    pub fn set_bytes(&self, bytes: u64) {
        self.lock().bytes = bytes;
    }

    /// Record the worker's terminal outcome. Returns `false` if one was
    /// already recorded.
    pub fn finish(&self, outcome: Result<T, String>) -> bool {
        let mut state = self.lock();
        if state.finished {
            return false;
        }
        state.finished = true;
        state.outcome = Some(outcome);
        true
    }

    /// Whether a terminal outcome has been recorded.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// Take the terminal outcome, if recorded and not yet taken.
    pub fn take_outcome(&self) -> Option<Result<T, String>> {
        self.lock().outcome.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph_counts(bar: &str) -> (usize, usize) {
        (
            bar.matches(FILLED_GLYPH).count(),
            bar.matches(EMPTY_GLYPH).count(),
        )
    }

    #[test]
    fn bar_fill_matches_floor_of_width_share() {
        for (p, filled) in [(0u8, 0), (25, 5), (50, 10), (75, 15), (100, 20)] {
            let bar = render_default_bar(p);
            assert_eq!(glyph_counts(&bar), (filled, 20usize.saturating_sub(filled)));
            assert!(bar.ends_with(&format!("] {p}%")), "{bar}");
        }
    }

    #[test]
    fn bar_extremes() {
        assert_eq!(render_default_bar(0), format!("[{}] 0%", EMPTY_GLYPH.repeat(20)));
        assert_eq!(
            render_default_bar(100),
            format!("[{}] 100%", FILLED_GLYPH.repeat(20))
        );
    }

    #[test]
    fn bar_floors_partial_glyphs() {
        // 20 * 7 / 100 = 1.4 -> 1 filled.
        assert_eq!(glyph_counts(&render_default_bar(7)), (1, 19));
        assert_eq!(glyph_counts(&render_bar(99, 10)), (9, 1));
    }

    #[test]
    fn bar_clamps_over_100() {
        assert_eq!(render_bar(250, 4), format!("[{}] 100%", FILLED_GLYPH.repeat(4)));
    }

    #[test]
    fn percent_of_unknown_total() {
        assert_eq!(percent_of(500, 0), None);
    }

    #[test]
    fn percent_of_floors_and_clamps() {
        assert_eq!(percent_of(0, 1000), Some(0));
        assert_eq!(percent_of(999, 1000), Some(99));
        assert_eq!(percent_of(1000, 1000), Some(100));
        assert_eq!(percent_of(5000, 1000), Some(100));
        assert_eq!(percent_of(u64::MAX, u64::MAX), Some(100));
    }

    #[test]
    fn milestones_for_steady_growth() {
        let mut milestones = Milestones::new();
        let emitted: Vec<u8> = (0..=1000u64)
            .step_by(10)
            .filter_map(|bytes| percent_of(bytes, 1000))
            .filter_map(|p| milestones.observe(p))
            .collect();
        let expected: Vec<u8> = (0..=100).step_by(5).collect();
        assert_eq!(emitted, expected);
    }

    #[test]
    fn milestones_never_repeat_or_regress() {
        let mut milestones = Milestones::new();
        assert_eq!(milestones.observe(0), Some(0));
        assert_eq!(milestones.observe(0), None);
        assert_eq!(milestones.observe(4), None);
        assert_eq!(milestones.observe(13), Some(10));
        assert_eq!(milestones.observe(12), None);
        assert_eq!(milestones.observe(9), None);
        assert_eq!(milestones.observe(100), Some(100));
        assert_eq!(milestones.observe(100), None);
    }

    #[test]
    fn milestones_first_sample_can_be_mid_way() {
        let mut milestones = Milestones::new();
        assert_eq!(milestones.observe(42), Some(40));
    }

    #[test]
    fn cell_counts_bytes() {
        let cell: ProgressCell<()> = ProgressCell::new();
        assert_eq!(cell.bytes(), 0);
        cell.set_bytes(15);
        assert_eq!(cell.bytes(), 15);
        cell.set_bytes(3);
        assert_eq!(cell.bytes(), 3);
    }

    #[test]
    fn cell_outcome_is_written_once() {
        let cell: ProgressCell<u32> = ProgressCell::new();
        assert!(!cell.is_finished());
        assert!(cell.finish(Err("boom".to_owned())));
        assert!(!cell.finish(Ok(7)));
        assert!(cell.is_finished());
        assert_eq!(cell.take_outcome(), Some(Err("boom".to_owned())));
        assert_eq!(cell.take_outcome(), None);
        assert!(cell.is_finished());
    }
}

#![forbid(unsafe_code)]

//! Per-frame scroll metrics for JSONL event logs and CI gating.
//!
//! Each render step can be recorded as a [`ScrollFrameRecord`]; the
//! [`ScrollFrameCollector`] buffers them (bounded), exports raw JSONL, and
//! summarizes a run into a [`ScrollSessionReport`] with a percentile
//! histogram over per-frame scroll deltas — the "how far did a frame move"
//! distribution that makes easing regressions visible in CI.

use serde::Serialize;

/// Cap on buffered records; a long-lived page recording past this drops the
/// oldest frames rather than growing without bound.
pub const MAX_FRAME_RECORDS: usize = 16_384;

/// A single frame's scroll measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollFrameRecord {
    /// Eased scroll offset after the step.
    pub scroll: f64,
    /// Target offset the step converged toward.
    pub target: f64,
    /// Scrollbar thumb height for this frame.
    pub thumb_height: f64,
    /// Scrollbar thumb offset for this frame.
    pub thumb_offset: f64,
    /// Whether another step was scheduled.
    pub animating: bool,
    /// Whether a drag session was live.
    pub dragging: bool,
    /// Native scroll events coalesced into this frame.
    pub coalesced_events: u32,
}

/// Collects per-frame records and produces summary statistics.
#[derive(Debug, Clone)]
pub struct ScrollFrameCollector {
    run_id: String,
    records: Vec<ScrollFrameRecord>,
    dropped: u64,
}

impl ScrollFrameCollector {
    /// Create a new collector for a measurement run.
    #[must_use]
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            records: Vec::with_capacity(1024),
            dropped: 0,
        }
    }

    /// Record one frame's measurements.
    pub fn record_frame(&mut self, record: ScrollFrameRecord) {
        if self.records.len() >= MAX_FRAME_RECORDS {
            self.records.remove(0);
            self.dropped += 1;
        }
        self.records.push(record);
    }

    /// Number of frames recorded so far.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.records.len()
    }

    /// Frames dropped to stay within [`MAX_FRAME_RECORDS`].
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// The run identifier this collector was created with.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Emit per-frame JSONL records to a string.
    ///
    /// Each line is a JSON object with `run_id`, `frame_idx`, and the frame's
    /// scroll/thumb measurements.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for (i, r) in self.records.iter().enumerate() {
            let row = JsonlFrameRecord {
                run_id: &self.run_id,
                frame_idx: i,
                scroll: r.scroll,
                target: r.target,
                thumb_height: r.thumb_height,
                thumb_offset: r.thumb_offset,
                animating: r.animating,
                dragging: r.dragging,
                coalesced_events: r.coalesced_events,
            };
            if let Ok(line) = serde_json::to_string(&row) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    /// Produce a summary report from all recorded frames.
    #[must_use]
    pub fn report(&self) -> ScrollSessionReport {
        let mut deltas: Vec<f64> = self
            .records
            .windows(2)
            .map(|pair| (pair[1].scroll - pair[0].scroll).abs())
            .collect();
        deltas.sort_unstable_by(f64::total_cmp);

        let settled_frames = self.records.iter().filter(|r| !r.animating).count() as u64;
        let dragged_frames = self.records.iter().filter(|r| r.dragging).count() as u64;
        let coalesced_total: u64 = self
            .records
            .iter()
            .map(|r| u64::from(r.coalesced_events))
            .sum();

        ScrollSessionReport {
            run_id: self.run_id.clone(),
            frames: self.records.len() as u64,
            dropped_frames: self.dropped,
            settled_frames,
            dragged_frames,
            coalesced_events_total: coalesced_total,
            scroll_delta: histogram_or_default(&deltas),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonlFrameRecord<'a> {
    run_id: &'a str,
    frame_idx: usize,
    scroll: f64,
    target: f64,
    thumb_height: f64,
    thumb_offset: f64,
    animating: bool,
    dragging: bool,
    coalesced_events: u32,
}

/// Percentile histogram of per-frame scroll deltas, in pixels.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScrollDeltaHistogram {
    pub count: u64,
    pub min_px: f64,
    pub max_px: f64,
    pub p50_px: f64,
    pub p95_px: f64,
    pub p99_px: f64,
    pub mean_px: f64,
}

/// Complete session report (machine-readable for CI gating).
#[derive(Debug, Clone, Serialize)]
pub struct ScrollSessionReport {
    pub run_id: String,
    pub frames: u64,
    pub dropped_frames: u64,
    pub settled_frames: u64,
    pub dragged_frames: u64,
    pub coalesced_events_total: u64,
    pub scroll_delta: ScrollDeltaHistogram,
}

impl ScrollSessionReport {
    /// Serialize to a JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 * p) as usize).min(sorted.len() - 1);
    sorted[idx]
}

fn histogram_or_default(sorted: &[f64]) -> ScrollDeltaHistogram {
    if sorted.is_empty() {
        return ScrollDeltaHistogram::default();
    }
    ScrollDeltaHistogram {
        count: sorted.len() as u64,
        min_px: sorted[0],
        max_px: sorted[sorted.len() - 1],
        p50_px: percentile(sorted, 0.50),
        p95_px: percentile(sorted, 0.95),
        p99_px: percentile(sorted, 0.99),
        mean_px: sorted.iter().sum::<f64>() / sorted.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(scroll: f64, animating: bool) -> ScrollFrameRecord {
        ScrollFrameRecord {
            scroll,
            target: 1000.0,
            thumb_height: 168.0,
            thumb_offset: scroll / 3000.0 * 632.0,
            animating,
            dragging: false,
            coalesced_events: 1,
        }
    }

    #[test]
    fn empty_collector_produces_zero_report() {
        let c = ScrollFrameCollector::new("test");
        let r = c.report();
        assert_eq!(r.frames, 0);
        assert_eq!(r.scroll_delta.count, 0);
    }

    #[test]
    fn deltas_summarize_an_easing_run() {
        let mut c = ScrollFrameCollector::new("test");
        // A 0 → 1000 run at ease 0.16: deltas shrink geometrically.
        let mut scroll = 0.0;
        loop {
            scroll += (1000.0 - scroll) * 0.16;
            let done = 1000.0 - scroll < 0.3;
            if done {
                scroll = 1000.0;
            }
            c.record_frame(frame(scroll, !done));
            if done {
                break;
            }
        }

        let r = c.report();
        assert_eq!(r.settled_frames, 1);
        assert_eq!(r.scroll_delta.count, r.frames - 1);
        // First delta is the largest: 160 px.
        assert!(r.scroll_delta.max_px <= 160.0 + 1e-9);
        assert!(r.scroll_delta.min_px < 1.0);
        assert!(r.scroll_delta.p50_px < r.scroll_delta.p95_px);
    }

    #[test]
    fn jsonl_output_has_correct_line_count() {
        let mut c = ScrollFrameCollector::new("test");
        for i in 0..5 {
            c.record_frame(frame(f64::from(i) * 10.0, true));
        }
        let jsonl = c.to_jsonl();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 5);
        for line in &lines {
            assert!(serde_json::from_str::<serde_json::Value>(line).is_ok());
        }
    }

    #[test]
    fn report_json_is_valid() {
        let mut c = ScrollFrameCollector::new("scroll-run");
        c.record_frame(frame(100.0, true));
        c.record_frame(frame(250.0, true));
        let json = c.report().to_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["run_id"], "scroll-run");
        assert_eq!(parsed["frames"], 2);
        assert_eq!(parsed["scroll_delta"]["count"], 1);
        assert_eq!(parsed["scroll_delta"]["max_px"], 150.0);
    }

    #[test]
    fn bounded_collector_drops_oldest() {
        let mut c = ScrollFrameCollector::new("long-run");
        for i in 0..(MAX_FRAME_RECORDS + 10) {
            c.record_frame(frame(i as f64, true));
        }
        assert_eq!(c.frame_count(), MAX_FRAME_RECORDS);
        assert_eq!(c.dropped_frames(), 10);
    }

    #[test]
    fn jsonl_escapes_run_id() {
        let mut c = ScrollFrameCollector::new("run\"alpha\nbeta");
        c.record_frame(frame(1.0, false));
        let jsonl = c.to_jsonl();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["run_id"], "run\"alpha\nbeta");
    }
}

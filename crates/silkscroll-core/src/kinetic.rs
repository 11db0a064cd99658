#![forbid(unsafe_code)]

//! Scroll-driven kinetic typography scrub.
//!
//! The intro section's lines are choreographed directly off the eased scroll
//! value: a progress fraction sweeps a "center of attention" across the
//! lines, and each line's opacity, translation, scale, and font weight follow
//! a cosine bell around that center. Fully scrubbed — no snaps, no tweens;
//! styles are pure functions of progress.
//!
//! This is the primary downstream consumer of the scroll broadcast: it
//! reads the eased value, never the native scroll offset.

use std::f64::consts::PI;

/// Minimum progress change worth restyling for. Sub-threshold observations
/// are suppressed to avoid layout-thrashing writes.
pub const PROGRESS_EPSILON: f64 = 0.005;

/// Geometry of the choreographed section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KineticLayout {
    /// Section top in content coordinates.
    pub section_top: f64,
    /// Scrollable height of the section content.
    pub section_height: f64,
    /// Viewport height.
    pub viewport_height: f64,
    /// Number of choreographed lines.
    pub line_count: usize,
}

/// Computed style for one line at a given progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub opacity: f64,
    pub translate_y: f64,
    pub scale: f64,
    pub font_weight: u16,
}

impl LineStyle {
    /// Style for line `index` of `line_count` with the attention center at
    /// `progress * line_count`.
    ///
    /// `t` is 1 at the center and fades to 0 at a distance of one line;
    /// the cosine bell smooths it so exactly one line dominates at a time.
    #[must_use]
    pub fn at(progress: f64, index: usize, line_count: usize) -> Self {
        let center = progress * line_count as f64;
        let dist = ((index as f64 + 0.5) - center).abs();
        let t = (1.0 - dist.min(1.0)).max(0.0);
        let weight = 0.5 * (1.0 - (PI * t).cos());

        Self {
            opacity: 0.25 + 0.75 * weight,
            translate_y: 26.0 - 26.0 * weight,
            scale: 0.985 + 0.05 * weight,
            font_weight: (400.0 + 300.0 * weight).round() as u16,
        }
    }
}

/// The scrub state machine: progress window plus the restyle change gate.
#[derive(Debug, Clone)]
pub struct KineticScrub {
    layout: KineticLayout,
    last_progress: f64,
}

impl KineticScrub {
    #[must_use]
    pub fn new(layout: KineticLayout) -> Self {
        Self {
            layout,
            last_progress: -1.0,
        }
    }

    /// Refresh cached geometry (resize, async content). Keeps the change
    /// gate so a pure geometry refresh doesn't force a restyle.
    pub fn set_layout(&mut self, layout: KineticLayout) {
        self.layout = layout;
    }

    #[must_use]
    pub fn layout(&self) -> KineticLayout {
        self.layout
    }

    /// Scrub progress for a scroll position, in `[0, 1]`.
    ///
    /// The window opens half a viewport before the section top and closes at
    /// the section's end; positions outside pin to 0 or 1.
    #[must_use]
    pub fn progress(&self, scroll: f64) -> f64 {
        let start = self.layout.section_top - self.layout.viewport_height * 0.5;
        let end = self.layout.section_top + self.layout.section_height;
        if end <= start {
            return if scroll < start { 0.0 } else { 1.0 };
        }
        ((scroll - start) / (end - start)).clamp(0.0, 1.0)
    }

    /// Observe a scroll position; returns the per-line styles when progress
    /// moved at least [`PROGRESS_EPSILON`] since the last restyle, `None`
    /// otherwise.
    pub fn observe(&mut self, scroll: f64) -> Option<Vec<LineStyle>> {
        let progress = self.progress(scroll);
        if (progress - self.last_progress).abs() < PROGRESS_EPSILON {
            return None;
        }
        self.last_progress = progress;
        Some(self.styles_at(progress))
    }

    /// Styles for every line at an explicit progress, bypassing the gate.
    #[must_use]
    pub fn styles_at(&self, progress: f64) -> Vec<LineStyle> {
        (0..self.layout.line_count)
            .map(|i| LineStyle::at(progress, i, self.layout.line_count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intro() -> KineticScrub {
        KineticScrub::new(KineticLayout {
            section_top: 2000.0,
            section_height: 1600.0,
            viewport_height: 800.0,
            line_count: 3,
        })
    }

    // -- Progress window --

    #[test]
    fn progress_pins_outside_the_window() {
        let scrub = intro();
        assert_eq!(scrub.progress(0.0), 0.0);
        assert_eq!(scrub.progress(1599.0), 0.0);
        assert_eq!(scrub.progress(3600.0), 1.0);
        assert_eq!(scrub.progress(9999.0), 1.0);
    }

    #[test]
    fn progress_is_linear_inside_the_window() {
        let scrub = intro();
        // Window: 1600 .. 3600.
        assert!((scrub.progress(2600.0) - 0.5).abs() < 1e-9);
        assert!((scrub.progress(2100.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn degenerate_window_pins() {
        let scrub = KineticScrub::new(KineticLayout {
            section_top: 100.0,
            section_height: 0.0,
            viewport_height: 800.0,
            line_count: 1,
        });
        assert_eq!(scrub.progress(-500.0), 0.0);
        assert_eq!(scrub.progress(500.0), 1.0);
    }

    // -- Line styles --

    #[test]
    fn centered_line_carries_maximal_weight() {
        // progress 0.5 of 3 lines puts the center at 1.5 — line index 1.
        let styles = intro().styles_at(0.5);
        assert!(styles[1].opacity > styles[0].opacity);
        assert!(styles[1].opacity > styles[2].opacity);
        assert_eq!(styles[1].opacity, 1.0);
        assert_eq!(styles[1].translate_y, 0.0);
        assert_eq!(styles[1].font_weight, 700);
    }

    #[test]
    fn distant_lines_rest_at_baseline() {
        let styles = intro().styles_at(0.0);
        // Center at 0: line 2 is over one line away.
        assert_eq!(styles[2].opacity, 0.25);
        assert_eq!(styles[2].translate_y, 26.0);
        assert_eq!(styles[2].font_weight, 400);
        assert!((styles[2].scale - 0.985).abs() < 1e-9);
    }

    #[test]
    fn styles_vary_smoothly_with_progress() {
        let scrub = intro();
        let mut last = scrub.styles_at(0.0)[0].opacity;
        for i in 1..=20 {
            let opacity = scrub.styles_at(f64::from(i) / 40.0)[0].opacity;
            assert!((opacity - last).abs() < 0.25, "discontinuity at step {i}");
            last = opacity;
        }
    }

    // -- Change gate --

    #[test]
    fn first_observation_always_styles() {
        let mut scrub = intro();
        assert!(scrub.observe(0.0).is_some());
    }

    #[test]
    fn sub_threshold_movement_is_suppressed() {
        let mut scrub = intro();
        scrub.observe(2600.0).unwrap();
        // 2 px of scroll is 0.001 progress — below the gate.
        assert!(scrub.observe(2602.0).is_none());
        // 20 px is 0.01 — above it.
        assert!(scrub.observe(2620.0).is_some());
    }

    #[test]
    fn layout_refresh_keeps_the_gate() {
        let mut scrub = intro();
        scrub.observe(2600.0).unwrap();
        let mut layout = scrub.layout();
        layout.section_top = 2001.0;
        scrub.set_layout(layout);
        assert!(scrub.observe(2600.0).is_none());
    }
}

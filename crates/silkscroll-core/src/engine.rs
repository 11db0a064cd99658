#![forbid(unsafe_code)]

//! The eased scroll state machine.
//!
//! This module decouples the browser's native, instantaneous scroll jumps from
//! a visually eased scroll position. It does **not** touch the DOM — the host
//! forwards native scroll offsets and pointer drags, drives one
//! [`ScrollEngine::step`] per animation frame, and applies the returned
//! [`FrameSnapshot`] (content translation + scrollbar thumb geometry).
//!
//! # Design
//!
//! - [`ScrollConfig`] holds tuning parameters (ease factor, snap threshold,
//!   desktop gate, thumb floor).
//! - [`PageGeometry`] is the host-reported viewport/content/track geometry,
//!   resynchronized on resize without resetting scroll state.
//! - [`ScrollEngine`] is the mutable scroll position. Native scroll events and
//!   programmatic [`ScrollEngine::scroll_to`] calls move the *target*; only
//!   the per-frame step moves the *current* value, so rendering writes stay
//!   serialized to one call site.
//!
//! The easing is a first-order exponential decay applied per frame (a fixed
//! fraction of the remaining distance each step). It is deliberately not
//! time-delta-normalized: the motion feel is tied to the display refresh
//! rate.

use tracing::{debug, trace, warn};

use crate::scrollbar::ThumbMetrics;

/// Tuning knobs for scroll behavior.
#[derive(Debug, Clone)]
pub struct ScrollConfig {
    /// Fraction of the remaining distance covered per frame (0.0–1.0).
    pub ease: f64,

    /// Distance below which the current position snaps exactly onto the
    /// target and the easing loop stops, in pixels. Avoids infinite
    /// sub-pixel oscillation.
    pub stop_threshold: f64,

    /// Viewport widths at or below this value refuse to construct an engine.
    /// Touch/mobile input keeps native scrolling untouched.
    pub min_viewport_width: f64,

    /// Minimum synthetic scrollbar thumb height, in pixels.
    pub min_thumb_px: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            ease: 0.16,
            stop_threshold: 0.3,
            min_viewport_width: 768.0,
            min_thumb_px: 50.0,
        }
    }
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Host-reported page geometry the engine scrolls within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Visible viewport.
    pub viewport: Viewport,
    /// Full scrollable height of the content container. Also the synthetic
    /// height the host applies to the document body so native scrolling
    /// (scrollbar, keyboard paging) keeps working at the native layer.
    pub content_height: f64,
    /// Height of the synthetic scrollbar track.
    pub track_height: f64,
}

impl PageGeometry {
    /// Geometry with the scrollbar track spanning the viewport height.
    #[must_use]
    pub fn new(viewport: Viewport, content_height: f64) -> Self {
        Self {
            viewport,
            content_height,
            track_height: viewport.height,
        }
    }

    /// Maximum scroll offset: content height minus viewport height, floored
    /// at zero for content shorter than the viewport.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.viewport.height).max(0.0)
    }
}

/// Options for a programmatic [`ScrollEngine::scroll_to`] glide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollToOptions {
    /// Accepted for API compatibility but unused: the easing is
    /// frame-count-based, not duration-based.
    pub duration_ms: Option<f64>,
    /// Ease factor override for this glide. Cleared by the next native
    /// scroll event.
    pub ease: Option<f64>,
}

/// Why an engine refused to construct. Per the degradation contract the
/// caller leaves native scrolling untouched instead of partially
/// initializing.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineUnavailable {
    /// Viewport is at or below the desktop gate.
    ViewportTooNarrow { width: f64, min: f64 },
    /// A geometry value was non-finite or negative.
    InvalidGeometry(&'static str),
}

impl core::fmt::Display for EngineUnavailable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ViewportTooNarrow { width, min } => {
                write!(f, "viewport {width}px is at or below the {min}px desktop gate")
            }
            Self::InvalidGeometry(what) => write!(f, "invalid geometry: {what}"),
        }
    }
}

impl std::error::Error for EngineUnavailable {}

/// Transient scrollbar drag session. Created on thumb pointer-down,
/// destroyed on pointer-up; never persisted.
#[derive(Debug, Clone, Copy)]
struct DragSession {
    start_pointer_y: f64,
    start_scroll: f64,
}

/// Immutable per-frame render output.
///
/// Produced by [`ScrollEngine::step`] in a fixed order: content translation,
/// then scrollbar thumb geometry, both derived from the same updated scroll
/// value, so downstream consumers observe a monotonically-converging state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    /// The eased scroll offset. The canonical "scroll position" for every
    /// consumer; never the raw browser value.
    pub scroll: f64,
    /// Translation the host applies to the content container (`-scroll`).
    pub translate_y: f64,
    /// Synthetic body height the host keeps applied for native scrolling.
    pub body_height: f64,
    /// Scrollbar thumb geometry for this frame.
    pub thumb: ThumbMetrics,
    /// Whether another step should be scheduled.
    pub animating: bool,
    /// Whether a thumb drag session is live. While true the host suppresses
    /// text selection.
    pub dragging: bool,
}

/// The smooth-scroll state machine.
///
/// One instance per page, created at initialization and alive until the page
/// unloads. All fields are private; the documented operations are the entire
/// public surface.
#[derive(Debug, Clone)]
pub struct ScrollEngine {
    /// Offset the page should be at. Written by native scroll events,
    /// `scroll_to`, and drag input — never by the step.
    target: f64,
    /// Eased offset actually rendered. Written only by the step.
    current: f64,
    /// True while an easing step is scheduled. Guards against a second
    /// concurrent loop: repeated start triggers are idempotent.
    animating: bool,
    /// Per-glide ease override from `scroll_to`; reset by native scroll.
    ease_override: Option<f64>,
    drag: Option<DragSession>,
    geometry: PageGeometry,
    config: ScrollConfig,
}

impl ScrollEngine {
    /// Construct an engine, or abstain.
    ///
    /// Abstains (returns [`EngineUnavailable`]) at or below the configured
    /// viewport-width gate and on non-finite or negative geometry. The caller
    /// must then leave native scrolling untouched.
    pub fn new(geometry: PageGeometry, config: ScrollConfig) -> Result<Self, EngineUnavailable> {
        if !geometry.viewport.width.is_finite() || geometry.viewport.width < 0.0 {
            return Err(EngineUnavailable::InvalidGeometry("viewport width"));
        }
        if !geometry.viewport.height.is_finite() || geometry.viewport.height < 0.0 {
            return Err(EngineUnavailable::InvalidGeometry("viewport height"));
        }
        if !geometry.content_height.is_finite() || geometry.content_height < 0.0 {
            return Err(EngineUnavailable::InvalidGeometry("content height"));
        }
        if !geometry.track_height.is_finite() || geometry.track_height < 0.0 {
            return Err(EngineUnavailable::InvalidGeometry("track height"));
        }
        if geometry.viewport.width <= config.min_viewport_width {
            return Err(EngineUnavailable::ViewportTooNarrow {
                width: geometry.viewport.width,
                min: config.min_viewport_width,
            });
        }

        debug!(
            target: "silkscroll_core::engine",
            viewport_width = geometry.viewport.width,
            viewport_height = geometry.viewport.height,
            content_height = geometry.content_height,
            "engine constructed"
        );

        Ok(Self {
            target: 0.0,
            current: 0.0,
            animating: false,
            ease_override: None,
            drag: None,
            geometry,
            config,
        })
    }

    /// Construct with default configuration.
    pub fn with_defaults(geometry: PageGeometry) -> Result<Self, EngineUnavailable> {
        Self::new(geometry, ScrollConfig::default())
    }

    /// The eased scroll offset — the canonical scroll position for every
    /// consumer, never the native browser offset.
    #[must_use]
    pub fn scroll(&self) -> f64 {
        self.current
    }

    /// The offset the page should be at.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether an easing step is scheduled. At rest, `scroll() == target()`.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Whether a thumb drag session is live.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Current page geometry.
    #[must_use]
    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Maximum scroll offset under the current geometry.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        self.geometry.max_scroll()
    }

    /// Clamp a requested offset into `[0, max_scroll]`. Non-finite requests
    /// resolve to the current target rather than poisoning the state.
    fn clamp_offset(&self, offset: f64) -> f64 {
        if !offset.is_finite() {
            warn!(
                target: "silkscroll_core::engine",
                "non-finite scroll offset ignored"
            );
            return self.target;
        }
        offset.clamp(0.0, self.geometry.max_scroll())
    }

    /// Ingest the browser's native scroll offset.
    ///
    /// Sets the target (clamped) and marks the engine animating so the host
    /// schedules a step if one isn't already in flight. Clears any per-glide
    /// ease override so manual scrolling resumes the configured feel.
    pub fn on_native_scroll(&mut self, offset: f64) {
        self.target = self.clamp_offset(offset);
        self.ease_override = None;
        if !self.animating {
            trace!(
                target: "silkscroll_core::engine",
                target_scroll = self.target,
                "easing loop started"
            );
        }
        self.animating = true;
    }

    /// Request an eased scroll to an absolute offset.
    ///
    /// The sole public write operation for programmatic movement. Returns the
    /// clamped offset the host must synchronously hand to the native scroll
    /// layer, keeping native and synthetic state from diverging so the user
    /// can resume manual scrolling seamlessly.
    ///
    /// A call while a previous glide is still converging simply overwrites
    /// the target; the in-flight loop redirects on its next step.
    pub fn scroll_to(&mut self, offset: f64, options: ScrollToOptions) -> f64 {
        self.target = self.clamp_offset(offset);
        self.ease_override = options.ease.filter(|e| e.is_finite() && *e > 0.0 && *e <= 1.0);
        if options.duration_ms.is_some() {
            // Accepted but unused; see ScrollToOptions.
            trace!(
                target: "silkscroll_core::engine",
                "scroll_to duration option ignored"
            );
        }
        self.animating = true;
        debug!(
            target: "silkscroll_core::engine",
            target_scroll = self.target,
            ease_override = self.ease_override,
            "programmatic scroll requested"
        );
        self.target
    }

    /// Advance the easing by one frame and produce the render snapshot.
    ///
    /// Moves `current` a fixed fraction of the remaining distance toward
    /// `target`; once the remaining distance falls below the stop threshold,
    /// snaps exactly onto the target and clears the animating flag. Safe to
    /// call when idle — the snapshot then reports the resting state.
    pub fn step(&mut self) -> FrameSnapshot {
        let ease = self.ease_override.unwrap_or(self.config.ease);
        let diff = self.target - self.current;
        self.current += diff * ease;
        if (self.target - self.current).abs() < self.config.stop_threshold {
            self.current = self.target;
            self.animating = false;
        } else {
            self.animating = true;
        }
        if !self.animating {
            trace!(
                target: "silkscroll_core::engine",
                scroll = self.current,
                "easing loop settled"
            );
        }
        self.snapshot()
    }

    /// The render snapshot for the current state, without advancing.
    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            scroll: self.current,
            translate_y: -self.current,
            body_height: self.geometry.content_height,
            thumb: ThumbMetrics::compute(
                self.current,
                self.geometry.viewport.height,
                self.geometry.content_height,
                self.geometry.track_height,
                self.config.min_thumb_px,
            ),
            animating: self.animating,
            dragging: self.drag.is_some(),
        }
    }

    /// Begin a scrollbar drag session from a thumb pointer-down.
    ///
    /// Captures the pointer's start coordinate and the scroll value at drag
    /// start. A second pointer-down while a session is live restarts it.
    pub fn begin_drag(&mut self, pointer_y: f64) {
        if !pointer_y.is_finite() {
            return;
        }
        self.drag = Some(DragSession {
            start_pointer_y: pointer_y,
            start_scroll: self.current,
        });
        trace!(
            target: "silkscroll_core::engine",
            start_scroll = self.current,
            "drag session started"
        );
    }

    /// Advance a drag session to a new pointer position.
    ///
    /// Returns the *native* scroll offset the host must request — the drag
    /// deliberately routes through the native layer rather than `scroll_to`,
    /// avoiding a feedback loop with the engine's own easing. Returns `None`
    /// when no session is live.
    pub fn drag_to(&mut self, pointer_y: f64) -> Option<f64> {
        let session = self.drag?;
        if !pointer_y.is_finite() {
            return None;
        }
        let thumb = ThumbMetrics::compute(
            self.current,
            self.geometry.viewport.height,
            self.geometry.content_height,
            self.geometry.track_height,
            self.config.min_thumb_px,
        );
        let draggable = thumb.draggable_range(self.geometry.track_height);
        let track_range = if draggable > 0.0 { draggable } else { 1.0 };
        let pointer_delta = pointer_y - session.start_pointer_y;
        let scroll_delta = pointer_delta / track_range * self.geometry.max_scroll();
        Some(self.clamp_offset(session.start_scroll + scroll_delta))
    }

    /// End the drag session, if any.
    pub fn end_drag(&mut self) {
        if self.drag.take().is_some() {
            trace!(target: "silkscroll_core::engine", "drag session ended");
        }
    }

    /// Resynchronize on viewport resize. Never resets `current`/`target`;
    /// clamping happens on the next write.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !viewport.width.is_finite() || !viewport.height.is_finite() {
            return;
        }
        self.geometry.viewport = viewport;
    }

    /// Resynchronize on observed content-size change (async content loading).
    /// Never resets `current`/`target`.
    pub fn set_content_height(&mut self, content_height: f64) {
        if !content_height.is_finite() || content_height < 0.0 {
            return;
        }
        self.geometry.content_height = content_height;
    }

    /// Resynchronize the scrollbar track height.
    pub fn set_track_height(&mut self, track_height: f64) {
        if !track_height.is_finite() || track_height < 0.0 {
            return;
        }
        self.geometry.track_height = track_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop(content_height: f64) -> ScrollEngine {
        ScrollEngine::with_defaults(PageGeometry::new(
            Viewport {
                width: 1280.0,
                height: 800.0,
            },
            content_height,
        ))
        .expect("desktop geometry")
    }

    fn settle(engine: &mut ScrollEngine) -> usize {
        let mut steps = 0;
        while engine.is_animating() {
            engine.step();
            steps += 1;
            assert!(steps < 10_000, "easing loop failed to terminate");
        }
        steps
    }

    // -- Construction gate --

    #[test]
    fn refuses_narrow_viewport() {
        let err = ScrollEngine::with_defaults(PageGeometry::new(
            Viewport {
                width: 768.0,
                height: 800.0,
            },
            3800.0,
        ))
        .unwrap_err();
        assert!(matches!(err, EngineUnavailable::ViewportTooNarrow { .. }));
    }

    #[test]
    fn refuses_non_finite_geometry() {
        let err = ScrollEngine::with_defaults(PageGeometry::new(
            Viewport {
                width: 1280.0,
                height: f64::NAN,
            },
            3800.0,
        ))
        .unwrap_err();
        assert!(matches!(err, EngineUnavailable::InvalidGeometry(_)));
    }

    // -- Clamping --

    #[test]
    fn native_scroll_clamps_to_range() {
        let mut engine = desktop(3800.0);
        engine.on_native_scroll(99_999.0);
        assert_eq!(engine.target(), 3000.0);
        engine.on_native_scroll(-50.0);
        assert_eq!(engine.target(), 0.0);
    }

    #[test]
    fn non_finite_offset_keeps_target() {
        let mut engine = desktop(3800.0);
        engine.on_native_scroll(1200.0);
        engine.on_native_scroll(f64::NAN);
        assert_eq!(engine.target(), 1200.0);
    }

    #[test]
    fn short_content_pins_to_zero() {
        let mut engine = desktop(500.0);
        assert_eq!(engine.max_scroll(), 0.0);
        engine.on_native_scroll(300.0);
        assert_eq!(engine.target(), 0.0);
    }

    // -- Convergence --

    #[test]
    fn converges_exactly_onto_target() {
        let mut engine = desktop(3800.0);
        engine.on_native_scroll(1500.0);
        settle(&mut engine);
        assert_eq!(engine.scroll(), 1500.0);
        assert!(!engine.is_animating());
    }

    #[test]
    fn convergence_is_monotonic_and_never_overshoots() {
        let mut engine = desktop(3800.0);
        engine.on_native_scroll(2000.0);
        let mut previous = engine.scroll();
        while engine.is_animating() {
            let snap = engine.step();
            assert!(snap.scroll >= previous);
            assert!(snap.scroll <= 2000.0);
            previous = snap.scroll;
        }
    }

    #[test]
    fn downward_run_is_non_increasing() {
        let mut engine = desktop(3800.0);
        engine.on_native_scroll(2000.0);
        settle(&mut engine);
        engine.on_native_scroll(400.0);
        let mut previous = engine.scroll();
        while engine.is_animating() {
            let snap = engine.step();
            assert!(snap.scroll <= previous);
            assert!(snap.scroll >= 400.0);
            previous = snap.scroll;
        }
    }

    #[test]
    fn termination_matches_geometric_bound() {
        // |diff| * 0.84^n < 0.3 with diff = 1000 gives n = 47 steps.
        let mut engine = desktop(3800.0);
        engine.on_native_scroll(1000.0);
        let steps = settle(&mut engine);
        let bound = (0.3_f64 / 1000.0).ln() / 0.84_f64.ln();
        assert!(steps <= bound.ceil() as usize + 1, "settled in {steps} steps");
        assert_eq!(engine.scroll(), 1000.0);
    }

    // -- Scheduling --

    #[test]
    fn redundant_start_triggers_are_idempotent() {
        let mut engine = desktop(3800.0);
        for _ in 0..16 {
            engine.on_native_scroll(900.0);
        }
        assert!(engine.is_animating());
        settle(&mut engine);
        assert_eq!(engine.scroll(), 900.0);
    }

    #[test]
    fn step_when_idle_reports_resting_state() {
        let mut engine = desktop(3800.0);
        let snap = engine.step();
        assert_eq!(snap.scroll, 0.0);
        assert!(!snap.animating);
    }

    // -- Redirects --

    #[test]
    fn redirect_before_convergence_lands_on_second_target() {
        let mut engine = desktop(3800.0);
        engine.scroll_to(2500.0, ScrollToOptions::default());
        for _ in 0..3 {
            engine.step();
        }
        engine.scroll_to(500.0, ScrollToOptions::default());
        settle(&mut engine);
        assert_eq!(engine.scroll(), 500.0);
    }

    // -- scroll_to --

    #[test]
    fn scroll_to_returns_clamped_native_request() {
        let mut engine = desktop(3800.0);
        let native = engine.scroll_to(9000.0, ScrollToOptions::default());
        assert_eq!(native, 3000.0);
        assert_eq!(engine.target(), 3000.0);
    }

    #[test]
    fn ease_override_applies_until_native_scroll() {
        let mut engine = desktop(3800.0);
        engine.scroll_to(
            1000.0,
            ScrollToOptions {
                duration_ms: Some(600.0),
                ease: Some(0.5),
            },
        );
        let snap = engine.step();
        assert!((snap.scroll - 500.0).abs() < 1e-9);

        engine.on_native_scroll(1000.0);
        let before = engine.scroll();
        let snap = engine.step();
        let expected = before + (1000.0 - before) * 0.16;
        assert!((snap.scroll - expected).abs() < 1e-9);
    }

    #[test]
    fn invalid_ease_override_is_discarded() {
        let mut engine = desktop(3800.0);
        engine.scroll_to(
            1000.0,
            ScrollToOptions {
                duration_ms: None,
                ease: Some(0.0),
            },
        );
        let snap = engine.step();
        assert!((snap.scroll - 160.0).abs() < 1e-9);
    }

    // -- Drag --

    #[test]
    fn drag_maps_track_delta_to_scroll_range() {
        let mut engine = desktop(3800.0);
        // thumb = max(50, 800 * 800/3800) ≈ 168.42, draggable ≈ 631.58
        engine.begin_drag(100.0);
        let request = engine.drag_to(100.0 + 631.578_947_368_421 / 2.0).unwrap();
        assert!((request - 1500.0).abs() < 1.0);
    }

    #[test]
    fn drag_requests_are_clamped() {
        let mut engine = desktop(3800.0);
        engine.begin_drag(0.0);
        let request = engine.drag_to(100_000.0).unwrap();
        assert_eq!(request, 3000.0);
        let request = engine.drag_to(-100_000.0).unwrap();
        assert_eq!(request, 0.0);
    }

    #[test]
    fn drag_without_session_is_none() {
        let mut engine = desktop(3800.0);
        assert!(engine.drag_to(250.0).is_none());
        engine.begin_drag(10.0);
        engine.end_drag();
        assert!(engine.drag_to(250.0).is_none());
    }

    #[test]
    fn drag_flag_surfaces_in_snapshot() {
        let mut engine = desktop(3800.0);
        engine.begin_drag(10.0);
        assert!(engine.snapshot().dragging);
        engine.end_drag();
        assert!(!engine.snapshot().dragging);
    }

    // -- Resynchronization --

    #[test]
    fn resize_preserves_scroll_state() {
        let mut engine = desktop(3800.0);
        engine.on_native_scroll(1500.0);
        settle(&mut engine);
        engine.set_viewport(Viewport {
            width: 1440.0,
            height: 900.0,
        });
        engine.set_content_height(5000.0);
        assert_eq!(engine.scroll(), 1500.0);
        assert_eq!(engine.target(), 1500.0);
        assert_eq!(engine.max_scroll(), 4100.0);
    }

    #[test]
    fn content_growth_updates_body_height() {
        let mut engine = desktop(3800.0);
        engine.set_content_height(6200.0);
        assert_eq!(engine.snapshot().body_height, 6200.0);
    }
}

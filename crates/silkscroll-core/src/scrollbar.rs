#![forbid(unsafe_code)]

//! Synthetic scrollbar thumb geometry.
//!
//! Derived view state, never authoritative: thumb height and offset are pure
//! functions of the eased scroll value and the page geometry, recomputed on
//! every render step so the scrollbar is always consistent with the scroll
//! state it mirrors.

/// Scrollbar thumb height and offset within the track, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbMetrics {
    /// Thumb height, floored at the configured minimum.
    pub height: f64,
    /// Thumb offset from the top of the track. Never exceeds
    /// `track_height - height`.
    pub offset: f64,
}

impl ThumbMetrics {
    /// Compute the thumb geometry for a scroll position.
    ///
    /// The thumb height is proportional to the visible fraction of the
    /// content (`viewport / content`), floored at `min_thumb_px`; the offset
    /// places the thumb at the scroll progress fraction of the draggable
    /// track range. Degenerate geometry (zero content, zero scroll range)
    /// resolves to a full-height thumb parked at the top.
    #[must_use]
    pub fn compute(
        scroll: f64,
        viewport_height: f64,
        content_height: f64,
        track_height: f64,
        min_thumb_px: f64,
    ) -> Self {
        let max_scroll = (content_height - viewport_height).max(0.0);
        let scroll_range = if max_scroll > 0.0 { max_scroll } else { 1.0 };
        let progress = (scroll / scroll_range).clamp(0.0, 1.0);

        let visible_ratio = if content_height > 0.0 {
            (viewport_height / content_height).min(1.0)
        } else {
            1.0
        };
        let height = (track_height * visible_ratio).max(min_thumb_px).min(track_height);
        let offset = progress * (track_height - height).max(0.0);

        Self { height, offset }
    }

    /// The track distance the thumb can travel.
    #[must_use]
    pub fn draggable_range(&self, track_height: f64) -> f64 {
        (track_height - self.height).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_THUMB: f64 = 50.0;

    // -- Proportionality --

    #[test]
    fn midpoint_scroll_centers_thumb() {
        // viewport 800, content 3800: max scroll 3000; scroll 1500 is 0.5.
        let thumb = ThumbMetrics::compute(1500.0, 800.0, 3800.0, 800.0, MIN_THUMB);
        let draggable = thumb.draggable_range(800.0);
        assert!((thumb.offset / draggable - 0.5).abs() < 1e-9);
    }

    #[test]
    fn offset_tracks_scroll_progress() {
        for i in 0..=10 {
            let scroll = 3000.0 * f64::from(i) / 10.0;
            let thumb = ThumbMetrics::compute(scroll, 800.0, 3800.0, 800.0, MIN_THUMB);
            let draggable = thumb.draggable_range(800.0);
            assert!((thumb.offset / draggable - scroll / 3000.0).abs() < 1e-9);
        }
    }

    // -- Bounds --

    #[test]
    fn offset_never_exceeds_draggable_range() {
        let thumb = ThumbMetrics::compute(99_999.0, 800.0, 3800.0, 800.0, MIN_THUMB);
        assert!(thumb.offset <= 800.0 - thumb.height + 1e-9);
    }

    #[test]
    fn thumb_height_is_floored() {
        // Very tall content would make the proportional thumb 8 px.
        let thumb = ThumbMetrics::compute(0.0, 800.0, 80_000.0, 800.0, MIN_THUMB);
        assert_eq!(thumb.height, MIN_THUMB);
    }

    #[test]
    fn thumb_never_exceeds_track() {
        let thumb = ThumbMetrics::compute(0.0, 800.0, 900.0, 60.0, MIN_THUMB);
        assert!(thumb.height <= 60.0);
        assert_eq!(thumb.offset, 0.0);
    }

    // -- Degenerate geometry --

    #[test]
    fn short_content_parks_full_thumb_at_top() {
        let thumb = ThumbMetrics::compute(0.0, 800.0, 500.0, 800.0, MIN_THUMB);
        assert_eq!(thumb.height, 800.0);
        assert_eq!(thumb.offset, 0.0);
        assert_eq!(thumb.draggable_range(800.0), 0.0);
    }

    #[test]
    fn zero_content_height_is_safe() {
        let thumb = ThumbMetrics::compute(0.0, 800.0, 0.0, 800.0, MIN_THUMB);
        assert_eq!(thumb.height, 800.0);
        assert_eq!(thumb.offset, 0.0);
    }
}

#![forbid(unsafe_code)]

//! Scroll-triggered reveal choreography.
//!
//! Two pieces, both driven by the eased scroll value:
//!
//! - [`RevealSet`] — once-only reveal triggers: an element fires the first
//!   time its top crosses the start line (a configured fraction of the
//!   viewport), carrying its stagger delay. Fired latches survive geometry
//!   refreshes, so a resize never replays a reveal.
//! - [`ParallaxScrub`] — a linear scrub tied to a section's travel through
//!   the viewport, drifting the intro content up and dimming it.

/// One reveal trigger: element geometry plus its animation delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealTrigger {
    /// Element top in content coordinates.
    pub top: f64,
    /// Viewport fraction of the start line; 0.85 fires when the element top
    /// rises above 85% of the viewport height.
    pub start_fraction: f64,
    /// Delay the host applies to the reveal animation, in seconds.
    pub delay_s: f64,
}

/// A trigger that fired during an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealEvent {
    /// Index of the trigger within the set.
    pub index: usize,
    /// Delay carried from the trigger.
    pub delay_s: f64,
}

/// A set of once-only reveal triggers.
#[derive(Debug, Clone, Default)]
pub struct RevealSet {
    triggers: Vec<RevealTrigger>,
    fired: Vec<bool>,
}

impl RevealSet {
    #[must_use]
    pub fn new(triggers: Vec<RevealTrigger>) -> Self {
        let fired = vec![false; triggers.len()];
        Self { triggers, fired }
    }

    /// Build a staggered set over element tops: trigger `i` gets
    /// `base_delay_s + i * stagger_step_s`.
    #[must_use]
    pub fn with_stagger(
        tops: &[f64],
        start_fraction: f64,
        base_delay_s: f64,
        stagger_step_s: f64,
    ) -> Self {
        Self::new(
            tops.iter()
                .enumerate()
                .map(|(i, &top)| RevealTrigger {
                    top,
                    start_fraction,
                    delay_s: base_delay_s + i as f64 * stagger_step_s,
                })
                .collect(),
        )
    }

    /// Number of triggers in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Whether the set has no triggers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Number of triggers that have fired.
    #[must_use]
    pub fn fired_count(&self) -> usize {
        self.fired.iter().filter(|&&f| f).count()
    }

    /// Observe a scroll position; returns newly fired triggers in element
    /// order. A trigger fires once its top rises above the start line
    /// (`scroll + viewport_height * start_fraction`), and never again.
    pub fn observe(&mut self, scroll: f64, viewport_height: f64) -> Vec<RevealEvent> {
        let mut events = Vec::new();
        for (index, trigger) in self.triggers.iter().enumerate() {
            if self.fired[index] {
                continue;
            }
            let start_line = scroll + viewport_height * trigger.start_fraction;
            if trigger.top <= start_line {
                self.fired[index] = true;
                events.push(RevealEvent {
                    index,
                    delay_s: trigger.delay_s,
                });
            }
        }
        events
    }

    /// Refresh trigger geometry after resize or content change. Keeps fired
    /// latches; extra tops beyond the set length are ignored and missing
    /// tops leave their triggers unchanged.
    pub fn refresh_tops(&mut self, tops: &[f64]) {
        for (trigger, &top) in self.triggers.iter_mut().zip(tops) {
            trigger.top = top;
        }
    }
}

/// Style produced by the parallax scrub.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallaxStyle {
    pub translate_y: f64,
    pub opacity: f64,
}

/// Linear parallax scrub over a section's travel through the viewport:
/// starts as the section top enters at the viewport bottom, ends as the
/// section bottom leaves at the viewport top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallaxScrub {
    pub section_top: f64,
    pub section_height: f64,
    /// Translation at full progress (default drift: -50).
    pub max_translate_y: f64,
    /// Opacity at full progress (default dim: 0.6).
    pub min_opacity: f64,
}

impl ParallaxScrub {
    #[must_use]
    pub fn new(section_top: f64, section_height: f64) -> Self {
        Self {
            section_top,
            section_height,
            max_translate_y: -50.0,
            min_opacity: 0.6,
        }
    }

    /// Scrub progress in `[0, 1]` for a scroll position.
    #[must_use]
    pub fn progress(&self, scroll: f64, viewport_height: f64) -> f64 {
        let travel = self.section_height + viewport_height;
        if travel <= 0.0 {
            return 0.0;
        }
        ((scroll + viewport_height - self.section_top) / travel).clamp(0.0, 1.0)
    }

    /// Style at a scroll position.
    #[must_use]
    pub fn style(&self, scroll: f64, viewport_height: f64) -> ParallaxStyle {
        let t = self.progress(scroll, viewport_height);
        ParallaxStyle {
            translate_y: self.max_translate_y * t,
            opacity: 1.0 + (self.min_opacity - 1.0) * t,
        }
    }
}

#![forbid(unsafe_code)]

//! Custom cursor follower and spark trail.
//!
//! The follower eases toward the raw pointer position each frame and leans
//! into its direction of travel; the trail emitter spawns short-lived
//! particles along the pointer path at a fixed interval.
//!
//! Time is host-advanced: every operation that needs a clock takes a
//! millisecond timestamp argument, so the module is deterministic and
//! natively testable. Desktop gating (the same viewport-width threshold as
//! the scroll engine) is the caller's responsibility — on mobile neither the
//! follower nor the trail is constructed.

use std::collections::VecDeque;

/// Tuning knobs for the follower and trail.
#[derive(Debug, Clone)]
pub struct CursorConfig {
    /// Fraction of the remaining distance the follower covers per frame.
    pub follow_ease: f64,
    /// Whether the follower leans into its direction of travel. The playful
    /// page variant keeps the cursor upright instead.
    pub rotate: bool,
    /// Minimum milliseconds between trail particle spawns.
    pub trail_interval_ms: u64,
    /// Maximum live trail particles; the oldest is evicted beyond this.
    pub trail_capacity: usize,
    /// Particle lifetime in milliseconds.
    pub trail_ttl_ms: u64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            follow_ease: 0.15,
            rotate: true,
            trail_interval_ms: 55,
            trail_capacity: 14,
            trail_ttl_ms: 800,
        }
    }
}

/// Per-frame follower output the host applies to the cursor element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorFrame {
    pub x: f64,
    pub y: f64,
    /// Lean angle in degrees; 0 when rotation is disabled or at rest.
    pub angle_deg: f64,
    pub visible: bool,
    pub hover: bool,
    pub active: bool,
}

/// The eased cursor follower with interaction state.
#[derive(Debug, Clone)]
pub struct CursorFollower {
    pointer_x: f64,
    pointer_y: f64,
    eased_x: f64,
    eased_y: f64,
    visible: bool,
    hover: bool,
    active: bool,
    config: CursorConfig,
}

impl CursorFollower {
    #[must_use]
    pub fn new(config: CursorConfig) -> Self {
        Self {
            pointer_x: 0.0,
            pointer_y: 0.0,
            eased_x: 0.0,
            eased_y: 0.0,
            visible: false,
            hover: false,
            active: false,
            config,
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(CursorConfig::default())
    }

    /// Track the raw pointer position.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.pointer_x = x;
        self.pointer_y = y;
        self.visible = true;
    }

    /// Pointer entered the document.
    pub fn pointer_entered(&mut self) {
        self.visible = true;
    }

    /// Pointer left the document; the cursor hides until the next move.
    pub fn pointer_left(&mut self) {
        self.visible = false;
    }

    /// Hover state over an interactive target. Unhovering also clears the
    /// active press, matching pointer-out semantics.
    pub fn set_hover(&mut self, hovering: bool) {
        self.hover = hovering;
        if !hovering {
            self.active = false;
        }
    }

    /// Press state on an interactive target.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Advance the follower one frame and produce the cursor frame.
    pub fn step(&mut self) -> CursorFrame {
        self.eased_x += (self.pointer_x - self.eased_x) * self.config.follow_ease;
        self.eased_y += (self.pointer_y - self.eased_y) * self.config.follow_ease;

        let angle_deg = if self.config.rotate {
            let dx = self.pointer_x - self.eased_x;
            let dy = self.pointer_y - self.eased_y;
            if dx == 0.0 && dy == 0.0 {
                0.0
            } else {
                dy.atan2(dx).to_degrees() + 90.0
            }
        } else {
            0.0
        };

        CursorFrame {
            x: self.eased_x,
            y: self.eased_y,
            angle_deg,
            visible: self.visible,
            hover: self.hover,
            active: self.active,
        }
    }
}

/// One spark along the pointer path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailParticle {
    pub x: f64,
    pub y: f64,
    pub spawned_at_ms: u64,
}

/// Interval-gated, capacity- and TTL-bounded trail emitter.
#[derive(Debug, Clone)]
pub struct TrailEmitter {
    particles: VecDeque<TrailParticle>,
    last_spawn_ms: Option<u64>,
    interval_ms: u64,
    capacity: usize,
    ttl_ms: u64,
}

impl TrailEmitter {
    #[must_use]
    pub fn new(config: &CursorConfig) -> Self {
        Self {
            particles: VecDeque::with_capacity(config.trail_capacity),
            last_spawn_ms: None,
            interval_ms: config.trail_interval_ms,
            capacity: config.trail_capacity.max(1),
            ttl_ms: config.trail_ttl_ms,
        }
    }

    /// Feed a pointer move; spawns a particle when the spawn interval has
    /// elapsed, evicting the oldest beyond capacity. Returns the spawned
    /// particle so the host can materialize its element.
    pub fn pointer_moved(&mut self, x: f64, y: f64, now_ms: u64) -> Option<TrailParticle> {
        if let Some(last) = self.last_spawn_ms
            && now_ms.saturating_sub(last) < self.interval_ms
        {
            return None;
        }
        self.last_spawn_ms = Some(now_ms);
        let particle = TrailParticle {
            x,
            y,
            spawned_at_ms: now_ms,
        };
        if self.particles.len() >= self.capacity {
            self.particles.pop_front();
        }
        self.particles.push_back(particle);
        Some(particle)
    }

    /// Drop particles past their lifetime; returns how many were removed so
    /// the host can retire their elements.
    pub fn prune(&mut self, now_ms: u64) -> usize {
        let before = self.particles.len();
        self.particles
            .retain(|p| now_ms.saturating_sub(p.spawned_at_ms) < self.ttl_ms);
        before - self.particles.len()
    }

    /// Live particle count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether no particles are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Live particles, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TrailParticle> {
        self.particles.iter()
    }
}

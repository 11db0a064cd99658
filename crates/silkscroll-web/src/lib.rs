#![forbid(unsafe_code)]

//! `silkscroll-web` is the browser surface for the Silkscroll engine.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes native scroll
//!   offsets, pointer events, and size changes as normalized input events.
//! - **Deterministic time**: the host advances the clock explicitly
//!   (`step(nowMs)`); nothing here reads a wall clock.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The input schema and frame stats compile and test natively; only the
//! `wasm` module (the `wasm-bindgen` API surface) is gated to `wasm32`.

pub mod frame_stats;
pub mod input;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

/// Stable SilkscrollJS API semver for host-side compatibility checks.
///
/// This is intentionally distinct from crate/package semver: it only moves
/// when the JS-facing surface changes shape.
pub const SILKSCROLL_JS_API_VERSION: &str = "1.0.0";

/// The API line hosts pin against.
pub const SILKSCROLL_JS_API_LINE: &str = "silkscroll-js";

/// Schema version for broadcast subscription records.
pub const SILKSCROLL_JS_EVENT_SCHEMA_VERSION: &str = "scroll-signal-v1";

/// Canonical list of methods the JS surface exports.
pub const SILKSCROLL_JS_PUBLIC_METHODS: [&str; 31] = [
    "apiVersion",
    "apiContract",
    "init",
    "isActive",
    "input",
    "step",
    "scroll",
    "scrollTo",
    "isAnimating",
    "resize",
    "setContentHeight",
    "setTrackHeight",
    "createSubscription",
    "closeSubscription",
    "subscriptionState",
    "drainSubscription",
    "drainSubscriptionJsonl",
    "configureKinetic",
    "kineticStyles",
    "configureReveals",
    "refreshReveals",
    "observeReveals",
    "configureParallax",
    "parallaxStyle",
    "cursorStep",
    "setCursorHover",
    "setCursorActive",
    "drainTrailSpawns",
    "startStats",
    "statsJsonl",
    "statsReport",
];

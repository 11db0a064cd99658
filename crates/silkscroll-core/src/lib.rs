#![forbid(unsafe_code)]

//! Host-agnostic smooth-scroll engine for the web.
//!
//! Silkscroll decouples the browser's native, instantaneous scroll jumps
//! from a visually eased scroll position and makes that eased value the
//! page's canonical scroll signal. The host (normally `silkscroll-web`
//! driven from JS) forwards DOM events and drives one engine step per
//! animation frame; this crate owns every state machine and stays free of
//! browser types so the whole model tests natively.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes native scroll
//!   offsets, pointer events, and size changes.
//! - **Deterministic time**: the host advances the clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! Modules:
//! - [`engine`] — the eased scroll state machine and drag sessions.
//! - [`scrollbar`] — synthetic scrollbar thumb geometry.
//! - [`bus`] — typed broadcast of the eased value to independent consumers.
//! - [`kinetic`] — scroll-driven kinetic typography scrub.
//! - [`reveal`] — once-only reveal triggers and the intro parallax scrub.
//! - [`cursor`] — eased cursor follower and spark trail.

pub mod bus;
pub mod cursor;
pub mod engine;
pub mod kinetic;
pub mod reveal;
pub mod scrollbar;

pub use bus::{ScrollBus, ScrollSignal, SignalRecord, SubscriptionState};
pub use engine::{
    EngineUnavailable, FrameSnapshot, PageGeometry, ScrollConfig, ScrollEngine, ScrollToOptions,
    Viewport,
};
pub use scrollbar::ThumbMetrics;

#![forbid(unsafe_code)]

//! Deterministic, JSON-friendly input schema for `silkscroll-web`.
//!
//! The web host (JS/TS) listens to DOM events and forwards them here in a
//! normalized form: the raw native scroll offset, pointer coordinates in CSS
//! pixels with a pre-resolved "on the scrollbar thumb" flag, and viewport /
//! content geometry changes.
//!
//! This module focuses on:
//! - a compact pointer-button bitset (`buttons: u8`) for logs/traces,
//! - a stable `kind`-tagged JSON encoding suitable for record/replay, and
//! - per-frame coalescing of native scroll events (scroll listeners can fire
//!   several times between animation frames; the engine only needs the most
//!   recent offset once per frame).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Pointer buttons held during an input event.
    ///
    /// These flags are encoded as a compact `u8` bitset in JSON (`buttons`),
    /// matching the DOM `PointerEvent.buttons` convention.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u8 {
        const PRIMARY   = 0b0001;
        const SECONDARY = 0b0010;
        const AUXILIARY = 0b0100;
    }
}

impl PointerButtons {
    #[must_use]
    pub const fn from_bits_truncate_u8(bits: u8) -> Self {
        Self::from_bits_truncate(bits)
    }
}

/// Phase for pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Enter,
    Leave,
}

/// Normalized pointer event in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub x: f64,
    pub y: f64,
    /// Whether the event targeted the synthetic scrollbar thumb. The host
    /// resolves this from the event target; pointer-down on the thumb starts
    /// a drag session.
    pub on_thumb: bool,
    pub buttons: PointerButtons,
}

/// Normalized, deterministic web input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// The browser reported a native scroll offset (unclamped).
    NativeScroll { offset: f64 },
    Pointer(PointerInput),
    /// Viewport resize; `track_height` rides along when the host measured
    /// the scrollbar track in the same layout pass.
    Resize {
        viewport_width: f64,
        viewport_height: f64,
        track_height: Option<f64>,
    },
    /// Observed content-size change (async content loading).
    ContentResize { content_height: f64 },
}

/// JSON encoding used for golden traces and record/replay.
///
/// This is intentionally small and stable: a `kind` tag plus the minimum
/// semantic fields needed for replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEventJson {
    NativeScroll {
        offset: f64,
    },
    Pointer {
        phase: PointerPhase,
        x: f64,
        y: f64,
        #[serde(default)]
        on_thumb: bool,
        buttons: u8,
    },
    Resize {
        viewport_width: f64,
        viewport_height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        track_height: Option<f64>,
    },
    ContentResize {
        content_height: f64,
    },
}

impl InputEvent {
    /// Encode this event as a stable JSON string.
    ///
    /// Errors can occur only if serialization fails (for example, due to an
    /// internal `serde_json` formatting error).
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&InputEventJson::from(self))
    }

    /// Decode a previously encoded event JSON string.
    ///
    /// Errors occur if the JSON does not match the expected schema.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let json: InputEventJson = serde_json::from_str(s)?;
        Ok(Self::from(json))
    }
}

impl From<&InputEvent> for InputEventJson {
    fn from(value: &InputEvent) -> Self {
        match *value {
            InputEvent::NativeScroll { offset } => Self::NativeScroll { offset },
            InputEvent::Pointer(pointer) => Self::Pointer {
                phase: pointer.phase,
                x: pointer.x,
                y: pointer.y,
                on_thumb: pointer.on_thumb,
                buttons: pointer.buttons.bits(),
            },
            InputEvent::Resize {
                viewport_width,
                viewport_height,
                track_height,
            } => Self::Resize {
                viewport_width,
                viewport_height,
                track_height,
            },
            InputEvent::ContentResize { content_height } => Self::ContentResize { content_height },
        }
    }
}

impl From<InputEventJson> for InputEvent {
    fn from(value: InputEventJson) -> Self {
        match value {
            InputEventJson::NativeScroll { offset } => Self::NativeScroll { offset },
            InputEventJson::Pointer {
                phase,
                x,
                y,
                on_thumb,
                buttons,
            } => Self::Pointer(PointerInput {
                phase,
                x,
                y,
                on_thumb,
                buttons: PointerButtons::from_bits_truncate_u8(buttons),
            }),
            InputEventJson::Resize {
                viewport_width,
                viewport_height,
                track_height,
            } => Self::Resize {
                viewport_width,
                viewport_height,
                track_height,
            },
            InputEventJson::ContentResize { content_height } => Self::ContentResize { content_height },
        }
    }
}

/// Coalesces native scroll events within a single frame into one offset.
///
/// Passive scroll listeners can fire several times between animation frames.
/// The coalescer keeps only the most recent offset and counts how many events
/// it absorbed, so the engine applies one target update per frame tick.
#[derive(Debug, Clone, Default)]
pub struct ScrollEventCoalescer {
    latest_offset: Option<f64>,
    event_count: u32,
}

impl ScrollEventCoalescer {
    /// Create a new coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a native scroll offset. Call this for every
    /// `InputEvent::NativeScroll` received.
    pub fn push(&mut self, offset: f64) {
        self.latest_offset = Some(offset);
        self.event_count += 1;
    }

    /// Drain the coalesced offset and reset for the next frame.
    ///
    /// Returns `(latest_offset, event_count)`.
    pub fn drain(&mut self) -> (Option<f64>, u32) {
        let result = (self.latest_offset.take(), self.event_count);
        self.event_count = 0;
        result
    }

    /// Whether any events were accumulated since the last drain.
    #[must_use]
    pub fn has_events(&self) -> bool {
        self.event_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn native_scroll_json_shape() {
        let ev = InputEvent::NativeScroll { offset: 1500.0 };
        let json = ev.to_json_string().expect("serialize");
        assert_eq!(json, r#"{"kind":"native_scroll","offset":1500.0}"#);
    }

    #[test]
    fn pointer_json_roundtrip_is_stable() {
        let ev = InputEvent::Pointer(PointerInput {
            phase: PointerPhase::Down,
            x: 1268.0,
            y: 342.5,
            on_thumb: true,
            buttons: PointerButtons::PRIMARY,
        });
        let j1 = ev.to_json_string().expect("serialize");
        let j2 = ev.to_json_string().expect("serialize");
        assert_eq!(j1, j2);
        let back = InputEvent::from_json_str(&j1).expect("deserialize");
        assert_eq!(ev, back);
    }

    #[test]
    fn resize_omits_absent_track_height() {
        let ev = InputEvent::Resize {
            viewport_width: 1280.0,
            viewport_height: 800.0,
            track_height: None,
        };
        let json = ev.to_json_string().expect("serialize");
        assert!(!json.contains("track_height"));
        let back = InputEvent::from_json_str(&json).expect("deserialize");
        assert_eq!(ev, back);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(InputEvent::from_json_str(r#"{"kind":"gesture","offset":1.0}"#).is_err());
    }

    // -- Coalescer --

    #[test]
    fn coalescer_starts_empty() {
        let c = ScrollEventCoalescer::new();
        assert!(!c.has_events());
        let mut c = c;
        assert_eq!(c.drain(), (None, 0));
    }

    #[test]
    fn coalescer_keeps_the_latest_offset() {
        let mut c = ScrollEventCoalescer::new();
        c.push(100.0);
        c.push(250.0);
        c.push(180.0);
        assert!(c.has_events());
        assert_eq!(c.drain(), (Some(180.0), 3));
        assert!(!c.has_events());
    }

    #[test]
    fn coalescer_drain_resets() {
        let mut c = ScrollEventCoalescer::new();
        c.push(42.0);
        let _ = c.drain();
        assert_eq!(c.drain(), (None, 0));
    }

    proptest! {
        #[test]
        fn event_json_roundtrip(offset in -1e6f64..1e6, x in 0.0f64..4000.0, y in 0.0f64..4000.0, bits in any::<u8>(), on_thumb in any::<bool>()) {
            let events = [
                InputEvent::NativeScroll { offset },
                InputEvent::Pointer(PointerInput {
                    phase: PointerPhase::Move,
                    x,
                    y,
                    on_thumb,
                    buttons: PointerButtons::from_bits_truncate_u8(bits),
                }),
                InputEvent::Resize {
                    viewport_width: x,
                    viewport_height: y,
                    track_height: Some(y),
                },
                InputEvent::ContentResize { content_height: offset.abs() },
            ];
            for ev in events {
                let json = ev.to_json_string().expect("serialize");
                let back = InputEvent::from_json_str(&json).expect("deserialize");
                prop_assert_eq!(ev, back);
            }
        }

        #[test]
        fn coalescer_always_reports_last_push(offsets in prop::collection::vec(-1e6f64..1e6, 1..64)) {
            let mut c = ScrollEventCoalescer::new();
            for &offset in &offsets {
                c.push(offset);
            }
            let (latest, count) = c.drain();
            prop_assert_eq!(latest, offsets.last().copied());
            prop_assert_eq!(count as usize, offsets.len());
        }
    }
}

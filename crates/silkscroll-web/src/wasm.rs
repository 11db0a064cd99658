#![forbid(unsafe_code)]

use crate::frame_stats::{ScrollFrameCollector, ScrollFrameRecord};
use crate::input::{InputEvent, PointerButtons, PointerInput, PointerPhase, ScrollEventCoalescer};
use crate::{
    SILKSCROLL_JS_API_LINE, SILKSCROLL_JS_API_VERSION, SILKSCROLL_JS_EVENT_SCHEMA_VERSION,
    SILKSCROLL_JS_PUBLIC_METHODS,
};
use js_sys::{Array, Object, Reflect};
use silkscroll_core::bus::{ScrollBus, ScrollSignal, SignalRecord, SubscriptionState};
use silkscroll_core::cursor::{CursorConfig, CursorFollower, TrailEmitter, TrailParticle};
use silkscroll_core::engine::{
    EngineUnavailable, FrameSnapshot, PageGeometry, ScrollConfig, ScrollEngine, ScrollToOptions,
    Viewport,
};
use silkscroll_core::kinetic::{KineticLayout, KineticScrub};
use silkscroll_core::reveal::{ParallaxScrub, RevealSet};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

/// Bounded queue limit for trail spawns awaiting a host drain.
const MAX_PENDING_TRAIL_SPAWNS: usize = 64;

fn js_array_from_strings(items: &[&str]) -> Array {
    let arr = Array::new_with_length(items.len() as u32);
    for (idx, item) in items.iter().enumerate() {
        arr.set(idx as u32, JsValue::from_str(item));
    }
    arr
}

fn push_bounded<T>(queue: &mut Vec<T>, item: T, limit: usize) {
    if queue.len() >= limit {
        let overflow = queue.len() - limit + 1;
        queue.drain(..overflow);
    }
    queue.push(item);
}

/// Web/WASM smooth-scroll surface.
///
/// The JS host constructs one instance per page, feeds it normalized DOM
/// events via [`SilkscrollWeb::input`], and drives one
/// [`SilkscrollWeb::step`] per animation frame while `animating` stays true.
/// Every scroll-driven effect on the page reads the eased value exposed
/// here — via `scroll()`, the frame snapshot, or a broadcast subscription —
/// never the raw browser offset.
#[wasm_bindgen]
pub struct SilkscrollWeb {
    engine: Option<ScrollEngine>,
    bus: ScrollBus,
    coalescer: ScrollEventCoalescer,
    kinetic: Option<KineticScrub>,
    reveals: RevealSet,
    parallax: Option<ParallaxScrub>,
    cursor: Option<CursorFollower>,
    trail: Option<TrailEmitter>,
    pending_trail_spawns: Vec<TrailParticle>,
    stats: Option<ScrollFrameCollector>,
    clock_ms: u64,
}

#[wasm_bindgen]
impl SilkscrollWeb {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            engine: None,
            bus: ScrollBus::new(),
            coalescer: ScrollEventCoalescer::new(),
            kinetic: None,
            reveals: RevealSet::default(),
            parallax: None,
            cursor: None,
            trail: None,
            pending_trail_spawns: Vec::new(),
            stats: None,
            clock_ms: 0,
        }
    }

    /// Stable SilkscrollJS API semver for host-side compatibility checks.
    ///
    /// This is intentionally distinct from crate/package semver.
    #[wasm_bindgen(js_name = apiVersion)]
    pub fn api_version(&self) -> String {
        SILKSCROLL_JS_API_VERSION.to_owned()
    }

    /// Canonical API contract snapshot for deterministic host validation.
    ///
    /// Shape:
    /// `{ apiLine, apiVersion, packageName, packageVersion, methods,
    ///    eventSchemaVersion }`
    #[wasm_bindgen(js_name = apiContract)]
    pub fn api_contract(&self) -> JsValue {
        let obj = Object::new();
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("apiLine"),
            &JsValue::from_str(SILKSCROLL_JS_API_LINE),
        );
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("apiVersion"),
            &JsValue::from_str(SILKSCROLL_JS_API_VERSION),
        );
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("packageName"),
            &JsValue::from_str(env!("CARGO_PKG_NAME")),
        );
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("packageVersion"),
            &JsValue::from_str(env!("CARGO_PKG_VERSION")),
        );
        let methods = js_array_from_strings(&SILKSCROLL_JS_PUBLIC_METHODS);
        let _ = Reflect::set(&obj, &JsValue::from_str("methods"), &methods);
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("eventSchemaVersion"),
            &JsValue::from_str(SILKSCROLL_JS_EVENT_SCHEMA_VERSION),
        );
        obj.into()
    }

    /// Initialize the scroll surface from host-measured geometry.
    ///
    /// `options` keys (camelCase):
    /// - `viewportWidth`, `viewportHeight`, `contentHeight` (required numbers)
    /// - `trackHeight` (defaults to the viewport height)
    /// - `ease`, `stopThreshold`, `minViewportWidth`, `minThumbPx`
    /// - `cursorRotate` (bool, defaults to true)
    ///
    /// Returns `{ active, bodyHeight }` — or `{ active: false, reason }` when
    /// the desktop gate rejects the viewport. In that case the surface stays
    /// inert (every later call is a no-op) and the page keeps native
    /// scrolling untouched; this is the degradation contract, not an error.
    /// Malformed options (missing or non-numeric geometry) are errors.
    pub fn init(&mut self, options: JsValue) -> Result<JsValue, JsValue> {
        let viewport_width = get_f64(&options, "viewportWidth")?;
        let viewport_height = get_f64(&options, "viewportHeight")?;
        let content_height = get_f64(&options, "contentHeight")?;
        let track_height = get_f64_opt(&options, "trackHeight")?.unwrap_or(viewport_height);

        let mut config = ScrollConfig::default();
        if let Some(ease) = get_f64_opt(&options, "ease")? {
            config.ease = ease;
        }
        if let Some(stop) = get_f64_opt(&options, "stopThreshold")? {
            config.stop_threshold = stop;
        }
        if let Some(min_width) = get_f64_opt(&options, "minViewportWidth")? {
            config.min_viewport_width = min_width;
        }
        if let Some(min_thumb) = get_f64_opt(&options, "minThumbPx")? {
            config.min_thumb_px = min_thumb;
        }

        let geometry = PageGeometry {
            viewport: Viewport {
                width: viewport_width,
                height: viewport_height,
            },
            content_height,
            track_height,
        };

        match ScrollEngine::new(geometry, config) {
            Ok(engine) => {
                let cursor_config = CursorConfig {
                    rotate: get_bool_opt(&options, "cursorRotate").unwrap_or(true),
                    ..CursorConfig::default()
                };
                self.cursor = Some(CursorFollower::new(cursor_config.clone()));
                self.trail = Some(TrailEmitter::new(&cursor_config));
                self.engine = Some(engine);
                debug!(
                    target: "silkscroll_web::surface",
                    viewport_width,
                    content_height,
                    "surface initialized"
                );
                let obj = Object::new();
                let _ = Reflect::set(&obj, &JsValue::from_str("active"), &JsValue::TRUE);
                let _ = Reflect::set(
                    &obj,
                    &JsValue::from_str("bodyHeight"),
                    &JsValue::from_f64(content_height),
                );
                Ok(obj.into())
            }
            Err(reason @ EngineUnavailable::ViewportTooNarrow { .. }) => {
                debug!(
                    target: "silkscroll_web::surface",
                    viewport_width,
                    "surface abstained; native scrolling untouched"
                );
                let obj = Object::new();
                let _ = Reflect::set(&obj, &JsValue::from_str("active"), &JsValue::FALSE);
                let _ = Reflect::set(
                    &obj,
                    &JsValue::from_str("reason"),
                    &JsValue::from_str(&reason.to_string()),
                );
                Ok(obj.into())
            }
            Err(err) => Err(JsValue::from_str(&err.to_string())),
        }
    }

    /// Whether the surface initialized with a live engine.
    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// Accepts normalized DOM-derived events (see the `input` module schema).
    ///
    /// This method expects an `InputEvent`-shaped JS object (not a raw DOM
    /// event), with a `kind` discriminator. A thumb-drag pointer move returns
    /// `{ nativeScroll }` — the offset the host must hand to the native
    /// scroll layer (the drag deliberately routes through native scrolling
    /// rather than `scrollTo`); every other event returns `null`.
    pub fn input(&mut self, event: JsValue) -> Result<JsValue, JsValue> {
        let ev = parse_input_event(&event)?;
        if self.engine.is_none() {
            return Ok(JsValue::NULL);
        }

        match ev {
            InputEvent::NativeScroll { offset } => {
                self.coalescer.push(offset);
            }
            InputEvent::Pointer(pointer) => {
                return Ok(self.handle_pointer(pointer));
            }
            InputEvent::Resize {
                viewport_width,
                viewport_height,
                track_height,
            } => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.set_viewport(Viewport {
                        width: viewport_width,
                        height: viewport_height,
                    });
                    engine.set_track_height(track_height.unwrap_or(viewport_height));
                }
                if let Some(kinetic) = self.kinetic.as_mut() {
                    let mut layout = kinetic.layout();
                    layout.viewport_height = viewport_height;
                    kinetic.set_layout(layout);
                }
            }
            InputEvent::ContentResize { content_height } => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.set_content_height(content_height);
                }
            }
        }
        Ok(JsValue::NULL)
    }

    fn handle_pointer(&mut self, pointer: PointerInput) -> JsValue {
        let Some(engine) = self.engine.as_mut() else {
            return JsValue::NULL;
        };
        match pointer.phase {
            PointerPhase::Down => {
                if pointer.on_thumb {
                    engine.begin_drag(pointer.y);
                }
            }
            PointerPhase::Move => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.pointer_moved(pointer.x, pointer.y);
                }
                if let Some(trail) = self.trail.as_mut()
                    && let Some(spawn) = trail.pointer_moved(pointer.x, pointer.y, self.clock_ms)
                {
                    push_bounded(
                        &mut self.pending_trail_spawns,
                        spawn,
                        MAX_PENDING_TRAIL_SPAWNS,
                    );
                }
                if engine.is_dragging()
                    && let Some(native) = engine.drag_to(pointer.y)
                {
                    let obj = Object::new();
                    let _ = Reflect::set(
                        &obj,
                        &JsValue::from_str("nativeScroll"),
                        &JsValue::from_f64(native),
                    );
                    return obj.into();
                }
            }
            PointerPhase::Up => {
                engine.end_drag();
            }
            PointerPhase::Enter => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.pointer_entered();
                }
            }
            PointerPhase::Leave => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.pointer_left();
                }
                engine.end_drag();
            }
        }
        JsValue::NULL
    }

    /// Advance the engine one frame and return the render snapshot.
    ///
    /// `nowMs` is the host's monotonic clock (`performance.now()`); it also
    /// times trail pruning. Applies the frame's coalesced native scroll
    /// offset, eases one step, broadcasts the eased value to subscriptions,
    /// and returns
    /// `{ scroll, translateY, bodyHeight, thumb: { height, offset },
    ///    animating, dragging, coalescedEvents, trailPruned }`.
    /// Returns `null` while the surface is inert.
    pub fn step(&mut self, now_ms: f64) -> JsValue {
        if now_ms.is_finite() && now_ms >= 0.0 {
            self.clock_ms = now_ms as u64;
        }
        let Some(engine) = self.engine.as_mut() else {
            return JsValue::NULL;
        };

        let (offset, coalesced) = self.coalescer.drain();
        if let Some(offset) = offset {
            engine.on_native_scroll(offset);
        }

        let snap = engine.step();
        self.bus.publish(ScrollSignal { scroll: snap.scroll });

        if let Some(stats) = self.stats.as_mut() {
            stats.record_frame(ScrollFrameRecord {
                scroll: snap.scroll,
                target: engine.target(),
                thumb_height: snap.thumb.height,
                thumb_offset: snap.thumb.offset,
                animating: snap.animating,
                dragging: snap.dragging,
                coalesced_events: coalesced,
            });
        }

        let pruned = self
            .trail
            .as_mut()
            .map_or(0, |trail| trail.prune(self.clock_ms));

        frame_snapshot_to_js(&snap, coalesced, pruned)
    }

    /// Current eased scroll offset — the canonical scroll position, never
    /// the native browser value. `0` while inert.
    pub fn scroll(&self) -> f64 {
        self.engine.as_ref().map_or(0.0, ScrollEngine::scroll)
    }

    /// Whether another `step` should be scheduled.
    #[wasm_bindgen(js_name = isAnimating)]
    pub fn is_animating(&self) -> bool {
        self.engine
            .as_ref()
            .is_some_and(ScrollEngine::is_animating)
    }

    /// Request an eased scroll to an absolute offset.
    ///
    /// `options` keys: `duration` (accepted for API compatibility but
    /// unused) and `ease` (per-glide override). Returns the
    /// clamped offset the host must synchronously hand to the native scroll
    /// layer. While inert, returns the requested offset unchanged so the
    /// host can fall back to native scrolling.
    #[wasm_bindgen(js_name = scrollTo)]
    pub fn scroll_to(&mut self, offset: f64, options: JsValue) -> Result<f64, JsValue> {
        let Some(engine) = self.engine.as_mut() else {
            return Ok(offset);
        };
        let opts = ScrollToOptions {
            duration_ms: get_f64_opt(&options, "duration")?,
            ease: get_f64_opt(&options, "ease")?,
        };
        Ok(engine.scroll_to(offset, opts))
    }

    /// Resynchronize on viewport resize. Scroll state is preserved.
    pub fn resize(&mut self, viewport_width: f64, viewport_height: f64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_viewport(Viewport {
                width: viewport_width,
                height: viewport_height,
            });
        }
        if let Some(kinetic) = self.kinetic.as_mut() {
            let mut layout = kinetic.layout();
            layout.viewport_height = viewport_height;
            kinetic.set_layout(layout);
        }
    }

    /// Resynchronize on observed content growth. Scroll state is preserved;
    /// the next snapshot carries the new synthetic body height.
    #[wasm_bindgen(js_name = setContentHeight)]
    pub fn set_content_height(&mut self, content_height: f64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_content_height(content_height);
        }
    }

    /// Resynchronize the scrollbar track height.
    #[wasm_bindgen(js_name = setTrackHeight)]
    pub fn set_track_height(&mut self, track_height: f64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_track_height(track_height);
        }
    }

    /// Register a broadcast subscription with bounded buffering.
    ///
    /// `options` keys: `maxBuffered` in `1..=8192` (defaults to 512).
    #[wasm_bindgen(js_name = createSubscription)]
    pub fn create_subscription(&mut self, options: JsValue) -> Result<JsValue, JsValue> {
        let max_buffered = get_f64_opt(&options, "maxBuffered")?
            .map_or(silkscroll_core::bus::DEFAULT_SUBSCRIPTION_BUFFER, |n| {
                n.max(0.0) as usize
            });
        let id = self
            .bus
            .subscribe(max_buffered)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        debug!(
            target: "silkscroll_web::events",
            subscription_id = id,
            active_subscriptions = self.bus.subscription_count(),
            "created subscription"
        );
        let state = self.bus.state(id).expect("state for fresh subscription");
        Ok(subscription_state_to_js(&state))
    }

    /// Dispose a subscription handle and release its queued records.
    #[wasm_bindgen(js_name = closeSubscription)]
    pub fn close_subscription(&mut self, subscription_id: u32) -> bool {
        self.bus.unsubscribe(subscription_id)
    }

    /// Snapshot subscription queue depth/drop counters for host
    /// observability. Returns `null` when the handle does not exist.
    #[wasm_bindgen(js_name = subscriptionState)]
    pub fn subscription_state(&self, subscription_id: u32) -> JsValue {
        self.bus
            .state(subscription_id)
            .map(|s| subscription_state_to_js(&s))
            .unwrap_or(JsValue::NULL)
    }

    /// Drain queued scroll signals as structured JS objects.
    #[wasm_bindgen(js_name = drainSubscription)]
    pub fn drain_subscription(&mut self, subscription_id: u32) -> Result<Array, JsValue> {
        let drained = self
            .bus
            .drain(subscription_id)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let arr = Array::new();
        for record in drained {
            arr.push(&signal_record_to_js(&record));
        }
        Ok(arr)
    }

    /// Drain queued scroll signals as deterministic JSONL records.
    #[wasm_bindgen(js_name = drainSubscriptionJsonl)]
    pub fn drain_subscription_jsonl(
        &mut self,
        subscription_id: u32,
        run_id: String,
    ) -> Result<Array, JsValue> {
        let normalized = run_id.trim();
        if normalized.is_empty() {
            return Err(JsValue::from_str("run_id must not be empty"));
        }
        let drained = self
            .bus
            .drain(subscription_id)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let out = Array::new();
        for (event_idx, record) in drained.into_iter().enumerate() {
            let line = serde_json::json!({
                "schema_version": SILKSCROLL_JS_EVENT_SCHEMA_VERSION,
                "type": "scroll_signal",
                "run_id": normalized,
                "event_idx": event_idx as u64,
                "subscription_id": subscription_id,
                "seq": record.seq,
                "scroll": record.signal.scroll,
                "queue_depth_after": record.queue_depth_after,
                "dropped_total": record.dropped_total,
            });
            if let Ok(line) = serde_json::to_string(&line) {
                out.push(&JsValue::from_str(&line));
            }
        }
        Ok(out)
    }

    /// Configure the kinetic typography section.
    ///
    /// `options` keys: `sectionTop`, `sectionHeight`, `lineCount` (required
    /// numbers). The viewport height is taken from the engine geometry.
    #[wasm_bindgen(js_name = configureKinetic)]
    pub fn configure_kinetic(&mut self, options: JsValue) -> Result<(), JsValue> {
        let Some(engine) = self.engine.as_ref() else {
            return Ok(());
        };
        let layout = KineticLayout {
            section_top: get_f64(&options, "sectionTop")?,
            section_height: get_f64(&options, "sectionHeight")?,
            viewport_height: engine.geometry().viewport.height,
            line_count: get_f64(&options, "lineCount")?.max(0.0) as usize,
        };
        self.kinetic = Some(KineticScrub::new(layout));
        Ok(())
    }

    /// Per-line typography styles for the current eased scroll value.
    ///
    /// Returns an array of `{ opacity, translateY, scale, fontWeight }`, or
    /// `null` when progress moved less than the restyle gate since the last
    /// call (the host skips the style writes entirely).
    #[wasm_bindgen(js_name = kineticStyles)]
    pub fn kinetic_styles(&mut self) -> JsValue {
        let Some(engine) = self.engine.as_ref() else {
            return JsValue::NULL;
        };
        let Some(kinetic) = self.kinetic.as_mut() else {
            return JsValue::NULL;
        };
        let Some(styles) = kinetic.observe(engine.scroll()) else {
            return JsValue::NULL;
        };
        let arr = Array::new();
        for style in styles {
            let obj = Object::new();
            let _ = Reflect::set(
                &obj,
                &JsValue::from_str("opacity"),
                &JsValue::from_f64(style.opacity),
            );
            let _ = Reflect::set(
                &obj,
                &JsValue::from_str("translateY"),
                &JsValue::from_f64(style.translate_y),
            );
            let _ = Reflect::set(
                &obj,
                &JsValue::from_str("scale"),
                &JsValue::from_f64(style.scale),
            );
            let _ = Reflect::set(
                &obj,
                &JsValue::from_str("fontWeight"),
                &JsValue::from_f64(f64::from(style.font_weight)),
            );
            arr.push(&obj);
        }
        arr.into()
    }

    /// Configure reveal triggers from element tops.
    ///
    /// `tops` is a JS array of content-coordinate element tops; `options`
    /// keys: `startFraction` (default 0.85), `baseDelay` and `staggerStep`
    /// in seconds (defaults 0 and 0.1). Replaces the previous set, so fired
    /// latches reset — call once at setup, and use `refreshReveals` for
    /// geometry updates.
    #[wasm_bindgen(js_name = configureReveals)]
    pub fn configure_reveals(&mut self, tops: JsValue, options: JsValue) -> Result<(), JsValue> {
        let tops = parse_f64_array(&tops)?;
        let start_fraction = get_f64_opt(&options, "startFraction")?.unwrap_or(0.85);
        let base_delay = get_f64_opt(&options, "baseDelay")?.unwrap_or(0.0);
        let stagger_step = get_f64_opt(&options, "staggerStep")?.unwrap_or(0.1);
        self.reveals = RevealSet::with_stagger(&tops, start_fraction, base_delay, stagger_step);
        Ok(())
    }

    /// Refresh reveal trigger geometry after a resize. Fired latches are
    /// preserved, so nothing replays.
    #[wasm_bindgen(js_name = refreshReveals)]
    pub fn refresh_reveals(&mut self, tops: JsValue) -> Result<(), JsValue> {
        let tops = parse_f64_array(&tops)?;
        self.reveals.refresh_tops(&tops);
        Ok(())
    }

    /// Newly fired reveal triggers for the current eased scroll value, as
    /// `{ index, delay }` objects in element order. Each trigger fires once.
    #[wasm_bindgen(js_name = observeReveals)]
    pub fn observe_reveals(&mut self) -> Array {
        let arr = Array::new();
        let Some(engine) = self.engine.as_ref() else {
            return arr;
        };
        let viewport_height = engine.geometry().viewport.height;
        for event in self.reveals.observe(engine.scroll(), viewport_height) {
            let obj = Object::new();
            let _ = Reflect::set(
                &obj,
                &JsValue::from_str("index"),
                &JsValue::from_f64(event.index as f64),
            );
            let _ = Reflect::set(
                &obj,
                &JsValue::from_str("delay"),
                &JsValue::from_f64(event.delay_s),
            );
            arr.push(&obj);
        }
        arr
    }

    /// Configure the intro parallax scrub over a section.
    #[wasm_bindgen(js_name = configureParallax)]
    pub fn configure_parallax(&mut self, section_top: f64, section_height: f64) {
        self.parallax = Some(ParallaxScrub::new(section_top, section_height));
    }

    /// Parallax style for the current eased scroll value, as
    /// `{ translateY, opacity }`; `null` while unconfigured or inert.
    #[wasm_bindgen(js_name = parallaxStyle)]
    pub fn parallax_style(&self) -> JsValue {
        let (Some(engine), Some(parallax)) = (self.engine.as_ref(), self.parallax.as_ref()) else {
            return JsValue::NULL;
        };
        let style = parallax.style(engine.scroll(), engine.geometry().viewport.height);
        let obj = Object::new();
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("translateY"),
            &JsValue::from_f64(style.translate_y),
        );
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("opacity"),
            &JsValue::from_f64(style.opacity),
        );
        obj.into()
    }

    /// Advance the cursor follower one frame.
    ///
    /// Returns `{ x, y, angleDeg, visible, hover, active, trailLive }`, or
    /// `null` while inert (mobile keeps the OS cursor).
    #[wasm_bindgen(js_name = cursorStep)]
    pub fn cursor_step(&mut self) -> JsValue {
        let Some(cursor) = self.cursor.as_mut() else {
            return JsValue::NULL;
        };
        let frame = cursor.step();
        let trail_live = self.trail.as_ref().map_or(0, TrailEmitter::len);
        let obj = Object::new();
        let _ = Reflect::set(&obj, &JsValue::from_str("x"), &JsValue::from_f64(frame.x));
        let _ = Reflect::set(&obj, &JsValue::from_str("y"), &JsValue::from_f64(frame.y));
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("angleDeg"),
            &JsValue::from_f64(frame.angle_deg),
        );
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("visible"),
            &JsValue::from_bool(frame.visible),
        );
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("hover"),
            &JsValue::from_bool(frame.hover),
        );
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("active"),
            &JsValue::from_bool(frame.active),
        );
        let _ = Reflect::set(
            &obj,
            &JsValue::from_str("trailLive"),
            &JsValue::from_f64(trail_live as f64),
        );
        obj.into()
    }

    /// Hover state over an interactive target (delegated pointer-over/out).
    #[wasm_bindgen(js_name = setCursorHover)]
    pub fn set_cursor_hover(&mut self, hovering: bool) {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.set_hover(hovering);
        }
    }

    /// Press state on an interactive target (delegated pointer-down/up).
    #[wasm_bindgen(js_name = setCursorActive)]
    pub fn set_cursor_active(&mut self, active: bool) {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.set_active(active);
        }
    }

    /// Drain trail particles spawned since the last drain, as
    /// `{ x, y, spawnedAtMs }` objects, so the host can materialize their
    /// elements.
    #[wasm_bindgen(js_name = drainTrailSpawns)]
    pub fn drain_trail_spawns(&mut self) -> Array {
        let arr = Array::new();
        for spawn in self.pending_trail_spawns.drain(..) {
            let obj = Object::new();
            let _ = Reflect::set(&obj, &JsValue::from_str("x"), &JsValue::from_f64(spawn.x));
            let _ = Reflect::set(&obj, &JsValue::from_str("y"), &JsValue::from_f64(spawn.y));
            let _ = Reflect::set(
                &obj,
                &JsValue::from_str("spawnedAtMs"),
                &JsValue::from_f64(spawn.spawned_at_ms as f64),
            );
            arr.push(&obj);
        }
        arr
    }

    /// Start recording per-frame stats under a run id. Replaces any
    /// previous collector.
    #[wasm_bindgen(js_name = startStats)]
    pub fn start_stats(&mut self, run_id: String) -> Result<(), JsValue> {
        let normalized = run_id.trim();
        if normalized.is_empty() {
            return Err(JsValue::from_str("run_id must not be empty"));
        }
        self.stats = Some(ScrollFrameCollector::new(normalized));
        Ok(())
    }

    /// Recorded frames as JSONL; empty while no collector is running.
    #[wasm_bindgen(js_name = statsJsonl)]
    pub fn stats_jsonl(&self) -> String {
        self.stats
            .as_ref()
            .map_or_else(String::new, ScrollFrameCollector::to_jsonl)
    }

    /// Summary report over recorded frames as a JSON string (`{}` while no
    /// collector is running).
    #[wasm_bindgen(js_name = statsReport)]
    pub fn stats_report(&self) -> String {
        self.stats
            .as_ref()
            .map_or_else(|| "{}".to_string(), |s| s.report().to_json())
    }
}

impl Default for SilkscrollWeb {
    fn default() -> Self {
        Self::new()
    }
}

fn frame_snapshot_to_js(snap: &FrameSnapshot, coalesced: u32, trail_pruned: usize) -> JsValue {
    let thumb = Object::new();
    let _ = Reflect::set(
        &thumb,
        &JsValue::from_str("height"),
        &JsValue::from_f64(snap.thumb.height),
    );
    let _ = Reflect::set(
        &thumb,
        &JsValue::from_str("offset"),
        &JsValue::from_f64(snap.thumb.offset),
    );

    let obj = Object::new();
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("scroll"),
        &JsValue::from_f64(snap.scroll),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("translateY"),
        &JsValue::from_f64(snap.translate_y),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("bodyHeight"),
        &JsValue::from_f64(snap.body_height),
    );
    let _ = Reflect::set(&obj, &JsValue::from_str("thumb"), &thumb);
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("animating"),
        &JsValue::from_bool(snap.animating),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("dragging"),
        &JsValue::from_bool(snap.dragging),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("coalescedEvents"),
        &JsValue::from_f64(f64::from(coalesced)),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("trailPruned"),
        &JsValue::from_f64(trail_pruned as f64),
    );
    obj.into()
}

fn subscription_state_to_js(state: &SubscriptionState) -> JsValue {
    let obj = Object::new();
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("id"),
        &JsValue::from_f64(f64::from(state.id)),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("queueDepth"),
        &JsValue::from_f64(state.queue_depth as f64),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("maxBuffered"),
        &JsValue::from_f64(state.max_buffered as f64),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("emittedTotal"),
        &JsValue::from_f64(state.emitted_total as f64),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("drainedTotal"),
        &JsValue::from_f64(state.drained_total as f64),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("droppedTotal"),
        &JsValue::from_f64(state.dropped_total as f64),
    );
    obj.into()
}

fn signal_record_to_js(record: &SignalRecord) -> JsValue {
    let obj = Object::new();
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("seq"),
        &JsValue::from_f64(record.seq as f64),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("scroll"),
        &JsValue::from_f64(record.signal.scroll),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("queueDepthAfter"),
        &JsValue::from_f64(f64::from(record.queue_depth_after)),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("droppedTotal"),
        &JsValue::from_f64(record.dropped_total as f64),
    );
    obj.into()
}

fn parse_input_event(event: &JsValue) -> Result<InputEvent, JsValue> {
    let kind = get_string(event, "kind")?;
    match kind.as_str() {
        "native_scroll" => Ok(InputEvent::NativeScroll {
            offset: get_f64(event, "offset")?,
        }),
        "pointer" => parse_pointer_event(event),
        "resize" => Ok(InputEvent::Resize {
            viewport_width: get_f64(event, "viewport_width")?,
            viewport_height: get_f64(event, "viewport_height")?,
            track_height: get_f64_opt(event, "track_height")?,
        }),
        "content_resize" => Ok(InputEvent::ContentResize {
            content_height: get_f64(event, "content_height")?,
        }),
        other => Err(JsValue::from_str(&format!("unknown input kind: {other}"))),
    }
}

fn parse_pointer_event(event: &JsValue) -> Result<InputEvent, JsValue> {
    let phase = match get_string(event, "phase")?.as_str() {
        "down" => PointerPhase::Down,
        "move" => PointerPhase::Move,
        "up" => PointerPhase::Up,
        "enter" => PointerPhase::Enter,
        "leave" => PointerPhase::Leave,
        other => {
            return Err(JsValue::from_str(&format!(
                "unknown pointer phase: {other}"
            )));
        }
    };
    let buttons = get_f64_opt(event, "buttons")?.map_or(0u8, |n| {
        if (0.0..=255.0).contains(&n) {
            n as u8
        } else {
            warn!(
                target: "silkscroll_web::input",
                "pointer buttons out of range; treated as none"
            );
            0
        }
    });
    Ok(InputEvent::Pointer(PointerInput {
        phase,
        x: get_f64(event, "x")?,
        y: get_f64(event, "y")?,
        on_thumb: get_bool_opt(event, "on_thumb").unwrap_or(false),
        buttons: PointerButtons::from_bits_truncate_u8(buttons),
    }))
}

fn parse_f64_array(value: &JsValue) -> Result<Vec<f64>, JsValue> {
    if !Array::is_array(value) {
        return Err(JsValue::from_str("expected an array of numbers"));
    }
    let arr = Array::from(value);
    let mut out = Vec::with_capacity(arr.length() as usize);
    for item in arr.iter() {
        let Some(n) = item.as_f64() else {
            return Err(JsValue::from_str("expected an array of numbers"));
        };
        out.push(n);
    }
    Ok(out)
}

fn get_string(obj: &JsValue, key: &str) -> Result<String, JsValue> {
    let v = Reflect::get(obj, &JsValue::from_str(key))?;
    v.as_string()
        .ok_or_else(|| JsValue::from_str(&format!("field {key} must be a string")))
}

fn get_f64(obj: &JsValue, key: &str) -> Result<f64, JsValue> {
    let v = Reflect::get(obj, &JsValue::from_str(key))?;
    let Some(n) = v.as_f64() else {
        return Err(JsValue::from_str(&format!("field {key} must be a number")));
    };
    if !n.is_finite() {
        return Err(JsValue::from_str(&format!("field {key} must be finite")));
    }
    Ok(n)
}

fn get_f64_opt(obj: &JsValue, key: &str) -> Result<Option<f64>, JsValue> {
    if obj.is_null() || obj.is_undefined() {
        return Ok(None);
    }
    let v = Reflect::get(obj, &JsValue::from_str(key))?;
    if v.is_null() || v.is_undefined() {
        return Ok(None);
    }
    let Some(n) = v.as_f64() else {
        return Err(JsValue::from_str(&format!("field {key} must be a number")));
    };
    if !n.is_finite() {
        return Err(JsValue::from_str(&format!("field {key} must be finite")));
    }
    Ok(Some(n))
}

fn get_bool_opt(obj: &JsValue, key: &str) -> Option<bool> {
    if obj.is_null() || obj.is_undefined() {
        return None;
    }
    let v = Reflect::get(obj, &JsValue::from_str(key)).ok()?;
    if v.is_null() || v.is_undefined() {
        return None;
    }
    v.as_bool()
}

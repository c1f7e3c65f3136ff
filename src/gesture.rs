//! Scroll, wheel, and touch coordination for the landing page.
//!
//! One coordinator owns every input-derived piece of UI state: which of the
//! three end-of-page panels is active, whether the nav bar is shown, and
//! whether the viewport sits at the bottom of the document. Raw browser
//! events are normalized by the caller into plain numbers and timestamps, so
//! the whole state machine runs (and is tested) without a browser.
//!
//! Time never comes from a clock in here; every time-dependent operation
//! takes `now_ms` from the caller.

/// The three mutually exclusive end-of-page panels, in sequence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Themes,
    Map,
    Community,
}

impl Panel {
    /// Position in the fixed Themes → Map → Community sequence.
    pub fn index(self) -> u8 {
        match self {
            Panel::Themes => 0,
            Panel::Map => 1,
            Panel::Community => 2,
        }
    }

    fn forward(self) -> Option<Panel> {
        match self {
            Panel::Themes => Some(Panel::Map),
            Panel::Map => Some(Panel::Community),
            Panel::Community => None,
        }
    }

    fn backward(self) -> Option<Panel> {
        match self {
            Panel::Themes => None,
            Panel::Map => Some(Panel::Themes),
            Panel::Community => Some(Panel::Map),
        }
    }
}

/// Which modality most recently produced input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    None,
    Touch,
    Wheel,
    Mouse,
}

/// Empirically tuned gesture constants.
///
/// The figures were carried over from field tuning of the original site;
/// they are grouped here so the feel of the page can be adjusted in one
/// place.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    /// Minimum gap between effective scroll samples.
    pub scroll_throttle_ms: f64,
    /// Scroll delta below which the nav bar does not react.
    pub nav_delta_min: f64,
    /// Delta below which the transition function ignores a gesture outright.
    pub gesture_dead_zone: f64,
    /// Touch-move jitter floor; smaller moves are dropped.
    pub touch_jitter_min: f64,
    /// Touch threshold for crossing the Themes ↔ Map edge.
    pub touch_edge_near: f64,
    /// Touch threshold for crossing the Map ↔ Community edge.
    pub touch_edge_deep: f64,
    /// Wheel accumulator magnitude required before a transition is attempted.
    pub wheel_accum_min: f64,
    /// Mean of the recent wheel deltas required alongside the accumulator.
    pub wheel_avg_min: f64,
    /// Maximum gap between wheel events still coalesced into one gesture.
    pub wheel_gap_ms: f64,
    /// Idle time after which wheel gesture state is discarded.
    pub wheel_idle_ms: f64,
    /// Slack below the document end still counted as "at bottom".
    pub bottom_slack_px: f64,
    /// Re-entrancy lockout after a touch transition, matching the panel
    /// transition duration in the stylesheet.
    pub lockout_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            scroll_throttle_ms: 16.0,
            nav_delta_min: 10.0,
            gesture_dead_zone: 10.0,
            touch_jitter_min: 5.0,
            touch_edge_near: 30.0,
            touch_edge_deep: 50.0,
            wheel_accum_min: 100.0,
            wheel_avg_min: 30.0,
            wheel_gap_ms: 150.0,
            wheel_idle_ms: 500.0,
            bottom_slack_px: 10.0,
            lockout_ms: 350.0,
        }
    }
}

/// How many recent wheel deltas feed the average gate.
const WHEEL_BUFFER_LEN: usize = 3;

/// Distinguishes a deliberate trackpad/wheel swipe from incidental scrolling.
///
/// Deltas arriving within the coalescing window accumulate; a gap restarts
/// the accumulator and idling clears everything.
#[derive(Debug)]
struct WheelAccumulator {
    buffer: Vec<f64>,
    accumulated: f64,
    last_event_ms: f64,
}

impl WheelAccumulator {
    fn new() -> Self {
        WheelAccumulator {
            buffer: Vec::with_capacity(WHEEL_BUFFER_LEN),
            accumulated: 0.0,
            last_event_ms: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, tuning: &Tuning, now_ms: f64, delta_y: f64) {
        let gap = now_ms - self.last_event_ms;
        if gap > tuning.wheel_idle_ms {
            self.reset();
        }

        if self.buffer.len() == WHEEL_BUFFER_LEN {
            self.buffer.remove(0);
        }
        self.buffer.push(delta_y);

        if gap < tuning.wheel_gap_ms {
            self.accumulated += delta_y;
        } else {
            self.accumulated = delta_y;
        }
        self.last_event_ms = now_ms;
    }

    fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        self.buffer.iter().sum::<f64>() / self.buffer.len() as f64
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.accumulated = 0.0;
    }
}

/// Unified input state machine for the page.
///
/// Mutated only from event handlers on the single browser thread; the touch
/// lockout is a deadline checked against caller-supplied time, not a timer.
#[derive(Debug)]
pub struct GestureCoordinator {
    tuning: Tuning,
    panel: Panel,
    input_kind: InputKind,
    nav_visible: bool,
    menu_open: bool,
    at_bottom: bool,
    scroll_percentage: f64,
    prev_scroll_y: f64,
    last_scroll_ms: f64,
    wheel: WheelAccumulator,
    touch_start_y: f64,
    touch_last_y: f64,
    lockout_until_ms: f64,
}

impl Default for GestureCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureCoordinator {
    pub fn new() -> Self {
        Self::with_tuning(Tuning::default())
    }

    pub fn with_tuning(tuning: Tuning) -> Self {
        GestureCoordinator {
            tuning,
            panel: Panel::Themes,
            input_kind: InputKind::None,
            nav_visible: true,
            menu_open: false,
            at_bottom: false,
            scroll_percentage: 0.0,
            prev_scroll_y: 0.0,
            last_scroll_ms: f64::NEG_INFINITY,
            wheel: WheelAccumulator::new(),
            touch_start_y: 0.0,
            touch_last_y: 0.0,
            lockout_until_ms: f64::NEG_INFINITY,
        }
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn input_kind(&self) -> InputKind {
        self.input_kind
    }

    pub fn nav_visible(&self) -> bool {
        self.nav_visible
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    /// Document scroll progress, 0–100.
    pub fn scroll_percentage(&self) -> f64 {
        self.scroll_percentage
    }

    /// The "swipe down" affordance is shown only while the sequence has not
    /// been entered. Derived, so it can never disagree with the panel state.
    pub fn swipe_hint_visible(&self) -> bool {
        self.panel == Panel::Themes
    }

    /// Running wheel accumulator value.
    pub fn wheel_accumulated(&self) -> f64 {
        self.wheel.accumulated
    }

    /// Whether a touch transition is still animating at `now_ms`.
    pub fn locked_out(&self, now_ms: f64) -> bool {
        now_ms < self.lockout_until_ms
    }

    /// Throttled scroll sample. `scroll_y` is the current vertical offset,
    /// `viewport_h` the window height, `doc_h` the full document height.
    pub fn on_scroll(&mut self, now_ms: f64, scroll_y: f64, viewport_h: f64, doc_h: f64) {
        if viewport_h <= 0.0 || doc_h <= 0.0 {
            return;
        }
        if now_ms - self.last_scroll_ms < self.tuning.scroll_throttle_ms {
            return;
        }
        self.last_scroll_ms = now_ms;

        let delta = scroll_y - self.prev_scroll_y;
        self.prev_scroll_y = scroll_y;
        self.recompute_bottom(scroll_y, viewport_h, doc_h);

        // Touch drives nav visibility from its own handlers.
        if self.input_kind != InputKind::Touch {
            self.update_nav(delta);
        }
    }

    /// Resize tick: re-derive bottom state from fresh geometry without
    /// producing a scroll delta.
    pub fn on_resize(&mut self, scroll_y: f64, viewport_h: f64, doc_h: f64) {
        if viewport_h <= 0.0 || doc_h <= 0.0 {
            return;
        }
        self.prev_scroll_y = scroll_y;
        self.recompute_bottom(scroll_y, viewport_h, doc_h);
    }

    /// Wheel event. Returns true when the caller should cancel the native
    /// scroll (the panel sequence is open and owns the gesture).
    pub fn on_wheel(&mut self, now_ms: f64, delta_y: f64) -> bool {
        self.input_kind = InputKind::Wheel;
        let capture = self.panel != Panel::Themes;

        self.wheel.push(&self.tuning, now_ms, delta_y);
        let accumulated = self.wheel.accumulated;
        let average = self.wheel.average();

        let deliberate = accumulated.abs() > self.tuning.wheel_accum_min
            && average.abs() > self.tuning.wheel_avg_min;
        if deliberate && (self.at_bottom || self.panel != Panel::Themes) {
            // The transition clears the accumulator on success, so one large
            // gesture cannot fire twice.
            self.apply_transition(accumulated, InputKind::Wheel);
        }
        capture
    }

    pub fn on_touch_start(&mut self, y: f64) {
        self.touch_start_y = y;
        self.touch_last_y = y;
        self.input_kind = InputKind::Touch;
        self.lockout_until_ms = f64::NEG_INFINITY;
    }

    /// Touch drag sample. Returns true when the caller should cancel the
    /// native scroll for this move.
    pub fn on_touch_move(&mut self, now_ms: f64, y: f64) -> bool {
        if self.locked_out(now_ms) {
            return false;
        }

        // Positive = finger moving up = content scrolling down.
        let touch_delta = self.touch_last_y - y;
        self.touch_last_y = y;
        if touch_delta.abs() < self.tuning.touch_jitter_min {
            return false;
        }
        self.input_kind = InputKind::Touch;
        self.update_nav(touch_delta);

        (self.at_bottom && touch_delta > 0.0) || self.panel != Panel::Themes
    }

    /// End of a touch interaction; the only place a touch gesture can change
    /// the active panel.
    pub fn on_touch_end(&mut self, now_ms: f64, y: f64) {
        if self.locked_out(now_ms) {
            return;
        }

        let total_delta = self.touch_start_y - y;
        if total_delta.abs() > self.tuning.touch_edge_near {
            // Lock regardless of whether the transition lands, so a bounce
            // at the end of the swipe cannot re-trigger mid-animation.
            self.lockout_until_ms = now_ms + self.tuning.lockout_ms;
            self.apply_transition(total_delta, InputKind::Touch);
            self.update_nav(total_delta);
        }
    }

    pub fn on_mouse_move(&mut self) {
        if self.input_kind != InputKind::Touch {
            self.input_kind = InputKind::Mouse;
        }
    }

    /// Direct activation from a nav link: may jump to any panel, bypassing
    /// adjacency and thresholds.
    pub fn set_panel(&mut self, panel: Panel) {
        self.panel = panel;
        self.wheel.reset();
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }

    fn recompute_bottom(&mut self, scroll_y: f64, viewport_h: f64, doc_h: f64) {
        self.at_bottom = scroll_y + viewport_h >= doc_h - self.tuning.bottom_slack_px;

        let scrollable = doc_h - viewport_h;
        self.scroll_percentage = if scrollable > 0.0 {
            (scroll_y / scrollable * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };

        // Scrolling back up through page content while a panel is open
        // unwinds the whole sequence.
        if !self.at_bottom && self.panel != Panel::Themes {
            self.panel = Panel::Themes;
            self.wheel.reset();
        }
    }

    fn update_nav(&mut self, delta: f64) {
        if delta.abs() <= self.tuning.nav_delta_min {
            return;
        }
        if delta > 0.0 {
            self.nav_visible = false;
            // A hidden nav cannot host an open menu.
            self.menu_open = false;
        } else {
            self.nav_visible = true;
        }
    }

    /// Attempt a single step through the panel sequence.
    ///
    /// Positive deltas advance, negative retreat. Advancing out of Themes is
    /// gated on the page being at the bottom; retreating never is. Each edge
    /// carries its own threshold per input kind.
    fn apply_transition(&mut self, delta: f64, kind: InputKind) -> bool {
        if delta.abs() < self.tuning.gesture_dead_zone {
            return false;
        }

        let from = self.panel;
        let to = if delta > 0.0 {
            from.forward()
        } else {
            from.backward()
        };
        let Some(to) = to else {
            return false;
        };

        if to.index() > from.index() && from == Panel::Themes && !self.at_bottom {
            return false;
        }

        let threshold = match kind {
            InputKind::Touch => {
                if from == Panel::Community || to == Panel::Community {
                    self.tuning.touch_edge_deep
                } else {
                    self.tuning.touch_edge_near
                }
            }
            InputKind::Wheel => self.tuning.wheel_accum_min,
            InputKind::None | InputKind::Mouse => return false,
        };
        if delta.abs() <= threshold {
            return false;
        }

        self.panel = to;
        self.wheel.reset();
        true
    }
}

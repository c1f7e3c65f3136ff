#![cfg(not(target_arch = "wasm32"))]

//! Host-side tests for the gesture state machine. All time and geometry is
//! injected, so these run without a browser.

use village_wasm::gesture::{GestureCoordinator, InputKind, Panel};

const VIEWPORT_H: f64 = 600.0;
const DOC_H: f64 = 2000.0;
const BOTTOM_Y: f64 = DOC_H - VIEWPORT_H;

fn scroll_to_bottom(gc: &mut GestureCoordinator) {
    gc.on_resize(BOTTOM_Y, VIEWPORT_H, DOC_H);
    assert!(gc.at_bottom());
}

fn scroll_to_top(gc: &mut GestureCoordinator) {
    gc.on_resize(0.0, VIEWPORT_H, DOC_H);
    assert!(!gc.at_bottom());
}

/// One full swipe: anchor at 500, release displaced by `delta` (positive =
/// finger moved up = forward through the sequence).
fn touch_swipe(gc: &mut GestureCoordinator, now_ms: f64, delta: f64) {
    gc.on_touch_start(500.0);
    gc.on_touch_end(now_ms, 500.0 - delta);
}

#[test]
fn touch_swipe_round_trip_through_map() {
    let mut gc = GestureCoordinator::new();

    scroll_to_top(&mut gc);
    touch_swipe(&mut gc, 0.0, 40.0);
    assert_eq!(gc.panel(), Panel::Themes, "gated above the bottom");

    scroll_to_bottom(&mut gc);
    touch_swipe(&mut gc, 1000.0, 40.0);
    assert_eq!(gc.panel(), Panel::Map);
    assert!(!gc.swipe_hint_visible());

    touch_swipe(&mut gc, 2000.0, -40.0);
    assert_eq!(gc.panel(), Panel::Themes);
    assert!(gc.swipe_hint_visible());
}

#[test]
fn wheel_burst_advances_map_to_community() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);
    gc.set_panel(Panel::Map);

    gc.on_wheel(0.0, 50.0);
    gc.on_wheel(50.0, 50.0);
    assert_eq!(gc.panel(), Panel::Map, "accumulator must exceed the gate");

    gc.on_wheel(100.0, 50.0);
    assert_eq!(gc.panel(), Panel::Community);
    assert!(!gc.swipe_hint_visible());
    assert_eq!(gc.wheel_accumulated(), 0.0, "transition clears the gesture");
}

#[test]
fn a_single_gesture_moves_one_panel_at_most() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);

    touch_swipe(&mut gc, 0.0, 10_000.0);
    assert_eq!(gc.panel(), Panel::Map);

    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);
    gc.on_wheel(0.0, 10_000.0);
    assert_eq!(gc.panel(), Panel::Map);
}

#[test]
fn wheel_is_gated_on_the_bottom_of_the_page() {
    let mut gc = GestureCoordinator::new();
    scroll_to_top(&mut gc);

    gc.on_wheel(0.0, 80.0);
    gc.on_wheel(60.0, 80.0);
    gc.on_wheel(120.0, 80.0);
    assert_eq!(gc.panel(), Panel::Themes);
}

#[test]
fn wheel_retreats_without_a_bottom_precondition() {
    let mut gc = GestureCoordinator::new();
    scroll_to_top(&mut gc);
    gc.set_panel(Panel::Community);

    gc.on_wheel(0.0, -50.0);
    gc.on_wheel(60.0, -50.0);
    gc.on_wheel(120.0, -50.0);
    assert_eq!(gc.panel(), Panel::Map);
}

#[test]
fn leaving_the_bottom_resets_the_sequence() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);
    gc.set_panel(Panel::Map);

    gc.on_scroll(100.0, 1000.0, VIEWPORT_H, DOC_H);
    assert!(!gc.at_bottom());
    assert_eq!(gc.panel(), Panel::Themes);
    assert!(gc.swipe_hint_visible());
}

#[test]
fn touch_lockout_swallows_a_second_release() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);

    gc.on_touch_start(500.0);
    gc.on_touch_end(0.0, 460.0);
    assert_eq!(gc.panel(), Panel::Map);

    // Same interaction bounces again 100ms later: still animating, ignored.
    gc.on_touch_end(100.0, 400.0);
    assert_eq!(gc.panel(), Panel::Map);

    // After the animation window the next release lands.
    gc.on_touch_end(400.0, 440.0);
    assert_eq!(gc.panel(), Panel::Community);
}

#[test]
fn a_new_touch_clears_the_lockout() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);

    gc.on_touch_start(500.0);
    gc.on_touch_end(0.0, 460.0);
    assert_eq!(gc.panel(), Panel::Map);

    gc.on_touch_start(500.0);
    gc.on_touch_end(100.0, 420.0);
    assert_eq!(gc.panel(), Panel::Community);
}

#[test]
fn small_wheel_ticks_never_transition() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);

    // Plenty of accumulation, but the recent average stays below the gate.
    let mut now = 0.0;
    for _ in 0..20 {
        gc.on_wheel(now, 20.0);
        now += 100.0;
    }
    assert_eq!(gc.panel(), Panel::Themes);
}

#[test]
fn idle_wheel_state_is_discarded() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);

    gc.on_wheel(0.0, 80.0);
    gc.on_wheel(600.0, 80.0);
    assert_eq!(gc.wheel_accumulated(), 80.0);
    assert_eq!(gc.panel(), Panel::Themes);
}

#[test]
fn a_gap_outside_the_coalescing_window_restarts_accumulation() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);

    gc.on_wheel(0.0, 80.0);
    gc.on_wheel(200.0, 80.0);
    assert_eq!(gc.wheel_accumulated(), 80.0);
}

#[test]
fn scroll_direction_drives_nav_visibility() {
    let mut gc = GestureCoordinator::new();
    assert!(gc.nav_visible());

    gc.on_scroll(0.0, 100.0, VIEWPORT_H, DOC_H);
    assert!(!gc.nav_visible(), "scrolling down hides the nav");

    gc.on_scroll(100.0, 50.0, VIEWPORT_H, DOC_H);
    assert!(gc.nav_visible(), "scrolling up shows it again");

    // Sub-threshold wiggle changes nothing.
    gc.on_scroll(200.0, 55.0, VIEWPORT_H, DOC_H);
    assert!(gc.nav_visible());
}

#[test]
fn hiding_the_nav_closes_the_mobile_menu() {
    let mut gc = GestureCoordinator::new();
    gc.toggle_menu();
    assert!(gc.menu_open());

    gc.on_scroll(0.0, 100.0, VIEWPORT_H, DOC_H);
    assert!(!gc.nav_visible());
    assert!(!gc.menu_open());
}

#[test]
fn scroll_samples_are_throttled() {
    let mut gc = GestureCoordinator::new();

    gc.on_scroll(0.0, 100.0, VIEWPORT_H, DOC_H);
    gc.on_scroll(10.0, BOTTOM_Y, VIEWPORT_H, DOC_H);
    assert!(!gc.at_bottom(), "sample inside the throttle window is dropped");

    gc.on_scroll(20.0, BOTTOM_Y, VIEWPORT_H, DOC_H);
    assert!(gc.at_bottom());
}

#[test]
fn touch_moves_drive_nav_and_ignore_jitter() {
    let mut gc = GestureCoordinator::new();
    gc.on_touch_start(500.0);

    gc.on_touch_move(0.0, 497.0);
    assert!(gc.nav_visible(), "3px of jitter is not a gesture");

    gc.on_touch_move(10.0, 480.0);
    assert!(!gc.nav_visible());

    // While touch is the active modality the scroll handler leaves the nav
    // alone.
    gc.on_scroll(100.0, 20.0, VIEWPORT_H, DOC_H);
    assert!(!gc.nav_visible());
}

#[test]
fn mouse_movement_never_overrides_an_active_touch() {
    let mut gc = GestureCoordinator::new();
    gc.on_touch_start(500.0);
    gc.on_mouse_move();
    assert_eq!(gc.input_kind(), InputKind::Touch);

    gc.on_wheel(0.0, 5.0);
    gc.on_mouse_move();
    assert_eq!(gc.input_kind(), InputKind::Mouse);
}

#[test]
fn nav_links_jump_anywhere() {
    let mut gc = GestureCoordinator::new();
    scroll_to_top(&mut gc);

    gc.set_panel(Panel::Community);
    assert_eq!(gc.panel(), Panel::Community);
    assert!(!gc.swipe_hint_visible());

    gc.set_panel(Panel::Themes);
    assert!(gc.swipe_hint_visible());
}

#[test]
fn the_community_edge_needs_a_deeper_touch() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);
    gc.set_panel(Panel::Map);

    touch_swipe(&mut gc, 0.0, 40.0);
    assert_eq!(gc.panel(), Panel::Map, "40px is below the deep threshold");

    touch_swipe(&mut gc, 1000.0, 60.0);
    assert_eq!(gc.panel(), Panel::Community);
}

#[test]
fn scroll_percentage_tracks_document_progress() {
    let mut gc = GestureCoordinator::new();

    gc.on_scroll(0.0, 700.0, VIEWPORT_H, DOC_H);
    assert!((gc.scroll_percentage() - 50.0).abs() < 0.1);

    gc.on_scroll(100.0, BOTTOM_Y, VIEWPORT_H, DOC_H);
    assert!((gc.scroll_percentage() - 100.0).abs() < 0.1);
}

#[test]
fn degenerate_geometry_is_a_noop() {
    let mut gc = GestureCoordinator::new();
    gc.on_scroll(0.0, 100.0, 0.0, 0.0);
    gc.on_resize(0.0, -1.0, DOC_H);
    assert!(!gc.at_bottom());
    assert_eq!(gc.scroll_percentage(), 0.0);
}

#[test]
fn open_panels_capture_the_native_scroll() {
    let mut gc = GestureCoordinator::new();
    scroll_to_bottom(&mut gc);

    assert!(!gc.on_wheel(0.0, 5.0), "closed sequence scrolls normally");
    gc.set_panel(Panel::Map);
    assert!(gc.on_wheel(100.0, 5.0));

    gc.on_touch_start(500.0);
    assert!(gc.on_touch_move(200.0, 480.0));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// No single gesture event may move the sequence by more than one
        /// panel.
        #[test]
        fn wheel_gestures_never_skip(deltas in prop::collection::vec(-300.0f64..300.0, 1..50)) {
            let mut gc = GestureCoordinator::new();
            gc.on_resize(BOTTOM_Y, VIEWPORT_H, DOC_H);
            let mut now = 0.0;
            for delta in deltas {
                let before = gc.panel().index() as i8;
                gc.on_wheel(now, delta);
                let after = gc.panel().index() as i8;
                prop_assert!((after - before).abs() <= 1);
                now += 40.0;
            }
        }

        /// Above the bottom of the page, no gesture of any kind can open the
        /// sequence.
        #[test]
        fn panels_stay_closed_above_the_bottom(
            ops in prop::collection::vec((0u8..2u8, -400.0f64..400.0), 1..60),
        ) {
            let mut gc = GestureCoordinator::new();
            gc.on_resize(0.0, VIEWPORT_H, DOC_H);
            let mut now = 0.0;
            for (kind, delta) in ops {
                if kind == 0 {
                    gc.on_wheel(now, delta);
                } else {
                    gc.on_touch_start(500.0);
                    gc.on_touch_end(now, 500.0 - delta);
                }
                prop_assert_eq!(gc.panel(), Panel::Themes);
                now += 60.0;
            }
        }
    }
}

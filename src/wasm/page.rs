//! Page controller: translates DOM events into gesture-coordinator calls and
//! projects coordinator state back onto the document as CSS classes.
//!
//! The stylesheet owns every transform and transition; this module only
//! flips classes, so each projection is idempotent and cheap enough to run
//! after every event.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, TouchEvent, WheelEvent,
    Window,
};

use crate::carousel::Carousel;
use crate::gesture::{GestureCoordinator, Panel};

/// First day of the event: 2025-05-07T00:00:00Z.
const EVENT_START_MS: f64 = 1_746_576_000_000.0;
/// One themed slide unlocks per day.
const SLIDE_UNLOCK_MS: f64 = 86_400_000.0;
/// How often the carousel re-checks the wall clock for a new unlock.
const CAROUSEL_RESYNC_MS: i32 = 60_000;

type Listener = (EventTarget, &'static str, Closure<dyn FnMut(Event)>);

/// Mounted page. Holds every registered closure so [`Page::unmount`] can
/// detach them again.
pub struct Page {
    window: Window,
    listeners: Vec<Listener>,
    resync_id: Option<i32>,
    _resync: Option<Closure<dyn FnMut()>>,
}

/// The static-markup elements the controller drives. Every field is
/// optional: a missing element just means that affordance stays inert.
struct View {
    nav: Option<Element>,
    menu_button: Option<Element>,
    menu: Option<Element>,
    hint: Option<Element>,
    stage: Option<Element>,
    carousel_track: Option<Element>,
    carousel_next: Option<Element>,
    carousel_prev: Option<Element>,
}

impl View {
    fn query(document: &Document) -> View {
        let by_id = |id: &str| document.get_element_by_id(id);
        View {
            nav: by_id("site-nav"),
            menu_button: by_id("menu-toggle"),
            menu: by_id("mobile-menu"),
            hint: by_id("swipe-hint"),
            stage: by_id("panel-stage"),
            carousel_track: by_id("carousel-track"),
            carousel_next: by_id("carousel-next"),
            carousel_prev: by_id("carousel-prev"),
        }
    }
}

pub fn mount(window: &Window, document: &Document) -> Result<Page, JsValue> {
    let gestures = Rc::new(RefCell::new(GestureCoordinator::new()));
    let view = Rc::new(View::query(document));
    let carousel = Rc::new(RefCell::new(Carousel::new(EVENT_START_MS, SLIDE_UNLOCK_MS)));

    carousel.borrow_mut().sync(js_sys::Date::now());
    if let Some((y, vh, dh)) = scroll_metrics(window, document) {
        gestures.borrow_mut().on_resize(y, vh, dh);
    }
    project(&view, &gestures.borrow());
    project_carousel(&view, &carousel.borrow());

    let mut listeners: Vec<Listener> = Vec::new();
    let passive_off = AddEventListenerOptions::new();
    passive_off.set_passive(false);

    // Scroll: throttled sampling of the page position.
    {
        let gestures = gestures.clone();
        let view = view.clone();
        let window_c = window.clone();
        let document = document.clone();
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            if let Some((y, vh, dh)) = scroll_metrics(&window_c, &document) {
                gestures.borrow_mut().on_scroll(now_ms(&window_c), y, vh, dh);
            }
            project(&view, &gestures.borrow());
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref())?;
        listeners.push((window.clone().into(), "scroll", closure));
    }

    // Resize changes the bottom-of-page geometry.
    {
        let gestures = gestures.clone();
        let view = view.clone();
        let window_c = window.clone();
        let document = document.clone();
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            if let Some((y, vh, dh)) = scroll_metrics(&window_c, &document) {
                gestures.borrow_mut().on_resize(y, vh, dh);
            }
            project(&view, &gestures.borrow());
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        listeners.push((window.clone().into(), "resize", closure));
    }

    // Wheel owns panel transitions for mouse/trackpad input. Registered
    // non-passive so the native scroll can be cancelled while the panel
    // sequence is open.
    {
        let gestures = gestures.clone();
        let view = view.clone();
        let window_c = window.clone();
        let closure = Closure::wrap(Box::new(move |event: Event| {
            let Some(delta_y) = event.dyn_ref::<WheelEvent>().map(|w| w.delta_y()) else {
                return;
            };
            let capture = gestures.borrow_mut().on_wheel(now_ms(&window_c), delta_y);
            if capture {
                event.prevent_default();
            }
            project(&view, &gestures.borrow());
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "wheel",
            closure.as_ref().unchecked_ref(),
            &passive_off,
        )?;
        listeners.push((window.clone().into(), "wheel", closure));
    }

    // Touch: start records the anchor, move drives nav visibility, end is
    // the only place a swipe can change panels.
    {
        let gestures = gestures.clone();
        let closure = Closure::wrap(Box::new(move |event: Event| {
            if let Some(y) = first_touch_y(&event, false) {
                gestures.borrow_mut().on_touch_start(y);
            }
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
        listeners.push((window.clone().into(), "touchstart", closure));
    }
    {
        let gestures = gestures.clone();
        let view = view.clone();
        let window_c = window.clone();
        let closure = Closure::wrap(Box::new(move |event: Event| {
            let Some(y) = first_touch_y(&event, false) else {
                return;
            };
            let capture = gestures.borrow_mut().on_touch_move(now_ms(&window_c), y);
            if capture {
                event.prevent_default();
            }
            project(&view, &gestures.borrow());
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "touchmove",
            closure.as_ref().unchecked_ref(),
            &passive_off,
        )?;
        listeners.push((window.clone().into(), "touchmove", closure));
    }
    {
        let gestures = gestures.clone();
        let view = view.clone();
        let window_c = window.clone();
        let closure = Closure::wrap(Box::new(move |event: Event| {
            let Some(y) = first_touch_y(&event, true) else {
                return;
            };
            gestures.borrow_mut().on_touch_end(now_ms(&window_c), y);
            project(&view, &gestures.borrow());
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "touchend",
            closure.as_ref().unchecked_ref(),
            &passive_off,
        )?;
        listeners.push((window.clone().into(), "touchend", closure));
    }

    // Mouse movement only re-tags the input kind.
    {
        let gestures = gestures.clone();
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            gestures.borrow_mut().on_mouse_move();
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
        listeners.push((window.clone().into(), "mousemove", closure));
    }

    // Hamburger menu.
    if let Some(button) = view.menu_button.clone() {
        let gestures = gestures.clone();
        let view = view.clone();
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            gestures.borrow_mut().toggle_menu();
            project(&view, &gestures.borrow());
        }) as Box<dyn FnMut(Event)>);
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        listeners.push((button.into(), "click", closure));
    }

    // Nav links that jump straight to a panel, bypassing the gesture
    // thresholds.
    let panel_links = document.query_selector_all("a[data-panel]")?;
    for i in 0..panel_links.length() {
        let Some(link) = panel_links.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(panel) = link.get_attribute("data-panel").as_deref().and_then(parse_panel)
        else {
            log::warn!("ignoring nav link with unknown data-panel value");
            continue;
        };
        let gestures = gestures.clone();
        let view = view.clone();
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            let mut g = gestures.borrow_mut();
            g.set_panel(panel);
            g.close_menu();
            drop(g);
            project(&view, &gestures.borrow());
        }) as Box<dyn FnMut(Event)>);
        link.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        listeners.push((link.into(), "click", closure));
    }

    // Activities accordion: one expanded item at a time, click again to
    // collapse.
    let items = document.query_selector_all(".todo-item")?;
    let all_items: Rc<Vec<Element>> = Rc::new(
        (0..items.length())
            .filter_map(|i| items.item(i).and_then(|n| n.dyn_into::<Element>().ok()))
            .collect(),
    );
    for item in all_items.iter() {
        let item_c = item.clone();
        let all = all_items.clone();
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            let was_active = item_c.class_list().contains("active");
            for other in all.iter() {
                let _ = other.class_list().remove_1("active");
            }
            if !was_active {
                let _ = item_c.class_list().add_1("active");
            }
        }) as Box<dyn FnMut(Event)>);
        item.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        listeners.push((item.clone().into(), "click", closure));
    }

    // Carousel paging.
    if let Some(button) = view.carousel_next.clone() {
        let carousel = carousel.clone();
        let view = view.clone();
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            carousel.borrow_mut().advance();
            project_carousel(&view, &carousel.borrow());
        }) as Box<dyn FnMut(Event)>);
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        listeners.push((button.into(), "click", closure));
    }
    if let Some(button) = view.carousel_prev.clone() {
        let carousel = carousel.clone();
        let view = view.clone();
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            carousel.borrow_mut().rewind();
            project_carousel(&view, &carousel.borrow());
        }) as Box<dyn FnMut(Event)>);
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        listeners.push((button.into(), "click", closure));
    }

    // A new day can unlock a slide while the page sits open.
    let (resync_id, resync) = {
        let carousel = carousel.clone();
        let view = view.clone();
        let closure = Closure::wrap(Box::new(move || {
            carousel.borrow_mut().sync(js_sys::Date::now());
            project_carousel(&view, &carousel.borrow());
        }) as Box<dyn FnMut()>);
        let id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                CAROUSEL_RESYNC_MS,
            )
            .ok();
        (id, closure)
    };

    Ok(Page {
        window: window.clone(),
        listeners,
        resync_id,
        _resync: Some(resync),
    })
}

impl Page {
    /// Detach every listener and timer registered by [`mount`].
    pub fn unmount(self) {
        for (target, kind, closure) in &self.listeners {
            let _ = target
                .remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        }
        if let Some(id) = self.resync_id {
            self.window.clear_interval_with_handle(id);
        }
    }
}

/// Apply coordinator state to the document. Idempotent.
fn project(view: &View, gestures: &GestureCoordinator) {
    if let Some(nav) = &view.nav {
        let _ = nav
            .class_list()
            .toggle_with_force("nav--hidden", !gestures.nav_visible());
    }
    if let Some(menu) = &view.menu {
        let _ = menu
            .class_list()
            .toggle_with_force("open", gestures.menu_open());
    }
    if let Some(button) = &view.menu_button {
        let _ = button
            .class_list()
            .toggle_with_force("open", gestures.menu_open());
    }
    if let Some(hint) = &view.hint {
        let _ = hint
            .class_list()
            .toggle_with_force("hidden", !gestures.swipe_hint_visible());
    }
    if let Some(stage) = &view.stage {
        let list = stage.class_list();
        let _ = list.toggle_with_force("show-map", gestures.panel() == Panel::Map);
        let _ = list.toggle_with_force("show-community", gestures.panel() == Panel::Community);
    }
}

fn project_carousel(view: &View, carousel: &Carousel) {
    if let Some(track) = &view.carousel_track {
        if let Ok(slides) = track.query_selector_all(".slide") {
            for i in 0..slides.length() {
                let Some(slide) = slides.item(i).and_then(|n| n.dyn_into::<Element>().ok())
                else {
                    continue;
                };
                let unlocked = i + 1 <= carousel.available();
                let _ = slide
                    .class_list()
                    .toggle_with_force("current", i + 1 == carousel.current());
                let _ = slide.class_list().toggle_with_force("locked", !unlocked);
            }
        }
    }
    set_enabled(&view.carousel_next, carousel.can_advance());
    set_enabled(&view.carousel_prev, carousel.can_rewind());
}

fn set_enabled(button: &Option<Element>, enabled: bool) {
    if let Some(button) = button {
        if enabled {
            let _ = button.remove_attribute("disabled");
        } else {
            let _ = button.set_attribute("disabled", "");
        }
    }
}

fn parse_panel(value: &str) -> Option<Panel> {
    match value {
        "themes" => Some(Panel::Themes),
        "map" => Some(Panel::Map),
        "community" => Some(Panel::Community),
        _ => None,
    }
}

/// Vertical position of the gesture's finger: active touches during the
/// gesture, changed touches once it ends.
fn first_touch_y(event: &Event, ended: bool) -> Option<f64> {
    let touch_event = event.dyn_ref::<TouchEvent>()?;
    let list = if ended {
        touch_event.changed_touches()
    } else {
        touch_event.touches()
    };
    list.item(0).map(|t| t.client_y() as f64)
}

fn scroll_metrics(window: &Window, document: &Document) -> Option<(f64, f64, f64)> {
    let scroll_y = window.scroll_y().ok()?;
    let viewport_h = window.inner_height().ok()?.as_f64()?;
    let doc_h = document.document_element()?.scroll_height() as f64;
    Some((scroll_y, viewport_h, doc_h))
}

fn now_ms(window: &Window) -> f64 {
    window
        .performance()
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

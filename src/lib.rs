#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Startup Village landing site: a static page driven by one WASM module.
//!
//! The input state machine ([`gesture`]), pointer smoothing ([`pointer`]),
//! and themes carousel ([`carousel`]) are pure Rust and compile on any
//! target; everything touching the browser lives under [`wasm`].

pub mod carousel;
pub mod gesture;
pub mod pointer;

// Only compile browser-facing code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;

    pub mod page;
    pub mod render;

    struct App {
        background: Option<render::Background>,
        page: page::Page,
    }

    thread_local! {
        static APP: RefCell<Option<App>> = RefCell::new(None);
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // The background is decorative; a machine without WebGL2 still gets
        // the full page.
        let background = match document.get_element_by_id("background") {
            Some(container) => match render::Background::start(&container) {
                Ok(bg) => Some(bg),
                Err(err) => {
                    log::warn!("background renderer disabled: {:?}", err);
                    None
                }
            },
            None => {
                log::warn!("no #background container; skipping renderer");
                None
            }
        };

        let page = page::mount(&window, &document)?;
        APP.with(|app| *app.borrow_mut() = Some(App { background, page }));
        log::info!("startup village page mounted");
        Ok(())
    }

    /// Tear down listeners, the render loop, and the GL context. Safe to
    /// call more than once.
    #[wasm_bindgen]
    pub fn shutdown() {
        APP.with(|app| {
            if let Some(app) = app.borrow_mut().take() {
                if let Some(bg) = app.background {
                    bg.stop();
                }
                app.page.unmount();
                log::info!("startup village page unmounted");
            }
        });
    }
}

// When compiling for non-wasm targets (e.g., `cargo test` on host),
// provide an empty stub so the crate still builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn main() {}

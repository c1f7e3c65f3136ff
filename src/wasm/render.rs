//! Full-viewport animated shader background.
//!
//! Owns one canvas behind the page content, a WebGL2 context with a single
//! fullscreen-triangle program, and the animation-frame loop that feeds it
//! elapsed time and the smoothed pointer position. Everything created here
//! is released again by [`Background::stop`]; GL contexts are a limited
//! resource, so teardown requests context loss explicitly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, MouseEvent, WebGl2RenderingContext as GL, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebglLoseContext, Window,
};

use crate::pointer::{self, PointerSmoother};

/// Device-pixel-ratio cap; anything sharper is wasted on a gradient.
const MAX_DPR: f64 = 2.0;

const VERT_SRC: &str = r#"#version 300 es
in vec2 position;
out vec2 v_uv;
void main() {
  v_uv = position * 0.5 + 0.5;
  gl_Position = vec4(position, 0.0, 1.0);
}
"#;

// Liquid-gradient formula carried over from the original site design.
const FRAG_SRC: &str = r#"#version 300 es
precision highp float;

uniform float u_time;
uniform vec3 u_resolution;
uniform vec2 u_mouse;

in vec2 v_uv;
out vec4 out_color;

void main() {
  float mr = min(u_resolution.x, u_resolution.y);
  vec2 uv = (v_uv * 2.0 - 1.0) * u_resolution.xy / mr;

  vec2 mouse_uv = (u_mouse * 2.0 - 1.0) * u_resolution.xy / mr;
  float dist_to_mouse = length(uv - mouse_uv);

  float mouse_influence = 1.0 / (1.0 + dist_to_mouse * 2.0);
  float d = -u_time * 0.3 + dist_to_mouse * 0.5;
  float a = 0.0;

  for (float i = 0.0; i < 8.0; ++i) {
    a += cos(i - d - a * uv.x) * (0.5 + mouse_influence * 0.5);
    d += sin(uv.y * i + a) * (0.5 + mouse_influence * 0.5);
  }

  d += u_time * 0.2;

  vec3 deep_blue = vec3(0.51, 0.67, 0.92);
  vec3 dark_blue = vec3(0.043, 0.161, 0.271);
  vec3 purple = vec3(0.61, 0.29, 0.4);

  float wave1 = cos(uv.x * 1.2 + d * 0.3 + mouse_influence * 2.0) * 0.5 + 0.5;
  float wave2 = sin(length(uv) * 1.8 + d * 0.2 + mouse_influence * 1.5) * 0.5 + 0.5;

  float blend1 = smoothstep(0.2, 0.8, mix(wave1, wave2, 0.3 + mouse_influence * 0.1));
  float blend2 = smoothstep(0.3, 0.7, sin(d * 0.5 + length(uv) * 0.8) * 0.5 + 0.5);

  vec3 col;
  if (blend1 < 0.5) {
    col = mix(deep_blue, dark_blue, blend1 * 2.0);
  } else {
    col = mix(dark_blue, purple, (blend1 - 0.5) * 2.0);
  }

  vec3 secondary = mix(dark_blue, mix(deep_blue, purple, 0.5), blend2);
  col = mix(col, secondary, 0.3);

  col += sin(vec3(d, a, d + a)) * (0.02 + mouse_influence * 0.03);

  out_color = vec4(col, 1.0);
}
"#;

/// Handle to the running background. Dropping it without calling
/// [`Background::stop`] leaks the listeners, so the entry point parks it for
/// the page lifetime and tears it down on shutdown.
pub struct Background {
    window: Window,
    canvas: HtmlCanvasElement,
    gl: GL,
    raf_id: Rc<Cell<Option<i32>>>,
    frame: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
    on_resize: Closure<dyn FnMut()>,
    on_mouse_move: Closure<dyn FnMut(MouseEvent)>,
}

impl Background {
    /// Create the canvas inside `container`, compile the program, register
    /// resize/pointer listeners, and start the frame loop.
    pub fn start(container: &web_sys::Element) -> Result<Background, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        let style = canvas.style();
        style.set_property("position", "fixed")?;
        style.set_property("top", "0")?;
        style.set_property("left", "0")?;
        style.set_property("width", "100vw")?;
        style.set_property("height", "100vh")?;
        style.set_property("z-index", "-10")?;
        container.append_child(&canvas)?;

        let gl: GL = canvas
            .get_context("webgl2")?
            .ok_or("WebGL2 not supported")?
            .dyn_into()?;
        gl.clear_color(0.176, 0.353, 0.627, 1.0);

        let program = link_program(&gl, VERT_SRC, FRAG_SRC)?;
        gl.use_program(Some(&program));

        // One triangle large enough to cover the whole clip space.
        let positions: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];
        let buffer = gl.create_buffer().ok_or("failed to create buffer")?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        // The view must not outlive this statement: any allocation could
        // move the backing memory.
        unsafe {
            let view = js_sys::Float32Array::view(&positions);
            gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &view, GL::STATIC_DRAW);
        }
        let position_loc = gl.get_attrib_location(&program, "position");
        if position_loc < 0 {
            return Err("position attribute missing".into());
        }
        gl.enable_vertex_attrib_array(position_loc as u32);
        gl.vertex_attrib_pointer_with_i32(position_loc as u32, 2, GL::FLOAT, false, 0, 0);

        let u_time = gl
            .get_uniform_location(&program, "u_time")
            .ok_or("u_time uniform missing")?;
        let u_mouse = gl
            .get_uniform_location(&program, "u_mouse")
            .ok_or("u_mouse uniform missing")?;
        let u_resolution = gl
            .get_uniform_location(&program, "u_resolution")
            .ok_or("u_resolution uniform missing")?;

        fit_to_viewport(&window, &canvas, &gl, &u_resolution);
        gl.uniform2f(Some(&u_mouse), 0.5, 0.5);

        let smoother = Rc::new(RefCell::new(PointerSmoother::new()));

        let on_resize = {
            let window = window.clone();
            let canvas = canvas.clone();
            let gl = gl.clone();
            let u_resolution = u_resolution.clone();
            Closure::wrap(Box::new(move || {
                fit_to_viewport(&window, &canvas, &gl, &u_resolution);
            }) as Box<dyn FnMut()>)
        };
        window
            .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;

        let on_mouse_move = {
            let window = window.clone();
            let smoother = smoother.clone();
            Closure::wrap(Box::new(move |event: MouseEvent| {
                let (Some(w), Some(h)) = (viewport_dim(window.inner_width()), viewport_dim(window.inner_height())) else {
                    return;
                };
                if let Some((x, y)) =
                    pointer::normalize(event.client_x() as f64, event.client_y() as f64, w, h)
                {
                    smoother.borrow_mut().set_target(x, y);
                }
            }) as Box<dyn FnMut(MouseEvent)>)
        };
        window.add_event_listener_with_callback(
            "mousemove",
            on_mouse_move.as_ref().unchecked_ref(),
        )?;

        // The frame closure reschedules itself, so it is held in an `Option`
        // inside an `Rc` that the closure also captures; `stop` drops it to
        // break the cycle.
        let frame: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let raf_id = Rc::new(Cell::new(None));
        {
            let frame_handle = frame.clone();
            let raf_id = raf_id.clone();
            let window = window.clone();
            let gl = gl.clone();
            let u_time = u_time.clone();
            let u_mouse = u_mouse.clone();
            let smoother = smoother.clone();
            let mut start_ms: Option<f64> = None;
            *frame.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp_ms: f64| {
                let start = *start_ms.get_or_insert(timestamp_ms);
                let elapsed_s = (timestamp_ms - start) / 1000.0;

                let (mx, my) = smoother.borrow_mut().step();
                gl.uniform1f(Some(&u_time), elapsed_s as f32);
                gl.uniform2f(Some(&u_mouse), mx as f32, my as f32);
                gl.clear(GL::COLOR_BUFFER_BIT);
                gl.draw_arrays(GL::TRIANGLES, 0, 3);

                if let Some(frame) = frame_handle.borrow().as_ref() {
                    raf_id.set(
                        window
                            .request_animation_frame(frame.as_ref().unchecked_ref())
                            .ok(),
                    );
                }
            }) as Box<dyn FnMut(f64)>));
        }
        if let Some(cb) = frame.borrow().as_ref() {
            raf_id.set(Some(
                window.request_animation_frame(cb.as_ref().unchecked_ref())?,
            ));
        }

        Ok(Background {
            window,
            canvas,
            gl,
            raf_id,
            frame,
            on_resize,
            on_mouse_move,
        })
    }

    /// Cancel the frame loop, detach listeners and the canvas, and release
    /// the GL context.
    pub fn stop(self) {
        if let Some(id) = self.raf_id.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        let _ = self.window.remove_event_listener_with_callback(
            "resize",
            self.on_resize.as_ref().unchecked_ref(),
        );
        let _ = self.window.remove_event_listener_with_callback(
            "mousemove",
            self.on_mouse_move.as_ref().unchecked_ref(),
        );
        self.frame.borrow_mut().take();
        self.canvas.remove();

        if let Ok(Some(ext)) = self.gl.get_extension("WEBGL_lose_context") {
            ext.unchecked_into::<WebglLoseContext>().lose_context();
        }
    }
}

/// Size the backing store to the viewport (device pixels, DPR capped) and
/// refresh the resolution uniform with the CSS-pixel dimensions.
fn fit_to_viewport(
    window: &Window,
    canvas: &HtmlCanvasElement,
    gl: &GL,
    u_resolution: &WebGlUniformLocation,
) {
    let (Some(width), Some(height)) = (
        viewport_dim(window.inner_width()),
        viewport_dim(window.inner_height()),
    ) else {
        return;
    };
    let dpr = window.device_pixel_ratio().min(MAX_DPR);

    canvas.set_width((width * dpr) as u32);
    canvas.set_height((height * dpr) as u32);
    gl.viewport(0, 0, canvas.width() as i32, canvas.height() as i32);
    gl.uniform3f(
        Some(u_resolution),
        width as f32,
        height as f32,
        (width / height) as f32,
    );
}

fn viewport_dim(value: Result<JsValue, JsValue>) -> Option<f64> {
    let dim = value.ok()?.as_f64()?;
    (dim > 0.0).then_some(dim)
}

fn link_program(gl: &GL, vert_src: &str, frag_src: &str) -> Result<WebGlProgram, JsValue> {
    let vert = compile_shader(gl, GL::VERTEX_SHADER, vert_src)?;
    let frag = compile_shader(gl, GL::FRAGMENT_SHADER, frag_src)?;

    let program = gl.create_program().ok_or("failed to create program")?;
    gl.attach_shader(&program, &vert);
    gl.attach_shader(&program, &frag);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        gl.delete_shader(Some(&vert));
        gl.delete_shader(Some(&frag));
        Ok(program)
    } else {
        let info = gl
            .get_program_info_log(&program)
            .unwrap_or_else(|| "unknown link error".to_string());
        Err(format!("failed to link program: {info}").into())
    }
}

fn compile_shader(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl.create_shader(kind).ok_or("failed to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let info = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown compile error".to_string());
        Err(format!("failed to compile shader: {info}").into())
    }
}

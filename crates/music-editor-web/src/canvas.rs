//! 2D canvas drawing and `requestAnimationFrame` scheduling.

use std::cell::RefCell;
use std::rc::Rc;

use egui::Rect;
use music_editor::backend::{DrawSurface, Fill, FrameHandle, FrameScheduler};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub const VISUALIZER_CONTAINER_ID: &str = "visualizer_container";
pub const VISUALIZER_CANVAS_ID: &str = "visualizer_canvas";

/// A `<canvas>` with its 2D context.
///
/// Measures its parent element, so the bars follow the container's layout
/// rather than the canvas' own default size.
pub struct CanvasSurface {
    canvas: web_sys::HtmlCanvasElement,
    ctx: web_sys::CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: web_sys::HtmlCanvasElement) -> Result<Self, JsValue> {
        // Inline canvases leave a descender gap under them.
        canvas.style().set_property("display", "block")?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<web_sys::CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Finds the visualizer canvas, creating it and its container on first use.
    ///
    /// A created container gets a fixed `height` in CSS pixels so its size
    /// never depends on the canvas it holds.
    pub fn find_or_create(document: &web_sys::Document, height: u32) -> Result<Self, JsValue> {
        if let Some(existing) = document.get_element_by_id(VISUALIZER_CANVAS_ID) {
            return Self::new(existing.dyn_into::<web_sys::HtmlCanvasElement>()?);
        }

        let container = match document.get_element_by_id(VISUALIZER_CONTAINER_ID) {
            Some(container) => container,
            None => {
                let container = document
                    .create_element("div")?
                    .dyn_into::<web_sys::HtmlElement>()?;
                container.set_id(VISUALIZER_CONTAINER_ID);
                let style = container.style();
                style.set_property("width", "100%")?;
                style.set_property("height", &format!("{height}px"))?;
                style.set_property("overflow", "hidden")?;
                document
                    .body()
                    .ok_or_else(|| JsValue::from_str("document has no body"))?
                    .append_child(&container)?;
                container.into()
            }
        };
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;
        canvas.set_id(VISUALIZER_CANVAS_ID);
        container.append_child(&canvas)?;
        Self::new(canvas)
    }

    pub fn canvas(&self) -> &web_sys::HtmlCanvasElement {
        &self.canvas
    }
}

impl PartialEq for CanvasSurface {
    fn eq(&self, other: &Self) -> bool {
        self.canvas == other.canvas
    }
}

impl DrawSurface for CanvasSurface {
    fn pixel_size(&self) -> (u32, u32) {
        match self.canvas.parent_element() {
            Some(parent) => {
                let rect = parent.get_bounding_client_rect();
                (rect.width().max(0.0) as u32, rect.height().max(0.0) as u32)
            }
            None => (0, 0),
        }
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let style = self.canvas.style();
        style.set_property("width", &format!("{width}px")).ok();
        style.set_property("height", &format!("{height}px")).ok();
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill) {
        self.ctx.set_fill_style_str(&fill.css());
        self.ctx.fill_rect(
            f64::from(rect.min.x),
            f64::from(rect.min.y),
            f64::from(rect.width()),
            f64::from(rect.height()),
        );
    }
}

type PendingCallback = Rc<RefCell<Option<Box<dyn FnOnce()>>>>;

/// `requestAnimationFrame` behind [`FrameScheduler`].
///
/// One JS closure lives as long as the scheduler and runs whatever callback
/// sits in the pending slot, so nothing is leaked per frame.
pub struct AnimationFrameScheduler {
    window: web_sys::Window,
    pending: PendingCallback,
    trampoline: Closure<dyn FnMut()>,
}

impl AnimationFrameScheduler {
    pub fn new(window: web_sys::Window) -> Self {
        let pending: PendingCallback = Rc::new(RefCell::new(None));
        let slot = pending.clone();
        let trampoline = Closure::wrap(Box::new(move || {
            let callback = slot.borrow_mut().take();
            if let Some(callback) = callback {
                callback();
            }
        }) as Box<dyn FnMut()>);
        Self {
            window,
            pending,
            trampoline,
        }
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameHandle> {
        *self.pending.borrow_mut() = Some(callback);
        match self
            .window
            .request_animation_frame(self.trampoline.as_ref().unchecked_ref())
        {
            Ok(id) => Some(FrameHandle(id)),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {e:?}");
                self.pending.borrow_mut().take();
                None
            }
        }
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            log::warn!("cancelAnimationFrame failed: {e:?}");
        }
        self.pending.borrow_mut().take();
    }
}

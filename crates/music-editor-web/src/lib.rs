//! Browser front-end of the music editor.
//!
//! Implements the core's backend traits on top of `web-sys` and hosts the
//! editor UI in an eframe canvas.
#![cfg(target_arch = "wasm32")]

mod app;
mod canvas;
mod web_audio;

use music_editor::EditorConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub use app::EditorApp;
pub use canvas::{AnimationFrameScheduler, CanvasSurface};
pub use web_audio::{MediaListeners, WebAudioBackend, WebMedia, WebNode, WebTap};

const APP_CANVAS_ID: &str = "music_editor_canvas";

/// Reads the editor settings from the canvas' `data-config` attribute.
fn load_config(canvas: &web_sys::HtmlCanvasElement) -> EditorConfig {
    let Some(json) = canvas.get_attribute("data-config") else {
        return EditorConfig::default();
    };
    EditorConfig::from_json(&json).unwrap_or_else(|e| {
        log::error!("invalid data-config, using defaults: {e}");
        EditorConfig::default()
    })
}

fn app_canvas() -> Result<web_sys::HtmlCanvasElement, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?
        .get_element_by_id(APP_CANVAS_ID)
        .ok_or_else(|| JsValue::from_str(&format!("no canvas element with id '{APP_CANVAS_ID}'")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("element '{APP_CANVAS_ID}' is not a canvas")))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();

    let canvas = app_canvas()?;
    let config = load_config(&canvas);

    wasm_bindgen_futures::spawn_local(async move {
        let started = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(move |cc| {
                    let app = EditorApp::new(cc, config).map_err(|e| format!("{e:?}"))?;
                    Ok(Box::new(app))
                }),
            )
            .await;
        if let Err(e) = started {
            log::error!("Failed to start eframe: {e:?}");
        }
    });

    Ok(())
}

//! The editor window: transport, track list, mixer and timeline.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use egui::{Align2, Color32, FontId, Pos2, Sense, Stroke};
use music_editor::backend::{AudioBackend, FrameLoop};
use music_editor::graph::PANNER;
use music_editor::library::Library;
use music_editor::timefmt::{format_time, ruler_ticks};
use music_editor::{AudioError, AudioSession, BarStyle, EditorConfig, Visualizer};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::canvas::{AnimationFrameScheduler, CanvasSurface};
use crate::web_audio::{MediaListeners, WebAudioBackend, WebMedia, WebTap};

const AUDIO_ELEMENT_ID: &str = "editor_audio";
const TIMELINE_HEIGHT: f32 = 28.0;
const PLAYHEAD_COLOR: Color32 = Color32::from_rgb(219, 39, 119);

type WebVisualizer = Visualizer<CanvasSurface, WebTap, AnimationFrameScheduler>;
type ListingSlot = Rc<RefCell<Option<Result<String, String>>>>;

fn js_error(e: &AudioError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Gets the page's `<audio>` element or appends a fresh one.
fn find_or_create_audio(document: &web_sys::Document) -> Result<WebMedia, JsValue> {
    if let Some(existing) = document.get_element_by_id(AUDIO_ELEMENT_ID) {
        return Ok(WebMedia::new(existing.dyn_into::<web_sys::HtmlAudioElement>()?));
    }
    let audio = document
        .create_element("audio")?
        .dyn_into::<web_sys::HtmlAudioElement>()?;
    audio.set_id(AUDIO_ELEMENT_ID);
    audio.set_cross_origin(Some("anonymous"));
    document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?
        .append_child(&audio)?;
    Ok(WebMedia::new(audio))
}

async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str("response body is not text"))
}

pub struct EditorApp {
    config: EditorConfig,
    session: Rc<RefCell<AudioSession<WebAudioBackend>>>,
    visualizer: Rc<WebVisualizer>,
    container: Option<web_sys::Element>,
    library: Library,
    listing: ListingSlot,
    library_error: Option<String>,
    volume: f32,
    pan: f32,
    _media_listeners: MediaListeners,
}

impl EditorApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: EditorConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;

        let media = find_or_create_audio(&document)?;
        let mut session = AudioSession::new(WebAudioBackend::new()?, &config);
        session.initialize(Some(&media)).map_err(|e| js_error(&e))?;
        let tap = session.ensure_analysis_tap().map_err(|e| js_error(&e))?;

        let visualizer = Rc::new(Visualizer::new(
            AnimationFrameScheduler::new(window),
            &config.visualizer,
        ));
        let surface =
            CanvasSurface::find_or_create(&document, config.visualizer.fallback_height)?;
        let container = surface.canvas().parent_element();
        match tap {
            Some(tap) => visualizer.bind_surface(surface, tap),
            None => log::warn!("no analysis tap available, visualizer stays idle"),
        }
        let frame_loop: Rc<dyn FrameLoop> = visualizer.clone();
        session.attach_loop(frame_loop);

        let session = Rc::new(RefCell::new(session));
        let weak_session = Rc::downgrade(&session);
        let egui_ctx = cc.egui_ctx.clone();
        let media_listeners = media.listen(move |event| {
            let Some(session) = weak_session.upgrade() else {
                return;
            };
            match session.try_borrow_mut() {
                Ok(mut session) => session.handle_media_event(event),
                Err(_) => log::debug!("session busy, dropped {event:?}"),
            }
            egui_ctx.request_repaint();
        })?;

        let listing: ListingSlot = Rc::new(RefCell::new(None));
        let slot = listing.clone();
        let url = config.library_url.clone();
        spawn_local(async move {
            let result = fetch_text(&url).await.map_err(|e| format!("{e:?}"));
            *slot.borrow_mut() = Some(result);
        });

        Ok(Self {
            volume: config.session.initial_volume,
            pan: config.session.initial_pan,
            config,
            session,
            visualizer,
            container,
            library: Library::default(),
            listing,
            library_error: None,
            _media_listeners: media_listeners,
        })
    }

    fn process_listing(&mut self) {
        let Some(result) = self.listing.borrow_mut().take() else {
            return;
        };
        match result.and_then(|json| Library::from_json(&json).map_err(|e| e.to_string())) {
            Ok(library) => {
                log::info!("loaded {} tracks", library.tracks().len());
                self.library = library;
                if !self.library.is_empty() {
                    self.load_track(0);
                }
            }
            Err(e) => {
                log::error!("Error fetching music list: {e}");
                self.library_error = Some(e);
            }
        }
    }

    /// Follows layout changes of the visualizer container.
    fn track_container_size(&self) {
        let Some(container) = &self.container else {
            return;
        };
        let rect = container.get_bounding_client_rect();
        if self.visualizer.fit_to(rect.width() as u32, rect.height() as u32) {
            log::debug!("visualizer resized to {}x{}", rect.width(), rect.height());
        }
    }

    fn load_track(&mut self, index: usize) {
        self.library.select(index);
        let Some(track) = self.library.current() else {
            return;
        };
        let url = Library::stream_url(&self.config.stream_base_url, track);
        if let Err(e) = self.session.borrow_mut().change_track(&url) {
            log::error!("Error loading track: {e}");
        }
    }

    fn play_index(&mut self, index: usize) {
        self.load_track(index);
        self.session.borrow_mut().play();
    }

    fn set_panner_enabled(&mut self, enabled: bool) {
        let mut session = self.session.borrow_mut();
        let result = if enabled {
            session
                .context()
                .create_stereo_panner(self.pan)
                .and_then(|node| session.add_processor(PANNER, node))
        } else {
            session.remove_processor(PANNER)
        };
        if let Err(e) = result {
            log::error!("Error updating panner: {e}");
        }
    }

    fn draw_track_list(&mut self, ui: &mut egui::Ui) {
        if let Some(error) = &self.library_error {
            ui.colored_label(Color32::LIGHT_RED, format!("Could not load tracks: {error}"));
            return;
        }
        let mut picked = None;
        let selected_text = self
            .library
            .current()
            .map_or_else(|| "No tracks".to_string(), |t| t.display_name());
        egui::ComboBox::from_label("Track")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for (idx, track) in self.library.tracks().iter().enumerate() {
                    let selected = self.library.selected_index() == Some(idx);
                    if ui.selectable_label(selected, track.display_name()).clicked() {
                        picked = Some(idx);
                    }
                }
            });
        if let Some(idx) = picked {
            if self.library.selected_index() != Some(idx) {
                self.load_track(idx);
            }
        }
    }

    fn draw_transport(&mut self, ui: &mut egui::Ui) {
        let (is_playing, has_prev, has_next) = (
            self.session.borrow().is_playing(),
            self.library.prev_index(),
            self.library.next_index(),
        );
        ui.horizontal(|ui| {
            if ui.add_enabled(has_prev.is_some(), egui::Button::new("Prev")).clicked() {
                if let Some(idx) = has_prev {
                    self.play_index(idx);
                }
            }
            let label = if is_playing { "Pause" } else { "Play" };
            if ui.button(label).clicked() {
                self.session.borrow_mut().toggle_play_pause();
            }
            if ui.add_enabled(has_next.is_some(), egui::Button::new("Next")).clicked() {
                if let Some(idx) = has_next {
                    self.play_index(idx);
                }
            }

            let clock = self.session.borrow().clock().clone();
            ui.monospace(format!(
                "{} / {}",
                format_time(clock.current_time),
                format_time(clock.duration)
            ));
            if clock.is_loading {
                ui.spinner();
                ui.label("Loading…");
            }
        });
    }

    fn draw_timeline(&mut self, ui: &mut egui::Ui) {
        let clock = self.session.borrow().clock().clone();
        let width = ui.available_width();
        let (response, painter) =
            ui.allocate_painter(egui::vec2(width, TIMELINE_HEIGHT), Sense::click());
        let rect = response.rect;
        let stroke = Stroke::new(1.0, ui.visuals().weak_text_color());

        painter.line_segment([rect.left_bottom(), rect.right_bottom()], stroke);
        if clock.duration.is_finite() && clock.duration > 0.0 {
            for tick in ruler_ticks(clock.duration) {
                let x = rect.left() + (tick / clock.duration) as f32 * rect.width();
                painter.line_segment(
                    [Pos2::new(x, rect.bottom() - 6.0), Pos2::new(x, rect.bottom())],
                    stroke,
                );
                painter.text(
                    Pos2::new(x, rect.top()),
                    Align2::CENTER_TOP,
                    format_time(tick),
                    FontId::monospace(9.0),
                    ui.visuals().weak_text_color(),
                );
            }
        }

        let x = rect.left() + clock.playhead_percent() / 100.0 * rect.width();
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(2.0, PLAYHEAD_COLOR),
        );

        if response.clicked() && clock.duration.is_finite() && clock.duration > 0.0 {
            if let Some(pos) = response.interact_pointer_pos() {
                let fraction = ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0);
                self.session
                    .borrow_mut()
                    .seek_to(f64::from(fraction) * clock.duration);
            }
        }
    }

    fn draw_mixer(&mut self, ui: &mut egui::Ui) {
        let (current_volume, has_panner) = {
            let session = self.session.borrow();
            (session.volume(), session.processor(PANNER).is_some())
        };

        ui.horizontal(|ui| {
            if ui
                .add(egui::Slider::new(&mut self.volume, 0.0..=2.0).text("Volume"))
                .changed()
            {
                self.session.borrow().set_volume(self.volume);
            }
            match current_volume {
                Some(gain) => ui.monospace(format!("gain {gain:.2}")),
                None => ui.monospace("no gain stage"),
            };
        });

        ui.horizontal(|ui| {
            let pan_slider = egui::Slider::new(&mut self.pan, -1.0..=1.0).text("Pan");
            if ui.add_enabled(has_panner, pan_slider).changed() {
                self.session.borrow().set_pan(self.pan);
            }
            let mut enabled = has_panner;
            if ui.checkbox(&mut enabled, "Panner").changed() {
                self.set_panner_enabled(enabled);
            }
        });

        ui.horizontal(|ui| {
            let mut style = self.visualizer.style();
            egui::ComboBox::from_label("Bars")
                .selected_text(style.label())
                .show_ui(ui, |ui| {
                    for option in BarStyle::ALL {
                        ui.selectable_value(&mut style, option, option.label());
                    }
                });
            if style != self.visualizer.style() {
                self.visualizer.set_style(style);
            }

            if ui.button("Rewire chain").clicked() {
                if let Err(e) = self.session.borrow_mut().setup_track() {
                    log::error!("Error rewiring audio chain: {e}");
                }
            }
        });

        let names = self.session.borrow().processor_names().join(" → ");
        ui.small(format!("source → {names} → output"));
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_listing();
        self.track_container_size();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Music Editor");
            self.draw_track_list(ui);
            ui.separator();
            self.draw_transport(ui);
            self.draw_timeline(ui);
            ui.separator();
            self.draw_mixer(ui);
        });

        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl Drop for EditorApp {
    fn drop(&mut self) {
        self.visualizer.unbind();
        if let Ok(mut session) = self.session.try_borrow_mut() {
            session.detach_loop();
        }
    }
}

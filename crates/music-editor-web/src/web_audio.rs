//! Web Audio API and `<audio>` element behind the core's backend traits.

use music_editor::backend::{
    AudioBackend, AudioNode, Completion, ContextState, FrequencyTap, MediaElement,
};
use music_editor::playback::MediaEvent;
use music_editor::{AudioError, AudioResult};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

fn js_reason(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Settles `done` once `promise` resolves or rejects.
fn settle(promise: js_sys::Promise, done: Completion, on_reject: fn(String) -> AudioError) {
    spawn_local(async move {
        let result = JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| on_reject(js_reason(&e)));
        done(result);
    });
}

#[derive(Clone)]
pub struct WebNode(web_sys::AudioNode);

impl AudioNode for WebNode {
    fn connect(&self, destination: &Self) -> AudioResult<()> {
        self.0
            .connect_with_audio_node(&destination.0)
            .map(|_| ())
            .map_err(|e| AudioError::Connect(js_reason(&e)))
    }

    fn disconnect(&self) -> AudioResult<()> {
        self.0
            .disconnect()
            .map_err(|e| AudioError::Disconnect(js_reason(&e)))
    }

    fn gain(&self) -> Option<f32> {
        self.0
            .dyn_ref::<web_sys::GainNode>()
            .map(|node| node.gain().value())
    }

    fn set_gain(&self, value: f32) -> bool {
        match self.0.dyn_ref::<web_sys::GainNode>() {
            Some(node) => {
                node.gain().set_value(value);
                true
            }
            None => false,
        }
    }

    fn set_pan(&self, value: f32) -> bool {
        match self.0.dyn_ref::<web_sys::StereoPannerNode>() {
            Some(node) => {
                node.pan().set_value(value);
                true
            }
            None => false,
        }
    }
}

/// Read side of an `AnalyserNode`.
#[derive(Clone)]
pub struct WebTap(web_sys::AnalyserNode);

impl FrequencyTap for WebTap {
    fn frequency_bin_count(&self) -> usize {
        self.0.frequency_bin_count() as usize
    }

    fn byte_frequency_data(&self, buffer: &mut [u8]) {
        self.0.get_byte_frequency_data(buffer);
    }
}

#[derive(Clone)]
pub struct WebMedia(web_sys::HtmlAudioElement);

impl WebMedia {
    pub fn new(element: web_sys::HtmlAudioElement) -> Self {
        Self(element)
    }

    pub fn element(&self) -> &web_sys::HtmlAudioElement {
        &self.0
    }

    pub fn has_source(&self) -> bool {
        !self.0.src().is_empty()
    }

    /// Forwards `timeupdate`, `loadedmetadata` and `ended` to `handler`
    /// until the returned guard is dropped.
    pub fn listen(
        &self,
        handler: impl Fn(MediaEvent) + 'static,
    ) -> Result<MediaListeners, JsValue> {
        let handler = std::rc::Rc::new(handler);
        let mut listeners = MediaListeners {
            target: self.0.clone().into(),
            closures: Vec::new(),
        };
        for (name, event) in [
            ("timeupdate", MediaEvent::TimeUpdate),
            ("loadedmetadata", MediaEvent::MetadataLoaded),
            ("ended", MediaEvent::Ended),
        ] {
            let handler = handler.clone();
            let closure = Closure::wrap(Box::new(move || handler(event)) as Box<dyn FnMut()>);
            listeners
                .target
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            listeners.closures.push((name, closure));
        }
        Ok(listeners)
    }
}

impl MediaElement for WebMedia {
    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.0.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.0.duration()
    }

    fn ready_state(&self) -> u16 {
        self.0.ready_state()
    }

    fn set_src(&self, src: &str) {
        self.0.set_src(src);
    }

    fn pause(&self) {
        if let Err(e) = self.0.pause() {
            log::warn!("pause failed: {}", js_reason(&e));
        }
    }

    fn play(&self, done: Completion) {
        match self.0.play() {
            Ok(promise) => settle(promise, done, AudioError::Play),
            Err(e) => done(Err(AudioError::Play(js_reason(&e)))),
        }
    }
}

/// Registered media listeners; removed again on drop.
pub struct MediaListeners {
    target: web_sys::EventTarget,
    closures: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl Drop for MediaListeners {
    fn drop(&mut self) {
        for (name, closure) in &self.closures {
            self.target
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .ok();
        }
    }
}

pub struct WebAudioBackend {
    ctx: web_sys::AudioContext,
}

impl WebAudioBackend {
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self {
            ctx: web_sys::AudioContext::new()?,
        })
    }
}

impl AudioBackend for WebAudioBackend {
    type Node = WebNode;
    type Tap = WebTap;
    type Media = WebMedia;

    fn state(&self) -> ContextState {
        match self.ctx.state() {
            web_sys::AudioContextState::Suspended => ContextState::Suspended,
            web_sys::AudioContextState::Closed => ContextState::Closed,
            _ => ContextState::Running,
        }
    }

    fn resume(&self, done: Completion) {
        match self.ctx.resume() {
            Ok(promise) => settle(promise, done, AudioError::Resume),
            Err(e) => done(Err(AudioError::Resume(js_reason(&e)))),
        }
    }

    fn destination(&self) -> WebNode {
        WebNode(self.ctx.destination().into())
    }

    fn create_media_source(&self, media: &WebMedia) -> AudioResult<WebNode> {
        self.ctx
            .create_media_element_source(&media.0)
            .map(|node| WebNode(node.into()))
            .map_err(|e| AudioError::NodeCreation {
                kind: "media source",
                reason: js_reason(&e),
            })
    }

    fn create_gain(&self, initial: f32) -> AudioResult<WebNode> {
        let node = self.ctx.create_gain().map_err(|e| AudioError::NodeCreation {
            kind: "gain",
            reason: js_reason(&e),
        })?;
        node.gain().set_value(initial);
        Ok(WebNode(node.into()))
    }

    fn create_stereo_panner(&self, initial: f32) -> AudioResult<WebNode> {
        let node = self
            .ctx
            .create_stereo_panner()
            .map_err(|e| AudioError::NodeCreation {
                kind: "stereo panner",
                reason: js_reason(&e),
            })?;
        node.pan().set_value(initial);
        Ok(WebNode(node.into()))
    }

    fn create_analyser(&self, fft_size: u32, smoothing: f64) -> AudioResult<(WebNode, WebTap)> {
        let analyser = self
            .ctx
            .create_analyser()
            .map_err(|e| AudioError::NodeCreation {
                kind: "analyser",
                reason: js_reason(&e),
            })?;
        analyser.set_fft_size(fft_size);
        analyser.set_smoothing_time_constant(smoothing);
        Ok((WebNode(analyser.clone().into()), WebTap(analyser)))
    }

    fn close(&self) {
        if let Err(e) = self.ctx.close() {
            log::warn!("closing audio context failed: {}", js_reason(&e));
        }
    }
}

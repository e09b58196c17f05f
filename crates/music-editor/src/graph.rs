//! Audio graph manager.
//!
//! An [`AudioSession`] owns one media-backed source node and an ordered
//! chain of processors ending at the context's destination:
//!
//! ```text
//! source -> gain -> panner [-> analysis] -> destination
//! ```
//!
//! Every topology change tears the whole chain down and wires it up again
//! inside one call, so no caller ever sees a half-connected graph.

use std::rc::Rc;

use crate::backend::{AudioBackend, AudioNode, ContextState, FrameLoop, MediaElement};
use crate::chain::ProcessorChain;
use crate::config::{EditorConfig, SessionConfig, VisualizerConfig};
use crate::error::AudioResult;
use crate::playback::{MediaEvent, PlaybackClock};

pub const GAIN: &str = "gain";
pub const PANNER: &str = "panner";
pub const ANALYSIS: &str = "analysis";

pub struct AudioSession<B: AudioBackend> {
    context: B,
    session_config: SessionConfig,
    visualizer_config: VisualizerConfig,
    media: Option<B::Media>,
    source: Option<B::Node>,
    chain: ProcessorChain<B::Node>,
    analyser: Option<(B::Node, B::Tap)>,
    frame_loop: Option<Rc<dyn FrameLoop>>,
    initialized: bool,
    is_playing: bool,
    clock: PlaybackClock,
}

impl<B: AudioBackend> AudioSession<B> {
    pub fn new(context: B, config: &EditorConfig) -> Self {
        Self {
            context,
            session_config: config.session.clone(),
            visualizer_config: config.visualizer.clone(),
            media: None,
            source: None,
            chain: ProcessorChain::default(),
            analyser: None,
            frame_loop: None,
            initialized: false,
            is_playing: false,
            clock: PlaybackClock::default(),
        }
    }

    /// Wraps `media` in a source node and wires the default chain.
    ///
    /// Idempotent: once the default chain is wired further calls do nothing. A missing
    /// element is not an error, the caller simply retries once it is mounted.
    pub fn initialize(&mut self, media: Option<&B::Media>) -> AudioResult<()> {
        if self.initialized {
            return Ok(());
        }
        let Some(media) = media else {
            log::debug!("initialize: no media element yet");
            return Ok(());
        };

        // An element can be wrapped only once; keep the source across retries.
        if self.source.is_none() {
            self.source = Some(self.context.create_media_source(media)?);
            self.media = Some(media.clone());
        }
        if !self.chain.contains(GAIN) {
            let gain = self.context.create_gain(self.session_config.initial_volume)?;
            self.chain.insert(GAIN, gain);
        }
        if !self.chain.contains(PANNER) {
            let panner = self
                .context
                .create_stereo_panner(self.session_config.initial_pan)?;
            self.chain.insert(PANNER, panner);
        }
        self.clock = PlaybackClock::loading();
        self.rebuild(None)?;
        self.initialized = true;
        log::debug!("audio session initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registers `node` under `name`, replacing an existing entry in place.
    pub fn add_processor(&mut self, name: &str, node: B::Node) -> AudioResult<()> {
        if self.source.is_none() {
            log::warn!("add_processor({name}) before initialize, ignored");
            return Ok(());
        }
        let replaced = self.chain.insert(name, node);
        self.rebuild(replaced)
    }

    /// Drops `name` from the chain. Unknown names still trigger a rebuild.
    pub fn remove_processor(&mut self, name: &str) -> AudioResult<()> {
        if self.source.is_none() {
            log::warn!("remove_processor({name}) before initialize, ignored");
            return Ok(());
        }
        let removed = self.chain.remove(name);
        self.rebuild(removed)
    }

    /// Re-wires the current chain without changing its members.
    pub fn setup_track(&mut self) -> AudioResult<()> {
        self.rebuild(None)
    }

    fn rebuild(&self, detached: Option<B::Node>) -> AudioResult<()> {
        let Some(source) = &self.source else {
            return Ok(());
        };

        source.disconnect()?;
        for node in self.chain.nodes() {
            node.disconnect()?;
        }
        if let Some(node) = &detached {
            node.disconnect()?;
        }

        if let Err(e) = self.wire(source) {
            log::error!("audio chain wiring failed, leaving it disconnected: {e}");
            self.unwire();
            return Err(e);
        }
        log::debug!("audio chain rebuilt: {:?}", self.chain.names());
        Ok(())
    }

    fn wire(&self, source: &B::Node) -> AudioResult<()> {
        let mut current = source;
        for node in self.chain.nodes() {
            current.connect(node)?;
            current = node;
        }
        current.connect(&self.context.destination())
    }

    /// Best-effort teardown of every edge the session owns.
    fn unwire(&self) {
        if let Some(source) = &self.source {
            source.disconnect().ok();
        }
        for node in self.chain.nodes() {
            node.disconnect().ok();
        }
    }

    pub fn processor_names(&self) -> Vec<&str> {
        self.chain.names()
    }

    pub fn processor(&self, name: &str) -> Option<&B::Node> {
        self.chain.get(name)
    }

    /// Returns the analysis tap, creating and registering the analyser the
    /// first time. The same analyser is reused for the whole session.
    pub fn ensure_analysis_tap(&mut self) -> AudioResult<Option<B::Tap>> {
        if self.source.is_none() {
            return Ok(None);
        }
        let (node, tap) = match &self.analyser {
            Some(existing) => existing.clone(),
            None => {
                let created = self.context.create_analyser(
                    self.visualizer_config.fft_size,
                    self.visualizer_config.smoothing,
                )?;
                self.analyser = Some(created.clone());
                created
            }
        };
        if !self.chain.contains(ANALYSIS) {
            self.add_processor(ANALYSIS, node)?;
        }
        Ok(Some(tap))
    }

    pub fn analysis_tap(&self) -> Option<&B::Tap> {
        self.analyser.as_ref().map(|(_, tap)| tap)
    }

    /// Lets playback drive a visualizer's frame loop.
    pub fn attach_loop(&mut self, frame_loop: Rc<dyn FrameLoop>) {
        self.frame_loop = Some(frame_loop);
    }

    pub fn detach_loop(&mut self) {
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.stop_loop();
        }
    }

    fn resume_if_suspended(&self) {
        if self.context.state() == ContextState::Suspended {
            self.context.resume(Box::new(|result| {
                if let Err(e) = result {
                    log::error!("Error resuming audio context: {e}");
                }
            }));
        }
    }

    fn start_media(media: &B::Media) {
        media.play(Box::new(|result| {
            if let Err(e) = result {
                log::error!("Error playing audio: {e}");
            }
        }));
    }

    pub fn play(&mut self) {
        let Some(media) = &self.media else {
            return;
        };
        self.resume_if_suspended();
        Self::start_media(media);
        if let Some(frame_loop) = &self.frame_loop {
            frame_loop.start_loop();
        }
        self.is_playing = true;
    }

    pub fn pause(&mut self) {
        let Some(media) = &self.media else {
            return;
        };
        self.resume_if_suspended();
        media.pause();
        if let Some(frame_loop) = &self.frame_loop {
            frame_loop.stop_loop();
        }
        self.is_playing = false;
    }

    /// Flips playback based on the previous state. The flag changes as soon
    /// as the action is issued; the element may start sounding later.
    pub fn toggle_play_pause(&mut self) {
        let Some(media) = &self.media else {
            return;
        };
        self.resume_if_suspended();

        let was_playing = self.is_playing;
        if was_playing {
            media.pause();
            if let Some(frame_loop) = &self.frame_loop {
                frame_loop.stop_loop();
            }
        } else {
            Self::start_media(media);
            if let Some(frame_loop) = &self.frame_loop {
                frame_loop.start_loop();
            }
        }
        self.is_playing = !was_playing;
    }

    /// Clamping to the track length is left to the media element.
    pub fn seek_to(&mut self, seconds: f64) {
        if let Some(media) = &self.media {
            media.set_current_time(seconds);
            self.clock.on_time_update(seconds);
        }
    }

    pub fn set_volume(&self, value: f32) {
        if let Some(gain) = self.chain.get(GAIN) {
            if !gain.set_gain(value) {
                log::warn!("processor '{GAIN}' is not a gain node");
            }
        }
    }

    pub fn set_pan(&self, value: f32) {
        if let Some(panner) = self.chain.get(PANNER) {
            if !panner.set_pan(value) {
                log::warn!("processor '{PANNER}' is not a stereo panner");
            }
        }
    }

    /// `None` when no gain processor is registered.
    pub fn volume(&self) -> Option<f32> {
        self.chain.get(GAIN).and_then(AudioNode::gain)
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        let Some(media) = &self.media else {
            return;
        };
        match event {
            MediaEvent::TimeUpdate => self.clock.on_time_update(media.current_time()),
            MediaEvent::MetadataLoaded => {
                self.clock.on_metadata(media.duration(), media.ready_state());
            }
            MediaEvent::Ended => {
                self.is_playing = false;
                self.clock.on_ended();
                if let Some(frame_loop) = &self.frame_loop {
                    frame_loop.stop_loop();
                }
            }
        }
    }

    /// Points the media element at a new track and re-wires the chain.
    pub fn change_track(&mut self, src: &str) -> AudioResult<()> {
        let Some(media) = &self.media else {
            return Ok(());
        };
        media.pause();
        if let Some(frame_loop) = &self.frame_loop {
            frame_loop.stop_loop();
        }
        media.set_src(src);
        self.is_playing = false;
        self.clock = PlaybackClock::loading();
        log::debug!("track changed to {src}");
        self.setup_track()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn context(&self) -> &B {
        &self.context
    }
}

impl<B: AudioBackend> Drop for AudioSession<B> {
    fn drop(&mut self) {
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.stop_loop();
        }
        self.unwire();
        if let Some((analyser, _)) = &self.analyser {
            analyser.disconnect().ok();
        }
        self.context.close();
    }
}

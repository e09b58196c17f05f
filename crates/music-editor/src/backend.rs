//! Contracts the core consumes from its host environment.
//!
//! In the browser these are backed by the Web Audio API, an `<audio>`
//! element, a 2D canvas and `requestAnimationFrame`. Tests drive the core
//! through in-memory fakes instead.

use egui::{Color32, Rect};

use crate::error::AudioResult;

/// Callback invoked exactly once with the outcome of an asynchronous
/// operation (context resume, media play).
pub type Completion = Box<dyn FnOnce(AudioResult<()>)>;

/// Run state of an audio context
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    Running,
    /// Browsers start contexts suspended until a user gesture
    Suspended,
    Closed,
}

/// A node in the processing graph.
pub trait AudioNode: Clone {
    /// Adds an edge from `self` to `destination`.
    fn connect(&self, destination: &Self) -> AudioResult<()>;

    /// Removes every outgoing edge of `self`.
    fn disconnect(&self) -> AudioResult<()>;

    /// Current gain value, or `None` when this is not a gain node.
    fn gain(&self) -> Option<f32>;

    /// Returns `false` when this is not a gain node.
    fn set_gain(&self, value: f32) -> bool;

    /// Returns `false` when this is not a stereo panner.
    fn set_pan(&self, value: f32) -> bool;
}

/// Read-only view onto an analyser's frequency domain output.
pub trait FrequencyTap {
    fn frequency_bin_count(&self) -> usize;

    /// Copies the current byte magnitudes (0..=255) into `buffer`.
    fn byte_frequency_data(&self, buffer: &mut [u8]);
}

/// Media playback source wrapped by the graph's source node.
pub trait MediaElement: Clone {
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// NaN until metadata has loaded.
    fn duration(&self) -> f64;
    /// HTML media `readyState` (0..=4).
    fn ready_state(&self) -> u16;
    fn set_src(&self, src: &str);
    fn pause(&self);
    /// Starts playback; `done` receives the result once the host settles it.
    fn play(&self, done: Completion);
}

/// The audio device context: node factories plus suspend/resume state.
pub trait AudioBackend {
    type Node: AudioNode;
    type Tap: FrequencyTap + Clone + 'static;
    type Media: MediaElement;

    fn state(&self) -> ContextState;
    fn resume(&self, done: Completion);
    fn destination(&self) -> Self::Node;

    /// Wrapping the same media element twice is invalid in the browser.
    fn create_media_source(&self, media: &Self::Media) -> AudioResult<Self::Node>;
    fn create_gain(&self, initial: f32) -> AudioResult<Self::Node>;
    fn create_stereo_panner(&self, initial: f32) -> AudioResult<Self::Node>;
    fn create_analyser(&self, fft_size: u32, smoothing: f64) -> AudioResult<(Self::Node, Self::Tap)>;

    fn close(&self);
}

/// RGB colour with a free-range alpha.
///
/// Alpha is not clamped: the wave style lets loud bins overshoot 1.0 and
/// the canvas saturates them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fill {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f64,
}

impl Fill {
    pub fn new(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self { r, g, b, alpha }
    }

    pub fn opaque(color: Color32) -> Self {
        Self::new(color.r(), color.g(), color.b(), 1.0)
    }

    /// CSS `rgba()` string for a canvas `fillStyle`.
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.alpha)
    }
}

/// 2D immediate-mode drawing target.
pub trait DrawSurface: PartialEq {
    /// Laid-out size in pixels; zero while the host has not measured it.
    fn pixel_size(&self) -> (u32, u32);

    /// Resizes the backing store and the CSS size together.
    fn set_pixel_size(&mut self, width: u32, height: u32);

    /// Clears every pixel to transparent.
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, fill: Fill);
}

/// Opaque id of a scheduled frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// One-shot "before next repaint" callbacks.
pub trait FrameScheduler {
    /// Returns `None` when the host refused to schedule.
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameHandle>;

    fn cancel_frame(&self, handle: FrameHandle);
}

/// Something with a per-frame loop the player can start and stop.
pub trait FrameLoop {
    fn start_loop(&self);
    fn stop_loop(&self);
}

//! Playback core of the music editor.
//!
//! [`graph::AudioSession`] owns the signal chain from a media element to
//! the output device; [`visualizer::Visualizer`] polls the chain's analysis
//! tap once per frame and paints frequency bars. Both talk to the host only
//! through the traits in [`backend`].

pub mod backend;
pub mod bars;
pub mod chain;
pub mod config;
pub mod error;
pub mod graph;
pub mod library;
pub mod playback;
pub mod timefmt;
pub mod visualizer;

#[cfg(test)]
mod testing;

pub use config::{BarStyle, EditorConfig};
pub use error::{AudioError, AudioResult, ConfigError};
pub use graph::AudioSession;
pub use visualizer::Visualizer;

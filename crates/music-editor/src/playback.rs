//! Passive mirror of the media element's position and duration.

/// HTML `HAVE_CURRENT_DATA`: enough is buffered to render the current frame.
pub const HAVE_CURRENT_DATA: u16 = 2;

/// Signals the media element emits while a track plays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaEvent {
    TimeUpdate,
    MetadataLoaded,
    Ended,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackClock {
    pub current_time: f64,
    pub duration: f64,
    pub is_loading: bool,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            is_loading: false,
        }
    }
}

impl PlaybackClock {
    /// Clock state right after a new source was attached.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn on_time_update(&mut self, position: f64) {
        self.current_time = position;
    }

    /// Captures the duration; stays loading until the element can render.
    pub fn on_metadata(&mut self, duration: f64, ready_state: u16) {
        self.duration = duration;
        if ready_state >= HAVE_CURRENT_DATA {
            self.is_loading = false;
        }
    }

    pub fn on_ended(&mut self) {
        self.current_time = 0.0;
    }

    /// Fraction of the track played, 0 while the duration is unknown.
    pub fn progress(&self) -> f32 {
        if self.duration.is_finite() && self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0) as f32
        } else {
            0.0
        }
    }

    /// Horizontal playhead offset in percent of the timeline width.
    ///
    /// The playhead never sits left of 1% so its knob stays visible.
    pub fn playhead_percent(&self) -> f32 {
        (self.progress() * 99.0).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_clears_loading_only_when_ready() {
        let mut clock = PlaybackClock::loading();
        clock.on_metadata(180.0, 1);
        assert_eq!(clock.duration, 180.0);
        assert!(clock.is_loading);

        clock.on_metadata(180.0, HAVE_CURRENT_DATA);
        assert!(!clock.is_loading);
    }

    #[test]
    fn progress_is_zero_for_unknown_duration() {
        let mut clock = PlaybackClock::default();
        clock.on_time_update(12.0);
        assert_eq!(clock.progress(), 0.0);

        clock.duration = f64::NAN;
        assert_eq!(clock.progress(), 0.0);
    }

    #[test]
    fn playhead_is_clamped_to_one_percent() {
        let mut clock = PlaybackClock {
            duration: 200.0,
            ..PlaybackClock::default()
        };
        assert_eq!(clock.playhead_percent(), 1.0);

        clock.on_time_update(100.0);
        assert!((clock.playhead_percent() - 49.5).abs() < 1e-4);

        clock.on_ended();
        assert_eq!(clock.current_time, 0.0);
    }
}

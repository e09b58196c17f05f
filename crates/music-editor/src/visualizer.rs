//! Frame-driven frequency bar renderer.
//!
//! The renderer polls a [`FrequencyTap`] once per display frame and paints
//! bars onto a [`DrawSurface`]. Each frame schedules the next one before
//! drawing, so the loop follows the display's refresh rate and stops
//! whenever no callback is pending. At most one callback is outstanding.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use egui::{Pos2, Rect};

use crate::backend::{DrawSurface, FrameHandle, FrameLoop, FrameScheduler, FrequencyTap};
use crate::bars::{self, HARMONICS_BACKDROP, WAVE_BACKDROP};
use crate::config::{BarStyle, VisualizerConfig};

struct LoopState<S, T, F> {
    scheduler: Rc<F>,
    surface: Option<S>,
    tap: Option<T>,
    bins: Vec<u8>,
    width: u32,
    height: u32,
    fallback: (u32, u32),
    style: BarStyle,
    pending: Option<FrameHandle>,
    frames_drawn: u64,
}

impl<S, T, F> LoopState<S, T, F>
where
    S: DrawSurface + 'static,
    T: FrequencyTap + 'static,
    F: FrameScheduler + 'static,
{
    fn full_rect(&self) -> Rect {
        Rect::from_min_max(Pos2::ZERO, Pos2::new(self.width as f32, self.height as f32))
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
            log::debug!("visualizer loop stopped");
        }
    }

    fn schedule(shared: &Rc<RefCell<Self>>) {
        let weak: Weak<RefCell<Self>> = Rc::downgrade(shared);
        let scheduler = shared.borrow().scheduler.clone();
        let handle = scheduler.request_frame(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                Self::on_frame(&shared);
            }
        }));
        if handle.is_none() {
            log::warn!("frame scheduler refused a callback, visualizer loop halted");
        }
        shared.borrow_mut().pending = handle;
    }

    fn on_frame(shared: &Rc<RefCell<Self>>) {
        {
            let mut state = shared.borrow_mut();
            state.pending = None;
            if state.surface.is_none() || state.tap.is_none() {
                return;
            }
        }
        Self::schedule(shared);
        shared.borrow_mut().draw_frame();
    }

    fn paint_backdrop(&mut self) {
        let full = self.full_rect();
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
            surface.fill_rect(full, WAVE_BACKDROP);
        }
    }

    fn draw_frame(&mut self) {
        let full = self.full_rect();
        let (Some(surface), Some(tap)) = (self.surface.as_mut(), self.tap.as_ref()) else {
            return;
        };

        let count = tap.frequency_bin_count();
        if self.bins.len() != count {
            self.bins.resize(count, 0);
        }
        tap.byte_frequency_data(&mut self.bins);

        match self.style {
            BarStyle::Wave => {
                surface.clear();
                surface.fill_rect(full, WAVE_BACKDROP);
            }
            BarStyle::Harmonics => surface.fill_rect(full, HARMONICS_BACKDROP),
        }

        let bars = bars::layout(
            self.style,
            &self.bins,
            f64::from(self.width),
            f64::from(self.height),
        );
        for bar in bars {
            surface.fill_rect(bar.rect, bar.fill);
        }
        self.frames_drawn += 1;
    }
}

/// Paints an analysis tap onto a bound surface, one frame at a time.
pub struct Visualizer<S, T, F>
where
    S: DrawSurface + 'static,
    T: FrequencyTap + 'static,
    F: FrameScheduler + 'static,
{
    state: Rc<RefCell<LoopState<S, T, F>>>,
}

impl<S, T, F> Visualizer<S, T, F>
where
    S: DrawSurface + 'static,
    T: FrequencyTap + 'static,
    F: FrameScheduler + 'static,
{
    pub fn new(scheduler: F, config: &VisualizerConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(LoopState {
                scheduler: Rc::new(scheduler),
                surface: None,
                tap: None,
                bins: Vec::new(),
                width: 0,
                height: 0,
                fallback: (config.fallback_width, config.fallback_height),
                style: config.style,
                pending: None,
                frames_drawn: 0,
            })),
        }
    }

    /// Associates a surface and the tap it visualizes.
    ///
    /// Binding the surface that is already bound does nothing. Binding a
    /// different one stops the running loop first.
    pub fn bind_surface(&self, surface: S, tap: T) {
        let (width, height) = {
            let mut state = self.state.borrow_mut();
            if state.surface.as_ref() == Some(&surface) {
                return;
            }
            state.cancel_pending();

            let (mut width, mut height) = surface.pixel_size();
            if width == 0 {
                width = state.fallback.0;
            }
            if height == 0 {
                height = state.fallback.1;
            }
            state.bins = vec![0; tap.frequency_bin_count()];
            state.surface = Some(surface);
            state.tap = Some(tap);
            (width, height)
        };
        self.set_size(width, height);
        log::debug!("visualizer bound to {width}x{height} surface");
    }

    /// Stops the loop and forgets the surface, e.g. when its page unmounts.
    pub fn unbind(&self) {
        let mut state = self.state.borrow_mut();
        state.cancel_pending();
        state.surface = None;
        state.tap = None;
    }

    /// Resizes the backing store and repaints the empty backdrop.
    pub fn set_size(&self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        state.width = width;
        state.height = height;
        if let Some(surface) = state.surface.as_mut() {
            surface.set_pixel_size(width, height);
        }
        state.paint_backdrop();
    }

    /// Follows a measured container size. Zero-sized or unchanged
    /// measurements are ignored; returns whether the surface was resized.
    pub fn fit_to(&self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || self.size() == (width, height) {
            return false;
        }
        self.set_size(width, height);
        true
    }

    pub fn set_style(&self, style: BarStyle) {
        self.state.borrow_mut().style = style;
    }

    pub fn style(&self) -> BarStyle {
        self.state.borrow().style
    }

    pub fn size(&self) -> (u32, u32) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    pub fn start_loop(&self) {
        {
            let state = self.state.borrow();
            if state.pending.is_some() {
                return;
            }
            if state.surface.is_none() || state.tap.is_none() {
                log::warn!("visualizer has no surface or tap bound, loop not started");
                return;
            }
        }
        LoopState::schedule(&self.state);
        log::debug!("visualizer loop started");
    }

    /// Safe to call when no loop is running.
    pub fn stop_loop(&self) {
        self.state.borrow_mut().cancel_pending();
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.state.borrow().frames_drawn
    }
}

impl<S, T, F> FrameLoop for Visualizer<S, T, F>
where
    S: DrawSurface + 'static,
    T: FrequencyTap + 'static,
    F: FrameScheduler + 'static,
{
    fn start_loop(&self) {
        Visualizer::start_loop(self);
    }

    fn stop_loop(&self) {
        Visualizer::stop_loop(self);
    }
}

impl<S, T, F> Drop for Visualizer<S, T, F>
where
    S: DrawSurface + 'static,
    T: FrequencyTap + 'static,
    F: FrameScheduler + 'static,
{
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.cancel_pending();
        }
    }
}

//! In-memory fakes of the host contracts, used by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use egui::Rect;

use crate::backend::{
    AudioBackend, AudioNode, Completion, ContextState, DrawSurface, Fill, FrameHandle, FrameLoop,
    FrameScheduler, FrequencyTap, MediaElement,
};
use crate::error::{AudioError, AudioResult};

#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
    pub label: String,
    pub gain: Option<f32>,
    pub pan: Option<f32>,
}

#[derive(Default)]
pub struct FakeGraph {
    pub nodes: Vec<NodeInfo>,
    pub edges: Vec<(usize, usize)>,
    /// Connections into a node with this label fail.
    pub refuse_into: Option<String>,
}

impl FakeGraph {
    pub fn out_degree(&self, id: usize) -> usize {
        self.edges.iter().filter(|(from, _)| *from == id).count()
    }

    /// Labels along the signal path starting at `from`, stopping at a node
    /// with no single successor.
    pub fn path_from(&self, from: usize) -> Vec<String> {
        let mut path = vec![self.nodes[from].label.clone()];
        let mut current = from;
        while self.out_degree(current) == 1 && path.len() <= self.nodes.len() {
            let (_, next) = self.edges.iter().find(|(f, _)| *f == current).copied().unwrap();
            path.push(self.nodes[next].label.clone());
            current = next;
        }
        path
    }

    pub fn id_of(&self, label: &str) -> usize {
        self.nodes.iter().position(|n| n.label == label).unwrap()
    }

    pub fn has_edges(&self, id: usize) -> bool {
        self.edges.iter().any(|(f, t)| *f == id || *t == id)
    }
}

#[derive(Clone)]
pub struct FakeNode {
    pub id: usize,
    graph: Rc<RefCell<FakeGraph>>,
}

impl std::fmt::Debug for FakeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FakeNode({})", self.id)
    }
}

impl AudioNode for FakeNode {
    fn connect(&self, destination: &Self) -> AudioResult<()> {
        let mut graph = self.graph.borrow_mut();
        if graph.refuse_into.as_deref() == Some(graph.nodes[destination.id].label.as_str()) {
            return Err(AudioError::Connect(format!("{} refused input", destination.id)));
        }
        graph.edges.push((self.id, destination.id));
        Ok(())
    }

    fn disconnect(&self) -> AudioResult<()> {
        self.graph.borrow_mut().edges.retain(|(from, _)| *from != self.id);
        Ok(())
    }

    fn gain(&self) -> Option<f32> {
        self.graph.borrow().nodes[self.id].gain
    }

    fn set_gain(&self, value: f32) -> bool {
        let mut graph = self.graph.borrow_mut();
        match graph.nodes[self.id].gain.as_mut() {
            Some(gain) => {
                *gain = value;
                true
            }
            None => false,
        }
    }

    fn set_pan(&self, value: f32) -> bool {
        let mut graph = self.graph.borrow_mut();
        match graph.nodes[self.id].pan.as_mut() {
            Some(pan) => {
                *pan = value;
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeTap {
    pub bins: Rc<RefCell<Vec<u8>>>,
    pub reads: Rc<Cell<usize>>,
}

impl FakeTap {
    pub fn with_bins(bins: Vec<u8>) -> Self {
        Self {
            bins: Rc::new(RefCell::new(bins)),
            reads: Rc::new(Cell::new(0)),
        }
    }
}

impl FrequencyTap for FakeTap {
    fn frequency_bin_count(&self) -> usize {
        self.bins.borrow().len()
    }

    fn byte_frequency_data(&self, buffer: &mut [u8]) {
        self.reads.set(self.reads.get() + 1);
        let bins = self.bins.borrow();
        let n = buffer.len().min(bins.len());
        buffer[..n].copy_from_slice(&bins[..n]);
    }
}

#[derive(Debug, Default)]
pub struct MediaState {
    pub current_time: f64,
    pub duration: f64,
    pub ready_state: u16,
    pub src: String,
    pub playing: bool,
    pub play_calls: usize,
    pub pause_calls: usize,
    pub reject_play: bool,
}

#[derive(Clone, Default)]
pub struct FakeMedia {
    pub state: Rc<RefCell<MediaState>>,
}

impl MediaElement for FakeMedia {
    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.borrow_mut().current_time = seconds;
    }

    fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    fn ready_state(&self) -> u16 {
        self.state.borrow().ready_state
    }

    fn set_src(&self, src: &str) {
        src.clone_into(&mut self.state.borrow_mut().src);
    }

    fn pause(&self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.pause_calls += 1;
    }

    fn play(&self, done: Completion) {
        let rejected = {
            let mut state = self.state.borrow_mut();
            state.play_calls += 1;
            state.playing = !state.reject_play;
            state.reject_play
        };
        if rejected {
            done(Err(AudioError::Play("NotAllowedError".to_string())));
        } else {
            done(Ok(()));
        }
    }
}

pub struct FakeBackend {
    pub graph: Rc<RefCell<FakeGraph>>,
    pub state: Cell<ContextState>,
    pub resume_calls: Cell<usize>,
    pub reject_resume: Cell<bool>,
    pub fail_gain: Cell<bool>,
    pub tap: FakeTap,
    wrapped: RefCell<Vec<Rc<RefCell<MediaState>>>>,
    destination: FakeNode,
}

impl FakeBackend {
    pub fn new(state: ContextState) -> Self {
        let graph = Rc::new(RefCell::new(FakeGraph::default()));
        let destination = Self::push(&graph, "destination", None, None);
        Self {
            graph,
            state: Cell::new(state),
            resume_calls: Cell::new(0),
            reject_resume: Cell::new(false),
            fail_gain: Cell::new(false),
            tap: FakeTap::with_bins(vec![0; 8]),
            wrapped: RefCell::new(Vec::new()),
            destination,
        }
    }

    fn push(
        graph: &Rc<RefCell<FakeGraph>>,
        label: &str,
        gain: Option<f32>,
        pan: Option<f32>,
    ) -> FakeNode {
        let mut g = graph.borrow_mut();
        g.nodes.push(NodeInfo {
            label: label.to_string(),
            gain,
            pan,
        });
        FakeNode {
            id: g.nodes.len() - 1,
            graph: graph.clone(),
        }
    }

    /// A pass-through processor with no parameters.
    pub fn custom_node(&self, label: &str) -> FakeNode {
        Self::push(&self.graph, label, None, None)
    }

    pub fn sources_created(&self) -> usize {
        self.graph.borrow().nodes.iter().filter(|n| n.label == "source").count()
    }
}

impl AudioBackend for FakeBackend {
    type Node = FakeNode;
    type Tap = FakeTap;
    type Media = FakeMedia;

    fn state(&self) -> ContextState {
        self.state.get()
    }

    fn resume(&self, done: Completion) {
        self.resume_calls.set(self.resume_calls.get() + 1);
        if self.reject_resume.get() {
            done(Err(AudioError::Resume("no user gesture".to_string())));
        } else {
            self.state.set(ContextState::Running);
            done(Ok(()));
        }
    }

    fn destination(&self) -> FakeNode {
        self.destination.clone()
    }

    fn create_media_source(&self, media: &FakeMedia) -> AudioResult<FakeNode> {
        let mut wrapped = self.wrapped.borrow_mut();
        if wrapped.iter().any(|m| Rc::ptr_eq(m, &media.state)) {
            return Err(AudioError::NodeCreation {
                kind: "media source",
                reason: "element already wrapped".to_string(),
            });
        }
        wrapped.push(media.state.clone());
        Ok(Self::push(&self.graph, "source", None, None))
    }

    fn create_gain(&self, initial: f32) -> AudioResult<FakeNode> {
        if self.fail_gain.get() {
            return Err(AudioError::NodeCreation {
                kind: "gain",
                reason: "context refused".to_string(),
            });
        }
        Ok(Self::push(&self.graph, "gain", Some(initial), None))
    }

    fn create_stereo_panner(&self, initial: f32) -> AudioResult<FakeNode> {
        Ok(Self::push(&self.graph, "panner", None, Some(initial)))
    }

    fn create_analyser(&self, _fft_size: u32, _smoothing: f64) -> AudioResult<(FakeNode, FakeTap)> {
        Ok((Self::push(&self.graph, "analysis", None, None), self.tap.clone()))
    }

    fn close(&self) {
        self.state.set(ContextState::Closed);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Resize(u32, u32),
    Clear,
    Fill(Rect, Fill),
}

#[derive(Default)]
pub struct SurfaceLog {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<SurfaceOp>,
}

impl SurfaceLog {
    pub fn bars(&self) -> Vec<(Rect, Fill)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Fill(rect, fill) => Some((*rect, *fill)),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct FakeSurface {
    pub log: Rc<RefCell<SurfaceLog>>,
}

impl FakeSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            log: Rc::new(RefCell::new(SurfaceLog {
                width,
                height,
                ops: Vec::new(),
            })),
        }
    }

    pub fn fill_count(&self) -> usize {
        self.log.borrow().bars().len()
    }
}

impl PartialEq for FakeSurface {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.log, &other.log)
    }
}

impl DrawSurface for FakeSurface {
    fn pixel_size(&self) -> (u32, u32) {
        let log = self.log.borrow();
        (log.width, log.height)
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) {
        let mut log = self.log.borrow_mut();
        log.width = width;
        log.height = height;
        log.ops.push(SurfaceOp::Resize(width, height));
    }

    fn clear(&mut self) {
        self.log.borrow_mut().ops.push(SurfaceOp::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill) {
        self.log.borrow_mut().ops.push(SurfaceOp::Fill(rect, fill));
    }
}

#[derive(Default)]
pub struct SchedulerState {
    next_id: i32,
    pub pending: Vec<(FrameHandle, Box<dyn FnOnce()>)>,
    pub cancelled: Vec<FrameHandle>,
}

#[derive(Clone, Default)]
pub struct FakeScheduler {
    pub state: Rc<RefCell<SchedulerState>>,
}

impl FakeScheduler {
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Runs every callback scheduled before this call.
    pub fn fire_frame(&self) {
        let due = std::mem::take(&mut self.state.borrow_mut().pending);
        for (_, callback) in due {
            callback();
        }
    }
}

impl FrameScheduler for FakeScheduler {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameHandle> {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let handle = FrameHandle(state.next_id);
        state.pending.push((handle, callback));
        Some(handle)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        state.pending.retain(|(h, _)| *h != handle);
        state.cancelled.push(handle);
    }
}

#[derive(Default)]
pub struct FakeLoop {
    pub starts: Cell<usize>,
    pub stops: Cell<usize>,
}

impl FrameLoop for FakeLoop {
    fn start_loop(&self) {
        self.starts.set(self.starts.get() + 1);
    }

    fn stop_loop(&self) {
        self.stops.set(self.stops.get() + 1);
    }
}

/// In-memory audio graph for tests and headless runs.
///
/// Produces no sound. The clock only advances when told to, voices finish
/// only when told to, and every handle is inspectable, which makes the
/// sound manager's lifecycle behavior fully deterministic under test.
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::graph::{
    AudioGraph, GraphState, NodeId, SampleBuffer, VoiceConfig, VoiceId,
};
use crate::error::GraphError;

/// Decoded "samples" are one frame per input byte at this rate, so a
/// payload of N bytes decodes to N / 100 seconds of audio.
const FAKE_SAMPLE_RATE: u32 = 100;

#[derive(Debug, Clone, Copy)]
struct FakeNode {
    gain: f32,
    connected: bool,
}

/// Snapshot of a voice's routing and schedule, exposed for assertions.
#[derive(Debug, Clone, Copy)]
pub struct FakeVoice {
    pub config: VoiceConfig,
    pub target: Option<NodeId>,
    pub started_at: Option<f64>,
    pub start_offset: f64,
    pub stopped: bool,
}

#[derive(Default)]
struct Inner {
    now: f64,
    state: Option<GraphState>,
    next_id: u64,
    nodes: HashMap<NodeId, FakeNode>,
    voices: HashMap<VoiceId, FakeVoice>,
    finished: Vec<VoiceId>,
    resume_calls: usize,
    suspend_calls: usize,
    fail_resume: bool,
    fail_suspend: bool,
}

impl Inner {
    fn state(&mut self) -> GraphState {
        // Fresh graphs start suspended, like a platform context created
        // outside a user gesture.
        *self.state.get_or_insert(GraphState::Suspended)
    }
}

#[derive(Clone, Default)]
pub struct FakeGraph {
    inner: Arc<Mutex<Inner>>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the graph clock by `secs`.
    pub fn advance(&self, secs: f64) {
        self.inner.lock().now += secs;
    }

    /// Mark a voice as having reached its natural end.
    pub fn finish_voice(&self, voice: VoiceId) {
        let mut inner = self.inner.lock();
        if let Some(v) = inner.voices.get_mut(&voice) {
            v.stopped = true;
        }
        inner.finished.push(voice);
    }

    /// Make subsequent `resume` calls fail, as under an autoplay policy.
    pub fn set_fail_resume(&self, fail: bool) {
        self.inner.lock().fail_resume = fail;
    }

    pub fn set_fail_suspend(&self, fail: bool) {
        self.inner.lock().fail_suspend = fail;
    }

    pub fn voice(&self, voice: VoiceId) -> Option<FakeVoice> {
        self.inner.lock().voices.get(&voice).copied()
    }

    /// Voices that have been started and not stopped.
    pub fn live_voices(&self) -> usize {
        self.inner
            .lock()
            .voices
            .values()
            .filter(|v| v.started_at.is_some() && !v.stopped)
            .count()
    }

    pub fn node_gain(&self, node: NodeId) -> Option<f32> {
        self.inner.lock().nodes.get(&node).map(|n| n.gain)
    }

    pub fn node_connected(&self, node: NodeId) -> bool {
        self.inner
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.connected)
            .unwrap_or(false)
    }

    pub fn resume_calls(&self) -> usize {
        self.inner.lock().resume_calls
    }

    pub fn suspend_calls(&self) -> usize {
        self.inner.lock().suspend_calls
    }

    pub fn graph_state(&self) -> GraphState {
        self.inner.lock().state()
    }
}

impl AudioGraph for FakeGraph {
    fn decode(&mut self, bytes: &[u8]) -> Result<SampleBuffer, GraphError> {
        if bytes.is_empty() {
            return Err(GraphError::Decode("empty payload".into()));
        }
        let pcm = bytes.iter().map(|&b| i16::from(b)).collect();
        Ok(SampleBuffer::new(pcm, 1, FAKE_SAMPLE_RATE))
    }

    fn create_volume_node(&mut self) -> NodeId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = NodeId(inner.next_id);
        inner.nodes.insert(
            id,
            FakeNode {
                gain: 1.0,
                connected: false,
            },
        );
        id
    }

    fn connect_to_output(&mut self, node: NodeId) {
        if let Some(n) = self.inner.lock().nodes.get_mut(&node) {
            n.connected = true;
        }
    }

    fn disconnect(&mut self, node: NodeId) {
        if let Some(n) = self.inner.lock().nodes.get_mut(&node) {
            n.connected = false;
        }
    }

    fn set_gain(&mut self, node: NodeId, gain: f32) {
        if let Some(n) = self.inner.lock().nodes.get_mut(&node) {
            n.gain = gain;
        }
    }

    fn create_voice(
        &mut self,
        _sample: &SampleBuffer,
        config: VoiceConfig,
        target: Option<NodeId>,
    ) -> VoiceId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = VoiceId(inner.next_id);
        inner.voices.insert(
            id,
            FakeVoice {
                config,
                target,
                started_at: None,
                start_offset: 0.0,
                stopped: false,
            },
        );
        id
    }

    fn start_voice(&mut self, voice: VoiceId, when: f64, offset: f64) {
        let mut inner = self.inner.lock();
        let now = inner.now;
        if let Some(v) = inner.voices.get_mut(&voice) {
            v.started_at = Some(now + when);
            v.start_offset = offset;
        }
    }

    fn stop_voice(&mut self, voice: VoiceId) {
        if let Some(v) = self.inner.lock().voices.get_mut(&voice) {
            v.stopped = true;
        }
    }

    fn current_time(&self) -> f64 {
        self.inner.lock().now
    }

    fn state(&self) -> GraphState {
        self.inner.lock().state()
    }

    fn resume(&mut self) -> Result<(), GraphError> {
        let mut inner = self.inner.lock();
        inner.resume_calls += 1;
        if inner.fail_resume {
            return Err(GraphError::Transport("resume rejected".to_string()));
        }
        inner.state = Some(GraphState::Running);
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), GraphError> {
        let mut inner = self.inner.lock();
        inner.suspend_calls += 1;
        if inner.fail_suspend {
            return Err(GraphError::Transport("suspend rejected".to_string()));
        }
        inner.state = Some(GraphState::Suspended);
        Ok(())
    }

    fn drain_finished(&mut self) -> Vec<VoiceId> {
        let mut inner = self.inner.lock();
        let finished = std::mem::take(&mut inner.finished);
        for id in &finished {
            inner.voices.remove(id);
        }
        finished
    }
}

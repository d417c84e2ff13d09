/// Platform audio graph abstraction.
///
/// Node creation, routing, and transport control are hidden behind the
/// `AudioGraph` trait so the sound manager can run against the rodio-backed
/// graph in production and an in-memory graph in tests.
use std::sync::Arc;

use crate::error::GraphError;

/// Lifecycle state of the audio graph.
///
/// `Uninitialized` is reported by the manager before a graph exists; graph
/// implementations themselves only move between the other three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Uninitialized,
    Suspended,
    Running,
    Closed,
}

/// Identifier of a volume (gain) node inside the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u64);

/// Handle to one playable voice.
///
/// One-shot voices play once and self-retire; looping voices repeat until
/// explicitly stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub(crate) u64);

/// Decoded, immutable PCM samples shared between voices.
///
/// Cloning is cheap; the sample data itself is reference counted.
#[derive(Clone)]
pub struct SampleBuffer {
    pcm: Arc<Vec<i16>>,
    channels: u16,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(pcm: Vec<i16>, channels: u16, sample_rate: u32) -> Self {
        Self {
            pcm: Arc::new(pcm),
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Duration of the sample in seconds.
    pub fn duration_secs(&self) -> f64 {
        let frames = self.pcm.len() as f64 / f64::from(self.channels);
        frames / f64::from(self.sample_rate)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub(crate) fn pcm(&self) -> &Arc<Vec<i16>> {
        &self.pcm
    }
}

/// Parameters for a new voice.
#[derive(Debug, Clone, Copy)]
pub struct VoiceConfig {
    pub volume: f32,
    pub playback_rate: f32,
    pub looping: bool,
}

/// Platform binding for the audio routing network.
///
/// Every fallible transport call returns a `GraphError` that the caller is
/// expected to swallow; nothing in this trait panics.
pub trait AudioGraph {
    /// Decode raw bytes into shareable PCM samples.
    fn decode(&mut self, bytes: &[u8]) -> Result<SampleBuffer, GraphError>;

    /// Create a volume node with unit gain, unconnected.
    fn create_volume_node(&mut self) -> NodeId;

    /// Connect a volume node to the output sink.
    fn connect_to_output(&mut self, node: NodeId);

    /// Disconnect a volume node from the output sink. Hard cut: nothing
    /// routed through the node is audible afterwards.
    fn disconnect(&mut self, node: NodeId);

    /// Set a node's gain at the current graph time, cancelling any pending
    /// scheduled gain changes.
    fn set_gain(&mut self, node: NodeId, gain: f32);

    /// Create a voice bound to `sample`, routed through a private per-voice
    /// gain into `target`, or directly into the output sink when `target`
    /// is `None`. The voice does not produce audio until started.
    fn create_voice(
        &mut self,
        sample: &SampleBuffer,
        config: VoiceConfig,
        target: Option<NodeId>,
    ) -> VoiceId;

    /// Schedule a voice to start `when` seconds from now, `offset` seconds
    /// into its sample.
    fn start_voice(&mut self, voice: VoiceId, when: f64, offset: f64);

    /// Stop a voice. Stopping an unknown or already-stopped voice is a
    /// no-op, not an error.
    fn stop_voice(&mut self, voice: VoiceId);

    /// Monotonic graph clock in seconds.
    fn current_time(&self) -> f64;

    fn state(&self) -> GraphState;

    fn resume(&mut self) -> Result<(), GraphError>;

    fn suspend(&mut self) -> Result<(), GraphError>;

    /// Voices that reached their natural end since the last drain.
    fn drain_finished(&mut self) -> Vec<VoiceId>;
}

/// Factory used by the sound manager to create its graph lazily.
///
/// Returning `None` means the audio platform is unavailable; the manager
/// then behaves as perpetually uninitialized rather than failing.
pub type GraphFactory = Box<dyn Fn() -> Option<Box<dyn AudioGraph>> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_buffer_duration() {
        // 2 channels at 100 Hz, 400 samples = 200 frames = 2 seconds.
        let sample = SampleBuffer::new(vec![0; 400], 2, 100);
        assert!((sample.duration_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_buffer_guards_zero_rate() {
        let sample = SampleBuffer::new(vec![0; 10], 0, 0);
        assert_eq!(sample.channels(), 1);
        assert_eq!(sample.sample_rate(), 1);
        assert!(sample.duration_secs().is_finite());
    }

    #[test]
    fn test_sample_buffer_clone_shares_data() {
        let sample = SampleBuffer::new(vec![1, 2, 3], 1, 100);
        let clone = sample.clone();
        assert!(Arc::ptr_eq(sample.pcm(), clone.pcm()));
    }
}

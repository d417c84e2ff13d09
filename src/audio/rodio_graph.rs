/// Rodio-backed audio graph.
///
/// Maps the abstract graph onto rodio primitives: each voice is a `Sink`
/// fed from the shared in-memory sample data, and volume nodes become
/// multipliers folded into the sink volumes. Completion of one-shot voices
/// is reported through an `EmptyCallback` source appended after the sample,
/// delivered to `drain_finished` over a crossbeam channel.
use std::collections::HashMap;
use std::io::Cursor;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use rodio::buffer::SamplesBuffer;
use rodio::source::EmptyCallback;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use crate::audio::graph::{
    AudioGraph, GraphFactory, GraphState, NodeId, SampleBuffer, VoiceConfig, VoiceId,
};
use crate::error::GraphError;

#[derive(Debug, Clone, Copy)]
struct GainNode {
    gain: f32,
    connected: bool,
}

struct Voice {
    // Absent when the sink could not be opened; the voice then exists only
    // as bookkeeping and never produces audio.
    sink: Option<Sink>,
    sample: SampleBuffer,
    config: VoiceConfig,
    target: Option<NodeId>,
}

pub struct RodioGraph {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    nodes: HashMap<NodeId, GainNode>,
    voices: HashMap<VoiceId, Voice>,
    next_id: u64,
    state: GraphState,
    epoch: Instant,
    done_tx: Sender<VoiceId>,
    done_rx: Receiver<VoiceId>,
}

impl RodioGraph {
    /// Open the default output device.
    pub fn new() -> Result<Self, GraphError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| GraphError::OutputUnavailable(Box::new(e)))?;
        let (done_tx, done_rx) = crossbeam_channel::unbounded();

        Ok(Self {
            _stream: stream,
            handle,
            nodes: HashMap::new(),
            voices: HashMap::new(),
            next_id: 0,
            // Native streams are live as soon as they open.
            state: GraphState::Running,
            epoch: Instant::now(),
            done_tx,
            done_rx,
        })
    }

    /// Graph factory for the sound manager. Yields `None` when no output
    /// device is available, which the manager treats as "no audio".
    pub fn factory() -> GraphFactory {
        Box::new(|| match RodioGraph::new() {
            Ok(graph) => Some(Box::new(graph) as Box<dyn AudioGraph>),
            Err(e) => {
                tracing::warn!("Audio output unavailable: {}", e);
                None
            }
        })
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Fold the routing topology into one sink volume: the per-voice gain
    /// times the target node's gain, silenced while the node is
    /// disconnected from the output sink.
    fn effective_volume(config: VoiceConfig, target: Option<&GainNode>) -> f32 {
        match target {
            Some(node) if node.connected => config.volume * node.gain,
            Some(_) => 0.0,
            None => config.volume,
        }
    }

    fn refresh_voice_volumes(&mut self) {
        for voice in self.voices.values() {
            if let Some(sink) = &voice.sink {
                let target = voice.target.and_then(|id| self.nodes.get(&id));
                sink.set_volume(Self::effective_volume(voice.config, target));
            }
        }
    }
}

impl AudioGraph for RodioGraph {
    fn decode(&mut self, bytes: &[u8]) -> Result<SampleBuffer, GraphError> {
        // The decoder requires owned data with a 'static lifetime.
        let cursor = Cursor::new(bytes.to_vec());
        let decoder =
            rodio::Decoder::new(cursor).map_err(|e| GraphError::Decode(Box::new(e)))?;

        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let pcm: Vec<i16> = decoder.collect();

        Ok(SampleBuffer::new(pcm, channels, sample_rate))
    }

    fn create_volume_node(&mut self) -> NodeId {
        let id = NodeId(self.next_id());
        self.nodes.insert(
            id,
            GainNode {
                gain: 1.0,
                connected: false,
            },
        );
        id
    }

    fn connect_to_output(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.connected = true;
        }
        self.refresh_voice_volumes();
    }

    fn disconnect(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.connected = false;
        }
        self.refresh_voice_volumes();
    }

    fn set_gain(&mut self, node: NodeId, gain: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.gain = gain.max(0.0);
        }
        self.refresh_voice_volumes();
    }

    fn create_voice(
        &mut self,
        sample: &SampleBuffer,
        config: VoiceConfig,
        target: Option<NodeId>,
    ) -> VoiceId {
        let id = VoiceId(self.next_id());

        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.pause();
                let node = target.and_then(|t| self.nodes.get(&t));
                sink.set_volume(Self::effective_volume(config, node));
                Some(sink)
            }
            Err(e) => {
                tracing::debug!("Failed to open sink for voice: {}", e);
                None
            }
        };

        self.voices.insert(
            id,
            Voice {
                sink,
                sample: sample.clone(),
                config,
                target,
            },
        );
        id
    }

    fn start_voice(&mut self, voice: VoiceId, when: f64, offset: f64) {
        let running = self.state == GraphState::Running;
        let done_tx = self.done_tx.clone();

        let Some(v) = self.voices.get_mut(&voice) else {
            return;
        };
        let Some(sink) = &v.sink else {
            // No sink: pretend the voice finished immediately so one-shot
            // bookkeeping still drains it.
            if !v.config.looping {
                let _ = done_tx.send(voice);
            }
            return;
        };

        // The sink requires owned data with a 'static lifetime.
        let pcm: Vec<i16> = v.sample.pcm().as_ref().clone();
        let buffer = SamplesBuffer::new(v.sample.channels(), v.sample.sample_rate(), pcm);

        // Repeat before skipping so a loop resumed mid-sample still wraps
        // over the full buffer on later passes.
        let source: Box<dyn Source<Item = i16> + Send> = if v.config.looping {
            Box::new(buffer.repeat_infinite())
        } else {
            Box::new(buffer)
        };
        let source: Box<dyn Source<Item = i16> + Send> = if offset > 0.0 {
            Box::new(source.skip_duration(Duration::from_secs_f64(offset)))
        } else {
            source
        };
        let source: Box<dyn Source<Item = i16> + Send> = if v.config.playback_rate != 1.0 {
            Box::new(source.speed(v.config.playback_rate))
        } else {
            source
        };
        let source: Box<dyn Source<Item = i16> + Send> = if when > 0.0 {
            Box::new(source.delay(Duration::from_secs_f64(when)))
        } else {
            source
        };

        sink.append(source);
        if !v.config.looping {
            sink.append(EmptyCallback::<i16>::new(Box::new(move || {
                let _ = done_tx.send(voice);
            })));
        }

        if running {
            sink.play();
        }
    }

    fn stop_voice(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.remove(&voice) {
            if let Some(sink) = v.sink {
                sink.stop();
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn state(&self) -> GraphState {
        self.state
    }

    fn resume(&mut self) -> Result<(), GraphError> {
        if self.state == GraphState::Closed {
            return Err(GraphError::Closed);
        }
        self.state = GraphState::Running;
        for voice in self.voices.values() {
            if let Some(sink) = &voice.sink {
                sink.play();
            }
        }
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), GraphError> {
        if self.state == GraphState::Closed {
            return Err(GraphError::Closed);
        }
        self.state = GraphState::Suspended;
        for voice in self.voices.values() {
            if let Some(sink) = &voice.sink {
                sink.pause();
            }
        }
        Ok(())
    }

    fn drain_finished(&mut self) -> Vec<VoiceId> {
        let finished: Vec<VoiceId> = self.done_rx.try_iter().collect();
        for id in &finished {
            self.voices.remove(id);
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests that need an output device live elsewhere; CI machines
    // generally have none. The volume fold is pure and testable.

    #[test]
    fn test_effective_volume_connected() {
        let config = VoiceConfig {
            volume: 0.5,
            playback_rate: 1.0,
            looping: false,
        };
        let node = GainNode {
            gain: 0.8,
            connected: true,
        };
        assert!((RodioGraph::effective_volume(config, Some(&node)) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_effective_volume_disconnected_is_silent() {
        let config = VoiceConfig {
            volume: 1.0,
            playback_rate: 1.0,
            looping: false,
        };
        let node = GainNode {
            gain: 1.0,
            connected: false,
        };
        assert_eq!(RodioGraph::effective_volume(config, Some(&node)), 0.0);
    }

    #[test]
    fn test_effective_volume_direct_to_output() {
        let config = VoiceConfig {
            volume: 0.7,
            playback_rate: 1.0,
            looping: false,
        };
        assert_eq!(RodioGraph::effective_volume(config, None), 0.7);
    }
}

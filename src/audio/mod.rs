/// Audio session module
///
/// Provides the audio session lifecycle manager and its platform bindings:
/// - One-shot and looping playback from an in-memory decoded-sample cache
/// - One-time unlock gating (platform autoplay policies)
/// - Glitch-free pause/resume of the whole graph on visibility changes
///
/// ## Architecture
///
/// ```text
/// SoundManager
///   ├── sample cache (name → SampleBuffer)
///   ├── one-shot voice registry (self-retiring)
///   └── loop registry (name → LoopState, offset retained while paused)
///         │
///         ▼
/// AudioGraph (trait)
///   ├── RodioGraph  — native output via rodio sinks
///   └── FakeGraph   — in-memory, deterministic, for tests/headless
/// ```
///
/// All voices route through a private per-voice gain into the master
/// volume node; pausing hard-cuts the master from the output sink before
/// touching any voice, so transitions never click.
pub mod fake;
pub mod graph;
pub mod manager;
pub mod rodio_graph;

// Re-export commonly used types
pub use fake::FakeGraph;
pub use graph::{AudioGraph, GraphFactory, GraphState, SampleBuffer, VoiceConfig, VoiceId};
pub use manager::{PlayOptions, SoundManager};
pub use rodio_graph::RodioGraph;

//! Ambient pond scene: decorative animators (bees, frogs, balloons) over a
//! lifecycle-managed audio session.
//!
//! The interesting part is [`audio::SoundManager`]: it owns a lazily
//! created audio graph, caches decoded samples by name, and survives
//! hide/show visibility transitions without clicks, duplicate loops, or
//! leaked voices. The scene animators in [`scene`] are plain deterministic
//! physics that compose the manager as a black box.

pub mod audio;
pub mod config;
pub mod error;
pub mod scene;
pub mod visibility;

pub use audio::{
    AudioGraph, FakeGraph, GraphState, PlayOptions, RodioGraph, SampleBuffer, SoundManager,
    VoiceId,
};
pub use config::Config;
pub use error::{AppResult, ConfigError, GraphError, LoadError};
pub use scene::Scene;
pub use visibility::VisibilitySignal;

/// Audio session lifecycle manager.
///
/// Owns the lazily-created audio graph, the decoded-sample cache, and the
/// registries of one-shot and looping voices. Playback is gated behind a
/// one-time `unlock` (platform autoplay policies) and suppressed while the
/// window is hidden; `pause_all`/`resume_all` carry loops across
/// hide/show transitions without clicks, duplicate voices, or orphaned
/// nodes. No platform failure except `LoadError` ever reaches the caller.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::audio::graph::{
    AudioGraph, GraphFactory, GraphState, NodeId, SampleBuffer, VoiceConfig, VoiceId,
};
use crate::error::LoadError;
use crate::visibility::VisibilitySignal;

/// Playback parameters for `SoundManager::play`.
#[derive(Debug, Clone, Copy)]
pub struct PlayOptions {
    pub volume: f32,
    pub playback_rate: f32,
    /// Delay in seconds before the voice starts.
    pub when: f64,
    pub looping: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            playback_rate: 1.0,
            when: 0.0,
            looping: false,
        }
    }
}

impl PlayOptions {
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_playback_rate(mut self, rate: f32) -> Self {
        self.playback_rate = rate;
        self
    }

    pub fn with_delay(mut self, when: f64) -> Self {
        self.when = when;
        self
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }
}

/// Bookkeeping for one named loop.
///
/// `voice == None` means the loop is paused and `offset_secs` holds the
/// accumulated elapsed playback position to resume from. The offset is
/// wrapped modulo the sample duration at start time, not at store time.
struct LoopState {
    sample: SampleBuffer,
    volume: f32,
    playback_rate: f32,
    voice: Option<VoiceId>,
    offset_secs: f64,
    started_at: f64,
}

pub struct SoundManager {
    graph: Option<Box<dyn AudioGraph>>,
    factory: GraphFactory,
    master: Option<NodeId>,
    unlocked: bool,
    samples: HashMap<String, SampleBuffer>,
    one_shots: HashSet<VoiceId>,
    loops: HashMap<String, LoopState>,
    visibility: VisibilitySignal,
}

impl SoundManager {
    /// Create a manager that builds its graph lazily from `factory` on the
    /// first `unlock`, `load`, or `play`.
    pub fn new(factory: GraphFactory, visibility: VisibilitySignal) -> Self {
        Self {
            graph: None,
            factory,
            master: None,
            unlocked: false,
            samples: HashMap::new(),
            one_shots: HashSet::new(),
            loops: HashMap::new(),
            visibility,
        }
    }

    /// Satisfy the platform's user-gesture requirement. Idempotent and
    /// infallible: a rejected resume is swallowed and `unlock` still takes
    /// effect permanently.
    pub fn unlock(&mut self) {
        if self.unlocked {
            return;
        }
        if self.ensure_graph() {
            if let Some(graph) = self.graph.as_deref_mut() {
                if graph.state() == GraphState::Suspended {
                    if let Err(e) = graph.resume() {
                        tracing::debug!("Resume rejected during unlock: {}", e);
                    }
                }
            }
        }
        self.unlocked = true;
        tracing::debug!("Audio unlocked");
    }

    /// Read and decode a sound file, caching it under `name`.
    pub fn load(&mut self, name: &str, path: &Path) -> Result<(), LoadError> {
        // Graph before decode keeps initialization ordering simple.
        self.ensure_graph();
        let Some(graph) = self.graph.as_deref_mut() else {
            return Err(LoadError::Unavailable);
        };

        let bytes = fs::read(path).map_err(|e| LoadError::Fetch {
            path: path.display().to_string(),
            source: e,
        })?;
        let sample = graph.decode(&bytes).map_err(|e| LoadError::Decode {
            name: name.to_string(),
            source: Box::new(e),
        })?;

        tracing::debug!(
            "Loaded sound '{}' ({} bytes, {:.2}s)",
            name,
            bytes.len(),
            sample.duration_secs()
        );
        self.samples.insert(name.to_string(), sample);
        Ok(())
    }

    /// Load every entry. All entries are attempted; the first failure is
    /// surfaced after the sweep, so one bad file does not block the rest.
    pub fn preload<'a, I>(&mut self, entries: I) -> Result<(), LoadError>
    where
        I: IntoIterator<Item = (&'a str, &'a Path)>,
    {
        let mut first_failure = None;
        for (name, path) in entries {
            if let Err(e) = self.load(name, path) {
                tracing::warn!("Preload failed for '{}': {}", name, e);
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Start a sound by name. Returns the voice handle, or `None` when
    /// playback is suppressed (not unlocked, window hidden, no platform,
    /// sound not loaded). Never fails.
    pub fn play(&mut self, name: &str, options: PlayOptions) -> Option<VoiceId> {
        if !self.unlocked {
            return None;
        }
        if self.visibility.is_hidden() {
            return None;
        }
        if !self.ensure_graph() {
            return None;
        }
        self.reap_finished();

        let graph = self.graph.as_deref_mut()?;
        if graph.state() == GraphState::Suspended {
            // Fire-and-forget; play stays synchronous either way.
            if let Err(e) = graph.resume() {
                tracing::trace!("Resume rejected during play: {}", e);
            }
        }

        let Some(sample) = self.samples.get(name) else {
            tracing::warn!("Sound not loaded: {}", name);
            return None;
        };

        if options.looping {
            if let Some(active) = self.loops.get(name).and_then(|l| l.voice) {
                return Some(active);
            }
            let state = self.loops.entry(name.to_string()).or_insert_with(|| LoopState {
                sample: sample.clone(),
                volume: options.volume,
                playback_rate: options.playback_rate,
                voice: None,
                offset_secs: 0.0,
                started_at: 0.0,
            });
            return Some(Self::start_loop(graph, self.master, state, options.when));
        }

        let voice = graph.create_voice(
            sample,
            VoiceConfig {
                volume: options.volume,
                playback_rate: options.playback_rate,
                looping: false,
            },
            self.master,
        );
        self.one_shots.insert(voice);
        graph.start_voice(voice, options.when, 0.0);
        Some(voice)
    }

    /// Start (or restart) one loop from its stored offset.
    fn start_loop(
        graph: &mut dyn AudioGraph,
        master: Option<NodeId>,
        state: &mut LoopState,
        when: f64,
    ) -> VoiceId {
        let duration = state.sample.duration_secs();
        let offset = if duration > 0.0 {
            state.offset_secs % duration
        } else {
            0.0
        };

        let voice = graph.create_voice(
            &state.sample,
            VoiceConfig {
                volume: state.volume,
                playback_rate: state.playback_rate,
                looping: true,
            },
            master,
        );

        // Backdate the start timestamp by the unwrapped offset so elapsed
        // time stays consistent across repeated pause/resume cycles.
        let rate = f64::from(state.playback_rate).max(1e-6);
        state.started_at = graph.current_time() - state.offset_secs / rate;
        graph.start_voice(voice, when, offset);
        state.voice = Some(voice);
        voice
    }

    /// Silence everything for a hidden window. Glitch-free and infallible;
    /// loop positions are retained for `resume_all`.
    pub fn pause_all(&mut self) {
        let Some(graph) = self.graph.as_deref_mut() else {
            return;
        };

        // Hard-cut the master first, and zero its gain so a later
        // reconnect cannot click before resume_all restores it.
        if let Some(master) = self.master {
            graph.disconnect(master);
            graph.set_gain(master, 0.0);
        }

        for voice in self.one_shots.drain() {
            graph.stop_voice(voice);
        }

        let now = graph.current_time();
        for state in self.loops.values_mut() {
            if let Some(voice) = state.voice.take() {
                graph.stop_voice(voice);
                let elapsed = (now - state.started_at) * f64::from(state.playback_rate);
                state.offset_secs += elapsed;
            }
        }

        if graph.state() == GraphState::Running {
            if let Err(e) = graph.suspend() {
                tracing::trace!("Suspend rejected during pause: {}", e);
            }
        }
        tracing::debug!("Audio paused ({} loops retained)", self.loops.len());
    }

    /// Bring audio back after the window is shown again. Best-effort: a
    /// rejected platform resume is swallowed, and a window that went hidden
    /// again while the resume was in flight cancels the restart.
    pub fn resume_all(&mut self) {
        if self.visibility.is_hidden() {
            return;
        }
        let Some(graph) = self.graph.as_deref_mut() else {
            return;
        };

        if graph.state() == GraphState::Suspended {
            if let Err(e) = graph.resume() {
                tracing::debug!("Resume rejected: {}", e);
            }
            // Visibility may have flipped while the resume was in flight;
            // do not resurrect audio for a hidden window.
            if self.visibility.is_hidden() {
                return;
            }
        }

        if let Some(master) = self.master {
            graph.set_gain(master, 1.0);
            graph.connect_to_output(master);
        }

        for state in self.loops.values_mut() {
            if state.voice.is_none() {
                Self::start_loop(&mut *graph, self.master, state, 0.0);
            }
        }
        tracing::debug!("Audio resumed ({} loops restarted)", self.loops.len());
    }

    /// Hard reset: stop every voice and discard all loop state, offsets
    /// included. Graph state and master routing are left untouched.
    pub fn stop_all(&mut self) {
        let Some(graph) = self.graph.as_deref_mut() else {
            return;
        };
        for voice in self.one_shots.drain() {
            graph.stop_voice(voice);
        }
        for (_, state) in self.loops.drain() {
            if let Some(voice) = state.voice {
                graph.stop_voice(voice);
            }
        }
        tracing::debug!("All audio stopped");
    }

    /// Drop one-shot voices that finished naturally since the last call.
    pub fn reap_finished(&mut self) {
        if let Some(graph) = self.graph.as_deref_mut() {
            for voice in graph.drain_finished() {
                self.one_shots.remove(&voice);
            }
        }
    }

    /// Create the graph and master volume node if they do not exist yet.
    /// Returns false when the platform is unavailable.
    fn ensure_graph(&mut self) -> bool {
        if self.graph.is_none() {
            let Some(mut graph) = (self.factory)() else {
                return false;
            };
            let master = graph.create_volume_node();
            graph.set_gain(master, 1.0);
            graph.connect_to_output(master);
            self.master = Some(master);
            self.graph = Some(graph);
            tracing::debug!("Audio graph created");
        }
        true
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Check if a sound is loaded.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.samples.contains_key(name)
    }

    /// Session state as seen by callers: `Uninitialized` before the graph
    /// exists, the graph's own state afterwards.
    pub fn state(&self) -> GraphState {
        self.graph
            .as_ref()
            .map(|g| g.state())
            .unwrap_or(GraphState::Uninitialized)
    }

    /// Names of loops that currently have a playing voice.
    pub fn active_loop_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loops
            .iter()
            .filter(|(_, l)| l.voice.is_some())
            .map(|(n, _)| n.clone())
            .collect();
        names.sort();
        names
    }

    /// Names of all tracked loops, playing or paused.
    pub fn loop_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loops.keys().cloned().collect();
        names.sort();
        names
    }

    /// Accumulated playback position of a tracked loop, in seconds.
    pub fn loop_offset(&self, name: &str) -> Option<f64> {
        self.loops.get(name).map(|l| l.offset_secs)
    }

    pub fn one_shot_count(&self) -> usize {
        self.one_shots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fake::FakeGraph;

    fn manager_with_fake() -> (SoundManager, FakeGraph, VisibilitySignal) {
        let fake = FakeGraph::new();
        let handle = fake.clone();
        let visibility = VisibilitySignal::new();
        let manager = SoundManager::new(
            Box::new(move || Some(Box::new(handle.clone()) as Box<dyn AudioGraph>)),
            visibility.clone(),
        );
        (manager, fake, visibility)
    }

    fn temp_sound(name: &str, bytes: usize) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("pondlife_test_{}.raw", name));
        std::fs::write(&path, vec![1u8; bytes]).unwrap();
        path
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let (mut manager, fake, _vis) = manager_with_fake();

        manager.unlock();
        manager.unlock();
        manager.unlock();

        assert!(manager.is_unlocked());
        // Only the first call touches the platform.
        assert_eq!(fake.resume_calls(), 1);
    }

    #[test]
    fn test_unlock_survives_rejected_resume() {
        let (mut manager, fake, _vis) = manager_with_fake();
        fake.set_fail_resume(true);

        manager.unlock();

        assert!(manager.is_unlocked());
        assert_eq!(manager.state(), GraphState::Suspended);
    }

    #[test]
    fn test_play_requires_unlock() {
        let (mut manager, fake, _vis) = manager_with_fake();
        let path = temp_sound("requires_unlock", 100);
        manager.load("bee", &path).unwrap();

        assert!(manager.play("bee", PlayOptions::default()).is_none());
        assert_eq!(fake.live_voices(), 0);

        manager.unlock();
        assert!(manager.play("bee", PlayOptions::default()).is_some());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_play_suppressed_while_hidden() {
        let (mut manager, fake, vis) = manager_with_fake();
        let path = temp_sound("hidden", 100);
        manager.load("bee", &path).unwrap();
        manager.unlock();

        vis.set_hidden(true);
        assert!(manager.play("bee", PlayOptions::default()).is_none());
        assert!(manager
            .play("bee", PlayOptions::default().looping())
            .is_none());
        assert_eq!(fake.live_voices(), 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_play_unloaded_sound_is_harmless() {
        let (mut manager, _fake, _vis) = manager_with_fake();
        manager.unlock();
        assert!(manager.play("missing", PlayOptions::default()).is_none());
    }

    #[test]
    fn test_looping_play_returns_existing_voice() {
        let (mut manager, fake, _vis) = manager_with_fake();
        let path = temp_sound("dup_loop", 100);
        manager.load("bee", &path).unwrap();
        manager.unlock();

        let first = manager.play("bee", PlayOptions::default().looping()).unwrap();
        let second = manager.play("bee", PlayOptions::default().looping()).unwrap();

        assert_eq!(first, second);
        assert_eq!(fake.live_voices(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_pause_records_rate_scaled_offset() {
        let (mut manager, fake, _vis) = manager_with_fake();
        // 250 bytes decode to 2.5 seconds in the fake graph.
        let path = temp_sound("offset", 250);
        manager.load("bee", &path).unwrap();
        manager.unlock();

        manager.play(
            "bee",
            PlayOptions::default().looping().with_playback_rate(2.0),
        );
        fake.advance(1.5);
        manager.pause_all();

        // 1.5 s of wall time at 2x rate is 3.0 s of sample time.
        let offset = manager.loop_offset("bee").unwrap();
        assert!((offset - 3.0).abs() < 1e-9);

        // Resume wraps modulo the 2.5 s duration.
        manager.resume_all();
        let voice = manager
            .loops
            .get("bee")
            .and_then(|l| l.voice)
            .expect("loop voice after resume");
        let snapshot = fake.voice(voice).unwrap();
        assert!((snapshot.start_offset - 0.5).abs() < 1e-9);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_pause_silences_master_before_suspending() {
        let (mut manager, fake, _vis) = manager_with_fake();
        let path = temp_sound("master_cut", 100);
        manager.load("bee", &path).unwrap();
        manager.unlock();
        manager.play("bee", PlayOptions::default().looping());

        let master = manager.master.unwrap();
        assert!(fake.node_connected(master));

        manager.pause_all();

        assert!(!fake.node_connected(master));
        assert_eq!(fake.node_gain(master), Some(0.0));
        assert_eq!(fake.suspend_calls(), 1);
        assert_eq!(fake.live_voices(), 0);

        manager.resume_all();
        assert!(fake.node_connected(master));
        assert_eq!(fake.node_gain(master), Some(1.0));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let (mut manager, fake, _vis) = manager_with_fake();
        let path = temp_sound("pause_twice", 100);
        manager.load("bee", &path).unwrap();
        manager.unlock();
        manager.play("bee", PlayOptions::default().looping());

        fake.advance(0.5);
        manager.pause_all();
        let offset = manager.loop_offset("bee").unwrap();

        manager.pause_all();
        // Second pause finds no live voices and accumulates nothing.
        assert_eq!(manager.loop_offset("bee").unwrap(), offset);
    }

    #[test]
    fn test_resume_while_hidden_is_a_no_op() {
        let (mut manager, fake, vis) = manager_with_fake();
        let path = temp_sound("resume_hidden", 100);
        manager.load("bee", &path).unwrap();
        manager.unlock();
        manager.play("bee", PlayOptions::default().looping());

        vis.set_hidden(true);
        manager.pause_all();
        manager.resume_all();

        assert!(manager.active_loop_names().is_empty());
        assert_eq!(fake.live_voices(), 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_stop_all_discards_loop_offsets() {
        let (mut manager, fake, _vis) = manager_with_fake();
        let path = temp_sound("stop_all", 250);
        manager.load("bee", &path).unwrap();
        manager.unlock();

        manager.play("bee", PlayOptions::default().looping());
        fake.advance(1.0);
        manager.pause_all();
        assert!(manager.loop_offset("bee").unwrap() > 0.0);

        manager.resume_all();
        manager.stop_all();
        assert!(manager.loop_names().is_empty());

        // A fresh play starts a brand-new loop at offset zero.
        let voice = manager.play("bee", PlayOptions::default().looping()).unwrap();
        let snapshot = fake.voice(voice).unwrap();
        assert_eq!(snapshot.start_offset, 0.0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_one_shot_self_removes_on_completion() {
        let (mut manager, fake, _vis) = manager_with_fake();
        let path = temp_sound("one_shot", 100);
        manager.load("frog", &path).unwrap();
        manager.unlock();

        let voice = manager.play("frog", PlayOptions::default()).unwrap();
        assert_eq!(manager.one_shot_count(), 1);

        fake.finish_voice(voice);
        manager.reap_finished();
        assert_eq!(manager.one_shot_count(), 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_missing_file_is_fetch_error() {
        let (mut manager, _fake, _vis) = manager_with_fake();
        let err = manager
            .load("ghost", Path::new("/nonexistent/ghost.mp3"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
    }

    #[test]
    fn test_load_undecodable_payload_is_decode_error() {
        let (mut manager, _fake, _vis) = manager_with_fake();
        let path = std::env::temp_dir().join("pondlife_test_empty.raw");
        std::fs::write(&path, []).unwrap();

        let err = manager.load("empty", &path).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
        assert!(!manager.is_loaded("empty"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_preload_attempts_all_and_surfaces_first_failure() {
        let (mut manager, _fake, _vis) = manager_with_fake();
        let good = temp_sound("preload_good", 100);

        let missing = Path::new("/nonexistent/missing.mp3");
        let entries = vec![("missing", missing), ("bee", good.as_path())];
        let err = manager.preload(entries).unwrap_err();

        assert!(matches!(err, LoadError::Fetch { .. }));
        // The sweep still loaded the good entry.
        assert!(manager.is_loaded("bee"));
        let _ = std::fs::remove_file(good);
    }

    #[test]
    fn test_unavailable_platform_degrades_to_silence() {
        let visibility = VisibilitySignal::new();
        let mut manager = SoundManager::new(Box::new(|| None), visibility);

        manager.unlock();
        assert!(manager.is_unlocked());
        assert_eq!(manager.state(), GraphState::Uninitialized);

        let err = manager.load("bee", Path::new("/tmp/whatever.mp3")).unwrap_err();
        assert!(matches!(err, LoadError::Unavailable));

        assert!(manager.play("bee", PlayOptions::default()).is_none());
        manager.pause_all();
        manager.resume_all();
        manager.stop_all();
    }
}

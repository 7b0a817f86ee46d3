use log::info;

use crate::engine::pitch::Pitch;

/// Why a set of pitches is being sounded. Every intent means "play now".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayIntent {
    /// The round's question.
    Target,
    /// A single note the player just placed.
    Preview,
    /// The player's current answer.
    Selection,
}

/// The sampler the engine talks to. Implementations own their own timing;
/// `play` must return without waiting for the sound to finish.
pub trait Playback {
    fn play(&mut self, pitches: &[Pitch], intent: PlayIntent);

    /// Silence anything still sounding. Called when the engine is disposed.
    fn stop(&mut self) {}
}

/// Playback that only records requests in the log. Used when no sampler is
/// attached to the terminal build.
#[derive(Debug, Default)]
pub struct LogPlayback {
    volume: u8,
    requests: u64,
}

impl LogPlayback {
    pub fn new(volume: u8) -> Self {
        Self {
            volume: volume.min(100),
            requests: 0,
        }
    }

    #[allow(dead_code)]
    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl Playback for LogPlayback {
    fn play(&mut self, pitches: &[Pitch], intent: PlayIntent) {
        self.requests += 1;
        let names: Vec<String> = pitches.iter().map(ToString::to_string).collect();
        info!(
            "play {intent:?} [{}] at volume {}",
            names.join(" "),
            self.volume
        );
    }

    fn stop(&mut self) {
        info!("playback stopped after {} requests", self.requests);
    }
}

// src/alerts/speech_gate.rs
//
// Single-slot debounce for spoken alerts: at most one utterance plays at a
// time. Alerts arriving while the gate is busy are dropped, not queued —
// stale speech about a sign already passed is worse than no speech.

use tracing::debug;

pub struct SpeechGate {
    enabled: bool,
    speaking: bool,
    dropped: u64,
}

impl SpeechGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            speaking: false,
            dropped: 0,
        }
    }

    /// Ask to speak `text`. Returns the utterance to play if the gate grants
    /// it; None when the text is empty, alerts are disabled, or an utterance
    /// is already playing.
    ///
    /// The check and the transition to speaking are one step under a single
    /// owner, so two grants can never overlap.
    pub fn request(&mut self, text: &str) -> Option<String> {
        if text.is_empty() || !self.enabled {
            return None;
        }
        if self.speaking {
            self.dropped += 1;
            debug!("Speech busy, dropping utterance: {}", text);
            return None;
        }
        self.speaking = true;
        Some(text.to_string())
    }

    /// Release the gate. Must be called when playback completes OR fails;
    /// otherwise the gate stays speaking forever.
    pub fn playback_finished(&mut self) {
        self.speaking = false;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Utterances dropped because the gate was busy. Reporting only.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

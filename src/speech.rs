// src/speech.rs
//
// Speech playback behind the gate. The engine trait resolves when playback
// finishes so the caller can release the speech gate; failures must resolve
// too, or the gate would stay busy forever.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Play `text` to completion. Returns once playback has finished.
    async fn speak(&self, text: &str) -> Result<()>;

    fn name(&self) -> &str;
}

/// Strip control characters before handing text to a subprocess.
fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

/// espeak-ng subprocess engine. Voice, pitch and rate come from config and
/// are passed through verbatim; they play no part in gating.
pub struct EspeakEngine {
    voice: String,
    pitch: u8,
    rate: u16,
}

impl EspeakEngine {
    pub fn new(voice: String, pitch: u8, rate: u16) -> Self {
        Self { voice, pitch, rate }
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        let text = sanitize(text);
        debug!("Speaking via espeak-ng: {}", text);

        let status = tokio::process::Command::new("espeak-ng")
            .arg("-v")
            .arg(&self.voice)
            .arg("-p")
            .arg(self.pitch.to_string())
            .arg("-s")
            .arg(self.rate.to_string())
            .arg(&text)
            .status()
            .await
            .context("Failed to launch espeak-ng")?;

        if !status.success() {
            anyhow::bail!("espeak-ng exited with {}", status);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "espeak-ng"
    }
}

/// No-audio engine: logs the utterance and completes immediately. Used when
/// no speech backend is available and in tests.
pub struct NullSpeech;

#[async_trait]
impl SpeechEngine for NullSpeech {
    async fn speak(&self, text: &str) -> Result<()> {
        info!("🔊 (muted) {}", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

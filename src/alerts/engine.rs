// src/alerts/engine.rs
//
// Ties catalog, registry and speech gate together: one detection batch in,
// a list of UI commands out. The engine is constructed once at startup and
// owned by the event loop; every public method is a single reaction.

use crate::alerts::registry::{AlertRegistry, SubmitOutcome};
use crate::alerts::speech_gate::SpeechGate;
use crate::alerts::ui_bus::{UiCommand, UiCommandBus};
use crate::catalog::SignCatalog;
use crate::types::Detection;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct AlertEngine {
    catalog: SignCatalog,
    registry: AlertRegistry,
    gate: SpeechGate,
    bus: UiCommandBus,
}

impl AlertEngine {
    pub fn new(
        catalog: SignCatalog,
        registry: AlertRegistry,
        gate: SpeechGate,
        bus: UiCommandBus,
    ) -> Self {
        Self {
            catalog,
            registry,
            gate,
            bus,
        }
    }

    /// Process one detection batch. Duplicate labels within the batch
    /// collapse to a single submit; per-item failures never abort the rest
    /// of the batch.
    pub fn process_batch(&mut self, detections: &[Detection], now: Instant) -> Vec<UiCommand> {
        let mut submitted: HashSet<&str> = HashSet::new();

        for det in detections {
            if !Self::is_well_formed(det) {
                warn!("Skipping malformed detection: {:?}", det);
                continue;
            }

            let sign = match self.catalog.lookup(&det.name) {
                Some(sign) => sign,
                None => {
                    debug!("Not an alertable sign class: {}", det.name);
                    continue;
                }
            };

            if !submitted.insert(sign.label) {
                continue;
            }

            match self.registry.submit(sign, now) {
                SubmitOutcome::New => {
                    info!("🪧 New sign alert: {}", sign.label);
                    self.bus.publish(UiCommand::ShowSign {
                        label: sign.label.to_string(),
                        image: sign.image,
                    });
                    if let Some(text) = self.gate.request(sign.message) {
                        self.bus.publish(UiCommand::Speak { text });
                    }
                }
                SubmitOutcome::Refreshed => {
                    // Still on screen; deadline already extended, no speech.
                }
            }
        }

        self.bus.drain()
    }

    /// Expiry pass. Emits a RemoveSign for every alert whose hold time
    /// elapsed without a refresh.
    pub fn tick(&mut self, now: Instant) -> Vec<UiCommand> {
        for alert in self.registry.purge_expired(now) {
            let shown = now.saturating_duration_since(alert.created_at);
            info!("🪧 Sign alert expired: {} (shown {:.1}s)", alert.sign.label, shown.as_secs_f64());
            self.bus.publish(UiCommand::RemoveSign {
                label: alert.sign.label.to_string(),
            });
        }
        self.bus.drain()
    }

    /// Playback completion (or failure) from the speech engine.
    pub fn speech_finished(&mut self) {
        self.gate.playback_finished();
    }

    pub fn set_speech_enabled(&mut self, enabled: bool) {
        info!("🔊 Speech alerts {}", if enabled { "enabled" } else { "disabled" });
        self.gate.set_enabled(enabled);
    }

    pub fn active_alert_count(&self) -> usize {
        self.registry.active_count()
    }

    pub fn dropped_utterances(&self) -> u64 {
        self.gate.dropped_count()
    }

    fn is_well_formed(det: &Detection) -> bool {
        !det.name.is_empty()
            && det.confidence.is_finite()
            && det.xmin.is_finite()
            && det.ymin.is_finite()
            && det.xmax.is_finite()
            && det.ymax.is_finite()
    }
}

// src/main.rs

mod alerts;
mod catalog;
mod config;
mod frame_source;
mod geo;
mod overlay;
mod remote_detection;
mod speech;
mod types;

use alerts::{AlertEngine, AlertRegistry, SpeechGate, UiCommand, UiCommandBus};
use anyhow::Result;
use catalog::SignCatalog;
use frame_source::DirectoryFrameSource;
use remote_detection::DetectionClient;
use speech::{EspeakEngine, NullSpeech, SpeechEngine};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use types::Config;

/// How often the expiry pass runs. Alert deadlines are 10s-scale, so a
/// sub-second sweep keeps teardown visually prompt.
const PURGE_INTERVAL_MS: u64 = 250;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("roadsign_assist={}", config.logging.level))
        .init();

    info!("🚗 Road Sign Assist Dashboard Starting");

    let catalog = SignCatalog::new();
    info!("✓ Sign catalog: {} classes", catalog.len());

    let mut engine = AlertEngine::new(
        catalog,
        AlertRegistry::new(Duration::from_millis(config.alerts.hold_ms)),
        SpeechGate::new(config.speech.enabled),
        UiCommandBus::new(config.alerts.max_pending_commands),
    );
    info!("✓ Alert engine ready ({}ms hold)", config.alerts.hold_ms);

    let client = DetectionClient::new(config.server.url.clone(), config.server.timeout_secs)?;
    info!("📡 Detection server: {}", config.server.url);

    let mut frames = DirectoryFrameSource::open(&config.frames.input_dir)?;

    let speech_engine: Arc<dyn SpeechEngine> = if config.speech.enabled {
        Arc::new(EspeakEngine::new(
            config.speech.voice.clone(),
            config.speech.pitch,
            config.speech.rate,
        ))
    } else {
        Arc::new(NullSpeech)
    };
    info!("🔊 Speech engine: {} (voice {})", speech_engine.name(), config.speech.voice);

    // Speech playback runs off-loop; completion comes back over this channel
    // so releasing the gate is a normal reaction like everything else.
    let (speech_done_tx, mut speech_done_rx) = mpsc::channel::<()>(4);

    if config.geo.enabled {
        spawn_geo_monitor(&config);
    }

    let mut speech_enabled = config.speech.enabled;
    let mut toggle_signal =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1())?;

    let mut stats = DashboardStats::default();
    let mut frame_tick = tokio::time::interval(Duration::from_millis(config.frames.interval_ms));
    let mut purge_tick = tokio::time::interval(Duration::from_millis(PURGE_INTERVAL_MS));

    loop {
        tokio::select! {
            _ = frame_tick.tick() => {
                let jpeg = match frames.next_frame()? {
                    Some(jpeg) => jpeg,
                    None => {
                        info!("Frame source exhausted");
                        break;
                    }
                };
                stats.frames_sent += 1;

                match client.detect(&jpeg).await {
                    Ok(detections) => {
                        stats.batches_received += 1;
                        for shape in overlay::layout_batch(&detections) {
                            debug!(
                                "Overlay box {:.0}x{:.0} at ({:.0},{:.0}), label '{}' at ({:.0},{:.0})",
                                shape.width, shape.height, shape.x, shape.y,
                                shape.label, shape.label_x, shape.label_y,
                            );
                        }

                        let commands = engine.process_batch(&detections, Instant::now());
                        dispatch(commands, &speech_engine, &speech_done_tx, &mut stats);
                    }
                    Err(e) => {
                        stats.batches_failed += 1;
                        warn!("Detection failed for frame {}: {}", stats.frames_sent, e);
                    }
                }
            }

            _ = purge_tick.tick() => {
                let commands = engine.tick(Instant::now());
                dispatch(commands, &speech_engine, &speech_done_tx, &mut stats);
            }

            Some(_) = speech_done_rx.recv() => {
                engine.speech_finished();
            }

            _ = toggle_signal.recv() => {
                speech_enabled = !speech_enabled;
                engine.set_speech_enabled(speech_enabled);
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    stats.dropped_utterances = engine.dropped_utterances();
    stats.report(engine.active_alert_count());
    Ok(())
}

/// Hand a batch of engine commands to the UI and speech boundaries. Speech
/// playback is spawned so the event loop never blocks on an utterance.
fn dispatch(
    commands: Vec<UiCommand>,
    speech_engine: &Arc<dyn SpeechEngine>,
    speech_done_tx: &mpsc::Sender<()>,
    stats: &mut DashboardStats,
) {
    for command in commands {
        match command {
            UiCommand::ShowSign { label, image } => {
                stats.alerts_raised += 1;
                info!("🪧 Alert bar: show {} ({})", label, image);
            }
            UiCommand::RemoveSign { label } => {
                stats.alerts_expired += 1;
                info!("🪧 Alert bar: remove {}", label);
            }
            UiCommand::Speak { text } => {
                stats.utterances_spoken += 1;
                let engine = Arc::clone(speech_engine);
                let done = speech_done_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = engine.speak(&text).await {
                        error!("Speech playback failed: {}", e);
                    }
                    // Release the gate on success and failure alike.
                    let _ = done.send(()).await;
                });
            }
        }
    }
}

fn spawn_geo_monitor(config: &Config) {
    let gpsd_addr = config.geo.gpsd_addr.clone();
    let nominatim_url = config.geo.nominatim_url.clone();

    tokio::spawn(async move {
        let geocoder = match geo::ReverseGeocoder::new(nominatim_url) {
            Ok(g) => g,
            Err(e) => {
                error!("Geocoder init failed: {}", e);
                return;
            }
        };

        let (fix_tx, mut fix_rx) = mpsc::channel(16);
        let watcher = tokio::spawn(async move {
            if let Err(e) = geo::watch_gpsd(&gpsd_addr, fix_tx).await {
                warn!("gpsd watch ended: {}", e);
            }
        });

        let mut estimator = geo::SpeedEstimator::new();
        while let Some(fix) = fix_rx.recv().await {
            let speed_kmh = estimator.update(fix);
            let street = match geocoder.street_name(fix.latitude, fix.longitude).await {
                Ok(street) => street,
                Err(e) => {
                    debug!("Reverse geocoding failed: {}", e);
                    None
                }
            };
            info!("📍 {}", geo::status_line(&fix, speed_kmh, street.as_deref()));
        }

        watcher.abort();
    });
}

#[derive(Debug, Default)]
struct DashboardStats {
    frames_sent: u64,
    batches_received: u64,
    batches_failed: u64,
    alerts_raised: u64,
    alerts_expired: u64,
    utterances_spoken: u64,
    dropped_utterances: u64,
}

impl DashboardStats {
    fn report(&self, still_active: usize) {
        info!("\n📊 Session Report:");
        info!("  Frames sent: {}", self.frames_sent);
        info!("  Detection batches: {} ok, {} failed", self.batches_received, self.batches_failed);
        info!("  🪧 Alerts raised: {}", self.alerts_raised);
        info!("  🪧 Alerts expired: {}", self.alerts_expired);
        info!("  🔊 Utterances spoken: {}", self.utterances_spoken);
        if self.dropped_utterances > 0 {
            info!("  🔇 Utterances dropped (gate busy): {}", self.dropped_utterances);
        }
        if still_active > 0 {
            info!("  Alerts still on screen: {}", still_active);
        }
    }
}

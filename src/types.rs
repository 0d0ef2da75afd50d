use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub frames: FrameConfig,
    pub alerts: AlertConfig,
    pub speech: SpeechConfig,
    pub geo: GeoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    pub input_dir: String,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub hold_ms: u64,
    pub max_pending_commands: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Voice identifier handed to the speech engine verbatim (e.g. "zh-yue").
    pub voice: String,
    pub pitch: u8,
    pub rate: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    pub enabled: bool,
    pub gpsd_addr: String,
    pub nominatim_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// One recognized object in a single frame, as reported by the detection
/// service. This shape is the wire contract and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub confidence: f32,
    /// Estimated distance in metres, when the server provides one.
    pub distance: Option<f32>,
}

/// A single position fix from the geolocation source.
#[derive(Debug, Clone, Copy)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Device-reported ground speed in m/s, if available.
    pub speed: Option<f64>,
    pub timestamp_ms: f64,
}

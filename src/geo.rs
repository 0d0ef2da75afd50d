// src/geo.rs
//
// Speed and street display. Speed comes from the device fix when present,
// otherwise from consecutive fixes via the Haversine formula. Street names
// come from a Nominatim-compatible reverse geocoder. Fixes arrive from a
// gpsd JSON stream (TPV records) over TCP.

use crate::types::GeoFix;
use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Turns a stream of position fixes into a km/h readout.
pub struct SpeedEstimator {
    previous: Option<GeoFix>,
}

impl SpeedEstimator {
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// Speed in km/h for this fix. Device speed wins; otherwise distance
    /// over time since the previous fix; 0 for the very first fix.
    pub fn update(&mut self, fix: GeoFix) -> f64 {
        let speed_kmh = match fix.speed {
            Some(mps) if mps.is_finite() => mps * 3.6,
            _ => match self.previous {
                Some(prev) if fix.timestamp_ms > prev.timestamp_ms => {
                    let hours = (fix.timestamp_ms - prev.timestamp_ms) / 3_600_000.0;
                    let km = haversine_km(
                        prev.latitude,
                        prev.longitude,
                        fix.latitude,
                        fix.longitude,
                    );
                    km / hours
                }
                _ => 0.0,
            },
        };
        self.previous = Some(fix);
        speed_kmh
    }
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Dashboard status line for one fix, in the original display format.
pub fn status_line(fix: &GeoFix, speed_kmh: f64, street: Option<&str>) -> String {
    format!(
        "緯度: {:.4}, 經度: {:.4} | 街道: {} | 速度: {:.2} km/h",
        fix.latitude,
        fix.longitude,
        street.unwrap_or("未知街道"),
        speed_kmh,
    )
}

pub struct ReverseGeocoder {
    http_client: reqwest::Client,
    base_url: String,
}

impl ReverseGeocoder {
    pub fn new(base_url: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build geocoder HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Street name for a position, or None when the geocoder has nothing
    /// usable. Network failures surface as errors; the caller shows the
    /// unknown-street fallback either way.
    pub async fn street_name(&self, latitude: f64, longitude: f64) -> Result<Option<String>> {
        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}",
            self.base_url.trim_end_matches('/'),
            latitude,
            longitude,
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Reverse geocoding request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Reverse geocoder returned {}", response.status());
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse geocoder response")?;
        Ok(street_from_address(&body))
    }
}

/// Pick the most specific street-like field from a Nominatim jsonv2 reply.
fn street_from_address(body: &Value) -> Option<String> {
    let address = body.get("address")?;
    for key in ["road", "pedestrian", "cycleway", "street"] {
        if let Some(name) = address.get(key).and_then(Value::as_str) {
            return Some(name.to_string());
        }
    }
    None
}

/// Connect to gpsd, enable JSON watch mode, and forward TPV fixes until the
/// stream closes or the receiver is dropped.
pub async fn watch_gpsd(addr: &str, tx: mpsc::Sender<GeoFix>) -> Result<()> {
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("Failed to connect to gpsd at {}", addr))?;
    let (read_half, mut write_half) = stream.into_split();

    write_half
        .write_all(b"?WATCH={\"enable\":true,\"json\":true}\n")
        .await
        .context("Failed to enable gpsd watch mode")?;

    let mut lines = BufReader::new(read_half).lines();
    while let Some(line) = lines.next_line().await? {
        let value: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                debug!("Unparseable gpsd line: {}", e);
                continue;
            }
        };

        if let Some(fix) = parse_tpv(&value) {
            if tx.send(fix).await.is_err() {
                break;
            }
        }
    }

    warn!("gpsd stream closed");
    Ok(())
}

/// Extract a fix from a gpsd TPV record; None for other record classes or
/// records without a 2D position.
fn parse_tpv(value: &Value) -> Option<GeoFix> {
    if value.get("class").and_then(Value::as_str) != Some("TPV") {
        return None;
    }
    let latitude = value.get("lat").and_then(Value::as_f64)?;
    let longitude = value.get("lon").and_then(Value::as_f64)?;
    let speed = value.get("speed").and_then(Value::as_f64);

    let timestamp_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0);

    Some(GeoFix {
        latitude,
        longitude,
        speed,
        timestamp_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fix(lat: f64, lon: f64, speed: Option<f64>, ts: f64) -> GeoFix {
        GeoFix {
            latitude: lat,
            longitude: lon,
            speed,
            timestamp_ms: ts,
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // Hong Kong Central to Tsim Sha Tsui is roughly 2.5 km.
        let km = haversine_km(22.2819, 114.1582, 22.2976, 114.1722);
        assert!((2.0..3.0).contains(&km), "got {} km", km);
        assert!(haversine_km(22.3, 114.2, 22.3, 114.2) < 1e-9);
    }

    #[test]
    fn test_device_speed_preferred() {
        let mut est = SpeedEstimator::new();
        // 10 m/s -> 36 km/h regardless of position history.
        let kmh = est.update(fix(22.3, 114.2, Some(10.0), 0.0));
        assert!((kmh - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_speed_from_consecutive_fixes() {
        let mut est = SpeedEstimator::new();
        assert_eq!(est.update(fix(22.2819, 114.1582, None, 0.0)), 0.0);

        // ~2.5 km in 3 minutes is on the order of 50 km/h.
        let kmh = est.update(fix(22.2976, 114.1722, None, 180_000.0));
        assert!((30.0..70.0).contains(&kmh), "got {} km/h", kmh);
    }

    #[test]
    fn test_first_fix_reports_zero() {
        let mut est = SpeedEstimator::new();
        assert_eq!(est.update(fix(22.3, 114.2, None, 1_000.0)), 0.0);
    }

    #[test]
    fn test_street_fallback_chain() {
        let road = json!({ "address": { "road": "彌敦道", "street": "x" } });
        assert_eq!(street_from_address(&road).as_deref(), Some("彌敦道"));

        let pedestrian = json!({ "address": { "pedestrian": "行人路" } });
        assert_eq!(street_from_address(&pedestrian).as_deref(), Some("行人路"));

        let empty = json!({ "address": { "city": "香港" } });
        assert!(street_from_address(&empty).is_none());
        assert!(street_from_address(&json!({})).is_none());
    }

    #[test]
    fn test_status_line_format() {
        let f = fix(22.2819, 114.1582, None, 0.0);
        assert_eq!(
            status_line(&f, 48.25, Some("彌敦道")),
            "緯度: 22.2819, 經度: 114.1582 | 街道: 彌敦道 | 速度: 48.25 km/h"
        );
        assert!(status_line(&f, 0.0, None).contains("未知街道"));
    }

    #[test]
    fn test_parse_tpv_records() {
        let tpv = json!({ "class": "TPV", "lat": 22.3, "lon": 114.2, "speed": 13.9 });
        let fix = parse_tpv(&tpv).unwrap();
        assert_eq!(fix.latitude, 22.3);
        assert_eq!(fix.speed, Some(13.9));

        assert!(parse_tpv(&json!({ "class": "SKY" })).is_none());
        assert!(parse_tpv(&json!({ "class": "TPV", "lat": 22.3 })).is_none());
    }
}

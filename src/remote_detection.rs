// src/remote_detection.rs
//
// Async HTTP client for the external traffic-sign detection service.
// Sends one base64-encoded JPEG per request and parses the detection batch
// from the response. Malformed rows in the batch are skipped, not fatal.

use crate::types::Detection;
use anyhow::{Context, Result};
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct FramePayload {
    /// Correlation id echoed in server logs.
    frame_id: String,
    /// Base64-encoded JPEG bytes.
    image: String,
}

pub struct DetectionClient {
    http_client: reqwest::Client,
    server_url: String,
}

impl DetectionClient {
    pub fn new(server_url: String, timeout_secs: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            server_url,
        })
    }

    /// Submit one frame and return the detections the server found in it.
    pub async fn detect(&self, jpeg: &[u8]) -> Result<Vec<Detection>> {
        let url = format!("{}/detect", self.server_url.trim_end_matches('/'));
        let payload = FramePayload {
            frame_id: uuid::Uuid::new_v4().to_string(),
            image: base64::engine::general_purpose::STANDARD.encode(jpeg),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Detection request failed")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Detection server returned {}: {}",
                response.status(),
                response.text().await.unwrap_or_else(|_| "<no body>".to_string()),
            );
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse detection response")?;

        let detections = parse_detections(&body);
        debug!("Server returned {} detection(s)", detections.len());
        Ok(detections)
    }
}

/// Lenient batch parsing: each row is decoded independently so one malformed
/// entry cannot take down the rest of the batch.
fn parse_detections(body: &Value) -> Vec<Detection> {
    let rows = match body.get("detections").and_then(Value::as_array) {
        Some(rows) => rows,
        None => {
            warn!("Detection response missing 'detections' array");
            return Vec::new();
        }
    };

    rows.iter()
        .filter_map(|row| match serde_json::from_value(row.clone()) {
            Ok(det) => Some(det),
            Err(e) => {
                warn!("Skipping malformed detection row: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_batch() {
        let body = json!({
            "detections": [
                { "name": "speed50km", "xmin": 10.0, "ymin": 20.0,
                  "xmax": 110.0, "ymax": 120.0, "confidence": 0.92 },
                { "name": "roadworks", "xmin": 300.0, "ymin": 40.0,
                  "xmax": 380.0, "ymax": 130.0, "confidence": 0.81,
                  "distance": 14.2 },
            ]
        });

        let detections = parse_detections(&body);
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].name, "speed50km");
        assert_eq!(detections[0].distance, None);
        assert_eq!(detections[1].distance, Some(14.2));
    }

    #[test]
    fn test_malformed_row_is_skipped_not_fatal() {
        let body = json!({
            "detections": [
                { "name": "speed50km", "xmin": "oops" },
                { "name": "dangerous", "xmin": 10.0, "ymin": 20.0,
                  "xmax": 110.0, "ymax": 120.0, "confidence": 0.7 },
            ]
        });

        let detections = parse_detections(&body);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].name, "dangerous");
    }

    #[test]
    fn test_missing_detections_key_yields_empty_batch() {
        assert!(parse_detections(&json!({})).is_empty());
        assert!(parse_detections(&json!({ "detections": "nope" })).is_empty());
    }
}

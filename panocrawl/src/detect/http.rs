//! Detection over an HTTP inference endpoint.
//!
//! The image is JPEG-encoded and POSTed as `image/jpeg`. The service answers
//! with either a ready detection list:
//!
//! ```json
//! {"detections": [{"x_normalized": 0.4, "y_normalized": 0.5, "confidence": 0.8}]}
//! ```
//!
//! or a raw single-channel heatmap, from which peaks are extracted locally:
//!
//! ```json
//! {"heatmap": [[0.0, 0.1, ...], ...]}
//! ```

use super::peaks::{find_peaks, peaks_to_detections, Heatmap};
use super::{Detection, DetectionError, Detector};
use crate::provider::AsyncHttpClient;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, trace};

/// JPEG quality used for uploads.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Minimum pixel spacing between heatmap peaks.
pub const DEFAULT_MIN_DISTANCE: usize = 10;

/// Heatmap values must exceed this to count as a detection.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Detections { detections: Vec<RawDetection> },
    Heatmap { heatmap: Vec<Vec<f32>> },
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    x_normalized: f64,
    y_normalized: f64,
    confidence: f64,
}

/// Detector backed by an HTTP inference service.
pub struct HttpDetector<C: AsyncHttpClient> {
    client: C,
    endpoint: String,
    min_distance: usize,
    threshold: f32,
    jpeg_quality: u8,
}

impl<C: AsyncHttpClient> HttpDetector<C> {
    pub fn new(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            min_distance: DEFAULT_MIN_DISTANCE,
            threshold: DEFAULT_THRESHOLD,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_min_distance(mut self, min_distance: usize) -> Self {
        self.min_distance = min_distance;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the upload quality (clamped to 1-100).
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn interpret(&self, response: InferenceResponse) -> Result<Vec<Detection>, DetectionError> {
        match response {
            InferenceResponse::Detections { detections } => {
                let total = detections.len();
                let valid: Vec<Detection> = detections
                    .into_iter()
                    .filter_map(|d| Detection::clamped(d.x_normalized, d.y_normalized, d.confidence))
                    .collect();
                if valid.len() < total {
                    debug!(
                        dropped = total - valid.len(),
                        "Dropped non-finite detections from response"
                    );
                }
                Ok(valid)
            }
            InferenceResponse::Heatmap { heatmap } => {
                let heatmap = Heatmap::from_rows(heatmap).ok_or_else(|| {
                    DetectionError::InvalidResponse("heatmap rows differ in length".into())
                })?;
                let (min_distance, threshold) = (self.min_distance, self.threshold);

                tokio::task::spawn_blocking(move || {
                    let peaks = find_peaks(&heatmap, min_distance, threshold);
                    peaks_to_detections(&heatmap, &peaks)
                })
                .await
                .map_err(|e| DetectionError::InvalidResponse(format!("peak search failed: {}", e)))
            }
        }
    }
}

/// Encodes an RGB image as JPEG.
pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, DetectionError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image)
        .map_err(|e| DetectionError::Encode(e.to_string()))?;
    Ok(bytes)
}

impl<C: AsyncHttpClient> Detector for HttpDetector<C> {
    async fn detect(&self, image: Arc<RgbImage>) -> Result<Vec<Detection>, DetectionError> {
        let quality = self.jpeg_quality;
        let body = tokio::task::spawn_blocking(move || encode_jpeg(&image, quality))
            .await
            .map_err(|e| DetectionError::Encode(e.to_string()))??;

        trace!(endpoint = %self.endpoint, bytes = body.len(), "Posting image for detection");
        let response = self.client.post(&self.endpoint, "image/jpeg", body).await?;

        let parsed: InferenceResponse = serde_json::from_slice(&response)
            .map_err(|e| DetectionError::InvalidResponse(e.to_string()))?;
        let detections = self.interpret(parsed).await?;

        debug!(detections = detections.len(), "Detection complete");
        Ok(detections)
    }
}

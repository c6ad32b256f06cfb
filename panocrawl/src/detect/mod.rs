//! Visual detection on assembled panoramas.
//!
//! The crawler only depends on the [`Detector`] trait: a canonical image goes
//! in, zero or more normalized detections come out. [`HttpDetector`] talks to
//! an inference service over HTTP; [`peaks`] turns a raw heatmap into
//! detections when the service returns one.

mod http;
pub mod peaks;

pub use http::{HttpDetector, DEFAULT_JPEG_QUALITY, DEFAULT_MIN_DISTANCE, DEFAULT_THRESHOLD};
pub use peaks::{find_peaks, peaks_to_detections, Heatmap, Peak};

use crate::provider::ProviderError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// One detected object, in image-relative coordinates.
///
/// `x_normalized` and `y_normalized` are fractions of the image width and
/// height; all three fields lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x_normalized: f64,
    pub y_normalized: f64,
    pub confidence: f64,
}

impl Detection {
    /// Builds a detection, clamping each field into `[0, 1]`.
    ///
    /// Returns `None` if any field is not finite.
    pub fn clamped(x_normalized: f64, y_normalized: f64, confidence: f64) -> Option<Self> {
        let all_finite = [x_normalized, y_normalized, confidence]
            .iter()
            .all(|v| v.is_finite());
        all_finite.then(|| Self {
            x_normalized: x_normalized.clamp(0.0, 1.0),
            y_normalized: y_normalized.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

/// Detection failures. Always per-item; the crawl retries on the next run.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Detection request failed: {0}")]
    Request(#[from] ProviderError),

    #[error("Invalid detection response: {0}")]
    InvalidResponse(String),
}

/// Runs visual detection on a canonical panorama image.
///
/// One instance is built at startup and shared by every processing task.
pub trait Detector: Send + Sync {
    fn detect(
        &self,
        image: Arc<RgbImage>,
    ) -> impl Future<Output = Result<Vec<Detection>, DetectionError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_detection() {
        let detection = Detection::clamped(1.2, -0.1, 0.5).unwrap();
        assert_eq!(
            detection,
            Detection {
                x_normalized: 1.0,
                y_normalized: 0.0,
                confidence: 0.5
            }
        );
    }

    #[test]
    fn test_clamped_rejects_nan() {
        assert!(Detection::clamped(f64::NAN, 0.5, 0.5).is_none());
        assert!(Detection::clamped(0.5, 0.5, f64::INFINITY).is_none());
    }

    #[test]
    fn test_detection_json_field_names() {
        let json = serde_json::to_value(Detection {
            x_normalized: 0.25,
            y_normalized: 0.5,
            confidence: 0.9,
        })
        .unwrap();
        assert_eq!(json["x_normalized"], 0.25);
        assert_eq!(json["y_normalized"], 0.5);
        assert_eq!(json["confidence"], 0.9);
    }
}

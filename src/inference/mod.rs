//! Client for the external media generation service.
//!
//! Three generation kinds share one call shape: a text prompt plus fixed
//! per-kind model parameters go out, a hosted media URL comes back. The
//! handler suspends until the service responds; there is no timeout, retry
//! or queueing layer.

pub mod http;
pub mod mock;

pub use http::HttpInferenceClient;
pub use mock::{MockInferenceClient, MockResponseMode};

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference request failed: {0}")]
    Request(String),
    #[error("Inference service returned status {0}: {1}")]
    Status(u16, String),
    #[error("Inference service returned an empty result")]
    EmptyResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// JSON field carrying the result URL in the API response.
    pub fn url_field(&self) -> &'static str {
        match self {
            MediaKind::Image => "imageUrl",
            MediaKind::Video => "videoUrl",
            MediaKind::Audio => "audioUrl",
        }
    }

    /// Generation endpoint on the inference service.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            MediaKind::Image => "/v1/generate/image",
            MediaKind::Video => "/v1/generate/video",
            MediaKind::Audio => "/v1/generate/audio",
        }
    }

    /// Fixed model parameters for this kind. Not user-configurable.
    pub fn params(&self) -> GenerationParams {
        match self {
            MediaKind::Image => GenerationParams::IMAGE,
            MediaKind::Video => GenerationParams::VIDEO,
            MediaKind::Audio => GenerationParams::AUDIO,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model parameters sent alongside the prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
}

impl GenerationParams {
    pub const IMAGE: Self = Self {
        width: Some(1024),
        height: Some(1024),
        num_frames: None,
        duration_seconds: None,
        num_inference_steps: 30,
        guidance_scale: 7.5,
    };

    pub const VIDEO: Self = Self {
        width: Some(768),
        height: Some(432),
        num_frames: Some(48),
        duration_seconds: None,
        num_inference_steps: 25,
        guidance_scale: 6.0,
    };

    pub const AUDIO: Self = Self {
        width: None,
        height: None,
        num_frames: None,
        duration_seconds: Some(10),
        num_inference_steps: 100,
        guidance_scale: 3.0,
    };
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: MediaKind,
    pub prompt: String,
    pub params: GenerationParams,
}

impl GenerationRequest {
    pub fn new(kind: MediaKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            params: kind.params(),
        }
    }
}

/// Inference client trait for dependency injection and testing
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Generate one media artifact, returning its hosted URL.
    async fn generate(&self, request: GenerationRequest) -> Result<String, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_url_fields() {
        assert_eq!(MediaKind::Image.url_field(), "imageUrl");
        assert_eq!(MediaKind::Video.url_field(), "videoUrl");
        assert_eq!(MediaKind::Audio.url_field(), "audioUrl");
    }

    #[test]
    fn test_media_kind_display() {
        assert_eq!(MediaKind::Image.to_string(), "image");
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Audio.to_string(), "audio");
    }

    #[test]
    fn test_request_picks_kind_params() {
        let request = GenerationRequest::new(MediaKind::Video, "a rocket launch");
        assert_eq!(request.params, GenerationParams::VIDEO);
        assert_eq!(request.params.num_frames, Some(48));

        let request = GenerationRequest::new(MediaKind::Audio, "rainfall");
        assert_eq!(request.params.width, None);
        assert_eq!(request.params.duration_seconds, Some(10));
    }

    #[test]
    fn test_params_serialization_omits_unset_fields() {
        let json = serde_json::to_value(GenerationParams::AUDIO).unwrap();
        assert!(json.get("width").is_none());
        assert!(json.get("num_frames").is_none());
        assert_eq!(json["duration_seconds"], 10);
        assert_eq!(json["num_inference_steps"], 100);
    }
}

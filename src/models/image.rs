use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

impl Quality {
    /// Lenient tag lookup: only `"high"` selects the high profile.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("high") => Quality::High,
            _ => Quality::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::High => "high",
        }
    }

    pub fn profile(&self) -> &'static QualityProfile {
        match self {
            Quality::Standard => &QualityProfile::STANDARD,
            Quality::High => &QualityProfile::HIGH,
        }
    }
}

/// Generation parameters sent to the provider for a quality tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityProfile {
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
    pub negative_prompt: &'static str,
}

impl QualityProfile {
    pub const STANDARD: QualityProfile = QualityProfile {
        num_inference_steps: 25,
        guidance_scale: 7.0,
        width: 768,
        height: 768,
        negative_prompt: "blurry, bad quality, distorted",
    };

    pub const HIGH: QualityProfile = QualityProfile {
        num_inference_steps: 40,
        guidance_scale: 7.5,
        width: 1024,
        height: 1024,
        negative_prompt: "blurry, bad quality, distorted, disfigured, poor details",
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub quality: Quality,
}

impl ImageGenerationRequest {
    /// Validates a raw `POST /generate` body.
    ///
    /// Anything that is not a non-empty JSON object counts as "no data"; a
    /// missing, non-string or blank `prompt` counts as "no prompt".
    pub fn from_json_body(body: &[u8]) -> Result<Self, RequestError> {
        let data: Value = serde_json::from_slice(body).map_err(|_| RequestError::NoData)?;
        let fields = match data.as_object() {
            Some(fields) if !fields.is_empty() => fields,
            _ => return Err(RequestError::NoData),
        };

        let prompt = fields
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|prompt| !prompt.trim().is_empty())
            .ok_or(RequestError::NoPrompt)?;

        Ok(Self {
            prompt: prompt.to_string(),
            quality: Quality::from_tag(fields.get("quality").and_then(Value::as_str)),
        })
    }
}

/// Body of the provider call: `{inputs, parameters}`.
#[derive(Debug, Clone, Serialize)]
pub struct InferencePayload {
    pub inputs: String,
    pub parameters: QualityProfile,
}

impl InferencePayload {
    pub fn new(prompt: &str, profile: &QualityProfile) -> Self {
        Self {
            inputs: prompt.to_string(),
            parameters: profile.clone(),
        }
    }
}

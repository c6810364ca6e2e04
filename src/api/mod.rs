//! Wire payloads exchanged with external providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
}

#[derive(Deserialize)]
pub struct ImageData {
    pub url: Option<String>,
}

#[derive(Deserialize)]
pub struct ImageGenerationResponse {
    pub data: Vec<ImageData>,
}

#[derive(Serialize)]
pub struct InferenceParameters {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub return_full_text: bool,
    pub do_sample: bool,
}

#[derive(Serialize)]
pub struct InferenceRequest {
    pub inputs: String,
    pub parameters: InferenceParameters,
}

#[derive(Deserialize)]
pub struct InferenceOutput {
    pub generated_text: Option<String>,
}

#[derive(Serialize)]
pub struct PredictionInput {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_outputs: u32,
    pub scheduler: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
}

#[derive(Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: PredictionInput,
}

#[derive(Deserialize)]
pub struct Prediction {
    pub id: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

#[derive(Serialize)]
pub struct SpeechRequest {
    pub text: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
}

#[derive(Serialize)]
pub struct TranslateRequest {
    pub q: String,
    pub target: String,
    pub format: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: Option<String>,
}

#[derive(Deserialize)]
pub struct TranslationList {
    pub translations: Vec<Translation>,
}

#[derive(Deserialize)]
pub struct TranslateResponse {
    pub data: TranslationList,
}

//! Services module - content generation and audio playback.
//!
//! The services are framework-agnostic and have no dependencies on the UI
//! layer.
//!
//! # Components
//!
//! - [`ContentProvider`]: the seam to the generative-AI backend. Two operations:
//!   questions for a subject, and a spoken welcome for a student.
//! - [`GeminiProvider`]: production implementation over the Gemini
//!   `generateContent` REST endpoint (reqwest).
//! - [`AudioService`] / [`AudioSender`]: a dedicated playback thread fed by a
//!   channel, plus [`decode_welcome_audio`] for the base64 PCM greeting.
//!
//! # Usage Example
//!
//! ```ignore
//! use bevuihoc::services::{ContentProvider, GeminiProvider};
//!
//! let provider = GeminiProvider::new(api_key, settings.api.clone())?;
//! let questions = provider.fetch_questions("Toán").await?;
//! ```

pub mod audio;
pub mod gemini;
pub mod provider;

pub use audio::{
    AudioError, AudioEvent, AudioSender, AudioService, PcmClip, create_audio_channel,
    decode_welcome_audio,
};
pub use gemini::GeminiProvider;
pub use provider::{ContentProvider, ProviderError};

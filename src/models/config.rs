use serde::{Deserialize, Serialize};

/// Application settings from `settings.yaml`, layered with environment overrides.
///
/// The API credential is not part of this structure; it is read from the
/// environment only (see [`crate::config::load_api_key`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub audio: AudioSettings,
    pub logging: LoggingSettings,
}

/// Content provider endpoint and model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub quiz_model: String,
    pub speech_model: String,
    pub voice_name: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            quiz_model: "gemini-2.5-flash".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Charon".to_string(),
            request_timeout_secs: 120,
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub enabled: bool,
    /// Linear gain applied to every clip, 0.0 to 1.0
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub prefix: String,
    pub debug: bool,
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            prefix: "bevuihoc".to_string(),
            debug: false,
            console: true,
        }
    }
}

impl AudioSettings {
    /// Volume clamped to the range rodio accepts without distortion.
    pub fn effective_volume(&self) -> f32 {
        if self.enabled {
            self.volume.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_defaults() {
        let api = ApiSettings::default();
        assert_eq!(api.quiz_model, "gemini-2.5-flash");
        assert_eq!(api.voice_name, "Charon");
        assert_eq!(api.request_timeout_secs, 120);
        assert!(api.base_url.starts_with("https://"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "audio:\n  volume: 0.5\n";
        let settings: AppSettings = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(settings.audio.volume, 0.5);
        assert!(settings.audio.enabled);
        assert_eq!(settings.logging.prefix, "bevuihoc");
    }

    #[test]
    fn test_effective_volume() {
        let mut audio = AudioSettings::default();
        audio.volume = 3.0;
        assert_eq!(audio.effective_volume(), 1.0);
        audio.enabled = false;
        assert_eq!(audio.effective_volume(), 0.0);
    }
}

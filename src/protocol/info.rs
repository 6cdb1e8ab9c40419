use super::event::Event;
use super::messages::EventMessage;
use crate::config::WhisperConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Languages the multilingual whisper models understand
const WHISPER_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "as", "az", "ba", "be", "bg", "bn", "bo", "br", "bs", "ca", "cs", "cy",
    "da", "de", "el", "en", "es", "et", "eu", "fa", "fi", "fo", "fr", "gl", "gu", "ha", "haw",
    "he", "hi", "hr", "ht", "hu", "hy", "id", "is", "it", "ja", "jw", "ka", "kk", "km", "kn",
    "ko", "la", "lb", "ln", "lo", "lt", "lv", "mg", "mi", "mk", "ml", "mn", "mr", "ms", "mt",
    "my", "ne", "nl", "nn", "no", "oc", "pa", "pl", "ps", "pt", "ro", "ru", "sa", "sd", "si",
    "sk", "sl", "sn", "so", "sq", "sr", "su", "sv", "sw", "ta", "te", "tg", "th", "tk", "tl",
    "tr", "tt", "uk", "ur", "uz", "vi", "yi", "yo", "zh", "yue",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    pub url: String,
}

/// A speech-to-text model served by a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsrModel {
    pub name: String,
    pub description: Option<String>,
    pub attribution: Attribution,
    pub installed: bool,
    pub languages: Vec<String>,
    pub version: Option<String>,
}

/// A speech-to-text program and the models it serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsrProgram {
    pub name: String,
    pub description: Option<String>,
    pub attribution: Attribution,
    pub installed: bool,
    pub version: Option<String>,
    pub models: Vec<AsrModel>,
}

/// Capability advertisement sent in response to `describe`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub asr: Vec<AsrProgram>,
}

impl Info {
    /// Build the advertisement for the configured whisper model
    pub fn from_config(config: &WhisperConfig) -> Self {
        let attribution = Attribution {
            name: "ggerganov".to_string(),
            url: "https://github.com/ggerganov/whisper.cpp".to_string(),
        };

        let model_name = Path::new(&config.model)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.model.clone());

        let languages = match &config.language {
            Some(language) => vec![language.clone()],
            None => WHISPER_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        };

        Self {
            asr: vec![AsrProgram {
                name: "whisper-stream".to_string(),
                description: Some("Streaming whisper.cpp transcription".to_string()),
                attribution: attribution.clone(),
                installed: true,
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
                models: vec![AsrModel {
                    name: model_name,
                    description: Some(config.model.clone()),
                    attribution,
                    installed: true,
                    languages,
                    version: None,
                }],
            }],
        }
    }
}

impl EventMessage for Info {
    const EVENT_TYPE: &'static str = "info";

    fn from_event(event: &Event) -> Result<Self> {
        serde_json::from_value(Value::Object(event.data.clone()))
            .context("Invalid data for info event")
    }

    fn to_event(&self) -> Event {
        let data = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Default::default(),
        };
        Event::new(Self::EVENT_TYPE).with_data(data)
    }
}

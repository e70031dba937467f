//! Values passed between pipeline stages.

use std::fmt;
use std::str::FromStr;

use mangareel_common::error::MangareelError;
use serde::{Deserialize, Serialize};

/// Story text produced by the text generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub text: String,
}

impl Script {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Number of words, used for logging only.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// One scene description handed to the image generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePrompt {
    pub description: String,
}

impl ScenePrompt {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl fmt::Display for ScenePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Where a generated image can be read from: a URL or a local path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLocation {
    pub location: String,
}

impl ImageLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Whether the image has to be fetched over HTTP(S).
    pub fn is_remote(&self) -> bool {
        let lower = self.location.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    pub fn as_str(&self) -> &str {
        &self.location
    }
}

/// Audio container/codec returned by the speech synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    #[default]
    Mp3,
    Linear16,
    OggOpus,
}

impl AudioEncoding {
    /// Name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::OggOpus => "OGG_OPUS",
        }
    }

    /// File extension for staged audio.
    pub fn extension(self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::Linear16 => "wav",
            AudioEncoding::OggOpus => "ogg",
        }
    }
}

impl FromStr for AudioEncoding {
    type Err = MangareelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MP3" => Ok(AudioEncoding::Mp3),
            "LINEAR16" => Ok(AudioEncoding::Linear16),
            "OGG_OPUS" => Ok(AudioEncoding::OggOpus),
            other => Err(MangareelError::config(format!(
                "Unknown audio encoding: {other}. Use: MP3, LINEAR16, OGG_OPUS"
            ))),
        }
    }
}

/// Encoded narration audio.
#[derive(Clone, PartialEq, Eq)]
pub struct NarrationAudio {
    pub bytes: Vec<u8>,
    pub encoding: AudioEncoding,
}

impl NarrationAudio {
    pub fn new(bytes: Vec<u8>, encoding: AudioEncoding) -> Self {
        Self { bytes, encoding }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Audio payloads are large; print only their size.
impl fmt::Debug for NarrationAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrationAudio")
            .field("bytes", &self.bytes.len())
            .field("encoding", &self.encoding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_detection() {
        assert!(ImageLocation::new("https://cdn.example.com/a.png").is_remote());
        assert!(ImageLocation::new("HTTP://cdn.example.com/a.png").is_remote());
        assert!(!ImageLocation::new("/tmp/a.png").is_remote());
        assert!(!ImageLocation::new("file:///tmp/a.png").is_remote());
    }

    #[test]
    fn test_audio_encoding_parse() {
        assert_eq!("mp3".parse::<AudioEncoding>().unwrap(), AudioEncoding::Mp3);
        assert_eq!(
            " ogg_opus ".parse::<AudioEncoding>().unwrap(),
            AudioEncoding::OggOpus
        );
        assert!("flac".parse::<AudioEncoding>().is_err());
        assert_eq!(AudioEncoding::Linear16.extension(), "wav");
    }

    #[test]
    fn test_audio_encoding_wire_name() {
        let json = serde_json::to_string(&AudioEncoding::OggOpus).unwrap();
        assert_eq!(json, "\"OGG_OPUS\"");
        assert_eq!(AudioEncoding::OggOpus.as_str(), "OGG_OPUS");
    }

    #[test]
    fn test_narration_debug_hides_payload() {
        let audio = NarrationAudio::new(vec![0u8; 2048], AudioEncoding::Mp3);
        let debug = format!("{audio:?}");
        assert!(debug.contains("2048"));
        assert!(debug.len() < 100);
    }
}

//! Request and result types shared by the adapter and the MCP surface.

use serde::{Deserialize, Serialize};

use crate::error::SongError;

/// Longest style tag accepted, in characters.
pub const MAX_STYLE_CHARS: usize = 200;

/// One generation request, built per tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    /// Free-text description; the upstream writes lyrics and picks a title.
    SimplePrompt { prompt: String, instrumental: bool },
    /// Caller-supplied lyrics with an optional style tag and title.
    CustomLyrics {
        lyrics: String,
        style: Option<String>,
        title: Option<String>,
        instrumental: bool,
    },
}

impl GenerationRequest {
    pub fn simple(prompt: impl Into<String>, instrumental: bool) -> Result<Self, SongError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(SongError::validation("prompt must not be empty"));
        }
        Ok(GenerationRequest::SimplePrompt {
            prompt,
            instrumental,
        })
    }

    pub fn custom(
        lyrics: impl Into<String>,
        style: Option<String>,
        title: Option<String>,
        instrumental: bool,
    ) -> Result<Self, SongError> {
        let lyrics = lyrics.into();
        if lyrics.trim().is_empty() {
            return Err(SongError::validation("lyrics must not be empty"));
        }

        let style = style.filter(|s| !s.trim().is_empty());
        if let Some(ref s) = style {
            let chars = s.chars().count();
            if chars > MAX_STYLE_CHARS {
                return Err(SongError::validation(format!(
                    "style must be a short tag ({} characters max, got {})",
                    MAX_STYLE_CHARS, chars
                )));
            }
        }

        Ok(GenerationRequest::CustomLyrics {
            lyrics,
            style,
            title: title.filter(|t| !t.trim().is_empty()),
            instrumental,
        })
    }

    pub fn mode(&self) -> GenerationMode {
        match self {
            GenerationRequest::SimplePrompt { .. } => GenerationMode::Simple,
            GenerationRequest::CustomLyrics { .. } => GenerationMode::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Simple,
    Custom,
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationMode::Simple => f.write_str("simple"),
            GenerationMode::Custom => f.write_str("custom"),
        }
    }
}

/// Locator for a generated track. The bytes stay with the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioResource {
    pub uri: String,
    pub clip_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// What a successful tool invocation returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSong {
    pub job_id: String,
    pub mode: GenerationMode,
    pub audio: AudioResource,
}

impl GeneratedSong {
    /// One-line summary for the assistant.
    pub fn summary(&self) -> String {
        let title = self.audio.title.as_deref().unwrap_or("Untitled track");
        match self.mode {
            GenerationMode::Simple => format!("Generated song: '{}'. Listen at {}", title, self.audio.uri),
            GenerationMode::Custom => {
                format!("Generated custom song: '{}'. Listen at {}", title, self.audio.uri)
            }
        }
    }
}

//! Upstream jobs and their status.
//!
//! A submission yields one or more clips. The job is identified by its first
//! clip id and is done as soon as any clip is playable.

use serde::Deserialize;
use std::fmt;

use crate::types::AudioResource;

/// An in-flight upstream generation, owned by a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    id: String,
    clip_ids: Vec<String>,
}

impl GenerationJob {
    /// Build a job from the clip ids returned at submission. `None` if empty.
    pub fn from_clip_ids(clip_ids: Vec<String>) -> Option<Self> {
        let id = clip_ids.first()?.clone();
        Some(Self { id, clip_ids })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn clip_ids(&self) -> &[String] {
        &self.clip_ids
    }
}

impl fmt::Display for GenerationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A clip as reported by the upstream feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Clip {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: Option<ClipMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClipMetadata {
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipState {
    Pending,
    Complete,
    Failed,
}

impl Clip {
    pub fn state(&self) -> ClipState {
        match self.status.as_deref() {
            Some("complete") => ClipState::Complete,
            Some("error") => ClipState::Failed,
            // submitted, queued, streaming, null, and anything new
            _ => ClipState::Pending,
        }
    }

    fn playable_url(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    fn diagnostic(&self) -> String {
        let message = self
            .error_message
            .as_deref()
            .or_else(|| self.metadata.as_ref()?.error_message.as_deref())
            .filter(|m| !m.trim().is_empty());

        match (self.state(), message) {
            (_, Some(m)) => format!("clip {}: {}", self.id, m),
            (ClipState::Complete, None) => format!("clip {}: completed without an audio URL", self.id),
            (_, None) => format!("clip {}: no diagnostic provided", self.id),
        }
    }
}

/// Status of a job as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Complete(AudioResource),
    Failed(String),
}

impl JobStatus {
    /// Fold the clips belonging to `job` into one status.
    ///
    /// The first playable clip in submission order wins. The job fails only
    /// once every clip is terminal and none is playable.
    pub fn evaluate(job: &GenerationJob, clips: &[Clip]) -> JobStatus {
        let ours: Vec<&Clip> = job
            .clip_ids()
            .iter()
            .filter_map(|id| clips.iter().find(|c| &c.id == id))
            .collect();

        for clip in &ours {
            if clip.state() == ClipState::Complete {
                if let Some(url) = clip.playable_url() {
                    return JobStatus::Complete(AudioResource {
                        uri: url.to_string(),
                        clip_id: clip.id.clone(),
                        title: clip.title.clone().filter(|t| !t.trim().is_empty()),
                    });
                }
            }
        }

        // Clips missing from the feed count as still pending.
        let all_terminal = ours.len() == job.clip_ids().len()
            && ours.iter().all(|c| c.state() != ClipState::Pending);

        if all_terminal {
            let diagnostics: Vec<String> = ours.iter().map(|c| c.diagnostic()).collect();
            JobStatus::Failed(diagnostics.join("; "))
        } else {
            JobStatus::Pending
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

//! Song generation: validate, submit, wait, return the audio locator.

use tracing::{info, warn};

use croonconf::{CroonConfig, PollingConfig};

use crate::error::SongError;
use crate::poll::poll_until_terminal;
use crate::progress::{report, ProgressSender, ProgressUpdate, SUBMITTED, TOTAL};
use crate::types::{GeneratedSong, GenerationRequest};
use crate::upstream::SunoClient;

/// Drives one generation per call. Holds no per-job state, so concurrent
/// calls are independent.
#[derive(Debug, Clone)]
pub struct SongAdapter {
    client: SunoClient,
    model: String,
    polling: PollingConfig,
}

impl SongAdapter {
    /// Build from loaded configuration. Fails if the session cookie is missing.
    pub fn new(config: &CroonConfig) -> Result<Self, SongError> {
        let token = config.session_token()?;
        let client = SunoClient::new(&config.upstream, &token)?;
        Ok(Self {
            client,
            model: config.upstream.model.clone(),
            polling: config.polling.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn upstream_url(&self) -> &str {
        self.client.base_url()
    }

    pub async fn generate_simple(
        &self,
        prompt: &str,
        instrumental: bool,
    ) -> Result<GeneratedSong, SongError> {
        self.generate_simple_with_progress(prompt, instrumental, None).await
    }

    #[tracing::instrument(name = "croon.generate_simple", skip_all, fields(instrumental = instrumental))]
    pub async fn generate_simple_with_progress(
        &self,
        prompt: &str,
        instrumental: bool,
        progress: Option<ProgressSender>,
    ) -> Result<GeneratedSong, SongError> {
        let request = GenerationRequest::simple(prompt, instrumental)?;
        self.run(request, progress.as_ref()).await
    }

    pub async fn generate_custom(
        &self,
        lyrics: &str,
        style: Option<&str>,
        title: Option<&str>,
        instrumental: bool,
    ) -> Result<GeneratedSong, SongError> {
        self.generate_custom_with_progress(lyrics, style, title, instrumental, None).await
    }

    #[tracing::instrument(
        name = "croon.generate_custom",
        skip_all,
        fields(has_style = style.is_some(), has_title = title.is_some(), instrumental = instrumental)
    )]
    pub async fn generate_custom_with_progress(
        &self,
        lyrics: &str,
        style: Option<&str>,
        title: Option<&str>,
        instrumental: bool,
        progress: Option<ProgressSender>,
    ) -> Result<GeneratedSong, SongError> {
        let request = GenerationRequest::custom(
            lyrics,
            style.map(String::from),
            title.map(String::from),
            instrumental,
        )?;
        self.run(request, progress.as_ref()).await
    }

    async fn run(
        &self,
        request: GenerationRequest,
        progress: Option<&ProgressSender>,
    ) -> Result<GeneratedSong, SongError> {
        let mode = request.mode();
        report(progress, ProgressUpdate::new(0.0, "Submitting generation request")).await;

        let job = self.client.submit(&request, &self.model).await?;
        info!(job_id = %job, %mode, "generation started");
        report(
            progress,
            ProgressUpdate::new(SUBMITTED, format!("Job {} started", job)),
        )
        .await;

        let result = poll_until_terminal(
            &self.client,
            &job,
            self.polling.interval(),
            self.polling.timeout(),
            progress,
        )
        .await;

        match result {
            Ok(audio) => {
                info!(job_id = %job, clip_id = %audio.clip_id, "generation complete");
                report(progress, ProgressUpdate::new(TOTAL, "Generation complete")).await;
                Ok(GeneratedSong {
                    job_id: job.id().to_string(),
                    mode,
                    audio,
                })
            }
            Err(e) => {
                warn!(job_id = %job, kind = e.kind(), error = %e, "generation did not complete");
                Err(e)
            }
        }
    }
}

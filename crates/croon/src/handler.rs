//! MCP tool surface.
//!
//! Two tools, both blocking until the song is ready or the wait gives up.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::adapter::SongAdapter;
use crate::error::SongError;
use crate::progress::{self, ProgressSender};
use crate::types::GeneratedSong;

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct GenerateSongRequest {
    #[schemars(description = "Free-text description of the song, e.g. 'an upbeat pop song about summer'")]
    pub prompt: String,

    #[schemars(description = "Generate without vocals (default: false)")]
    #[serde(default)]
    pub instrumental: bool,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct CustomGenerateSongRequest {
    #[schemars(description = "Full lyrics, sent as written. Section markers like [Verse] are allowed")]
    pub lyrics: String,

    #[schemars(description = "Short style tag, e.g. 'acoustic folk' (200 characters max)")]
    #[serde(default)]
    pub style_tags: Option<String>,

    #[schemars(description = "Song title")]
    #[serde(default)]
    pub title: Option<String>,

    #[schemars(description = "Generate without vocals (default: false)")]
    #[serde(default)]
    pub instrumental: bool,
}

/// MCP handler shared by the stdio and HTTP transports.
#[derive(Debug, Clone)]
pub struct SongHandler {
    adapter: SongAdapter,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SongHandler {
    pub fn new(adapter: SongAdapter) -> Self {
        Self {
            adapter,
            tool_router: Self::tool_router(),
        }
    }

    pub fn adapter(&self) -> &SongAdapter {
        &self.adapter
    }

    #[tool(
        description = "Generate a song from a text description. The lyrics, style and title are chosen upstream. Blocks until the audio is ready and returns its URL."
    )]
    async fn generate_song(
        &self,
        Parameters(request): Parameters<GenerateSongRequest>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let (progress, relay) = progress::forward(&ctx).unzip();
        let result = self.simple_song(request, progress).await;
        drain(relay).await;
        result
    }

    #[tool(
        description = "Generate a song from your own lyrics with an optional style tag and title. Blocks until the audio is ready and returns its URL."
    )]
    async fn custom_generate_song(
        &self,
        Parameters(request): Parameters<CustomGenerateSongRequest>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let (progress, relay) = progress::forward(&ctx).unzip();
        let result = self.custom_song(request, progress).await;
        drain(relay).await;
        result
    }
}

impl SongHandler {
    async fn simple_song(
        &self,
        request: GenerateSongRequest,
        progress: Option<ProgressSender>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .adapter
            .generate_simple_with_progress(&request.prompt, request.instrumental, progress)
            .await;
        tool_result(result)
    }

    async fn custom_song(
        &self,
        request: CustomGenerateSongRequest,
        progress: Option<ProgressSender>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .adapter
            .generate_custom_with_progress(
                &request.lyrics,
                request.style_tags.as_deref(),
                request.title.as_deref(),
                request.instrumental,
                progress,
            )
            .await;
        tool_result(result)
    }
}

/// Let queued progress notifications go out ahead of the tool result.
async fn drain(relay: Option<JoinHandle<()>>) {
    if let Some(handle) = relay {
        if let Err(e) = handle.await {
            debug!(error = %e, "progress relay ended abnormally");
        }
    }
}

/// Bad arguments are a protocol error. Everything else is reported inside
/// the tool result so the assistant can relay it.
fn tool_result(result: Result<GeneratedSong, SongError>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(song) => {
            let body = serde_json::json!({
                "job_id": song.job_id,
                "mode": song.mode,
                "clip_id": song.audio.clip_id,
                "title": song.audio.title,
                "audio_url": song.audio.uri,
            });
            Ok(CallToolResult::success(vec![
                Content::text(song.summary()),
                Content::text(body.to_string()),
            ]))
        }
        Err(SongError::Validation(message)) => Err(McpError::invalid_params(message, None)),
        Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
            "{} ({})",
            e,
            e.kind()
        ))])),
    }
}

#[tool_handler]
impl ServerHandler for SongHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "croon generates songs.\n\n\
                - generate_song: describe the song in plain words\n\
                - custom_generate_song: supply lyrics, optionally a style tag and title\n\n\
                Each call waits for the track (usually one to three minutes) and returns \
                an audio URL. If a call reports an authentication error, the session \
                cookie has expired and must be refreshed by the operator."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "croon".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

//! croon - MCP server that turns prompts and lyrics into songs
//!
//! This library provides:
//! - `adapter`: validate, submit, poll, return an audio locator
//! - `upstream`: cookie-authenticated HTTP client for the generation API
//! - `job` / `poll`: job status evaluation and the wait loop
//! - `progress`: progress updates and their relay to MCP clients
//! - `handler`: MCP tools over the adapter
//! - `stdio` / `serve`: MCP transports
//! - `telemetry`: tracing and optional OTLP export

pub mod adapter;
pub mod error;
pub mod handler;
pub mod job;
pub mod poll;
pub mod progress;
pub mod serve;
pub mod stdio;
pub mod telemetry;
pub mod types;
pub mod upstream;

pub use adapter::SongAdapter;
pub use error::SongError;
pub use handler::SongHandler;
pub use progress::{ProgressSender, ProgressUpdate};
pub use types::{AudioResource, GeneratedSong, GenerationMode, GenerationRequest};

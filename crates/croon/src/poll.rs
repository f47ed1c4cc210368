use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::SongError;
use crate::job::{GenerationJob, JobStatus};
use crate::progress::{polling_progress, report, ProgressSender, ProgressUpdate};
use crate::types::AudioResource;
use crate::upstream::SunoClient;

/// Wait for `job` to finish, checking every `interval` until `timeout` passes.
///
/// The first check happens one interval after submission. A failed status
/// query ends the wait immediately. Each check that leaves the job pending
/// is reported to `progress`.
#[tracing::instrument(
    name = "croon.poll",
    skip_all,
    fields(
        job_id = %job,
        poll.interval_ms = interval.as_millis() as u64,
        poll.timeout_secs = timeout.as_secs(),
        poll.attempts = tracing::field::Empty,
        poll.elapsed_ms = tracing::field::Empty,
    )
)]
pub async fn poll_until_terminal(
    client: &SunoClient,
    job: &GenerationJob,
    interval: Duration,
    timeout: Duration,
    progress: Option<&ProgressSender>,
) -> Result<AudioResource, SongError> {
    let start = Instant::now();
    let mut attempts: u32 = 0;

    let outcome = tokio::time::timeout(timeout, async {
        loop {
            tokio::time::sleep(interval).await;
            attempts += 1;

            let clips = client.status(job).await?;
            match JobStatus::evaluate(job, &clips) {
                JobStatus::Pending => {
                    debug!(attempt = attempts, "job still pending");
                    let update = ProgressUpdate::new(
                        polling_progress(start.elapsed(), timeout),
                        format!("Waiting for job {} (check {})", job, attempts),
                    );
                    report(progress, update).await;
                }
                JobStatus::Complete(audio) => return Ok(audio),
                JobStatus::Failed(reason) => return Err(SongError::GenerationFailed(reason)),
            }
        }
    })
    .await;

    let span = tracing::Span::current();
    span.record("poll.attempts", attempts);
    span.record("poll.elapsed_ms", start.elapsed().as_millis() as u64);

    match outcome {
        Ok(result) => result,
        Err(_) => Err(SongError::Timeout {
            job_id: job.id().to_string(),
            waited: timeout,
        }),
    }
}

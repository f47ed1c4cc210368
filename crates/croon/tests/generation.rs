//! End-to-end generation against a mocked upstream.
//!
//! Each test stands up a wiremock server in place of the generation API and
//! drives `SongAdapter` through submit, poll, and result mapping.

use croon::{GenerationMode, ProgressUpdate, SongAdapter, SongError};
use croonconf::CroonConfig;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> CroonConfig {
    let mut config = CroonConfig::default();
    config.upstream.base_url = server.uri();
    config.session.cookie = Some("session=abc; __client=xyz".to_string());
    config.polling.interval_ms = 20;
    config.polling.timeout_secs = 5;
    config
}

fn submitted(ids: &[&str]) -> ResponseTemplate {
    let clips: Vec<_> = ids.iter().map(|id| json!({ "id": id, "status": "submitted" })).collect();
    ResponseTemplate::new(200).set_body_json(json!({ "clips": clips }))
}

fn feed(clips: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(clips)
}

#[tokio::test]
async fn test_simple_generation_polls_until_complete() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate/v2/"))
        .and(header("cookie", "session=abc; __client=xyz"))
        .and(body_json(json!({
            "gpt_description_prompt": "an upbeat pop song about robots",
            "prompt": "",
            "mv": "chirp-v3-5",
            "make_instrumental": false,
        })))
        .respond_with(submitted(&["abc123", "def456"]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .and(query_param("ids", "abc123,def456"))
        .respond_with(feed(json!([
            { "id": "abc123", "status": "queued" },
            { "id": "def456", "status": "queued" },
        ])))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(feed(json!([
            {
                "id": "abc123",
                "status": "complete",
                "title": "Robot Disco",
                "audio_url": "https://cdn.example/abc123.mp3"
            },
            { "id": "def456", "status": "streaming" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let song = adapter
        .generate_simple("an upbeat pop song about robots", false)
        .await
        .unwrap();

    assert_eq!(song.job_id, "abc123");
    assert_eq!(song.mode, GenerationMode::Simple);
    assert_eq!(song.audio.uri, "https://cdn.example/abc123.mp3");
    assert_eq!(song.audio.title.as_deref(), Some("Robot Disco"));
    assert_eq!(
        song.summary(),
        "Generated song: 'Robot Disco'. Listen at https://cdn.example/abc123.mp3"
    );
}

#[tokio::test]
async fn test_null_status_keeps_polling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate/v2/"))
        .respond_with(submitted(&["c1"]))
        .mount(&server)
        .await;

    // Freshly submitted clips can report a null status
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(feed(json!([{ "id": "c1", "status": null, "audio_url": null }])))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(feed(json!([{
            "id": "c1",
            "status": "complete",
            "audio_url": "https://cdn.example/c1.mp3"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let song = adapter.generate_simple("a lullaby", true).await.unwrap();
    assert_eq!(song.audio.uri, "https://cdn.example/c1.mp3");
}

#[tokio::test]
async fn test_progress_covers_submit_each_check_and_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate/v2/"))
        .respond_with(submitted(&["p1"]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(feed(json!([{ "id": "p1", "status": "queued" }])))
        .up_to_n_times(3)
        .with_priority(1)
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(feed(json!([{
            "id": "p1",
            "status": "complete",
            "audio_url": "https://cdn.example/p1.mp3"
        }])))
        .mount(&server)
        .await;

    let (tx, mut rx) = tokio::sync::mpsc::channel::<ProgressUpdate>(64);
    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    adapter
        .generate_simple_with_progress("a waltz for toasters", false, Some(tx))
        .await
        .unwrap();

    let mut updates = Vec::new();
    while let Some(update) = rx.recv().await {
        updates.push(update);
    }

    // submit, accepted, three pending checks, complete
    assert_eq!(updates.len(), 6, "updates: {:?}", updates);
    assert_eq!(updates[0].progress, 0.0);
    assert_eq!(updates[1].message, "Job p1 started");
    assert!(updates[2..5].iter().all(|u| u.message.starts_with("Waiting for job p1")));
    assert_eq!(updates[5].progress, 100.0);
    assert!(updates.windows(2).all(|w| w[0].progress <= w[1].progress));
}

#[tokio::test]
async fn test_progress_stops_at_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (tx, mut rx) = tokio::sync::mpsc::channel::<ProgressUpdate>(8);
    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let err = adapter
        .generate_custom_with_progress("some lyrics", None, None, false, Some(tx))
        .await
        .unwrap_err();
    assert!(matches!(err, SongError::UpstreamAuth { .. }));

    let mut updates = Vec::new();
    while let Some(update) = rx.recv().await {
        updates.push(update);
    }
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].message, "Submitting generation request");
}

#[tokio::test]
async fn test_custom_generation_sends_lyrics_verbatim() {
    let server = MockServer::start().await;
    let lyrics = "[Verse]\n  Wires hum at midnight  \n[Chorus]\nGlow, glow";

    Mock::given(method("POST"))
        .and(path("/api/generate/v2/"))
        .and(body_json(json!({
            "prompt": lyrics,
            "tags": "synthwave, dreamy",
            "title": "Night Drive",
            "mv": "chirp-v3-5",
            "make_instrumental": false,
        })))
        .respond_with(submitted(&["c1"]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .and(query_param("ids", "c1"))
        .respond_with(feed(json!([{
            "id": "c1",
            "status": "complete",
            "title": "Night Drive",
            "audio_url": "https://cdn.example/c1.mp3"
        }])))
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let song = adapter
        .generate_custom(lyrics, Some("synthwave, dreamy"), Some("Night Drive"), false)
        .await
        .unwrap();

    assert_eq!(song.mode, GenerationMode::Custom);
    assert_eq!(song.audio.clip_id, "c1");
    assert!(song.summary().starts_with("Generated custom song: 'Night Drive'"));
}

#[tokio::test]
async fn test_custom_without_style_omits_tags() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate/v2/"))
        .and(body_json(json!({
            "prompt": "la la la",
            "mv": "chirp-v3-5",
            "make_instrumental": true,
        })))
        .respond_with(submitted(&["c1"]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(feed(json!([{
            "id": "c1",
            "status": "complete",
            "audio_url": "https://cdn.example/c1.mp3"
        }])))
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let song = adapter
        .generate_custom("la la la", Some("   "), None, true)
        .await
        .unwrap();
    assert!(song.audio.title.is_none());
    assert!(song.summary().contains("Untitled track"));
}

#[tokio::test]
async fn test_rejected_cookie_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate/v2/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(feed(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let err = adapter.generate_simple("anything", false).await.unwrap_err();
    assert!(matches!(err, SongError::UpstreamAuth { status: 401 }));
}

#[tokio::test]
async fn test_auth_error_while_polling_surfaces_immediately() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(submitted(&["c1"]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let err = adapter.generate_simple("anything", false).await.unwrap_err();
    assert!(matches!(err, SongError::UpstreamAuth { status: 403 }));
}

#[tokio::test]
async fn test_rate_limit_is_upstream_error_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let err = adapter.generate_simple("anything", false).await.unwrap_err();
    match err {
        SongError::Upstream { status, message } => {
            assert_eq!(status, Some(429));
            assert!(message.contains("Too many requests"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_submission_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "clips": [] })))
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let err = adapter.generate_simple("anything", false).await.unwrap_err();
    assert!(matches!(err, SongError::Upstream { status: None, .. }));
}

#[tokio::test]
async fn test_failed_generation_reports_diagnostics() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(submitted(&["c1", "c2"]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(feed(json!([
            { "id": "c1", "status": "error", "error_message": "Lyrics flagged by moderation" },
            { "id": "c2", "status": "error", "metadata": { "error_message": "Lyrics flagged by moderation" } },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    let err = adapter
        .generate_custom("some lyrics", None, None, false)
        .await
        .unwrap_err();
    match err {
        SongError::GenerationFailed(reason) => {
            assert!(reason.contains("clip c1: Lyrics flagged by moderation"));
            assert!(reason.contains("clip c2"));
        }
        other => panic!("expected generation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_never_finishing_job_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(submitted(&["slow1"]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(feed(json!([{ "id": "slow1", "status": "streaming" }])))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.polling.interval_ms = 50;
    config.polling.timeout_secs = 1;

    let adapter = SongAdapter::new(&config).unwrap();
    let started = std::time::Instant::now();
    let err = adapter.generate_simple("anything", false).await.unwrap_err();

    match err {
        SongError::Timeout { job_id, waited } => {
            assert_eq!(job_id, "slow1");
            assert_eq!(waited.as_secs(), 1);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[tokio::test]
async fn test_validation_happens_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = SongAdapter::new(&config_for(&server)).unwrap();
    assert!(matches!(
        adapter.generate_simple("", false).await,
        Err(SongError::Validation(_))
    ));
    assert!(matches!(
        adapter
            .generate_custom("lyrics", Some(&"x".repeat(201)), None, false)
            .await,
        Err(SongError::Validation(_))
    ));
}

#[test]
fn test_missing_cookie_is_configuration_error() {
    let config = CroonConfig::default();
    assert!(matches!(
        SongAdapter::new(&config),
        Err(SongError::Configuration(_))
    ));
}

//! Subtitle download tests
//!
//! Covers single-step URL fetches, the two-step OpenSubtitles exchange and
//! SRT to WebVTT conversion.

use mockito::{Matcher, Server};
use tvfeed::subtitles::{srt_to_vtt, SubtitleDownloader};
use tvfeed::{DownloadRef, FeedError, ProviderKind, SubFormat, SubtitleCandidate, SubtitleProvider};

const SRT: &str = "1\n00:00:01,000 --> 00:00:04,250\nGood evening, and welcome.\n\n2\n00:00:05,000 --> 00:00:07,900\nTonight: 1,200 new jobs.\n";

fn candidate(download: DownloadRef) -> SubtitleCandidate {
    SubtitleCandidate {
        id: "c1".to_string(),
        title: "Evening News".to_string(),
        language: "en".to_string(),
        download,
        format: SubFormat::Srt,
        popularity: None,
        provider_id: "os".to_string(),
    }
}

fn opensubtitles(api_url: String, key: Option<&str>) -> SubtitleProvider {
    SubtitleProvider::new(
        "os",
        "OpenSubtitles",
        ProviderKind::OpenSubtitles {
            api_url,
            api_key: key.map(str::to_string),
        },
        &["en"],
    )
}

// =============================================================================
// Direct downloads
// =============================================================================

/// Test: URL candidates are fetched in one request
#[tokio::test]
async fn test_url_download() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/subs/evening.srt")
        .with_status(200)
        .with_body(SRT)
        .create_async()
        .await;

    let content = SubtitleDownloader::new()
        .download(
            None,
            &candidate(DownloadRef::Url(format!("{}/subs/evening.srt", server.url()))),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(content, SRT);
}

/// Test: Non-2xx download is a status error
#[tokio::test]
async fn test_url_download_not_found() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/subs/missing.srt")
        .with_status(404)
        .create_async()
        .await;

    let err = SubtitleDownloader::new()
        .download(
            None,
            &candidate(DownloadRef::Url(format!("{}/subs/missing.srt", server.url()))),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::Status(404)));
    assert!(err.is_transport());
}

/// Test: Path candidates read the local file
#[tokio::test]
async fn test_path_download() {
    let path = std::env::temp_dir().join(format!("tvfeed-download-{}.en.srt", std::process::id()));
    std::fs::write(&path, SRT).unwrap();

    let content = SubtitleDownloader::new()
        .download(None, &candidate(DownloadRef::Path(path.clone())))
        .await;
    let _ = std::fs::remove_file(&path);

    assert_eq!(content.unwrap(), SRT);
}

// =============================================================================
// OpenSubtitles two-step download
// =============================================================================

/// Test: File id is exchanged for a link, then the link is fetched
#[tokio::test]
async fn test_file_id_resolves_then_fetches() {
    let mut server = Server::new_async().await;
    let link = format!("{}/files/4242/evening.srt", server.url());

    let resolve = server
        .mock("POST", "/download")
        .match_header("api-key", "KEY123")
        .match_body(Matcher::PartialJsonString(r#"{"file_id": 4242}"#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"link": "{}", "remaining": 99}}"#, link))
        .create_async()
        .await;
    let fetch = server
        .mock("GET", "/files/4242/evening.srt")
        .with_status(200)
        .with_body(SRT)
        .create_async()
        .await;

    let provider = opensubtitles(server.url(), Some("KEY123"));
    let content = SubtitleDownloader::new()
        .download(Some(&provider), &candidate(DownloadRef::FileId(4242)))
        .await
        .unwrap();

    resolve.assert_async().await;
    fetch.assert_async().await;
    assert_eq!(content, SRT);
}

/// Test: Download response without a link is NoLink
#[tokio::test]
async fn test_file_id_without_link() {
    let mut server = Server::new_async().await;

    let _resolve = server
        .mock("POST", "/download")
        .with_status(200)
        .with_body(r#"{"remaining": 0, "message": "quota exceeded"}"#)
        .create_async()
        .await;

    let provider = opensubtitles(server.url(), Some("KEY123"));
    let err = SubtitleDownloader::new()
        .download(Some(&provider), &candidate(DownloadRef::FileId(4242)))
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::NoLink));
}

/// Test: File id without OpenSubtitles credentials is a configuration error
#[tokio::test]
async fn test_file_id_without_credentials() {
    let mut server = Server::new_async().await;

    let resolve = server
        .mock("POST", "/download")
        .expect(0)
        .create_async()
        .await;

    let downloader = SubtitleDownloader::new();
    let no_key = opensubtitles(server.url(), None);

    let err = downloader
        .download(Some(&no_key), &candidate(DownloadRef::FileId(1)))
        .await
        .unwrap_err();
    assert!(err.is_configuration());

    let err = downloader
        .download(None, &candidate(DownloadRef::FileId(1)))
        .await
        .unwrap_err();
    assert!(err.is_configuration());

    // Blank keys count as missing, same as in search
    let blank_key = opensubtitles(server.url(), Some("  "));
    let err = downloader
        .download(Some(&blank_key), &candidate(DownloadRef::FileId(1)))
        .await
        .unwrap_err();
    assert!(err.is_configuration());

    resolve.assert_async().await;
}

// =============================================================================
// SRT to WebVTT
// =============================================================================

/// Test: Conversion adds the header and rewrites every timestamp
#[test]
fn test_srt_to_vtt_properties() {
    let vtt = srt_to_vtt(SRT);

    assert!(vtt.starts_with("WEBVTT\n\n"));
    assert!(vtt.contains("00:00:01.000 --> 00:00:04.250"));
    assert!(vtt.contains("00:00:05.000 --> 00:00:07.900"));
    assert!(!vtt.contains("00:00:01,000"));

    // Dialogue commas are untouched
    assert!(vtt.contains("Good evening, and welcome."));
    assert!(vtt.contains("Tonight: 1,200 new jobs."));
}

/// Test: Empty input still yields a valid header
#[test]
fn test_srt_to_vtt_empty() {
    assert_eq!(srt_to_vtt(""), "WEBVTT\n\n");
}

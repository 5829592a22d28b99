//! Fetch-then-convert runs against fake tools
//!
//! These tests drive the full [`Pipeline`] with an in-memory catalog and
//! transcoder, checking what lands on disk and what the summary reports.

mod common;

use catalog_dl::ui::Console;
use catalog_dl::{
    AudioFormat, ConversionConfig, DownloadRequest, Orchestrator, Pipeline, PostProcessor,
    TrackStatus, TranscodeTarget, Transcoder,
};
use common::{
    ALBUM_URL, FakeCollection, FakeFetcher, FakeTranscoder, PLAYLIST_URL, cookie_file,
    files_with_extension, isolated_config,
};
use std::sync::Arc;
use tempfile::TempDir;

fn pipeline(
    root: &std::path::Path,
    fetcher: Arc<FakeFetcher>,
    transcoder: Arc<dyn Transcoder>,
) -> Pipeline {
    let config = Arc::new(isolated_config(root));
    Pipeline::new(
        Orchestrator::new(config, fetcher),
        PostProcessor::new(transcoder, ConversionConfig::default()),
        Console::plain(),
    )
}

fn request(url: &str, convert: Option<TranscodeTarget>) -> DownloadRequest {
    DownloadRequest::new(url, AudioFormat::AacLegacy, convert)
}

#[tokio::test]
async fn every_resolved_track_gets_a_result_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let titles = ["Intro", "Highway", "Detour", "Sunset", "Outro"];
    let fetcher = Arc::new(
        FakeFetcher::new().with_collection(PLAYLIST_URL, FakeCollection::new("Road Trip", &titles)),
    );
    let pipeline = pipeline(temp_dir.path(), fetcher.clone(), Arc::new(FakeTranscoder::new()));

    let summary = pipeline
        .run(&[request(PLAYLIST_URL, None)], &cookie_file(temp_dir.path()))
        .await
        .unwrap();

    let collection = &summary.collections[0];
    assert_eq!(collection.tracks.len(), titles.len());
    let indices: Vec<u32> = collection.tracks.iter().map(|t| t.index).collect();
    assert_eq!(indices, [1, 2, 3, 4, 5]);
    let resolved_titles: Vec<&str> = collection.tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(resolved_titles, titles);

    let folder = temp_dir.path().join("downloads").join("Road Trip");
    assert_eq!(collection.output_folder.as_deref(), Some(folder.as_path()));
    assert_eq!(
        files_with_extension(&folder, "m4a"),
        [
            "01 Intro.m4a",
            "02 Highway.m4a",
            "03 Detour.m4a",
            "04 Sunset.m4a",
            "05 Outro.m4a"
        ]
    );
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn failing_track_does_not_stop_later_tracks() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new().with_collection(
        ALBUM_URL,
        FakeCollection::new("Album", &["One", "Two", "Three", "Four"]).failing_at(2),
    ));
    let pipeline = pipeline(temp_dir.path(), fetcher.clone(), Arc::new(FakeTranscoder::new()));

    let summary = pipeline
        .run(&[request(ALBUM_URL, None)], &cookie_file(temp_dir.path()))
        .await
        .unwrap();

    assert_eq!(fetcher.fetched_positions(), [1, 2, 3, 4]);
    let collection = &summary.collections[0];
    assert_eq!(collection.count(TrackStatus::Ok), 3);
    assert_eq!(collection.count(TrackStatus::Failed), 1);
    assert_eq!(
        collection.tracks[1].error_detail.as_deref(),
        Some("not available in your region")
    );
}

#[tokio::test]
async fn flac_run_with_one_failed_fetch() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new().with_collection(
        PLAYLIST_URL,
        FakeCollection::new("Road Trip", &["First", "Second", "Third"]).failing_at(2),
    ));
    let transcoder = Arc::new(FakeTranscoder::new());
    let pipeline = pipeline(temp_dir.path(), fetcher, transcoder.clone());

    let summary = pipeline
        .run(
            &[request(PLAYLIST_URL, Some(TranscodeTarget::Flac))],
            &cookie_file(temp_dir.path()),
        )
        .await
        .unwrap();

    let folder = temp_dir.path().join("downloads").join("Road Trip");
    assert_eq!(
        files_with_extension(&folder, "flac"),
        ["01 First.flac", "03 Third.flac"]
    );
    assert!(files_with_extension(&folder, "m4a").is_empty(), "originals are replaced");

    let collection = &summary.collections[0];
    assert_eq!(collection.count(TrackStatus::Failed), 1);
    assert_eq!(collection.count(TrackStatus::Converted), 2);
    assert_eq!(collection.count(TrackStatus::Ok), 0);
    assert_eq!(transcoder.calls.lock().unwrap().len(), 2);
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn transcoder_failure_keeps_the_original() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new().with_collection(
        PLAYLIST_URL,
        FakeCollection::new("Road Trip", &["First", "Broken", "Third"]),
    ));
    let pipeline = pipeline(
        temp_dir.path(),
        fetcher,
        Arc::new(FakeTranscoder::failing_for("Broken")),
    );

    let summary = pipeline
        .run(
            &[request(PLAYLIST_URL, Some(TranscodeTarget::Flac))],
            &cookie_file(temp_dir.path()),
        )
        .await
        .unwrap();

    let folder = temp_dir.path().join("downloads").join("Road Trip");
    assert_eq!(
        files_with_extension(&folder, "flac"),
        ["01 First.flac", "03 Third.flac"]
    );
    assert_eq!(files_with_extension(&folder, "m4a"), ["02 Broken.m4a"]);

    let broken = &summary.collections[0].tracks[1];
    assert_eq!(broken.status, TrackStatus::Failed);
    assert_eq!(broken.source_path, Some(folder.join("02 Broken.m4a")));
    assert!(
        broken
            .error_detail
            .as_deref()
            .unwrap()
            .starts_with("conversion failed")
    );
    assert_eq!(summary.collections[0].count(TrackStatus::Converted), 2);
}

#[tokio::test]
async fn failed_conversions_still_exit_successfully() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(
        FakeFetcher::new().with_collection(PLAYLIST_URL, FakeCollection::new("Road Trip", &["Broken"])),
    );
    let pipeline = pipeline(
        temp_dir.path(),
        fetcher,
        Arc::new(FakeTranscoder::failing_for("Broken")),
    );

    let summary = pipeline
        .run(
            &[request(PLAYLIST_URL, Some(TranscodeTarget::Flac))],
            &cookie_file(temp_dir.path()),
        )
        .await
        .unwrap();

    let folder = temp_dir.path().join("downloads").join("Road Trip");
    assert_eq!(files_with_extension(&folder, "m4a"), ["01 Broken.m4a"]);
    assert_eq!(summary.count(TrackStatus::Failed), 1);
    assert_eq!(summary.fetched_tracks(), 1);
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn unresolvable_url_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(
        FakeFetcher::new().with_collection(ALBUM_URL, FakeCollection::new("Album", &["One"])),
    );
    let pipeline = pipeline(temp_dir.path(), fetcher.clone(), Arc::new(FakeTranscoder::new()));
    let unknown = "https://music.apple.com/us/album/missing/1";

    let summary = pipeline
        .run(
            &[request(unknown, None), request(ALBUM_URL, None)],
            &cookie_file(temp_dir.path()),
        )
        .await
        .unwrap();

    assert_eq!(*fetcher.resolved.lock().unwrap(), [unknown, ALBUM_URL]);
    assert_eq!(summary.collections.len(), 1);
    assert_eq!(summary.resolution_failures.len(), 1);
    assert_eq!(summary.resolution_failures[0].0, unknown);
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn nothing_resolved_is_a_failed_run() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline(
        temp_dir.path(),
        Arc::new(FakeFetcher::new()),
        Arc::new(FakeTranscoder::new()),
    );

    let summary = pipeline
        .run(&[request(PLAYLIST_URL, None)], &cookie_file(temp_dir.path()))
        .await
        .unwrap();

    assert!(summary.collections.is_empty());
    assert_eq!(summary.exit_code(), 5);
    assert!(!temp_dir.path().join("downloads").exists());
}

#[tokio::test]
async fn unsafe_titles_become_safe_folder_names() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new().with_collection(
        PLAYLIST_URL,
        FakeCollection::new("Best of: 80s/90s? <Live>", &["Track: One?"]),
    ));
    let pipeline = pipeline(temp_dir.path(), fetcher, Arc::new(FakeTranscoder::new()));

    let summary = pipeline
        .run(&[request(PLAYLIST_URL, None)], &cookie_file(temp_dir.path()))
        .await
        .unwrap();

    let collection = &summary.collections[0];
    let folder = collection.output_folder.clone().unwrap();
    assert_eq!(folder.parent(), Some(temp_dir.path().join("downloads").as_path()));

    let folder_name = folder.file_name().unwrap().to_string_lossy().into_owned();
    let file_name = collection.tracks[0]
        .source_path
        .as_ref()
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    for name in [&folder_name, &file_name] {
        assert!(
            !name.contains([':', '/', '?', '<', '>']),
            "{:?} is not filesystem-safe",
            name
        );
    }
    assert_eq!(collection.collection_name, "Best of: 80s/90s? <Live>");
}

#[tokio::test]
async fn same_collection_twice_gets_separate_folders() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(
        FakeFetcher::new().with_collection(ALBUM_URL, FakeCollection::new("Album", &["One"])),
    );
    let pipeline = pipeline(temp_dir.path(), fetcher, Arc::new(FakeTranscoder::new()));

    let summary = pipeline
        .run(
            &[request(ALBUM_URL, None), request(ALBUM_URL, None)],
            &cookie_file(temp_dir.path()),
        )
        .await
        .unwrap();

    let root = temp_dir.path().join("downloads");
    let folders: Vec<_> = summary
        .collections
        .iter()
        .map(|c| c.output_folder.clone().unwrap())
        .collect();
    assert_eq!(folders, [root.join("Album"), root.join("Album (1)")]);
}

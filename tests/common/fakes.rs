//! In-memory stand-ins for the external downloader, the transcoder and the
//! terminal prompts

use async_trait::async_trait;
use catalog_dl::{
    CatalogFetcher, ConversionError, CookieFile, DownloadRequest, Error, ResolvedCollection,
    ResolvedTrack, Result, TrackFetchError, TranscodeOptions, Transcoder,
};
use catalog_dl::interactive::Prompter;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One collection the fake catalog knows about
#[derive(Debug, Clone)]
pub struct FakeCollection {
    pub title: String,
    pub tracks: Vec<String>,
    /// 1-based positions whose fetch fails
    pub failing: HashSet<u32>,
}

impl FakeCollection {
    pub fn new(title: &str, tracks: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            tracks: tracks.iter().map(|t| t.to_string()).collect(),
            failing: HashSet::new(),
        }
    }

    pub fn failing_at(mut self, position: u32) -> Self {
        self.failing.insert(position);
        self
    }
}

/// Catalog fetcher serving fixed collections keyed by URL
///
/// Fetching writes a small `.m4a` file; every call is recorded.
#[derive(Default)]
pub struct FakeFetcher {
    collections: HashMap<String, FakeCollection>,
    pub resolved: Mutex<Vec<String>>,
    pub fetched: Mutex<Vec<(u32, String)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, url: &str, collection: FakeCollection) -> Self {
        self.collections.insert(url.to_string(), collection);
        self
    }

    pub fn fetched_positions(&self) -> Vec<u32> {
        self.fetched.lock().unwrap().iter().map(|(i, _)| *i).collect()
    }
}

#[async_trait]
impl CatalogFetcher for FakeFetcher {
    async fn resolve(
        &self,
        request: &DownloadRequest,
        _cookies: &CookieFile,
    ) -> Result<ResolvedCollection> {
        self.resolved.lock().unwrap().push(request.url.clone());
        let collection = self
            .collections
            .get(&request.url)
            .ok_or_else(|| Error::Resolution {
                url: request.url.clone(),
                reason: "unknown URL".to_string(),
            })?;

        let tracks = collection
            .tracks
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let position = i as u32 + 1;
                let locator = if collection.failing.contains(&position) {
                    format!("fail:{}", position)
                } else {
                    format!("ok:{}", position)
                };
                ResolvedTrack::available(title, locator)
            })
            .collect();

        Ok(ResolvedCollection::new(&collection.title, tracks))
    }

    async fn fetch_track(
        &self,
        index: u32,
        track: &ResolvedTrack,
        folder: &Path,
        file_stem: &str,
    ) -> std::result::Result<PathBuf, TrackFetchError> {
        self.fetched
            .lock()
            .unwrap()
            .push((index, track.title.clone()));

        if track
            .locator
            .as_deref()
            .is_some_and(|l| l.starts_with("fail:"))
        {
            return Err(TrackFetchError {
                index,
                title: track.title.clone(),
                reason: "not available in your region".to_string(),
            });
        }

        let path = folder.join(format!("{}.m4a", file_stem));
        std::fs::write(&path, format!("audio for {}", track.title)).unwrap();
        Ok(path)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Transcoder that copies the source, failing for sources whose name contains a marker
#[derive(Default)]
pub struct FakeTranscoder {
    fail_marker: Option<String>,
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        _options: &TranscodeOptions,
    ) -> std::result::Result<(), ConversionError> {
        self.calls
            .lock()
            .unwrap()
            .push((source.to_path_buf(), destination.to_path_buf()));

        let name = source.file_name().unwrap().to_string_lossy();
        if let Some(marker) = &self.fail_marker
            && name.contains(marker.as_str())
        {
            return Err(ConversionError::Failed {
                path: source.to_path_buf(),
                code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        std::fs::copy(source, destination)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// One scripted answer to an interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Select(Option<usize>),
    Input(String),
    Confirm(bool),
}

/// Prompter answering from a fixed script, in order
///
/// Panics when a question does not match the next answer or the script has
/// run out; every prompt text is recorded.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, prompt: &str) -> Answer {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted answer for {:?}", prompt))
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&mut self, prompt: &str, items: &[String], _default: usize) -> Result<Option<usize>> {
        match self.next(prompt) {
            Answer::Select(choice) => {
                if let Some(i) = choice {
                    assert!(i < items.len(), "{:?} has no item {}: {:?}", prompt, i, items);
                }
                Ok(choice)
            }
            other => panic!("{:?} is a menu, scripted {:?}", prompt, other),
        }
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        match self.next(prompt) {
            Answer::Input(text) => Ok(text),
            other => panic!("{:?} asks for text, scripted {:?}", prompt, other),
        }
    }

    fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool> {
        match self.next(prompt) {
            Answer::Confirm(yes) => Ok(yes),
            other => panic!("{:?} is a yes/no question, scripted {:?}", prompt, other),
        }
    }
}

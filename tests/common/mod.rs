//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use cleantitle::adapters::{CatalogError, CatalogSource, ModelError, TitleModel, TranscriptSource};
use cleantitle::core::{
    BackfillOrchestrator, CheckpointStore, GeneratorSettings, PipelineSettings, RetryPolicy,
    TitleGenerator, TitleStore,
};
use cleantitle::domain::{CatalogItem, CatalogPage, Cursor};

/// Build a catalog item with the given duration
pub fn item(id: &str, title: &str, duration: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("Description of {}", title),
        published_at: None,
        raw_duration: duration.to_string(),
    }
}

/// Build a page with an optional continuation cursor
pub fn page(items: Vec<CatalogItem>, next: Option<&str>) -> CatalogPage {
    CatalogPage {
        items,
        next_cursor: next.map(Cursor::new),
    }
}

/// Catalog serving scripted pages keyed by request cursor
#[derive(Default)]
pub struct ScriptedCatalog {
    pages: HashMap<Option<String>, CatalogPage>,
    failing: HashSet<Option<String>>,
    requests: Mutex<Vec<Option<String>>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `page` when fetched with `cursor`
    pub fn with_page(mut self, cursor: Option<&str>, page: CatalogPage) -> Self {
        self.pages.insert(cursor.map(str::to_string), page);
        self
    }

    /// Fail with an API error when fetched with `cursor`
    pub fn failing_at(mut self, cursor: Option<&str>) -> Self {
        self.failing.insert(cursor.map(str::to_string));
        self
    }

    /// Cursors requested so far, in order
    pub fn requests(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<CatalogPage, CatalogError> {
        let key = cursor.map(|c| c.as_str().to_string());
        self.requests.lock().unwrap().push(key.clone());

        if self.failing.contains(&key) {
            return Err(CatalogError::Api {
                status: 403,
                message: "quotaExceeded".to_string(),
            });
        }

        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }
}

/// Transcript source that never has captions
pub struct NoTranscripts;

#[async_trait]
impl TranscriptSource for NoTranscripts {
    async fn fetch(&self, _video_id: &str) -> Option<String> {
        None
    }
}

/// Model replying per original title, falling back to a valid default reply
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<HashMap<String, VecDeque<Result<String, ModelError>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw reply for the item with `title`
    pub fn reply(self, title: &str, text: &str) -> Self {
        self.push(title, Ok(text.to_string()))
    }

    /// Queue an API error for the item with `title`
    pub fn error(self, title: &str) -> Self {
        self.push(
            title,
            Err(ModelError::Api {
                status: 529,
                message: "overloaded".to_string(),
            }),
        )
    }

    fn push(self, title: &str, reply: Result<String, ModelError>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(title.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Original titles of every request, in order (one entry per attempt)
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn original_title(user: &str) -> String {
    user.lines()
        .next()
        .and_then(|line| line.strip_prefix("Original title: "))
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl TitleModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system: &str, user: &str) -> Result<String, ModelError> {
        let title = original_title(user);
        self.calls.lock().unwrap().push(title.clone());

        let queued = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&title)
            .and_then(|queue| queue.pop_front());

        match queued {
            Some(reply) => reply,
            None => Ok(format!(r#"{{"tag": "Misc", "title": "Clean {}"}}"#, title)),
        }
    }
}

/// Forwards to a shared model so tests can inspect calls after the run
pub struct SharedModel(pub std::sync::Arc<ScriptedModel>);

#[async_trait]
impl TitleModel for SharedModel {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError> {
        self.0.complete(system, user).await
    }
}

/// Forwards to a shared catalog so tests can inspect requests after the run
pub struct SharedCatalog(pub std::sync::Arc<ScriptedCatalog>);

#[async_trait]
impl CatalogSource for SharedCatalog {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<CatalogPage, CatalogError> {
        self.0.fetch_page(cursor).await
    }
}

/// Store and checkpoint files inside a temp directory
pub struct StateDir {
    pub temp: TempDir,
}

impl StateDir {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn titles_path(&self) -> PathBuf {
        self.temp.path().join("titles.json")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.temp.path().join("backfill_progress.json")
    }

    pub fn titles(&self) -> TitleStore {
        TitleStore::new(self.titles_path())
    }

    pub fn checkpoints(&self) -> CheckpointStore {
        CheckpointStore::new(self.checkpoint_path())
    }
}

/// Generator with one retry and no delay
pub fn fast_generator(model: std::sync::Arc<ScriptedModel>) -> TitleGenerator {
    TitleGenerator::new(
        Box::new(SharedModel(model)),
        GeneratorSettings {
            retry: RetryPolicy::fixed(1, std::time::Duration::ZERO),
            ..GeneratorSettings::default()
        },
    )
}

/// Orchestrator over the fakes with no pacing delays
pub fn orchestrator(
    state: &StateDir,
    catalog: std::sync::Arc<ScriptedCatalog>,
    model: std::sync::Arc<ScriptedModel>,
    batch_size: usize,
) -> BackfillOrchestrator {
    BackfillOrchestrator::new(
        Box::new(SharedCatalog(catalog)),
        Box::new(NoTranscripts),
        fast_generator(model),
        state.titles(),
        state.checkpoints(),
        PipelineSettings::without_delays(batch_size),
    )
}

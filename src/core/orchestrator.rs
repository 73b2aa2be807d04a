//! Resumable backfill orchestrator.
//!
//! Walks the catalog page by page, filters each page, enriches items that are
//! not yet stored and checkpoints at batch and page boundaries. Fatal catalog
//! errors and operator interrupts both end in a save of everything enriched
//! so far.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{CatalogError, CatalogSource, TranscriptSource};
use crate::domain::{
    CatalogItem, Checkpoint, Cursor, EnrichmentResult, PipelinePhase, RunOutcome, RunReport,
    RunStats,
};

use super::checkpoint::CheckpointStore;
use super::filter::filter_page;
use super::generator::TitleGenerator;
use super::store::{TitleMap, TitleStore};

/// Pacing and batching for a run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Successful insertions between checkpoints
    pub batch_size: usize,

    /// Pause after each attempted item
    pub item_delay: Duration,

    /// Pause after each batch checkpoint
    pub batch_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            item_delay: Duration::from_millis(500),
            batch_delay: Duration::from_secs(2),
        }
    }
}

impl PipelineSettings {
    /// No pauses; useful for tests and dry environments
    pub fn without_delays(batch_size: usize) -> Self {
        Self {
            batch_size,
            item_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
        }
    }
}

/// Fatal errors that end a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

/// Why traversal stopped early
enum Stop {
    Interrupted,
    Fatal(PipelineError),
}

impl From<PipelineError> for Stop {
    fn from(e: PipelineError) -> Self {
        Stop::Fatal(e)
    }
}

/// Mutable state owned by one run
struct RunState {
    run_id: Uuid,
    phase: PipelinePhase,
    titles: TitleMap,
    /// Cursor of the page boundary last consumed
    page_cursor: Option<Cursor>,
    processed: u64,
    since_checkpoint: usize,
    stats: RunStats,
}

impl RunState {
    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::at(self.page_cursor.clone(), self.processed)
    }

    fn report(&self, outcome: RunOutcome) -> RunReport {
        RunReport {
            run_id: self.run_id,
            outcome,
            processed_total: self.processed,
            store_size: self.titles.len(),
            stats: self.stats.clone(),
        }
    }

    fn enter(&mut self, phase: PipelinePhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "Phase transition");
            self.phase = phase;
        }
    }
}

/// Backfill orchestrator
pub struct BackfillOrchestrator {
    catalog: Box<dyn CatalogSource>,
    transcripts: Box<dyn TranscriptSource>,
    generator: TitleGenerator,
    titles: TitleStore,
    checkpoints: CheckpointStore,
    settings: PipelineSettings,
}

impl BackfillOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        catalog: Box<dyn CatalogSource>,
        transcripts: Box<dyn TranscriptSource>,
        generator: TitleGenerator,
        titles: TitleStore,
        checkpoints: CheckpointStore,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            catalog,
            transcripts,
            generator,
            titles,
            checkpoints,
            settings,
        }
    }

    /// Run the backfill until the catalog is exhausted, a fatal error occurs
    /// or `shutdown` flips to `true`.
    ///
    /// Fatal errors and interrupts are reported through the returned
    /// [`RunReport`]; `Err` means state could not be loaded or saved.
    #[instrument(skip_all, fields(source = %self.catalog.name()))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4();

        let titles = self.titles.load().await?;
        let checkpoint = self.checkpoints.load().await?;

        info!(
            %run_id,
            stored = titles.len(),
            processed = checkpoint.processed_count,
            cursor = ?checkpoint.cursor,
            titles = %self.titles.path().display(),
            checkpoint = %self.checkpoints.path().display(),
            "Starting backfill"
        );

        let resume_cursor = if checkpoint.complete {
            info!("Previous traversal finished; starting a new pass from the first page");
            None
        } else {
            checkpoint.cursor
        };

        let mut state = RunState {
            run_id,
            phase: PipelinePhase::Init,
            titles,
            page_cursor: resume_cursor,
            processed: checkpoint.processed_count,
            since_checkpoint: 0,
            stats: RunStats::default(),
        };

        match self.traverse(&mut state, &mut shutdown).await {
            Ok(()) => self.finish(&mut state).await,
            Err(Stop::Interrupted) => {
                info!("Interrupted by user");
                self.abort(&mut state, RunOutcome::Interrupted).await
            }
            Err(Stop::Fatal(e)) => {
                error!(error = %e, "Fatal error, saving progress");
                self.abort(
                    &mut state,
                    RunOutcome::Failed {
                        error: e.to_string(),
                    },
                )
                .await
            }
        }
    }

    /// Page loop: fetch, process, checkpoint
    async fn traverse(
        &self,
        state: &mut RunState,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), Stop> {
        let mut cursor = state.page_cursor.clone();

        loop {
            state.enter(PipelinePhase::FetchingPage);
            let page = interruptible(shutdown, self.catalog.fetch_page(cursor.as_ref()))
                .await
                .ok_or(Stop::Interrupted)?
                .map_err(PipelineError::from)?;

            state.stats.pages += 1;
            state.page_cursor = cursor.clone();

            if page.is_terminal() {
                info!("No more videos to process");
                return Ok(());
            }

            info!(
                items = page.items.len(),
                cursor = ?cursor,
                "Fetched catalog page"
            );

            self.process_page(state, page.items, shutdown).await?;
            self.checkpoint(state).await?;

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    info!("Reached end of uploads");
                    return Ok(());
                }
            }
        }
    }

    /// Filter a page and enrich every eligible item not yet stored
    async fn process_page(
        &self,
        state: &mut RunState,
        items: Vec<CatalogItem>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), Stop> {
        state.enter(PipelinePhase::ProcessingItems);

        let filtered = filter_page(items);
        state.stats.filtered += filtered.dropped as u64;

        for item in filtered.kept {
            if state.titles.contains_key(&item.id) {
                debug!(video_id = %item.id, "Skipping (already processed)");
                state.stats.already_stored += 1;
                continue;
            }

            info!(video_id = %item.id, title = %item.title, "Processing");

            match interruptible(shutdown, self.enrich(&item))
                .await
                .ok_or(Stop::Interrupted)?
            {
                Some(result) => {
                    state.processed += 1;
                    state.since_checkpoint += 1;
                    state.stats.enriched += 1;
                    info!(
                        video_id = %item.id,
                        processed = state.processed,
                        "Generated: {}",
                        result.clean_title
                    );
                    state.titles.insert(item.id.clone(), result);
                }
                None => {
                    state.stats.failed += 1;
                    warn!(video_id = %item.id, "Generation failed, skipping");
                }
            }

            pause(shutdown, self.settings.item_delay).await?;

            if state.since_checkpoint >= self.settings.batch_size.max(1) {
                self.checkpoint(state).await?;
                pause(shutdown, self.settings.batch_delay).await?;
                state.enter(PipelinePhase::ProcessingItems);
            }
        }

        Ok(())
    }

    /// Transcript + generation for one item
    async fn enrich(&self, item: &CatalogItem) -> Option<EnrichmentResult> {
        let transcript = self.transcripts.fetch(&item.id).await;
        if transcript.is_none() {
            debug!(video_id = %item.id, "No transcript, falling back to description");
        }

        let parsed = self
            .generator
            .generate(&item.title, transcript.as_deref(), &item.description)
            .await?;

        Some(EnrichmentResult::new(&parsed, item.title.as_str()))
    }

    /// Persist store and checkpoint at the current page boundary
    async fn checkpoint(&self, state: &mut RunState) -> Result<(), Stop> {
        state.enter(PipelinePhase::Checkpointing);

        self.titles
            .save(&state.titles)
            .await
            .map_err(PipelineError::from)?;
        self.checkpoints
            .save(&state.checkpoint())
            .await
            .map_err(PipelineError::from)?;
        state.since_checkpoint = 0;

        info!(processed = state.processed, "Saved progress");
        Ok(())
    }

    /// Final save after the last page
    async fn finish(&self, state: &mut RunState) -> Result<RunReport, PipelineError> {
        state.enter(PipelinePhase::Done);

        self.titles.save(&state.titles).await?;
        self.checkpoints
            .save(&Checkpoint::finished(state.processed))
            .await?;

        info!(
            stored = state.titles.len(),
            enriched = state.stats.enriched,
            "Backfill complete"
        );
        Ok(state.report(RunOutcome::Completed))
    }

    /// Save whatever has been accumulated and report how the run ended
    async fn abort(
        &self,
        state: &mut RunState,
        outcome: RunOutcome,
    ) -> Result<RunReport, PipelineError> {
        state.enter(PipelinePhase::Aborting);

        self.titles.save(&state.titles).await?;
        self.checkpoints.save(&state.checkpoint()).await?;

        info!(processed = state.processed, "Progress saved. Run again to resume.");
        Ok(state.report(outcome))
    }
}

/// Race `fut` against the shutdown signal; `None` when shutdown won
async fn interruptible<F: Future>(
    shutdown: &mut watch::Receiver<bool>,
    fut: F,
) -> Option<F::Output> {
    if *shutdown.borrow() {
        return None;
    }

    tokio::select! {
        biased;
        _ = wait_for_shutdown(shutdown) => None,
        out = fut => Some(out),
    }
}

/// Resolve once the shutdown flag is set; never resolves if the sender is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Interruptible rate-limit pause
async fn pause(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> Result<(), Stop> {
    if delay.is_zero() {
        return if *shutdown.borrow() {
            Err(Stop::Interrupted)
        } else {
            Ok(())
        };
    }

    interruptible(shutdown, tokio::time::sleep(delay))
        .await
        .ok_or(Stop::Interrupted)
}

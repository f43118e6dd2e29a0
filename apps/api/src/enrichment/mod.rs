//! Background AI-enrichment worker.
//!
//! A single long-lived task scans the catalog for games with missing or
//! incomplete AI data and fills them in via the [`GameAi`] client, with a
//! bounded per-game retry loop. Both suspension points (between cycles and
//! between retry attempts) observe the shutdown signal.

pub mod store;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::ai::{GameAi, GameAiData};
use store::{CacheState, EnrichmentStore, EnrichmentTarget};

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    /// Time between scan-and-process cycles.
    pub scan_interval: Duration,
    /// AI-call attempts per game per cycle.
    pub max_attempts: u32,
    /// Fixed delay between failed attempts.
    pub retry_delay: Duration,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(300),
            max_attempts: 3,
            retry_delay: Duration::from_secs(30),
        }
    }
}

/// What happened to one game during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Cache was already complete; no writes performed.
    Skipped,
    /// AI data generated and persisted.
    Enriched,
    /// All attempts failed; the game stays eligible for the next scan.
    Failed,
    /// Shutdown was signalled mid-processing.
    Cancelled,
}

pub struct EnrichmentWorker {
    store: Arc<dyn EnrichmentStore>,
    ai: Arc<dyn GameAi>,
    settings: EnrichmentSettings,
    shutdown: watch::Receiver<bool>,
}

impl EnrichmentWorker {
    pub fn new(
        store: Arc<dyn EnrichmentStore>,
        ai: Arc<dyn GameAi>,
        settings: EnrichmentSettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            ai,
            settings,
            shutdown,
        }
    }

    /// Runs scan-and-process cycles for the lifetime of the process.
    /// A failed cycle is logged and never terminates the worker.
    pub async fn run(mut self) {
        info!("Enrichment worker started");

        loop {
            if let Err(e) = self.run_cycle().await {
                error!("Enrichment cycle failed: {e:#}");
            }
            if self.wait(self.settings.scan_interval).await {
                break;
            }
        }

        info!("Enrichment worker stopped");
    }

    /// One scan-and-process cycle. A failure in one game's processing does
    /// not abort the cycle for the others.
    async fn run_cycle(&mut self) -> anyhow::Result<()> {
        let targets = self.store.games_needing_enrichment().await?;
        if targets.is_empty() {
            debug!("No games need AI data");
            return Ok(());
        }

        info!("Found {} games needing AI data", targets.len());

        for target in targets {
            if *self.shutdown.borrow() {
                break;
            }
            match self.process_game(&target).await {
                Ok(outcome) => debug!("Game {}: {outcome:?}", target.name),
                Err(e) => warn!(
                    "Error saving AI data for game {}, leaving for next cycle: {e:#}",
                    target.name
                ),
            }
        }

        Ok(())
    }

    /// Processes a single game. Idempotent: a game whose cache is already
    /// complete is skipped without any writes.
    async fn process_game(&mut self, target: &EnrichmentTarget) -> anyhow::Result<ProcessOutcome> {
        // Re-check against the freshest cache; the scan snapshot may be stale.
        if self.store.cache_state(target.game_id).await? == CacheState::Complete {
            debug!("Game {} already has AI data, skipping", target.name);
            return Ok(ProcessOutcome::Skipped);
        }

        info!("Processing AI data for game: {}", target.name);

        let mut data: Option<GameAiData> = None;
        for attempt in 1..=self.settings.max_attempts {
            match self.ai.generate_game_data(&target.name).await {
                Ok(d) if d.summary.trim().is_empty() => {
                    warn!(
                        "Attempt {attempt}: empty summary for game {}, treating as failure",
                        target.name
                    );
                }
                Ok(d) => {
                    data = Some(d);
                    break;
                }
                Err(e) => {
                    warn!(
                        "Attempt {attempt} failed to generate AI data for game {}: {e}",
                        target.name
                    );
                }
            }

            if attempt < self.settings.max_attempts && self.wait(self.settings.retry_delay).await {
                return Ok(ProcessOutcome::Cancelled);
            }
        }

        let Some(mut data) = data else {
            error!(
                "Failed to generate AI data for game {} after {} attempts",
                target.name, self.settings.max_attempts
            );
            return Ok(ProcessOutcome::Failed);
        };

        sanitize(&mut data);
        self.store.persist_enrichment(target.game_id, &data).await?;

        info!("Successfully saved AI data for game: {}", target.name);
        Ok(ProcessOutcome::Enriched)
    }

    /// Cancellable sleep. Returns true when shutdown was signalled.
    async fn wait(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            changed = self.shutdown.changed() => {
                changed.is_err() || *self.shutdown.borrow()
            }
        }
    }
}

/// Clamps AI-returned numerics into their valid ranges before storage.
fn sanitize(data: &mut GameAiData) {
    if !(1.0..=5.0).contains(&data.complexity) {
        warn!(
            "Clamping out-of-range complexity {} into [1.0, 5.0]",
            data.complexity
        );
        data.complexity = data.complexity.clamp(1.0, 5.0);
    }
    if data.time_to_setup_minutes < 0 {
        warn!(
            "Clamping negative setup time {} to 0",
            data.time_to_setup_minutes
        );
        data.time_to_setup_minutes = 0;
    }
    if data.average_playtime_minutes.is_some_and(|p| p < 0) {
        data.average_playtime_minutes = Some(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    fn sample_data() -> GameAiData {
        GameAiData {
            complexity: 2.5,
            time_to_setup_minutes: 10,
            average_playtime_minutes: Some(45),
            summary: "A tense area-control duel.".to_string(),
            game_type: Some("Strategy".to_string()),
            theme: Some("Fantasy".to_string()),
            player_interaction_level: Some("High".to_string()),
            skill_requirements: None,
            randomness_level: None,
            complexity_tier: Some("Medium".to_string()),
            target_audience: None,
            replayability_score: Some(8),
            learning_curve: None,
            typical_play_style: None,
        }
    }

    /// In-memory store: enrichment targets are games whose state is not
    /// complete; persisting marks a game complete.
    struct FakeStore {
        games: Vec<EnrichmentTarget>,
        states: Mutex<HashMap<Uuid, CacheState>>,
        persisted: Mutex<Vec<(Uuid, GameAiData)>>,
        fail_persist: bool,
    }

    impl FakeStore {
        fn with_games(games: Vec<(Uuid, &str)>) -> Self {
            let states = games
                .iter()
                .map(|(id, _)| (*id, CacheState::Missing))
                .collect();
            Self {
                games: games
                    .into_iter()
                    .map(|(game_id, name)| EnrichmentTarget {
                        game_id,
                        name: name.to_string(),
                    })
                    .collect(),
                states: Mutex::new(states),
                persisted: Mutex::new(Vec::new()),
                fail_persist: false,
            }
        }

        fn set_state(&self, game_id: Uuid, state: CacheState) {
            self.states.lock().unwrap().insert(game_id, state);
        }

        fn persisted(&self) -> Vec<(Uuid, GameAiData)> {
            self.persisted.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl EnrichmentStore for FakeStore {
        async fn games_needing_enrichment(&self) -> anyhow::Result<Vec<EnrichmentTarget>> {
            let states = self.states.lock().unwrap();
            Ok(self
                .games
                .iter()
                .filter(|t| states.get(&t.game_id) != Some(&CacheState::Complete))
                .cloned()
                .collect())
        }

        async fn cache_state(&self, game_id: Uuid) -> anyhow::Result<CacheState> {
            Ok(*self
                .states
                .lock()
                .unwrap()
                .get(&game_id)
                .unwrap_or(&CacheState::Missing))
        }

        async fn persist_enrichment(&self, game_id: Uuid, data: &GameAiData) -> anyhow::Result<()> {
            if self.fail_persist {
                anyhow::bail!("simulated write failure");
            }
            self.persisted.lock().unwrap().push((game_id, data.clone()));
            self.set_state(game_id, CacheState::Complete);
            Ok(())
        }
    }

    /// Scripted AI client: pops responses in order, then keeps succeeding.
    struct FakeAi {
        calls: AtomicUsize,
        script: Mutex<VecDeque<Result<GameAiData, AiError>>>,
    }

    impl FakeAi {
        fn scripted(script: Vec<Result<GameAiData, AiError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl GameAi for FakeAi {
        async fn generate_game_data(&self, _game_name: &str) -> Result<GameAiData, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(sample_data()))
        }

        async fn answer_question(
            &self,
            _game_name: &str,
            _question: &str,
            _history: &[crate::llm_client::ChatMessage],
        ) -> Result<String, AiError> {
            Err(AiError::Client("not used in these tests".to_string()))
        }
    }

    fn test_settings() -> EnrichmentSettings {
        EnrichmentSettings {
            scan_interval: Duration::from_secs(300),
            max_attempts: 3,
            retry_delay: Duration::from_secs(30),
        }
    }

    fn worker(
        store: Arc<FakeStore>,
        ai: Arc<FakeAi>,
    ) -> (EnrichmentWorker, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (
            EnrichmentWorker::new(store, ai, test_settings(), rx),
            tx,
        )
    }

    fn target(game_id: Uuid) -> EnrichmentTarget {
        EnrichmentTarget {
            game_id,
            name: "Terraforming Mars".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_succeeds_on_third_attempt() {
        let game_id = Uuid::new_v4();
        let store = Arc::new(FakeStore::with_games(vec![(game_id, "Terraforming Mars")]));
        let ai = Arc::new(FakeAi::scripted(vec![
            Err(AiError::Client("timeout".to_string())),
            Err(AiError::Client("timeout".to_string())),
            Ok(sample_data()),
        ]));
        let (mut worker, _tx) = worker(store.clone(), ai.clone());

        let started = tokio::time::Instant::now();
        let outcome = worker.process_game(&target(game_id)).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::Enriched);
        assert_eq!(ai.calls(), 3);
        // Two failed attempts, two fixed retry delays.
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61),
            "elapsed was {elapsed:?}"
        );
        assert_eq!(store.persisted().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let game_id = Uuid::new_v4();
        let store = Arc::new(FakeStore::with_games(vec![(game_id, "Root")]));
        let ai = Arc::new(FakeAi::scripted(vec![
            Err(AiError::Client("500".to_string())),
            Err(AiError::Client("500".to_string())),
            Err(AiError::Client("500".to_string())),
        ]));
        let (mut worker, _tx) = worker(store.clone(), ai.clone());

        let outcome = worker.process_game(&target(game_id)).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::Failed);
        assert_eq!(ai.calls(), 3);
        assert!(store.persisted().is_empty());
        // Still eligible for the next scan.
        assert_eq!(
            store.cache_state(game_id).await.unwrap(),
            CacheState::Missing
        );
    }

    #[tokio::test]
    async fn complete_cache_skips_without_ai_call() {
        let game_id = Uuid::new_v4();
        let store = Arc::new(FakeStore::with_games(vec![(game_id, "Azul")]));
        store.set_state(game_id, CacheState::Complete);
        let ai = Arc::new(FakeAi::scripted(vec![]));
        let (mut worker, _tx) = worker(store.clone(), ai.clone());

        let outcome = worker.process_game(&target(game_id)).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::Skipped);
        assert_eq!(ai.calls(), 0);
        assert!(store.persisted().is_empty());
    }

    #[tokio::test]
    async fn second_cycle_performs_no_further_writes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let store = Arc::new(FakeStore::with_games(vec![(a, "Wingspan"), (b, "Cascadia")]));
        let ai = Arc::new(FakeAi::scripted(vec![]));
        let (mut worker, _tx) = worker(store.clone(), ai.clone());

        worker.run_cycle().await.unwrap();
        assert_eq!(store.persisted().len(), 2);
        assert_eq!(ai.calls(), 2);

        worker.run_cycle().await.unwrap();
        assert_eq!(store.persisted().len(), 2, "second cycle must be a no-op");
        assert_eq!(ai.calls(), 2);
    }

    #[tokio::test]
    async fn clamps_out_of_range_values_before_persisting() {
        let game_id = Uuid::new_v4();
        let store = Arc::new(FakeStore::with_games(vec![(game_id, "Gloomhaven")]));
        let mut wild = sample_data();
        wild.complexity = 9.5;
        wild.time_to_setup_minutes = -10;
        wild.average_playtime_minutes = Some(-5);
        let ai = Arc::new(FakeAi::scripted(vec![Ok(wild)]));
        let (mut worker, _tx) = worker(store.clone(), ai);

        let outcome = worker.process_game(&target(game_id)).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Enriched);

        let persisted = store.persisted();
        assert_eq!(persisted[0].1.complexity, 5.0);
        assert_eq!(persisted[0].1.time_to_setup_minutes, 0);
        assert_eq!(persisted[0].1.average_playtime_minutes, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_summary_counts_as_a_failed_attempt() {
        let game_id = Uuid::new_v4();
        let store = Arc::new(FakeStore::with_games(vec![(game_id, "Catan")]));
        let mut blank = sample_data();
        blank.summary = "   ".to_string();
        let ai = Arc::new(FakeAi::scripted(vec![Ok(blank), Ok(sample_data())]));
        let (mut worker, _tx) = worker(store.clone(), ai.clone());

        let outcome = worker.process_game(&target(game_id)).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::Enriched);
        assert_eq!(ai.calls(), 2);
        assert_eq!(store.persisted().len(), 1);
        assert!(!store.persisted()[0].1.summary.trim().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_game_does_not_abort_the_cycle() {
        let bad = Uuid::new_v4();
        let good = Uuid::new_v4();
        let store = Arc::new(FakeStore::with_games(vec![(bad, "Bad"), (good, "Good")]));
        let ai = Arc::new(FakeAi::scripted(vec![
            Err(AiError::Client("boom".to_string())),
            Err(AiError::Client("boom".to_string())),
            Err(AiError::Client("boom".to_string())),
            Ok(sample_data()),
        ]));
        let (mut worker, _tx) = worker(store.clone(), ai.clone());

        worker.run_cycle().await.unwrap();

        let persisted = store.persisted();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].0, good);
        assert_eq!(ai.calls(), 4);
    }

    #[tokio::test]
    async fn persistence_error_leaves_game_eligible() {
        let game_id = Uuid::new_v4();
        let mut store = FakeStore::with_games(vec![(game_id, "Dune")]);
        store.fail_persist = true;
        let store = Arc::new(store);
        let ai = Arc::new(FakeAi::scripted(vec![]));
        let (mut worker, _tx) = worker(store.clone(), ai);

        assert!(worker.process_game(&target(game_id)).await.is_err());
        assert_eq!(
            store.cache_state(game_id).await.unwrap(),
            CacheState::Missing
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_retry_delay() {
        let game_id = Uuid::new_v4();
        let store = Arc::new(FakeStore::with_games(vec![(game_id, "Scythe")]));
        let ai = Arc::new(FakeAi::scripted(vec![Err(AiError::Client(
            "down".to_string(),
        ))]));
        let (mut worker, tx) = worker(store.clone(), ai.clone());

        tx.send(true).unwrap();
        let started = tokio::time::Instant::now();
        let outcome = worker.process_game(&target(game_id)).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::Cancelled);
        assert_eq!(ai.calls(), 1);
        assert!(store.persisted().is_empty());
        // The 30s retry delay must not have elapsed.
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sanitize_clamps_only_out_of_range_values() {
        let mut ok = sample_data();
        sanitize(&mut ok);
        assert_eq!(ok.complexity, 2.5);
        assert_eq!(ok.time_to_setup_minutes, 10);

        let mut low = sample_data();
        low.complexity = 0.2;
        sanitize(&mut low);
        assert_eq!(low.complexity, 1.0);
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use augur_agents::{build_model, InferenceRunner};
use augur_store::{retention_cutoff, Store};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::fetcher::{ingest_cycle, MarketDataFetcher};
use crate::schedule::{StatusBoard, Trigger};

pub const INGESTION_JOB: &str = "ingestion";
pub const INFERENCE_JOB: &str = "inference";
pub const RETENTION_JOB: &str = "retention";

/// The loader daemon. Drives ingestion, inference and retention on their own
/// schedules until cancelled.
pub struct Daemon {
    config: LoaderConfig,
    store: Arc<Store>,
    fetcher: Arc<MarketDataFetcher>,
    runner: Arc<InferenceRunner>,
    status: StatusBoard,
    cancel: CancellationToken,
}

impl Daemon {
    pub fn new(
        config: LoaderConfig,
        store: Arc<Store>,
        fetcher: MarketDataFetcher,
        runner: InferenceRunner,
    ) -> Self {
        Self {
            config,
            store,
            fetcher: Arc::new(fetcher),
            runner: Arc::new(runner),
            status: StatusBoard::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Wire the production collaborators: SQLite store, Binance, the configured model.
    ///
    /// Configuration problems (including a missing model credential) surface
    /// here, before any job starts.
    pub fn from_config(config: LoaderConfig) -> Result<Self, LoaderError> {
        config.validate()?;
        if config.exchange.name != config.store.primary_exchange {
            tracing::warn!(
                exchange = %config.exchange.name,
                primary = %config.store.primary_exchange,
                "Ingested exchange differs from the one personas read"
            );
        }

        let store = Arc::new(Store::open(&config.store.sqlite_path)?);
        let model = build_model(&config.agents)?;
        let fetcher = MarketDataFetcher::from_config(&config.exchange)?;
        let runner = InferenceRunner::from_config(
            &config.agents,
            &config.store.primary_exchange,
            model,
            Arc::clone(&store),
        );
        Ok(Self::new(config, store, fetcher, runner))
    }

    /// Returns a CancellationToken that can be used to trigger shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> StatusBoard {
        self.status.clone()
    }

    /// Run all jobs until cancelled.
    pub async fn run(&self) -> Result<(), LoaderError> {
        tracing::info!(
            ingestion_symbols = self.config.ingestion.symbols.len(),
            inference_symbols = self.config.inference.symbols.len(),
            personas = self.runner.persona_count(),
            "Augur loader daemon starting"
        );

        let mut join_set = tokio::task::JoinSet::new();

        // Ingestion: fixed interval, once immediately on startup
        {
            let fetcher = Arc::clone(&self.fetcher);
            let store = Arc::clone(&self.store);
            let symbols = Arc::new(self.config.ingestion.symbols.clone());
            let trigger = Trigger::Every(Duration::from_secs(self.config.ingestion.interval_seconds));
            join_set.spawn(job_loop(
                INGESTION_JOB,
                trigger,
                true,
                self.status.clone(),
                self.cancel.clone(),
                move || {
                    let fetcher = Arc::clone(&fetcher);
                    let store = Arc::clone(&store);
                    let symbols = Arc::clone(&symbols);
                    async move {
                        let report = ingest_cycle(&fetcher, &store, &symbols).await;
                        if report.symbols_ok == 0 && report.symbols_failed > 0 {
                            return Err(LoaderError::Job(format!(
                                "all {} symbols failed",
                                report.symbols_failed
                            )));
                        }
                        Ok(())
                    }
                },
            ));
        }

        // Inference: every N hours at minute 0
        {
            let runner = Arc::clone(&self.runner);
            let symbols = Arc::new(self.config.inference.symbols.clone());
            let trigger = Trigger::EveryHours {
                hours: self.config.inference.every_hours,
            };
            join_set.spawn(job_loop(
                INFERENCE_JOB,
                trigger,
                false,
                self.status.clone(),
                self.cancel.clone(),
                move || {
                    let runner = Arc::clone(&runner);
                    let symbols = Arc::clone(&symbols);
                    async move {
                        let report = runner.run(&symbols).await;
                        if report.recorded == 0 && report.failed > 0 {
                            return Err(LoaderError::Job(format!(
                                "run {} recorded nothing",
                                report.run_id
                            )));
                        }
                        Ok(())
                    }
                },
            ));
        }

        // Retention: daily at HH:MM UTC
        {
            let store = Arc::clone(&self.store);
            let days = self.config.retention.days;
            let trigger = Trigger::DailyAt {
                hour: self.config.retention.hour,
                minute: self.config.retention.minute,
            };
            join_set.spawn(job_loop(
                RETENTION_JOB,
                trigger,
                false,
                self.status.clone(),
                self.cancel.clone(),
                move || {
                    let store = Arc::clone(&store);
                    async move { run_retention(&store, days) }
                },
            ));
        }

        tracing::info!("All loader jobs scheduled");

        // Wait for all tasks to complete (they run until cancelled)
        while join_set.join_next().await.is_some() {}

        for (job, status) in self.status.snapshot() {
            tracing::info!(
                job = %job,
                runs = status.runs,
                failures = status.failures,
                last_outcome = ?status.last_outcome,
                "Job summary"
            );
        }
        tracing::info!("Augur loader daemon stopped");
        Ok(())
    }
}

/// One retention sweep against `store`.
pub fn run_retention(store: &Store, days: u32) -> Result<(), LoaderError> {
    let cutoff = retention_cutoff(Utc::now(), days);
    let report = store.sweep(cutoff)?;
    tracing::info!(
        job = RETENTION_JOB,
        cutoff = %cutoff,
        candles_deleted = report.candles_deleted,
        predictions_deactivated = report.predictions_deactivated,
        "Retention sweep complete"
    );
    Ok(())
}

/// Drive one job on `trigger` until `cancel` fires.
///
/// Each run is its own task, so a panic is contained and reported as a
/// failure. Runs are awaited before the next wait starts: a job never
/// overlaps itself.
pub async fn job_loop<F, Fut>(
    name: &'static str,
    trigger: Trigger,
    run_at_start: bool,
    status: StatusBoard,
    cancel: CancellationToken,
    job: F,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), LoaderError>> + Send + 'static,
{
    if run_at_start && !cancel.is_cancelled() {
        run_once(name, &status, &job).await;
    }

    loop {
        let now = Utc::now();
        status.idle(name, trigger.next_fire(now));
        let delay = trigger.delay_from(now);

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(job = name, "Job loop shutting down");
                break;
            }
            _ = tokio::time::sleep(delay) => {
                run_once(name, &status, &job).await;
            }
        }
    }
}

async fn run_once<F, Fut>(name: &'static str, status: &StatusBoard, job: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), LoaderError>> + Send + 'static,
{
    status.started(name);
    tracing::debug!(job = name, "Job started");

    match tokio::spawn(job()).await {
        Ok(Ok(())) => status.finished(name, Ok(())),
        Ok(Err(e)) => {
            tracing::error!(job = name, error = %e, "Job failed");
            status.finished(name, Err(e.to_string()));
        }
        Err(e) => {
            tracing::error!(job = name, error = %e, "Job panicked");
            status.finished(name, Err(format!("panicked: {e}")));
        }
    }
}

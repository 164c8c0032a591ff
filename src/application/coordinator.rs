//! Probe coordinator
//!
//! Runs one probe per catalog layer on a fixed pool of worker tasks. Workers
//! pull jobs from a shared queue and push `(index, result)` pairs into a
//! channel; the coordinator is the only consumer of that channel and folds the
//! results into the final report once every layer has been accounted for.

use chrono::{Local, NaiveDate};
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::application::resolver::UrlResolver;
use crate::domain::layer::Body;
use crate::domain::pattern::PatternTable;
use crate::domain::probe_result::ProbeResult;
use crate::domain::report::{ValidationOutcome, ValidationReport};
use crate::domain::services::Prober;
use crate::domain::value_objects::{Credential, LayerName, redact_with};

/// Extra time granted on top of the per-probe timeout before the coordinator
/// gives up on a probe itself
pub const PROBE_DEADLINE_GRACE: Duration = Duration::from_millis(250);

/// Detail recorded for layers whose probe panicked or whose worker stopped
/// without reporting
pub const LOST_RESULT_DETAIL: &str = "probe task ended without reporting a result";

/// Run-wide probe settings, fixed at construction
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Maximum number of probes in flight at any instant
    pub concurrency_limit: usize,
    pub timeout_per_probe: Duration,
    pub credential: Option<Credential>,
}

impl ProbeSettings {
    #[must_use]
    pub fn new(concurrency_limit: usize, timeout_per_probe: Duration) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
            timeout_per_probe,
            credential: None,
        }
    }

    #[must_use]
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Hard deadline the coordinator applies around a single probe
    #[must_use]
    pub fn probe_deadline(&self) -> Duration {
        self.timeout_per_probe + PROBE_DEADLINE_GRACE
    }
}

/// One unit of work: a layer and the URL already resolved for it
#[derive(Debug, Clone)]
pub struct ProbeJob {
    pub index: usize,
    pub layer: LayerName,
    pub url: String,
}

/// Progress notification sent after each completed probe
#[derive(Debug, Clone)]
pub struct ProbeProgress {
    pub completed: usize,
    pub total: usize,
    pub result: ProbeResult,
}

/// Dispatches probes for a whole catalog and aggregates the outcome
pub struct ProbeCoordinator {
    resolver: UrlResolver,
    prober: Arc<dyn Prober>,
    settings: ProbeSettings,
    progress_tx: Option<mpsc::UnboundedSender<ProbeProgress>>,
}

impl ProbeCoordinator {
    pub fn new(
        table: Arc<PatternTable>,
        body: Body,
        prober: Arc<dyn Prober>,
        settings: ProbeSettings,
    ) -> Self {
        let resolver = UrlResolver::new(table, settings.credential.clone(), body);
        Self {
            resolver,
            prober,
            settings,
            progress_tx: None,
        }
    }

    /// Also forward every progress notification to `tx`
    #[must_use]
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<ProbeProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    #[must_use]
    pub const fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    #[must_use]
    pub const fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probes every layer using today's local date for time tokens
    pub async fn run_all(&self, layers: &[LayerName]) -> ValidationOutcome {
        self.run_all_on(layers, Local::now().date_naive()).await
    }

    /// Probes every layer as of `today` and returns the aggregate.
    ///
    /// Exactly one result is recorded per input layer, in input order.
    pub async fn run_all_on(&self, layers: &[LayerName], today: NaiveDate) -> ValidationOutcome {
        let total = layers.len();
        if total == 0 {
            info!("No layers to validate");
            return ValidationReport::fold(Local::now().fixed_offset(), Vec::new());
        }

        let jobs: VecDeque<ProbeJob> = layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                let url = self.resolver.resolve(layer, today);
                debug!(
                    "Resolved {} -> {}",
                    layer,
                    redact_with(self.settings.credential.as_ref(), &url)
                );
                ProbeJob {
                    index,
                    layer: layer.clone(),
                    url,
                }
            })
            .collect();

        let worker_count = self.settings.concurrency_limit.min(total);
        info!(
            "🚀 Validating {} layers with {} workers (timeout {:?})",
            total, worker_count, self.settings.timeout_per_probe
        );

        let queue = Arc::new(Mutex::new(jobs));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(usize, ProbeResult)>();
        let deadline = self.settings.probe_deadline();

        let handles: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&self.prober),
                    deadline,
                    result_tx.clone(),
                ))
            })
            .collect();
        // Workers hold the only senders, so the channel closes when they are all gone
        drop(result_tx);

        let mut slots: Vec<Option<ProbeResult>> = vec![None; total];
        let mut completed = 0;

        while completed < total {
            let Some((index, result)) = result_rx.recv().await else {
                break;
            };
            match slots.get_mut(index) {
                Some(slot) if slot.is_none() => {
                    completed += 1;
                    self.report_progress(completed, total, &result);
                    *slot = Some(result);
                }
                Some(_) => warn!("Duplicate result for {} ignored", result.layer),
                None => warn!("Result index {} out of range ignored", index),
            }
        }

        for (worker_id, joined) in futures::future::join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = joined {
                error!("Probe worker {} terminated abnormally: {}", worker_id, e);
            }
        }

        let mut results = Vec::with_capacity(total);
        for (slot, layer) in slots.into_iter().zip(layers) {
            let result = match slot {
                Some(result) => result,
                None => {
                    let result = ProbeResult::error(layer.clone(), LOST_RESULT_DETAIL);
                    completed += 1;
                    self.report_progress(completed, total, &result);
                    result
                }
            };
            results.push(result);
        }

        let outcome = ValidationReport::fold(Local::now().fixed_offset(), results);
        info!(
            "✅ Validation finished: {} valid, {} invalid",
            outcome.report.valid_layers, outcome.report.invalid_layers
        );
        outcome
    }

    fn report_progress(&self, completed: usize, total: usize, result: &ProbeResult) {
        if result.valid {
            info!("[{}/{}] ✓ VALID: {}", completed, total, result.layer);
        } else {
            info!(
                "[{}/{}] ✗ INVALID ({}): {}",
                completed, total, result.status_code, result.layer
            );
        }

        if let Some(tx) = &self.progress_tx {
            // A dropped observer does not affect the run
            let _ = tx.send(ProbeProgress {
                completed,
                total,
                result: result.clone(),
            });
        }
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<ProbeJob>>>,
    prober: Arc<dyn Prober>,
    deadline: Duration,
    result_tx: mpsc::UnboundedSender<(usize, ProbeResult)>,
) {
    debug!("Probe worker {} started", worker_id);

    loop {
        let job = { queue.lock().await.pop_front() };
        let Some(job) = job else {
            break;
        };

        let probe = AssertUnwindSafe(prober.probe(&job.layer, &job.url)).catch_unwind();
        let result = match tokio::time::timeout(deadline, probe).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                error!("Probe for {} panicked", job.layer);
                ProbeResult::error(job.layer.clone(), LOST_RESULT_DETAIL)
            }
            Err(_) => {
                warn!("Probe for {} exceeded {:?}", job.layer, deadline);
                ProbeResult::timeout(job.layer.clone())
            }
        };

        if result_tx.send((job.index, result)).is_err() {
            break;
        }
    }

    debug!("Probe worker {} finished", worker_id);
}

//! Background persistence of finalized itineraries.
//!
//! Handlers hand jobs to a bounded queue and never wait for the write. A
//! fixed set of workers drains the queue. When the queue is full or already
//! closed the job is dropped and reported, so every itinerary is written at
//! most once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use tutur_core::domain::itinerary::Itinerary;
use tutur_core::identifier::GuideId;
use tutur_db::repositories::ItineraryRepository;

#[derive(Clone, Debug, PartialEq)]
pub struct PersistenceJob {
    pub id: GuideId,
    pub client_id: Option<String>,
    pub itinerary: Itinerary,
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistenceOutcome {
    Stored,
    Failed(String),
    Dropped(String),
}

/// Completion hook invoked once per submitted job.
pub trait PersistenceObserver: Send + Sync {
    fn on_complete(&self, job: &PersistenceJob, outcome: &PersistenceOutcome);
}

/// Default observer: every outcome becomes a structured log event.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PersistenceObserver for TracingObserver {
    fn on_complete(&self, job: &PersistenceJob, outcome: &PersistenceOutcome) {
        match outcome {
            PersistenceOutcome::Stored => info!(
                event_name = "guide.persistence.stored",
                correlation_id = %job.correlation_id,
                guide_id = %job.id,
                "itinerary stored"
            ),
            PersistenceOutcome::Failed(reason) => error!(
                event_name = "guide.persistence.failed",
                correlation_id = %job.correlation_id,
                guide_id = %job.id,
                error = %reason,
                "itinerary could not be stored"
            ),
            PersistenceOutcome::Dropped(reason) => warn!(
                event_name = "guide.persistence.dropped",
                correlation_id = %job.correlation_id,
                guide_id = %job.id,
                reason = %reason,
                "itinerary was not queued for storage"
            ),
        }
    }
}

pub struct PersistenceQueue {
    sender: mpsc::Sender<PersistenceJob>,
    observer: Arc<dyn PersistenceObserver>,
    workers: Vec<JoinHandle<()>>,
}

/// Cheap handle given to request handlers. It does not keep the queue open:
/// once the owning [`PersistenceQueue`] shuts down, submissions are dropped.
#[derive(Clone)]
pub struct PersistenceHandle {
    sender: mpsc::WeakSender<PersistenceJob>,
    observer: Arc<dyn PersistenceObserver>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    Queued,
    Full,
    Closed,
}

impl PersistenceQueue {
    pub fn start(
        repository: Arc<dyn ItineraryRepository>,
        observer: Arc<dyn PersistenceObserver>,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let repository = Arc::clone(&repository);
                let observer = Arc::clone(&observer);
                tokio::spawn(run_worker(worker, receiver, repository, observer))
            })
            .collect();

        Self { sender, observer, workers }
    }

    pub fn handle(&self) -> PersistenceHandle {
        PersistenceHandle { sender: self.sender.downgrade(), observer: Arc::clone(&self.observer) }
    }

    /// Closes the queue, lets the workers finish what is already queued and
    /// waits for them up to `grace`.
    pub async fn shutdown(self, grace: Duration) {
        let Self { sender, workers, .. } = self;
        drop(sender);

        let pending = workers.len();
        let joined = tokio::time::timeout(grace, async move {
            for worker in workers {
                if let Err(join_error) = worker.await {
                    error!(
                        event_name = "guide.persistence.worker_panicked",
                        correlation_id = "shutdown",
                        error = %join_error,
                        "persistence worker terminated abnormally"
                    );
                }
            }
        })
        .await;

        match joined {
            Ok(()) => info!(
                event_name = "guide.persistence.drained",
                correlation_id = "shutdown",
                workers = pending,
                "persistence queue drained"
            ),
            Err(_) => warn!(
                event_name = "guide.persistence.drain_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "persistence queue did not drain before the grace period elapsed"
            ),
        }
    }
}

impl PersistenceHandle {
    pub fn submit(&self, job: PersistenceJob) -> Submission {
        let Some(sender) = self.sender.upgrade() else {
            self.observer
                .on_complete(&job, &PersistenceOutcome::Dropped("persistence queue is closed".into()));
            return Submission::Closed;
        };

        match sender.try_send(job) {
            Ok(()) => Submission::Queued,
            Err(mpsc::error::TrySendError::Full(job)) => {
                self.observer
                    .on_complete(&job, &PersistenceOutcome::Dropped("persistence queue is full".into()));
                Submission::Full
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                self.observer
                    .on_complete(&job, &PersistenceOutcome::Dropped("persistence queue is closed".into()));
                Submission::Closed
            }
        }
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<PersistenceJob>>>,
    repository: Arc<dyn ItineraryRepository>,
    observer: Arc<dyn PersistenceObserver>,
) {
    loop {
        let next = { receiver.lock().await.recv().await };
        let Some(job) = next else {
            break;
        };

        let outcome =
            match repository.insert(&job.id, job.client_id.as_deref(), &job.itinerary).await {
                Ok(()) => PersistenceOutcome::Stored,
                Err(error) => PersistenceOutcome::Failed(error.to_string()),
            };
        observer.on_complete(&job, &outcome);
    }

    tracing::debug!(event_name = "guide.persistence.worker_stopped", worker, "worker stopped");
}

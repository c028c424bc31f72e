//! Bounded exponential-backoff retry for reconciliation attempts.
//!
//! Every attempt is an explicit [`RetryJob`] message. The webhook receiver schedules the first attempt with no delay;
//! the [`RetryCoordinator`] runs it and, if it failed with a retryable error and the attempt budget isn't spent,
//! schedules the next one after `base_delay * 2^(attempt-1)`. Scheduling goes through the [`RetryScheduler`] trait so
//! the state machine can be tested without waiting on real timers.
//!
//! Retries live in memory only. If the process restarts, scheduled retries are lost.
use std::{fmt::Display, sync::Arc, time::Duration};

use log::*;
use reconciliation_engine::ReconcileOutcome;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::{
    config::RetryConfig,
    pipeline::{PipelineError, ReconciliationAttempt},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryJob {
    pub payment_id: String,
    pub tenant_id: String,
    /// 1-based attempt number
    pub attempt: u32,
}

impl RetryJob {
    pub fn first<S: Into<String>>(payment_id: S, tenant_id: S) -> Self {
        Self { payment_id: payment_id.into(), tenant_id: tenant_id.into(), attempt: 1 }
    }

    pub fn next(&self) -> Self {
        Self { attempt: self.attempt + 1, ..self.clone() }
    }
}

impl Display for RetryJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "payment {} for tenant {} (attempt {})", self.payment_id, self.tenant_id, self.attempt)
    }
}

/// Runs `job` after `delay`. Implementations must return immediately.
pub trait RetryScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, job: RetryJob);
}

/// The production scheduler: a tokio timer per delayed job, feeding an unbounded queue that the retry worker drains.
#[derive(Clone)]
pub struct RetryQueue {
    sender: UnboundedSender<RetryJob>,
}

impl RetryQueue {
    pub fn new() -> (Self, UnboundedReceiver<RetryJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl RetryScheduler for RetryQueue {
    fn schedule(&self, delay: Duration, job: RetryJob) {
        if delay.is_zero() {
            if let Err(e) = self.sender.send(job) {
                error!("🔁️ Retry queue is closed. Dropping {}", e.0);
            }
            return;
        }
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = sender.send(job) {
                error!("🔁️ Retry queue is closed. Dropping {}", e.0);
            }
        });
    }
}

/// What became of a single attempt.
#[derive(Debug)]
pub enum RetryDecision {
    Completed(ReconcileOutcome),
    /// The attempt failed and the next one has been scheduled after the given delay.
    Rescheduled(Duration),
    /// The attempt failed with an error that retrying can't fix.
    Abandoned(PipelineError),
    /// The last permitted attempt failed.
    GaveUp(PipelineError),
}

pub struct RetryCoordinator<A> {
    attempt: A,
    scheduler: Arc<dyn RetryScheduler>,
    policy: RetryConfig,
}

impl<A> RetryCoordinator<A>
where A: ReconciliationAttempt
{
    pub fn new(attempt: A, scheduler: Arc<dyn RetryScheduler>, policy: RetryConfig) -> Self {
        Self { attempt, scheduler, policy }
    }

    pub fn policy(&self) -> RetryConfig {
        self.policy
    }

    /// Runs one attempt for `job` and decides what happens next.
    pub async fn process(&self, job: RetryJob) -> RetryDecision {
        debug!("🔁️ Reconciling {job}");
        let err = match self.attempt.attempt(&job.payment_id, &job.tenant_id).await {
            Ok(outcome) => {
                info!("🔁️ Payment {} reconciled on attempt {}. {outcome}", job.payment_id, job.attempt);
                return RetryDecision::Completed(outcome);
            },
            Err(e) => e,
        };
        if !err.is_retryable() {
            warn!("🔁️ Giving up on {job} without retrying. {err}");
            return RetryDecision::Abandoned(err);
        }
        if job.attempt >= self.policy.max_attempts {
            error!(
                "🔁️ Reconciliation of payment {} for tenant {} failed after {} attempts. The notification is dropped. \
                 Last error: {err}",
                job.payment_id, job.tenant_id, job.attempt
            );
            return RetryDecision::GaveUp(err);
        }
        let delay = self.policy.backoff(job.attempt);
        warn!("🔁️ Attempt failed for {job}. {err}. Retrying in {}ms", delay.as_millis());
        self.scheduler.schedule(delay, job.next());
        RetryDecision::Rescheduled(delay)
    }
}

/// Starts the retry worker. Each job is handled in its own task, so a slow gateway call for one payment never holds up
/// another. Do not await the returned JoinHandle; it runs until the queue closes.
pub fn start_retry_worker<A>(
    mut receiver: UnboundedReceiver<RetryJob>,
    coordinator: RetryCoordinator<A>,
) -> JoinHandle<()>
where
    A: ReconciliationAttempt,
{
    let coordinator = Arc::new(coordinator);
    tokio::spawn(async move {
        info!("🕰️ Retry worker started");
        while let Some(job) = receiver.recv().await {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                let _decision = coordinator.process(job).await;
            });
        }
        info!("🕰️ Retry queue closed. Retry worker stopped");
    })
}

#[cfg(test)]
mod test {
    use mockall::predicate::eq;

    use super::*;
    use crate::endpoint_tests::{
        helpers::paid_order,
        mocks::{MockRetryScheduler, ScriptedAttempt},
    };

    fn policy() -> RetryConfig {
        RetryConfig { max_attempts: 3, base_delay: Duration::from_millis(2000) }
    }

    #[tokio::test]
    async fn backoff_schedule_then_give_up() {
        let _ = env_logger::try_init();
        let attempt = ScriptedAttempt::always(PipelineError::OrderNotFound("O1".into()));
        let mut scheduler = MockRetryScheduler::new();
        scheduler
            .expect_schedule()
            .with(eq(Duration::from_millis(2000)), eq(RetryJob { attempt: 2, ..RetryJob::first("123", "t1") }))
            .times(1)
            .return_const(());
        scheduler
            .expect_schedule()
            .with(eq(Duration::from_millis(4000)), eq(RetryJob { attempt: 3, ..RetryJob::first("123", "t1") }))
            .times(1)
            .return_const(());
        let coordinator = RetryCoordinator::new(attempt.clone(), Arc::new(scheduler), policy());

        let job = RetryJob::first("123", "t1");
        let decision = coordinator.process(job.clone()).await;
        assert!(matches!(decision, RetryDecision::Rescheduled(d) if d == Duration::from_millis(2000)));
        let job = job.next();
        let decision = coordinator.process(job.clone()).await;
        assert!(matches!(decision, RetryDecision::Rescheduled(d) if d == Duration::from_millis(4000)));
        let decision = coordinator.process(job.next()).await;
        assert!(matches!(decision, RetryDecision::GaveUp(PipelineError::OrderNotFound(_))));
        assert_eq!(attempt.calls(), 3);
    }

    #[tokio::test]
    async fn configuration_errors_are_not_retried() {
        let _ = env_logger::try_init();
        let attempt = ScriptedAttempt::always(PipelineError::Configuration("no token".into()));
        let mut scheduler = MockRetryScheduler::new();
        scheduler.expect_schedule().never();
        let coordinator = RetryCoordinator::new(attempt.clone(), Arc::new(scheduler), policy());
        let decision = coordinator.process(RetryJob::first("123", "t1")).await;
        assert!(matches!(decision, RetryDecision::Abandoned(PipelineError::Configuration(_))));
        assert_eq!(attempt.calls(), 1);
    }

    #[tokio::test]
    async fn success_after_a_transient_failure() {
        let attempt = ScriptedAttempt::new(vec![
            Err(PipelineError::Gateway("connection reset".into())),
            Ok(ReconcileOutcome::Paid(paid_order("O1"))),
        ]);
        let mut scheduler = MockRetryScheduler::new();
        scheduler.expect_schedule().times(1).return_const(());
        let coordinator = RetryCoordinator::new(attempt.clone(), Arc::new(scheduler), policy());
        let job = RetryJob::first("sim_O1_approved_1", "t1");
        assert!(matches!(coordinator.process(job.clone()).await, RetryDecision::Rescheduled(_)));
        assert!(matches!(coordinator.process(job.next()).await, RetryDecision::Completed(ReconcileOutcome::Paid(_))));
    }

    #[tokio::test]
    async fn single_attempt_budget() {
        let attempt = ScriptedAttempt::always(PipelineError::Database("database is locked".into()));
        let mut scheduler = MockRetryScheduler::new();
        scheduler.expect_schedule().never();
        let policy = RetryConfig { max_attempts: 1, ..policy() };
        let coordinator = RetryCoordinator::new(attempt, Arc::new(scheduler), policy);
        assert!(matches!(coordinator.process(RetryJob::first("1", "t1")).await, RetryDecision::GaveUp(_)));
    }

    #[tokio::test]
    async fn queue_delivers_jobs_in_delay_order() {
        let (queue, mut receiver) = RetryQueue::new();
        queue.schedule(Duration::from_millis(60), RetryJob::first("late", "t1"));
        queue.schedule(Duration::ZERO, RetryJob::first("now", "t1"));
        queue.schedule(Duration::from_millis(20), RetryJob::first("soon", "t1"));
        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(receiver.recv().await.unwrap().payment_id);
        }
        assert_eq!(received, vec!["now", "soon", "late"]);
    }

    #[tokio::test]
    async fn worker_retries_through_the_queue() {
        let _ = env_logger::try_init();
        let attempt = ScriptedAttempt::new(vec![
            Err(PipelineError::OrderNotFound("O1".into())),
            Ok(ReconcileOutcome::Paid(paid_order("O1"))),
        ]);
        let (queue, receiver) = RetryQueue::new();
        let policy = RetryConfig { max_attempts: 3, base_delay: Duration::from_millis(5) };
        let coordinator = RetryCoordinator::new(attempt.clone(), Arc::new(queue.clone()), policy);
        let worker = start_retry_worker(receiver, coordinator);
        queue.schedule(Duration::ZERO, RetryJob::first("sim_O1_approved_1", "t1"));
        for _ in 0..100 {
            if attempt.calls() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(attempt.calls(), 2);
        assert!(attempt.is_exhausted());
        worker.abort();
    }
}

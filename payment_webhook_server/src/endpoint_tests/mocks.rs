use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use mockall::mock;
use reconciliation_engine::ReconcileOutcome;

use crate::{
    notifications::{MailError, MailTemplate, Mailer},
    pipeline::{PipelineError, ReconciliationAttempt},
    retry::{RetryJob, RetryScheduler},
};

mock! {
    pub RetryScheduler {}
    impl RetryScheduler for RetryScheduler {
        fn schedule(&self, delay: Duration, job: RetryJob);
    }
}

/// Plays back a fixed list of results, one per attempt. Once the script runs out, every attempt fails with the
/// fallback error.
#[derive(Clone)]
pub struct ScriptedAttempt {
    script: Arc<Mutex<VecDeque<Result<ReconcileOutcome, PipelineError>>>>,
    fallback: PipelineError,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAttempt {
    pub fn new(script: Vec<Result<ReconcileOutcome, PipelineError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback: PipelineError::Gateway("script exhausted".into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn always(err: PipelineError) -> Self {
        Self { fallback: err, ..Self::new(vec![]) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_exhausted(&self) -> bool {
        self.script.lock().unwrap().is_empty()
    }
}

impl ReconciliationAttempt for ScriptedAttempt {
    async fn attempt(&self, _payment_id: &str, _tenant_id: &str) -> Result<ReconcileOutcome, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(self.fallback.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub template: MailTemplate,
    pub context: serde_json::Value,
}

/// Records every message. Addresses listed in `failing` produce a [`MailError`] instead.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
    failing: Vec<String>,
}

impl RecordingMailer {
    pub fn failing_for(address: &str) -> Self {
        Self { failing: vec![address.to_string()], ..Default::default() }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, template: MailTemplate, context: serde_json::Value) -> Result<(), MailError> {
        if self.failing.iter().any(|a| a == to) {
            return Err(MailError::DeliveryFailed(format!("mailbox {to} is unavailable")));
        }
        self.sent.lock().unwrap().push(SentMail { to: to.to_string(), template, context });
        Ok(())
    }
}

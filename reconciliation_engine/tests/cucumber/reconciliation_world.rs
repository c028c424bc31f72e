use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::Duration,
};

use cucumber::World;
use log::*;
use reconciliation_engine::{
    events::{EventHandlers, EventHooks, OrderPaidEvent},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ReconcileOutcome,
    ReconciliationApi,
    ReconciliationError,
    SqliteDatabase,
};
use tokio::time::{sleep, Instant};

#[derive(Default, Debug, World)]
pub struct ReconciliationWorld {
    pub system: Option<ReconciliationSystem>,
    pub last_result: Option<Result<ReconcileOutcome, ReconciliationError>>,
}

#[derive(Debug)]
pub struct ReconciliationSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub api: ReconciliationApi<SqliteDatabase>,
    pub paid_events: Arc<Mutex<Vec<OrderPaidEvent>>>,
}

impl ReconciliationWorld {
    pub fn system(&self) -> &ReconciliationSystem {
        self.system.as_ref().expect("System not initialised. Start with 'Given a fresh install'")
    }
}

impl ReconciliationSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        debug!("Created database: {url}");
        let paid_events = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::clone(&paid_events);
        let mut hooks = EventHooks::default();
        hooks.on_order_paid(move |ev| {
            let events = Arc::clone(&events);
            Box::pin(async move {
                info!("🪝️ Order {} paid", ev.order.id);
                events.lock().unwrap().push(ev);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let handlers = EventHandlers::new(10, hooks);
        let api = ReconciliationApi::new(db.clone(), handlers.producers());
        let _ = handlers.start_handlers();
        Self { db_path: url, db, api, paid_events }
    }

    /// Waits (briefly) for the hook to have fired `expected` times and returns the actual count.
    pub async fn paid_event_count(&self, expected: usize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(2);
        while self.paid_events.lock().unwrap().len() < expected && Instant::now() < deadline {
            sleep(Duration::from_millis(20)).await;
        }
        // Give any stragglers a chance to show up
        sleep(Duration::from_millis(100)).await;
        self.paid_events.lock().unwrap().len()
    }
}

use std::{future::Future, pin::Pin, sync::Arc};

use log::debug;
use tokio::task::JoinHandle;

use crate::events::{EventHandler, EventProducer, Handler, OrderPaidEvent};

/// The publishing side of the hooks, handed to the [`crate::ReconciliationApi`].
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
}

impl EventProducers {
    pub fn is_empty(&self) -> bool {
        self.order_paid_producer.is_empty()
    }
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per registered hook. Each task ends once all of its producers have been dropped.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        if let Some(handler) = self.on_order_paid {
            debug!("📬️ Starting on_order_paid hook");
            handles.push(tokio::spawn(handler.start_handler()));
        }
        handles
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }
}

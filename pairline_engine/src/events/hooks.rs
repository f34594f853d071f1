use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PaymentSettledEvent, SessionEndedEvent, SessionStartedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub session_started_producer: Vec<EventProducer<SessionStartedEvent>>,
    pub session_ended_producer: Vec<EventProducer<SessionEndedEvent>>,
    pub payment_settled_producer: Vec<EventProducer<PaymentSettledEvent>>,
}

pub struct EventHandlers {
    pub on_session_started: Option<EventHandler<SessionStartedEvent>>,
    pub on_session_ended: Option<EventHandler<SessionEndedEvent>>,
    pub on_payment_settled: Option<EventHandler<PaymentSettledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_session_started = hooks.on_session_started.map(|f| EventHandler::new(buffer_size, f));
        let on_session_ended = hooks.on_session_ended.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_settled = hooks.on_payment_settled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_session_started, on_session_ended, on_payment_settled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_session_started {
            result.session_started_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_session_ended {
            result.session_ended_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_settled {
            result.payment_settled_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_session_started {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_session_ended {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_payment_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_session_started: Option<Handler<SessionStartedEvent>>,
    pub on_session_ended: Option<Handler<SessionEndedEvent>>,
    pub on_payment_settled: Option<Handler<PaymentSettledEvent>>,
}

impl EventHooks {
    pub fn on_session_started<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SessionStartedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_session_started = Some(Arc::new(f));
        self
    }

    pub fn on_session_ended<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SessionEndedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_session_ended = Some(Arc::new(f));
        self
    }

    pub fn on_payment_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_settled = Some(Arc::new(f));
        self
    }
}

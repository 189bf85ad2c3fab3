//! Scripted transport and recording sleeper shared by unit tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::{HttpRequest, HttpResponse, Sleep, Transport, TransportError};

type Scripted = std::result::Result<HttpResponse, TransportError>;

#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: Option<Scripted>,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    /// Replays `script` in order, then repeats the last entry.
    pub(crate) fn new(script: Vec<Scripted>) -> Self {
        let fallback = script.last().cloned();
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            sent: Arc::default(),
        }
    }

    pub(crate) fn always(response: Scripted) -> Self {
        Self::new(vec![response])
    }

    pub(crate) fn json(body: serde_json::Value) -> Self {
        Self::always(Ok(HttpResponse::new(200, body.to_string())))
    }

    pub(crate) fn calls(&self) -> usize {
        self.sent.lock().expect("sent mutex").len()
    }

    pub(crate) fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().expect("sent mutex").clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest, _timeout: Duration) -> Scripted {
        self.sent.lock().expect("sent mutex").push(request.clone());
        let next = self.script.lock().expect("script mutex").pop_front();
        next.or_else(|| self.fallback.clone())
            .unwrap_or(Err(TransportError::Other("script exhausted".to_owned())))
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingSleep {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleep {
    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.delays.lock().expect("delays mutex").clone()
    }
}

#[async_trait]
impl Sleep for RecordingSleep {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().expect("delays mutex").push(duration);
    }
}

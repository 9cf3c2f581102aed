//! Scripted `Transport` for unit tests.
//!
//! Replies are queued in the order requests will arrive. A held reply parks
//! the request until the test releases it, which is how tests decide the
//! order in which concurrent calls resolve.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Transport};

type Reply = Result<HttpResponse, TransportError>;

enum Scripted {
    Ready(Reply),
    Held(oneshot::Receiver<Reply>),
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    replies: Mutex<VecDeque<Scripted>>,
}

pub(crate) fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.push(Scripted::Ready(Ok(response(status, body))));
    }

    pub(crate) fn fail(&self, error: TransportError) {
        self.push(Scripted::Ready(Err(error)));
    }

    /// Queues a reply that is only delivered once the sender is used.
    pub(crate) fn hold(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.push(Scripted::Held(rx));
        tx
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn push(&self, scripted: Scripted) {
        self.replies.lock().unwrap().push_back(scripted);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Held(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Other("held reply dropped".to_string()))),
            None => panic!("no scripted reply for {url}"),
        }
    }
}

//! In-process transport with scripted replies.
//!
//! Replies are consumed in FIFO order, one per request. A reply can be held behind a
//! [`StubGate`] so the request stays pending until the caller releases it, which is how
//! interleavings of overlapping list loads are reproduced off-browser.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::services::transport::{ApiRequest, ApiResponse, Transport};

#[derive(Default)]
struct GateState {
    open: bool,
    waker: Option<Waker>,
}

/// Release handle for a held reply.
#[derive(Clone, Default)]
pub struct StubGate {
    state: Rc<RefCell<GateState>>,
}

impl StubGate {
    /// Let the held reply resolve.
    pub fn open(&self) {
        let waker = {
            let mut state = self.state.borrow_mut();
            state.open = true;
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn wait(&self) -> GateWait {
        GateWait {
            state: Rc::clone(&self.state),
        }
    }
}

struct GateWait {
    state: Rc<RefCell<GateState>>,
}

impl Future for GateWait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.state.borrow_mut();
        if state.open {
            Poll::Ready(())
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

struct Reply {
    outcome: ApiResult<ApiResponse>,
    gate: Option<StubGate>,
}

#[derive(Default)]
struct StubState {
    replies: VecDeque<Reply>,
    requests: Vec<ApiRequest>,
}

/// Scripted [`Transport`]; clones share the same script and request log.
#[derive(Clone, Default)]
pub struct StubTransport {
    state: Rc<RefCell<StubState>>,
}

impl StubTransport {
    /// Transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply.
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(json_response(status, &body)), None);
        self
    }

    /// Queue a raw text reply.
    pub fn push_text(&self, status: u16, body: impl Into<String>) -> &Self {
        self.push(
            Ok(ApiResponse {
                status,
                body: body.into(),
            }),
            None,
        );
        self
    }

    /// Queue a transport-level failure.
    pub fn push_failure(&self, error: ApiError) -> &Self {
        self.push(Err(error), None);
        self
    }

    /// Queue a JSON reply that stays pending until the returned gate is opened.
    pub fn push_held_json(&self, status: u16, body: Value) -> StubGate {
        let gate = StubGate::default();
        self.push(Ok(json_response(status, &body)), Some(gate.clone()));
        gate
    }

    /// Every request sent so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.borrow().requests.clone()
    }

    /// Number of requests sent so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.borrow().requests.len()
    }

    /// Replies not yet consumed.
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        self.state.borrow().replies.len()
    }

    fn push(&self, outcome: ApiResult<ApiResponse>, gate: Option<StubGate>) {
        self.state
            .borrow_mut()
            .replies
            .push_back(Reply { outcome, gate });
    }
}

fn json_response(status: u16, body: &Value) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
    }
}

#[async_trait(?Send)]
impl Transport for StubTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let reply = {
            let mut state = self.state.borrow_mut();
            state.requests.push(request);
            state.replies.pop_front()
        };
        let Some(reply) = reply else {
            return Err(ApiError::Network {
                detail: "no scripted reply".to_string(),
            });
        };
        if let Some(gate) = reply.gate {
            gate.wait().await;
        }
        reply.outcome
    }
}

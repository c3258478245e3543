//! Recording exchange double.
//!
//! Responses are registered per `(method, path)`. Each call pops the next
//! queued response; the last one is sticky so a single registration serves
//! repeated calls.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde_json::Value;

use crate::client::{BoxFuture, ExchangeApi};
use crate::error::{RegistryError, RegistryResult};

/// HTTP verb of a recorded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One call as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum MockResponse {
    Json(Value),
    Status(u16, String),
    NetworkDown,
}

/// Mock exchange for testing.
#[derive(Debug, Default)]
pub struct MockExchange {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<(HttpMethod, String), VecDeque<MockResponse>>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON answer for `GET path`.
    pub fn on_get(&self, path: &str, response: Value) {
        self.push(HttpMethod::Get, path, MockResponse::Json(response));
    }

    /// Queue a JSON answer for `POST path`.
    pub fn on_post(&self, path: &str, response: Value) {
        self.push(HttpMethod::Post, path, MockResponse::Json(response));
    }

    /// Queue an error status for `method path`.
    pub fn reject(&self, method: HttpMethod, path: &str, status: u16, body: &str) {
        self.push(method, path, MockResponse::Status(status, body.to_string()));
    }

    /// Queue a transport failure for `method path`.
    pub fn fail_network(&self, method: HttpMethod, path: &str) {
        self.push(method, path, MockResponse::NetworkDown);
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls made to `path`.
    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn push(&self, method: HttpMethod, path: &str, response: MockResponse) {
        self.responses
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    fn respond(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> RegistryResult<Value> {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body,
        });

        let response = {
            let mut responses = self.responses.lock();
            match responses.get_mut(&(method, path.to_string())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(MockResponse::Json(value)) => Ok(value),
            Some(MockResponse::Status(status, body)) => Err(RegistryError::Http { status, body }),
            Some(MockResponse::NetworkDown) => {
                Err(RegistryError::Network(format!("{method:?} {path}: connection refused")))
            }
            None => Err(RegistryError::Http {
                status: 404,
                body: format!("no mock registered for {method:?} {path}"),
            }),
        }
    }
}

impl ExchangeApi for MockExchange {
    fn get<'a>(
        &'a self,
        path: &'a str,
        query: &'a [(String, String)],
    ) -> BoxFuture<'a, RegistryResult<Value>> {
        let result = self.respond(HttpMethod::Get, path, query, None);
        Box::pin(async move { result })
    }

    fn post<'a>(&'a self, path: &'a str, body: Value) -> BoxFuture<'a, RegistryResult<Value>> {
        let result = self.respond(HttpMethod::Post, path, &[], Some(body));
        Box::pin(async move { result })
    }
}

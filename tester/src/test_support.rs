use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode};

use crate::client::{ApiResponse, ApiTransport, TransportError};

pub(crate) const BASE: &str = "http://api.test/api/v1";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(StatusCode, Vec<u8>),
    Fail,
}

/// In-memory transport answering from per-route queues. The last reply
/// queued for a route repeats once the others are used up; unknown routes
/// get a 404.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    recorded: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(self, method: Method, path: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn reply(self, method: Method, path: &str, status: u16, body: serde_json::Value) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(method, path, Reply::Respond(status, body.to_string().into_bytes()))
    }

    pub(crate) fn reply_raw(self, method: Method, path: &str, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(method, path, Reply::Respond(status, body.as_bytes().to_vec()))
    }

    pub(crate) fn fail(self, method: Method, path: &str) -> Self {
        self.push(method, path, Reply::Fail)
    }

    pub(crate) fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub(crate) fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    pub(crate) fn total(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiTransport for ScriptedApi {
    async fn send(&self, request: Request<Full<Bytes>>) -> Result<ApiResponse, TransportError> {
        let (parts, body) = request.into_parts();
        let header = |name: HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let body = body.collect().await.unwrap().to_bytes();
        let recorded = RecordedRequest {
            method: parts.method.clone(),
            path: parts.uri.path().to_owned(),
            content_type: header(CONTENT_TYPE),
            authorization: header(AUTHORIZATION),
            body: String::from_utf8_lossy(&body).into_owned(),
        };
        let key = (recorded.method.clone(), recorded.path.clone());
        self.recorded.lock().unwrap().push(recorded);

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(Reply::Respond(status, body)) => Ok(ApiResponse { status, body }),
            Some(Reply::Fail) => Err(TransportError::Send("connection refused".into())),
            None => Ok(ApiResponse {
                status: StatusCode::NOT_FOUND,
                body: Vec::new(),
            }),
        }
    }
}

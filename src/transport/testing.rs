//! Scripted transport for engine and client tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{Result, SyncError};
use crate::domain::WikiConfig;
use crate::transport::{Operation, Request, Response, Transport};

#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<Operation, VecDeque<Response>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub wiki: String,
    pub page: Option<String>,
    pub revision: Option<String>,
    pub oldtime: Option<i64>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request of `operation`.
    pub fn push(&self, operation: Operation, response: Response) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, wiki: &WikiConfig, request: &Request<'_>) -> Result<Response> {
        let operation = request.operation();
        let (page, revision, oldtime) = match request {
            Request::GetPage { page } | Request::History { page } => {
                (Some(page.to_string()), None, None)
            }
            Request::Post(form) | Request::Preview(form) => {
                (Some(form.page.clone()), Some(form.revision.clone()), form.oldtime)
            }
            _ => (None, None, None),
        };
        self.calls.lock().unwrap().push(RecordedCall {
            operation,
            wiki: wiki.name.clone(),
            page,
            revision,
            oldtime,
        });

        self.responses
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| SyncError::Other(format!("no scripted response for {:?}", operation)))
    }
}

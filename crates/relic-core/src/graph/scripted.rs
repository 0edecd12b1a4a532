use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::Value;

use super::{GraphBackend, GraphErrorEntry, GraphErrors, Operation};
use crate::credentials::Caller;
use crate::error::{RelicError, Result};

/// One call seen by a [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub variables: Value,
    pub caller: Caller,
}

#[derive(Debug, Clone)]
enum Reply {
    Data(Value),
    Errors(GraphErrors),
    Transport(String),
}

/// In-memory upstream for tests.
///
/// Replies are queued per operation and consumed in order; the last reply
/// of a queue stays in place and answers every further call. Calls to an
/// operation with no script fail as an upstream fault.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<HashMap<Operation, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, operation: Operation, data: Value) -> Self {
        self.push(operation, Reply::Data(data))
    }

    /// Reply with a single structured error carrying `code`, as a 200 response would.
    pub fn reply_error(self, operation: Operation, code: &str, message: &str) -> Self {
        let errors = GraphErrors::new(200, vec![GraphErrorEntry::with_code(message, code)]);
        self.push(operation, Reply::Errors(errors))
    }

    pub fn reply_errors(self, operation: Operation, errors: GraphErrors) -> Self {
        self.push(operation, Reply::Errors(errors))
    }

    pub fn fail(self, operation: Operation, message: &str) -> Self {
        self.push(operation, Reply::Transport(message.to_string()))
    }

    fn push(self, operation: Operation, reply: Reply) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.entry(operation).or_default().push_back(reply);
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Operations called so far, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.calls().into_iter().map(|c| c.operation).collect()
    }

    fn next_reply(&self, operation: Operation) -> Option<Reply> {
        let mut replies = self.replies.lock().ok()?;
        let queue = replies.get_mut(&operation)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl GraphBackend for ScriptedBackend {
    async fn execute(
        &self,
        operation: Operation,
        variables: Value,
        caller: &Caller,
    ) -> Result<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                operation,
                variables,
                caller: caller.clone(),
            });
        }

        match self.next_reply(operation) {
            Some(Reply::Data(data)) => Ok(data),
            Some(Reply::Errors(errors)) => Err(RelicError::Graph(errors)),
            Some(Reply::Transport(msg)) => Err(RelicError::Upstream(msg)),
            None => Err(RelicError::Upstream(format!("no scripted reply for {operation}"))),
        }
    }
}

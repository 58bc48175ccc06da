// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted transport for unit tests.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Result, TransportError};
use crate::protocol::{ApiRequest, ApiResponse, Transport};

/// Replays queued responses and records every request it sees.
///
/// Once the queue is drained every call fails as if the host refused the
/// connection.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond_json(self, value: Value) -> Self {
        self.responses.lock().push_back(Ok(ApiResponse::Json(value)));
        self
    }

    pub(crate) fn respond_empty(self) -> Self {
        self.responses.lock().push_back(Ok(ApiResponse::Empty));
        self
    }

    pub(crate) fn fail_with(self, code: &str) -> Self {
        self.responses
            .lock()
            .push_back(Err(TransportError::from_code(code).into()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for MockTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::from_code("ECONNREFUSED").into()))
    }
}

// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a recording in-memory parameter store client and config helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `confman`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use confman::context::OperationContext;
use confman::storage::parameter_store::client::{
    DeleteParametersInput, DeleteParametersOutput, DescribeParametersInput,
    DescribeParametersOutput, GetParametersByPathInput, GetParametersByPathOutput,
    GetParametersInput, GetParametersOutput, Parameter, ParameterMetadata, ParameterStoreClient,
    PutParameterInput,
};
use confman::storage::parameter_store::ParameterStore;
use confman::storage::Config;
use confman_core::errors::{AppError, AppResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Build a `Config` from literal pairs
pub fn config(pairs: &[(&str, &str)]) -> Config {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

/// Owned key list from literals
pub fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

#[derive(Debug, Clone)]
pub struct StoredParameter {
    pub value: String,
    pub version: i64,
    pub key_id: String,
    pub last_modified: DateTime<Utc>,
}

/// Everything the fake has stored and every call it has seen
#[derive(Debug, Default)]
pub struct FakeState {
    pub parameters: BTreeMap<String, StoredParameter>,
    pub puts: Vec<PutParameterInput>,
    pub get_batches: Vec<Vec<String>>,
    pub delete_batches: Vec<Vec<String>>,
    pub list_calls: usize,
    pub describe_calls: usize,
}

#[derive(Debug, Default)]
struct Faults {
    fail_put_for: Option<String>,
    fail_delete: bool,
    not_found_on_list: bool,
    cancel_after_puts: Option<(usize, OperationContext)>,
    cancel_on_list: Option<OperationContext>,
}

/// In-memory parameter store client that records every request
///
/// Listing and describe calls page through results using the item index as
/// the continuation token.
#[derive(Debug)]
pub struct RecordingParameterClient {
    state: Mutex<FakeState>,
    faults: Mutex<Faults>,
    page_size: usize,
}

impl Default for RecordingParameterClient {
    fn default() -> Self {
        Self::with_page_size(10)
    }
}

impl RecordingParameterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake whose listings return at most `page_size` items per page
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            faults: Mutex::new(Faults::default()),
            page_size,
        }
    }

    /// Store a parameter directly, bypassing call recording
    pub fn seed(&self, name: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        let version = state.parameters.get(name).map_or(1, |p| p.version + 1);
        state.parameters.insert(
            name.to_owned(),
            StoredParameter {
                value: value.to_owned(),
                version,
                key_id: "alias/seed".to_owned(),
                last_modified: Utc::now(),
            },
        );
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .parameters
            .get(name)
            .map(|p| p.value.clone())
    }

    pub fn stored(&self, name: &str) -> Option<StoredParameter> {
        self.state.lock().unwrap().parameters.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .parameters
            .keys()
            .cloned()
            .collect()
    }

    pub fn puts(&self) -> Vec<PutParameterInput> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn put_names(&self) -> Vec<String> {
        self.puts().into_iter().map(|put| put.name).collect()
    }

    pub fn get_batches(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().get_batches.clone()
    }

    pub fn delete_batches(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().delete_batches.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn describe_calls(&self) -> usize {
        self.state.lock().unwrap().describe_calls
    }

    /// Forget recorded calls, keeping stored parameters
    pub fn clear_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.puts.clear();
        state.get_batches.clear();
        state.delete_batches.clear();
        state.list_calls = 0;
        state.describe_calls = 0;
    }

    /// Reject puts to `name` with an external service error
    pub fn fail_put_for(&self, name: &str) {
        self.faults.lock().unwrap().fail_put_for = Some(name.to_owned());
    }

    /// Reject every delete with an external service error
    pub fn fail_deletes(&self) {
        self.faults.lock().unwrap().fail_delete = true;
    }

    /// Report path listings as not found
    pub fn not_found_on_list(&self) {
        self.faults.lock().unwrap().not_found_on_list = true;
    }

    /// Cancel `ctx` once `count` puts have succeeded
    pub fn cancel_after_puts(&self, count: usize, ctx: OperationContext) {
        self.faults.lock().unwrap().cancel_after_puts = Some((count, ctx));
    }

    /// Cancel `ctx` while serving the next path listing
    pub fn cancel_on_list(&self, ctx: OperationContext) {
        self.faults.lock().unwrap().cancel_on_list = Some(ctx);
    }

    fn children(&self, path: &str) -> Vec<(String, StoredParameter)> {
        let state = self.state.lock().unwrap();
        state
            .parameters
            .iter()
            .filter(|(name, _)| parent_of(name) == path)
            .map(|(name, parameter)| (name.clone(), parameter.clone()))
            .collect()
    }

    fn page<T>(&self, items: Vec<T>, limit: usize, token: Option<String>) -> (Vec<T>, Option<String>) {
        let start: usize = token.map_or(0, |t| t.parse().unwrap());
        let limit = limit.min(self.page_size).max(1);
        let end = (start + limit).min(items.len());
        let next = (end < items.len()).then(|| end.to_string());
        (items.into_iter().skip(start).take(end - start).collect(), next)
    }
}

fn parent_of(name: &str) -> &str {
    match name.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

#[async_trait]
impl ParameterStoreClient for RecordingParameterClient {
    async fn put_parameter(&self, input: PutParameterInput) -> AppResult<()> {
        let mut faults = self.faults.lock().unwrap();
        if faults.fail_put_for.as_deref() == Some(input.name.as_str()) {
            return Err(AppError::external_service("ssm", "put rejected"));
        }

        let mut state = self.state.lock().unwrap();
        state.puts.push(input.clone());
        let version = state
            .parameters
            .get(&input.name)
            .map_or(1, |p| p.version + 1);
        state.parameters.insert(
            input.name,
            StoredParameter {
                value: input.value,
                version,
                key_id: input.key_id,
                last_modified: Utc::now(),
            },
        );

        if let Some((count, ctx)) = &faults.cancel_after_puts {
            if state.puts.len() >= *count {
                ctx.cancel();
                faults.cancel_after_puts = None;
            }
        }
        Ok(())
    }

    async fn get_parameters(&self, input: GetParametersInput) -> AppResult<GetParametersOutput> {
        let mut state = self.state.lock().unwrap();
        state.get_batches.push(input.names.clone());

        let mut output = GetParametersOutput::default();
        for name in input.names {
            match state.parameters.get(&name) {
                Some(parameter) => output.parameters.push(Parameter {
                    name,
                    value: parameter.value.clone(),
                }),
                None => output.invalid_parameters.push(name),
            }
        }
        Ok(output)
    }

    async fn get_parameters_by_path(
        &self,
        input: GetParametersByPathInput,
    ) -> AppResult<GetParametersByPathOutput> {
        {
            let mut faults = self.faults.lock().unwrap();
            if faults.not_found_on_list {
                return Err(AppError::not_found("path"));
            }
            if let Some(ctx) = faults.cancel_on_list.take() {
                ctx.cancel();
            }
        }
        self.state.lock().unwrap().list_calls += 1;

        let children: Vec<Parameter> = self
            .children(&input.path)
            .into_iter()
            .map(|(name, parameter)| Parameter {
                name,
                value: parameter.value,
            })
            .collect();
        let (parameters, next_token) = self.page(
            children,
            usize::try_from(input.max_results).unwrap(),
            input.next_token,
        );
        Ok(GetParametersByPathOutput {
            parameters,
            next_token,
        })
    }

    async fn describe_parameters(
        &self,
        input: DescribeParametersInput,
    ) -> AppResult<DescribeParametersOutput> {
        self.state.lock().unwrap().describe_calls += 1;

        let described: Vec<ParameterMetadata> = self
            .children(&input.path)
            .into_iter()
            .map(|(name, parameter)| ParameterMetadata {
                name,
                description: None,
                version: parameter.version,
                parameter_type: Some("SecureString".to_owned()),
                last_modified_date: Some(parameter.last_modified),
                last_modified_user: Some("arn:aws:iam::123456789012:user/tester".to_owned()),
                tier: Some("Standard".to_owned()),
            })
            .collect();
        let (parameters, next_token) = self.page(described, usize::MAX, input.next_token);
        Ok(DescribeParametersOutput {
            parameters,
            next_token,
        })
    }

    async fn delete_parameters(
        &self,
        input: DeleteParametersInput,
    ) -> AppResult<DeleteParametersOutput> {
        if self.faults.lock().unwrap().fail_delete {
            return Err(AppError::external_service("ssm", "delete rejected"));
        }

        let mut state = self.state.lock().unwrap();
        state.delete_batches.push(input.names.clone());

        let mut output = DeleteParametersOutput::default();
        for name in input.names {
            if state.parameters.remove(&name).is_some() {
                output.deleted_parameters.push(name);
            } else {
                output.invalid_parameters.push(name);
            }
        }
        Ok(output)
    }
}

/// Parameter store adapter over a fresh recording client
pub fn recording_store() -> (Arc<RecordingParameterClient>, ParameterStore) {
    recording_store_with_page_size(10)
}

/// Parameter store adapter over a recording client with a custom listing page size
pub fn recording_store_with_page_size(
    page_size: usize,
) -> (Arc<RecordingParameterClient>, ParameterStore) {
    init_test_logging();
    let client = Arc::new(RecordingParameterClient::with_page_size(page_size));
    let store = ParameterStore::new(client.clone(), "parameter_store_key");
    (client, store)
}

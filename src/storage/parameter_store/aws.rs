// ABOUTME: AWS Systems Manager binding for the parameter store client contract
// ABOUTME: Builds the SDK client from shared AWS config and maps SDK errors onto AppError codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

use super::client::{
    DeleteParametersInput, DeleteParametersOutput, DescribeParametersInput,
    DescribeParametersOutput, GetParametersByPathInput, GetParametersByPathOutput,
    GetParametersInput, GetParametersOutput, Parameter, ParameterMetadata, ParameterStoreClient,
    PutParameterInput,
};
use crate::config::environment::SsmConnectionConfig;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::config::timeout::TimeoutConfig;
use aws_sdk_ssm::config::{Builder, Region};
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::primitives::DateTime as SdkDateTime;
use aws_sdk_ssm::types::{
    Parameter as SdkParameter, ParameterMetadata as SdkParameterMetadata, ParameterStringFilter,
    ParameterType,
};
use aws_sdk_ssm::Client;
use chrono::{DateTime, Utc};
use confman_core::constants::parameters::{
    NOT_FOUND_CODE, ONE_LEVEL_OPTION, PATH_FILTER_KEY, SECURE_STRING,
};
use confman_core::errors::{AppError, AppResult};
use std::error::Error;
use tracing::{debug, instrument};

const SERVICE_NAME: &str = "ssm";

/// Parameter store client backed by `aws_sdk_ssm`
#[derive(Debug, Clone)]
pub struct SsmParameterClient {
    client: Client,
}

impl SsmParameterClient {
    /// Build a client from shared AWS configuration plus connection overrides
    ///
    /// The SDK's own retry policy is inherited unchanged from `sdk_config`.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig, connection: &SsmConnectionConfig) -> Self {
        let mut builder = Builder::from(sdk_config);

        if let Some(region) = &connection.region {
            builder = builder.region(Region::new(region.clone()));
        }

        // e.g. LocalStack
        if let Some(endpoint) = &connection.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout) = connection.operation_timeout {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(timeout)
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

/// Map an SDK failure onto the unified error type
///
/// "Parameter not found" responses become `ConfigNotFound`; everything else is
/// an external service error carrying the SDK error as its source.
fn map_sdk_error<E>(operation: &str, err: SdkError<E>) -> AppError
where
    E: ProvideErrorMetadata + Error + Send + Sync + 'static,
{
    if err.code() == Some(NOT_FOUND_CODE) {
        return AppError::not_found(format!("parameter ({operation})")).with_source(err);
    }
    let message = format!("{operation} failed: {}", DisplayErrorContext(&err));
    AppError::external_service(SERVICE_NAME, message).with_source(err)
}

fn to_chrono(timestamp: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

fn to_parameter(parameter: &SdkParameter) -> Parameter {
    Parameter {
        name: parameter.name().unwrap_or_default().to_owned(),
        value: parameter.value().unwrap_or_default().to_owned(),
    }
}

fn to_metadata(parameter: &SdkParameterMetadata) -> ParameterMetadata {
    ParameterMetadata {
        name: parameter.name().unwrap_or_default().to_owned(),
        description: parameter.description().map(str::to_owned),
        version: parameter.version(),
        parameter_type: parameter.r#type().map(|t| t.as_str().to_owned()),
        last_modified_date: parameter.last_modified_date().and_then(to_chrono),
        last_modified_user: parameter.last_modified_user().map(str::to_owned),
        tier: parameter.tier().map(|t| t.as_str().to_owned()),
    }
}

#[async_trait]
impl ParameterStoreClient for SsmParameterClient {
    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn put_parameter(&self, input: PutParameterInput) -> AppResult<()> {
        self.client
            .put_parameter()
            .name(input.name)
            .value(input.value)
            .key_id(input.key_id)
            .overwrite(input.overwrite)
            .description(input.description)
            .r#type(ParameterType::from(SECURE_STRING))
            .send()
            .await
            .map_err(|e| map_sdk_error("PutParameter", e))?;
        Ok(())
    }

    #[instrument(skip(self, input), fields(count = input.names.len()))]
    async fn get_parameters(&self, input: GetParametersInput) -> AppResult<GetParametersOutput> {
        let output = self
            .client
            .get_parameters()
            .set_names(Some(input.names))
            .with_decryption(input.with_decryption)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetParameters", e))?;

        Ok(GetParametersOutput {
            parameters: output.parameters().iter().map(to_parameter).collect(),
            invalid_parameters: output.invalid_parameters().to_vec(),
        })
    }

    #[instrument(skip(self, input), fields(path = %input.path))]
    async fn get_parameters_by_path(
        &self,
        input: GetParametersByPathInput,
    ) -> AppResult<GetParametersByPathOutput> {
        let output = self
            .client
            .get_parameters_by_path()
            .path(input.path)
            .recursive(input.recursive)
            .with_decryption(input.with_decryption)
            .max_results(input.max_results)
            .set_next_token(input.next_token)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetParametersByPath", e))?;

        debug!(
            returned = output.parameters().len(),
            more = output.next_token().is_some(),
            "Fetched parameter page"
        );

        Ok(GetParametersByPathOutput {
            parameters: output.parameters().iter().map(to_parameter).collect(),
            next_token: output.next_token().map(str::to_owned),
        })
    }

    #[instrument(skip(self, input), fields(path = %input.path))]
    async fn describe_parameters(
        &self,
        input: DescribeParametersInput,
    ) -> AppResult<DescribeParametersOutput> {
        let filter = ParameterStringFilter::builder()
            .key(PATH_FILTER_KEY)
            .option(ONE_LEVEL_OPTION)
            .values(input.path)
            .build()
            .map_err(|e| AppError::internal(format!("invalid describe filter: {e}")))?;

        let output = self
            .client
            .describe_parameters()
            .parameter_filters(filter)
            .set_next_token(input.next_token)
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeParameters", e))?;

        Ok(DescribeParametersOutput {
            parameters: output.parameters().iter().map(to_metadata).collect(),
            next_token: output.next_token().map(str::to_owned),
        })
    }

    #[instrument(skip(self, input), fields(count = input.names.len()))]
    async fn delete_parameters(
        &self,
        input: DeleteParametersInput,
    ) -> AppResult<DeleteParametersOutput> {
        let output = self
            .client
            .delete_parameters()
            .set_names(Some(input.names))
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteParameters", e))?;

        Ok(DeleteParametersOutput {
            deleted_parameters: output.deleted_parameters().to_vec(),
            invalid_parameters: output.invalid_parameters().to_vec(),
        })
    }
}

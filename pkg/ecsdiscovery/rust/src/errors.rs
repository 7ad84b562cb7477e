// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use thiserror::Error;

/// A fatal failure of one fetch cycle. The first failing stage aborts the
/// cycle; the caller never sees partially decorated tasks. Retrying is the
/// caller's decision, nothing is retried internally.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to list tasks: {cause}")]
    ListTasks { cause: anyhow::Error },

    #[error("failed to describe task definition {arn}: {cause}")]
    DescribeTaskDefinition { arn: String, cause: anyhow::Error },

    #[error("failed to describe container instances: {cause}")]
    DescribeContainerInstances { cause: anyhow::Error },

    #[error("failed to describe EC2 instances: {cause}")]
    DescribeInstances { cause: anyhow::Error },

    #[error("failed to list services: {cause}")]
    ListServices { cause: anyhow::Error },

    /// The caller's shutdown token fired while a call was in flight.
    #[error("fetch cycle cancelled")]
    Cancelled,
}

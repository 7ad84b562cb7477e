// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Abstract AWS API surface consumed by the fetcher. Implementations own
//! pagination, authentication and transport-level retries; every method
//! either returns the complete requested collection or fails wholesale.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ContainerInstance, Ec2Instance, Service, Task, TaskDefinition};

/// ECS control-plane calls scoped to one cluster.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// All tasks currently known to the cluster, in listing order.
    async fn list_tasks(&self) -> Result<Vec<Task>>;

    /// The definition registered under `arn` (revision-specific).
    async fn describe_task_definition(&self, arn: &str) -> Result<TaskDefinition>;

    /// Describe the given container instances. At most 100 ARNs per call;
    /// unknown ARNs are omitted from the result rather than failing it.
    async fn describe_container_instances(
        &self,
        arns: &[String],
    ) -> Result<Vec<ContainerInstance>>;

    /// All services in the cluster, in listing order.
    async fn list_services(&self) -> Result<Vec<Service>>;
}

/// EC2 describe calls for the instances backing container instances.
#[async_trait]
pub trait Ec2Client: Send + Sync {
    /// Describe the given instances. At most 100 ids per call; unknown ids
    /// are omitted from the result rather than failing it.
    async fn describe_instances(&self, instance_ids: &[String]) -> Result<Vec<Ec2Instance>>;
}

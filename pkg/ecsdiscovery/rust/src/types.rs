// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Read-only snapshots of the ECS/EC2 objects one fetch cycle works with.
//! Everything here is fetched fresh each cycle except task definitions,
//! which are cached for the lifetime of the fetcher (see `cache`).

use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaunchType {
    Ec2,
    Fargate,
}

/// A task running in the cluster, as returned by the list call.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub task_arn: String,
    pub launch_type: LaunchType,
    /// Set once the scheduler has placed an EC2 task on a container
    /// instance; always `None` for Fargate.
    pub container_instance_arn: Option<String>,
    /// Revision-specific definition ARN, e.g. `mydef:3`.
    pub task_definition_arn: String,
    /// Deployment id for tasks launched by a service; `None` for tasks
    /// started manually.
    pub started_by: Option<String>,
}

/// The template a task was instantiated from. A given ARN+revision never
/// changes content once registered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskDefinition {
    pub task_definition_arn: String,
    pub family: Option<String>,
    pub revision: i32,
}

/// The cluster's registration record for a host able to run EC2 tasks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerInstance {
    pub container_instance_arn: String,
    pub ec2_instance_id: Option<String>,
}

/// The compute host backing a container instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ec2Instance {
    pub instance_id: String,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub subnet_id: Option<String>,
    pub vpc_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Deployment {
    pub id: String,
    /// Only deployments with status `ACTIVE` are eligible to match tasks.
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Service {
    pub service_arn: String,
    pub service_name: Option<String>,
    pub deployments: Vec<Deployment>,
}

/// A task plus the metadata attached during one fetch cycle. Decorations
/// shared between tasks (a definition, an instance, a service) are a
/// single `Arc`ed snapshot, not per-task copies.
#[derive(Debug, Clone, Serialize)]
pub struct DecoratedTask {
    pub task: Task,
    pub definition: Option<Arc<TaskDefinition>>,
    /// Set only for EC2 tasks whose container instance resolved to a
    /// running instance; Fargate tasks never carry one.
    pub ec2: Option<Arc<Ec2Instance>>,
    /// Set only when `started_by` matches an ACTIVE deployment.
    pub service: Option<Arc<Service>>,
}

impl DecoratedTask {
    pub fn new(task: Task) -> Self {
        DecoratedTask {
            task,
            definition: None,
            ec2: None,
            service: None,
        }
    }
}

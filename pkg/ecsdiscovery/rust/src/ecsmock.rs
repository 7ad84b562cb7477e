// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! In-memory ECS/EC2 cluster simulator implementing [`ClusterClient`] and
//! [`Ec2Client`], with per-API call counters and fixture generators. Used
//! by this crate's tests and by downstream consumers that want a cluster
//! without AWS credentials.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use crate::client::{ClusterClient, Ec2Client};
use crate::types::{ContainerInstance, Ec2Instance, LaunchType, Service, Task, TaskDefinition};

/// Matches the upstream per-call limit enforced by the describe APIs.
const DESCRIBE_LIMIT: usize = 100;

/// Number of calls made against each simulated API.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiStats {
    pub list_tasks: usize,
    pub describe_task_definition: usize,
    pub describe_container_instances: usize,
    pub list_services: usize,
    pub describe_instances: usize,
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    task_definitions: HashMap<String, TaskDefinition>,
    container_instances: HashMap<String, ContainerInstance>,
    ec2_instances: HashMap<String, Ec2Instance>,
    services: Vec<Service>,
    list_tasks_error: Option<String>,
    stats: ApiStats,
}

/// Shared-state handle; clones talk to the same simulated cluster, so one
/// `Cluster` can serve as both the ECS and the EC2 client of a fetcher.
#[derive(Clone, Default)]
pub struct Cluster {
    state: Arc<Mutex<State>>,
}

impl Cluster {
    pub fn new() -> Self {
        Cluster::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.lock().tasks = tasks;
    }

    pub fn set_task_definitions(&self, definitions: Vec<TaskDefinition>) {
        self.lock().task_definitions = definitions
            .into_iter()
            .map(|d| (d.task_definition_arn.clone(), d))
            .collect();
    }

    pub fn set_container_instances(&self, instances: Vec<ContainerInstance>) {
        self.lock().container_instances = instances
            .into_iter()
            .map(|ci| (ci.container_instance_arn.clone(), ci))
            .collect();
    }

    pub fn set_ec2_instances(&self, instances: Vec<Ec2Instance>) {
        self.lock().ec2_instances = instances
            .into_iter()
            .map(|i| (i.instance_id.clone(), i))
            .collect();
    }

    pub fn set_services(&self, services: Vec<Service>) {
        self.lock().services = services;
    }

    /// Make subsequent `list_tasks` calls fail with the given message.
    pub fn fail_list_tasks(&self, message: &str) {
        self.lock().list_tasks_error = Some(message.to_string());
    }

    pub fn stats(&self) -> ApiStats {
        self.lock().stats
    }
}

#[async_trait]
impl ClusterClient for Cluster {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut state = self.lock();
        state.stats.list_tasks += 1;
        if let Some(message) = &state.list_tasks_error {
            bail!("{message}");
        }
        Ok(state.tasks.clone())
    }

    async fn describe_task_definition(&self, arn: &str) -> Result<TaskDefinition> {
        let mut state = self.lock();
        state.stats.describe_task_definition += 1;
        state
            .task_definitions
            .get(arn)
            .cloned()
            .ok_or_else(|| anyhow!("task definition not found: {arn}"))
    }

    async fn describe_container_instances(
        &self,
        arns: &[String],
    ) -> Result<Vec<ContainerInstance>> {
        let mut state = self.lock();
        state.stats.describe_container_instances += 1;
        if arns.len() > DESCRIBE_LIMIT {
            bail!("too many container instances in one describe: {}", arns.len());
        }
        // Unknown ARNs are omitted, as the real API reports them as
        // failures alongside the found instances.
        Ok(arns
            .iter()
            .filter_map(|arn| state.container_instances.get(arn).cloned())
            .collect())
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        let mut state = self.lock();
        state.stats.list_services += 1;
        Ok(state.services.clone())
    }
}

#[async_trait]
impl Ec2Client for Cluster {
    async fn describe_instances(&self, instance_ids: &[String]) -> Result<Vec<Ec2Instance>> {
        let mut state = self.lock();
        state.stats.describe_instances += 1;
        if instance_ids.len() > DESCRIBE_LIMIT {
            bail!("too many instances in one describe: {}", instance_ids.len());
        }
        Ok(instance_ids
            .iter()
            .filter_map(|id| state.ec2_instances.get(id).cloned())
            .collect())
    }
}

/// Generate `n` Fargate tasks named `{prefix}{i}`, then run `modifier` on
/// each to shape the fixture.
pub fn gen_tasks(prefix: &str, n: usize, mut modifier: impl FnMut(usize, &mut Task)) -> Vec<Task> {
    (0..n)
        .map(|i| {
            let mut task = Task {
                task_arn: format!("{prefix}{i}"),
                launch_type: LaunchType::Fargate,
                container_instance_arn: None,
                task_definition_arn: format!("{prefix}{i}:1"),
                started_by: None,
            };
            modifier(i, &mut task);
            task
        })
        .collect()
}

/// Generate `n` definitions with ARNs `{prefix}{i}:{revision}`.
pub fn gen_task_definitions(
    prefix: &str,
    n: usize,
    revision: i32,
    mut modifier: impl FnMut(usize, &mut TaskDefinition),
) -> Vec<TaskDefinition> {
    (0..n)
        .map(|i| {
            let mut definition = TaskDefinition {
                task_definition_arn: format!("{prefix}{i}:{revision}"),
                family: Some(format!("{prefix}{i}")),
                revision,
            };
            modifier(i, &mut definition);
            definition
        })
        .collect()
}

pub fn gen_container_instances(
    prefix: &str,
    n: usize,
    mut modifier: impl FnMut(usize, &mut ContainerInstance),
) -> Vec<ContainerInstance> {
    (0..n)
        .map(|i| {
            let mut instance = ContainerInstance {
                container_instance_arn: format!("{prefix}{i}"),
                ec2_instance_id: None,
            };
            modifier(i, &mut instance);
            instance
        })
        .collect()
}

pub fn gen_ec2_instances(
    prefix: &str,
    n: usize,
    mut modifier: impl FnMut(usize, &mut Ec2Instance),
) -> Vec<Ec2Instance> {
    (0..n)
        .map(|i| {
            let mut instance = Ec2Instance {
                instance_id: format!("{prefix}{i}"),
                private_ip: Some(format!("10.0.0.{i}")),
                public_ip: None,
                subnet_id: Some("subnet-0".to_string()),
                vpc_id: Some("vpc-0".to_string()),
            };
            modifier(i, &mut instance);
            instance
        })
        .collect()
}

pub fn gen_services(
    prefix: &str,
    n: usize,
    mut modifier: impl FnMut(usize, &mut Service),
) -> Vec<Service> {
    (0..n)
        .map(|i| {
            let mut service = Service {
                service_arn: format!("{prefix}{i}"),
                service_name: Some(format!("{prefix}{i}")),
                deployments: Vec::new(),
            };
            modifier(i, &mut service);
            service
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[tokio::test]
    async fn test_call_counters() {
        let cluster = Cluster::new();
        cluster.set_tasks(gen_tasks("t", 3, |_, _| {}));

        cluster.list_tasks().await.unwrap();
        cluster.list_tasks().await.unwrap();
        let stats = cluster.stats();
        assert_eq!(stats.list_tasks, 2);
        assert_eq!(stats.describe_task_definition, 0);
    }

    #[tokio::test]
    async fn test_describe_limit_enforced() {
        let cluster = Cluster::new();
        let arns: Vec<String> = (0..101).map(|i| format!("ci{i}")).collect();
        assert!(cluster.describe_container_instances(&arns).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_refs_are_omitted() {
        let cluster = Cluster::new();
        cluster.set_container_instances(gen_container_instances("ci", 1, |_, _| {}));
        let arns = vec!["ci0".to_string(), "ci-missing".to_string()];
        let found = cluster.describe_container_instances(&arns).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].container_instance_arn, "ci0");
    }

    #[test]
    fn test_generators_apply_modifier() {
        let tasks = gen_tasks("t", 4, |i, task| {
            if i % 2 == 0 {
                task.launch_type = LaunchType::Ec2;
            }
        });
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[0].launch_type, LaunchType::Ec2);
        assert_eq!(tasks[1].launch_type, LaunchType::Fargate);
        assert_eq!(tasks[3].task_arn, "t3");
    }
}

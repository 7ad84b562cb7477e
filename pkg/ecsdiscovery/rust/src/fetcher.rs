// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! One fetch cycle: list the cluster's tasks, filter to the discoverable
//! ones, then attach definitions, EC2 instances and owning services. Every
//! stage is all-or-nothing except the EC2 join, which leaves unresolved
//! references unset instead of failing the cycle.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::cache::DefinitionCache;
use crate::client::{ClusterClient, Ec2Client};
use crate::errors::FetchError;
use crate::types::{ContainerInstance, DecoratedTask, Ec2Instance, LaunchType, Service, Task};

/// Upstream describe APIs reject more than 100 ids per call, so batches
/// are chunked. The number of calls is bounded by the distinct container
/// instances in the cluster, not by task count.
const DESCRIBE_BATCH_LIMIT: usize = 100;

/// Fetches and decorates the tasks of one ECS cluster. The definition
/// cache is the only state that outlives a cycle; everything else is
/// fetched fresh. Safe to drive from concurrent cycles.
pub struct TaskFetcher {
    cluster_name: String,
    cluster: Arc<dyn ClusterClient>,
    ec2: Arc<dyn Ec2Client>,
    definitions: DefinitionCache,
}

impl TaskFetcher {
    pub fn new(
        cluster_name: String,
        cluster: Arc<dyn ClusterClient>,
        ec2: Arc<dyn Ec2Client>,
    ) -> Self {
        TaskFetcher {
            cluster_name,
            cluster,
            ec2,
            definitions: DefinitionCache::new(),
        }
    }

    /// Run one full cycle and return the decorated tasks, in the order the
    /// cluster listed them. The first failing stage aborts the cycle; no
    /// partial result is ever returned.
    pub async fn fetch_and_decorate(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<Vec<DecoratedTask>, FetchError> {
        let tasks = self.get_discoverable_tasks(shutdown).await?;
        let mut tasks = self.attach_task_definition(shutdown, tasks).await?;
        self.attach_container_instance(shutdown, &mut tasks).await?;
        let services = self.get_all_services(shutdown).await?;
        Self::attach_service(&mut tasks, services);

        info!(
            "cluster {}: decorated {} tasks, {} task definitions cached",
            self.cluster_name,
            tasks.len(),
            self.definitions.len().await,
        );
        Ok(tasks)
    }

    /// List every task in the cluster and keep the ones eligible for
    /// monitoring: all Fargate tasks, and EC2 tasks that have been placed
    /// on a container instance. Listing order is preserved.
    pub(crate) async fn get_discoverable_tasks(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<Vec<Task>, FetchError> {
        let tasks = guard(shutdown, self.cluster.list_tasks())
            .await?
            .map_err(|cause| FetchError::ListTasks { cause })?;

        let total = tasks.len();
        let tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|task| match task.launch_type {
                LaunchType::Fargate => true,
                // Not placed yet, nothing to scrape.
                LaunchType::Ec2 => task.container_instance_arn.is_some(),
            })
            .collect();

        debug!(
            "cluster {}: {} of {} tasks discoverable",
            self.cluster_name,
            tasks.len(),
            total
        );
        Ok(tasks)
    }

    /// Attach each task's definition, resolving through the cache. One
    /// describe call per distinct ARN for the lifetime of the fetcher. Any
    /// resolution failure aborts the whole call.
    pub(crate) async fn attach_task_definition(
        &self,
        shutdown: &CancellationToken,
        tasks: Vec<Task>,
    ) -> Result<Vec<DecoratedTask>, FetchError> {
        let mut decorated = Vec::with_capacity(tasks.len());
        for task in tasks {
            let arn = task.task_definition_arn.clone();
            let describe = guard(
                shutdown,
                self.cluster.describe_task_definition(&task.task_definition_arn),
            );
            let definition = self
                .definitions
                .get_or_resolve(&task.task_definition_arn, async move {
                    describe
                        .await?
                        .map_err(|cause| FetchError::DescribeTaskDefinition { arn, cause })
                })
                .await?;

            let mut task = DecoratedTask::new(task);
            task.definition = Some(definition);
            decorated.push(task);
        }
        Ok(decorated)
    }

    /// Two-hop join for EC2 tasks: container instance ARN → EC2 instance
    /// id → instance. Describe calls are batched over the distinct ids, so
    /// tasks sharing a container instance share one lookup. A reference
    /// that fails either hop leaves that task's instance unset; only the
    /// describe calls themselves are fatal.
    pub(crate) async fn attach_container_instance(
        &self,
        shutdown: &CancellationToken,
        tasks: &mut [DecoratedTask],
    ) -> Result<(), FetchError> {
        let mut ci_arns = Vec::new();
        let mut seen = HashSet::new();
        for task in tasks.iter() {
            if task.task.launch_type != LaunchType::Ec2 {
                continue;
            }
            let Some(arn) = &task.task.container_instance_arn else {
                continue;
            };
            if seen.insert(arn.clone()) {
                ci_arns.push(arn.clone());
            }
        }
        if ci_arns.is_empty() {
            return Ok(());
        }

        let mut by_ci_arn: HashMap<String, ContainerInstance> = HashMap::new();
        for chunk in ci_arns.chunks(DESCRIBE_BATCH_LIMIT) {
            let instances = guard(shutdown, self.cluster.describe_container_instances(chunk))
                .await?
                .map_err(|cause| FetchError::DescribeContainerInstances { cause })?;
            for ci in instances {
                by_ci_arn.insert(ci.container_instance_arn.clone(), ci);
            }
        }

        let mut instance_ids = Vec::new();
        let mut seen_ids = HashSet::new();
        for arn in &ci_arns {
            let Some(ci) = by_ci_arn.get(arn) else {
                continue;
            };
            if let Some(id) = &ci.ec2_instance_id
                && seen_ids.insert(id.clone())
            {
                instance_ids.push(id.clone());
            }
        }

        let mut by_instance_id: HashMap<String, Arc<Ec2Instance>> = HashMap::new();
        for chunk in instance_ids.chunks(DESCRIBE_BATCH_LIMIT) {
            let instances = guard(shutdown, self.ec2.describe_instances(chunk))
                .await?
                .map_err(|cause| FetchError::DescribeInstances { cause })?;
            for instance in instances {
                by_instance_id.insert(instance.instance_id.clone(), Arc::new(instance));
            }
        }

        for task in tasks.iter_mut() {
            if task.task.launch_type != LaunchType::Ec2 {
                continue;
            }
            let Some(arn) = &task.task.container_instance_arn else {
                continue;
            };
            match lookup_ec2(arn, &by_ci_arn, &by_instance_id) {
                Some(instance) => task.ec2 = Some(instance),
                None => debug!(
                    "cluster {}: no EC2 instance resolved for container instance {arn}",
                    self.cluster_name
                ),
            }
        }
        Ok(())
    }

    /// List every service in the cluster, in listing order, unfiltered.
    pub(crate) async fn get_all_services(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<Vec<Service>, FetchError> {
        guard(shutdown, self.cluster.list_services())
            .await?
            .map_err(|cause| FetchError::ListServices { cause })
    }

    /// Attribute tasks to the service that launched them by matching
    /// `started_by` against ACTIVE deployment ids. Pure, never fails.
    /// Manually started tasks (no `started_by`) are left unmatched.
    pub(crate) fn attach_service(tasks: &mut [DecoratedTask], services: Vec<Service>) {
        let mut by_deployment: HashMap<String, Arc<Service>> = HashMap::new();
        for service in services {
            let service = Arc::new(service);
            for deployment in &service.deployments {
                if deployment.status == "ACTIVE" {
                    // On duplicate ids the last service in listing order
                    // wins; pinned by test.
                    by_deployment.insert(deployment.id.clone(), Arc::clone(&service));
                }
            }
        }

        for task in tasks {
            let Some(started_by) = &task.task.started_by else {
                continue;
            };
            if let Some(service) = by_deployment.get(started_by) {
                task.service = Some(Arc::clone(service));
            }
        }
    }
}

/// The soft half of the EC2 join: a miss at either hop is reported as
/// `None`, never as an error.
fn lookup_ec2(
    ci_arn: &str,
    by_ci_arn: &HashMap<String, ContainerInstance>,
    by_instance_id: &HashMap<String, Arc<Ec2Instance>>,
) -> Option<Arc<Ec2Instance>> {
    let ci = by_ci_arn.get(ci_arn)?;
    let instance_id = ci.ec2_instance_id.as_deref()?;
    by_instance_id.get(instance_id).map(Arc::clone)
}

/// Race an outbound call against the caller's shutdown token. A fired
/// token aborts the in-flight call and short-circuits the cycle.
async fn guard<T>(
    shutdown: &CancellationToken,
    call: impl Future<Output = T>,
) -> Result<T, FetchError> {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => Err(FetchError::Cancelled),
        out = call => Ok(out),
    }
}

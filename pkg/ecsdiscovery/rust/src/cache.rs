// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::errors::FetchError;
use crate::types::TaskDefinition;

/// Definition ARN → resolved definition, shared by every fetch cycle of one
/// fetcher. Definitions are immutable per ARN+revision, so entries are
/// never invalidated or evicted; the map grows monotonically with the
/// cluster's definition churn.
///
/// The lock is a `tokio::sync::Mutex` and is held across the resolution of
/// a miss, so concurrent cycles resolve a given ARN at most once between
/// them.
#[derive(Default)]
pub(crate) struct DefinitionCache {
    entries: Mutex<HashMap<String, Arc<TaskDefinition>>>,
}

impl DefinitionCache {
    pub(crate) fn new() -> Self {
        DefinitionCache::default()
    }

    /// Return the definition cached under `arn`, running `resolve` and
    /// storing its result on a miss. A failed resolution leaves the cache
    /// untouched, so the next cycle retries the fetch.
    pub(crate) async fn get_or_resolve<Fut>(
        &self,
        arn: &str,
        resolve: Fut,
    ) -> Result<Arc<TaskDefinition>, FetchError>
    where
        Fut: Future<Output = Result<TaskDefinition, FetchError>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(definition) = entries.get(arn) {
            return Ok(Arc::clone(definition));
        }

        let definition = Arc::new(resolve.await?);
        entries.insert(arn.to_string(), Arc::clone(&definition));
        Ok(definition)
    }

    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use anyhow::anyhow;

    fn def(arn: &str) -> TaskDefinition {
        TaskDefinition {
            task_definition_arn: arn.to_string(),
            family: None,
            revision: 1,
        }
    }

    #[tokio::test]
    async fn test_hit_skips_resolution() {
        let cache = DefinitionCache::new();
        let first = cache
            .get_or_resolve("d0:1", async { Ok(def("d0:1")) })
            .await
            .unwrap();

        // Second lookup must not run the resolver.
        let second = cache
            .get_or_resolve("d0:1", async {
                Err(FetchError::DescribeTaskDefinition {
                    arn: "d0:1".to_string(),
                    cause: anyhow!("resolver should not run"),
                })
            })
            .await
            .unwrap();

        assert_eq!(first.task_definition_arn, second.task_definition_arn);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_resolution_not_cached() {
        let cache = DefinitionCache::new();
        let err = cache
            .get_or_resolve("d0:1", async {
                Err(FetchError::DescribeTaskDefinition {
                    arn: "d0:1".to_string(),
                    cause: anyhow!("throttled"),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::DescribeTaskDefinition { .. }));
        assert_eq!(cache.len().await, 0);

        // The next cycle gets a fresh attempt.
        let resolved = cache
            .get_or_resolve("d0:1", async { Ok(def("d0:1")) })
            .await
            .unwrap();
        assert_eq!(resolved.task_definition_arn, "d0:1");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_arns_are_distinct_entries() {
        let cache = DefinitionCache::new();
        cache
            .get_or_resolve("d0:1", async { Ok(def("d0:1")) })
            .await
            .unwrap();
        cache
            .get_or_resolve("d0:2", async { Ok(def("d0:2")) })
            .await
            .unwrap();
        assert_eq!(cache.len().await, 2);
    }
}

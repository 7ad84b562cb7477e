// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::undocumented_unsafe_blocks)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

//! ECS task discovery for scrape-target generation.
//!
//! Lists the tasks running in one ECS cluster and decorates each with the
//! metadata a scrape-target builder needs: the task definition it was
//! instantiated from, the EC2 instance backing it (EC2 launch type only),
//! and the service that owns it. The AWS API surface is abstracted behind
//! the [`ClusterClient`] and [`Ec2Client`] traits; [`ecsmock`] provides an
//! in-memory implementation of both.

mod cache;
mod client;
pub mod ecsmock;
mod errors;
mod fetcher;
mod types;

// Re-export the public API
pub use client::{ClusterClient, Ec2Client};
pub use errors::FetchError;
pub use fetcher::TaskFetcher;
pub use types::{
    ContainerInstance, DecoratedTask, Deployment, Ec2Instance, LaunchType, Service, Task,
    TaskDefinition,
};

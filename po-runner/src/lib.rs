//! Concurrent, rate-limited inference execution.
//!
//! This crate provides the worker pool and per-record fan-out used to run
//! a rendered prompt template against a dataset through a single inference
//! adapter.

#![warn(missing_docs, clippy::pedantic)]

mod runner;
mod scheduler;

pub use runner::{InferenceOutcome, InferenceRunner, RunnerError, RunnerResult};
pub use scheduler::{SchedulerConfig, SchedulerError, SchedulerResult, TaskScheduler};

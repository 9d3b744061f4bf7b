//! parsum - parallel decomposition of simple numeric series
//!
//! Splits a contiguous 1-based index range into near-equal blocks, hands one
//! block to each worker, and recombines the partial results. Two tiers share
//! the same partitioning:
//!
//! - **Shared memory**: a fixed [`executor::CpuPool`] evaluates blocks of the
//!   Gregory–Leibniz series and reduces them into an approximation of π.
//! - **Message passing**: a group of ranks moves blocks of the triangular
//!   series `1..=N` around with scatter, reduce and gather, see
//!   [`collective`].
//!
//! # Quick Start
//!
//! ```no_run
//! use parsum_rs::prelude::*;
//!
//! let runtime = Runtime::with_workers(4).unwrap();
//! let pi = approximate_pi(&runtime, 1_000_000).unwrap();
//! println!("pi ~ {}", pi);
//!
//! let group = LocalGroup::new(4).unwrap();
//! let reports = group.run(|comm| validate_triangle_series(comm, 1000)).unwrap();
//! assert!(reports[0].as_ref().unwrap().is_some());
//! ```
//!
//! Worker and rank counts are always passed in explicitly; nothing in the
//! algorithms reads the environment.

#![warn(missing_debug_implementations)]

pub mod collective;
pub mod config;
pub mod error;
pub mod executor;
pub mod leibniz;
pub mod partition;
pub mod pi;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod series;
pub mod telemetry;
pub mod util;

pub use config::{Config, ConfigBuilder, ReductionStrategy};
pub use error::{Error, Result};
pub use partition::{partition, IndexRange};
pub use runtime::Runtime;

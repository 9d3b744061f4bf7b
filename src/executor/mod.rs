//! Task execution infrastructure.
//!
//! A fixed pool of worker threads pulling boxed tasks from a shared injector
//! and stealing from each other's local deques when idle.

pub mod cpu_pool;
pub mod panic_handler;
pub mod task;
pub mod worker;

pub use cpu_pool::CpuPool;
pub use panic_handler::{catch_panic, PanicInfo};

pub(crate) use task::Task;

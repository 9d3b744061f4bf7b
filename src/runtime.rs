use crate::config::Config;
use crate::error::Result;
use crate::executor::CpuPool;
use crate::scope::{self, Scope};
use crate::telemetry::MetricsSnapshot;

/// A validated configuration together with the worker pool it sized.
#[derive(Debug)]
pub struct Runtime {
    pool: CpuPool,
    config: Config,
}

impl Runtime {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let pool = CpuPool::new(&config)?;

        Ok(Self { pool, config })
    }

    /// Runtime with `num_workers` threads and defaults for everything else.
    pub fn with_workers(num_workers: usize) -> Result<Self> {
        Self::new(Config::builder().num_threads(num_workers).build()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn num_workers(&self) -> usize {
        self.pool.num_threads()
    }

    pub fn pool(&self) -> &CpuPool {
        &self.pool
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.pool.metrics()
    }

    pub fn scope<'scope, F, R>(&'scope self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Scope<'scope>) -> R,
    {
        scope::scope(&self.pool, f)
    }
}

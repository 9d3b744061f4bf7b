use super::task::Task;
use super::worker::{Worker, WorkerId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::telemetry::{Metrics, MetricsSnapshot};
use crossbeam_deque::{Injector, Stealer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[cfg(target_os = "linux")]
fn pin_thread_to_core(core_id: usize) {
    // SAFETY: cpu_set_t is plain data; zeroed is a valid empty set and the
    // pointer passed to sched_setaffinity lives for the whole call.
    let result = unsafe {
        let mut cpuset: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id % num_cpus::get(), &mut cpuset);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &cpuset)
    };
    if result != 0 {
        tracing::warn!(
            thread = thread::current().name().unwrap_or("unknown"),
            core_id,
            "failed to pin worker to core"
        );
    }
}

/// Fixed-size pool of worker threads.
pub struct CpuPool {
    workers: Vec<WorkerHandle>,
    injector: Arc<Injector<Task>>,
    shutdown: Arc<AtomicBool>,
    num_threads: usize,
    pending_tasks: Arc<AtomicUsize>,
    next_wake: AtomicUsize,
    metrics: Arc<Metrics>,
}

struct WorkerHandle {
    id: WorkerId,
    thread: Option<JoinHandle<()>>,
    unparker: thread::Thread,
}

impl CpuPool {
    pub fn new(config: &Config) -> Result<Self> {
        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let injector = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let pending_tasks = Arc::new(AtomicUsize::new(0));
        let metrics = Arc::new(Metrics::new());

        let workers: Vec<Worker> = (0..num_threads)
            .map(|id| Worker::new(id, metrics.clone()))
            .collect();
        let stealers: Vec<Stealer<Task>> = workers.iter().map(|w| w.local_queue.stealer()).collect();

        let mut handles = Vec::with_capacity(num_threads);

        for worker in workers {
            let id = worker.id;
            let stealers_clone = stealers.clone();
            let injector_clone = injector.clone();
            let shutdown_clone = shutdown.clone();
            let pending_clone = pending_tasks.clone();
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);

            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let pin_workers = config.pin_workers;
            let spawned = builder.spawn(move || {
                #[cfg(target_os = "linux")]
                if pin_workers {
                    pin_thread_to_core(id);
                }

                worker.run(stealers_clone, injector_clone, shutdown_clone, pending_clone);
            });

            let thread = match spawned {
                Ok(thread) => thread,
                Err(e) => {
                    // Stop the workers that did start before bailing out.
                    shutdown.store(true, Ordering::Release);
                    for handle in &mut handles {
                        stop_worker(handle);
                    }
                    return Err(Error::executor(format!("spawn failed: {}", e)));
                }
            };

            let unparker = thread.thread().clone();

            handles.push(WorkerHandle {
                id,
                thread: Some(thread),
                unparker,
            });
        }

        tracing::debug!(num_threads, prefix = %config.thread_name_prefix, "cpu pool started");

        Ok(Self {
            workers: handles,
            injector,
            shutdown,
            num_threads,
            pending_tasks,
            next_wake: AtomicUsize::new(0),
            metrics,
        })
    }

    pub(crate) fn submit(&self, task: Task) {
        self.pending_tasks.fetch_add(1, Ordering::Relaxed);
        self.injector.push(task);

        // round-robin wakeup so consecutive submissions land on different workers
        let next = self.next_wake.fetch_add(1, Ordering::Relaxed) % self.num_threads;
        self.workers[next].unparker.unpark();
    }

    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Task::new(f));
    }

    pub fn pending_tasks(&self) -> usize {
        self.pending_tasks.load(Ordering::Acquire)
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);

        for worker in &mut self.workers {
            stop_worker(worker);
        }
    }
}

fn stop_worker(worker: &mut WorkerHandle) {
    worker.unparker.unpark();
    if let Some(thread) = worker.thread.take() {
        if thread.join().is_err() {
            tracing::error!(worker = worker.id, "worker thread panicked during shutdown");
        }
    }
}

impl Drop for CpuPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for CpuPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuPool")
            .field("num_threads", &self.num_threads)
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

pub use crate::collective::{
    validate_triangle_series, Communicator, LocalCommunicator, LocalGroup, ReduceOp,
    TriangleReport, ROOT,
};
pub use crate::config::{Config, ConfigBuilder, ReductionStrategy};
pub use crate::error::{Error, Result};
pub use crate::leibniz::evaluate_gregory_leibniz;
pub use crate::partition::{
    partition, partition_observed, IndexRange, NoopObserver, PartitionObserver, TracingObserver,
};
pub use crate::pi::{approximate_pi, approximate_pi_sequential, estimate_pi, PiEstimate};
pub use crate::runtime::Runtime;
pub use crate::series::{fill_series, fill_series_into, sum_series, triangular_number};
pub use crate::telemetry::init_logging;

use parsum_rs::prelude::*;

fn main() -> parsum_rs::Result<()> {
    init_logging("info")?;

    let config = Config::builder().log_partitions(true).build()?;
    let runtime = Runtime::new(config)?;

    println!("=== Gregory-Leibniz pi on {} workers ===\n", runtime.num_workers());

    let mut terms = 1_000u64;
    while terms <= 100_000_000 {
        let estimate = estimate_pi(&runtime, terms)?;
        println!(
            "{:>11} terms: pi ~ {:.12}  error {:.3e}",
            terms,
            estimate.value,
            estimate.abs_error()
        );
        terms *= 10;
    }

    let metrics = runtime.metrics();
    println!(
        "\n{} tasks, p50 {} ns, utilization {:.1}%",
        metrics.tasks_executed,
        metrics.p50_latency_ns,
        metrics.utilization() * 100.0
    );

    Ok(())
}

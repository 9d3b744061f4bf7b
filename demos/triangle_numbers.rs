use parsum_rs::prelude::*;

fn main() -> parsum_rs::Result<()> {
    init_logging("info")?;

    let num_elements = 1000;
    for size in [1usize, 2, 4, 5, 8] {
        let group = LocalGroup::new(size)?;
        let results = group.run(|comm| validate_triangle_series(comm, num_elements))?;

        for result in results {
            if let Some(report) = result? {
                println!(
                    "{} ranks: root {} / reduced {} / gathered {} (expected {})",
                    report.ranks,
                    report.root_sum,
                    report.reduced_sum,
                    report.gathered_sum,
                    report.expected
                );
            }
        }
    }

    Ok(())
}

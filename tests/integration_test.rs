use parsum_rs::prelude::*;
use std::f64::consts::PI;

fn runtime(workers: usize) -> Runtime {
    Runtime::with_workers(workers).unwrap()
}

#[test]
fn test_fill_and_sum() {
    let values = fill_series(10);
    assert_eq!(values[0], 1);
    assert_eq!(values[1], 2);
    assert_eq!(values[9], 10);

    assert_eq!(sum_series(&values, 1).unwrap(), 1);
    assert_eq!(sum_series(&values, 3).unwrap(), 6);
    assert_eq!(sum_series(&values, 10).unwrap(), 55);
    assert!(matches!(
        sum_series(&values, 11),
        Err(Error::OutOfRange { .. })
    ));
}

#[test]
fn test_gregory_leibniz_terms() {
    let cases = [
        ((1, 1), 1.0),
        ((1, 2), 0.6666667),
        ((1, 3), 0.8666667),
        ((2, 5), -0.1650794),
        ((5, 5), 0.1111111),
        ((10, 20), -0.0401853),
    ];

    for ((start, end), expected) in cases {
        let got = evaluate_gregory_leibniz(start, end).unwrap();
        assert!(
            (got - expected).abs() < 1e-4,
            "terms {}..={}: expected {} got {}",
            start,
            end,
            expected,
            got
        );
    }

    assert!(evaluate_gregory_leibniz(3, 2).is_err());
}

#[test]
fn test_partition_covers_range() {
    for workers in [1usize, 2, 3, 7, 8, 13] {
        for elements in [workers as u64, 100, 1000, 12_345] {
            let ranges = partition(workers, elements).unwrap();
            assert_eq!(ranges.len(), workers);
            assert_eq!(ranges[0].first, 1);
            assert_eq!(ranges[workers - 1].last, elements);
            for i in 0..workers - 1 {
                assert_eq!(ranges[i].last + 1, ranges[i + 1].first);
            }
        }
    }
}

#[test]
fn test_partition_zero_workers() {
    assert!(matches!(partition(0, 100), Err(Error::Config(_))));
}

#[test]
fn test_triangle_series_over_dividing_group_sizes() {
    for size in [1usize, 2, 4, 5, 8, 10] {
        let group = LocalGroup::new(size).unwrap();
        let results = group
            .run(|comm| validate_triangle_series(comm, 1000))
            .unwrap();

        let report = results[ROOT]
            .as_ref()
            .unwrap()
            .clone()
            .expect("root returns a report");
        assert_eq!(report.ranks, size);
        assert_eq!(report.expected, 500_500);
        assert_eq!(report.reduced_sum, 500_500);
        assert_eq!(report.gathered_sum, 500_500);

        assert!(results[1..].iter().all(|r| matches!(r, Ok(None))));
    }
}

#[test]
fn test_triangle_series_rejects_uneven_split() {
    let group = LocalGroup::new(3).unwrap();
    let results = group
        .run(|comm| validate_triangle_series(comm, 1000))
        .unwrap();
    for result in results {
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("not divisible")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}

#[test]
fn test_pi_error_halves_when_terms_double() {
    let rt = runtime(4);
    let errors: Vec<f64> = [10_000u64, 20_000, 40_000, 80_000]
        .iter()
        .map(|&n| (approximate_pi(&rt, n).unwrap() - PI).abs())
        .collect();

    for pair in errors.windows(2) {
        assert!(pair[1] < pair[0]);
        let ratio = pair[0] / pair[1];
        assert!((1.8..2.2).contains(&ratio), "ratio {} in {:?}", ratio, errors);
    }
}

#[test]
fn test_pi_worker_count_does_not_change_result() {
    let reference = approximate_pi_sequential(50_000).unwrap();
    for workers in [1usize, 2, 3, 8] {
        let value = approximate_pi(&runtime(workers), 50_000).unwrap();
        assert!((value - reference).abs() < 1e-9, "{} workers", workers);
    }
}

#[test]
fn test_atomic_reduction() {
    let config = Config::builder()
        .num_threads(4)
        .reduction(ReductionStrategy::AtomicAccumulator)
        .log_partitions(true)
        .build()
        .unwrap();
    let rt = Runtime::new(config).unwrap();

    let value = approximate_pi(&rt, 200_000).unwrap();
    assert!((value - PI).abs() < 1e-4);
}

#[test]
fn test_scope_panic_is_reported() {
    let rt = runtime(2);
    let err = rt
        .scope(|s| {
            s.spawn(|| panic!("worker exploded"));
        })
        .unwrap_err();
    assert!(matches!(err, Error::WorkerPanic(_)));

    // pool keeps working afterwards
    assert!(approximate_pi(&rt, 1000).is_ok());
}

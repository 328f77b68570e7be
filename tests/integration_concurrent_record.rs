use round_bench::{CollectorConfig, MeasurementCollector, Outcome};
use std::fs;
use std::sync::Barrier;
use std::thread;
use tempfile::TempDir;

const THREADS: u64 = 8;
const PER_THREAD: u64 = 20_000;

#[test]
fn concurrent_hits_are_all_counted() {
    let dir = TempDir::new().unwrap();
    let config = CollectorConfig::new(dir.path(), "conc", "concurrency").percentiles(vec![50.0]);
    let c = MeasurementCollector::new(config, &["op"]).unwrap();

    let barrier = Barrier::new(THREADS as usize);
    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let m = c.measurement("op").unwrap();
                barrier.wait();
                for _ in 0..PER_THREAD {
                    m.record(true, 1);
                }
            });
        }
    });

    let snap = c.measurement("op").unwrap().snapshot(Outcome::Hit).unwrap();
    assert_eq!(snap.count, THREADS * PER_THREAD);
    assert_eq!(snap.accumulated, THREADS * PER_THREAD);
    assert_eq!(snap.average(), Some(1));
}

#[test]
fn concurrent_mixed_outcomes_keep_exact_bounds() {
    let dir = TempDir::new().unwrap();
    let config = CollectorConfig::new(dir.path(), "mixed", "mixed")
        .collect_miss(true)
        .percentiles(vec![50.0, 100.0]);
    let mut c = MeasurementCollector::new(config, &["op"]).unwrap();

    for round in 1..=2u64 {
        if round > 1 {
            c.new_round();
        }

        thread::scope(|s| {
            for t in 0..THREADS {
                let c = &c;
                s.spawn(move || {
                    let m = c.measurement("op").unwrap();
                    for i in 0..PER_THREAD {
                        // Values 1..=THREADS*PER_THREAD, odd ones are misses
                        let v = t * PER_THREAD + i + 1;
                        m.record(v % 2 == 0, v * round);
                    }
                });
            }
        });

        let m = c.measurement("op").unwrap();
        let total = THREADS * PER_THREAD;
        let hit = m.snapshot(Outcome::Hit).unwrap();
        let miss = m.snapshot(Outcome::Miss).unwrap();
        assert_eq!(hit.count + miss.count, total);
        assert_eq!(hit.best, 2 * round);
        assert_eq!(hit.worst, total * round);
        assert_eq!(miss.best, round);
        assert_eq!(miss.worst, (total - 1) * round);
        assert_eq!(
            hit.accumulated + miss.accumulated,
            round * total * (total + 1) / 2
        );

        c.write_stats("latency", ',').unwrap();
    }

    let content = fs::read_to_string(c.log_path("latency")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("1_op,"));
    assert!(lines[2].starts_with("1_op(miss),"));
    assert!(lines[3].starts_with("2_op,"));
    assert!(lines[4].starts_with("2_op(miss),"));
}

use std::collections::HashSet;

use crossbeam_utils::thread;
use linepool::{LineEngine, LinePool, PoolError, PoolStats};

fn numbered(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{} {}", prefix, i)).collect()
}

fn assert_conserved(stats: PoolStats) {
    assert_eq!(
        stats.current_lines as u64,
        stats.total_loaded - stats.total_sampled - stats.total_cleared,
        "line accounting broken: {:?}",
        stats
    );
}

#[test]
fn new_pool_is_empty() {
    let pool = LinePool::new();
    assert_eq!(pool.stats(), PoolStats::default());
    assert_eq!(pool.sample(10).unwrap(), Vec::<String>::new());
}

#[test]
fn load_appends_and_counts() {
    let pool = LinePool::new();
    assert_eq!(pool.load(numbered("a", 30)), 30);
    assert_eq!(pool.load(numbered("b", 12)), 12);

    let stats = pool.stats();
    assert_eq!(stats.current_lines, 42);
    assert_eq!(stats.total_loaded, 42);
    assert_eq!(stats.total_sampled, 0);
}

#[test]
fn load_keeps_blank_and_duplicate_lines() {
    let pool = LinePool::new();
    let batch = vec![
        "same".to_string(),
        "same".to_string(),
        "".to_string(),
        "   ".to_string(),
    ];
    assert_eq!(pool.load(batch), 4);

    let mut sampled = pool.sample(4).unwrap();
    sampled.sort();
    assert_eq!(sampled, vec!["", "   ", "same", "same"]);
}

#[test]
fn empty_load_is_a_no_op() {
    let pool = LinePool::new();
    assert_eq!(pool.load(Vec::new()), 0);
    assert_eq!(pool.stats(), PoolStats::default());
}

#[test]
fn sample_returns_distinct_lines_and_removes_them() {
    let pool = LinePool::new().with_rng_seed(42);
    pool.load(numbered("line", 100));

    let first = pool.sample(40).unwrap();
    let second = pool.sample(40).unwrap();
    let first_set: HashSet<_> = first.iter().cloned().collect();
    let second_set: HashSet<_> = second.iter().cloned().collect();

    assert_eq!(first_set.len(), 40);
    assert_eq!(second_set.len(), 40);
    assert!(first_set.is_disjoint(&second_set));

    let stats = pool.stats();
    assert_eq!(stats.current_lines, 20);
    assert_eq!(stats.total_sampled, 80);
    assert_conserved(stats);
}

#[test]
fn sample_zero_changes_nothing() {
    let pool = LinePool::new();
    pool.load(numbered("line", 5));
    let before = pool.stats();

    assert!(pool.sample(0).unwrap().is_empty());
    assert_eq!(pool.stats(), before);
}

#[test]
fn negative_sample_is_rejected_without_side_effects() {
    let pool = LinePool::new();
    pool.load(numbered("line", 5));
    let before = pool.stats();

    match pool.sample(-1) {
        Err(PoolError::InvalidArgument(_)) => {}
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
    assert_eq!(pool.stats(), before);
}

#[test]
fn overshoot_drains_the_pool() {
    let pool = LinePool::new();
    pool.load(numbered("line", 7));

    let sampled = pool.sample(1_000).unwrap();
    assert_eq!(sampled.len(), 7);
    assert_eq!(pool.stats().current_lines, 0);
    assert_eq!(pool.stats().total_sampled, 7);
}

#[test]
fn thousand_line_scenario() {
    let pool = LinePool::new();
    pool.load(numbered("distinct", 1000));

    let first = pool.sample(10).unwrap();
    assert_eq!(first.iter().collect::<HashSet<_>>().len(), 10);
    assert_eq!(pool.stats().current_lines, 990);

    let rest = pool.sample(5000).unwrap();
    assert_eq!(rest.len(), 990);
    assert_eq!(pool.stats().current_lines, 0);

    let mut all: HashSet<String> = first.into_iter().collect();
    all.extend(rest);
    assert_eq!(all, numbered("distinct", 1000).into_iter().collect::<HashSet<_>>());

    assert!(pool.sample(1).unwrap().is_empty());
    let stats = pool.stats();
    assert_eq!(stats.total_loaded, 1000);
    assert_eq!(stats.total_sampled, 1000);
}

#[test]
fn same_seed_gives_same_samples() {
    let a = LinePool::new().with_rng_seed(7);
    let b = LinePool::new().with_rng_seed(7);
    a.load(numbered("line", 500));
    b.load(numbered("line", 500));

    assert_eq!(a.sample(50).unwrap(), b.sample(50).unwrap());
}

#[test]
fn sampling_is_roughly_uniform() {
    // each of 10 lines should be drawn first about 1/10 of the time
    let mut first_picks = [0u32; 10];
    let pool = LinePool::new().with_rng_seed(1234);
    for _ in 0..5_000 {
        pool.load(numbered("line", 10));
        let drawn = pool.sample(1).unwrap();
        let idx: usize = drawn[0].trim_start_matches("line ").parse().unwrap();
        first_picks[idx] += 1;
        pool.clear();
    }
    for count in first_picks.iter() {
        assert!((350..=650).contains(count), "skewed picks: {:?}", first_picks);
    }
}

#[test]
fn clear_keeps_counters() {
    let pool = LinePool::new();
    pool.load(numbered("line", 10));
    pool.sample(3).unwrap();

    assert_eq!(pool.clear(), 7);
    let stats = pool.stats();
    assert_eq!(stats.current_lines, 0);
    assert_eq!(stats.total_loaded, 10);
    assert_eq!(stats.total_sampled, 3);
    assert_eq!(stats.total_cleared, 7);
    assert_conserved(stats);
}

#[test]
fn reset_zeroes_counters() {
    let pool = LinePool::new();
    pool.load(numbered("line", 10));
    pool.sample(3).unwrap();
    pool.clear();
    pool.load(numbered("more", 4));

    assert_eq!(pool.reset(), 4);
    assert_eq!(pool.stats(), PoolStats::default());

    pool.load(numbered("again", 2));
    assert_eq!(pool.stats().total_loaded, 2);
}

#[test]
fn capacity_limit_truncates_loads() {
    let pool = LinePool::with_capacity_limit(10);
    assert_eq!(pool.capacity_limit(), Some(10));
    assert_eq!(pool.load(numbered("a", 6)), 6);
    assert_eq!(pool.load(numbered("b", 6)), 4);
    assert_eq!(pool.load(numbered("c", 6)), 0);

    let stats = pool.stats();
    assert_eq!(stats.current_lines, 10);
    assert_eq!(stats.total_loaded, 10);

    // sampling frees room again
    pool.sample(3).unwrap();
    assert_eq!(pool.load(numbered("d", 6)), 3);
}

#[test]
fn clones_share_the_same_pool() {
    let pool = LinePool::new();
    let handle = pool.clone();
    handle.load(numbered("line", 3));
    assert_eq!(pool.stats().current_lines, 3);
}

#[test]
fn concurrent_loads_lose_nothing() {
    let pool = LinePool::new();

    thread::scope(|s| {
        for t in 0..8 {
            let pool = pool.clone();
            s.spawn(move |_| {
                for chunk in 0..25 {
                    pool.load(numbered(&format!("t{} c{}", t, chunk), 40));
                }
            });
        }
    })
    .unwrap();

    let stats = pool.stats();
    assert_eq!(stats.current_lines, 8 * 25 * 40);
    assert_eq!(stats.total_loaded, 8 * 25 * 40);

    let drained = pool.sample(i64::MAX).unwrap();
    let unique: HashSet<_> = drained.iter().collect();
    assert_eq!(drained.len(), 8000);
    assert_eq!(unique.len(), 8000);
}

#[test]
fn concurrent_samples_never_overlap() {
    let pool = LinePool::new();
    pool.load(numbered("line", 10_000));

    let results: Vec<Vec<String>> = thread::scope(|s| {
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let pool = pool.clone();
                s.spawn(move |_| {
                    let mut mine = Vec::new();
                    for _ in 0..50 {
                        mine.extend(pool.sample(25).unwrap());
                    }
                    mine
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    let total: usize = results.iter().map(Vec::len).sum();
    let unique: HashSet<&String> = results.iter().flatten().collect();
    assert_eq!(total, 10 * 50 * 25);
    assert_eq!(unique.len(), total);
    assert_eq!(pool.stats().current_lines, 10_000 - total);
    assert_conserved(pool.stats());
}

#[test]
fn interleaved_loads_and_samples_stay_consistent() {
    let pool = LinePool::new();

    let sampled: Vec<Vec<String>> = thread::scope(|s| {
        for t in 0..4 {
            let pool = pool.clone();
            s.spawn(move |_| {
                for chunk in 0..50 {
                    pool.load(numbered(&format!("t{} c{}", t, chunk), 20));
                    assert_conserved(pool.stats());
                }
            });
        }
        let samplers: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                s.spawn(move |_| {
                    let mut mine = Vec::new();
                    for _ in 0..100 {
                        mine.extend(pool.sample(7).unwrap());
                        assert_conserved(pool.stats());
                    }
                    mine
                })
            })
            .collect();
        samplers.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    let mut seen: HashSet<String> = sampled.into_iter().flatten().collect();
    let sampled_count = seen.len() as u64;
    assert_eq!(pool.stats().total_sampled, sampled_count);

    // whatever is left, plus whatever was sampled, is exactly what was loaded
    for line in pool.sample(i64::MAX).unwrap() {
        assert!(seen.insert(line), "line returned twice");
    }
    assert_eq!(seen.len(), 4 * 50 * 20);
    assert_eq!(pool.stats().total_loaded, 4000);
}

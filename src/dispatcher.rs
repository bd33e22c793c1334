//! The worker pool and reporter (`spec.md` §4.8): fans work items out to a
//! fixed pool of threads and merges their results back into the output
//! sink, in order when `config.unordered` is false.
//!
//! Grounded on `crossbeam-channel`'s bounded MPSC/SPSC channels — the
//! closest idiomatic Rust stand-in for the spec's "point-to-point bounded
//! queue", and the shape a CLI worker pool in this corpus reaches for when
//! `std::sync::mpsc` isn't quite flexible enough (bounded capacity, cheap
//! cloning of senders across N workers).

use std::{
    io::Write,
    sync::Arc,
    thread,
};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::{
    config::{Config, RunSummary},
    worker::{self, ScanResult, WorkItem},
};

/// Bounded capacity for both work and result queues (`spec.md` §4.8).
const QUEUE_CAPACITY: usize = 512;

/// Run the full pipeline over `items` and write every report to `output`,
/// returning the aggregated summary. `output` is owned by the reporter
/// thread for the run's duration, matching "the output sink is written
/// only by the reporter" (`spec.md` §5).
pub fn run(items: Vec<WorkItem>, config: Arc<Config>, output: Box<dyn Write + Send>) -> RunSummary {
    if config.unordered {
        run_unordered(items, config, output)
    } else {
        run_ordered(items, config, output)
    }
}

fn spawn_worker(
    work_rx: Receiver<WorkItem>,
    result_tx: Sender<ScanResult>,
    config: Arc<Config>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for item in work_rx.iter() {
            let result = worker::scan(&item, &config);
            if result_tx.send(result).is_err() {
                break;
            }
        }
        let _ = result_tx.send(ScanResult::sentinel());
    })
}

fn write_report(output: &mut dyn Write, summary: &mut RunSummary, result: &ScanResult) {
    if !result.report.is_empty() {
        let _ = output.write_all(&result.report);
    }
    summary.add(result);
}

/// Ordered mode: N per-worker work/result queue pairs, round-robin submit
/// and round-robin consume on the same modulus, so output order equals
/// submission order without ever sorting (`spec.md` §4.8 / §9).
fn run_ordered(items: Vec<WorkItem>, config: Arc<Config>, mut output: Box<dyn Write + Send>) -> RunSummary {
    let n = config.worker_count;
    let total = items.len();

    let mut work_txs = Vec::with_capacity(n);
    let mut work_rxs = Vec::with_capacity(n);
    let mut result_txs = Vec::with_capacity(n);
    let mut result_rxs = Vec::with_capacity(n);
    for _ in 0..n {
        let (wt, wr) = bounded::<WorkItem>(QUEUE_CAPACITY);
        let (rt, rr) = bounded::<ScanResult>(QUEUE_CAPACITY);
        work_txs.push(wt);
        work_rxs.push(wr);
        result_txs.push(rt);
        result_rxs.push(rr);
    }

    let handles: Vec<_> = work_rxs
        .into_iter()
        .zip(result_txs)
        .map(|(wr, rt)| spawn_worker(wr, rt, Arc::clone(&config)))
        .collect();

    // Submitter: round-robins item k to worker k % n, on the calling thread.
    for (idx, item) in items.into_iter().enumerate() {
        let target = idx % n;
        if work_txs[target].send(item).is_err() {
            break;
        }
    }
    drop(work_txs); // closes every work queue once drained

    let reporter = thread::spawn(move || {
        let mut summary = RunSummary::default();
        for idx in 0..total {
            let target = idx % n;
            if let Ok(result) = result_rxs[target].recv() {
                write_report(&mut *output, &mut summary, &result);
            }
        }
        // Drain the sentinel each worker emits once its queue closes, so
        // the pool fully joins before the run is reported complete.
        for rx in &result_rxs {
            while let Ok(result) = rx.recv() {
                if result.complete {
                    break;
                }
                write_report(&mut *output, &mut summary, &result);
            }
        }
        let _ = output.flush();
        summary
    });

    for handle in handles {
        let _ = handle.join();
    }
    reporter.join().unwrap_or_default()
}

/// Unordered mode: one shared work queue, one shared result queue; all N
/// workers compete for items. Output order is whatever order results
/// arrive in, traded for higher throughput under uneven per-file cost.
fn run_unordered(items: Vec<WorkItem>, config: Arc<Config>, mut output: Box<dyn Write + Send>) -> RunSummary {
    let n = config.worker_count;
    let (work_tx, work_rx) = bounded::<WorkItem>(QUEUE_CAPACITY);
    let (result_tx, result_rx) = bounded::<ScanResult>(QUEUE_CAPACITY);

    let handles: Vec<_> = (0..n)
        .map(|_| spawn_worker(work_rx.clone(), result_tx.clone(), Arc::clone(&config)))
        .collect();
    drop(work_rx);
    drop(result_tx);

    for item in items {
        if work_tx.send(item).is_err() {
            break;
        }
    }
    drop(work_tx);

    let reporter = thread::spawn(move || {
        let mut summary = RunSummary::default();
        let mut sentinels = 0;
        while sentinels < n {
            match result_rx.recv() {
                Ok(result) if result.complete => sentinels += 1,
                Ok(result) => write_report(&mut *output, &mut summary, &result),
                Err(_) => break,
            }
        }
        let _ = output.flush();
        summary
    });

    for handle in handles {
        let _ = handle.join();
    }
    reporter.join().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use regex::Regex;

    fn config(selector_spec: &str, unordered: bool, worker_count: usize) -> Arc<Config> {
        let (selector, _) = Selector::parse(selector_spec);
        Arc::new(Config {
            worker_count,
            subject_only: true,
            recursive: false,
            visible_only: true,
            show_paths: true,
            show_lines: false,
            list_file: None,
            log_sink: None,
            output_sink: crate::config::Sink::Stdout,
            unordered,
            verbose: false,
            selector,
            pattern: Regex::new("if").unwrap(),
            value_query: None,
        })
    }

    /// A `Write` sink backed by a shared buffer, so the test can read the
    /// bytes back after handing ownership of the `Box<dyn Write + Send>`
    /// to the reporter thread.
    #[derive(Clone)]
    struct SharedBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn ordered_mode_preserves_submission_order_across_files() {
        // S6: F1 has ten matches, F2 has one; all of F1's records must
        // precede F2's regardless of worker count.
        let f1 = "if\n".repeat(10);
        let f2 = "if\n".to_string();
        let items = vec![
            WorkItem::from_bytes("f1.go", f1.into_bytes()),
            WorkItem::from_bytes("f2.go", f2.into_bytes()),
        ];
        let config = config("k", false, 4);
        let shared = SharedBuffer(Arc::new(std::sync::Mutex::new(Vec::new())));
        let summary = run(items, config, Box::new(shared.clone()));
        assert_eq!(summary.matches, 11);
        let buf = shared.0.lock().unwrap();
        let text = std::str::from_utf8(&buf).unwrap();
        let last_f1 = text.rfind("f1.go").unwrap();
        let first_f2 = text.find("f2.go").unwrap();
        assert!(last_f1 < first_f2);
    }

    #[test]
    fn unordered_mode_reports_every_file() {
        let items = vec![
            WorkItem::from_bytes("f1.go", b"if\n".to_vec()),
            WorkItem::from_bytes("f2.go", b"if\n".to_vec()),
            WorkItem::from_bytes("f3.go", b"if\n".to_vec()),
        ];
        let config = config("k", true, 3);
        let summary = run(items, config, Box::new(Vec::new()));
        assert_eq!(summary.matches, 3);
        assert_eq!(summary.files, 3);
    }
}

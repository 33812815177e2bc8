//! Half the threads put, half get, on a ring that is small for the thread
//! count. Run with `RUST_LOG=lap_mpmc=warn` to see escape-valve activity.

use lap_mpmc::Queue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const THREADS: usize = 10;
const WORK_PER_THREAD: usize = 1000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lap_mpmc=warn")),
        )
        .with_thread_ids(true)
        .init();

    let queue = Arc::new(Queue::<String>::new(16));
    let put = Arc::new(AtomicUsize::new(0));
    let got = Arc::new(AtomicUsize::new(0));
    let put_failed = Arc::new(AtomicUsize::new(0));
    let get_failed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|id| {
            let queue = queue.clone();
            let (put, got) = (put.clone(), got.clone());
            let (put_failed, get_failed) = (put_failed.clone(), get_failed.clone());
            thread::spawn(move || {
                if id % 2 == 0 {
                    // stop once consumers have clearly gone away
                    let (mut j, mut misses) = (0, 0);
                    while j < WORK_PER_THREAD && misses < 1000 {
                        let work = format!("id:{}: work{}", id, id * WORK_PER_THREAD + j);
                        match queue.put(work) {
                            Ok(_) => {
                                put.fetch_add(1, Ordering::Relaxed);
                                misses = 0;
                                j += 1;
                            }
                            Err(_) => {
                                put_failed.fetch_add(1, Ordering::Relaxed);
                                thread::sleep(Duration::from_micros(50));
                                misses += 1;
                            }
                        }
                    }
                } else {
                    // give up on a slot after a few consecutive misses
                    let (mut j, mut misses) = (0, 0);
                    while j < WORK_PER_THREAD {
                        match queue.get() {
                            Ok(_) => {
                                got.fetch_add(1, Ordering::Relaxed);
                                misses = 0;
                                j += 1;
                            }
                            Err(_) => {
                                get_failed.fetch_add(1, Ordering::Relaxed);
                                thread::sleep(Duration::from_micros(100));
                                misses += 1;
                                if misses > 5 {
                                    j += 1;
                                }
                            }
                        }
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let stats = queue.escape_stats();
    println!("put {}, and get {}", put.load(Ordering::Relaxed), got.load(Ordering::Relaxed));
    println!(
        "put failed {}, and get failed {}",
        put_failed.load(Ordering::Relaxed),
        get_failed.load(Ordering::Relaxed)
    );
    println!("discarded {}, placeholders {}", stats.discarded, stats.placeholders);
    println!("{}", queue.info());
}

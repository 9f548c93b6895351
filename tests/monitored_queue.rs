use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use floodgate::{MonitoredQueue, PopError, PushError, QueueState};

mod common;

const QUEUE_SIZE: usize = 10;
const LOW: usize = 3;
const HIGH: usize = 6;
const HIGH2: usize = 9;

fn watermarked(timed: bool) -> MonitoredQueue<i32> {
    common::init_logging();
    let queue = MonitoredQueue::with_timed_operations(QUEUE_SIZE, timed).named("test");
    queue.set_watermarks(LOW, HIGH, HIGH2).unwrap();
    queue
}

#[test]
fn count_tracks_pushes_minus_pops() {
    let queue = watermarked(false);
    let mut expected = 0usize;
    for round in 0..4 {
        for i in 0..(round + 3) {
            queue.try_push_back(i).unwrap();
            expected += 1;
            assert_eq!(queue.num_elements(), expected);
            assert!(!queue.is_empty());
        }
        for _ in 0..(round + 2) {
            queue.try_pop_front().unwrap();
            expected -= 1;
            assert_eq!(queue.num_elements(), expected);
            assert_eq!(queue.is_empty(), expected == 0);
        }
    }
    while queue.try_pop_front().is_ok() {}
    assert!(queue.is_empty());
    assert_eq!(queue.try_pop_front(), Err(PopError::Empty));
}

#[test]
fn watermark_hysteresis_on_the_way_down() {
    let queue = watermarked(false);

    for i in 0..6 {
        queue.push_back(i).unwrap();
    }
    assert_eq!(queue.state(), QueueState::HighWatermarkReached);
    for i in 6..9 {
        queue.push_back(i).unwrap();
    }
    assert_eq!(queue.state(), QueueState::HighWatermark2Reached);
    queue.push_back(9).unwrap();
    assert_eq!(queue.state(), QueueState::QueueFilled);

    // 10 -> 5: still elevated inside the band
    for _ in 0..5 {
        queue.pop_front().unwrap();
    }
    assert_eq!(queue.num_elements(), 5);
    assert_eq!(queue.state(), QueueState::HighWatermarkReached);

    // 5 -> 3: still above the low watermark boundary
    queue.pop_front().unwrap();
    queue.pop_front().unwrap();
    assert_eq!(queue.state(), QueueState::HighWatermarkReached);

    // 3 -> 2: below low
    queue.pop_front().unwrap();
    assert_eq!(queue.state(), QueueState::Normal);
}

#[test]
fn try_push_on_full_queue_is_rejected() {
    let queue = watermarked(false);
    for i in 0..QUEUE_SIZE as i32 {
        queue.try_push_back(i).unwrap();
    }
    match queue.try_push_back(10) {
        Err(PushError::Full(item)) => assert_eq!(item, 10),
        other => panic!("expected Full, got {other:?}"),
    }
    assert_eq!(queue.try_push_back(11).unwrap_err().code(), -1);
    assert_eq!(queue.num_elements(), QUEUE_SIZE);
}

#[test]
fn reset_full_queue() {
    let queue = watermarked(false);
    for i in 0..QUEUE_SIZE as i32 {
        queue.try_push_back(i).unwrap();
    }
    assert_eq!(queue.state(), QueueState::QueueFilled);

    queue.reset();

    assert_eq!(queue.capacity(), QUEUE_SIZE);
    assert_eq!(queue.num_elements(), 0);
    assert!(queue.is_empty());
    assert_eq!(queue.state(), QueueState::Normal);
}

#[test]
fn fifo_order_and_descending_states() {
    let queue = watermarked(false);
    for i in 0..10 {
        queue.push_back(i).unwrap();
    }

    let mut states = Vec::new();
    for expected in 0..10 {
        assert_eq!(queue.try_pop_front(), Ok(expected));
        states.push(queue.state());
    }

    // counts after each pop: 9, 8, ..., 0
    assert_eq!(states[0], QueueState::HighWatermark2Reached); // 9
    assert_eq!(states[1], QueueState::HighWatermarkReached); // 8
    assert_eq!(states[3], QueueState::HighWatermarkReached); // 6
    assert_eq!(states[6], QueueState::HighWatermarkReached); // 3
    assert_eq!(states[7], QueueState::Normal); // 2
    assert_eq!(states[9], QueueState::Normal); // 0
}

#[test]
fn blocked_pusher_resumes_after_pop() {
    let queue = Arc::new(watermarked(false));
    for i in 0..QUEUE_SIZE as i32 {
        queue.push_back(i).unwrap();
    }

    let done = Arc::new(AtomicBool::new(false));
    let handle = {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            queue.push_back(100).unwrap();
            done.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!done.load(Ordering::SeqCst));
    assert_eq!(queue.pop_front(), Ok(0));
    handle.join().unwrap();
    assert!(done.load(Ordering::SeqCst));
    assert_eq!(queue.num_elements(), QUEUE_SIZE);
}

#[test]
fn reset_unblocks_pushers_and_poppers() {
    let full = Arc::new(watermarked(false));
    for i in 0..QUEUE_SIZE as i32 {
        full.push_back(i).unwrap();
    }
    let pusher = {
        let queue = Arc::clone(&full);
        thread::spawn(move || queue.push_back(42))
    };

    let empty = Arc::new(watermarked(false));
    let popper = {
        let queue = Arc::clone(&empty);
        thread::spawn(move || queue.pop_front())
    };

    thread::sleep(Duration::from_millis(50));
    full.reset();
    empty.reset();

    assert!(pusher.join().unwrap().is_ok());
    assert_eq!(full.try_pop_front(), Ok(42));
    assert_eq!(popper.join().unwrap(), Err(PopError::Reset));
}

#[test]
fn disable_wakes_blocked_pusher() {
    let queue = Arc::new(watermarked(false));
    for i in 0..QUEUE_SIZE as i32 {
        queue.push_back(i).unwrap();
    }
    let pusher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push_back(7))
    };

    thread::sleep(Duration::from_millis(30));
    queue.disable_push_back();

    match pusher.join().unwrap() {
        Err(PushError::Disabled(item)) => assert_eq!(item, 7),
        other => panic!("expected Disabled, got {other:?}"),
    }
}

#[test]
fn timed_operations_respect_deadlines() {
    let queue = watermarked(true);
    let start = Instant::now();
    assert_eq!(
        queue.timed_pop_front(start + Duration::from_millis(25)),
        Err(PopError::Timeout)
    );
    assert!(start.elapsed() >= Duration::from_millis(25));

    let untimed = watermarked(false);
    assert_eq!(
        untimed.timed_pop_front(Instant::now()),
        Err(PopError::TimedOperationsUnsupported)
    );
}

#[test]
fn timed_pop_receives_item_pushed_later() {
    let queue = Arc::new(watermarked(true));
    let pusher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            queue.push_back(5).unwrap();
        })
    };
    let got = queue.timed_pop_front(Instant::now() + Duration::from_secs(5));
    pusher.join().unwrap();
    assert_eq!(got, Ok(5));
}

#[test]
fn timed_push_completes_once_space_frees_up() {
    let queue = Arc::new(watermarked(true));
    for i in 0..QUEUE_SIZE as i32 {
        queue.push_back(i).unwrap();
    }
    let popper = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            queue.pop_front()
        })
    };

    let res = queue.timed_push_back(100, Instant::now() + Duration::from_secs(5));
    assert_eq!(popper.join().unwrap(), Ok(0));
    assert!(res.is_ok());
    assert_eq!(queue.num_elements(), QUEUE_SIZE);

    let drained: Vec<i32> = std::iter::from_fn(|| queue.try_pop_front().ok()).collect();
    assert_eq!(drained.first(), Some(&1));
    assert_eq!(drained.last(), Some(&100));
}

#[test]
fn reset_interrupts_timed_pop() {
    let queue = Arc::new(watermarked(true));
    let popper = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.timed_pop_front(Instant::now() + Duration::from_secs(5)))
    };

    thread::sleep(Duration::from_millis(30));
    let start = Instant::now();
    queue.reset();

    assert_eq!(popper.join().unwrap(), Err(PopError::Reset));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn slow_callback_does_not_leave_stale_state_behind() {
    let queue = Arc::new(watermarked(false));
    let last_seen = Arc::new(Mutex::new(None));
    {
        let last_seen = Arc::clone(&last_seen);
        queue.on_state_change(move |_, to| {
            if to == QueueState::HighWatermarkReached {
                thread::sleep(Duration::from_millis(100));
            }
            *last_seen.lock().unwrap() = Some(to);
        });
    }

    for i in 0..(HIGH as i32 - 1) {
        queue.push_back(i).unwrap();
    }
    // crosses the high watermark; its callback is still sleeping below
    let pusher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push_back(99).unwrap())
    };
    thread::sleep(Duration::from_millis(30));
    assert_eq!(queue.num_elements(), HIGH);

    while queue.num_elements() >= LOW {
        queue.pop_front().unwrap();
    }
    pusher.join().unwrap();

    assert_eq!(queue.state(), QueueState::Normal);
    assert_eq!(*last_seen.lock().unwrap(), Some(QueueState::Normal));
}

#[test]
fn state_callback_throttles_producers() {
    let queue = Arc::new(watermarked(false));
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let throttled = Arc::new(AtomicBool::new(false));
    {
        let transitions = Arc::clone(&transitions);
        let throttled = Arc::clone(&throttled);
        queue.on_state_change(move |from, to| {
            transitions.lock().unwrap().push((from, to));
            throttled.store(to >= QueueState::HighWatermarkReached, Ordering::SeqCst);
        });
    }

    let mut pushed = 0;
    while !throttled.load(Ordering::SeqCst) {
        queue.push_back(pushed).unwrap();
        pushed += 1;
    }
    assert_eq!(pushed as usize, HIGH);

    while queue.num_elements() >= LOW {
        queue.pop_front().unwrap();
    }
    assert!(!throttled.load(Ordering::SeqCst));
    assert_eq!(
        *transitions.lock().unwrap(),
        vec![
            (QueueState::Normal, QueueState::HighWatermarkReached),
            (QueueState::HighWatermarkReached, QueueState::Normal),
        ]
    );
}

#[test]
fn mpmc_delivers_every_item_once() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 3;
    const PER_PRODUCER: usize = 5_000;

    common::init_logging();
    let queue: Arc<MonitoredQueue<Option<usize>>> = Arc::new(MonitoredQueue::new(64));
    queue.set_watermarks(16, 32, 48).unwrap();
    let received = Arc::new(AtomicUsize::new(0));
    let sum = Arc::new(AtomicUsize::new(0));

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let received = Arc::clone(&received);
            let sum = Arc::clone(&sum);
            thread::spawn(move || {
                while let Ok(Some(v)) = queue.pop_front() {
                    received.fetch_add(1, Ordering::Relaxed);
                    sum.fetch_add(v, Ordering::Relaxed);
                }
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.push_back(Some(p * PER_PRODUCER + i)).unwrap();
                }
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    for _ in 0..CONSUMERS {
        queue.push_back(None).unwrap();
    }
    for c in consumers {
        c.join().unwrap();
    }

    let total = PRODUCERS * PER_PRODUCER;
    assert_eq!(received.load(Ordering::Relaxed), total);
    assert_eq!(sum.load(Ordering::Relaxed), total * (total - 1) / 2);
    assert!(queue.is_empty());
    assert_eq!(queue.state(), QueueState::Normal);
}

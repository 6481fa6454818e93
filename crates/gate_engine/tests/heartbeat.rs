use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gate_engine::HeartbeatTimer;
use tokio::runtime::Handle;

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn fires_once_per_period_after_the_first_period() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let _timer = HeartbeatTimer::spawn_on(&Handle::current(), Duration::from_secs(30), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    settle().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(29)).await;
    settle().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(66)).await;
    settle().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_further_ticks() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let timer = HeartbeatTimer::spawn_on(&Handle::current(), Duration::from_secs(30), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_secs(31)).await;
    settle().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);

    timer.cancel();
    assert!(timer.is_cancelled());
    tokio::time::sleep(Duration::from_secs(120)).await;
    settle().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_timer_cancels_it() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let timer = HeartbeatTimer::spawn_on(&Handle::current(), Duration::from_secs(30), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    drop(timer);

    tokio::time::sleep(Duration::from_secs(90)).await;
    settle().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 0);
}

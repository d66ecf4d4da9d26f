//! Integration tests driving the timer toolkit the way the engine does:
//! a registry of keyed timers feeding messages into one command channel.

use std::time::Duration;

use manhunt_timer::{send_after, send_every, TaskRegistry};
use tokio::sync::mpsc;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Countdown,
    Fire(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Msg {
    Tick,
    Fired(u64),
}

/// The engine's respawn pattern: a one-shot "fire" plus a repeating
/// per-second ticker, both keyed, both cancelled together.
#[tokio::test(start_paused = true)]
async fn test_one_shot_and_ticker_pair_cancel_together() {
    let (tx, mut rx) = mpsc::channel(32);
    let mut timers = TaskRegistry::new();

    timers.insert(Key::Fire(1), send_after(Duration::from_secs(5), tx.clone(), Msg::Fired(1)));
    timers.insert(
        Key::Countdown,
        send_every(Duration::from_secs(1), Duration::ZERO, tx.clone(), Msg::Tick),
    );

    sleep(Duration::from_millis(2500)).await;
    // Two ticks so far; now the player leaves and both timers go.
    timers.cancel(&Key::Fire(1));
    timers.cancel(&Key::Countdown);
    sleep(Duration::from_secs(10)).await;

    let mut received = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        received.push(msg);
    }
    assert_eq!(received, vec![Msg::Tick, Msg::Tick]);
}

/// Replacing a keyed one-shot reschedules it: only the new deadline fires.
#[tokio::test(start_paused = true)]
async fn test_reinsert_reschedules_the_deadline() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut timers = TaskRegistry::new();

    timers.insert(Key::Fire(1), send_after(Duration::from_secs(5), tx.clone(), Msg::Fired(1)));
    sleep(Duration::from_secs(2)).await;
    timers.insert(Key::Fire(1), send_after(Duration::from_secs(5), tx.clone(), Msg::Fired(1)));

    // The original deadline (t=5) passes silently.
    sleep(Duration::from_secs(4)).await;
    assert!(rx.try_recv().is_err());

    // The replacement deadline (t=7) fires.
    sleep(Duration::from_secs(2)).await;
    assert_eq!(rx.recv().await, Some(Msg::Fired(1)));
}

/// Dropping the registry silences everything, even mid-countdown.
#[tokio::test(start_paused = true)]
async fn test_dropping_registry_stops_all_timers() {
    let (tx, mut rx) = mpsc::channel::<Msg>(32);
    {
        let mut timers = TaskRegistry::new();
        timers.insert(
            Key::Countdown,
            send_every(Duration::from_secs(1), Duration::ZERO, tx.clone(), Msg::Tick),
        );
        timers.insert(Key::Fire(1), send_after(Duration::from_secs(3), tx.clone(), Msg::Fired(1)));
        sleep(Duration::from_millis(1500)).await;
    }

    sleep(Duration::from_secs(10)).await;
    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    assert_eq!(count, 1, "only the tick before the drop may arrive");
}

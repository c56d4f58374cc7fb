use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::models::{parse_timestamp, RawTimestamp};

use super::status::LiveSessionStatus;

/// Seconds elapsed since a started session's status change, republished once
/// per second. Reports 0 while the session is not started or the start
/// timestamp cannot be normalized.
pub struct ElapsedTimer {
    started_at: Mutex<Option<DateTime<Utc>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    tx: watch::Sender<u64>,
}

impl Default for ElapsedTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ElapsedTimer {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            started_at: Mutex::new(None),
            ticker: Mutex::new(None),
            tx,
        }
    }

    /// Push-style view for consumers that render every tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Current elapsed seconds, computed on demand. Never negative.
    pub fn elapsed_seconds(&self) -> u64 {
        match *lock(&self.started_at) {
            Some(start) => elapsed_since(start, Utc::now()),
            None => 0,
        }
    }

    /// Re-derives the timer from the session's status and start timestamp.
    /// Any previous ticker is torn down first, so re-syncing on every status
    /// or timestamp change never leaks intervals or double-ticks.
    pub fn sync(&self, status: LiveSessionStatus, updated_at: Option<&RawTimestamp>) {
        self.cancel_ticker();

        let start = if status == LiveSessionStatus::Started {
            updated_at.and_then(parse_timestamp)
        } else {
            None
        };
        *lock(&self.started_at) = start;

        match start {
            Some(start) => {
                self.tx.send_replace(elapsed_since(start, Utc::now()));
                self.spawn_ticker(start);
            }
            None => {
                self.tx.send_replace(0);
            }
        }
    }

    fn spawn_ticker(&self, start: DateTime<Utc>) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(1));
            // The first tick completes immediately and the initial value was
            // already published by sync().
            interval.tick().await;
            loop {
                interval.tick().await;
                tx.send_replace(elapsed_since(start, Utc::now()));
            }
        });
        *lock(&self.ticker) = Some(handle);
    }

    fn cancel_ticker(&self) {
        if let Some(handle) = lock(&self.ticker).take() {
            handle.abort();
        }
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

fn elapsed_since(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - start).num_seconds().max(0) as u64
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

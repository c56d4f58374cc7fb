use chrono::{DateTime, Utc};

/// Time remaining until an upcoming session's scheduled start, with the
/// label the session cards render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Countdown {
    pub label: String,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub is_expired: bool,
}

/// Derives the pre-session countdown. Only `upcoming` sessions count down;
/// any other live status (or a missing start time) yields the empty
/// countdown. Recomputed by the caller on its own one-second cadence.
pub fn countdown_to_start(
    start_time: Option<DateTime<Utc>>,
    live_status: Option<&str>,
    now: DateTime<Utc>,
) -> Countdown {
    if live_status != Some("upcoming") {
        return Countdown::default();
    }
    let Some(start) = start_time else {
        return Countdown::default();
    };

    let remaining_ms = (start - now).num_milliseconds();
    if remaining_ms <= 0 {
        return Countdown {
            label: "Starting now".into(),
            is_expired: true,
            ..Countdown::default()
        };
    }

    let hours = remaining_ms / (1000 * 60 * 60);
    let minutes = (remaining_ms % (1000 * 60 * 60)) / (1000 * 60);
    let seconds = (remaining_ms % (1000 * 60)) / 1000;

    let label = if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    };

    Countdown {
        label,
        hours,
        minutes,
        seconds,
        is_expired: false,
    }
}

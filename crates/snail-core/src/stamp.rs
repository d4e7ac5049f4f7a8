use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display format for bookkeeping timestamps, e.g. `Jun 10 2024 06:13:20`.
pub const DISPLAY_FORMAT: &str = "%b %d %Y %H:%M:%S";

/// A point in time as fractional seconds since the Unix epoch.
///
/// Stamps are stored as strings (`"1718000000.25"`) and shown to callers in
/// [`DISPLAY_FORMAT`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Stamp(f64);

impl Stamp {
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn secs(&self) -> f64 {
        self.0
    }

    /// Encode for storage. Always carries a fractional part.
    pub fn encode(&self) -> String {
        format!("{:?}", self.0)
    }

    /// Parse a stored stamp.
    pub fn parse(s: &str) -> Option<Self> {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Self)
    }

    /// Render in [`DISPLAY_FORMAT`], in UTC.
    pub fn display(&self) -> String {
        let secs = self.0.floor();
        let nanos = ((self.0 - secs) * 1e9) as u32;
        match DateTime::<Utc>::from_timestamp(secs as i64, nanos) {
            Some(dt) => dt.format(DISPLAY_FORMAT).to_string(),
            None => self.encode(),
        }
    }
}

impl std::fmt::Display for Stamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Source of bookkeeping timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Stamp;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Stamp {
        Stamp(Utc::now().timestamp_micros() as f64 / 1_000_000.0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-utils"))]
mod manual {
    use super::*;
    use std::sync::Mutex;

    /// Clock that only moves when told to.
    pub struct ManualClock {
        now: Mutex<f64>,
    }

    impl ManualClock {
        pub fn new(secs: f64) -> Self {
            Self {
                now: Mutex::new(secs),
            }
        }

        pub fn advance(&self, secs: f64) {
            *self.now.lock().unwrap() += secs;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Stamp {
            Stamp(*self.now.lock().unwrap())
        }
    }
}

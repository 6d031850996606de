use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock timestamp in UTC. Entries persist it at whole-second
/// precision.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtcTime(DateTime<Utc>);

impl UtcTime {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Seconds outside chrono's range fall back to the epoch.
    pub fn from_unix_secs(secs: i64) -> Self {
        Self(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    pub fn unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn to_system_time(&self) -> SystemTime {
        let secs = self.unix_secs();
        let offset = Duration::from_secs(secs.unsigned_abs());
        if secs < 0 {
            UNIX_EPOCH - offset
        } else {
            UNIX_EPOCH + offset
        }
    }
}

impl fmt::Display for UtcTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_secs() {
        let t = UtcTime::from_unix_secs(1_700_000_000);
        assert_eq!(t.unix_secs(), 1_700_000_000);
        assert_eq!(t.to_system_time(), UNIX_EPOCH + Duration::from_secs(1_700_000_000));
        assert_eq!(t.to_string(), "2023-11-14T22:13:20Z");
        assert!(UtcTime::now() > t);
    }

    #[test]
    fn test_epoch_and_before() {
        assert_eq!(UtcTime::default().unix_secs(), 0);
        assert_eq!(UtcTime::default().to_system_time(), UNIX_EPOCH);
        assert_eq!(
            UtcTime::from_unix_secs(-60).to_system_time(),
            UNIX_EPOCH - Duration::from_secs(60)
        );
        assert_eq!(UtcTime::from_unix_secs(i64::MAX), UtcTime::default());
    }
}

//! Timestamp utilities and batch sync windows

use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Timestamp format expected by the remote CRM for date fields
pub fn remote_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Which records a batch run considers, by creation date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncWindow {
    /// Full sync: every record regardless of date
    All,
    /// Records created within `[from, to]` (inclusive)
    Range {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl SyncWindow {
    /// Resolve a window from optional bounds
    ///
    /// A missing `from` defaults to `now - lookback`, a missing `to` to `now`.
    pub fn resolve(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        full_sync: bool,
        now: DateTime<Utc>,
        lookback: Duration,
    ) -> Self {
        if full_sync {
            return SyncWindow::All;
        }

        SyncWindow::Range {
            from: from.unwrap_or(now - lookback),
            to: to.unwrap_or(now),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        match self {
            SyncWindow::All => true,
            SyncWindow::Range { from, to } => *from <= at && at <= *to,
        }
    }

    pub fn is_full_sync(&self) -> bool {
        matches!(self, SyncWindow::All)
    }
}

/// Window plus optional result cap for a streaming query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSelection {
    pub window: SyncWindow,
    pub limit: Option<u32>,
}

impl SyncSelection {
    /// A zero limit means "no limit"
    pub fn new(window: SyncWindow, limit: Option<u32>) -> Self {
        Self {
            window,
            limit: limit.filter(|l| *l > 0),
        }
    }

    pub fn all() -> Self {
        Self::new(SyncWindow::All, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_remote_timestamp_format() {
        assert_eq!(remote_timestamp(at(9)), "2024-03-01T09:00:00");
    }

    #[test]
    fn test_full_sync_ignores_bounds() {
        let window = SyncWindow::resolve(Some(at(1)), Some(at(2)), true, at(3), Duration::hours(1));
        assert_eq!(window, SyncWindow::All);
        assert!(window.contains(at(23)));
    }

    #[test]
    fn test_default_bounds_use_lookback() {
        let window = SyncWindow::resolve(None, None, false, at(12), Duration::minutes(30));
        assert_eq!(
            window,
            SyncWindow::Range {
                from: at(12) - Duration::minutes(30),
                to: at(12),
            }
        );
    }

    #[test]
    fn test_range_is_inclusive() {
        let window = SyncWindow::Range { from: at(1), to: at(5) };
        assert!(window.contains(at(1)));
        assert!(window.contains(at(5)));
        assert!(!window.contains(at(6)));
        assert!(!window.contains(at(0)));
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        assert_eq!(SyncSelection::new(SyncWindow::All, Some(0)).limit, None);
        assert_eq!(SyncSelection::new(SyncWindow::All, Some(5)).limit, Some(5));
    }
}

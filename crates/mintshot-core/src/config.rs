//! Pipeline configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::range::RangeSpec;

/// Default chain queried for assets
pub const DEFAULT_CHAIN: &str = "zksync";

/// Default length of the event search window
pub const DEFAULT_EVENT_WINDOW_DAYS: i64 = 20;

const SECONDS_PER_DAY: i64 = 86_400;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required setting absent
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// Setting present but unusable
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    /// Create invalid-value error
    #[inline]
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// Inclusive event search window in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    /// Window start
    pub from: i64,
    /// Window end
    pub to: i64,
}

impl EventWindow {
    /// Create window, rejecting inverted bounds
    pub fn new(from: i64, to: i64) -> Result<Self, ConfigError> {
        if from > to {
            return Err(ConfigError::invalid(
                "event window",
                format!("start {from} is after end {to}"),
            ));
        }
        Ok(Self { from, to })
    }

    /// Window of `days` ending at `now`
    ///
    /// # Errors
    /// `ConfigError::Invalid` for a negative length or one reaching past the
    /// range of unix seconds
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Result<Self, ConfigError> {
        if days < 0 {
            return Err(ConfigError::invalid(
                "event window days",
                format!("{days} is negative"),
            ));
        }
        let to = now.timestamp();
        let from = days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|span| to.checked_sub(span))
            .ok_or_else(|| {
                ConfigError::invalid("event window days", format!("{days} days is out of range"))
            })?;
        Ok(Self { from, to })
    }

    /// Whether `ts` falls inside the window
    #[inline]
    #[must_use]
    pub fn contains(&self, ts: i64) -> bool {
        (self.from..=self.to).contains(&ts)
    }
}

impl Default for EventWindow {
    fn default() -> Self {
        let to = Utc::now().timestamp();
        Self {
            from: to - DEFAULT_EVENT_WINDOW_DAYS * SECONDS_PER_DAY,
            to,
        }
    }
}

/// Status cell values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabels {
    /// Value for processed rows
    pub processed: String,
    /// Value for rows without usable assets
    pub failed_no_assets: String,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            processed: "Processed".to_string(),
            failed_no_assets: "failed - no nfts".to_string(),
        }
    }
}

/// Time budgets for external calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Rendering one URL
    pub render: Duration,
    /// Uploading one image
    pub upload: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            render: Duration::from_secs(60),
            upload: Duration::from_secs(60),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Target spreadsheet id
    pub spreadsheet_id: String,
    /// Range holding wallet and status columns
    pub range: RangeSpec,
    /// Column the status is written to
    pub status_column: String,
    /// First column result URLs are written to
    pub result_start_column: String,
    /// Chain identifier passed to discovery
    pub chain: String,
    /// Maximum assets listed per wallet
    pub asset_limit: u32,
    /// Maximum events listed per asset
    pub event_limit: u32,
    /// Event search window
    pub event_window: EventWindow,
    /// Status cell values
    pub status_labels: StatusLabels,
    /// Time budgets
    pub timeouts: Timeouts,
}

impl PipelineConfig {
    /// Create configuration for a spreadsheet with defaults
    #[must_use]
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            ..Self::default()
        }
    }

    /// With range
    #[inline]
    #[must_use]
    pub fn with_range(mut self, range: RangeSpec) -> Self {
        self.range = range;
        self
    }

    /// With status column
    #[inline]
    #[must_use]
    pub fn with_status_column(mut self, column: impl Into<String>) -> Self {
        self.status_column = column.into();
        self
    }

    /// With first result column
    #[inline]
    #[must_use]
    pub fn with_result_start_column(mut self, column: impl Into<String>) -> Self {
        self.result_start_column = column.into();
        self
    }

    /// With chain
    #[inline]
    #[must_use]
    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }

    /// With listing limits
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, asset_limit: u32, event_limit: u32) -> Self {
        self.asset_limit = asset_limit;
        self.event_limit = event_limit;
        self
    }

    /// With event window
    #[inline]
    #[must_use]
    pub fn with_event_window(mut self, window: EventWindow) -> Self {
        self.event_window = window;
        self
    }

    /// With status labels
    #[inline]
    #[must_use]
    pub fn with_status_labels(mut self, labels: StatusLabels) -> Self {
        self.status_labels = labels;
        self
    }

    /// With timeouts
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::Missing("spreadsheet id"));
        }
        crate::cursor::column_number(&self.status_column)
            .ok_or_else(|| ConfigError::invalid("status column", self.status_column.clone()))?;
        crate::cursor::column_number(&self.result_start_column).ok_or_else(|| {
            ConfigError::invalid("result start column", self.result_start_column.clone())
        })?;
        if self.asset_limit == 0 {
            return Err(ConfigError::invalid("asset limit", "must be positive"));
        }
        if self.event_limit == 0 {
            return Err(ConfigError::invalid("event limit", "must be positive"));
        }
        let labels = &self.status_labels;
        if labels.processed.trim().is_empty()
            || labels.failed_no_assets.trim().is_empty()
            || labels.processed == labels.failed_no_assets
        {
            return Err(ConfigError::invalid(
                "status labels",
                "must be non-blank and distinct",
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: RangeSpec::default(),
            status_column: "P".to_string(),
            result_start_column: "Q".to_string(),
            chain: DEFAULT_CHAIN.to_string(),
            asset_limit: 20,
            event_limit: 20,
            event_window: EventWindow::default(),
            status_labels: StatusLabels::default(),
            timeouts: Timeouts::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn trailing_window() {
        let now = Utc.timestamp_opt(1_710_068_036, 0).unwrap();
        let window = EventWindow::trailing_days(now, 20).unwrap();
        assert_eq!(window.to, 1_710_068_036);
        assert_eq!(window.from, 1_708_340_036);
        assert!(window.contains(1_709_000_000));
        assert!(!window.contains(1_700_000_000));
    }

    #[test]
    fn trailing_window_rejects_negative_and_overflowing_lengths() {
        let now = Utc.timestamp_opt(1_710_068_036, 0).unwrap();
        assert!(matches!(
            EventWindow::trailing_days(now, -1),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            EventWindow::trailing_days(now, 200_000_000_000_000),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            EventWindow::trailing_days(DateTime::<Utc>::MIN_UTC, i64::MAX / SECONDS_PER_DAY),
            Err(ConfigError::Invalid { .. })
        ));
        assert_eq!(EventWindow::trailing_days(now, 0).unwrap().from, 1_710_068_036);
    }

    #[test]
    fn inverted_window_rejected() {
        assert!(EventWindow::new(10, 5).is_err());
        assert!(EventWindow::new(5, 5).is_ok());
    }

    #[test]
    fn defaults_match_sheet_layout() {
        let config = PipelineConfig::new("sheet-1");
        assert_eq!(config.status_column, "P");
        assert_eq!(config.result_start_column, "Q");
        assert_eq!(config.chain, DEFAULT_CHAIN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_errors() {
        assert_eq!(
            PipelineConfig::default().validate(),
            Err(ConfigError::Missing("spreadsheet id"))
        );
        assert!(PipelineConfig::new("s")
            .with_result_start_column("Q1")
            .validate()
            .is_err());
        assert!(PipelineConfig::new("s").with_limits(0, 20).validate().is_err());

        let same = StatusLabels {
            processed: "done".to_string(),
            failed_no_assets: "done".to_string(),
        };
        assert!(PipelineConfig::new("s").with_status_labels(same).validate().is_err());
    }
}

//! Environment-driven settings
//!
//! Every value is read through a lookup function so tests can supply a map
//! instead of the process environment. Blank values count as unset.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mintshot_core::{ConfigError, EventWindow, PipelineConfig, RangeSpec, StatusLabels, Timeouts};
use mintshot_element::ElementConfig;
use mintshot_google::{DatabaseConfig, OAuthConfig, SheetsConfig, StorageConfig};
use mintshot_render::ChromeConfig;

/// Redirect URI used when `REDIRECT_URI` is unset
pub(crate) const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Where the event search window comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowSetting {
    /// `EVENT_FROM_TIME`/`EVENT_TO_TIME`
    Fixed(EventWindow),
    /// Trailing days ending at the start of each pass
    Trailing(i64),
}

impl WindowSetting {
    pub(crate) fn resolve(self, now: DateTime<Utc>) -> Result<EventWindow, ConfigError> {
        match self {
            Self::Fixed(window) => Ok(window),
            Self::Trailing(days) => EventWindow::trailing_days(now, days),
        }
    }
}

/// Everything a pipeline run needs
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) pipeline: PipelineConfig,
    pub(crate) event_window: WindowSetting,
    pub(crate) oauth: OAuthConfig,
    pub(crate) sheets: SheetsConfig,
    pub(crate) database: DatabaseConfig,
    pub(crate) storage: StorageConfig,
    pub(crate) element: ElementConfig,
    pub(crate) chrome: ChromeConfig,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);
        let oauth = oauth_from(&env)?;
        if oauth.refresh_token.is_none() && oauth.access_token.is_none() {
            return Err(ConfigError::Missing("REFRESH_TOKEN"));
        }

        let http_timeout = env
            .parse::<u64>("HTTP_TIMEOUT_SECS")?
            .map(Duration::from_secs);
        let render_timeout = env
            .parse::<u64>("RENDER_TIMEOUT_SECS")?
            .map_or(Duration::from_secs(60), Duration::from_secs);

        let mut pipeline = PipelineConfig::new(env.required("GOOGLE_SHEET_ID")?);
        if let Some(range) = env.optional("SHEET_RANGE") {
            pipeline = pipeline.with_range(parse_range("SHEET_RANGE", &range)?);
        }
        if let Some(column) = env.optional("STATUS_COLUMN") {
            pipeline = pipeline.with_status_column(column.to_ascii_uppercase());
        }
        if let Some(column) = env.optional("RESULT_START_COLUMN") {
            pipeline = pipeline.with_result_start_column(column.to_ascii_uppercase());
        }
        if let Some(chain) = env.optional("ELEMENT_CHAIN") {
            pipeline = pipeline.with_chain(chain);
        }
        let mut labels = StatusLabels::default();
        if let Some(label) = env.optional("STATUS_PROCESSED_LABEL") {
            labels.processed = label;
        }
        if let Some(label) = env.optional("STATUS_FAILED_LABEL") {
            labels.failed_no_assets = label;
        }
        pipeline = pipeline.with_status_labels(labels);
        pipeline = pipeline.with_timeouts(Timeouts {
            render: render_timeout,
            upload: http_timeout.unwrap_or(Timeouts::default().upload),
        });

        let event_window = window_from(&env)?;
        pipeline = pipeline.with_event_window(event_window.resolve(Utc::now())?);
        pipeline.validate()?;

        let mut sheets = SheetsConfig::default();
        let mut database = DatabaseConfig::new(env.required("FIREBASE_DATABASE_URL")?);
        if let Some(token) = env.optional("FIREBASE_AUTH_TOKEN") {
            database = database.with_auth_token(token);
        }
        let mut storage = StorageConfig::new(env.required("STORAGE_BUCKET")?);
        let mut element = ElementConfig::new(env.required("ELEMENT_API_KEY")?);
        if let Some(url) = env.optional("ELEMENT_BASE_URL") {
            element = element.with_base_url(url);
        }
        if let Some(timeout) = http_timeout {
            sheets = sheets.with_timeout(timeout);
            database = database.with_timeout(timeout);
            storage = storage.with_timeout(timeout);
            element = element.with_timeout(timeout);
        }

        let chrome = ChromeConfig::new(
            env.optional("CHROME_PATH")
                .unwrap_or_else(|| ChromeConfig::DEFAULT_EXECUTABLE.to_string()),
        )
        .with_timeout(render_timeout);

        Ok(Self {
            pipeline,
            event_window,
            oauth,
            sheets,
            database,
            storage,
            element,
            chrome,
        })
    }

    /// Pipeline configuration for a pass starting at `now`
    pub(crate) fn pipeline_at(&self, now: DateTime<Utc>) -> Result<PipelineConfig, ConfigError> {
        Ok(self
            .pipeline
            .clone()
            .with_event_window(self.event_window.resolve(now)?))
    }
}

/// OAuth client settings alone, for the code exchange
pub(crate) fn oauth_from_env() -> Result<OAuthConfig, ConfigError> {
    oauth_from(&Env(|key: &str| std::env::var(key).ok()))
}

/// Parse a range given on the command line or in the environment
pub(crate) fn parse_range(key: &'static str, text: &str) -> Result<RangeSpec, ConfigError> {
    RangeSpec::parse(text).map_err(|err| ConfigError::invalid(key, err.to_string()))
}

fn oauth_from<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<OAuthConfig, ConfigError> {
    let mut oauth = OAuthConfig::new(
        env.required("CLIENT_ID")?,
        env.required("CLIENT_SECRET")?,
        env.optional("REDIRECT_URI")
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
    );
    if let Some(token) = env.optional("REFRESH_TOKEN") {
        oauth = oauth.with_refresh_token(token);
    }
    if let Some(token) = env.optional("GOOGLE_ACCESS_TOKEN") {
        oauth = oauth.with_access_token(token);
    }
    if let Some(secs) = env.parse::<u64>("HTTP_TIMEOUT_SECS")? {
        oauth = oauth.with_timeout(Duration::from_secs(secs));
    }
    Ok(oauth)
}

fn window_from<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<WindowSetting, ConfigError> {
    match (
        env.parse::<i64>("EVENT_FROM_TIME")?,
        env.parse::<i64>("EVENT_TO_TIME")?,
    ) {
        (Some(from), Some(to)) => Ok(WindowSetting::Fixed(EventWindow::new(from, to)?)),
        (None, None) => {
            let days = env
                .parse::<i64>("EVENT_WINDOW_DAYS")?
                .unwrap_or(mintshot_core::config::DEFAULT_EVENT_WINDOW_DAYS);
            if let Err(ConfigError::Invalid { message, .. }) =
                EventWindow::trailing_days(Utc::now(), days)
            {
                return Err(ConfigError::invalid("EVENT_WINDOW_DAYS", message));
            }
            Ok(WindowSetting::Trailing(days))
        }
        (Some(_), None) => Err(ConfigError::Missing("EVENT_TO_TIME")),
        (None, Some(_)) => Err(ConfigError::Missing("EVENT_FROM_TIME")),
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|value| {
                value
                    .parse()
                    .map_err(|err: T::Err| ConfigError::invalid(key, format!("{value}: {err}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("GOOGLE_SHEET_ID", "sheet-1"),
            ("CLIENT_ID", "client"),
            ("CLIENT_SECRET", "secret"),
            ("REFRESH_TOKEN", "refresh"),
            ("FIREBASE_DATABASE_URL", "https://proj-default-rtdb.firebaseio.com"),
            ("STORAGE_BUCKET", "proj.appspot.com"),
            ("ELEMENT_API_KEY", "element"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()))
    }

    #[test]
    fn minimal_environment_uses_defaults() {
        let settings = load(&base()).unwrap();

        assert_eq!(settings.pipeline.spreadsheet_id, "sheet-1");
        assert_eq!(settings.pipeline.range.to_string(), "O2:P");
        assert_eq!(settings.pipeline.status_column, "P");
        assert_eq!(settings.pipeline.result_start_column, "Q");
        assert_eq!(settings.pipeline.chain, "zksync");
        assert_eq!(settings.event_window, WindowSetting::Trailing(20));
        assert_eq!(settings.oauth.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(settings.chrome.executable.to_str(), Some("chromium"));
        assert_eq!(settings.database.auth_token, None);
    }

    #[test]
    fn overrides_are_applied() {
        let mut vars = base();
        vars.extend([
            ("SHEET_RANGE", "Form Responses 1!O5:P"),
            ("STATUS_COLUMN", "p"),
            ("RESULT_START_COLUMN", "z"),
            ("ELEMENT_CHAIN", "linea"),
            ("EVENT_FROM_TIME", "1708340036"),
            ("EVENT_TO_TIME", "1710068036"),
            ("HTTP_TIMEOUT_SECS", "12"),
            ("RENDER_TIMEOUT_SECS", "90"),
            ("CHROME_PATH", "/usr/bin/google-chrome"),
            ("FIREBASE_AUTH_TOKEN", "db-secret"),
        ]);
        let settings = load(&vars).unwrap();

        assert_eq!(settings.pipeline.range.sheet.as_deref(), Some("Form Responses 1"));
        assert_eq!(settings.pipeline.range.first_row, 5);
        assert_eq!(settings.pipeline.result_start_column, "Z");
        assert_eq!(settings.pipeline.chain, "linea");
        assert_eq!(
            settings.event_window,
            WindowSetting::Fixed(EventWindow::new(1_708_340_036, 1_710_068_036).unwrap())
        );
        assert_eq!(settings.pipeline.timeouts.render, Duration::from_secs(90));
        assert_eq!(settings.pipeline.timeouts.upload, Duration::from_secs(12));
        assert_eq!(settings.sheets.timeout, Duration::from_secs(12));
        assert_eq!(settings.chrome.timeout, Duration::from_secs(90));
        assert_eq!(settings.database.auth_token.as_deref(), Some("db-secret"));
        assert_eq!(settings.pipeline.status_labels, StatusLabels::default());
    }

    #[test]
    fn status_labels_can_be_renamed() {
        let mut vars = base();
        vars.extend([
            ("STATUS_PROCESSED_LABEL", "done"),
            ("STATUS_FAILED_LABEL", "no mints"),
        ]);
        let labels = load(&vars).unwrap().pipeline.status_labels;
        assert_eq!(labels.processed, "done");
        assert_eq!(labels.failed_no_assets, "no mints");
    }

    #[test]
    fn missing_variable_is_named() {
        let mut vars = base();
        vars.remove("STORAGE_BUCKET");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Missing("STORAGE_BUCKET"))
        ));
    }

    #[test]
    fn blank_counts_as_missing() {
        let mut vars = base();
        vars.insert("GOOGLE_SHEET_ID", "   ");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Missing("GOOGLE_SHEET_ID"))
        ));
    }

    #[test]
    fn google_credentials_are_required() {
        let mut vars = base();
        vars.remove("REFRESH_TOKEN");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Missing("REFRESH_TOKEN"))
        ));

        vars.insert("GOOGLE_ACCESS_TOKEN", "ya29.seed");
        assert!(load(&vars).is_ok());
    }

    #[test]
    fn half_open_window_is_rejected() {
        let mut vars = base();
        vars.insert("EVENT_FROM_TIME", "1708340036");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Missing("EVENT_TO_TIME"))
        ));
    }

    #[test]
    fn unparsable_numbers_name_the_variable() {
        let mut vars = base();
        vars.insert("HTTP_TIMEOUT_SECS", "soon");
        match load(&vars) {
            Err(ConfigError::Invalid { key, message }) => {
                assert_eq!(key, "HTTP_TIMEOUT_SECS");
                assert!(message.starts_with("soon"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn trailing_window_moves_with_each_pass() {
        let settings = load(&base()).unwrap();
        let first = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let later = DateTime::from_timestamp(1_700_086_400, 0).unwrap();

        let a = settings.pipeline_at(first).unwrap().event_window;
        let b = settings.pipeline_at(later).unwrap().event_window;
        assert_eq!(b.to - a.to, 86_400);
        assert_eq!(a.to - a.from, 20 * 86_400);
    }

    #[test]
    fn window_days_must_be_a_usable_length() {
        for days in ["-3", "200000000000000"] {
            let mut vars = base();
            vars.insert("EVENT_WINDOW_DAYS", days);
            match load(&vars) {
                Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "EVENT_WINDOW_DAYS"),
                other => panic!("{days}: unexpected {other:?}"),
            }
        }

        let mut vars = base();
        vars.insert("EVENT_WINDOW_DAYS", "45");
        assert_eq!(load(&vars).unwrap().event_window, WindowSetting::Trailing(45));
    }
}

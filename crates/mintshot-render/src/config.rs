//! Browser settings

use std::path::PathBuf;
use std::time::Duration;

/// Desktop Chrome user agent presented to preview pages
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Headless browser configuration
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Chrome or Chromium binary
    pub executable: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    /// Virtual time the page gets to settle before the capture
    pub virtual_time_budget: Duration,
    /// Wall-clock limit for one browser run
    pub timeout: Duration,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Additional command-line switches
    pub extra_args: Vec<String>,
}

impl ChromeConfig {
    pub const DEFAULT_EXECUTABLE: &'static str = "chromium";

    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            viewport_width: 1280,
            viewport_height: 800,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            virtual_time_budget: Duration::from_secs(5),
            timeout: Duration::from_secs(60),
            jpeg_quality: 85,
            extra_args: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_virtual_time_budget(mut self, budget: Duration) -> Self {
        self.virtual_time_budget = budget;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Quality is clamped to 1-100
    #[inline]
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EXECUTABLE)
    }
}

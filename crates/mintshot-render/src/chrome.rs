//! Chromium process driver

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use mintshot_core::{RenderSession, RenderedImage, Renderer, ServiceError};

use crate::codec::normalize_to_jpeg;
use crate::config::ChromeConfig;
use crate::error::RenderError;

const STDERR_TAIL: usize = 512;

/// Opens one [`ChromeSession`] per row
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    config: Arc<ChromeConfig>,
}

impl ChromeRenderer {
    #[must_use]
    pub fn new(config: ChromeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ChromeConfig {
        &self.config
    }

    /// Start a session with a fresh profile directory
    ///
    /// # Errors
    /// `RenderError::Io` when the profile directory cannot be created
    pub fn session(&self) -> Result<ChromeSession, RenderError> {
        let profile = tempfile::Builder::new()
            .prefix("mintshot-profile-")
            .tempdir()?;
        tracing::debug!(profile = %profile.path().display(), "browser session opened");
        Ok(ChromeSession {
            config: Arc::clone(&self.config),
            profile,
            captures: 0,
        })
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ServiceError> {
        Ok(Box::new(self.session()?))
    }
}

/// Browser session bound to one profile directory
///
/// The directory is removed on [`ChromeSession::shutdown`], or on drop if
/// the session is abandoned.
#[derive(Debug)]
pub struct ChromeSession {
    config: Arc<ChromeConfig>,
    profile: TempDir,
    captures: u32,
}

impl ChromeSession {
    /// Profile directory of this session
    #[must_use]
    pub fn profile_dir(&self) -> &Path {
        self.profile.path()
    }

    /// Screenshot `url` and return it as JPEG
    ///
    /// # Errors
    /// Launch, timeout, exit status, missing output or codec failures
    pub async fn capture(&mut self, url: &str) -> Result<RenderedImage, RenderError> {
        self.captures += 1;
        let output = self
            .profile
            .path()
            .join(format!("capture-{}.png", self.captures));
        let args = browser_args(&self.config, self.profile.path(), &output, url);

        let mut cmd = tokio::process::Command::new(&self.config.executable);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let run = tokio::time::timeout(self.config.timeout, cmd.output())
            .await
            .map_err(|_| RenderError::Timeout(self.config.timeout))?
            .map_err(|source| RenderError::Launch {
                executable: self.config.executable.display().to_string(),
                source,
            })?;

        if !run.status.success() {
            return Err(RenderError::Exit {
                status: run.status.to_string(),
                stderr: tail(&String::from_utf8_lossy(&run.stderr)),
            });
        }

        let png = match tokio::fs::read(&output).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::MissingScreenshot(output));
            }
            Err(err) => return Err(err.into()),
        };
        if let Err(err) = tokio::fs::remove_file(&output).await {
            tracing::debug!(path = %output.display(), error = %err, "could not remove capture");
        }

        let jpeg = normalize_to_jpeg(&png, self.config.jpeg_quality)?;
        tracing::debug!(url, png = png.len(), jpeg = jpeg.len(), "captured page");
        Ok(RenderedImage::jpeg(jpeg))
    }

    /// Remove the profile directory
    ///
    /// # Errors
    /// `RenderError::Io` when the directory cannot be removed
    pub fn shutdown(self) -> Result<(), RenderError> {
        let path: PathBuf = self.profile.path().to_path_buf();
        self.profile.close()?;
        tracing::debug!(profile = %path.display(), "browser session closed");
        Ok(())
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn render(&mut self, url: &str) -> Result<RenderedImage, ServiceError> {
        Ok(self.capture(url).await?)
    }

    async fn close(self: Box<Self>) -> Result<(), ServiceError> {
        Ok((*self).shutdown()?)
    }
}

/// Command line for one headless capture
fn browser_args(config: &ChromeConfig, profile: &Path, output: &Path, url: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--headless=new",
        "--no-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-infobars",
        "--hide-scrollbars",
        "--ignore-certificate-errors",
        "--no-first-run",
        "--no-default-browser-check",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    let mut profile_arg = OsString::from("--user-data-dir=");
    profile_arg.push(profile);
    args.push(profile_arg);

    args.push(format!("--window-size={},{}", config.viewport_width, config.viewport_height).into());
    args.push(format!("--user-agent={}", config.user_agent).into());
    args.push(
        format!(
            "--virtual-time-budget={}",
            config.virtual_time_budget.as_millis()
        )
        .into(),
    );

    let mut screenshot_arg = OsString::from("--screenshot=");
    screenshot_arg.push(output);
    args.push(screenshot_arg);

    args.extend(config.extra_args.iter().map(OsString::from));
    args.push(url.into());
    args
}

fn tail(text: &str) -> String {
    let text = text.trim();
    let start = text
        .char_indices()
        .rev()
        .nth(STDERR_TAIL.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    text[start..].to_string()
}

use std::time::Duration;

use reqwest::{Response, Url};

use crate::error::GoogleError;

fn user_agent() -> String {
    format!("mintshot/{}", env!("CARGO_PKG_VERSION"))
}

/// Client with a per-request timeout
pub(crate) fn client(timeout: Duration) -> Result<reqwest::Client, GoogleError> {
    reqwest::Client::builder()
        .user_agent(user_agent())
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .timeout(timeout)
        .build()
        .map_err(GoogleError::Client)
}

/// Pass success responses through, turn the rest into `GoogleError::Status`
pub(crate) async fn check(service: &'static str, resp: Response) -> Result<Response, GoogleError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(service, status = status.as_u16(), body = %body, "request rejected");
    Err(GoogleError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

/// `base` with each of `segments` appended as one percent-encoded path segment
pub(crate) fn join_segments<'a>(
    base: &str,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, GoogleError> {
    let mut url = Url::parse(base).map_err(|e| GoogleError::Url(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| GoogleError::Url(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

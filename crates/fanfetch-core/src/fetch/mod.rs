//! Payload retrieval over libcurl.
//!
//! One transfer = one `Easy2<Collector>` handle. The blocking path performs
//! it directly; the cooperative executor adds the same handles to a multi
//! handle. Either way the response body is buffered in memory and handed to
//! the sink once the transfer finished.

mod collector;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::FetchError;

pub use collector::Collector;

/// Per-transfer libcurl settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Whole-transfer timeout.
    pub timeout: Duration,
    pub max_redirections: u32,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
            max_redirections: 10,
            user_agent: concat!("fanfetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Builds a configured transfer handle for `locator`.
pub fn new_transfer(
    locator: &str,
    opts: &FetchOptions,
) -> Result<curl::easy::Easy2<Collector>, FetchError> {
    let mut easy = curl::easy::Easy2::new(Collector::default());
    easy.url(locator)?;
    easy.follow_location(true)?;
    easy.max_redirections(opts.max_redirections)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    easy.useragent(&opts.user_agent)?;
    // Large images on slow links: abort below 1 KiB/s for 60s instead of hanging.
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    Ok(easy)
}

/// Turns a finished transfer into its payload, checking the HTTP status.
pub fn finish_transfer(
    locator: &str,
    easy: &mut curl::easy::Easy2<Collector>,
) -> Result<Vec<u8>, FetchError> {
    let code = easy.response_code()?;
    check_status(locator, code)?;
    Ok(easy.get_mut().take_body())
}

/// Blocking fetch of one locator.
pub fn fetch_payload(locator: &str, opts: &FetchOptions) -> Result<Vec<u8>, FetchError> {
    let mut easy = new_transfer(locator, opts)?;
    easy.perform()?;
    finish_transfer(locator, &mut easy)
}

/// Non-2xx is a failure for HTTP(S); other protocols (file, ftp) carry no
/// HTTP status and are judged by libcurl alone.
fn check_status(locator: &str, code: u32) -> Result<(), FetchError> {
    let is_http = url::Url::parse(locator)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if is_http && !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }
    Ok(())
}

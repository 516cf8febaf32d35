use std::time::Duration;

use reqwest::{Client, Url};

use crate::classifier::DiagnosisError;

/// Bounds applied to every image download. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub timeout: Option<Duration>,
    pub max_bytes: Option<u64>,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            max_bytes: Some(20 * 1024 * 1024),
        }
    }
}

impl FetchLimits {
    /// Builds limits from plain numbers as they come from flags or env vars.
    /// `0` disables the corresponding bound.
    pub fn from_raw(timeout_secs: u64, max_bytes: u64) -> Self {
        Self {
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            max_bytes: (max_bytes > 0).then_some(max_bytes),
        }
    }
}

/// Downloads caller supplied image URLs.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    limits: FetchLimits,
}

impl ImageFetcher {
    pub fn new(limits: FetchLimits) -> Result<Self, reqwest::Error> {
        let mut builder =
            Client::builder().user_agent(concat!("lungscan/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = limits.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            limits,
        })
    }

    /// Accepts absolute `http`/`https` URLs only.
    pub fn parse_url(raw: &str) -> Result<Url, DiagnosisError> {
        let invalid = |reason: String| DiagnosisError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{}'", other))),
        }
    }

    /// GETs `raw_url`, following redirects, and returns the body.
    ///
    /// Non-2xx final responses fail with [`DiagnosisError::FetchStatus`]. The size
    /// limit is checked against `Content-Length` up front and again while streaming.
    pub async fn fetch(&self, raw_url: &str) -> Result<Vec<u8>, DiagnosisError> {
        let url = Self::parse_url(raw_url)?;

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        log::debug!("Image response status: {}", status);
        if !status.is_success() {
            return Err(DiagnosisError::FetchStatus(status.as_u16()));
        }

        if let (Some(limit), Some(length)) = (self.limits.max_bytes, response.content_length()) {
            if length > limit {
                return Err(DiagnosisError::ImageTooLarge { limit });
            }
        }

        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if let Some(limit) = self.limits.max_bytes {
                if (buf.len() + chunk.len()) as u64 > limit {
                    return Err(DiagnosisError::ImageTooLarge { limit });
                }
            }
            buf.extend_from_slice(&chunk);
        }

        log::debug!("Downloaded {} bytes", buf.len());
        Ok(buf)
    }
}

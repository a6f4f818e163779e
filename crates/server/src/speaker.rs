//! Speaker display names
//!
//! Authentication happens in front of this service. Whatever sits there
//! forwards the signed-in learner's display name; a resolver reads it back.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};

use crate::ServerError;

/// Resolves the display name attached to user turns
#[async_trait]
pub trait SpeakerResolver: Send + Sync {
    /// `None` when the request carries no usable name
    async fn resolve(&self, headers: &HeaderMap) -> Option<String>;
}

/// Reads the display name from a fixed request header
#[derive(Debug, Clone)]
pub struct HeaderSpeakerResolver {
    header: HeaderName,
}

impl HeaderSpeakerResolver {
    pub fn new(header: &str) -> Result<Self, ServerError> {
        let header = HeaderName::from_bytes(header.trim().to_ascii_lowercase().as_bytes())
            .map_err(|e| {
                ServerError::Configuration(format!("invalid speaker header {:?}: {}", header, e))
            })?;
        Ok(Self { header })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

#[async_trait]
impl SpeakerResolver for HeaderSpeakerResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_reads_configured_header() {
        let resolver = HeaderSpeakerResolver::new("X-User-Name").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-user-name", HeaderValue::from_static("  Ana "));
        assert_eq!(resolver.resolve(&headers).await.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_missing_or_blank_header() {
        let resolver = HeaderSpeakerResolver::new("x-user-name").unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(resolver.resolve(&headers).await, None);

        headers.insert("x-user-name", HeaderValue::from_static("   "));
        assert_eq!(resolver.resolve(&headers).await, None);
    }

    #[test]
    fn test_rejects_invalid_header_name() {
        assert!(matches!(
            HeaderSpeakerResolver::new("user name"),
            Err(ServerError::Configuration(_))
        ));
    }
}

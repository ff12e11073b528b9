//! Types describing how an exchange is logged.
//!
//! Nothing in here is stored beyond a single exchange except [`ExcludedHeaders`], which is built
//! once from the configuration and shared read-only afterwards.

use http::{HeaderMap, HeaderName, Method, Uri};
use std::collections::HashSet;
use tracing::Level;

use crate::channel::LogChannel;

/// Per-request override read from an `X-Log-Request` / `X-Log-Response` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOverride {
    /// The header value is `true` (any case): log at INFO even when DEBUG is off.
    Enable,
    /// The header value is `false` (any case): do not log even when DEBUG is on.
    Disable,
    /// The header is absent or carries any other value.
    #[default]
    Unset,
}

impl LogOverride {
    /// Reads the first value of header `name`.
    pub fn from_headers(headers: &HeaderMap, name: &HeaderName) -> Self {
        match headers.get(name).and_then(|value| value.to_str().ok()) {
            Some(value) if value.eq_ignore_ascii_case("true") => LogOverride::Enable,
            Some(value) if value.eq_ignore_ascii_case("false") => LogOverride::Disable,
            _ => LogOverride::Unset,
        }
    }
}

/// Which of the two relevant levels a channel currently accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnabledLevels {
    pub debug: bool,
    pub info: bool,
}

impl EnabledLevels {
    /// Queries `channel` for DEBUG and INFO.
    pub fn of(channel: &dyn LogChannel) -> Self {
        Self {
            debug: channel.is_enabled(Level::DEBUG),
            info: channel.is_enabled(Level::INFO),
        }
    }
}

/// Outcome of the logging decision for one direction of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDecision {
    Skip,
    Debug,
    Info,
}

impl LogDecision {
    /// DEBUG unless explicitly disabled, otherwise INFO if explicitly enabled.
    pub fn decide(levels: EnabledLevels, log_override: LogOverride) -> Self {
        if levels.debug && log_override != LogOverride::Disable {
            LogDecision::Debug
        } else if levels.info && log_override == LogOverride::Enable {
            LogDecision::Info
        } else {
            LogDecision::Skip
        }
    }

    /// Level to log at, `None` for [`LogDecision::Skip`].
    pub fn level(self) -> Option<Level> {
        match self {
            LogDecision::Skip => None,
            LogDecision::Debug => Some(Level::DEBUG),
            LogDecision::Info => Some(Level::INFO),
        }
    }
}

/// The parts of a request still needed after it has been handed to the transport.
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub method: Method,
    pub uri: Uri,
    /// Override for the response direction, taken from the request headers.
    pub log_response: LogOverride,
}

/// Header names left out of rendered log lines, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedHeaders {
    names: HashSet<String>,
}

impl ExcludedHeaders {
    /// Builds the set from configured names, trimmed and lower-cased.
    pub fn new<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether `name` is excluded, in any letter case.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    /// Number of distinct excluded names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no header is excluded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LOG_REQUEST_HEADER, LOG_RESPONSE_HEADER};
    use http::HeaderValue;

    fn headers_with(name: &HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name.clone(), HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_override_parsing() {
        let name = HeaderName::from_static(LOG_REQUEST_HEADER);
        assert_eq!(
            LogOverride::from_headers(&headers_with(&name, "true"), &name),
            LogOverride::Enable
        );
        assert_eq!(
            LogOverride::from_headers(&headers_with(&name, "TRUE"), &name),
            LogOverride::Enable
        );
        assert_eq!(
            LogOverride::from_headers(&headers_with(&name, "False"), &name),
            LogOverride::Disable
        );
        assert_eq!(
            LogOverride::from_headers(&headers_with(&name, "yes"), &name),
            LogOverride::Unset
        );
        assert_eq!(
            LogOverride::from_headers(&HeaderMap::new(), &name),
            LogOverride::Unset
        );
    }

    #[test]
    fn test_override_uses_first_value() {
        let name = HeaderName::from_static(LOG_RESPONSE_HEADER);
        let mut headers = HeaderMap::new();
        headers.append(name.clone(), HeaderValue::from_static("false"));
        headers.append(name.clone(), HeaderValue::from_static("true"));

        assert_eq!(
            LogOverride::from_headers(&headers, &name),
            LogOverride::Disable
        );
    }

    #[test]
    fn test_override_directions_are_independent() {
        let request = HeaderName::from_static(LOG_REQUEST_HEADER);
        let response = HeaderName::from_static(LOG_RESPONSE_HEADER);
        let headers = headers_with(&response, "true");

        assert_eq!(LogOverride::from_headers(&headers, &request), LogOverride::Unset);
        assert_eq!(LogOverride::from_headers(&headers, &response), LogOverride::Enable);
    }

    #[test]
    fn test_decide() {
        let all = EnabledLevels { debug: true, info: true };
        let info_only = EnabledLevels { debug: false, info: true };
        let none = EnabledLevels::default();

        assert_eq!(LogDecision::decide(all, LogOverride::Unset), LogDecision::Debug);
        assert_eq!(LogDecision::decide(all, LogOverride::Enable), LogDecision::Debug);
        assert_eq!(LogDecision::decide(all, LogOverride::Disable), LogDecision::Skip);

        assert_eq!(LogDecision::decide(info_only, LogOverride::Unset), LogDecision::Skip);
        assert_eq!(LogDecision::decide(info_only, LogOverride::Enable), LogDecision::Info);
        assert_eq!(LogDecision::decide(info_only, LogOverride::Disable), LogDecision::Skip);

        assert_eq!(LogDecision::decide(none, LogOverride::Enable), LogDecision::Skip);
    }

    #[test]
    fn test_decision_levels() {
        assert_eq!(LogDecision::Skip.level(), None);
        assert_eq!(LogDecision::Debug.level(), Some(Level::DEBUG));
        assert_eq!(LogDecision::Info.level(), Some(Level::INFO));
    }

    #[test]
    fn test_excluded_headers_are_case_insensitive() {
        let excluded = ExcludedHeaders::new(["Authorization", " X-Api-Key "]);

        assert_eq!(excluded.len(), 2);
        assert!(excluded.contains("authorization"));
        assert!(excluded.contains("AUTHORIZATION"));
        assert!(excluded.contains("x-api-key"));
        assert!(!excluded.contains("content-type"));
        assert!(ExcludedHeaders::default().is_empty());
    }
}

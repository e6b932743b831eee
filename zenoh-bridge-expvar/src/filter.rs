//! Metric name filtering.
//!
//! A [`Filter`] is a set of regular expressions; a name is included when any
//! of them matches somewhere in it. Anchors (`^`, `$`) must be written
//! explicitly to match whole names.

use regex::Regex;

use crate::error::ConfigError;

/// Compiled set of metric name patterns.
#[derive(Debug, Clone)]
pub struct Filter {
    included: Vec<Regex>,
}

impl Filter {
    /// Compile a list of patterns.
    ///
    /// Fails on the first invalid pattern.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let included = patterns
            .into_iter()
            .map(|p| {
                let pattern = p.as_ref();
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { included })
    }

    /// Check whether a metric name should be forwarded.
    pub fn includes(&self, name: &str) -> bool {
        self.included.iter().any(|re| re.is_match(name))
    }

    /// The source patterns, in configuration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.included.iter().map(Regex::as_str)
    }
}

/// Split a `;`-separated pattern list, dropping empty segments.
pub fn split_patterns(list: &str) -> Vec<String> {
    list.split(';')
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

use zenoh::key_expr::KeyExpr;

use crate::error::{Error, Result};

/// Default key expression prefix for forwarded expvar metrics.
pub const KEY_PREFIX: &str = "expvar";

/// Characters that may not appear inside a single key expression chunk.
const RESERVED: &[char] = &['/', '*', '$', '?', '#'];

/// Make an arbitrary string usable as one key expression chunk.
///
/// Reserved characters and whitespace become `_`; an empty input becomes `_`.
///
/// # Example
/// ```
/// use expvar_common::keyexpr::sanitize_chunk;
///
/// assert_eq!(sanitize_chunk("memstats/Alloc"), "memstats_Alloc");
/// assert_eq!(sanitize_chunk("requests.total"), "requests.total");
/// ```
pub fn sanitize_chunk(raw: &str) -> String {
    if raw.is_empty() {
        return "_".to_string();
    }

    raw.chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Builder for data point key expressions.
///
/// Key expressions follow the pattern:
/// `<prefix>/<namespace>/<instance>/<metric>`
#[derive(Debug, Clone)]
pub struct KeyExprBuilder {
    prefix: String,
}

impl Default for KeyExprBuilder {
    fn default() -> Self {
        Self::new(KEY_PREFIX)
    }
}

impl KeyExprBuilder {
    /// Create a builder with a custom prefix.
    ///
    /// The prefix is used as-is and may span several chunks (`"site/a/expvar"`);
    /// trailing slashes are dropped.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Check that keys built under this prefix are concrete Zenoh key expressions.
    ///
    /// Empty chunks (`a//b`), reserved characters and wildcards (`*`, `**`,
    /// `$*`) in the prefix are rejected.
    pub fn check(&self) -> Result<()> {
        let sample = self.build("namespace", "instance", "metric");
        let key = KeyExpr::try_from(sample.as_str()).map_err(|e| {
            Error::Config(format!("Invalid key prefix '{}': {}", self.prefix, e))
        })?;

        if key.is_wild() {
            return Err(Error::Config(format!(
                "Key prefix '{}' must not contain wildcards",
                self.prefix
            )));
        }

        Ok(())
    }

    /// Build the key expression for one metric.
    ///
    /// # Example
    /// ```
    /// use expvar_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("expvar");
    /// let key = builder.build("my-service", "i-0abc", "requests.total");
    /// assert_eq!(key, "expvar/my-service/i-0abc/requests.total");
    /// ```
    pub fn build(&self, namespace: &str, instance: &str, metric: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.prefix,
            sanitize_chunk(namespace),
            sanitize_chunk(instance),
            sanitize_chunk(metric)
        )
    }
}

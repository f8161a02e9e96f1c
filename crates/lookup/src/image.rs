//! Product image allow-list.
//!
//! Image URLs come from user-editable product records, so only URLs pointing
//! at a configured `host/path-prefix` over https are passed on to renderers.

use reqwest::Url;
use tracing::debug;

use shelfscan_core::types::Product;

use crate::error::LookupError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AllowedPrefix {
    host: String,
    path_prefix: String,
}

/// Allow-list of image host and path prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePolicy {
    allowed: Vec<AllowedPrefix>,
}

impl ImagePolicy {
    /// Builds the policy from `host/path-prefix` patterns such as
    /// `images.openfoodfacts.org/images/products/`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Config` for an empty list or an entry without a host.
    pub fn new(patterns: &[String]) -> Result<Self, LookupError> {
        let mut allowed = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern
                .trim()
                .trim_start_matches("https://")
                .trim_start_matches("http://");
            let (host, path) = match pattern.find('/') {
                Some(idx) => (&pattern[..idx], &pattern[idx..]),
                None => (pattern, "/"),
            };
            if host.is_empty() {
                return Err(LookupError::Config {
                    field: "image_hosts".to_owned(),
                    reason: format!("entry '{pattern}' has no host"),
                });
            }
            allowed.push(AllowedPrefix {
                host: host.to_lowercase(),
                path_prefix: path.to_owned(),
            });
        }

        if allowed.is_empty() {
            return Err(LookupError::Config {
                field: "image_hosts".to_owned(),
                reason: "at least one image host is required".to_owned(),
            });
        }

        Ok(Self { allowed })
    }

    /// Returns `true` if `url` is https and matches an allowed prefix.
    pub fn allows(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        if parsed.scheme() != "https" {
            return false;
        }
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        self.allowed
            .iter()
            .any(|a| a.host == host && parsed.path().starts_with(&a.path_prefix))
    }

    /// Returns the product's preferred image URL if the policy allows it.
    pub fn image_for<'a>(&self, product: &'a Product) -> Option<&'a str> {
        let candidate = product.image_candidate()?;
        if self.allows(candidate) {
            Some(candidate)
        } else {
            debug!(code = %product.code, url = candidate, "image url not allowed");
            None
        }
    }
}

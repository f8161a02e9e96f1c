//! Alternative-suggestion configuration.
//!
//! [`AlternativesConfig`] is derived from the `[alternatives]` section of
//! [`ShelfscanConfig`](shelfscan_core::config::ShelfscanConfig). Identifiers are
//! normalized (trimmed, lower-cased where comparison is case-insensitive) once
//! here so the filters never re-normalize the allow-lists per candidate.
//!
//! # Examples
//!
//! ```
//! use shelfscan_lookup::AlternativesConfigBuilder;
//!
//! let config = AlternativesConfigBuilder::new()
//!     .page_size(3)
//!     .retailer_slugs(vec!["Coop".to_owned()])
//!     .build()
//!     .unwrap();
//! assert_eq!(config.retailer.slugs, vec!["coop"]);
//! ```

use serde::{Deserialize, Serialize};

use shelfscan_core::config::AlternativesSection;

use crate::error::LookupError;

const MAX_PAGE_SIZE: usize = 100;

/// Regional distribution rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRule {
    /// Country tags, lower-cased. Compared case-insensitively.
    pub countries: Vec<String>,
    /// Purchase-place tags. Compared exactly.
    pub purchase_places: Vec<String>,
}

/// Retailer availability rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerRule {
    /// Store slugs without namespace prefix, lower-cased.
    pub slugs: Vec<String>,
    /// Lower-cased fragment searched in the free-text store field.
    pub brand_fragment: String,
}

/// Configuration of the alternative-suggestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativesConfig {
    /// Whether suggestions are computed at all.
    pub enabled: bool,
    /// Maximum results requested per sort order.
    pub page_size: usize,
    /// Country parameter of the search request.
    pub country_filter: String,
    /// Store parameter of the search request.
    pub store_filter: String,
    /// Local regional filter.
    pub region: RegionRule,
    /// Local retailer filter.
    pub retailer: RetailerRule,
}

impl Default for AlternativesConfig {
    fn default() -> Self {
        Self::from_core(&AlternativesSection::default())
    }
}

impl AlternativesConfig {
    /// Builds the pipeline configuration from the core config section.
    pub fn from_core(core: &AlternativesSection) -> Self {
        Self {
            enabled: core.enabled,
            page_size: core.page_size,
            country_filter: core.country_filter.trim().to_owned(),
            store_filter: core.store_filter.trim().to_owned(),
            region: RegionRule {
                countries: normalize_lower(&core.region_countries),
                purchase_places: core
                    .region_purchase_places
                    .iter()
                    .map(|p| p.trim().to_owned())
                    .filter(|p| !p.is_empty())
                    .collect(),
            },
            retailer: RetailerRule {
                slugs: normalize_lower(&core.retailer_slugs),
                brand_fragment: core.retailer_brand_fragment.trim().to_lowercase(),
            },
        }
    }

    /// Validates the configuration.
    ///
    /// Rules only apply when the pipeline is enabled:
    /// - `page_size`: 1-100
    /// - at least one regional identifier
    /// - at least one retailer slug or a non-empty brand fragment
    pub fn validate(&self) -> Result<(), LookupError> {
        if !self.enabled {
            return Ok(());
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(LookupError::Config {
                field: "page_size".to_owned(),
                reason: format!("must be 1-{MAX_PAGE_SIZE}"),
            });
        }

        if self.region.countries.is_empty() && self.region.purchase_places.is_empty() {
            return Err(LookupError::Config {
                field: "region".to_owned(),
                reason: "at least one regional identifier required".to_owned(),
            });
        }

        if self.retailer.slugs.is_empty() && self.retailer.brand_fragment.is_empty() {
            return Err(LookupError::Config {
                field: "retailer".to_owned(),
                reason: "a retailer slug or brand fragment is required".to_owned(),
            });
        }

        Ok(())
    }
}

fn normalize_lower(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Builder for [`AlternativesConfig`]; validates on [`build`](Self::build).
#[derive(Default)]
pub struct AlternativesConfigBuilder {
    section: AlternativesSection,
}

impl AlternativesConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.section.enabled = enabled;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.section.page_size = page_size;
        self
    }

    pub fn country_filter(mut self, country: impl Into<String>) -> Self {
        self.section.country_filter = country.into();
        self
    }

    pub fn store_filter(mut self, store: impl Into<String>) -> Self {
        self.section.store_filter = store.into();
        self
    }

    pub fn region_countries(mut self, countries: Vec<String>) -> Self {
        self.section.region_countries = countries;
        self
    }

    pub fn region_purchase_places(mut self, places: Vec<String>) -> Self {
        self.section.region_purchase_places = places;
        self
    }

    pub fn retailer_slugs(mut self, slugs: Vec<String>) -> Self {
        self.section.retailer_slugs = slugs;
        self
    }

    pub fn retailer_brand_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.section.retailer_brand_fragment = fragment.into();
        self
    }

    /// Normalizes, validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Config` when validation fails.
    pub fn build(self) -> Result<AlternativesConfig, LookupError> {
        let config = AlternativesConfig::from_core(&self.section);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AlternativesConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_normalizes_identifiers() {
        let core = AlternativesSection {
            region_countries: vec![" EN:Switzerland ".to_owned(), "".to_owned()],
            region_purchase_places: vec![" Schweiz ".to_owned()],
            retailer_slugs: vec!["Coop-Pronto".to_owned()],
            retailer_brand_fragment: " COOP ".to_owned(),
            ..Default::default()
        };
        let config = AlternativesConfig::from_core(&core);
        assert_eq!(config.region.countries, vec!["en:switzerland"]);
        // purchase places keep their case: they are matched exactly
        assert_eq!(config.region.purchase_places, vec!["Schweiz"]);
        assert_eq!(config.retailer.slugs, vec!["coop-pronto"]);
        assert_eq!(config.retailer.brand_fragment, "coop");
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let result = AlternativesConfigBuilder::new().page_size(0).build();
        assert!(matches!(result, Err(LookupError::Config { .. })));
    }

    #[test]
    fn validate_rejects_too_large_page_size() {
        assert!(AlternativesConfigBuilder::new().page_size(101).build().is_err());
        AlternativesConfigBuilder::new().page_size(100).build().unwrap();
    }

    #[test]
    fn validate_rejects_missing_region() {
        let result = AlternativesConfigBuilder::new()
            .region_countries(vec![])
            .region_purchase_places(vec![])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_missing_retailer_rule() {
        let result = AlternativesConfigBuilder::new()
            .retailer_slugs(vec![])
            .retailer_brand_fragment("  ")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn disabled_config_skips_validation() {
        let config = AlternativesConfigBuilder::new()
            .enabled(false)
            .page_size(0)
            .build()
            .unwrap();
        assert!(!config.enabled);
    }

    #[test]
    fn builder_all_setters() {
        let config = AlternativesConfigBuilder::new()
            .page_size(8)
            .country_filter("germany")
            .store_filter("rewe")
            .region_countries(vec!["en:germany".to_owned()])
            .region_purchase_places(vec!["deutschland".to_owned()])
            .retailer_slugs(vec!["rewe".to_owned()])
            .retailer_brand_fragment("rewe")
            .build()
            .unwrap();

        assert_eq!(config.page_size, 8);
        assert_eq!(config.country_filter, "germany");
        assert_eq!(config.store_filter, "rewe");
        assert_eq!(config.region.countries, vec!["en:germany"]);
        assert_eq!(config.retailer.brand_fragment, "rewe");
    }
}

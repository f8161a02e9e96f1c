//! Candidate filters for alternative suggestions.
//!
//! All functions here are pure. [`filter_candidates`] composes them over one
//! search result list.

use metrics::counter;
use tracing::debug;

use shelfscan_core::metrics as m;
use shelfscan_core::types::Product;

use crate::client::SortKey;
use crate::config::{RegionRule, RetailerRule};

/// Grade values that mean "no grade".
const PLACEHOLDER_GRADES: &[&str] = &["UNKNOWN", "NOT-APPLICABLE", "NOT_APPLICABLE"];

/// Returns `true` if `grade` carries a real grade letter.
///
/// Missing, blank and placeholder values are invalid. Comparison is
/// case-insensitive.
pub fn is_valid_grade(grade: Option<&str>) -> bool {
    let Some(grade) = grade else {
        return false;
    };
    let normalized = grade.trim().to_uppercase();
    !normalized.is_empty() && !PLACEHOLDER_GRADES.contains(&normalized.as_str())
}

/// Returns `true` if the product is distributed in the configured region.
///
/// Country tags match case-insensitively, purchase-place tags exactly.
pub fn is_distributed_in_region(
    country_tags: &[String],
    purchase_place_tags: &[String],
    region: &RegionRule,
) -> bool {
    country_tags.iter().any(|tag| {
        let tag = tag.trim().to_lowercase();
        region.countries.iter().any(|c| *c == tag)
    }) || purchase_place_tags
        .iter()
        .any(|place| region.purchase_places.iter().any(|p| p == place))
}

/// Returns `true` if the product is sold at the configured retailer.
///
/// Store tags are matched after stripping the namespace (`ch:coop` → `coop`).
/// When no tag matches, the free-text store field is searched for the brand
/// fragment.
pub fn is_sold_at_retailer(
    store_tags: &[String],
    stores_text: Option<&str>,
    retailer: &RetailerRule,
) -> bool {
    let tag_match = store_tags.iter().any(|tag| {
        let slug = strip_namespace(tag).trim().to_lowercase();
        retailer.slugs.iter().any(|s| *s == slug)
    });
    if tag_match {
        return true;
    }

    if retailer.brand_fragment.is_empty() {
        return false;
    }
    stores_text.is_some_and(|text| {
        text.split(',')
            .map(|part| part.trim().to_lowercase())
            .any(|part| part.contains(&retailer.brand_fragment))
    })
}

fn strip_namespace(tag: &str) -> &str {
    match tag.rfind(':') {
        Some(idx) => &tag[idx + 1..],
        None => tag,
    }
}

/// Derives the category tag alternatives are searched in.
///
/// Tags run from generic to specific, so the last non-blank tag is used.
pub fn derive_category_tag(categories_tags: &[String]) -> Option<&str> {
    categories_tags
        .iter()
        .rev()
        .map(|tag| tag.trim())
        .find(|tag| !tag.is_empty())
}

/// Filters one search result list in place, preserving response order.
///
/// Drops the product itself (by code) and every candidate that is not
/// distributed in the region, not sold at the retailer, or has no valid
/// grade for `sort`.
pub fn filter_candidates(
    candidates: Vec<Product>,
    original_code: &str,
    sort: SortKey,
    region: &RegionRule,
    retailer: &RetailerRule,
) -> Vec<Product> {
    let before = candidates.len();

    let kept: Vec<Product> = candidates
        .into_iter()
        .filter(|candidate| {
            let rejection = rejection_reason(candidate, original_code, sort, region, retailer);
            if let Some(reason) = rejection {
                debug!(
                    code = %candidate.code,
                    sort = sort.label(),
                    reason,
                    "candidate rejected"
                );
            }
            rejection.is_none()
        })
        .collect();

    let rejected = before - kept.len();
    if rejected > 0 {
        counter!(m::ALTERNATIVES_CANDIDATES_REJECTED_TOTAL, m::LABEL_SORT => sort.label())
            .increment(rejected as u64);
    }
    kept
}

fn rejection_reason(
    candidate: &Product,
    original_code: &str,
    sort: SortKey,
    region: &RegionRule,
    retailer: &RetailerRule,
) -> Option<&'static str> {
    if candidate.code == original_code {
        return Some("same product");
    }
    if !is_distributed_in_region(
        &candidate.countries_tags,
        &candidate.purchase_places_tags,
        region,
    ) {
        return Some("not distributed in region");
    }
    if !is_sold_at_retailer(&candidate.stores_tags, candidate.stores.as_deref(), retailer) {
        return Some("not sold at retailer");
    }
    if !is_valid_grade(sort.grade(candidate)) {
        return Some("no valid grade");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlternativesConfig;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    fn swiss_coop_product(code: &str, nutri: &str, eco: &str) -> Product {
        Product {
            code: code.to_owned(),
            nutriscore_grade: Some(nutri.to_owned()),
            ecoscore_grade: Some(eco.to_owned()),
            countries_tags: tags(&["en:switzerland"]),
            stores_tags: tags(&["coop"]),
            ..Default::default()
        }
    }

    #[test]
    fn placeholder_grades_are_invalid() {
        for grade in ["", "unknown", "Not-Applicable", "NOT_APPLICABLE", "   "] {
            assert!(!is_valid_grade(Some(grade)), "{grade:?} should be invalid");
        }
        assert!(!is_valid_grade(None));
    }

    #[test]
    fn letter_grades_are_valid() {
        assert!(is_valid_grade(Some("a")));
        assert!(is_valid_grade(Some("E")));
        assert!(is_valid_grade(Some(" b ")));
    }

    #[test]
    fn region_matches_country_tag_case_insensitively() {
        let region = AlternativesConfig::default().region;
        assert!(is_distributed_in_region(&tags(&["de:schweiz"]), &[], &region));
        assert!(is_distributed_in_region(&tags(&["EN:Switzerland"]), &[], &region));
    }

    #[test]
    fn region_rejects_foreign_only_product() {
        let region = AlternativesConfig::default().region;
        assert!(!is_distributed_in_region(&tags(&["en:france"]), &[], &region));
        assert!(!is_distributed_in_region(&[], &[], &region));
    }

    #[test]
    fn region_matches_purchase_place_exactly() {
        let region = AlternativesConfig::default().region;
        assert!(is_distributed_in_region(
            &tags(&["en:france"]),
            &tags(&["schweiz"]),
            &region
        ));
        assert!(!is_distributed_in_region(&[], &tags(&["Schweiz"]), &region));
    }

    #[test]
    fn retailer_matches_namespaced_store_tag() {
        let retailer = AlternativesConfig::default().retailer;
        assert!(is_sold_at_retailer(&tags(&["ch:coop-pronto"]), None, &retailer));
        assert!(is_sold_at_retailer(&tags(&["COOP"]), None, &retailer));
        assert!(is_sold_at_retailer(&tags(&["xx:ch:coop-city"]), None, &retailer));
    }

    #[test]
    fn retailer_falls_back_to_free_text() {
        let retailer = AlternativesConfig::default().retailer;
        assert!(is_sold_at_retailer(&[], Some("Coop, Manor"), &retailer));
        assert!(is_sold_at_retailer(&tags(&["migros"]), Some("Manor, Coop City"), &retailer));
    }

    #[test]
    fn retailer_rejects_other_store() {
        let retailer = AlternativesConfig::default().retailer;
        assert!(!is_sold_at_retailer(&[], Some("Migros"), &retailer));
        assert!(!is_sold_at_retailer(&tags(&["ch:migros"]), None, &retailer));
        assert!(!is_sold_at_retailer(&[], None, &retailer));
    }

    #[test]
    fn empty_brand_fragment_disables_free_text_fallback() {
        let mut retailer = AlternativesConfig::default().retailer;
        retailer.brand_fragment.clear();
        assert!(!is_sold_at_retailer(&[], Some("Migros"), &retailer));
    }

    #[test]
    fn category_tag_is_last_non_blank_entry() {
        assert_eq!(
            derive_category_tag(&tags(&["en:foods", "en:spreads", "en:nut-spreads"])),
            Some("en:nut-spreads")
        );
        assert_eq!(derive_category_tag(&tags(&["en:spreads", "  "])), Some("en:spreads"));
        assert_eq!(derive_category_tag(&tags(&["en:only"])), Some("en:only"));
        assert_eq!(derive_category_tag(&[]), None);
        assert_eq!(derive_category_tag(&tags(&["", " "])), None);
    }

    #[test]
    fn filter_excludes_original_product() {
        let config = AlternativesConfig::default();
        let candidates = vec![
            swiss_coop_product("111", "a", "a"),
            swiss_coop_product("222", "b", "b"),
        ];
        let kept = filter_candidates(
            candidates,
            "111",
            SortKey::Nutrition,
            &config.region,
            &config.retailer,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code, "222");
    }

    #[test]
    fn filter_uses_grade_matching_sort_key() {
        let config = AlternativesConfig::default();
        let candidates = vec![
            swiss_coop_product("1", "a", "unknown"),
            swiss_coop_product("2", "not-applicable", "b"),
        ];

        let nutrition = filter_candidates(
            candidates.clone(),
            "0",
            SortKey::Nutrition,
            &config.region,
            &config.retailer,
        );
        let eco = filter_candidates(candidates, "0", SortKey::Eco, &config.region, &config.retailer);

        assert_eq!(nutrition.len(), 1);
        assert_eq!(nutrition[0].code, "1");
        assert_eq!(eco.len(), 1);
        assert_eq!(eco[0].code, "2");
    }

    #[test]
    fn filter_preserves_response_order() {
        let config = AlternativesConfig::default();
        let mut foreign = swiss_coop_product("3", "a", "a");
        foreign.countries_tags = tags(&["en:france"]);
        let candidates = vec![
            swiss_coop_product("5", "c", "c"),
            foreign,
            swiss_coop_product("4", "a", "a"),
            swiss_coop_product("6", "b", "b"),
        ];

        let kept = filter_candidates(candidates, "0", SortKey::Eco, &config.region, &config.retailer);
        let codes: Vec<_> = kept.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["5", "4", "6"]);
    }
}

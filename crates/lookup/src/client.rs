//! Product database access.
//!
//! The [`ProductSource`] trait abstracts the Open Food Facts REST API, allowing
//! production code to use [`OffClient`] while tests plug in an in-memory source.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐   ┌──────────────────────┐
//!  │LookupSession │   │ AlternativesPipeline │
//!  └──────┬───────┘   └──────────┬───────────┘
//!         └──────────┬───────────┘
//!                    ▼
//!            ┌──────────────┐
//!            │ProductSource │ (trait)
//!            └──────────────┘
//!                │      │
//!                ▼      ▼
//!          ┌─────────┐ ┌──────┐
//!          │OffClient│ │ Mock │
//!          └────┬────┘ └──────┘
//!               ▼
//!      world.openfoodfacts.org
//! ```
//!
//! # Response interpretation
//!
//! HTTP handling and body interpretation are split: [`OffClient`] only moves
//! bytes, while [`interpret_product_response`] and [`interpret_search_response`]
//! turn `(status, body)` pairs into results. Both are pure and unit-tested.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use shelfscan_core::config::ApiConfig;
use shelfscan_core::error::ApiError;
use shelfscan_core::types::Product;

use crate::error::LookupError;

/// Fields requested from the product database. Everything else is dropped server-side.
pub const PRODUCT_FIELDS: &str = "code,product_name,product_name_de,product_name_fr,\
product_name_it,product_name_en,brands,image_front_url,image_url,nutriscore_grade,\
nutrition_grades,ecoscore_grade,categories_tags,countries_tags,purchase_places_tags,\
stores_tags,stores";

const PRODUCT_ENDPOINT: &str = "product";
const SEARCH_ENDPOINT: &str = "search";

/// Result of a single product lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductLookup {
    /// The database has a product for the code.
    Found(Product),
    /// Valid request, no matching product.
    NotFound,
}

/// Sort order of a category search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Best Nutri-Score first.
    Nutrition,
    /// Best Eco-Score first.
    Eco,
}

impl SortKey {
    /// Value of the `sort_by` search parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Nutrition => "nutriscore_score",
            Self::Eco => "ecoscore_score",
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Eco => "eco",
        }
    }

    /// The grade of `product` that this sort order ranks by.
    pub fn grade<'a>(&self, product: &'a Product) -> Option<&'a str> {
        match self {
            Self::Nutrition => product.nutrition_grade(),
            Self::Eco => product.eco_grade(),
        }
    }
}

/// A category-scoped search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryQuery {
    /// Category tag, e.g. `en:chocolate-spreads`.
    pub category_tag: String,
    /// Country filter sent as `countries_tags_en`.
    pub country: String,
    /// Store filter sent as `stores_tags`.
    pub store: String,
    pub sort: SortKey,
    pub page_size: usize,
}

impl CategoryQuery {
    /// Query parameters in request order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("categories_tags", self.category_tag.clone())];
        if !self.country.is_empty() {
            params.push(("countries_tags_en", self.country.clone()));
        }
        if !self.store.is_empty() {
            params.push(("stores_tags", self.store.clone()));
        }
        params.push(("sort_by", self.sort.as_param().to_owned()));
        params.push(("page_size", self.page_size.to_string()));
        params.push(("fields", PRODUCT_FIELDS.to_owned()));
        params
    }
}

/// Trait abstracting product database operations.
///
/// The trait is `Send + Sync + 'static` so one source can be shared between
/// the lookup session and the alternatives pipeline behind an `Arc`.
///
/// # Error Handling
///
/// - **connection/timeout**: `ApiError::Transport`
/// - **non-success HTTP status**: `ApiError::Status`
/// - **`error` field in the body**: `ApiError::Reported`
/// - **undecodable body**: `ApiError::Malformed`
pub trait ProductSource: Send + Sync + 'static {
    /// Fetches a single product by barcode.
    ///
    /// A 404 or a `status` of 0 is [`ProductLookup::NotFound`], not an error.
    fn fetch_product(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<ProductLookup, ApiError>> + Send;

    /// Runs a category search and returns candidates in response order.
    fn search_category(
        &self,
        query: &CategoryQuery,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;
}

/// Open Food Facts REST v2 client.
#[derive(Debug, Clone)]
pub struct OffClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OffClient {
    /// Creates a client from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::ClientInit` if the base URL does not parse or the
    /// TLS backend cannot be initialized.
    pub fn new(config: &ApiConfig) -> Result<Self, LookupError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| LookupError::ClientInit(format!("invalid base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::ClientInit(format!(
                "invalid base_url: {base_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LookupError::ClientInit(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base URLs are rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v2"]).extend(segments);
        }
        url
    }
}

impl ProductSource for OffClient {
    async fn fetch_product(&self, code: &str) -> Result<ProductLookup, ApiError> {
        let url = self.endpoint(&[PRODUCT_ENDPOINT, &format!("{code}.json")]);
        debug!(%url, "fetching product");

        let response = self
            .http
            .get(url)
            .query(&[("fields", PRODUCT_FIELDS)])
            .send()
            .await
            .map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        interpret_product_response(code, status, &body)
    }

    async fn search_category(&self, query: &CategoryQuery) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint(&[SEARCH_ENDPOINT]);
        debug!(
            category = %query.category_tag,
            sort = query.sort.label(),
            page_size = query.page_size,
            "searching category"
        );

        let response = self
            .http
            .get(url)
            .query(&query.params())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        interpret_search_response(status, &body)
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default)]
    product: Option<Product>,
    #[serde(default)]
    status_verbose: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Option<Vec<Product>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Interprets a product endpoint response.
///
/// `code` fills in the product code when the body omits it.
pub fn interpret_product_response(
    code: &str,
    status: u16,
    body: &str,
) -> Result<ProductLookup, ApiError> {
    if status == 404 {
        return Ok(ProductLookup::NotFound);
    }
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            endpoint: PRODUCT_ENDPOINT.to_owned(),
            status,
        });
    }

    let parsed: ProductResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed {
            endpoint: PRODUCT_ENDPOINT.to_owned(),
            reason: e.to_string(),
        })?;

    if let Some(message) = reported_error(parsed.error.as_ref()) {
        return Err(ApiError::Reported {
            endpoint: PRODUCT_ENDPOINT.to_owned(),
            message,
        });
    }

    match (status_is_found(parsed.status.as_ref()), parsed.product) {
        (true, Some(mut product)) => {
            if product.code.trim().is_empty() {
                product.code = code.to_owned();
            }
            Ok(ProductLookup::Found(product))
        }
        _ => {
            debug!(
                code,
                status_verbose = parsed.status_verbose.as_deref().unwrap_or_default(),
                "product not in database"
            );
            Ok(ProductLookup::NotFound)
        }
    }
}

/// Interprets a search endpoint response.
pub fn interpret_search_response(status: u16, body: &str) -> Result<Vec<Product>, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            endpoint: SEARCH_ENDPOINT.to_owned(),
            status,
        });
    }

    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| ApiError::Malformed {
        endpoint: SEARCH_ENDPOINT.to_owned(),
        reason: e.to_string(),
    })?;

    if let Some(message) = reported_error(parsed.error.as_ref()) {
        return Err(ApiError::Reported {
            endpoint: SEARCH_ENDPOINT.to_owned(),
            message,
        });
    }

    parsed.products.ok_or_else(|| ApiError::Malformed {
        endpoint: SEARCH_ENDPOINT.to_owned(),
        reason: "missing products list".to_owned(),
    })
}

// `status` arrives as 1 or "1" depending on the endpoint version.
fn status_is_found(status: Option<&serde_json::Value>) -> bool {
    match status {
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
        Some(serde_json::Value::String(s)) => s.trim() == "1",
        _ => false,
    }
}

fn reported_error(error: Option<&serde_json::Value>) -> Option<String> {
    match error? {
        serde_json::Value::Null | serde_json::Value::Bool(false) => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.trim().to_owned()),
        other => Some(other.to_string()),
    }
}

/// In-memory [`ProductSource`] for unit tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockProductSource {
    /// Products returned by `fetch_product`, keyed by code.
    pub products: std::collections::HashMap<String, Product>,
    /// Search results keyed by category tag and sort key.
    pub searches: std::collections::HashMap<(String, SortKey), Vec<Product>>,
    /// Failure returned by `fetch_product`.
    pub fetch_failure: Option<MockFailure>,
    /// Failures returned by `search_category`, per sort key.
    pub search_failures: std::collections::HashMap<SortKey, MockFailure>,
}

/// Failure kinds a mock source can simulate.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Transport,
    Status(u16),
    Reported,
}

#[cfg(test)]
impl MockFailure {
    pub fn to_error(self, endpoint: &str) -> ApiError {
        match self {
            Self::Transport => ApiError::Transport("connection refused".to_owned()),
            Self::Status(status) => ApiError::Status {
                endpoint: endpoint.to_owned(),
                status,
            },
            Self::Reported => ApiError::Reported {
                endpoint: endpoint.to_owned(),
                message: "mock error".to_owned(),
            },
        }
    }
}

#[cfg(test)]
impl MockProductSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product.code.clone(), product);
        self
    }

    pub fn with_search(mut self, category: &str, sort: SortKey, results: Vec<Product>) -> Self {
        self.searches.insert((category.to_owned(), sort), results);
        self
    }

    pub fn with_fetch_failure(mut self, failure: MockFailure) -> Self {
        self.fetch_failure = Some(failure);
        self
    }

    pub fn with_search_failure(mut self, sort: SortKey, failure: MockFailure) -> Self {
        self.search_failures.insert(sort, failure);
        self
    }
}

#[cfg(test)]
impl ProductSource for MockProductSource {
    async fn fetch_product(&self, code: &str) -> Result<ProductLookup, ApiError> {
        if let Some(failure) = self.fetch_failure {
            return Err(failure.to_error(PRODUCT_ENDPOINT));
        }
        Ok(self
            .products
            .get(code)
            .cloned()
            .map_or(ProductLookup::NotFound, ProductLookup::Found))
    }

    async fn search_category(&self, query: &CategoryQuery) -> Result<Vec<Product>, ApiError> {
        if let Some(failure) = self.search_failures.get(&query.sort) {
            return Err(failure.to_error(SEARCH_ENDPOINT));
        }
        Ok(self
            .searches
            .get(&(query.category_tag.clone(), query.sort))
            .cloned()
            .unwrap_or_default())
    }
}

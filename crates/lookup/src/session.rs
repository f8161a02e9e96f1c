//! Lookup orchestration.
//!
//! [`LookupSession`] holds the barcode input field and the product query state,
//! validates submitted codes, fetches the product and hands every change of the
//! displayed product to the [`AlternativesPipeline`].

use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use shelfscan_core::messages::UserMessage;
use shelfscan_core::metrics as m;
use shelfscan_core::state::QueryState;
use shelfscan_core::types::{Locale, Product};

use crate::alternatives::{AlternativesPipeline, AlternativesState};
use crate::client::{ProductLookup, ProductSource};
use crate::config::AlternativesConfig;
use crate::error::LookupError;

/// Maximum accepted barcode length.
pub const MAX_CODE_LEN: usize = 24;

/// Validates and normalizes a submitted barcode.
///
/// Surrounding whitespace is trimmed; the rest must be 1 to
/// [`MAX_CODE_LEN`] ASCII digits.
pub fn validate_code(input: &str) -> Result<String, LookupError> {
    let code = input.trim();
    if code.is_empty() {
        return Err(LookupError::InvalidCode {
            input: input.to_owned(),
            reason: "empty".to_owned(),
        });
    }
    if code.len() > MAX_CODE_LEN {
        return Err(LookupError::InvalidCode {
            input: input.to_owned(),
            reason: format!("longer than {MAX_CODE_LEN} digits"),
        });
    }
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LookupError::InvalidCode {
            input: input.to_owned(),
            reason: "digits only".to_owned(),
        });
    }
    Ok(code.to_owned())
}

/// Maps a lookup error to the message shown to the user.
pub fn user_message(err: &LookupError) -> UserMessage {
    match err {
        LookupError::InvalidCode { reason, .. } if reason == "empty" => UserMessage::EmptyCode,
        LookupError::InvalidCode { .. } => UserMessage::InvalidCode,
        LookupError::NotFound { .. } => UserMessage::NotFound,
        _ => UserMessage::ApiFailure,
    }
}

/// One user's lookup state: input field, displayed product, alternatives.
pub struct LookupSession<S: ProductSource> {
    source: Arc<S>,
    locale: Locale,
    barcode_input: String,
    product: QueryState<Product>,
    alternatives: Option<Arc<AlternativesPipeline<S>>>,
    pending: Option<JoinHandle<()>>,
}

impl<S: ProductSource> LookupSession<S> {
    /// Creates a session without alternative suggestions.
    pub fn new(source: Arc<S>, locale: Locale) -> Self {
        Self {
            source,
            locale,
            barcode_input: String::new(),
            product: QueryState::Idle,
            alternatives: None,
            pending: None,
        }
    }

    /// Enables alternative suggestions, sharing this session's source.
    pub fn with_alternatives(mut self, config: AlternativesConfig) -> Self {
        self.alternatives = Some(Arc::new(AlternativesPipeline::new(
            Arc::clone(&self.source),
            config,
            self.locale,
        )));
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn input(&self) -> &str {
        &self.barcode_input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.barcode_input = input.into();
    }

    /// Displayed product, if the last lookup succeeded.
    pub fn product(&self) -> Option<&Product> {
        self.product.value()
    }

    pub fn product_state(&self) -> &QueryState<Product> {
        &self.product
    }

    /// Snapshot of the alternatives, or `None` when suggestions are disabled.
    pub async fn alternatives(&self) -> Option<AlternativesState> {
        match &self.alternatives {
            Some(pipeline) => Some(pipeline.snapshot().await),
            None => None,
        }
    }

    /// Looks up the current input. The input field is cleared on success.
    pub async fn submit(&mut self) -> &QueryState<Product> {
        let input = self.barcode_input.clone();
        if self.lookup(&input).await.is_ok() {
            self.barcode_input.clear();
        }
        &self.product
    }

    /// Validates `input`, fetches the product and updates the state.
    ///
    /// The product state ends in `Success` or `Error` with a localized
    /// message; alternatives are re-triggered for the new displayed product.
    pub async fn lookup(&mut self, input: &str) -> Result<Product, LookupError> {
        let request_id = Uuid::new_v4();

        let result = match validate_code(input) {
            Ok(code) => {
                self.product = QueryState::Loading;
                self.fetch(&code).await
            }
            Err(e) => Err(e),
        };

        let label = match &result {
            Ok(_) => "found",
            Err(LookupError::InvalidCode { .. }) => "invalid",
            Err(LookupError::NotFound { .. }) => "not_found",
            Err(_) => "error",
        };
        counter!(m::LOOKUP_REQUESTS_TOTAL, m::LABEL_RESULT => label).increment(1);

        match &result {
            Ok(product) => {
                info!(%request_id, code = %product.code, "product found");
                self.product = QueryState::Success(product.clone());
            }
            Err(e) => {
                match e {
                    LookupError::InvalidCode { .. } | LookupError::NotFound { .. } => {
                        info!(%request_id, input, result = label, "lookup finished")
                    }
                    _ => warn!(%request_id, input, error = %e, "lookup failed"),
                }
                self.product = QueryState::Error(user_message(e).text(self.locale).to_owned());
            }
        }

        self.refresh_alternatives().await;
        result
    }

    /// Waits until the alternatives for the displayed product are committed.
    pub async fn settle_alternatives(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "alternatives task failed");
            }
        }
    }

    async fn fetch(&self, code: &str) -> Result<Product, LookupError> {
        match self.source.fetch_product(code).await? {
            ProductLookup::Found(product) => Ok(product),
            ProductLookup::NotFound => Err(LookupError::NotFound {
                code: code.to_owned(),
            }),
        }
    }

    async fn refresh_alternatives(&mut self) {
        let Some(pipeline) = &self.alternatives else {
            return;
        };
        // a replaced task is left running; its generation is already stale
        self.pending = pipeline.trigger(self.product.value()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockFailure, MockProductSource, SortKey};

    fn test_product() -> Product {
        Product {
            code: "737628064502".to_owned(),
            product_name: Some("Test".to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn validate_code_trims_and_accepts_digits() {
        assert_eq!(validate_code(" 737628064502\n").unwrap(), "737628064502");
        assert_eq!(validate_code("1").unwrap(), "1");
    }

    #[test]
    fn validate_code_rejects_bad_input() {
        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("12a4").is_err());
        assert!(validate_code("12 34").is_err());
        assert!(validate_code(&"1".repeat(25)).is_err());
        assert!(validate_code(&"1".repeat(24)).is_ok());
    }

    #[test]
    fn user_message_distinguishes_empty_and_invalid() {
        let empty = validate_code(" ").unwrap_err();
        let invalid = validate_code("abc").unwrap_err();
        assert_eq!(user_message(&empty), UserMessage::EmptyCode);
        assert_eq!(user_message(&invalid), UserMessage::InvalidCode);
    }

    #[tokio::test]
    async fn submit_success_clears_input() {
        let source = Arc::new(MockProductSource::new().with_product(test_product()));
        let mut session = LookupSession::new(source, Locale::En);

        session.set_input("737628064502");
        let state = session.submit().await;

        assert_eq!(
            state.value().and_then(|p| p.product_name.as_deref()),
            Some("Test")
        );
        assert_eq!(session.input(), "");
    }

    #[tokio::test]
    async fn submit_empty_shows_validation_message() {
        let source = Arc::new(MockProductSource::new());
        let mut session = LookupSession::new(source, Locale::En);

        session.set_input("");
        session.submit().await;

        assert!(session.product().is_none());
        assert_eq!(
            session.product_state().error(),
            Some(UserMessage::EmptyCode.text(Locale::En))
        );
    }

    #[tokio::test]
    async fn not_found_keeps_input_and_shows_distinct_message() {
        let source = Arc::new(MockProductSource::new());
        let mut session = LookupSession::new(source, Locale::De);

        session.set_input("4000000000000");
        session.submit().await;

        assert_eq!(session.input(), "4000000000000");
        assert_eq!(
            session.product_state().error(),
            Some(UserMessage::NotFound.text(Locale::De))
        );
    }

    #[tokio::test]
    async fn api_failure_shows_generic_message() {
        let source = Arc::new(MockProductSource::new().with_fetch_failure(MockFailure::Reported));
        let mut session = LookupSession::new(source, Locale::Fr);

        let err = session.lookup("761").await.unwrap_err();

        assert!(matches!(err, LookupError::Api(_)));
        assert_eq!(
            session.product_state().error(),
            Some(UserMessage::ApiFailure.text(Locale::Fr))
        );
    }

    #[tokio::test]
    async fn failed_lookup_clears_previous_alternatives() {
        let mut product = test_product();
        product.categories_tags = vec!["en:spreads".to_owned()];
        let source = Arc::new(
            MockProductSource::new()
                .with_product(product)
                .with_search("en:spreads", SortKey::Nutrition, vec![])
                .with_search("en:spreads", SortKey::Eco, vec![]),
        );
        let mut session =
            LookupSession::new(source, Locale::En).with_alternatives(AlternativesConfig::default());

        session.lookup("737628064502").await.unwrap();
        session.settle_alternatives().await;
        let state = session.alternatives().await.unwrap();
        assert_eq!(state.nutrition, QueryState::Success(vec![]));

        session.lookup("1").await.unwrap_err();
        session.settle_alternatives().await;
        assert_eq!(session.alternatives().await.unwrap(), AlternativesState::default());
    }

    #[tokio::test]
    async fn alternatives_disabled_returns_none() {
        let session = LookupSession::new(Arc::new(MockProductSource::new()), Locale::En);
        assert!(session.alternatives().await.is_none());
    }
}

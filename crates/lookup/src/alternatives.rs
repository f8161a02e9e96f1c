//! Alternative-suggestion pipeline.
//!
//! Whenever the displayed product changes, [`AlternativesPipeline::trigger`]
//! derives a category tag and runs two concurrent category searches, one sorted
//! by Nutri-Score and one by Eco-Score. Each result list is filtered
//! independently (see [`filter`](crate::filter)) and committed into an
//! [`AlternativesState`].
//!
//! # Stale responses
//!
//! Every trigger takes a new generation from a monotonically increasing
//! counter. The generation is bumped and compared while holding the state
//! lock, so a fetch started for a product that has since been replaced never
//! writes into the state.
//!
//! ```text
//! trigger(A) ─ gen 1 ─ search A ···························· commit(1) ✗ stale
//! trigger(B) ──────────── gen 2 ─ search B ─ commit(2) ✓
//! ```
//!
//! # Failure isolation
//!
//! - HTTP status, `error` field or malformed body: only that list errors.
//! - Transport failure on either search: both lists error.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shelfscan_core::error::ApiError;
use shelfscan_core::messages::UserMessage;
use shelfscan_core::metrics as m;
use shelfscan_core::state::QueryState;
use shelfscan_core::types::{Locale, Product};

use crate::client::{CategoryQuery, ProductSource, SortKey};
use crate::config::AlternativesConfig;
use crate::filter::{derive_category_tag, filter_candidates};

/// Suggestion state for the currently displayed product.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlternativesState {
    /// Code of the product the lists belong to.
    pub product_code: Option<String>,
    /// Category the searches were scoped to.
    pub category_tag: Option<String>,
    /// Healthier alternatives (Nutri-Score order).
    pub nutrition: QueryState<Vec<Product>>,
    /// More sustainable alternatives (Eco-Score order).
    pub eco: QueryState<Vec<Product>>,
}

impl AlternativesState {
    /// State of the list for `sort`.
    pub fn list(&self, sort: SortKey) -> &QueryState<Vec<Product>> {
        match sort {
            SortKey::Nutrition => &self.nutrition,
            SortKey::Eco => &self.eco,
        }
    }
}

/// Handle for one triggered fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    product_code: String,
    category_tag: String,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn category_tag(&self) -> &str {
        &self.category_tag
    }
}

/// Runs and commits alternative searches for the displayed product.
pub struct AlternativesPipeline<S: ProductSource> {
    source: Arc<S>,
    config: AlternativesConfig,
    locale: Locale,
    generation: AtomicU64,
    state: Mutex<AlternativesState>,
}

impl<S: ProductSource> AlternativesPipeline<S> {
    pub fn new(source: Arc<S>, config: AlternativesConfig, locale: Locale) -> Self {
        Self {
            source,
            config,
            locale,
            generation: AtomicU64::new(0),
            state: Mutex::new(AlternativesState::default()),
        }
    }

    pub fn config(&self) -> &AlternativesConfig {
        &self.config
    }

    /// Current generation. Increases on every [`begin`](Self::begin).
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> AlternativesState {
        self.state.lock().await.clone()
    }

    /// Starts a new generation for `product` and resets the state.
    ///
    /// Returns a [`Ticket`] when searches should run. Returns `None` when
    /// there is nothing to search: no product (state cleared), pipeline
    /// disabled (state cleared) or no category tag (both lists errored).
    pub async fn begin(&self, product: Option<&Product>) -> Option<Ticket> {
        let mut state = self.state.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(product) = product.filter(|_| self.config.enabled) else {
            debug!(generation, "alternatives cleared");
            *state = AlternativesState::default();
            return None;
        };

        let Some(category_tag) = derive_category_tag(&product.categories_tags) else {
            debug!(generation, code = %product.code, "no category tag for alternatives");
            let message = UserMessage::MissingCategory.text(self.locale).to_owned();
            *state = AlternativesState {
                product_code: Some(product.code.clone()),
                category_tag: None,
                nutrition: QueryState::Error(message.clone()),
                eco: QueryState::Error(message),
            };
            return None;
        };

        *state = AlternativesState {
            product_code: Some(product.code.clone()),
            category_tag: Some(category_tag.to_owned()),
            nutrition: QueryState::Loading,
            eco: QueryState::Loading,
        };

        Some(Ticket {
            generation,
            product_code: product.code.clone(),
            category_tag: category_tag.to_owned(),
        })
    }

    /// Runs both searches for `ticket` and commits the filtered results.
    ///
    /// Returns `false` if a newer generation superseded the ticket and
    /// nothing was written.
    pub async fn run(&self, ticket: Ticket) -> bool {
        let (nutrition, eco) = tokio::join!(
            self.search(&ticket, SortKey::Nutrition),
            self.search(&ticket, SortKey::Eco),
        );
        self.commit(&ticket, nutrition, eco).await
    }

    /// Begins a new generation and runs it to completion on the current task.
    pub async fn refresh(&self, product: Option<&Product>) -> AlternativesState {
        if let Some(ticket) = self.begin(product).await {
            self.run(ticket).await;
        }
        self.snapshot().await
    }

    /// Begins a new generation and runs the searches on a spawned task.
    ///
    /// The generation is taken before this returns, so any fetch still in
    /// flight from an earlier trigger is already stale.
    pub async fn trigger(self: &Arc<Self>, product: Option<&Product>) -> Option<JoinHandle<()>> {
        let ticket = self.begin(product).await?;
        let pipeline = Arc::clone(self);
        Some(tokio::spawn(async move {
            pipeline.run(ticket).await;
        }))
    }

    async fn search(&self, ticket: &Ticket, sort: SortKey) -> Result<Vec<Product>, ApiError> {
        let query = CategoryQuery {
            category_tag: ticket.category_tag.clone(),
            country: self.config.country_filter.clone(),
            store: self.config.store_filter.clone(),
            sort,
            page_size: self.config.page_size,
        };

        match self.source.search_category(&query).await {
            Ok(candidates) => {
                counter!(m::ALTERNATIVES_SEARCHES_TOTAL,
                    m::LABEL_SORT => sort.label(), m::LABEL_RESULT => "success")
                .increment(1);
                Ok(filter_candidates(
                    candidates,
                    &ticket.product_code,
                    sort,
                    &self.config.region,
                    &self.config.retailer,
                ))
            }
            Err(e) => {
                counter!(m::ALTERNATIVES_SEARCHES_TOTAL,
                    m::LABEL_SORT => sort.label(), m::LABEL_RESULT => "failure")
                .increment(1);
                warn!(
                    generation = ticket.generation,
                    sort = sort.label(),
                    category = %ticket.category_tag,
                    error = %e,
                    "alternative search failed"
                );
                Err(e)
            }
        }
    }

    async fn commit(
        &self,
        ticket: &Ticket,
        nutrition: Result<Vec<Product>, ApiError>,
        eco: Result<Vec<Product>, ApiError>,
    ) -> bool {
        let mut state = self.state.lock().await;

        let current = self.generation.load(Ordering::SeqCst);
        if current != ticket.generation {
            counter!(m::ALTERNATIVES_STALE_DISCARDED_TOTAL).increment(1);
            debug!(
                generation = ticket.generation,
                current,
                code = %ticket.product_code,
                "discarding stale alternatives"
            );
            return false;
        }

        let failure = UserMessage::ApiFailure.text(self.locale);
        let total_failure = nutrition.as_ref().is_err_and(ApiError::is_transport)
            || eco.as_ref().is_err_and(ApiError::is_transport);

        if total_failure {
            state.nutrition = QueryState::Error(failure.to_owned());
            state.eco = QueryState::Error(failure.to_owned());
        } else {
            state.nutrition = to_query_state(nutrition, failure);
            state.eco = to_query_state(eco, failure);
        }

        info!(
            generation = ticket.generation,
            code = %ticket.product_code,
            category = %ticket.category_tag,
            nutrition = state.nutrition.state_name(),
            eco = state.eco.state_name(),
            "alternatives committed"
        );
        true
    }
}

fn to_query_state(
    result: Result<Vec<Product>, ApiError>,
    failure: &str,
) -> QueryState<Vec<Product>> {
    match result {
        Ok(products) => QueryState::Success(products),
        Err(_) => QueryState::Error(failure.to_owned()),
    }
}

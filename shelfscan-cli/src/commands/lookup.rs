//! `shelfscan lookup` command handler

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use shelfscan_core::config::ShelfscanConfig;
use shelfscan_core::messages::UserMessage;
use shelfscan_core::state::QueryState;
use shelfscan_core::types::{Locale, Product};
use shelfscan_lookup::{
    AlternativesConfig, AlternativesState, ImagePolicy, LookupError, LookupSession, OffClient,
    ProductSource, SortKey, derive_category_tag,
};

use crate::cli::LookupArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, grade_colored};

/// Execute the `lookup` command.
///
/// Renders the report before returning, so a failed lookup still shows its
/// localized message. The error then decides the exit code.
pub async fn execute(
    args: LookupArgs,
    config: &ShelfscanConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut session = build_session(config, args.no_alternatives)?;
    let policy = ImagePolicy::new(&config.api.image_hosts)?;

    info!(code = %args.code, "looking up product");
    let (report, result) = lookup_report(&mut session, &policy, &args.code).await;

    writer.render(&report)?;
    result.map_err(CliError::from)
}

/// Builds a session against the configured product database.
///
/// Alternatives are attached unless disabled by flag or configuration.
pub(crate) fn build_session(
    config: &ShelfscanConfig,
    no_alternatives: bool,
) -> Result<LookupSession<OffClient>, CliError> {
    let client = OffClient::new(&config.api)?;
    let session = LookupSession::new(Arc::new(client), config.general.locale);

    let alternatives = AlternativesConfig::from_core(&config.alternatives);
    if no_alternatives || !alternatives.enabled {
        debug!("alternative suggestions disabled");
        return Ok(session);
    }
    alternatives.validate()?;
    Ok(session.with_alternatives(alternatives))
}

/// Looks up `input`, waits for the alternatives and builds the report.
pub(crate) async fn lookup_report<S: ProductSource>(
    session: &mut LookupSession<S>,
    policy: &ImagePolicy,
    input: &str,
) -> (LookupReport, Result<(), LookupError>) {
    let result = session.lookup(input).await.map(|_| ());
    session.settle_alternatives().await;
    let alternatives = session.alternatives().await;

    let report = LookupReport::new(
        input,
        session.product_state(),
        alternatives.as_ref(),
        session.locale(),
        policy,
    );
    (report, result)
}

/// Product as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brands: Option<String>,
    pub nutrition_grade: Option<String>,
    pub eco_grade: Option<String>,
    /// Only set when the image URL passes the allow-list.
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductView {
    pub fn new(product: &Product, locale: Locale, policy: &ImagePolicy) -> Self {
        Self {
            code: product.code.clone(),
            name: product.display_name(locale).to_owned(),
            brands: product.brands.clone().filter(|b| !b.trim().is_empty()),
            nutrition_grade: product.nutrition_grade().map(str::to_owned),
            eco_grade: product.eco_grade().map(str::to_owned),
            image_url: policy.image_for(product).map(str::to_owned),
            category: derive_category_tag(&product.categories_tags).map(str::to_owned),
        }
    }
}

/// Both alternative lists for the displayed product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativesView {
    pub category_tag: Option<String>,
    pub nutrition: QueryState<Vec<ProductView>>,
    pub eco: QueryState<Vec<ProductView>>,
}

impl AlternativesView {
    fn new(state: &AlternativesState, locale: Locale, policy: &ImagePolicy) -> Self {
        let views = |list: &QueryState<Vec<Product>>| {
            list.clone().map(|products| {
                products
                    .iter()
                    .map(|p| ProductView::new(p, locale, policy))
                    .collect()
            })
        };
        Self {
            category_tag: state.category_tag.clone(),
            nutrition: views(state.list(SortKey::Nutrition)),
            eco: views(state.list(SortKey::Eco)),
        }
    }

    fn list(&self, sort: SortKey) -> &QueryState<Vec<ProductView>> {
        match sort {
            SortKey::Nutrition => &self.nutrition,
            SortKey::Eco => &self.eco,
        }
    }
}

/// Lookup result: the product and, when enabled, its alternatives.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport {
    pub input: String,
    pub product: QueryState<ProductView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<AlternativesView>,
    #[serde(skip)]
    locale: Locale,
}

impl LookupReport {
    pub fn new(
        input: &str,
        product: &QueryState<Product>,
        alternatives: Option<&AlternativesState>,
        locale: Locale,
        policy: &ImagePolicy,
    ) -> Self {
        // alternatives of a failed lookup are always cleared; skip them
        let alternatives = alternatives
            .filter(|state| state.product_code.is_some())
            .map(|state| AlternativesView::new(state, locale, policy));
        Self {
            input: input.to_owned(),
            product: product
                .clone()
                .map(|p| ProductView::new(&p, locale, policy)),
            alternatives,
            locale,
        }
    }
}

impl Render for LookupReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let product = match &self.product {
            QueryState::Success(product) => product,
            QueryState::Error(message) => {
                writeln!(w, "{} {}", "✗".red().bold(), message.red())?;
                return Ok(());
            }
            QueryState::Loading => {
                writeln!(w, "{}", "Loading...".dimmed())?;
                return Ok(());
            }
            QueryState::Idle => return Ok(()),
        };

        writeln!(w, "{} ({})", product.name.bold(), product.code)?;
        if let Some(ref brands) = product.brands {
            writeln!(w, "  Brands:      {}", brands)?;
        }
        writeln!(
            w,
            "  Nutri-Score: {}   Eco-Score: {}",
            grade_colored(product.nutrition_grade.as_deref()),
            grade_colored(product.eco_grade.as_deref())
        )?;
        if let Some(ref category) = product.category {
            writeln!(w, "  Category:    {}", category)?;
        }
        if let Some(ref image_url) = product.image_url {
            writeln!(w, "  Image:       {}", image_url.dimmed())?;
        }

        if let Some(ref alternatives) = self.alternatives {
            for sort in [SortKey::Nutrition, SortKey::Eco] {
                writeln!(w)?;
                render_list(w, sort, alternatives.list(sort), self.locale)?;
            }
        }

        Ok(())
    }
}

fn render_list(
    w: &mut dyn Write,
    sort: SortKey,
    list: &QueryState<Vec<ProductView>>,
    locale: Locale,
) -> std::io::Result<()> {
    let heading = match sort {
        SortKey::Nutrition => "Healthier alternatives (Nutri-Score)",
        SortKey::Eco => "More sustainable alternatives (Eco-Score)",
    };
    writeln!(w, "{}", heading.bold())?;

    match list {
        QueryState::Success(products) if products.is_empty() => {
            writeln!(w, "  {}", UserMessage::NoAlternatives.text(locale).dimmed())?;
        }
        QueryState::Success(products) => {
            for (i, p) in products.iter().enumerate() {
                let grade = match sort {
                    SortKey::Nutrition => p.nutrition_grade.as_deref(),
                    SortKey::Eco => p.eco_grade.as_deref(),
                };
                writeln!(
                    w,
                    "  {:>2}. [{}] {} ({})",
                    i + 1,
                    grade_colored(grade),
                    p.name,
                    p.code
                )?;
            }
        }
        QueryState::Error(message) => writeln!(w, "  {}", message.red())?,
        QueryState::Loading => writeln!(w, "  {}", "Loading...".dimmed())?,
        QueryState::Idle => {}
    }
    Ok(())
}

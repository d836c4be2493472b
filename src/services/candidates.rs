use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    models::{
        CatalogProduct, GuestProfile, IngredientMatch, ProductCandidate, SemanticIngredient,
        Sensitivity,
    },
    services::{
        repository::{CatalogPage, ProductRepository},
        similarity::{best_match, MAX_INGREDIENTS_PER_SIDE},
        with_deadline,
    },
};

/// Splits a raw label into ingredient names
///
/// Parenthetical and bracketed text ("Water (Aqua)", "[+/- CI 77491]") is dropped,
/// entries are split on `,` and `;`, trimmed of `*` and `.`, deduplicated
/// case-insensitively and capped in label order.
pub fn parse_ingredient_list(raw: &str) -> Vec<String> {
    let mut flattened = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for c in raw.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => flattened.push(c),
            _ => {}
        }
    }

    let mut seen = HashSet::new();
    flattened
        .split([',', ';'])
        .map(|part| {
            part.trim()
                .trim_matches(|c: char| c == '*' || c == '.' || c.is_whitespace())
                .to_string()
        })
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .take(MAX_INGREDIENTS_PER_SIDE)
        .collect()
}

/// Each semantic ingredient matched at most once, to its best label entry
pub fn match_semantic_ingredients(
    semantic: &[SemanticIngredient],
    label: &[String],
) -> Vec<IngredientMatch> {
    semantic
        .iter()
        .take(MAX_INGREDIENTS_PER_SIDE)
        .filter_map(|ingredient| {
            best_match(&ingredient.name, label).map(|(matched, similarity)| IngredientMatch {
                ingredient: ingredient.clone(),
                product_ingredient: matched.to_string(),
                similarity,
            })
        })
        .collect()
}

/// Turns catalog rows into unscored candidates
///
/// Products failing the hard safety filter are dropped. With `require_match`,
/// products without a single semantic match are dropped too.
pub fn build_candidates(
    products: Vec<CatalogProduct>,
    semantic: &[SemanticIngredient],
    declared: &[Sensitivity],
    require_match: bool,
) -> Vec<ProductCandidate> {
    products
        .into_iter()
        .filter(|product| product.safety.admits(declared))
        .filter_map(|product| {
            let label = parse_ingredient_list(&product.ingredient_list);
            let matches = match_semantic_ingredients(semantic, &label);
            if require_match && matches.is_empty() {
                return None;
            }
            Some(ProductCandidate::new(product, label, matches))
        })
        .collect()
}

/// Pulls safety-filtered candidates from the catalog
///
/// The whole active catalog is read in keyset pages of `page_size` rows; the
/// timeout applies to each page query.
#[derive(Clone)]
pub struct CandidateRetriever {
    repository: Arc<dyn ProductRepository>,
    timeout: Duration,
    page_size: i64,
}

impl CandidateRetriever {
    pub fn new(repository: Arc<dyn ProductRepository>, timeout: Duration, page_size: i64) -> Self {
        Self {
            repository,
            timeout,
            page_size: page_size.max(1),
        }
    }

    /// Candidates with at least one fuzzy match against `semantic`
    pub async fn retrieve(
        &self,
        semantic: &[SemanticIngredient],
        profile: &GuestProfile,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ProductCandidate>> {
        let declared = profile.declared_sensitivities();
        let products = self.load(false, &declared, cancel).await?;
        let total = products.len();
        let candidates = build_candidates(products, semantic, &declared, true);

        tracing::info!(
            catalog = total,
            candidates = candidates.len(),
            semantic_ingredients = semantic.len(),
            "Candidates mapped onto semantic ingredients"
        );

        Ok(candidates)
    }

    /// Every safety-admissible product, matched against `targets` where possible
    pub async fn retrieve_all(
        &self,
        targets: &[SemanticIngredient],
        profile: &GuestProfile,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ProductCandidate>> {
        let declared = profile.declared_sensitivities();
        let products = self.load(false, &declared, cancel).await?;
        Ok(build_candidates(products, targets, &declared, false))
    }

    /// Last-resort candidates: any active product passing the hard safety filter
    pub async fn retrieve_emergency(
        &self,
        profile: &GuestProfile,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ProductCandidate>> {
        let declared = profile.declared_sensitivities();
        let products = self.load(true, &declared, cancel).await?;
        Ok(build_candidates(products, &[], &declared, false))
    }

    /// Every admissible active product, page by page in id order
    async fn load(
        &self,
        emergency: bool,
        declared: &[Sensitivity],
        cancel: &CancellationToken,
    ) -> AppResult<Vec<CatalogProduct>> {
        let start = Instant::now();
        let mut page = CatalogPage::first(declared, self.page_size);
        let mut products = Vec::new();
        let mut pages = 0usize;

        let result = loop {
            let batch = match self.fetch_page(emergency, &page, cancel).await {
                Ok(batch) => batch,
                Err(e) => break Err(e),
            };
            pages += 1;

            let full = batch.len() as i64 >= self.page_size;
            let last_id = batch.last().map(|p| p.id);
            products.extend(batch);

            match last_id {
                // Stop if ids stop increasing, whatever the page length
                Some(id) if full && page.after_id.map_or(true, |after| id > after) => {
                    page = page.after(id);
                }
                _ => break Ok(()),
            }
        };

        match &result {
            Ok(()) => tracing::debug!(
                repository = self.repository.name(),
                emergency,
                pages,
                products = products.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Catalog loaded"
            ),
            Err(e) => tracing::error!(
                repository = self.repository.name(),
                emergency,
                pages,
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Catalog query failed"
            ),
        }

        result.map(|()| products)
    }

    async fn fetch_page(
        &self,
        emergency: bool,
        page: &CatalogPage,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<CatalogProduct>> {
        let timeout = self.timeout;
        let query = async {
            if emergency {
                self.repository.any_active_products(page).await
            } else {
                self.repository.active_products(page).await
            }
        };

        with_deadline(
            cancel,
            timeout,
            || {
                AppError::RepositoryFailure(format!(
                    "catalog query timed out after {}ms",
                    timeout.as_millis()
                ))
            },
            query,
        )
        .await
    }
}

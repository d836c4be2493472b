#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use skinmatch_api::{
    error::{AppError, AppResult},
    models::{CatalogProduct, GuestProfile, SafetyFlag, SafetyFlags, SkinType},
    services::{
        ontology::{Binding, GraphClient},
        repository::CatalogPage,
        EngineSettings, ProductRepository, RecommendationEngine,
    },
};

const SKIN_TYPES: [SkinType; 5] = [
    SkinType::Normal,
    SkinType::Dry,
    SkinType::Oily,
    SkinType::Combination,
    SkinType::Sensitive,
];

/// Ingredient node in the in-memory graph
#[derive(Clone)]
pub struct FakeIngredient {
    pub name: &'static str,
    pub benefit: Option<&'static str>,
    pub recommended_for: Vec<SkinType>,
    pub treats: Vec<&'static str>,
}

pub fn ingredient(
    name: &'static str,
    recommended_for: &[SkinType],
    treats: &[&'static str],
) -> FakeIngredient {
    FakeIngredient {
        name,
        benefit: Some("supports the skin barrier"),
        recommended_for: recommended_for.to_vec(),
        treats: treats.to_vec(),
    }
}

/// In-memory graph answering the query shapes the engine sends
///
/// Relations are stored in the direction given, like a real triple store.
#[derive(Default)]
pub struct FakeGraph {
    pub ingredients: Vec<FakeIngredient>,
    pub conflicts: Vec<(&'static str, &'static str)>,
    pub synergies: Vec<(&'static str, &'static str)>,
    pub down: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeGraph {
    pub fn unreachable() -> Self {
        let graph = Self::default();
        graph.down.store(true, Ordering::SeqCst);
        graph
    }

    fn recommendations(&self, query: &str) -> Vec<Binding> {
        let Some(skin_type) = SKIN_TYPES.iter().find(|t| {
            query.contains(&format!("skin:recommendedFor skin:{} ", t.ontology_node()))
        }) else {
            return Vec::new();
        };
        let concerns = if query.contains("skin:treatsConcern") {
            Some(quoted_values(query))
        } else {
            None
        };

        let mut rows = Vec::new();
        for ingredient in &self.ingredients {
            if !ingredient.recommended_for.contains(skin_type) {
                continue;
            }
            let mut base = HashMap::new();
            base.insert("name".to_string(), ingredient.name.to_string());
            if let Some(benefit) = ingredient.benefit {
                base.insert("benefit".to_string(), benefit.to_string());
            }

            match &concerns {
                None => rows.push(base),
                Some(requested) => {
                    for concern in &ingredient.treats {
                        if requested.contains(&concern.to_lowercase()) {
                            let mut row = base.clone();
                            row.insert("concern".to_string(), concern.to_string());
                            rows.push(row);
                        }
                    }
                }
            }
        }
        rows
    }

    fn relations(&self, query: &str, relations: &[(&'static str, &'static str)]) -> Vec<Binding> {
        let filter = if query.contains("FILTER") {
            Some(quoted_values(query))
        } else {
            None
        };
        relations
            .iter()
            .filter(|(a, b)| match &filter {
                None => true,
                Some(names) => {
                    names.contains(&a.to_lowercase()) && names.contains(&b.to_lowercase())
                }
            })
            .map(|(a, b)| {
                let mut row = HashMap::new();
                row.insert("name1".to_string(), a.to_string());
                row.insert("name2".to_string(), b.to_string());
                row
            })
            .collect()
    }
}

/// Every double-quoted literal after the first `IN (`
fn quoted_values(query: &str) -> Vec<String> {
    let Some(start) = query.find("IN (") else {
        return Vec::new();
    };
    query[start..]
        .split('"')
        .skip(1)
        .step_by(2)
        .map(|v| v.to_string())
        .collect()
}

#[async_trait::async_trait]
impl GraphClient for FakeGraph {
    async fn select(&self, query: &str) -> AppResult<Vec<Binding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::TransientQueryFailure(
                "connection refused".to_string(),
            ));
        }

        if query.contains("skin:recommendedFor") {
            Ok(self.recommendations(query))
        } else if query.contains("skin:incompatibleWith") {
            Ok(self.relations(query, &self.conflicts))
        } else if query.contains("skin:synergisticWith") {
            Ok(self.relations(query, &self.synergies))
        } else {
            Ok(Vec::new())
        }
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

/// In-memory catalog; every stored product is active, kept in id order
#[derive(Default)]
pub struct FakeRepository {
    pub products: Vec<CatalogProduct>,
    pub failing: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeRepository {
    pub fn with_products(products: Vec<CatalogProduct>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let repository = Self::default();
        repository.failing.store(true, Ordering::SeqCst);
        repository
    }

    /// Rows the catalog query would return for `page`
    fn page(&self, page: &CatalogPage, require_ingredients: bool) -> Vec<CatalogProduct> {
        self.products
            .iter()
            .filter(|p| !require_ingredients || !p.ingredient_list.trim().is_empty())
            .filter(|p| p.safety.admits(&page.excluded))
            .filter(|p| page.after_id.map_or(true, |after| p.id > after))
            .take(page.limit as usize)
            .cloned()
            .collect()
    }

    fn check(&self) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::RepositoryFailure("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductRepository for FakeRepository {
    async fn active_products(&self, page: &CatalogPage) -> AppResult<Vec<CatalogProduct>> {
        self.check()?;
        Ok(self.page(page, true))
    }

    async fn any_active_products(&self, page: &CatalogPage) -> AppResult<Vec<CatalogProduct>> {
        self.check()?;
        Ok(self.page(page, false))
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

pub fn product(id: i64, ingredients: &str) -> CatalogProduct {
    CatalogProduct {
        id,
        name: format!("Product {}", id),
        brand: Some("Test Brand".to_string()),
        category: Some("serum".to_string()),
        url: None,
        image_path: None,
        ingredient_list: ingredients.to_string(),
        safety: SafetyFlags::default(),
    }
}

pub fn with_fragrance_flag(mut product: CatalogProduct, flag: SafetyFlag) -> CatalogProduct {
    product.safety.fragrance_free = flag;
    product
}

/// Graph holding the relations the scenarios rely on
pub fn skincare_graph() -> FakeGraph {
    use SkinType::*;
    FakeGraph {
        ingredients: vec![
            ingredient("Salicylic Acid", &[Oily, Combination], &["Acne", "Oiliness"]),
            ingredient("Niacinamide", &[Oily, Combination, Normal], &["Acne", "Redness"]),
            ingredient("Hyaluronic Acid", &[Dry, Normal, Combination], &["Dryness"]),
            ingredient("Retinol", &[Normal, Oily], &["Aging"]),
            ingredient("Vitamin C", &[Normal, Dry], &["Pigmentation"]),
        ],
        // Stored in the direction opposite to how labels usually list them
        conflicts: vec![("Vitamin C", "Retinol")],
        synergies: vec![("Hyaluronic Acid", "Niacinamide")],
        ..FakeGraph::default()
    }
}

pub fn engine(graph: Arc<FakeGraph>, repository: Arc<FakeRepository>) -> RecommendationEngine {
    engine_with(graph, repository, &EngineSettings::default())
}

pub fn engine_with(
    graph: Arc<FakeGraph>,
    repository: Arc<FakeRepository>,
    settings: &EngineSettings,
) -> RecommendationEngine {
    RecommendationEngine::new(graph, repository, settings)
}

pub fn oily_acne_fragrance() -> GuestProfile {
    GuestProfile::new(SkinType::Oily, ["acne"], ["fragrance"])
}

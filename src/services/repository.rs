use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::{CatalogProduct, SafetyFlags, Sensitivity},
};

/// One keyset page of the catalog
///
/// Products whose flag for any `excluded` sensitivity is explicitly false are
/// left out by the query itself, so a page never spends rows on products the
/// hard safety filter would drop.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub excluded: Vec<Sensitivity>,
    /// Only rows with a greater id; `None` starts from the beginning
    pub after_id: Option<i64>,
    pub limit: i64,
}

impl CatalogPage {
    pub fn first(excluded: &[Sensitivity], limit: i64) -> Self {
        Self {
            excluded: excluded.to_vec(),
            after_id: None,
            limit,
        }
    }

    pub fn after(&self, id: i64) -> Self {
        Self {
            after_id: Some(id),
            ..self.clone()
        }
    }
}

/// Read-only access to the product catalog
///
/// Both queries return rows ordered by ascending id so repeated requests against
/// an unchanged catalog see products in the same order.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProductRepository: Send + Sync {
    /// Active products whose ingredient list is present and non-blank
    async fn active_products(&self, page: &CatalogPage) -> AppResult<Vec<CatalogProduct>>;

    /// Any active products, ingredient list or not; the last-resort query
    async fn any_active_products(&self, page: &CatalogPage) -> AppResult<Vec<CatalogProduct>>;

    /// Repository name for logging
    fn name(&self) -> &'static str;
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    brand: Option<String>,
    category: Option<String>,
    url: Option<String>,
    image_path: Option<String>,
    ingredient_list: Option<String>,
    fragrance_free: Option<bool>,
    alcohol_free: Option<bool>,
    paraben_free: Option<bool>,
    sulfate_free: Option<bool>,
    silicone_free: Option<bool>,
}

impl From<ProductRow> for CatalogProduct {
    fn from(row: ProductRow) -> Self {
        CatalogProduct {
            id: row.id,
            name: row.name,
            brand: row.brand,
            category: row.category,
            url: row.url,
            image_path: row.image_path,
            ingredient_list: row.ingredient_list.unwrap_or_default(),
            safety: SafetyFlags {
                fragrance_free: row.fragrance_free.into(),
                alcohol_free: row.alcohol_free.into(),
                paraben_free: row.paraben_free.into(),
                sulfate_free: row.sulfate_free.into(),
                silicone_free: row.silicone_free.into(),
            },
        }
    }
}

const SELECT_PRODUCTS: &str = "SELECT id, name, brand, category, url, image_path, ingredient_list, \
     fragrance_free, alcohol_free, paraben_free, sulfate_free, silicone_free \
     FROM products WHERE is_active = true";

fn flag_column(sensitivity: Sensitivity) -> &'static str {
    match sensitivity {
        Sensitivity::Fragrance => "fragrance_free",
        Sensitivity::Alcohol => "alcohol_free",
        Sensitivity::Paraben => "paraben_free",
        Sensitivity::Sulfate => "sulfate_free",
        Sensitivity::Silicone => "silicone_free",
    }
}

/// Builds the page query; `NULL` flags pass the exclusion like `Unknown` does
fn catalog_query(page: &CatalogPage, require_ingredients: bool) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(SELECT_PRODUCTS);
    if require_ingredients {
        query.push(" AND ingredient_list IS NOT NULL AND btrim(ingredient_list) <> ''");
    }
    for sensitivity in &page.excluded {
        query.push(format!(
            " AND {} IS DISTINCT FROM false",
            flag_column(*sensitivity)
        ));
    }
    if let Some(after_id) = page.after_id {
        query.push(" AND id > ").push_bind(after_id);
    }
    query.push(" ORDER BY id LIMIT ").push_bind(page.limit);
    query
}

/// PostgreSQL-backed catalog
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        page: &CatalogPage,
        require_ingredients: bool,
    ) -> AppResult<Vec<CatalogProduct>> {
        let mut query = catalog_query(page, require_ingredients);
        let rows: Vec<ProductRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CatalogProduct::from).collect())
    }
}

#[async_trait::async_trait]
impl ProductRepository for PgProductRepository {
    async fn active_products(&self, page: &CatalogPage) -> AppResult<Vec<CatalogProduct>> {
        self.fetch(page, true).await
    }

    async fn any_active_products(&self, page: &CatalogPage) -> AppResult<Vec<CatalogProduct>> {
        self.fetch(page, false).await
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::db::{DbPool, StoreHandle};
use crate::entities::{
    category::{self, Entity as Category},
    product::{self, Column as ProductColumn, Entity as Product, ProductStatus},
    product_image::{self, Column as ImageColumn, Entity as ProductImage},
};
use crate::errors::ServiceError;
use crate::mock;

/// Derive a URL-safe slug from a human-readable name.
///
/// Lower-cases, drops everything that is not a word character, and turns
/// runs of spaces and hyphens into a single hyphen. Pure and idempotent, so
/// the same name always yields the same slug and a slug maps to itself.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.push(c);
        } else if (c == ' ' || c == '-') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Category as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<category::Model> for CategoryView {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            icon: m.icon,
            created_at: m.created_at,
        }
    }
}

/// Gallery image as served to clients, ordered by `order` ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductImageView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub alt: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
}

impl From<product_image::Model> for ProductImageView {
    fn from(m: product_image::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            url: m.url,
            alt: m.alt,
            sort_order: m.sort_order,
        }
    }
}

/// Product with its category and ordered image gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: String,
    pub description: String,
    /// Null means "custom pricing, contact the vendor"
    pub price: Option<Decimal>,
    pub category_id: Uuid,
    pub category: Option<CategoryView>,
    pub images: Vec<ProductImageView>,
    pub features: Vec<String>,
    pub tech_stack: Vec<String>,
    pub demo_url: Option<String>,
    pub is_featured: bool,
    pub status: ProductStatus,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl ProductView {
    fn from_parts(
        m: product::Model,
        cat: Option<category::Model>,
        images: Vec<product_image::Model>,
    ) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            short_description: m.short_description,
            description: m.description,
            price: m.price,
            category_id: m.category_id,
            category: cat.map(CategoryView::from),
            images: images.into_iter().map(ProductImageView::from).collect(),
            features: json_string_list(&m.features),
            tech_stack: json_string_list(&m.tech_stack),
            demo_url: m.demo_url,
            is_featured: m.is_featured,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn json_string_list(value: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Filters accepted by the public product listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ProductFilter {
    /// Category slug to restrict the listing to
    pub category: Option<String>,
    /// Only featured products when true
    pub featured: Option<bool>,
}

/// Image payload nested in product create/update bodies. The whole image set
/// is replaced whenever this field is present; `order` is assigned from the
/// array position.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ImageInput {
    pub url: String,
    pub alt: Option<String>,
}

/// Product create/update payload.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    /// Optional explicit slug; generated from the name when absent
    pub slug: Option<String>,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    /// Accepts a JSON number or a numeric string; blank strings and null
    /// are stored as "custom pricing", never as zero
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<Decimal>,
    pub category_id: Uuid,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub demo_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub status: ProductStatus,
    /// When present, fully replaces the existing image set
    pub images: Option<Vec<ImageInput>>,
}

/// Category create payload.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string())
            .map(Some)
            .map_err(D::Error::custom),
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Decimal::from_str(trimmed).map(Some).map_err(D::Error::custom)
            }
        }
        Some(_) => Err(D::Error::custom("price must be a number or numeric string")),
    }
}

/// Catalog read/write contract.
///
/// Public reads recover from an unconfigured or failing store by serving the
/// static mock catalog; admin reads and every write surface errors instead,
/// so an operator never mistakes fallback data for real state.
pub struct CatalogService {
    store: StoreHandle,
}

impl CatalogService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// The mock-fallback policy, expressed once: serve the live rows unless
    /// the store is unconfigured, the query fails, or it returns nothing.
    async fn read_with_fallback<T, Fut>(
        &self,
        operation: &'static str,
        live: Option<Fut>,
        fallback: impl FnOnce() -> Vec<T>,
    ) -> Vec<T>
    where
        Fut: Future<Output = Result<Vec<T>, ServiceError>>,
    {
        let result = match live {
            Some(fut) => fut.await,
            None => {
                warn!(operation, "catalog store unconfigured, serving mock data");
                return fallback();
            }
        };

        match result {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                info!(operation, "catalog store returned no rows, serving mock data");
                fallback()
            }
            Err(err) => {
                warn!(operation, error = %err, "catalog store query failed, serving mock data");
                fallback()
            }
        }
    }

    /// List all categories, ordered by name. Public surface: falls back to
    /// the mock catalog rather than erroring.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Vec<CategoryView> {
        let live = self.store.db().map(|db| self.fetch_categories(db));
        self.read_with_fallback("list_categories", live, mock::categories)
            .await
    }

    /// List active products for the public surface, newest first, each with
    /// its category and ordered images. Falls back to the mock catalog.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> Vec<ProductView> {
        let live = self
            .store
            .db()
            .map(|db| self.fetch_products(db, filter.clone(), Some(ProductStatus::Active)));
        self.read_with_fallback("list_products", live, move || {
            mock::products_filtered(&filter)
        })
        .await
    }

    /// Single product lookup for the public surface, by slug or, when the
    /// key parses as a UUID, by id. A miss against the live store still
    /// consults the mock catalog before reporting not-found.
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, key: &str) -> Result<ProductView, ServiceError> {
        if let Some(db) = self.store.db() {
            match self.fetch_product_by_key(db, key).await {
                Ok(Some(view)) => return Ok(view),
                Ok(None) => {}
                Err(err) => {
                    warn!(key, error = %err, "product lookup failed, consulting mock data");
                }
            }
        }
        mock::product_by_key(key)
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", key)))
    }

    /// Admin listing across every status. Never substitutes mock data:
    /// failures propagate so the operator sees real administrative state.
    #[instrument(skip(self))]
    pub async fn list_products_admin(&self) -> Result<Vec<ProductView>, ServiceError> {
        let db = self.store.db_for_write()?;
        self.fetch_products(db, ProductFilter::default(), None).await
    }

    /// Admin single-product lookup by id. No mock fallback.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductView, ServiceError> {
        let db = self.store.db_for_write()?;
        let found = Product::find_by_id(id)
            .find_also_related(Category)
            .one(db)
            .await?;
        let (model, cat) = found
            .ok_or_else(|| ServiceError::NotFound(format!("Product with id {} not found", id)))?;
        let images = self.fetch_images(db, &[model.id]).await?;
        let images = images.into_iter().map(|(_, img)| img).collect();
        Ok(ProductView::from_parts(model, cat, images))
    }

    /// Create a product and its image rows.
    ///
    /// The image insert is a separate statement from the product insert; if
    /// it fails the product still exists and creation reports success with a
    /// logged warning. A real transaction is future work.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: ProductInput) -> Result<ProductView, ServiceError> {
        let db = self.store.db_for_write()?;
        input.validate()?;

        let slug = match &input.slug {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => slugify(&input.name),
        };
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name does not yield a usable slug".to_string(),
            ));
        }
        self.ensure_product_slug_free(db, &slug, None).await?;

        let category = Category::find_by_id(input.category_id).one(db).await?;
        if category.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Category {} does not exist",
                input.category_id
            )));
        }

        let now = Utc::now();
        let product_id = Uuid::new_v4();
        let model = product::ActiveModel {
            id: Set(product_id),
            name: Set(input.name.clone()),
            slug: Set(slug),
            short_description: Set(input.short_description),
            description: Set(input.description),
            price: Set(input.price),
            category_id: Set(input.category_id),
            features: Set(serde_json::json!(input.features)),
            tech_stack: Set(serde_json::json!(input.tech_stack)),
            demo_url: Set(input.demo_url),
            is_featured: Set(input.is_featured),
            status: Set(input.status),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = model.insert(db).await?;

        let images = input.images.unwrap_or_default();
        self.replace_images(db, product_id, &input.name, &images, false)
            .await;

        info!(product_id = %inserted.id, "Product created");
        self.get_product(inserted.id).await
    }

    /// Overwrite a product's fields and, when `images` is present, replace
    /// its image set. `updated_at` is refreshed unconditionally.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: ProductInput,
    ) -> Result<ProductView, ServiceError> {
        let db = self.store.db_for_write()?;
        input.validate()?;

        let existing = Product::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with id {} not found", id)))?;

        let slug = match &input.slug {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => existing.slug.clone(),
        };
        if slug != existing.slug {
            self.ensure_product_slug_free(db, &slug, Some(id)).await?;
        }

        let mut model: product::ActiveModel = existing.into();
        model.name = Set(input.name.clone());
        model.slug = Set(slug);
        model.short_description = Set(input.short_description);
        model.description = Set(input.description);
        model.price = Set(input.price);
        model.category_id = Set(input.category_id);
        model.features = Set(serde_json::json!(input.features));
        model.tech_stack = Set(serde_json::json!(input.tech_stack));
        model.demo_url = Set(input.demo_url);
        model.is_featured = Set(input.is_featured);
        model.status = Set(input.status);
        model.updated_at = Set(Utc::now());
        let updated = model.update(db).await?;

        if let Some(images) = &input.images {
            self.replace_images(db, id, &input.name, images, true).await;
        }

        info!(product_id = %updated.id, "Product updated");
        self.get_product(updated.id).await
    }

    /// Delete a product and its images. Deleting an unknown id is a no-op.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.store.db_for_write()?;
        ProductImage::delete_many()
            .filter(ImageColumn::ProductId.eq(id))
            .exec(db)
            .await?;
        let result = Product::delete_by_id(id).exec(db).await?;
        info!(product_id = %id, rows = result.rows_affected, "Product deleted");
        Ok(())
    }

    /// Create a category with a generated-or-supplied unique slug.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(&self, input: CategoryInput) -> Result<CategoryView, ServiceError> {
        let db = self.store.db_for_write()?;
        input.validate()?;

        let slug = match &input.slug {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => slugify(&input.name),
        };
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name does not yield a usable slug".to_string(),
            ));
        }
        let taken = Category::find()
            .filter(category::Column::Slug.eq(&slug))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::DuplicateSlug(slug));
        }

        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            icon: Set(input.icon),
            created_at: Set(Utc::now()),
        };
        let inserted = model.insert(db).await?;
        info!(category_id = %inserted.id, "Category created");
        Ok(inserted.into())
    }

    async fn ensure_product_slug_free(
        &self,
        db: &DbPool,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(ProductColumn::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(ProductColumn::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(ServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }

    /// Replace (or initially populate) a product's image set. `order` is the
    /// array position; missing alt text defaults to the product name.
    ///
    /// The swap runs in one transaction, so a failure leaves the previous
    /// image set intact. Failures are logged, not propagated: the primary
    /// product write has already succeeded and must not be reported as
    /// failed.
    async fn replace_images(
        &self,
        db: &DbPool,
        product_id: Uuid,
        product_name: &str,
        images: &[ImageInput],
        delete_existing: bool,
    ) {
        let outcome = if delete_existing {
            self.swap_image_set(db, product_id, product_name, images)
                .await
        } else {
            insert_images(db, product_id, product_name, images).await
        };
        if let Err(err) = outcome {
            warn!(product_id = %product_id, error = %err, "partial write: product saved but image replacement failed");
        }
    }

    async fn swap_image_set(
        &self,
        db: &DbPool,
        product_id: Uuid,
        product_name: &str,
        images: &[ImageInput],
    ) -> Result<(), ServiceError> {
        let txn = db.begin().await?;
        ProductImage::delete_many()
            .filter(ImageColumn::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        insert_images(&txn, product_id, product_name, images).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn fetch_categories(&self, db: &DbPool) -> Result<Vec<CategoryView>, ServiceError> {
        let rows = Category::find()
            .order_by_asc(category::Column::Name)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(CategoryView::from).collect())
    }

    async fn fetch_products(
        &self,
        db: &DbPool,
        filter: ProductFilter,
        status: Option<ProductStatus>,
    ) -> Result<Vec<ProductView>, ServiceError> {
        let mut query = Product::find()
            .find_also_related(Category)
            .order_by_desc(ProductColumn::CreatedAt);

        if let Some(status) = status {
            query = query.filter(ProductColumn::Status.eq(status));
        }
        if let Some(slug) = &filter.category {
            let cat = Category::find()
                .filter(category::Column::Slug.eq(slug))
                .one(db)
                .await?;
            match cat {
                Some(cat) => query = query.filter(ProductColumn::CategoryId.eq(cat.id)),
                None => return Ok(Vec::new()),
            }
        }
        if filter.featured == Some(true) {
            query = query.filter(ProductColumn::IsFeatured.eq(true));
        }

        let rows = query.all(db).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|(p, _)| p.id).collect();
        let mut grouped: HashMap<Uuid, Vec<product_image::Model>> = HashMap::new();
        for (product_id, image) in self.fetch_images(db, &ids).await? {
            grouped.entry(product_id).or_default().push(image);
        }

        Ok(rows
            .into_iter()
            .map(|(p, cat)| {
                let images = grouped.remove(&p.id).unwrap_or_default();
                ProductView::from_parts(p, cat, images)
            })
            .collect())
    }

    async fn fetch_product_by_key(
        &self,
        db: &DbPool,
        key: &str,
    ) -> Result<Option<ProductView>, ServiceError> {
        let mut matcher = Condition::any().add(ProductColumn::Slug.eq(key));
        if let Ok(id) = Uuid::parse_str(key) {
            matcher = matcher.add(ProductColumn::Id.eq(id));
        }
        let found = Product::find()
            .filter(matcher)
            .find_also_related(Category)
            .one(db)
            .await?;
        let Some((model, cat)) = found else {
            return Ok(None);
        };
        let images = self
            .fetch_images(db, &[model.id])
            .await?
            .into_iter()
            .map(|(_, img)| img)
            .collect();
        Ok(Some(ProductView::from_parts(model, cat, images)))
    }

    /// Images for a set of products, in canonical presentation order:
    /// `order` ascending, insertion sequence breaking ties.
    async fn fetch_images(
        &self,
        db: &DbPool,
        product_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, product_image::Model)>, ServiceError> {
        let rows = ProductImage::find()
            .filter(ImageColumn::ProductId.is_in(product_ids.iter().copied()))
            .order_by_asc(ImageColumn::SortOrder)
            .order_by_asc(ImageColumn::CreatedAt)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|img| (img.product_id, img)).collect())
    }
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    product_name: &str,
    images: &[ImageInput],
) -> Result<(), ServiceError> {
    if images.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let rows: Vec<product_image::ActiveModel> = images
        .iter()
        .enumerate()
        .map(|(position, img)| product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            url: Set(img.url.clone()),
            alt: Set(Some(
                img.alt
                    .clone()
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| product_name.to_string()),
            )),
            sort_order: Set(position as i32),
            created_at: Set(now),
        })
        .collect();
    ProductImage::insert_many(rows).exec(conn).await?;
    Ok(())
}

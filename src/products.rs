//! Product collection: loaded once at startup, kept in memory, persisted after every change.
//!
//! [`ProductCatalog`] owns both the resident records and the file they live in. Writers
//! hold the lock while persisting, so the file and memory never diverge within one process.
//! A failed save rolls the in-memory change back.

use log::{info, warn};
use serde_json::{Map, Number, Value};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::id_gen::IdGenerator;
use crate::persistence::JsonStore;
use crate::types::{Product, ProductId};

/// Validated payload for a new product: all seven fields present and correctly typed.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub code: String,
    pub price: Number,
    pub status: bool,
    pub stock: Number,
    pub category: String,
}

/// Partial update. `None` means "leave the field as it is".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: Option<Number>,
    pub status: Option<bool>,
    pub stock: Option<Number>,
    pub category: Option<String>,
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, StoreError> {
    payload
        .as_object()
        .ok_or_else(|| StoreError::InvalidInput("product payload must be a JSON object".into()))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, StoreError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(StoreError::InvalidInput(format!("`{}` must be a string", key))),
    }
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Result<Option<Number>, StoreError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(_) => Err(StoreError::InvalidInput(format!("`{}` must be a number", key))),
    }
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> Result<Option<bool>, StoreError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(StoreError::InvalidInput(format!("`{}` must be a boolean", key))),
    }
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, StoreError> {
    value.ok_or_else(|| StoreError::InvalidInput(format!("`{}` is required", key)))
}

impl NewProduct {
    /// Validates a raw JSON payload. Unknown keys (including `id`) are ignored.
    pub fn from_json(payload: &Value) -> Result<Self, StoreError> {
        let obj = as_object(payload)?;
        Ok(Self {
            title: required(string_field(obj, "title")?, "title")?,
            description: required(string_field(obj, "description")?, "description")?,
            code: required(string_field(obj, "code")?, "code")?,
            price: required(number_field(obj, "price")?, "price")?,
            status: required(bool_field(obj, "status")?, "status")?,
            stock: required(number_field(obj, "stock")?, "stock")?,
            category: required(string_field(obj, "category")?, "category")?,
        })
    }

    fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            code: self.code,
            price: self.price,
            status: self.status,
            stock: self.stock,
            category: self.category,
        }
    }
}

impl ProductPatch {
    /// A key that is present must carry the right type, falsy values included.
    pub fn from_json(payload: &Value) -> Result<Self, StoreError> {
        let obj = as_object(payload)?;
        Ok(Self {
            title: string_field(obj, "title")?,
            description: string_field(obj, "description")?,
            code: string_field(obj, "code")?,
            price: number_field(obj, "price")?,
            status: bool_field(obj, "status")?,
            stock: number_field(obj, "stock")?,
            category: string_field(obj, "category")?,
        })
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(code) = self.code {
            product.code = code;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
    }
}

struct CatalogState {
    products: Vec<Product>,
    ids: IdGenerator,
}

impl CatalogState {
    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.products
            .iter()
            .position(|p| p.id.0 == id)
            .ok_or_else(|| StoreError::product_not_found(id))
    }
}

/// Resident product collection backed by one JSON file.
pub struct ProductCatalog {
    store: JsonStore,
    state: RwLock<CatalogState>,
}

impl ProductCatalog {
    /// Reads the collection from `store`. A missing or unparsable file is an error.
    pub async fn load(store: JsonStore, ids: IdGenerator) -> Result<Self, StoreError> {
        let products: Vec<Product> = store.load().await?;
        info!(
            "product catalog loaded path={} count={}",
            store.path().display(),
            products.len()
        );
        Ok(Self {
            store,
            state: RwLock::new(CatalogState { products, ids }),
        })
    }

    pub async fn list_all(&self) -> Vec<Product> {
        self.state.read().await.products.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.products.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Product, StoreError> {
        let state = self.state.read().await;
        let idx = state.position(id)?;
        Ok(state.products[idx].clone())
    }

    /// Validates `payload`, assigns a fresh id, appends, and persists.
    pub async fn create(&self, payload: &Value) -> Result<Product, StoreError> {
        let new_product = NewProduct::from_json(payload).map_err(|e| {
            warn!("product rejected error={}", e);
            e
        })?;
        let mut state = self.state.write().await;
        let id = {
            let CatalogState { products, ids } = &mut *state;
            ids.next_unique(|candidate| products.iter().any(|p| p.id.0 == candidate))?
        };
        let product = new_product.into_product(ProductId(id));
        state.products.push(product.clone());
        if let Err(e) = self.store.save(&state.products).await {
            state.products.pop();
            return Err(e.into());
        }
        info!(
            "product created id={} code={} title={}",
            product.id, product.code, product.title
        );
        Ok(product)
    }

    /// Overwrites the fields present in `payload` on the product with `id`, then persists.
    pub async fn update(&self, id: &str, payload: &Value) -> Result<Product, StoreError> {
        let patch = ProductPatch::from_json(payload).map_err(|e| {
            warn!("product update rejected id={} error={}", id, e);
            e
        })?;
        let mut state = self.state.write().await;
        let idx = state.position(id)?;
        let previous = state.products[idx].clone();
        patch.apply(&mut state.products[idx]);
        if let Err(e) = self.store.save(&state.products).await {
            state.products[idx] = previous;
            return Err(e.into());
        }
        info!("product updated id={}", id);
        Ok(state.products[idx].clone())
    }

    /// Removes the product with `id`, persists, and returns the removed record.
    pub async fn delete(&self, id: &str) -> Result<Product, StoreError> {
        let mut state = self.state.write().await;
        let idx = state.position(id)?;
        let removed = state.products.remove(idx);
        if let Err(e) = self.store.save(&state.products).await {
            state.products.insert(idx, removed);
            return Err(e.into());
        }
        info!("product deleted id={}", id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn init_log() {
        let _ = env_logger::try_init();
    }

    fn valid_payload() -> Value {
        json!({
            "title": "Lamp",
            "description": "Desk lamp",
            "code": "LMP-1",
            "price": 25,
            "status": true,
            "stock": 10,
            "category": "home"
        })
    }

    async fn empty_catalog(dir: &tempfile::TempDir) -> ProductCatalog {
        let store = JsonStore::new(dir.path().join("products.json"));
        store.ensure_exists().await.unwrap();
        ProductCatalog::load(store, IdGenerator::with_seed(1)).await.unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_persists() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let product = catalog.create(&valid_payload()).await.unwrap();
        assert!(!product.id.0.is_empty());
        assert_eq!(product.title, "Lamp");

        let on_disk: Vec<Product> = JsonStore::new(dir.path().join("products.json"))
            .load()
            .await
            .unwrap();
        assert_eq!(on_disk, vec![product]);
    }

    #[tokio::test]
    async fn create_rejects_each_missing_or_mistyped_field() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let fields = ["title", "description", "code", "price", "status", "stock", "category"];
        for field in fields {
            let mut missing = valid_payload();
            missing.as_object_mut().unwrap().remove(field);
            let err = catalog.create(&missing).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)), "missing {}", field);

            let mut mistyped = valid_payload();
            let wrong = if field == "price" || field == "stock" { json!("12") } else { json!(12) };
            mistyped[field] = wrong;
            let err = catalog.create(&mistyped).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)), "mistyped {}", field);
        }
        assert!(catalog.is_empty().await);
    }

    #[tokio::test]
    async fn create_rejects_non_object_payload() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let err = catalog.create(&json!([1, 2, 3])).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn created_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let product = catalog.create(&valid_payload()).await.unwrap();
            assert!(seen.insert(product.id));
        }
        assert_eq!(catalog.len().await, 50);
    }

    #[tokio::test]
    async fn update_changes_only_present_fields() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let created = catalog.create(&valid_payload()).await.unwrap();
        catalog.update(&created.id.0, &json!({ "price": 50 })).await.unwrap();

        let fetched = catalog.get_by_id(&created.id.0).await.unwrap();
        assert_eq!(fetched.price, Number::from(50));
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.stock, created.stock);
        assert_eq!(fetched.status, created.status);
    }

    #[tokio::test]
    async fn update_applies_falsy_values() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let created = catalog.create(&valid_payload()).await.unwrap();
        let updated = catalog
            .update(
                &created.id.0,
                &json!({ "price": 0, "stock": 0, "description": "", "status": false }),
            )
            .await
            .unwrap();
        assert_eq!(updated.price, Number::from(0));
        assert_eq!(updated.stock, Number::from(0));
        assert_eq!(updated.description, "");
        assert!(!updated.status);
    }

    #[tokio::test]
    async fn update_with_wrong_type_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let created = catalog.create(&valid_payload()).await.unwrap();
        let err = catalog
            .update(&created.id.0, &json!({ "title": "New", "price": "free" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        assert_eq!(catalog.get_by_id(&created.id.0).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let err = catalog.update("nope", &json!({ "price": 1 })).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let created = catalog.create(&valid_payload()).await.unwrap();
        let removed = catalog.delete(&created.id.0).await.unwrap();
        assert_eq!(removed, created);
        let err = catalog.get_by_id(&created.id.0).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(matches!(
            catalog.delete(&created.id.0).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn reload_sees_persisted_changes() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let kept = catalog.create(&valid_payload()).await.unwrap();
        let dropped = catalog.create(&valid_payload()).await.unwrap();
        catalog.delete(&dropped.id.0).await.unwrap();

        let reloaded = ProductCatalog::load(
            JsonStore::new(dir.path().join("products.json")),
            IdGenerator::with_seed(2),
        )
        .await
        .unwrap();
        assert_eq!(reloaded.list_all().await, vec![kept]);
    }

    #[tokio::test]
    async fn failed_save_rolls_back_create() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        // Replacing the file with a directory makes every write fail.
        let path = dir.path().join("products.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = catalog.create(&valid_payload()).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(catalog.is_empty().await);
    }

    fn break_store(dir: &tempfile::TempDir) {
        let path = dir.path().join("products.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
    }

    #[tokio::test]
    async fn failed_save_rolls_back_update() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let created = catalog.create(&valid_payload()).await.unwrap();
        break_store(&dir);

        let err = catalog
            .update(&created.id.0, &json!({ "price": 99, "title": "Other" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(catalog.get_by_id(&created.id.0).await.unwrap(), created);
    }

    #[tokio::test]
    async fn failed_save_rolls_back_delete() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let first = catalog.create(&valid_payload()).await.unwrap();
        let second = catalog.create(&valid_payload()).await.unwrap();
        break_store(&dir);

        let err = catalog.delete(&first.id.0).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(catalog.list_all().await, vec![first, second]);
    }

    #[tokio::test]
    async fn empty_update_keeps_record() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = empty_catalog(&dir).await;
        let created = catalog.create(&valid_payload()).await.unwrap();
        let updated = catalog.update(&created.id.0, &json!({})).await.unwrap();
        assert_eq!(updated, created);
    }
}

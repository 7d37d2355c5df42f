use crate::hooks::{keys, Hooks};
use crate::models::product::{Product, ProductCreate, ProductId, ProductUpdate};
use crate::query::{QueryError, QueryState};

impl Hooks {
    pub async fn products(&self) -> QueryState<Vec<Product>> {
        let api = &self.api;
        self.cache
            .fetch(&keys::products(), &self.config.read, || api.products().list())
            .await
    }

    pub async fn create_product(&self, payload: &ProductCreate) -> Result<Product, QueryError> {
        self.cache
            .mutate(
                &self.mutations.create_product,
                &[keys::products()],
                self.api.products().create(payload),
            )
            .await
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        payload: &ProductUpdate,
    ) -> Result<Product, QueryError> {
        self.cache
            .mutate(
                &self.mutations.update_product,
                &[keys::products()],
                self.api.products().update(id, payload),
            )
            .await
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), QueryError> {
        self.cache
            .mutate(
                &self.mutations.delete_product,
                &[keys::products()],
                self.api.products().delete(id),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product_json, spawn_backend, test_hooks, RequestLog};
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        routing::{get, put},
        Json, Router,
    };
    use serde_json::{json, Map, Value};
    use std::sync::{Arc, Mutex};

    type Store = Arc<Mutex<Vec<Value>>>;

    async fn stateful_backend() -> (String, RequestLog) {
        let store: Store = Arc::new(Mutex::new(vec![
            product_json(1, "RTX 4070"),
            product_json(2, "Steam Deck"),
        ]));

        let routes = Router::new()
            .route(
                "/products",
                get(|State(store): State<Store>| async move {
                    Json(Value::Array(store.lock().unwrap().clone()))
                })
                .post(|State(store): State<Store>, Json(body): Json<Value>| async move {
                    let mut products = store.lock().unwrap();
                    let id = products.len() as i64 + 10;
                    let product = product_json(id, body["name"].as_str().unwrap_or_default());
                    products.push(product.clone());
                    (StatusCode::CREATED, Json(product))
                }),
            )
            .route(
                "/products/:id",
                put(
                    |State(store): State<Store>, Path(id): Path<i64>, Json(body): Json<Value>| async move {
                        let mut products = store.lock().unwrap();
                        let Some(product) = products.iter_mut().find(|p| p["id"] == json!(id)) else {
                            return Err((StatusCode::NOT_FOUND, Json(json!({ "detail": "Product not found" }))));
                        };
                        if let (Value::Object(target), Value::Object(changes)) = (product, body) {
                            target.extend(changes);
                        }
                        Ok(Json(products.iter().find(|p| p["id"] == json!(id)).cloned().unwrap_or_default()))
                    },
                )
                .delete(|State(store): State<Store>, Path(id): Path<i64>| async move {
                    store.lock().unwrap().retain(|p| p["id"] != json!(id));
                    StatusCode::NO_CONTENT
                }),
            )
            .with_state(store);

        spawn_backend(routes).await
    }

    #[tokio::test]
    async fn test_deleted_product_disappears_from_next_read() {
        let (base_url, log) = stateful_backend().await;
        let hooks = test_hooks(&base_url);

        let before = hooks.products().await;
        assert!(before.data().unwrap().iter().any(|p| p.id == 2));

        hooks.delete_product(2).await.unwrap();
        assert!(!hooks.mutations().delete_product.is_pending());

        let after = hooks.products().await;
        assert!(!after.data().unwrap().iter().any(|p| p.id == 2));
        assert_eq!(log.count("GET /api/products"), 2);
    }

    #[tokio::test]
    async fn test_create_and_update_refresh_the_list() {
        let (base_url, log) = stateful_backend().await;
        let hooks = test_hooks(&base_url);
        hooks.products().await;

        let created = hooks
            .create_product(&ProductCreate {
                name: "RX 7800 XT".to_string(),
                category: "gpu".to_string(),
                brands: vec![],
                filters: Map::new(),
                price_min: 300.0,
                price_max: 480.0,
                active: true,
            })
            .await
            .unwrap();
        let listed = hooks.products().await;
        assert!(listed.data().unwrap().iter().any(|p| p.id == created.id));

        let update = ProductUpdate {
            name: Some("RTX 4070 Super".to_string()),
            ..Default::default()
        };
        hooks.update_product(1, &update).await.unwrap();
        let listed = hooks.products().await;
        let renamed = listed.data().unwrap().iter().find(|p| p.id == 1).map(|p| p.name.clone());
        assert_eq!(renamed.as_deref(), Some("RTX 4070 Super"));
        assert_eq!(log.count("GET /api/products"), 3);
    }

    #[tokio::test]
    async fn test_failed_update_does_not_invalidate() {
        let (base_url, log) = stateful_backend().await;
        let hooks = test_hooks(&base_url);
        hooks.products().await;

        let err = hooks
            .update_product(99, &ProductUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Request failed (404): Product not found");

        hooks.products().await;
        assert_eq!(log.count("GET /api/products"), 1);
    }
}

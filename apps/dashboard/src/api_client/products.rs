use crate::api_client::{ApiClient, ApiError};
use crate::models::product::{Product, ProductCreate, ProductId, ProductUpdate};

/// `/products` resource.
#[derive(Debug, Clone, Copy)]
pub struct ProductsApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn products(&self) -> ProductsApi<'_> {
        ProductsApi { api: self }
    }
}

impl ProductsApi<'_> {
    /// GET /products
    pub async fn list(self) -> Result<Vec<Product>, ApiError> {
        self.api.get("/products").await
    }

    /// POST /products
    pub async fn create(self, payload: &ProductCreate) -> Result<Product, ApiError> {
        self.api.post("/products", payload).await
    }

    /// PUT /products/{id}. Unset fields are left alone server-side.
    pub async fn update(self, id: ProductId, payload: &ProductUpdate) -> Result<Product, ApiError> {
        self.api.put(&format!("/products/{id}"), payload).await
    }

    /// DELETE /products/{id}. The backend answers 204.
    pub async fn delete(self, id: ProductId) -> Result<(), ApiError> {
        self.api.delete(&format!("/products/{id}")).await
    }
}

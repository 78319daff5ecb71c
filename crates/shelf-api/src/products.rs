//! Handlers for `/products` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products` | Every product with its price range |
//! | `GET`  | `/products/{slug}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use shelf_core::{
  catalog::{Catalog, Product},
  store::ShopStore,
};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct PriceRange {
  pub min: i64,
  pub max: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductListing {
  #[serde(flatten)]
  pub product:     Product,
  pub price_range: Option<PriceRange>,
}

impl From<Product> for ProductListing {
  fn from(product: Product) -> Self {
    let price_range = product.price_range().map(|(min, max)| PriceRange { min, max });
    ProductListing { product, price_range }
  }
}

/// `GET /products`
pub async fn list<S, C>(
  State(state): State<ApiState<S, C>>,
) -> Result<Json<Vec<ProductListing>>, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let products = state
    .catalog
    .list_products()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(products.into_iter().map(ProductListing::from).collect()))
}

/// `GET /products/{slug}`
pub async fn get_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(slug): Path<String>,
) -> Result<Json<ProductListing>, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let product = state
    .catalog
    .get_product(&slug)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("product {slug} not found")))?;
  Ok(Json(product.into()))
}

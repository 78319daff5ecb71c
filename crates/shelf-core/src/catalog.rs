//! Catalog lookup, the read-only source of product and variant data.
//!
//! The catalog is an external collaborator. This crate only queries it; any
//! caching is the implementation's own business. Products own their variants
//! by value and variants never point back at their product: the lookup result
//! for a variant ([`VariantRecord`]) carries copies of the parent's fields
//! instead.

use std::{convert::Infallible, future::Future};

use serde::{Deserialize, Serialize};

// ─── Records ─────────────────────────────────────────────────────────────────

/// A purchasable variant of a product. Prices are integer minor-currency
/// units (e.g. cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
  pub variant_id: String,
  pub name:       String,
  pub price:      i64,
  pub images:     Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub product_id:  String,
  pub slug:        String,
  pub name:        String,
  pub summary:     String,
  pub description: String,
  pub images:      Vec<String>,
  pub variants:    Vec<Variant>,
}

impl Product {
  /// Lowest and highest variant price, or `None` for a product without
  /// variants.
  pub fn price_range(&self) -> Option<(i64, i64)> {
    let min = self.variants.iter().map(|v| v.price).min()?;
    let max = self.variants.iter().map(|v| v.price).max()?;
    Some((min, max))
  }

  /// Build the flattened lookup record for one of this product's variants.
  pub fn variant_record(&self, variant: &Variant) -> VariantRecord {
    VariantRecord {
      variant_id:    variant.variant_id.clone(),
      variant_name:  variant.name.clone(),
      price:         variant.price,
      image:         variant.images.first().cloned(),
      product_id:    self.product_id.clone(),
      product_slug:  self.slug.clone(),
      product_name:  self.name.clone(),
      product_image: self.images.first().cloned(),
    }
  }
}

/// Current catalog data for a single variant, flattened with its parent
/// product's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
  pub variant_id:    String,
  pub variant_name:  String,
  pub price:         i64,
  /// The variant's own first image, if it has one.
  pub image:         Option<String>,
  pub product_id:    String,
  pub product_slug:  String,
  pub product_name:  String,
  /// The parent product's first image, if it has one.
  pub product_image: Option<String>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read-only product catalog.
pub trait Catalog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve a variant by id. `None` if the catalog does not carry it.
  fn get_variant<'a>(
    &'a self,
    variant_id: &'a str,
  ) -> impl Future<Output = Result<Option<VariantRecord>, Self::Error>> + Send + 'a;

  /// Resolve a product by its URL slug.
  fn get_product<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + 'a;

  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;
}

// ─── Static catalog ──────────────────────────────────────────────────────────

/// A fixed, in-process catalog. Lookups never fail.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
  products: Vec<Product>,
}

impl StaticCatalog {
  pub fn new(products: Vec<Product>) -> Self { Self { products } }

  /// The storefront's seeded product range.
  pub fn seeded() -> Self {
    fn variant(id: &str, name: &str, price: i64, images: &[&str]) -> Variant {
      Variant {
        variant_id: id.to_owned(),
        name:       name.to_owned(),
        price,
        images:     images.iter().map(|s| (*s).to_owned()).collect(),
      }
    }

    const WHITE_TEE: &str = "https://images.unsplash.com/photo-1583743814966-8936f5b7be1a?auto=format&fit=crop&q=80&w=800";

    Self::new(vec![
      Product {
        product_id:  "prod_1".into(),
        slug:        "basic-tee".into(),
        name:        "Basic Tee".into(),
        summary:     "A simple, high-quality cotton t-shirt.".into(),
        description: "The Basic Tee is an essential wardrobe staple.".into(),
        images:      vec![
          "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?auto=format&fit=crop&q=80&w=800".into(),
        ],
        variants:    vec![
          variant("var_1", "Black / S", 2000, &[]),
          variant("var_2", "Black / M", 2000, &[]),
          variant("var_3", "Black / L", 2000, &[]),
          variant("var_4", "White / S", 2000, &[WHITE_TEE]),
          variant("var_5", "White / M", 2000, &[WHITE_TEE]),
        ],
      },
      Product {
        product_id:  "prod_2".into(),
        slug:        "ceramic-mug".into(),
        name:        "Ceramic Mug".into(),
        summary:     "A handcrafted ceramic mug for your morning coffee.".into(),
        description: "Enjoy your favorite hot beverage.".into(),
        images:      vec![
          "https://images.unsplash.com/photo-1514228742587-6b1558fcca3d?auto=format&fit=crop&q=80&w=800".into(),
        ],
        variants:    vec![variant("var_6", "Standard", 1500, &[])],
      },
      Product {
        product_id:  "prod_3".into(),
        slug:        "leather-wallet".into(),
        name:        "Leather Wallet".into(),
        summary:     "A sleek and durable leather wallet.".into(),
        description: "Keep your cards and cash organized.".into(),
        images:      vec![
          "https://images.unsplash.com/photo-1627123424574-1837526ae418?auto=format&fit=crop&q=80&w=800".into(),
        ],
        variants:    vec![
          variant("var_7", "Brown", 4500, &[]),
          variant("var_8", "Black", 4500, &[]),
        ],
      },
    ])
  }

  /// Replace a variant's price in place. Existing cart snapshots are not
  /// affected.
  pub fn set_price(&mut self, variant_id: &str, price: i64) -> bool {
    self
      .products
      .iter_mut()
      .flat_map(|p| p.variants.iter_mut())
      .find(|v| v.variant_id == variant_id)
      .map(|v| v.price = price)
      .is_some()
  }

  fn find_variant(&self, variant_id: &str) -> Option<VariantRecord> {
    self.products.iter().find_map(|p| {
      p.variants
        .iter()
        .find(|v| v.variant_id == variant_id)
        .map(|v| p.variant_record(v))
    })
  }
}

impl Catalog for StaticCatalog {
  type Error = Infallible;

  async fn get_variant(&self, variant_id: &str) -> Result<Option<VariantRecord>, Infallible> {
    Ok(self.find_variant(variant_id))
  }

  async fn get_product(&self, slug: &str) -> Result<Option<Product>, Infallible> {
    Ok(self.products.iter().find(|p| p.slug == slug).cloned())
  }

  async fn list_products(&self) -> Result<Vec<Product>, Infallible> {
    Ok(self.products.clone())
  }
}

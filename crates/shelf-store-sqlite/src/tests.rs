//! Integration tests for `SqliteStore` against an in-memory database, driven
//! through the `shelf-core` operations.

use shelf_core::{
  Error,
  account::{PasswordChange, PasswordHasher, change_password, register_owner},
  address::{self, AddressFields},
  cart::{CartReplace, CartWrite, LineRequest},
  catalog::{Product, StaticCatalog, Variant},
  materialize::{Materialized, SkipReason, materialize_order},
  merge::{add_to_cart, get_cart, remove_from_cart, set_cart_quantity, upsert_cart},
  order::{NewOrder, OrderInsert, OrderLine, PaymentCompletion, ShippingSnapshot},
  store::ShopStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn lines(pairs: &[(&str, i64)]) -> Vec<LineRequest> {
  pairs.iter().map(|(id, q)| LineRequest::new(*id, *q)).collect()
}

// ─── Cart merge ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_without_id_creates_cart() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let merged = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 2)]))
    .await
    .unwrap();
  assert!(merged.created);
  assert_eq!(merged.cart.lines.len(), 1);
  assert_eq!(merged.cart.lines[0].variant.variant_id, "var_1");
  assert_eq!(merged.cart.lines[0].quantity, 2);
  assert_eq!(merged.cart.lines[0].variant.price, 2000);
  assert_eq!(merged.cart.total_amount(), 4000);

  let fetched = s.get_cart(merged.cart.cart_id).await.unwrap().unwrap();
  assert_eq!(fetched, merged.cart);
}

#[tokio::test]
async fn upsert_replaces_whole_line_set() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let first = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 2), ("var_6", 1)]))
    .await
    .unwrap();
  let id = first.cart.cart_id;

  let second = upsert_cart(&s, &catalog, Some(id), None, lines(&[("var_7", 3)]))
    .await
    .unwrap();
  assert!(!second.created);
  assert_eq!(second.cart.cart_id, id);
  assert_eq!(second.cart.lines.len(), 1);
  assert_eq!(second.cart.lines[0].variant.variant_id, "var_7");
  assert_eq!(second.cart.total_amount(), 3 * 4500);
  assert!(second.cart.revision > first.cart.revision);
}

#[tokio::test]
async fn zero_quantity_empties_cart() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let first = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 2)]))
    .await
    .unwrap();
  let id = first.cart.cart_id;

  let emptied = upsert_cart(&s, &catalog, Some(id), None, lines(&[("var_1", 0)]))
    .await
    .unwrap();
  assert!(emptied.cart.lines.is_empty());
  assert_eq!(emptied.cart.total_amount(), 0);

  // The cart row survives with no lines.
  let fetched = s.get_cart(id).await.unwrap().unwrap();
  assert!(fetched.lines.is_empty());
}

#[tokio::test]
async fn line_order_follows_request_order() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let merged = upsert_cart(
    &s,
    &catalog,
    None,
    None,
    lines(&[("var_7", 1), ("var_1", 1), ("var_6", 1)]),
  )
  .await
  .unwrap();
  let ids: Vec<_> = merged
    .cart
    .lines
    .iter()
    .map(|l| l.variant.variant_id.as_str())
    .collect();
  assert_eq!(ids, ["var_7", "var_1", "var_6"]);
}

#[tokio::test]
async fn unknown_variant_leaves_cart_untouched() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let first = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 2)]))
    .await
    .unwrap();
  let id = first.cart.cart_id;

  let err = upsert_cart(&s, &catalog, Some(id), None, lines(&[("var_6", 1), ("nope", 1)]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::VariantNotFound(ref v) if v == "nope"));

  let fetched = s.get_cart(id).await.unwrap().unwrap();
  assert_eq!(fetched, first.cart);
}

#[tokio::test]
async fn unknown_variant_without_cart_creates_nothing() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let err = upsert_cart(&s, &catalog, None, None, lines(&[("nope", 1)]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::VariantNotFound(_)));
}

#[tokio::test]
async fn stale_cart_id_creates_fresh_cart() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();
  let stale = Uuid::new_v4();

  let merged = upsert_cart(&s, &catalog, Some(stale), None, lines(&[("var_6", 1)]))
    .await
    .unwrap();
  assert!(merged.created);
  assert_ne!(merged.cart.cart_id, stale);
  assert!(s.get_cart(stale).await.unwrap().is_none());
}

#[tokio::test]
async fn new_cart_records_owner() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();
  let owner = Uuid::new_v4();

  let merged = upsert_cart(&s, &catalog, None, Some(owner), lines(&[("var_6", 1)]))
    .await
    .unwrap();
  assert_eq!(merged.cart.owner_id, Some(owner));
}

#[tokio::test]
async fn snapshots_ignore_later_catalog_changes() {
  let s = store().await;
  let mut catalog = StaticCatalog::seeded();

  let merged = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 2)]))
    .await
    .unwrap();
  let id = merged.cart.cart_id;

  assert!(catalog.set_price("var_1", 9999));

  let fetched = s.get_cart(id).await.unwrap().unwrap();
  assert_eq!(fetched.lines[0].variant.price, 2000);
  assert_eq!(fetched.total_amount(), 4000);

  // A fresh merge re-snapshots at the new price.
  let remerged = upsert_cart(&s, &catalog, Some(id), None, fetched.line_requests())
    .await
    .unwrap();
  assert_eq!(remerged.cart.lines[0].variant.price, 9999);
}

#[tokio::test]
async fn snapshot_carries_representative_image() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let merged = upsert_cart(&s, &catalog, None, None, lines(&[("var_4", 1), ("var_6", 1)]))
    .await
    .unwrap();
  let fetched = s.get_cart(merged.cart.cart_id).await.unwrap().unwrap();
  assert!(fetched.lines[0].variant.image.is_some());
  assert_eq!(fetched.lines[0].variant.product.slug, "basic-tee");
  assert_eq!(fetched.lines[1].variant.product.slug, "ceramic-mug");
}

#[tokio::test]
async fn get_cart_without_id_is_none() {
  let s = store().await;
  assert!(get_cart(&s, None).await.unwrap().is_none());
  assert!(get_cart(&s, Some(Uuid::new_v4())).await.unwrap().is_none());
}

#[tokio::test]
async fn add_accumulates_onto_existing_line() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let first = add_to_cart(&s, &catalog, None, None, "var_1", 1).await.unwrap();
  assert!(first.created);
  let id = first.cart.cart_id;

  add_to_cart(&s, &catalog, Some(id), None, "var_6", 1).await.unwrap();
  let merged = add_to_cart(&s, &catalog, Some(id), None, "var_1", 2).await.unwrap();

  assert!(!merged.created);
  assert_eq!(merged.cart.lines.len(), 2);
  assert_eq!(merged.cart.lines[0].variant.variant_id, "var_1");
  assert_eq!(merged.cart.lines[0].quantity, 3);
  assert_eq!(merged.cart.item_count(), 4);
}

#[tokio::test]
async fn remove_and_set_quantity() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let first = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 1), ("var_6", 2)]))
    .await
    .unwrap();
  let id = first.cart.cart_id;

  let set = set_cart_quantity(&s, &catalog, id, "var_6", 5).await.unwrap();
  assert_eq!(set.cart.lines[1].quantity, 5);

  let removed = remove_from_cart(&s, &catalog, id, "var_1").await.unwrap();
  assert_eq!(removed.cart.lines.len(), 1);
  assert_eq!(removed.cart.lines[0].variant.variant_id, "var_6");

  let cleared = set_cart_quantity(&s, &catalog, id, "var_6", 0).await.unwrap();
  assert!(cleared.cart.lines.is_empty());
}

#[tokio::test]
async fn edits_on_missing_cart_are_not_found() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();
  let missing = Uuid::new_v4();

  let err = remove_from_cart(&s, &catalog, missing, "var_1").await.unwrap_err();
  assert!(matches!(err, Error::CartNotFound(id) if id == missing));

  let err = set_cart_quantity(&s, &catalog, missing, "var_1", 2).await.unwrap_err();
  assert!(matches!(err, Error::CartNotFound(_)));
}

#[tokio::test]
async fn stale_revision_is_rejected() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let first = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 1)]))
    .await
    .unwrap();
  let id = first.cart.cart_id;
  upsert_cart(&s, &catalog, Some(id), None, lines(&[("var_1", 2)]))
    .await
    .unwrap();

  let outcome = s
    .replace_cart_lines(CartWrite {
      cart_id:           Some(id),
      owner_id:          None,
      expected_revision: Some(first.cart.revision),
      lines:             Vec::new(),
    })
    .await
    .unwrap();
  assert!(matches!(outcome, CartReplace::Stale));

  let fetched = s.get_cart(id).await.unwrap().unwrap();
  assert_eq!(fetched.lines[0].quantity, 2);
}

#[tokio::test]
async fn concurrent_upserts_leave_one_complete_line_set() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let first = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 1)]))
    .await
    .unwrap();
  let id = first.cart.cart_id;

  let a = lines(&[("var_6", 1), ("var_7", 1)]);
  let b = lines(&[("var_2", 4)]);
  let (ra, rb) = tokio::join!(
    upsert_cart(&s, &catalog, Some(id), None, a),
    upsert_cart(&s, &catalog, Some(id), None, b),
  );
  ra.unwrap();
  rb.unwrap();

  let fetched = s.get_cart(id).await.unwrap().unwrap();
  let ids: Vec<_> = fetched
    .lines
    .iter()
    .map(|l| l.variant.variant_id.as_str())
    .collect();
  assert!(ids == ["var_6", "var_7"] || ids == ["var_2"], "interleaved lines: {ids:?}");
}

#[tokio::test]
async fn oversized_total_is_rejected_before_writing() {
  let s = store().await;
  let gold = |id: &str| Variant {
    variant_id: id.into(),
    name:       id.into(),
    price:      3_000_000_000,
    images:     Vec::new(),
  };
  let catalog = StaticCatalog::new(vec![Product {
    product_id:  "prod_gold".into(),
    slug:        "gold-bar".into(),
    name:        "Gold Bar".into(),
    summary:     String::new(),
    description: String::new(),
    images:      Vec::new(),
    variants:    vec![gold("var_gold"), gold("var_gold_2")],
  }]);

  let first = upsert_cart(&s, &catalog, None, None, lines(&[("var_gold", 1)]))
    .await
    .unwrap();
  let id = first.cart.cart_id;

  let err = upsert_cart(&s, &catalog, Some(id), None, lines(&[("var_gold", i64::from(u32::MAX))]))
    .await
    .unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error") };
  assert!(errors.get("quantity").is_some());
  assert_eq!(s.get_cart(id).await.unwrap().unwrap(), first.cart);

  // Each line fits but their sum does not.
  let err = upsert_cart(
    &s,
    &catalog,
    None,
    None,
    lines(&[("var_gold", 2_000_000_000), ("var_gold_2", 2_000_000_000)]),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Addresses ───────────────────────────────────────────────────────────────

fn fields(city: &str) -> AddressFields {
  AddressFields {
    name:    "Ada Lovelace".into(),
    street:  "12 St James's Square".into(),
    city:    city.into(),
    state:   "London".into(),
    zip:     "SW1Y 4JH".into(),
    country: "GB".into(),
  }
}

async fn defaults(s: &SqliteStore, owner: Uuid) -> Vec<Uuid> {
  address::list_addresses(s, owner)
    .await
    .unwrap()
    .into_iter()
    .filter(|a| a.is_default)
    .map(|a| a.address_id)
    .collect()
}

#[tokio::test]
async fn new_default_replaces_previous() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let a = address::add_address(&s, owner, fields("A"), true).await.unwrap();
  assert_eq!(defaults(&s, owner).await, [a.address_id]);

  let b = address::add_address(&s, owner, fields("B"), true).await.unwrap();
  assert_eq!(defaults(&s, owner).await, [b.address_id]);

  let all = address::list_addresses(&s, owner).await.unwrap();
  assert_eq!(all.len(), 2);
  // Newest first.
  assert_eq!(all[0].address_id, b.address_id);
}

#[tokio::test]
async fn non_default_add_keeps_existing_default() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let a = address::add_address(&s, owner, fields("A"), true).await.unwrap();
  address::add_address(&s, owner, fields("B"), false).await.unwrap();
  assert_eq!(defaults(&s, owner).await, [a.address_id]);
}

#[tokio::test]
async fn invalid_address_is_not_saved() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let err = address::add_address(&s, owner, fields("  "), true).await.unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error") };
  assert!(errors.get("city").is_some());
  assert!(address::list_addresses(&s, owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn set_default_moves_flag() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let a = address::add_address(&s, owner, fields("A"), true).await.unwrap();
  let b = address::add_address(&s, owner, fields("B"), false).await.unwrap();

  address::set_default_address(&s, owner, b.address_id).await.unwrap();
  assert_eq!(defaults(&s, owner).await, [b.address_id]);

  address::set_default_address(&s, owner, a.address_id).await.unwrap();
  assert_eq!(defaults(&s, owner).await, [a.address_id]);
}

#[tokio::test]
async fn set_default_on_foreign_address_changes_nothing() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let other = Uuid::new_v4();

  let mine = address::add_address(&s, owner, fields("A"), true).await.unwrap();
  let theirs = address::add_address(&s, other, fields("B"), true).await.unwrap();

  let err = address::set_default_address(&s, owner, theirs.address_id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AddressNotFound(_)));

  assert_eq!(defaults(&s, owner).await, [mine.address_id]);
  assert_eq!(defaults(&s, other).await, [theirs.address_id]);
}

#[tokio::test]
async fn delete_is_scoped_to_owner() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let other = Uuid::new_v4();

  let theirs = address::add_address(&s, other, fields("B"), false).await.unwrap();

  let err = address::delete_address(&s, owner, theirs.address_id).await.unwrap_err();
  assert!(matches!(err, Error::AddressNotFound(_)));
  assert_eq!(address::list_addresses(&s, other).await.unwrap().len(), 1);

  address::delete_address(&s, other, theirs.address_id).await.unwrap();
  assert!(address::list_addresses(&s, other).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_default_leaves_no_default() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let a = address::add_address(&s, owner, fields("A"), true).await.unwrap();
  address::add_address(&s, owner, fields("B"), false).await.unwrap();

  address::delete_address(&s, owner, a.address_id).await.unwrap();
  assert!(defaults(&s, owner).await.is_empty());
}

#[tokio::test]
async fn at_most_one_default_through_any_sequence() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let mut ids = Vec::new();
  for (i, make_default) in [true, false, true, true, false].into_iter().enumerate() {
    let a = address::add_address(&s, owner, fields(&format!("C{i}")), make_default)
      .await
      .unwrap();
    ids.push(a.address_id);
    assert!(defaults(&s, owner).await.len() <= 1);
  }
  for id in [ids[1], ids[4], ids[0]] {
    address::set_default_address(&s, owner, id).await.unwrap();
    assert_eq!(defaults(&s, owner).await, [id]);
  }
  let _ = address::set_default_address(&s, owner, Uuid::new_v4()).await;
  assert_eq!(defaults(&s, owner).await, [ids[0]]);
}

#[tokio::test]
async fn concurrent_set_default_leaves_one_default() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let a = address::add_address(&s, owner, fields("A"), false).await.unwrap();
  let b = address::add_address(&s, owner, fields("B"), false).await.unwrap();

  for _ in 0..10 {
    let (ra, rb) = tokio::join!(
      address::set_default_address(&s, owner, a.address_id),
      address::set_default_address(&s, owner, b.address_id),
    );
    ra.unwrap();
    rb.unwrap();
    let current = defaults(&s, owner).await;
    assert_eq!(current.len(), 1, "defaults: {current:?}");
  }
}

#[tokio::test]
async fn concurrent_default_adds_leave_one_default() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let (ra, rb) = tokio::join!(
    address::add_address(&s, owner, fields("A"), true),
    address::add_address(&s, owner, fields("B"), true),
  );
  let (a, b) = (ra.unwrap(), rb.unwrap());

  let current = defaults(&s, owner).await;
  assert_eq!(current.len(), 1);
  assert!(current[0] == a.address_id || current[0] == b.address_id);
  assert_eq!(address::list_addresses(&s, owner).await.unwrap().len(), 2);
}

// ─── Orders ──────────────────────────────────────────────────────────────────

fn completion(session: &str, cart_id: &str) -> PaymentCompletion {
  PaymentCompletion {
    payment_session_ref: session.into(),
    cart_id:             cart_id.into(),
    owner_ref:           None,
    amount_total:        6500,
    currency:            Some("eur".into()),
    shipping:            ShippingSnapshot {
      name: Some("Ada Lovelace".into()),
      city: Some("London".into()),
      ..Default::default()
    },
  }
}

#[tokio::test]
async fn payment_creates_order_from_cart_snapshot() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();
  let owner = Uuid::new_v4();

  let cart = upsert_cart(&s, &catalog, None, Some(owner), lines(&[("var_1", 2), ("var_6", 1)]))
    .await
    .unwrap()
    .cart;

  let mut event = completion("sess_1", &cart.cart_id.to_string());
  event.owner_ref = Some(owner);
  let outcome = materialize_order(&s, event).await.unwrap();
  let Materialized::Created(order) = outcome else { panic!("expected a created order") };

  assert_eq!(order.payment_session_ref, "sess_1");
  assert_eq!(order.amount_total, 6500);
  assert_eq!(order.currency, "eur");
  assert_eq!(order.owner_id, Some(owner));
  assert_eq!(order.shipping.city.as_deref(), Some("London"));
  assert_eq!(order.lines.len(), 2);
  assert_eq!(order.lines[0].variant_id, "var_1");
  assert_eq!(order.lines[0].price, 2000);
  assert_eq!(order.lines[0].quantity, 2);
  assert_eq!(order.lines[1].name, "Ceramic Mug");

  let fetched = s.get_order(order.order_id).await.unwrap().unwrap();
  assert_eq!(fetched, order);
  assert_eq!(s.list_orders(owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn redelivered_payment_returns_existing_order() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let cart = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 2), ("var_6", 1)]))
    .await
    .unwrap()
    .cart;
  let event = completion("sess_1", &cart.cart_id.to_string());

  let first = materialize_order(&s, event.clone()).await.unwrap();
  let second = materialize_order(&s, event).await.unwrap();
  assert!(matches!(first, Materialized::Created(_)));
  let Materialized::Existing(existing) = second else { panic!("expected the existing order") };

  let created = first.order().unwrap();
  assert_eq!(existing.order_id, created.order_id);
  assert_eq!(existing.lines.len(), 2);
}

#[tokio::test]
async fn concurrent_deliveries_create_one_order() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let cart = upsert_cart(&s, &catalog, None, None, lines(&[("var_7", 1)]))
    .await
    .unwrap()
    .cart;
  let event = completion("sess_race", &cart.cart_id.to_string());

  let (a, b) = tokio::join!(
    materialize_order(&s, event.clone()),
    materialize_order(&s, event.clone()),
  );
  let (a, b) = (a.unwrap(), b.unwrap());
  assert_eq!(a.order().unwrap().order_id, b.order().unwrap().order_id);

  let created = [&a, &b]
    .iter()
    .filter(|m| matches!(m, Materialized::Created(_)))
    .count();
  assert_eq!(created, 1);
}

#[tokio::test]
async fn empty_cart_is_skipped() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let cart = upsert_cart(&s, &catalog, None, None, Vec::new()).await.unwrap().cart;
  let outcome = materialize_order(&s, completion("sess_2", &cart.cart_id.to_string()))
    .await
    .unwrap();
  assert!(matches!(outcome, Materialized::Skipped(SkipReason::CartEmpty)));
  assert!(s.get_order_by_payment_session("sess_2").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_or_malformed_cart_is_skipped() {
  let s = store().await;

  let outcome = materialize_order(&s, completion("sess_3", &Uuid::new_v4().to_string()))
    .await
    .unwrap();
  assert!(matches!(outcome, Materialized::Skipped(SkipReason::CartNotFound)));

  let outcome = materialize_order(&s, completion("sess_4", "not-a-uuid")).await.unwrap();
  assert!(matches!(outcome, Materialized::Skipped(SkipReason::CartNotFound)));
}

#[tokio::test]
async fn blank_session_ref_is_skipped() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();

  let cart = upsert_cart(&s, &catalog, None, None, lines(&[("var_1", 1)]))
    .await
    .unwrap()
    .cart;
  let outcome = materialize_order(&s, completion("  ", &cart.cart_id.to_string()))
    .await
    .unwrap();
  assert!(matches!(outcome, Materialized::Skipped(SkipReason::MissingSessionRef)));
  assert!(s.get_order_by_payment_session("  ").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_insert_reports_existing_order() {
  let s = store().await;
  let new_order = NewOrder {
    owner_id:            None,
    payment_session_ref: "sess_dup".into(),
    amount_total:        1500,
    currency:            "usd".into(),
    shipping:            ShippingSnapshot::default(),
    lines:               vec![OrderLine {
      product_id:   "prod_2".into(),
      variant_id:   "var_6".into(),
      name:         "Ceramic Mug".into(),
      variant_name: "Standard".into(),
      price:        1500,
      quantity:     1,
      image:        None,
    }],
  };

  let OrderInsert::Created(first) = s.insert_order(new_order.clone()).await.unwrap() else {
    panic!("expected first insert to create");
  };
  let OrderInsert::Duplicate(second) = s.insert_order(new_order).await.unwrap() else {
    panic!("expected second insert to be a duplicate");
  };
  assert_eq!(first.order_id, second.order_id);
  assert_eq!(second.lines.len(), 1);
}

#[tokio::test]
async fn orders_are_listed_per_owner_newest_first() {
  let s = store().await;
  let catalog = StaticCatalog::seeded();
  let owner = Uuid::new_v4();

  for session in ["sess_a", "sess_b"] {
    let cart = upsert_cart(&s, &catalog, None, Some(owner), lines(&[("var_6", 1)]))
      .await
      .unwrap()
      .cart;
    let mut event = completion(session, &cart.cart_id.to_string());
    event.owner_ref = Some(owner);
    materialize_order(&s, event).await.unwrap();
  }

  let orders = s.list_orders(owner).await.unwrap();
  assert_eq!(orders.len(), 2);
  assert_eq!(orders[0].payment_session_ref, "sess_b");
  assert!(s.list_orders(Uuid::new_v4()).await.unwrap().is_empty());
}

// ─── Owners ──────────────────────────────────────────────────────────────────

/// Reversible stand-in so tests do not pay for a real KDF.
struct PlainHasher;

impl PasswordHasher for PlainHasher {
  fn hash(&self, password: &str) -> shelf_core::Result<String> { Ok(format!("plain:{password}")) }

  fn verify(&self, password: &str, hash: &str) -> shelf_core::Result<bool> {
    Ok(hash.strip_prefix("plain:") == Some(password))
  }
}

fn change(current: &str, new: &str) -> PasswordChange {
  PasswordChange {
    current_password: current.into(),
    new_password:     new.into(),
    confirm_password: new.into(),
  }
}

#[tokio::test]
async fn change_password_replaces_hash() {
  let s = store().await;
  let user = register_owner(&s, &PlainHasher, Some("hunter22")).await.unwrap();
  assert!(user.has_password());

  change_password(&s, &PlainHasher, user.user_id, change("hunter22", "correct horse"))
    .await
    .unwrap();

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.password_hash.as_deref(), Some("plain:correct horse"));
}

#[tokio::test]
async fn change_password_rejects_wrong_current() {
  let s = store().await;
  let user = register_owner(&s, &PlainHasher, Some("hunter22")).await.unwrap();

  let err = change_password(&s, &PlainHasher, user.user_id, change("wrong!", "correct horse"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::IncorrectPassword));

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.password_hash.as_deref(), Some("plain:hunter22"));
}

#[tokio::test]
async fn change_password_rejects_owner_without_password() {
  let s = store().await;
  let user = register_owner(&s, &PlainHasher, None).await.unwrap();
  assert!(!user.has_password());

  let err = change_password(&s, &PlainHasher, user.user_id, change("anything", "correct horse"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoPassword(_)));
}

#[tokio::test]
async fn change_password_for_unknown_owner() {
  let s = store().await;
  let err = change_password(&s, &PlainHasher, Uuid::new_v4(), change("hunter22", "correct horse"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::OwnerNotFound(_)));
}

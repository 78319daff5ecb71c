//! SQL schema for the Shelf SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    password_hash TEXT,            -- NULL for external sign-in only
    created_at    TEXT NOT NULL
);

-- Carts are never deleted here. `revision` is bumped on every merge.
CREATE TABLE IF NOT EXISTS carts (
    cart_id    TEXT PRIMARY KEY,
    owner_id   TEXT,               -- NULL for guest carts
    revision   INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Snapshot of catalog data at merge time; replaced wholesale on every merge.
-- There is no total column: totals are always derived from these rows.
CREATE TABLE IF NOT EXISTS cart_lines (
    line_id      TEXT PRIMARY KEY,
    cart_id      TEXT NOT NULL REFERENCES carts(cart_id),
    position     INTEGER NOT NULL,
    variant_id   TEXT NOT NULL,
    variant_name TEXT NOT NULL,
    price        INTEGER NOT NULL, -- minor currency units
    product_id   TEXT NOT NULL,
    product_slug TEXT NOT NULL,
    product_name TEXT NOT NULL,
    image        TEXT,
    quantity     INTEGER NOT NULL CHECK (quantity > 0),
    UNIQUE (cart_id, variant_id)
);

CREATE TABLE IF NOT EXISTS addresses (
    address_id TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL,
    name       TEXT NOT NULL,
    street     TEXT NOT NULL,
    city       TEXT NOT NULL,
    state      TEXT NOT NULL,
    zip        TEXT NOT NULL,
    country    TEXT NOT NULL,
    is_default INTEGER NOT NULL DEFAULT 0 CHECK (is_default IN (0, 1)),
    created_at TEXT NOT NULL
);

-- Backstop for the single-default rule.
CREATE UNIQUE INDEX IF NOT EXISTS addresses_one_default_idx
    ON addresses(owner_id) WHERE is_default = 1;

CREATE TABLE IF NOT EXISTS orders (
    order_id             TEXT PRIMARY KEY,
    owner_id             TEXT,
    payment_session_ref  TEXT NOT NULL UNIQUE, -- idempotency key
    amount_total         INTEGER NOT NULL,
    currency             TEXT NOT NULL,
    status               TEXT NOT NULL,         -- 'paid'
    shipping_name        TEXT,
    shipping_line1       TEXT,
    shipping_line2       TEXT,
    shipping_city        TEXT,
    shipping_state       TEXT,
    shipping_postal_code TEXT,
    shipping_country     TEXT,
    created_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS order_lines (
    order_id     TEXT NOT NULL REFERENCES orders(order_id),
    position     INTEGER NOT NULL,
    product_id   TEXT NOT NULL,
    variant_id   TEXT NOT NULL,
    name         TEXT NOT NULL,
    variant_name TEXT NOT NULL,
    price        INTEGER NOT NULL,
    quantity     INTEGER NOT NULL CHECK (quantity > 0),
    image        TEXT,
    PRIMARY KEY (order_id, position)
);

CREATE INDEX IF NOT EXISTS cart_lines_cart_idx ON cart_lines(cart_id);
CREATE INDEX IF NOT EXISTS addresses_owner_idx ON addresses(owner_id);
CREATE INDEX IF NOT EXISTS orders_owner_idx    ON orders(owner_id);

PRAGMA user_version = 1;
";

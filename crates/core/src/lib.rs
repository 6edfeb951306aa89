//! Kirana Core - catalog, cart and checkout domain.
//!
//! This crate holds everything the cart widget knows about products and
//! orders, independent of how it is hosted:
//! - `storefront` - HTMX web surface embedding the widget in a page
//! - `cli` - Terminal surface sharing the same cart slot
//!
//! # Architecture
//!
//! The core crate contains only types, stores and ports - no network, no
//! file system, no UI framework. Hosts plug in adapters for the outside
//! world through these traits:
//!
//! - [`KeyValueStore`] - durable slot the cart is persisted to
//! - [`CatalogSource`] - remote product collection
//! - [`CheckoutPrompt`], [`ReceiptWriter`], [`ReceiptSink`] - checkout I/O
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, products and category filters
//! - [`catalog`] - Read-only product catalog
//! - [`cart`] - Persistent cart lines and their mutators
//! - [`storage`] - Key-value storage port and in-memory adapter
//! - [`render`] - View-model projection of catalog + cart
//! - [`checkout`] - Checkout state machine and receipt model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod render;
pub mod storage;
pub mod types;

pub use cart::{CART_STORAGE_KEY, CartError, CartLine, CartStore};
pub use catalog::{CatalogSource, CatalogStore};
pub use checkout::{
    AbortReason, Checkout, CheckoutError, CheckoutField, CheckoutOutcome, CheckoutPrompt,
    CheckoutState, PositionedText, Receipt, ReceiptDocument, ReceiptError, ReceiptLine,
    ReceiptSink, ReceiptWriter,
};
pub use render::{
    CartBadgeView, CartLineView, CartPanelView, Cooldown, NoCooldown, ProductCardView,
    StorefrontView,
};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use types::*;

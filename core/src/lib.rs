// darkroom/src/lib.rs

//! Darkroom: cart, checkout and order-review core for a photography studio storefront.
//!
//! The crate models the shop's four tables (`products`, `cart_items`, `orders`,
//! `order_items`) as typed records behind the [`ShopStore`] seam and builds three flows on
//! top of them:
//!  - the [`CartStore`], one user's cart lines kept in step with the store;
//!  - the [`CheckoutOrchestrator`], a named-step [`Pipeline`] turning a cart into a pending
//!    order and its items;
//!  - the order review ([`load_review`]), which reloads an order and re-derives its totals.
//!
//! Session state is explicit: a [`ShopSession`] carries the identity and cart and is passed
//! by reference into checkout. A [`SessionRegistry`] owns the live sessions.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod models;
pub mod payment;
pub mod pipeline;
pub mod pricing;
pub mod review;
pub mod session;
pub mod store;

pub use crate::cart::CartStore;
pub use crate::catalog::Catalog;
pub use crate::checkout::{CheckoutConfig, CheckoutOrchestrator, CheckoutReceipt};
pub use crate::error::{PipelineError, ShopError, ShopResult, StoreError};
pub use crate::payment::{PaymentAction, PaymentGateway, PaymentOutcome, PendingGateway};
pub use crate::pipeline::{Pipeline, PipelineControl, PipelineResult, StepContext};
pub use crate::pricing::{format_cents, OrderSummary};
pub use crate::review::{load_review, OrderReview, ReviewState};
pub use crate::session::{SessionLimits, SessionRegistry, ShopSession};
pub use crate::store::{MemoryStore, ShopStore, StoreOp};

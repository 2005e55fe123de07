// darkroom/src/models/mod.rs

//! Typed records for the four shop tables plus the caller's identity.
//!
//! Constructors validate their input; table stores build records only through them.

pub mod cart_item;
pub mod identity;
pub mod order;
pub mod order_item;
pub mod product;

pub use cart_item::{CartItem, ProductSnapshot};
pub use identity::Identity;
pub use order::{NewOrder, Order, OrderStatus};
pub use order_item::{NewOrderItem, OrderItem, OrderLine};
pub use product::Product;

//! Domain models for the ordering platform.
//!
//! These are validated domain objects. Database row types live next to the
//! queries in [`crate::db`] and convert into these.

pub mod message;
pub mod notification;
pub mod order;
pub mod product;
pub mod user;

pub use message::{Message, NewMessage, Participant};
pub use notification::{NewNotification, Notification};
pub use order::{NewOrder, Order, OrderFilter};
pub use product::{NewProduct, Product, ProductFilter, ProductUpdate};
pub use user::{NewUser, User};

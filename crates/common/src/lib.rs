//! Shared identifiers and value types used across the workspace.

pub mod status;
pub mod types;
pub mod variant;

pub use status::{OrderStatus, ParseStatusError};
pub use types::{OrderId, ProductId, RequesterId};
pub use variant::{ParseVariantError, Variant};

//! Order placement for the perfume distribution service.
//!
//! Placing an order is one logical transaction over two stores:
//! 1. Validate every cart line against available stock
//! 2. Deduct stock line by line, recording each deduction
//! 3. Persist the order
//!
//! If step 2 or 3 fails, the recorded deductions are added back in reverse
//! order and no order exists. Cancelling a pending order is the inverse: stock
//! is restored and the order is marked cancelled.

pub mod cart;
pub mod error;
pub mod reservation;
pub mod workflow;

pub use cart::CartLine;
pub use error::{PlacementError, Shortage};
pub use reservation::{Reservation, ReservationLog};
pub use workflow::OrderPlacementWorkflow;

//! Domain layer: validated value objects, the payment aggregate and the ports
//! the application layer drives.

pub mod amount;
pub mod card;
pub mod gateway;
pub mod payment;
pub mod ports;
pub mod request;
pub mod submission;
pub mod validation;

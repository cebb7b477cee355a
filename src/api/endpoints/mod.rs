//! API endpoint handlers. Each module maps to one resource.

pub mod drugs;
pub mod health;
pub mod knowledge;
pub mod safety;

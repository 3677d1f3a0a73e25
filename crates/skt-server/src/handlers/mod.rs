//! Route handlers, one module per resource.

pub mod audit;
pub mod beneficiaries;
pub mod evidence;
pub mod exports;
pub mod health;
pub mod impact;
pub mod programmes;

//! Row-locked counters shared by every order: product stock, flash-sale
//! quotas and voucher usage.
//!
//! Functions here take any [`sea_orm::ConnectionTrait`] but are meant to run
//! inside the caller's transaction; the locks they take are held until that
//! transaction ends.

pub mod inventory;
pub mod voucher;

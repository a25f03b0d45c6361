//! Access guards
//!
//! - AccessGuard: gate a protected region (render, hide, or fall back)
//! - RouteGuard / RouteTable: navigate away from denied routes without loops
//!
//! Guards hold no authorization logic of their own; every decision is a
//! call into `rbac::satisfies`.

mod access;
mod route;

pub use access::{AccessGuard, GuardDecision, Rendered};
pub use route::{Navigation, RouteGuard, RouteTable};

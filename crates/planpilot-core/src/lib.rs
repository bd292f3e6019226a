//! # PlanPilot Core
//!
//! Entitlement and throttling domain of the PlanPilot backend.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the plan catalog, the entitlement resolver, and the ports adapters implement.

pub mod catalog;
pub mod clock;
pub mod domain;
pub mod entitlement;
pub mod error;
pub mod ports;

pub use catalog::PlanCatalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entitlement::EntitlementResolver;
pub use error::{CatalogError, DomainError, RepoError};

//! Domain layer - pure rate limiting logic.
//!
//! This layer contains the core types with no dependencies on storage,
//! configuration files, or the host framework:
//! - Item types and actor identities
//! - Per-item-type policies and the policy table
//! - Usage records and decisions
//! - Capabilities checked by the host

pub mod actor;
pub mod capability;
pub mod decision;
pub mod item;
pub mod policy;
pub mod record;

//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Cooldown tracker (decision making and bookkeeping)
//! - Window cache (in-memory window starts)
//! - Expiry sweeper (periodic cache cleanup)
//! - Metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod cache;
pub mod metrics;
pub mod ports;
pub mod sweeper;
pub mod tracker;

//! # placement-limiter
//!
//! Per-actor, per-item-type rate limiting for placement events.
//!
//! Each restricted item type has a policy: at most `limit` uses per window of
//! `period` seconds. A window starts with an actor's first use of the item
//! type and lasts for the configured period; once the limit is used up,
//! further attempts are denied until the window has elapsed. Counts are
//! persisted so limits survive restarts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use placement_limiter::{ActorId, Grants, ItemType, PlacementLimiter, UsageAttempt};
//!
//! // Policies and the data file location come from a YAML file.
//! let limiter = PlacementLimiter::from_config_file("plugins/limiter/config.yml")
//!     .expect("valid configuration");
//!
//! // From the host's placement event handler:
//! let attempt = UsageAttempt::new(
//!     ActorId::random(),
//!     ItemType::parse("dirt").unwrap(),
//!     1_700_000_000_000,
//! );
//! let decision = limiter.notify_attempt(&attempt, &Grants::none());
//! if let Some(notice) = decision.notice(&attempt.item) {
//!     // Cancel the placement and tell the player why.
//!     println!("{notice}");
//! }
//! ```
//!
//! ## Configuration
//!
//! ```yaml
//! blacklist:
//!   DIRT:
//!     limit: 3
//!     period: 60
//! settings:
//!   cleanup-interval: 60
//!   data-file: playerdata.yml
//! ```
//!
//! Item types without a `blacklist` entry are unrestricted. Entries with an
//! unrecognized item name or invalid numbers are skipped with a warning.
//! The `limiterreload` command re-reads the file; it requires the
//! `limiter.reload` capability. Actors holding `limiter.bypass` are never
//! limited.
//!
//! ## Expiry
//!
//! Window starts are cached in memory. The cache is swept on a fixed interval,
//! either by the host calling [`PlacementLimiter::tick`] from its own
//! scheduler or by [`PlacementLimiter::start_sweeper`] on a tokio runtime.
//! Sweeping only bounds memory; elapsed windows are never enforced whether or
//! not they have been swept.
//!
//! ## Persistence
//!
//! Every allowed attempt is written through to the usage store and flushed.
//! A failed flush is logged and the decision stands. This is sized for
//! interactive placement rates; machine-rate events would need batching.

// Domain layer - pure limiting logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    actor::ActorId,
    capability::{Capability, Grants, Permissions},
    decision::{Decision, DenyNotice},
    item::{ItemType, ItemTypeError},
    policy::{ItemPolicy, PolicyError, PolicyTable},
    record::{Timestamp, UsageKey, UsageRecord},
};

pub use application::{
    cache::WindowCache,
    metrics::{Metrics, MetricsSnapshot},
    ports::{AnyItem, Clock, ConfigError, ItemCatalog, PolicySource, StoreError, UsageStore},
    sweeper::{ExpirySweeper, SweeperConfig, SweeperConfigError},
    tracker::CooldownTracker,
};

#[cfg(feature = "async")]
pub use application::sweeper::{ShutdownError, SweeperHandle};

pub use infrastructure::{
    clock::SystemClock,
    config::{LimiterConfig, PolicyEntryError, YamlConfigFile},
    host::{
        BuildError, PlacementLimiter, PlacementLimiterBuilder, ReloadOutcome, UsageAttempt,
        RELOAD_COMMAND,
    },
    store::MemoryStore,
    yaml_store::YamlFileStore,
};

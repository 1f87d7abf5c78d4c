//! Host integration.
//!
//! Provides [`PlacementLimiter`], the surface a host framework calls into:
//! it forwards usage attempts to the tracker, drives expiry, and handles the
//! administrative reload command.

use crate::application::{
    metrics::Metrics,
    ports::{AnyItem, Clock, ConfigError, ItemCatalog, PolicySource, StoreError, UsageStore},
    sweeper::{ExpirySweeper, SweeperConfig, SweeperConfigError},
    tracker::CooldownTracker,
};
use crate::domain::{
    actor::ActorId,
    capability::{Capability, Permissions},
    decision::Decision,
    item::ItemType,
    policy::PolicyTable,
    record::Timestamp,
};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::YamlConfigFile;
use crate::infrastructure::yaml_store::YamlFileStore;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use crate::application::sweeper::SweeperHandle;

/// Name of the administrative reload command.
pub const RELOAD_COMMAND: &str = "limiterreload";

/// Error returned when building a PlacementLimiter fails.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The initial policy configuration could not be loaded
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    /// The usage data could not be opened
    #[error("failed to open usage data: {0}")]
    Store(#[from] StoreError),
    /// Sweeper configuration validation failed
    #[error("sweeper configuration error: {0}")]
    Sweeper(#[from] SweeperConfigError),
}

/// One observed usage attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageAttempt {
    /// Who is using the item
    pub actor: ActorId,
    /// What is being used
    pub item: ItemType,
    /// When, in milliseconds since the Unix epoch
    pub timestamp: Timestamp,
}

impl UsageAttempt {
    /// Create an attempt.
    pub fn new(actor: ActorId, item: ItemType, timestamp: Timestamp) -> Self {
        Self {
            actor,
            item,
            timestamp,
        }
    }
}

/// Result of the administrative reload command.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// The new policy table is active
    Reloaded {
        /// Number of restricted item types
        policies: usize,
    },
    /// The sender lacks the reload capability
    PermissionDenied,
    /// The configuration could not be read; the previous table stays active
    Failed(ConfigError),
}

impl ReloadOutcome {
    /// Check if the reload took effect.
    pub fn is_success(&self) -> bool {
        matches!(self, ReloadOutcome::Reloaded { .. })
    }

    /// Plain-text reply for the command sender.
    pub fn message(&self) -> String {
        match self {
            ReloadOutcome::Reloaded { .. } => "Configuration reloaded successfully.".to_string(),
            ReloadOutcome::PermissionDenied => {
                "You don't have permission to reload the configuration.".to_string()
            }
            ReloadOutcome::Failed(error) => format!("Failed to reload configuration: {error}"),
        }
    }
}

impl fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Builder for constructing a `PlacementLimiter`.
pub struct PlacementLimiterBuilder<S>
where
    S: UsageStore,
{
    source: Arc<dyn PolicySource>,
    policies: Option<PolicyTable>,
    store: S,
    clock: Option<Arc<dyn Clock>>,
    sweep_interval: Duration,
    metrics: Option<Metrics>,
}

impl<S> PlacementLimiterBuilder<S>
where
    S: UsageStore,
{
    /// Set a custom clock (default: SystemClock).
    ///
    /// The clock stamps startup window restoration and expiry sweeps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set how often cached windows are swept (default: 60 seconds).
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Start from an already loaded policy table instead of loading one from
    /// the source. The source is still read on reload.
    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = Some(policies);
        self
    }

    /// Report into existing metrics instead of fresh ones.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the limiter.
    ///
    /// Loads the policy table from the source, unless one was given with
    /// [`with_policies`](Self::with_policies), and restores windows that are
    /// still live in the store.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration cannot be loaded or the
    /// sweep interval is zero.
    pub fn build(self) -> Result<PlacementLimiter<S>, BuildError> {
        let sweeper = SweeperConfig::new(self.sweep_interval)?;
        let policies = match self.policies {
            Some(policies) => policies,
            None => self.source.load()?,
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        let metrics = self.metrics.unwrap_or_default();

        let restricted = policies.len();
        let tracker = CooldownTracker::with_metrics(policies, self.store, metrics);
        let restored = tracker.restore_windows(clock.now());
        tracing::info!(restricted, restored, "placement limiter ready");

        Ok(PlacementLimiter {
            tracker: Arc::new(tracker),
            source: self.source,
            clock,
            sweeper,
        })
    }
}

/// Per-actor, per-item-type placement limiter for a host framework.
///
/// # Example
///
/// ```
/// use placement_limiter::{
///     ActorId, Grants, ItemPolicy, ItemType, MemoryStore, PlacementLimiter, PolicyTable,
///     UsageAttempt,
/// };
/// use std::time::Duration;
///
/// let dirt = ItemType::parse("DIRT").unwrap();
/// let policies = PolicyTable::new().with(
///     dirt.clone(),
///     ItemPolicy::new(3, Duration::from_secs(60)).unwrap(),
/// );
/// let limiter = PlacementLimiter::builder(policies, MemoryStore::new())
///     .build()
///     .unwrap();
///
/// let player = Grants::none();
/// let actor = ActorId::random();
/// for second in 0..3 {
///     let attempt = UsageAttempt::new(actor, dirt.clone(), second * 1_000);
///     assert!(limiter.notify_attempt(&attempt, &player).is_allow());
/// }
///
/// let denied = limiter.notify_attempt(&UsageAttempt::new(actor, dirt.clone(), 3_000), &player);
/// assert_eq!(denied.remaining_secs(), Some(57));
/// ```
pub struct PlacementLimiter<S>
where
    S: UsageStore,
{
    tracker: Arc<CooldownTracker<S>>,
    source: Arc<dyn PolicySource>,
    clock: Arc<dyn Clock>,
    sweeper: SweeperConfig,
}

impl PlacementLimiter<YamlFileStore> {
    /// Build a limiter from a YAML configuration file.
    ///
    /// Reloads re-read the same file; usage data goes to the file named by
    /// its `data-file` setting. Any well-formed item name is accepted.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        Self::from_config_file_with_catalog(path, AnyItem)
    }

    /// Build a limiter from a YAML configuration file, skipping blacklist
    /// entries for item types outside `catalog` at startup and on reload.
    pub fn from_config_file_with_catalog(
        path: impl AsRef<Path>,
        catalog: impl ItemCatalog + 'static,
    ) -> Result<Self, BuildError> {
        let source = YamlConfigFile::new(path.as_ref()).with_catalog(catalog);
        let config = source.load_config()?;
        let store = YamlFileStore::open(&config.data_file)?;

        PlacementLimiter::builder(source, store)
            .with_policies(config.policies)
            .with_sweep_interval(config.cleanup_interval)
            .build()
    }
}

impl<S> PlacementLimiter<S>
where
    S: UsageStore,
{
    /// Create a builder reading policies from `source` and keeping usage in
    /// `store`.
    pub fn builder(source: impl PolicySource + 'static, store: S) -> PlacementLimiterBuilder<S> {
        PlacementLimiterBuilder {
            source: Arc::new(source),
            policies: None,
            store,
            clock: None,
            sweep_interval: SweeperConfig::default().interval,
            metrics: None,
        }
    }

    /// Decide whether an observed usage attempt may proceed.
    ///
    /// Actors with the bypass capability are always allowed and leave no
    /// record. On deny the host must suppress the action and may show
    /// [`Decision::notice`] to the actor.
    pub fn notify_attempt(&self, attempt: &UsageAttempt, actor: &dyn Permissions) -> Decision {
        if actor.grants(Capability::Bypass) {
            self.tracker.metrics().record_bypassed();
            return Decision::Allow;
        }
        self.tracker
            .evaluate(attempt.actor, &attempt.item, attempt.timestamp)
    }

    /// Periodic maintenance: drop cached windows that have elapsed at `now`.
    pub fn tick(&self, now: Timestamp) -> usize {
        self.tracker.expire(now)
    }

    /// Re-read the policy configuration on behalf of `sender`.
    ///
    /// Requires the reload capability. If the configuration cannot be read
    /// the current policies stay in effect.
    pub fn reload_policy(&self, sender: &dyn Permissions) -> ReloadOutcome {
        if !sender.grants(Capability::Reload) {
            return ReloadOutcome::PermissionDenied;
        }

        match self.source.load() {
            Ok(policies) => {
                let count = policies.len();
                self.tracker.reload_policy(policies);
                tracing::info!(policies = count, "configuration reloaded");
                ReloadOutcome::Reloaded { policies: count }
            }
            Err(error) => {
                tracing::error!(%error, "configuration reload failed; keeping current policies");
                ReloadOutcome::Failed(error)
            }
        }
    }

    /// Dispatch an administrative command.
    ///
    /// Returns `None` if the command is not one of ours.
    pub fn handle_command(&self, command: &str, sender: &dyn Permissions) -> Option<ReloadOutcome> {
        command
            .eq_ignore_ascii_case(RELOAD_COMMAND)
            .then(|| self.reload_policy(sender))
    }

    /// Final flush before the host unloads the limiter.
    pub fn shutdown(&self) -> Result<(), StoreError> {
        self.tracker.flush()
    }

    /// An expiry sweeper reading this limiter's clock.
    pub fn sweeper(&self) -> ExpirySweeper<S> {
        ExpirySweeper::new(
            Arc::clone(&self.tracker),
            Arc::clone(&self.clock),
            self.sweeper.clone(),
        )
    }

    /// Start sweeping in a background tokio task.
    #[cfg(feature = "async")]
    pub fn start_sweeper(&self) -> SweeperHandle
    where
        S: 'static,
    {
        self.sweeper().start()
    }

    /// The underlying tracker.
    pub fn tracker(&self) -> &Arc<CooldownTracker<S>> {
        &self.tracker
    }

    /// Get the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.tracker.metrics()
    }

    /// Get the clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{capability::Grants, policy::ItemPolicy, record::UsageKey};
    use crate::infrastructure::mocks::{MockCaptureLayer, MockClock, MockPolicySource};
    use crate::infrastructure::store::MemoryStore;
    use std::collections::BTreeSet;
    use std::fs;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    fn dirt() -> ItemType {
        ItemType::parse("DIRT").unwrap()
    }

    fn dirt_policies() -> PolicyTable {
        PolicyTable::new().with(dirt(), ItemPolicy::new(3, Duration::from_secs(60)).unwrap())
    }

    fn attempt(actor: ActorId, secs: u64) -> UsageAttempt {
        UsageAttempt::new(actor, dirt(), secs * 1_000)
    }

    #[test]
    fn test_bypass_always_allowed() {
        let limiter = PlacementLimiter::builder(dirt_policies(), MemoryStore::new())
            .build()
            .unwrap();
        let actor = ActorId::random();
        let admin = Grants::none().with(Capability::Bypass);

        for _ in 0..10 {
            assert!(limiter.notify_attempt(&attempt(actor, 0), &admin).is_allow());
        }

        assert_eq!(limiter.tracker().stored_records(), 0);
        assert_eq!(limiter.metrics().attempts_bypassed(), 10);
    }

    #[test]
    fn test_notice_for_denied_attempt() {
        let limiter = PlacementLimiter::builder(dirt_policies(), MemoryStore::new())
            .build()
            .unwrap();
        let actor = ActorId::random();
        let player = Grants::none();

        for secs in 0..3 {
            limiter.notify_attempt(&attempt(actor, secs), &player);
        }
        let decision = limiter.notify_attempt(&attempt(actor, 3), &player);
        let notice = decision.notice(&dirt()).unwrap();

        assert_eq!(
            notice.to_string(),
            "You have reached the limit for placing dirts.\nYou can place them again in 57 seconds."
        );
    }

    #[test]
    fn test_reload_requires_capability() {
        let source = MockPolicySource::new(dirt_policies());
        let limiter = PlacementLimiter::builder(source.clone(), MemoryStore::new())
            .build()
            .unwrap();

        source.set(PolicyTable::new());
        let outcome = limiter.reload_policy(&Grants::none());

        assert!(matches!(outcome, ReloadOutcome::PermissionDenied));
        assert_eq!(
            outcome.message(),
            "You don't have permission to reload the configuration."
        );
        assert_eq!(limiter.tracker().policies().len(), 1);
    }

    #[test]
    fn test_reload_replaces_policies() {
        let source = MockPolicySource::new(dirt_policies());
        let limiter = PlacementLimiter::builder(source.clone(), MemoryStore::new())
            .build()
            .unwrap();
        let actor = ActorId::random();
        let player = Grants::none();

        for secs in 0..3 {
            limiter.notify_attempt(&attempt(actor, secs), &player);
        }
        assert!(limiter.notify_attempt(&attempt(actor, 3), &player).is_deny());

        source.set(PolicyTable::new());
        let outcome = limiter.reload_policy(&Grants::none().with(Capability::Reload));

        assert!(outcome.is_success());
        assert_eq!(outcome.message(), "Configuration reloaded successfully.");
        assert!(limiter.notify_attempt(&attempt(actor, 4), &player).is_allow());
        let key = UsageKey::new(actor, dirt());
        assert_eq!(limiter.tracker().record(&key).unwrap().count, 3);
    }

    #[test]
    fn test_failed_reload_keeps_policies() {
        let source = MockPolicySource::new(dirt_policies());
        let limiter = PlacementLimiter::builder(source.clone(), MemoryStore::new())
            .build()
            .unwrap();

        source.break_source();
        let outcome = limiter.reload_policy(&Grants::all());

        assert!(matches!(outcome, ReloadOutcome::Failed(_)));
        assert!(outcome.message().starts_with("Failed to reload configuration"));
        assert_eq!(limiter.tracker().policies().len(), 1);
    }

    #[test]
    fn test_handle_command() {
        let limiter = PlacementLimiter::builder(dirt_policies(), MemoryStore::new())
            .build()
            .unwrap();

        assert!(limiter.handle_command("help", &Grants::all()).is_none());
        assert!(limiter
            .handle_command("LimiterReload", &Grants::all())
            .is_some_and(|outcome| outcome.is_success()));
        assert!(matches!(
            limiter.handle_command(RELOAD_COMMAND, &Grants::none()),
            Some(ReloadOutcome::PermissionDenied)
        ));
    }

    #[test]
    fn test_with_policies_skips_initial_load() {
        let source = MockPolicySource::new(PolicyTable::new());
        source.break_source();

        let limiter = PlacementLimiter::builder(source.clone(), MemoryStore::new())
            .with_policies(dirt_policies())
            .build()
            .unwrap();
        assert_eq!(limiter.tracker().policies().len(), 1);

        source.set(PolicyTable::new());
        assert!(limiter.reload_policy(&Grants::all()).is_success());
        assert!(limiter.tracker().policies().is_empty());
    }

    #[test]
    fn test_config_file_read_once_and_checked_against_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "blacklist:\n  DIRT:\n    limit: 3\n    period: 60\n  DIRTT:\n    limit: 1\n    period: 10\n",
        )
        .unwrap();
        let catalog: BTreeSet<ItemType> = [dirt(), ItemType::parse("TNT").unwrap()]
            .into_iter()
            .collect();

        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let limiter = tracing::subscriber::with_default(subscriber, || {
            PlacementLimiter::from_config_file_with_catalog(&path, catalog).unwrap()
        });

        assert_eq!(capture.messages_at(Level::WARN), vec!["skipping blacklist entry"]);
        let policies = limiter.tracker().policies();
        assert_eq!(policies.len(), 1);
        assert!(policies.contains(&dirt()));

        fs::write(
            &path,
            "blacklist:\n  TNT:\n    limit: 1\n    period: 10\n  TNTT:\n    limit: 1\n    period: 10\n",
        )
        .unwrap();
        assert!(limiter.reload_policy(&Grants::all()).is_success());
        let policies = limiter.tracker().policies();
        assert_eq!(policies.len(), 1);
        assert!(policies.contains(&ItemType::parse("TNT").unwrap()));
    }

    #[test]
    fn test_build_rejects_zero_sweep_interval() {
        let result = PlacementLimiter::builder(dirt_policies(), MemoryStore::new())
            .with_sweep_interval(Duration::ZERO)
            .build();
        assert!(matches!(
            result,
            Err(BuildError::Sweeper(SweeperConfigError::ZeroInterval))
        ));
    }

    #[test]
    fn test_build_fails_on_unreadable_config() {
        let source = MockPolicySource::new(PolicyTable::new());
        source.break_source();

        let result = PlacementLimiter::builder(source, MemoryStore::new()).build();
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[test]
    fn test_tick_and_sweeper_share_clock() {
        let clock = MockClock::new(0);
        let limiter = PlacementLimiter::builder(dirt_policies(), MemoryStore::new())
            .with_clock(Arc::new(clock.clone()))
            .build()
            .unwrap();
        let actor = ActorId::random();

        limiter.notify_attempt(&attempt(actor, 0), &Grants::none());
        assert_eq!(limiter.tick(30_000), 0);

        clock.set(61_000);
        assert_eq!(limiter.sweeper().sweep_once(), 1);
        assert_eq!(limiter.tracker().cached_windows(), 0);
    }
}

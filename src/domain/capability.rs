//! Capabilities the host grants to actors and command senders.

use std::collections::BTreeSet;
use std::fmt;

/// A permission checked before acting on behalf of someone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Exempt from all placement limits
    Bypass,
    /// May reload the limiter configuration
    Reload,
}

impl Capability {
    /// Permission node name as used by host permission systems.
    pub fn node(&self) -> &'static str {
        match self {
            Capability::Bypass => "limiter.bypass",
            Capability::Reload => "limiter.reload",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node())
    }
}

/// Answers capability checks for an actor or command sender.
///
/// The host implements this for its own player and console types.
pub trait Permissions {
    /// Whether the capability is granted.
    fn grants(&self, capability: Capability) -> bool;
}

/// A fixed set of granted capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants(BTreeSet<Capability>);

impl Grants {
    /// Grants nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Grants every capability, like a server console.
    pub fn all() -> Self {
        Self::none().with(Capability::Bypass).with(Capability::Reload)
    }

    /// Add a capability, builder style.
    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }
}

impl Permissions for Grants {
    fn grants(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }
}

//! Item types subject to placement limits.
//!
//! Item types are identified by a canonical upper-case name such as `DIRT` or
//! `OAK_LOG`. Parsing is lenient about the spelling used in configuration
//! files and persisted data, but the canonical form is what keys all state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace prefix accepted (and stripped) when parsing item names.
const NAMESPACE: &str = "minecraft:";

/// Error returned when an item-type name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemTypeError {
    /// The name was empty after trimming.
    #[error("item type name is empty")]
    Empty,
    /// The name contained a character that cannot appear in an item type.
    #[error("invalid character {ch:?} in item type name {name:?}")]
    InvalidCharacter {
        /// The offending name as given
        name: String,
        /// The first invalid character
        ch: char,
    },
}

/// A restricted category of placeable item, e.g. a block material.
///
/// # Example
/// ```
/// use placement_limiter::ItemType;
///
/// let item: ItemType = "minecraft:oak log".parse().unwrap();
/// assert_eq!(item.as_str(), "OAK_LOG");
/// assert_eq!(item.display_name(), "oak log");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemType(String);

impl ItemType {
    /// Parse and canonicalize an item-type name.
    ///
    /// Matching is case-insensitive, an optional `minecraft:` prefix is
    /// ignored, and spaces or hyphens are treated as underscores.
    pub fn parse(name: &str) -> Result<Self, ItemTypeError> {
        let trimmed = name.trim();
        let unprefixed = match trimmed.get(..NAMESPACE.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(NAMESPACE) => &trimmed[NAMESPACE.len()..],
            _ => trimmed,
        };

        if unprefixed.is_empty() {
            return Err(ItemTypeError::Empty);
        }

        let mut canonical = String::with_capacity(unprefixed.len());
        for ch in unprefixed.chars() {
            match ch {
                ' ' | '-' | '_' => canonical.push('_'),
                c if c.is_ascii_alphanumeric() => canonical.push(c.to_ascii_uppercase()),
                c => {
                    return Err(ItemTypeError::InvalidCharacter {
                        name: name.to_string(),
                        ch: c,
                    })
                }
            }
        }

        Ok(Self(canonical))
    }

    /// The canonical name, e.g. `OAK_LOG`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-facing name used in player messages, e.g. `oak log`.
    pub fn display_name(&self) -> String {
        self.0.to_ascii_lowercase().replace('_', " ")
    }
}

impl FromStr for ItemType {
    type Err = ItemTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ItemType {
    type Error = ItemTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ItemType> for String {
    fn from(item: ItemType) -> Self {
        item.0
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(ItemType::parse("DIRT").unwrap().as_str(), "DIRT");
        assert_eq!(ItemType::parse("dirt").unwrap().as_str(), "DIRT");
        assert_eq!(ItemType::parse("  Oak_Log ").unwrap().as_str(), "OAK_LOG");
        assert_eq!(ItemType::parse("oak-log").unwrap().as_str(), "OAK_LOG");
        assert_eq!(ItemType::parse("oak log").unwrap().as_str(), "OAK_LOG");
    }

    #[test]
    fn test_namespace_prefix_is_stripped() {
        assert_eq!(ItemType::parse("minecraft:tnt").unwrap().as_str(), "TNT");
        assert_eq!(ItemType::parse("MINECRAFT:TNT").unwrap().as_str(), "TNT");
    }

    #[test]
    fn test_unrecognized_names() {
        assert_eq!(ItemType::parse(""), Err(ItemTypeError::Empty));
        assert_eq!(ItemType::parse("   "), Err(ItemTypeError::Empty));
        assert_eq!(ItemType::parse("minecraft:"), Err(ItemTypeError::Empty));
        assert!(matches!(
            ItemType::parse("lava.bucket"),
            Err(ItemTypeError::InvalidCharacter { ch: '.', .. })
        ));
        assert!(matches!(
            ItemType::parse("other:stone"),
            Err(ItemTypeError::InvalidCharacter { ch: ':', .. })
        ));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(ItemType::parse("DIRT").unwrap().display_name(), "dirt");
        assert_eq!(
            ItemType::parse("RED_SANDSTONE_SLAB").unwrap().display_name(),
            "red sandstone slab"
        );
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let item: ItemType = serde_yaml::from_str("lava_bucket").unwrap();
        assert_eq!(item.as_str(), "LAVA_BUCKET");
        assert_eq!(serde_yaml::to_string(&item).unwrap().trim(), "LAVA_BUCKET");
        assert!(serde_yaml::from_str::<ItemType>("\"bad!\"").is_err());
    }
}

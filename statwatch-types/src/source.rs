//! Identity of a monitored source.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Name used for a single instance that is not part of a replica set.
pub const STANDALONE: &str = "standalone";

/// Stable key for a logical monitored target.
///
/// The name is the replica-set name, or [`STANDALONE`] for an unreplicated
/// instance. The member address list distinguishes two deployments that share
/// a replica-set name and is used for chart grouping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceKey {
    name: String,
    members: Vec<String>,
}

impl SourceKey {
    /// Create a key from an optional replica-set name and the member addresses.
    ///
    /// An empty or absent replica-set name yields a standalone key.
    pub fn new<I, S>(replica_set: Option<&str>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = match replica_set {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => STANDALONE.to_string(),
        };
        Self {
            name,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Key for a single unreplicated instance at `address`.
    pub fn standalone(address: impl Into<String>) -> Self {
        let address: String = address.into();
        Self::new(None, [address])
    }

    /// The replica-set name or [`STANDALONE`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member addresses in the order they were given.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Whether this key names an unreplicated instance.
    pub fn is_standalone(&self) -> bool {
        self.name == STANDALONE
    }

    /// Grouping key for live charts: `name/member1,member2`.
    pub fn chart_key(&self) -> String {
        format!("{}/{}", self.name, self.members.join(","))
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_set_key() {
        let key = SourceKey::new(Some("rs0"), ["a:27017", "b:27017"]);
        assert_eq!(key.name(), "rs0");
        assert!(!key.is_standalone());
        assert_eq!(key.chart_key(), "rs0/a:27017,b:27017");
        assert_eq!(key.to_string(), "rs0");
    }

    #[test]
    fn empty_set_name_is_standalone() {
        let key = SourceKey::new(Some(""), ["a:27017"]);
        assert!(key.is_standalone());
        assert_eq!(key, SourceKey::standalone("a:27017"));
        assert_eq!(key.chart_key(), "standalone/a:27017");
    }

    #[test]
    fn members_distinguish_keys() {
        let a = SourceKey::new(Some("rs0"), ["a:1"]);
        let b = SourceKey::new(Some("rs0"), ["b:1"]);
        assert_ne!(a, b);
    }
}

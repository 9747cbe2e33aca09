//! Discovery filters built from a device identity and the classroom group key.

use std::fmt;

use uuid::Uuid;

use crate::device::{DeviceIdentity, GroupPolicy};

/// A classroom group key, e.g. `"3"`.
///
/// Blank keys are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(String);

impl GroupKey {
    /// Build a key from a raw setting, returning `None` when it is blank.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the advertised local name must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameFilter {
    Exact(String),
    Prefix(String),
}

impl NameFilter {
    /// Whether an advertised local name satisfies the filter.
    #[must_use]
    pub fn matches(&self, local_name: &str) -> bool {
        match self {
            Self::Exact(name) => local_name == name,
            Self::Prefix(prefix) => local_name.starts_with(prefix.as_str()),
        }
    }
}

/// Everything a transport needs to discover one kind of peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFilter {
    pub name: NameFilter,
    /// Services the channel will use after connecting. Some BLE stacks refuse
    /// access to services not declared at scan time.
    pub optional_services: Vec<Uuid>,
}

impl DiscoveryFilter {
    /// Build the filter for `identity`, qualified by `group` per the
    /// identity's [`GroupPolicy`].
    #[must_use]
    pub fn build(identity: &DeviceIdentity, group: Option<&GroupKey>) -> Self {
        let base = identity.advertised_name;
        let name = match (group, identity.group_policy) {
            (None, _) | (Some(_), GroupPolicy::Ignore) => NameFilter::Exact(base.to_string()),
            (Some(group), GroupPolicy::ExactSuffix) => NameFilter::Exact(format!("{base}-{group}")),
            (Some(group), GroupPolicy::PrefixSuffix) => {
                NameFilter::Prefix(format!("{base}-{group}"))
            }
        };

        let mut optional_services: Vec<Uuid> = Vec::new();
        for endpoint in &identity.endpoints {
            if !optional_services.contains(&endpoint.service) {
                optional_services.push(endpoint.service);
            }
        }

        Self {
            name,
            optional_services,
        }
    }

    #[must_use]
    pub fn matches(&self, local_name: Option<&str>) -> bool {
        local_name.is_some_and(|name| self.name.matches(name))
    }
}

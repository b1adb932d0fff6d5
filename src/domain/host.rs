//! Managed hosts as reported by the inventory provider.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::HostId;

/// Connection state of a host towards its management endpoint.
///
/// Anything that is neither connected nor disconnected (e.g. a host that
/// stopped responding) is kept verbatim in [`ConnectionState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Other(String),
}

impl ConnectionState {
    /// Map a provider state string onto the enum, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "connected" => Self::Connected,
            "disconnected" => Self::Disconnected,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Other(raw) => write!(f, "{}", raw.to_ascii_lowercase()),
        }
    }
}

/// Why the inventory provider could not report a host's build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildUnreadable {
    pub reason: String,
    /// HTTP status of the failed lookup, when there was one.
    pub status: Option<u16>,
}

impl fmt::Display for BuildUnreadable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "build unreadable (HTTP {status}): {}", self.reason),
            None => write!(f, "build unreadable: {}", self.reason),
        }
    }
}

/// A managed host. Read-only from the reconciler's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    id: HostId,
    name: String,
    build: Result<String, BuildUnreadable>,
    connection_state: ConnectionState,
}

impl Host {
    pub fn new(
        id: HostId,
        name: impl Into<String>,
        build: impl Into<String>,
        connection_state: ConnectionState,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            build: Ok(build.into()),
            connection_state,
        }
    }

    /// A host whose build lookup failed. It is never retagged.
    pub fn with_unreadable_build(
        id: HostId,
        name: impl Into<String>,
        unreadable: BuildUnreadable,
        connection_state: ConnectionState,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            build: Err(unreadable),
            connection_state,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &HostId {
        &self.id
    }

    /// Display name reported by the provider.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw firmware build identifier, `None` when it could not be read.
    #[must_use]
    pub fn build(&self) -> Option<&str> {
        self.build.as_deref().ok()
    }

    #[must_use]
    pub fn build_error(&self) -> Option<&BuildUnreadable> {
        self.build.as_ref().err()
    }

    #[must_use]
    pub const fn connection_state(&self) -> &ConnectionState {
        &self.connection_state
    }

    /// Disconnected hosts are excluded from every run.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.connection_state == ConnectionState::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_parse_is_case_insensitive() {
        assert_eq!(ConnectionState::parse("CONNECTED"), ConnectionState::Connected);
        assert_eq!(
            ConnectionState::parse("Disconnected"),
            ConnectionState::Disconnected
        );
        assert_eq!(
            ConnectionState::parse("NOT_RESPONDING"),
            ConnectionState::Other("NOT_RESPONDING".into())
        );
    }

    #[test]
    fn only_disconnected_hosts_are_flagged() {
        let host = |state| Host::new(HostId::from("host-1"), "esx01", "B100", state);
        assert!(host(ConnectionState::Disconnected).is_disconnected());
        assert!(!host(ConnectionState::Connected).is_disconnected());
        assert!(!host(ConnectionState::Other("not_responding".into())).is_disconnected());
    }

    #[test]
    fn unreadable_build_has_no_build_value() {
        let host = Host::with_unreadable_build(
            HostId::from("host-1"),
            "esx01",
            BuildUnreadable {
                reason: "service unavailable".into(),
                status: Some(503),
            },
            ConnectionState::Connected,
        );
        assert_eq!(host.build(), None);
        assert_eq!(host.build_error().and_then(|e| e.status), Some(503));
        assert_eq!(
            host.build_error().unwrap().to_string(),
            "build unreadable (HTTP 503): service unavailable"
        );

        let readable = Host::new(HostId::from("host-2"), "esx02", "B100", ConnectionState::Connected);
        assert_eq!(readable.build(), Some("B100"));
        assert!(readable.build_error().is_none());
    }
}

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An addressable device: an account plus the index of one of its devices.
/// Immutable for the lifetime of a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub account_id: Uuid,
    pub device_id: u32,
}

impl Destination {
    #[must_use]
    pub const fn new(account_id: Uuid, device_id: u32) -> Self {
        Self { account_id, device_id }
    }

    /// Topic key for this device on the presence bus.
    #[must_use]
    pub fn topic_key(&self) -> String {
        format!("{}:{}", self.account_id, self.device_id)
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.account_id, self.device_id)
    }
}

/// External push provider kinds, in the closed set this core knows how to
/// dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ProviderKind {
    Pushy,
    Gcm,
}

impl ProviderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pushy => "pushy",
            Self::Gcm => "gcm",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which transport a presence-channel attempt is accounted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTag {
    /// Device pulls messages over a persistent connection.
    Web,
    Gcm,
    Pushy,
}

impl ChannelTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Gcm => "gcm",
            Self::Pushy => "pushy",
        }
    }
}

impl From<ProviderKind> for ChannelTag {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Gcm => Self::Gcm,
            ProviderKind::Pushy => Self::Pushy,
        }
    }
}

/// Per-device delivery capability as recorded in the device directory: at
/// most one registered token per provider kind, plus whether the device
/// drains its durable queue over a persistent connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapability {
    pub gcm_token: Option<String>,
    pub pushy_token: Option<String>,
    pub fetches_messages: bool,
}

impl DeviceCapability {
    #[must_use]
    pub fn token_for(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gcm => self.gcm_token.as_deref(),
            ProviderKind::Pushy => self.pushy_token.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lookup_is_per_kind() {
        let capability = DeviceCapability {
            gcm_token: Some("gcm-reg".to_string()),
            pushy_token: None,
            fetches_messages: false,
        };

        assert_eq!(capability.token_for(ProviderKind::Gcm), Some("gcm-reg"));
        assert_eq!(capability.token_for(ProviderKind::Pushy), None);
    }
}

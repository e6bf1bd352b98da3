//! Device identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identity of a single sensing device (MQTT client id, store partition key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a device identifier, rejecting blank values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] if `id` is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        Ok(Self(id))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the key under which aggregates of this device are stored,
    /// e.g. `Raspberry_Device_1#WEEKLY_AVG`.
    #[must_use]
    pub fn derived_key(&self, label: &str) -> String {
        format!("{}#{label}", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_blank_device_id() {
        assert_eq!(DeviceId::new(""), Err(ValidationError::EmptyDeviceId));
        assert_eq!(DeviceId::new("   "), Err(ValidationError::EmptyDeviceId));
    }

    #[test]
    fn should_append_label_when_deriving_key() {
        let id = DeviceId::new("Raspberry_Device_1").unwrap();
        assert_eq!(id.derived_key("WEEKLY_AVG"), "Raspberry_Device_1#WEEKLY_AVG");
    }

    #[test]
    fn should_serialize_as_plain_string() {
        let id = DeviceId::new("dev-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dev-1\"");
        let parsed: DeviceId = serde_json::from_str("\"dev-1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_fail_deserializing_empty_string() {
        assert!(serde_json::from_str::<DeviceId>("\"\"").is_err());
    }
}

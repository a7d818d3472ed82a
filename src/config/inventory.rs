//! Device inventory and getter list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::device::Capability;

use super::validation::{ConfigError, validate_device_address};

/// One device to poll on every sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Hostname or IP address; also the name of the device's snapshot directory.
    pub address: String,
    /// Driver dialect (`ios`, `iosxr`, `junos`, ...).
    pub vendor: String,
}

impl DeviceEntry {
    pub fn new(address: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            vendor: vendor.into(),
        }
    }
}

/// A getter to run against every device, with the label used in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetterSpec {
    /// Display name, used as the key in the getters report.
    pub name: String,
    /// Capability invoked on the device session.
    pub capability: Capability,
}

impl GetterSpec {
    pub fn new(name: impl Into<String>, capability: Capability) -> Self {
        Self {
            name: name.into(),
            capability,
        }
    }
}

/// The getter list used when the configuration file does not name one.
pub fn default_getters() -> Vec<GetterSpec> {
    use Capability::*;

    [
        ("ARP table", GetArpTable),
        ("Interfaces counters", GetInterfacesCounters),
        ("Facts", GetFacts),
        ("Environment", GetEnvironment),
        ("Configuration", GetConfig),
        ("Interfaces", GetInterfaces),
        ("Interface IP", GetInterfacesIp),
        ("LLDP neighbors", GetLldpNeighbors),
        ("LLDP neighbors detail", GetLldpNeighborsDetail),
        ("MAC address", GetMacAddressTable),
        ("NTP servers", GetNtpServers),
        ("NTP statistics", GetNtpStats),
        ("Transceivers", GetOptics),
        ("SNMP", GetSnmpInformation),
        ("Users", GetUsers),
        ("Network instances (VRF)", GetNetworkInstances),
        ("NTP peers", GetNtpPeers),
        ("BGP configuration", GetBgpConfig),
        ("BGP neighbors", GetBgpNeighbors),
        ("IPv6", GetIpv6NeighborsTable),
        ("ISIS neighbors", GetIsisNeighbors),
    ]
    .into_iter()
    .map(|(name, cap)| GetterSpec::new(name, cap))
    .collect()
}

/// Validate inventory entries.
///
/// The same address may appear more than once; it is simply collected twice.
pub fn validate_inventory(inventory: &[DeviceEntry]) -> Result<(), ConfigError> {
    for device in inventory {
        validate_device_address(&device.address)?;
        if device.vendor.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "device '{}': vendor cannot be empty",
                device.address
            )));
        }
    }
    Ok(())
}

/// Validate the getter list: display names must be non-empty and unique,
/// since they key the getters report.
pub fn validate_getters(getters: &[GetterSpec]) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    for getter in getters {
        if getter.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "getter '{}': display name cannot be empty",
                getter.capability
            )));
        }
        if !seen_names.insert(getter.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate getter name: '{}'",
                getter.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_getters_valid() {
        let getters = default_getters();
        assert_eq!(getters.len(), 21);
        assert!(validate_getters(&getters).is_ok());
        assert_eq!(getters[0], GetterSpec::new("ARP table", Capability::GetArpTable));
        assert!(
            getters
                .iter()
                .any(|g| g.name == "Configuration" && g.capability.is_configuration())
        );
    }

    #[test]
    fn test_validate_getters_duplicate_names() {
        let getters = vec![
            GetterSpec::new("Facts", Capability::GetFacts),
            GetterSpec::new("Facts", Capability::GetUsers),
        ];
        let err = validate_getters(&getters).unwrap_err();
        assert!(err.to_string().contains("duplicate getter name"));
    }

    #[test]
    fn test_validate_getters_empty_name() {
        let getters = vec![GetterSpec::new(" ", Capability::GetFacts)];
        assert!(validate_getters(&getters).is_err());
    }

    #[test]
    fn test_validate_inventory_allows_duplicates() {
        let inventory = vec![
            DeviceEntry::new("10.0.0.1", "ios"),
            DeviceEntry::new("10.0.0.1", "ios"),
        ];
        assert!(validate_inventory(&inventory).is_ok());
    }

    #[test]
    fn test_validate_inventory_rejects_bad_entries() {
        assert!(validate_inventory(&[DeviceEntry::new("a/b", "ios")]).is_err());
        let err = validate_inventory(&[DeviceEntry::new("10.0.0.1", "")]).unwrap_err();
        assert!(err.to_string().contains("vendor cannot be empty"));
    }

    #[test]
    fn test_getter_spec_yaml() {
        let getters: Vec<GetterSpec> = serde_yaml::from_str(
            "- name: ARP table\n  capability: get_arp_table\n- name: Configuration\n  capability: get_config\n",
        )
        .unwrap();
        assert_eq!(getters[1].capability, Capability::GetConfig);

        let bad: Result<Vec<GetterSpec>, _> =
            serde_yaml::from_str("- name: Magic\n  capability: get_magic\n");
        assert!(bad.is_err());
    }
}

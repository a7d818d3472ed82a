//! Vendor-neutral getter catalogue.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A read-only query a device session can answer.
///
/// The string form (`get_arp_table`, ...) is the identifier used in
/// configuration files and passed to the device driver.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    GetArpTable,
    GetInterfacesCounters,
    GetFacts,
    GetEnvironment,
    /// Returns a mapping of configuration variant (`running`, `startup`,
    /// `candidate`) to raw text.
    GetConfig,
    GetInterfaces,
    GetInterfacesIp,
    GetLldpNeighbors,
    GetLldpNeighborsDetail,
    GetMacAddressTable,
    GetNtpServers,
    GetNtpStats,
    GetOptics,
    GetSnmpInformation,
    GetUsers,
    GetNetworkInstances,
    GetNtpPeers,
    GetBgpConfig,
    GetBgpNeighbors,
    GetIpv6NeighborsTable,
    GetIsisNeighbors,
    GetVlans,
}

impl Capability {
    /// Whether results of this capability are persisted as per-variant
    /// config files instead of going into the getters report.
    pub fn is_configuration(self) -> bool {
        matches!(self, Self::GetConfig)
    }
}

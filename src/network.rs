//! Boot-time network addressing resolution.
//!
//! Static addressing is all-or-nothing: either every field is blank (DHCP)
//! or every field is a well-formed IPv4 address forming a consistent
//! subnet.  Anything in between is a configuration error, never a silent
//! fallback to DHCP.

use core::net::Ipv4Addr;

use crate::error::ConfigError;

/// Fully resolved static addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAddressing {
    pub ip: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub subnet: Ipv4Addr,
    pub dns: Ipv4Addr,
}

impl StaticAddressing {
    /// CIDR prefix length of the (already validated, contiguous) mask.
    pub fn prefix_len(&self) -> u8 {
        u32::from(self.subnet).leading_ones() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Dhcp,
    Static(StaticAddressing),
}

/// Resolved once at boot, immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSettings {
    pub mode: AddressingMode,
}

impl NetworkSettings {
    pub const DHCP: Self = Self {
        mode: AddressingMode::Dhcp,
    };

    /// Resolve the four raw address strings.  Blank means "not set";
    /// surrounding whitespace is ignored.
    pub fn resolve(
        ip: &str,
        gateway: &str,
        subnet: &str,
        dns: &str,
    ) -> Result<Self, ConfigError> {
        let fields = [
            ("static_ip", ip.trim()),
            ("gateway", gateway.trim()),
            ("subnet", subnet.trim()),
            ("dns", dns.trim()),
        ];

        if fields.iter().all(|(_, v)| v.is_empty()) {
            return Ok(Self::DHCP);
        }
        if let Some(&(name, _)) = fields.iter().find(|(_, v)| v.is_empty()) {
            return Err(ConfigError::IncompleteStaticNetwork(name));
        }

        let [ip, gateway, subnet, dns] = fields.map(|(name, v)| parse_addr(name, v));
        let addressing = StaticAddressing {
            ip: ip?,
            gateway: gateway?,
            subnet: subnet?,
            dns: dns?,
        };

        let mask = u32::from(addressing.subnet);
        if !is_contiguous_mask(mask) {
            return Err(ConfigError::InvalidSubnetMask);
        }
        if u32::from(addressing.ip) & mask != u32::from(addressing.gateway) & mask {
            return Err(ConfigError::GatewayOutsideSubnet);
        }

        Ok(Self {
            mode: AddressingMode::Static(addressing),
        })
    }

    pub fn is_dhcp(&self) -> bool {
        matches!(self.mode, AddressingMode::Dhcp)
    }
}

fn parse_addr(field: &'static str, value: &str) -> Result<Ipv4Addr, ConfigError> {
    value
        .parse::<Ipv4Addr>()
        .map_err(|_| ConfigError::MalformedAddress(field))
}

/// A usable mask is a non-empty run of leading ones followed only by zeros.
fn is_contiguous_mask(mask: u32) -> bool {
    mask != 0 && mask.leading_ones() + mask.trailing_zeros() == 32
}

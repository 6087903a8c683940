//! Connection admission, consulted before any per-peer state exists.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

pub trait AdmissionPolicy: Send + Sync {
    /// Decide whether `addr` may open a connection.
    fn on_connection_request(&self, addr: &SocketAddr) -> bool;

    /// Scale factor applied to the per-address packet limit.
    fn address_multiplier(&self, _ip: &IpAddr) -> u32 {
        1
    }
}

/// Accepts everyone at the base rate.
pub struct AllowAll;

impl AdmissionPolicy for AllowAll {
    fn on_connection_request(&self, _addr: &SocketAddr) -> bool {
        true
    }
}

/// An address prefix such as `10.0.0.0/8` or `2001:db8::/32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrRange {
    network: IpAddr,
    prefix: u8,
}

impl CidrRange {
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = prefix_mask32(self.prefix);
                u32::from(net) & mask == u32::from(*ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = prefix_mask128(self.prefix);
                u128::from(net) & mask == u128::from(*ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V4(ip)) => net
                .to_ipv4_mapped()
                .is_some_and(|mapped| self.prefix >= 96 && {
                    let mask = prefix_mask32(self.prefix - 96);
                    u32::from(mapped) & mask == u32::from(*ip) & mask
                }),
            (IpAddr::V4(_), IpAddr::V6(ip)) => ip
                .to_ipv4_mapped()
                .is_some_and(|v4| self.contains(&IpAddr::V4(v4))),
        }
    }
}

fn prefix_mask32(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix.min(32) as u32)
    }
}

fn prefix_mask128(prefix: u8) -> u128 {
    if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - prefix.min(128) as u32)
    }
}

impl FromStr for CidrRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, bits)) => {
                let bits = bits
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| format!("bad prefix length in {s:?}"))?;
                (addr, Some(bits))
            }
            None => (s, None),
        };
        let network: IpAddr = addr
            .trim()
            .parse()
            .map_err(|_| format!("bad address in {s:?}"))?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        let prefix = prefix.unwrap_or(max);
        if prefix > max {
            return Err(format!("prefix /{prefix} too long for {network}"));
        }
        Ok(Self { network, prefix })
    }
}

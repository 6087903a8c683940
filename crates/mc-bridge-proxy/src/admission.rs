//! Who may connect, and how much traffic they may send.

use std::net::{IpAddr, SocketAddr};

use mc_bridge_raknet::{AdmissionPolicy, CidrRange};
use tracing::debug;

#[derive(Debug, Default)]
pub struct ProxyAdmission {
    /// Empty means everyone.
    whitelist: Vec<CidrRange>,
    trusted: Vec<(CidrRange, u32)>,
}

impl ProxyAdmission {
    pub fn new(whitelist: Vec<CidrRange>, trusted: Vec<(CidrRange, u32)>) -> Self {
        Self { whitelist, trusted }
    }
}

impl AdmissionPolicy for ProxyAdmission {
    fn on_connection_request(&self, addr: &SocketAddr) -> bool {
        if self.whitelist.is_empty() {
            return true;
        }
        let ip = addr.ip();
        let allowed = self.whitelist.iter().any(|range| range.contains(&ip));
        if !allowed {
            debug!("connection outside the proxy whitelist refused");
        }
        allowed
    }

    fn address_multiplier(&self, ip: &IpAddr) -> u32 {
        self.trusted
            .iter()
            .filter(|(range, _)| range.contains(ip))
            .map(|(_, multiplier)| *multiplier)
            .max()
            .unwrap_or(1)
    }
}

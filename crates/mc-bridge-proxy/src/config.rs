use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use mc_bridge_proto::compression::CompressionAlgorithm;
use mc_bridge_raknet::CidrRange;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub bedrock: BedrockSection,
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BedrockSection {
    #[serde(default = "default_bedrock_address")]
    pub address: String,
    #[serde(default = "default_bedrock_port")]
    pub port: u16,
    #[serde(default = "default_motd")]
    pub motd: String,
    #[serde(default = "default_sub_motd")]
    pub sub_motd: String,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    /// `deflate`, `snappy` or `none`.
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: u16,
    /// When non-empty only these ranges may connect, e.g. the address of a
    /// proxy in front of the bridge.
    #[serde(default)]
    pub proxy_protocol_whitelist: Vec<String>,
}

fn default_bedrock_address() -> String {
    "0.0.0.0".into()
}

fn default_bedrock_port() -> u16 {
    19132
}

fn default_motd() -> String {
    "Bedrock Bridge".into()
}

fn default_sub_motd() -> String {
    "Java server".into()
}

fn default_max_players() -> u32 {
    100
}

fn default_compression() -> String {
    "deflate".into()
}

fn default_compression_threshold() -> u16 {
    256
}

impl Default for BedrockSection {
    fn default() -> Self {
        Self {
            address: default_bedrock_address(),
            port: default_bedrock_port(),
            motd: default_motd(),
            sub_motd: default_sub_motd(),
            max_players: default_max_players(),
            compression: default_compression(),
            compression_threshold: default_compression_threshold(),
            proxy_protocol_whitelist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Java server in offline mode; players join under their Bedrock gamertag.
    #[default]
    Offline,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSection {
    #[serde(default = "default_remote_address")]
    pub address: String,
    #[serde(default = "default_remote_port")]
    pub port: u16,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_remote_address() -> String {
    "127.0.0.1".into()
}

fn default_remote_port() -> u16 {
    25565
}

fn default_connect_attempts() -> u32 {
    3
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            address: default_remote_address(),
            port: default_remote_port(),
            auth_type: AuthType::default(),
            connect_attempts: default_connect_attempts(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl RemoteSection {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrustedRange {
    pub range: String,
    pub multiplier: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitSection {
    #[serde(default = "default_packets_per_second")]
    pub packets_per_second: u32,
    /// Ranges allowed more traffic, such as a proxy multiplexing many players.
    #[serde(default)]
    pub trusted: Vec<TrustedRange>,
}

fn default_packets_per_second() -> u32 {
    120
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            packets_per_second: default_packets_per_second(),
            trusted: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSection {
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
    #[serde(default = "default_render_distance_cap")]
    pub render_distance_cap: i32,
}

fn default_handshake_timeout_secs() -> u64 {
    30
}

fn default_render_distance_cap() -> i32 {
    16
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            handshake_timeout_secs: default_handshake_timeout_secs(),
            render_distance_cap: default_render_distance_cap(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub log_player_ip_addresses: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_player_ip_addresses: false,
        }
    }
}

impl BridgeConfig {
    /// Reads `path`, writing the defaults there first when it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&config)?)?;
            return Ok(config);
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.bind_addr()?;
        self.compression()?;
        self.whitelist()?;
        self.trusted_ranges()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(format!("{}:{}", self.bedrock.address, self.bedrock.port).parse()?)
    }

    pub fn compression(&self) -> Result<CompressionAlgorithm, Box<dyn std::error::Error>> {
        CompressionAlgorithm::from_name(&self.bedrock.compression)
            .ok_or_else(|| format!("unknown compression {:?}", self.bedrock.compression).into())
    }

    pub fn whitelist(&self) -> Result<Vec<CidrRange>, Box<dyn std::error::Error>> {
        self.bedrock
            .proxy_protocol_whitelist
            .iter()
            .map(|s| s.parse::<CidrRange>().map_err(Into::into))
            .collect()
    }

    pub fn trusted_ranges(&self) -> Result<Vec<(CidrRange, u32)>, Box<dyn std::error::Error>> {
        self.rate_limit
            .trusted
            .iter()
            .map(|t| -> Result<(CidrRange, u32), Box<dyn std::error::Error>> {
                Ok((t.range.parse::<CidrRange>()?, t.multiplier.max(1)))
            })
            .collect()
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.session.handshake_timeout_secs.max(1))
    }
}

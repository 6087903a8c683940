//! Identity extraction from the Bedrock login chain.
//!
//! Signatures are not checked: the bridge runs the upstream connection in
//! offline mode and only needs the claimed identity.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;

use crate::error::ProtoError;
use crate::types::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub x5u: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExtraData {
    #[serde(rename = "XUID", default)]
    xuid: Option<String>,
    identity: String,
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityClaims {
    #[serde(default)]
    extra_data: Option<ExtraData>,
}

/// Who the client claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uuid: Uuid,
    pub xuid: String,
    pub display_name: String,
}

/// Device fields from the client data token that the bridge cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientData {
    #[serde(rename = "DeviceOS", default)]
    pub device_os: i32,
    #[serde(rename = "DeviceModel", default)]
    pub device_model: String,
    #[serde(rename = "GameVersion", default)]
    pub game_version: String,
    #[serde(rename = "LanguageCode", default)]
    pub language_code: String,
    #[serde(rename = "ServerAddress", default)]
    pub server_address: String,
}

pub fn decode_unverified(token: &str) -> Result<(JwtHeader, serde_json::Value), ProtoError> {
    let mut parts = token.splitn(3, '.');
    let (Some(header), Some(payload), Some(_)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ProtoError::InvalidLogin("token is not three dot separated parts".into()));
    };
    let header = decode_part(header)?;
    let payload = decode_part(payload)?;
    Ok((serde_json::from_slice(&header)?, serde_json::from_slice(&payload)?))
}

fn decode_part(part: &str) -> Result<Vec<u8>, ProtoError> {
    URL_SAFE_NO_PAD
        .decode(part)
        .or_else(|_| URL_SAFE.decode(part))
        .map_err(|e| ProtoError::InvalidLogin(format!("bad base64: {e}")))
}

/// The identity sits in the last chain entry that carries `extraData`.
pub fn extract_identity(chain: &[String]) -> Result<Identity, ProtoError> {
    if chain.is_empty() {
        return Err(ProtoError::InvalidLogin("empty chain".into()));
    }
    for token in chain.iter().rev() {
        let (_, payload) = decode_unverified(token)?;
        let Ok(claims) = serde_json::from_value::<IdentityClaims>(payload) else {
            continue;
        };
        if let Some(extra) = claims.extra_data {
            if extra.display_name.trim().is_empty() {
                return Err(ProtoError::InvalidLogin("blank display name".into()));
            }
            return Ok(Identity {
                uuid: extra.identity.parse()?,
                xuid: extra.xuid.unwrap_or_default(),
                display_name: extra.display_name,
            });
        }
    }
    Err(ProtoError::InvalidLogin("no identity in chain".into()))
}

pub fn extract_client_data(token: &str) -> Result<ClientData, ProtoError> {
    let (_, payload) = decode_unverified(token)?;
    Ok(serde_json::from_value(payload)?)
}

#[cfg(test)]
pub(crate) fn fake_token(payload: &serde_json::Value) -> String {
    let header = serde_json::json!({ "alg": "ES384", "x5u": "key" });
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap_or_default()),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap_or_default())
    )
}

//! Client-facing export formats for a credential: the VMess share object,
//! its `vmess://` link and a QR code of whichever link the user should scan.

use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use serde::Serialize;

use crate::{entity::credential, prelude::*};

pub const DOWNLOAD_NAME: &str = "v2ray-config.json";

/// VMess "v2" share object as understood by V2RayN/V2RayNG.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vmess {
  pub v: &'static str,
  pub ps: String,
  pub add: String,
  pub port: String,
  pub id: String,
  pub aid: &'static str,
  pub scy: &'static str,
  pub net: &'static str,
  #[serde(rename = "type")]
  pub kind: &'static str,
  pub host: &'static str,
  pub path: &'static str,
  pub tls: &'static str,
}

impl Vmess {
  /// `None` for link-only credentials, which carry no client id.
  pub fn from_credential(cred: &credential::Model, email: &str) -> Option<Self> {
    let (Some(id), Some(server), Some(port)) =
      (cred.uuid.as_ref(), cred.server.as_ref(), cred.port)
    else {
      return None;
    };

    Some(Self {
      v: "2",
      ps: format!("VPN Service - {email}"),
      add: server.clone(),
      port: port.to_string(),
      id: id.clone(),
      aid: "0",
      scy: "auto",
      net: "ws",
      kind: "none",
      host: "",
      path: "/",
      tls: "tls",
    })
  }

  pub fn to_link(&self) -> Result<String> {
    let compact =
      json::to_string(self).map_err(|err| Error::Internal(err.to_string()))?;
    Ok(format!("vmess://{}", STANDARD.encode(compact)))
  }

  pub fn to_pretty_json(&self) -> Result<String> {
    json::to_string_pretty(self).map_err(|err| Error::Internal(err.to_string()))
  }
}

/// The link a client should import: the stored connection URL when an
/// administrator supplied one, otherwise the generated VMess link.
pub fn preferred_link(cred: &credential::Model, email: &str) -> Result<String> {
  if let Some(link) = cred.link.as_ref().filter(|link| !link.is_empty()) {
    return Ok(link.clone());
  }
  Vmess::from_credential(cred, email)
    .ok_or(Error::CredentialNotFound)?
    .to_link()
}

/// Renders `data` as a PNG QR code with 10px modules and a quiet zone.
pub fn qr_png(data: &str) -> Result<Vec<u8>> {
  let code = QrCode::new(data.as_bytes())
    .map_err(|err| Error::Internal(format!("qr encode: {err}")))?;

  let image = code
    .render::<Luma<u8>>()
    .module_dimensions(10, 10)
    .quiet_zone(true)
    .build();

  let mut png = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
    .map_err(|err| Error::Internal(format!("png encode: {err}")))?;
  Ok(png)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entity::Protocol;

  fn credential(link: Option<&str>, uuid: Option<&str>) -> credential::Model {
    credential::Model {
      id: 1,
      user_id: 1,
      uuid: uuid.map(Into::into),
      server: uuid.map(|_| "vpn.example.com".into()),
      port: uuid.map(|_| 443),
      protocol: if uuid.is_some() { Protocol::Vmess } else { Protocol::Vless },
      link: link.map(Into::into),
      created_at: now(),
    }
  }

  #[test]
  fn vmess_object_shape() {
    let cred = credential(None, Some("2f1c3a4e-0000-4000-8000-000000000001"));
    let vmess = Vmess::from_credential(&cred, "a@b.c").unwrap();

    let value: json::Value = json::from_str(&vmess.to_pretty_json().unwrap()).unwrap();
    assert_eq!(value["v"], "2");
    assert_eq!(value["ps"], "VPN Service - a@b.c");
    assert_eq!(value["add"], "vpn.example.com");
    assert_eq!(value["port"], "443");
    assert_eq!(value["id"], "2f1c3a4e-0000-4000-8000-000000000001");
    assert_eq!(value["type"], "none");
    assert_eq!(value["net"], "ws");
    assert_eq!(value["tls"], "tls");
  }

  #[test]
  fn vmess_link_is_base64_json() {
    let cred = credential(None, Some("2f1c3a4e-0000-4000-8000-000000000001"));
    let vmess = Vmess::from_credential(&cred, "a@b.c").unwrap();

    let link = vmess.to_link().unwrap();
    let encoded = link.strip_prefix("vmess://").unwrap();
    let decoded = STANDARD.decode(encoded).unwrap();
    let value: json::Value = json::from_slice(&decoded).unwrap();
    assert_eq!(value["id"], "2f1c3a4e-0000-4000-8000-000000000001");
  }

  #[test]
  fn stored_link_wins() {
    let cred = credential(Some("vless://x@y:443"), Some("2f1c3a4e"));
    assert_eq!(preferred_link(&cred, "a@b.c").unwrap(), "vless://x@y:443");

    let cred = credential(None, Some("2f1c3a4e"));
    assert!(preferred_link(&cred, "a@b.c").unwrap().starts_with("vmess://"));
  }

  #[test]
  fn link_only_credentials_have_no_vmess() {
    let cred = credential(Some("vless://x@y:443"), None);
    assert!(Vmess::from_credential(&cred, "a@b.c").is_none());

    let empty = credential(None, None);
    assert!(matches!(
      preferred_link(&empty, "a@b.c"),
      Err(Error::CredentialNotFound)
    ));
  }

  #[test]
  fn qr_is_png() {
    let png = qr_png("vless://x@y:443").unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
  }
}

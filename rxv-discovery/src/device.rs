//! Device description parsing and validation.
//!
//! Parses the UPnP description document a receiver publishes at its SSDP
//! location, including the Yamaha `X_device` extension block that carries
//! the remote-control URL. A description without that URL does not belong
//! to a controllable Yamaha receiver.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use url::{Host, Url};

use crate::error::{DiscoveryError, Result};

/// UPnP device description root element.
#[derive(Debug, Deserialize)]
pub struct Root {
    pub device: DeviceDescription,
}

/// Standard UPnP device fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    pub model_number: Option<String>,
    pub serial_number: Option<String>,
    #[serde(rename = "UDN")]
    pub udn: String,
}

impl DeviceDescription {
    /// Parse device description from XML.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::ParseError` if the XML is malformed or missing required fields.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::ParseError(format!("Failed to parse device XML: {}", e)))?;

        Ok(root.device)
    }

    /// Check if the manufacturer is Yamaha.
    pub fn is_yamaha_device(&self) -> bool {
        self.manufacturer.to_lowercase().contains("yamaha")
    }
}

/// Values from the `yamaha:X_device` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YamahaExtension {
    pub url_base: Option<String>,
    pub control_url: Option<String>,
    pub unit_desc_url: Option<String>,
    pub yxc_control_url: Option<String>,
}

impl YamahaExtension {
    /// Scan the description for the first occurrence of each `X_*` element.
    ///
    /// Element prefixes are ignored so both `yamaha:X_controlURL` and a
    /// default-namespaced `X_controlURL` match.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut extension = Self::default();
        let mut current: Option<Vec<u8>> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => current = Some(e.local_name().as_ref().to_vec()),
                Ok(Event::End(_)) => current = None,
                Ok(Event::Text(text)) => {
                    let slot = match current.as_deref() {
                        Some(b"X_URLBase") => &mut extension.url_base,
                        Some(b"X_controlURL") => &mut extension.control_url,
                        Some(b"X_unitDescURL") => &mut extension.unit_desc_url,
                        Some(b"X_yxcControlURL") => &mut extension.yxc_control_url,
                        _ => continue,
                    };
                    if slot.is_none() {
                        let value = text.unescape().map_err(|e| {
                            DiscoveryError::ParseError(format!("Invalid text in description: {}", e))
                        })?;
                        *slot = Some(value.trim().to_string());
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(DiscoveryError::ParseError(format!(
                        "Failed to scan description at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                Ok(_) => {}
            }
        }

        Ok(extension)
    }
}

/// Identity of a Yamaha receiver resolved from its description document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverDetails {
    pub model_name: String,
    pub friendly_name: String,
    pub serial_number: Option<String>,
    /// Absolute URL of the YNC control endpoint
    pub ctrl_url: String,
    pub unit_desc_url: Option<String>,
    pub yxc_control_url: Option<String>,
}

impl ReceiverDetails {
    /// Resolve receiver details from a description fetched at `location`.
    ///
    /// Returns `Ok(None)` when the document is valid UPnP but carries no
    /// Yamaha control URL.
    pub fn from_xml(xml: &str, location: &str) -> Result<Option<Self>> {
        let description = DeviceDescription::from_xml(xml)?;
        let extension = YamahaExtension::from_xml(xml)?;

        let Some(control_path) = extension.control_url.as_deref() else {
            return Ok(None);
        };

        let base = extension.url_base.as_deref().unwrap_or(location);
        let ctrl_url = join_url(base, control_path)?;
        let unit_desc_url = extension
            .unit_desc_url
            .as_deref()
            .map(|path| join_url(base, path))
            .transpose()?;

        Ok(Some(Self {
            model_name: description.model_name,
            friendly_name: description.friendly_name,
            serial_number: description.serial_number,
            ctrl_url,
            unit_desc_url,
            yxc_control_url: extension.yxc_control_url,
        }))
    }
}

fn join_url(base: &str, path: &str) -> Result<String> {
    let base = Url::parse(base)
        .map_err(|e| DiscoveryError::ParseError(format!("Invalid base URL '{}': {}", base, e)))?;
    base.join(path)
        .map(String::from)
        .map_err(|e| DiscoveryError::ParseError(format!("Invalid URL path '{}': {}", path, e)))
}

/// Extract the host from a URL.
///
/// # Returns
///
/// The host portion of the URL (without port or IPv6 brackets), or `None`
/// if the URL is malformed.
pub fn extract_host_from_url(url: &str) -> Option<String> {
    match Url::parse(url).ok()?.host()? {
        Host::Ipv6(address) => Some(address.to_string()),
        host => Some(host.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RX_V675: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root xmlns="urn:schemas-upnp-org:device-1-0" xmlns:yamaha="urn:schemas-yamaha-com:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Living Room Receiver</friendlyName>
    <manufacturer>Yamaha Corporation</manufacturer>
    <modelName>RX-V675</modelName>
    <modelNumber>V675</modelNumber>
    <serialNumber>0B123456</serialNumber>
    <UDN>uuid:9ab0c000-f668-11de-9976-00a0ded41bb7</UDN>
  </device>
  <yamaha:X_device>
    <yamaha:X_URLBase>http://192.168.1.20:80/</yamaha:X_URLBase>
    <yamaha:X_serviceList>
      <yamaha:X_service>
        <yamaha:X_specType>urn:schemas-yamaha-com:service:X_YamahaRemoteControl:1</yamaha:X_specType>
        <yamaha:X_controlURL>/YamahaRemoteControl/ctrl</yamaha:X_controlURL>
        <yamaha:X_unitDescURL>/YamahaRemoteControl/desc.xml</yamaha:X_unitDescURL>
      </yamaha:X_service>
    </yamaha:X_serviceList>
  </yamaha:X_device>
</root>"#;

    const RENDERER_WITHOUT_EXTENSION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>TV</friendlyName>
    <manufacturer>Other Company</manufacturer>
    <modelName>Smart TV</modelName>
    <UDN>uuid:TV123</UDN>
  </device>
</root>"#;

    #[test]
    fn test_extract_host_from_url() {
        assert_eq!(
            extract_host_from_url("http://192.168.1.20:49154/MediaRenderer/desc.xml"),
            Some("192.168.1.20".to_string())
        );
        assert_eq!(
            extract_host_from_url("http://127.0.0.1/desc.xml"),
            Some("127.0.0.1".to_string())
        );
        assert_eq!(
            extract_host_from_url("http://[fe80::1]:49154/MediaRenderer/desc.xml"),
            Some("fe80::1".to_string())
        );
        assert_eq!(extract_host_from_url("invalid-url"), None);
    }

    #[test]
    fn test_device_from_xml() {
        let device = DeviceDescription::from_xml(RX_V675).unwrap();

        assert_eq!(device.friendly_name, "Living Room Receiver");
        assert_eq!(device.model_name, "RX-V675");
        assert_eq!(device.serial_number.as_deref(), Some("0B123456"));
        assert_eq!(device.udn, "uuid:9ab0c000-f668-11de-9976-00a0ded41bb7");
        assert!(device.is_yamaha_device());
    }

    #[test]
    fn test_not_yamaha_device() {
        let device = DeviceDescription::from_xml(RENDERER_WITHOUT_EXTENSION).unwrap();
        assert!(!device.is_yamaha_device());
        assert_eq!(device.serial_number, None);
    }

    #[test]
    fn test_yamaha_extension() {
        let extension = YamahaExtension::from_xml(RX_V675).unwrap();

        assert_eq!(extension.url_base.as_deref(), Some("http://192.168.1.20:80/"));
        assert_eq!(extension.control_url.as_deref(), Some("/YamahaRemoteControl/ctrl"));
        assert_eq!(extension.unit_desc_url.as_deref(), Some("/YamahaRemoteControl/desc.xml"));
        assert_eq!(extension.yxc_control_url, None);
    }

    #[test]
    fn test_receiver_details_resolves_control_url() {
        let details = ReceiverDetails::from_xml(RX_V675, "http://192.168.1.20:49154/MediaRenderer/desc.xml")
            .unwrap()
            .unwrap();

        assert_eq!(details.model_name, "RX-V675");
        assert_eq!(details.serial_number.as_deref(), Some("0B123456"));
        assert_eq!(details.ctrl_url, "http://192.168.1.20/YamahaRemoteControl/ctrl");
        assert_eq!(
            details.unit_desc_url.as_deref(),
            Some("http://192.168.1.20/YamahaRemoteControl/desc.xml")
        );
    }

    #[test]
    fn test_receiver_details_without_extension() {
        let details =
            ReceiverDetails::from_xml(RENDERER_WITHOUT_EXTENSION, "http://192.168.1.30/desc.xml").unwrap();
        assert!(details.is_none());
    }

    #[test]
    fn test_malformed_description() {
        assert!(DeviceDescription::from_xml("<root><device>").is_err());
        assert!(ReceiverDetails::from_xml("not xml", "http://192.168.1.30/").is_err());
    }
}

//! Minimal YNC client for Yamaha AV receivers
//!
//! This crate speaks just enough of the Yamaha Network Control protocol
//! (XML documents POSTed to `/YamahaRemoteControl/ctrl`) to identify a
//! receiver and enumerate its inputs. It also reads the serial number from
//! the receiver's UPnP description document.

mod error;
mod session;

pub use error::ClientError;
pub use session::ReceiverSession;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::net::Ipv6Addr;
use std::time::Duration;

use tracing::{debug, trace};
use xmltree::{Element, XMLNode};

/// Path of the YNC control endpoint
pub const CONTROL_PATH: &str = "/YamahaRemoteControl/ctrl";

/// Path of the UPnP description served on the description port
pub const DESCRIPTION_PATH: &str = "/MediaRenderer/desc.xml";

/// Port the UPnP description is served on when SSDP has not said otherwise
pub const DEFAULT_DESCRIPTION_PORT: u16 = 49154;

const SYSTEM_CONFIG_REQUEST: &str = "<System><Config>GetParam</Config></System>";
const INPUT_LIST_REQUEST: &str =
    "<Main_Zone><Input><Input_Sel_Item>GetParam</Input_Sel_Item></Input></Main_Zone>";

/// Host as it appears in a URL authority; IPv6 literals are bracketed
pub fn url_host(host: &str) -> Cow<'_, str> {
    if host.parse::<Ipv6Addr>().is_ok() {
        Cow::Owned(format!("[{}]", host))
    } else {
        Cow::Borrowed(host)
    }
}

/// Connection settings for [`YncClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Port of the YNC control endpoint
    /// Default: 80
    pub port: u16,

    /// Port of the UPnP description document
    /// Default: 49154
    pub description_port: u16,

    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Default: 10 seconds
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: 80,
            description_port: DEFAULT_DESCRIPTION_PORT,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// `System/Config` values reported by a receiver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemConfig {
    pub model_name: Option<String>,
    pub system_id: Option<String>,
    pub version: Option<String>,
}

impl SystemConfig {
    /// Whether the receiver named itself in its `System/Config` reply
    pub fn is_identified(&self) -> bool {
        self.model_name.is_some() || self.system_id.is_some()
    }
}

/// A minimal YNC client
#[derive(Debug, Clone)]
pub struct YncClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl YncClient {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(config.connect_timeout)
                .timeout_read(config.read_timeout)
                .build(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL of the YNC control endpoint on `host`
    pub fn control_url(&self, host: &str) -> String {
        format!("http://{}:{}{}", url_host(host), self.config.port, CONTROL_PATH)
    }

    /// URL of the UPnP description on `host`
    pub fn description_url(&self, host: &str) -> String {
        format!("http://{}:{}{}", url_host(host), self.config.description_port, DESCRIPTION_PATH)
    }

    /// Send a YNC request and return the `YAMAHA_AV` response element
    pub fn call(&self, host: &str, cmd: &str, payload: &str) -> Result<Element, ClientError> {
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><YAMAHA_AV cmd="{}">{}</YAMAHA_AV>"#,
            cmd, payload
        );
        let url = self.control_url(host);

        trace!(%url, cmd, "sending YNC request");
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .send_string(&body)?;

        let xml_text = response
            .into_string()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        parse_response(&xml_text)
    }

    /// Query `System/Config`
    pub fn system_config(&self, host: &str) -> Result<SystemConfig, ClientError> {
        let response = self.call(host, "GET", SYSTEM_CONFIG_REQUEST)?;
        parse_system_config(&response)
    }

    /// Enumerate the main zone's inputs.
    ///
    /// Maps each input id to its user-assigned source name, or `None` when
    /// the receiver reports no name.
    pub fn inputs(&self, host: &str) -> Result<BTreeMap<String, Option<String>>, ClientError> {
        let response = self.call(host, "GET", INPUT_LIST_REQUEST)?;
        parse_inputs(&response)
    }

    /// Read the serial number from the UPnP description.
    ///
    /// Returns `Ok(None)` when the receiver serves no description or the
    /// description has no serial number. Any other failure is an error.
    pub fn serial_number(&self, host: &str) -> Result<Option<String>, ClientError> {
        let url = self.description_url(host);
        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => {
                debug!(%url, "receiver serves no UPnP description");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };
        let xml_text = response
            .into_string()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        parse_serial_number(&xml_text)
    }

    /// Open a session: identifies the receiver and keeps a handle for later queries
    pub fn connect(&self, host: &str) -> Result<ReceiverSession, ClientError> {
        let system = self.system_config(host)?;
        debug!(host, model = ?system.model_name, "connected to receiver");
        Ok(ReceiverSession::new(self.clone(), host.to_string(), system))
    }
}

impl Default for YncClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_document(xml_text: &str) -> Result<Element, ClientError> {
    Element::parse(xml_text.as_bytes()).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Validate a YNC response document and return its root
fn parse_response(xml_text: &str) -> Result<Element, ClientError> {
    let root = parse_document(xml_text)?;

    if root.name != "YAMAHA_AV" {
        return Err(ClientError::Parse(format!("Unexpected root element {}", root.name)));
    }

    let rc = root
        .attributes
        .get("RC")
        .and_then(|rc| rc.parse::<u16>().ok())
        .unwrap_or(0);
    if rc != 0 {
        return Err(ClientError::Rejected(rc));
    }

    Ok(root)
}

fn child_text(element: &Element, name: &str) -> Option<String> {
    element
        .get_child(name)
        .and_then(|child| child.get_text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn parse_system_config(response: &Element) -> Result<SystemConfig, ClientError> {
    let config = response
        .get_child("System")
        .and_then(|system| system.get_child("Config"))
        .ok_or_else(|| ClientError::Parse("Missing System/Config element".to_string()))?;

    Ok(SystemConfig {
        model_name: child_text(config, "Model_Name"),
        system_id: child_text(config, "System_ID"),
        version: child_text(config, "Version"),
    })
}

fn parse_inputs(response: &Element) -> Result<BTreeMap<String, Option<String>>, ClientError> {
    let items = response
        .get_child("Main_Zone")
        .and_then(|zone| zone.get_child("Input"))
        .and_then(|input| input.get_child("Input_Sel_Item"))
        .ok_or_else(|| ClientError::Parse("Missing Main_Zone/Input/Input_Sel_Item element".to_string()))?;

    let mut inputs = BTreeMap::new();
    for node in &items.children {
        let XMLNode::Element(item) = node else {
            continue;
        };
        if let Some(param) = child_text(item, "Param") {
            inputs.insert(param, child_text(item, "Src_Name"));
        }
    }

    Ok(inputs)
}

fn parse_serial_number(xml_text: &str) -> Result<Option<String>, ClientError> {
    let root = parse_document(xml_text)?;
    let device = root
        .get_child("device")
        .ok_or_else(|| ClientError::Parse("Missing device element".to_string()))?;

    Ok(child_text(device, "serialNumber"))
}

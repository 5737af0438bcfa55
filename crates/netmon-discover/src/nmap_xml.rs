//! Nmap XML output parsing and normalization.
//!
//! Nmap's `-oX -` flag writes structured XML to stdout. The typed structs
//! below deserialize that XML with `quick-xml` + serde, and
//! [`parse_devices`] flattens each `<host>` into a [`DeviceRecord`].

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use thiserror::Error;

use netmon_core::{DeviceRecord, DeviceStatus, UNKNOWN};

/// Why a scanner output could not be turned into device records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The document has no `<nmaprun>` root. Callers treat this as zero hosts.
    #[error("no <nmaprun> root element in scanner output")]
    MissingRoot,

    #[error("malformed scanner output: {0}")]
    Malformed(String),
}

/// Root element: `<nmaprun>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "nmaprun")]
pub struct NmapRun {
    #[serde(rename = "@scanner")]
    pub scanner: Option<String>,
    #[serde(rename = "@args")]
    pub args: Option<String>,
    /// Zero, one, or many `<host>` elements all land here.
    #[serde(rename = "host", default)]
    pub hosts: Vec<NmapHost>,
}

/// A single host from scan results.
#[derive(Debug, Clone, Deserialize)]
pub struct NmapHost {
    pub status: Option<HostStatus>,
    #[serde(rename = "address", default)]
    pub addresses: Vec<Address>,
    pub hostnames: Option<Hostnames>,
    pub ports: Option<Ports>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostStatus {
    #[serde(rename = "@state")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addr_type: String,
    #[serde(rename = "@vendor")]
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hostnames {
    #[serde(rename = "hostname", default)]
    pub hostnames: Vec<Hostname>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hostname {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ports {
    #[serde(rename = "port", default)]
    pub ports: Vec<NmapPort>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapPort {
    #[serde(rename = "@protocol")]
    pub protocol: Option<String>,
    #[serde(rename = "@portid")]
    pub port_id: u16,
    pub state: Option<PortState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortState {
    #[serde(rename = "@state")]
    pub state: String,
}

impl NmapHost {
    fn address_of(&self, addr_type: &str) -> Option<&Address> {
        self.addresses.iter().find(|a| a.addr_type == addr_type)
    }

    /// Extract the IPv4 address, if present.
    pub fn ipv4(&self) -> Option<&str> {
        self.address_of("ipv4").map(|a| a.addr.as_str())
    }

    /// Extract the MAC address, if present.
    pub fn mac(&self) -> Option<&str> {
        self.address_of("mac").map(|a| a.addr.as_str())
    }

    /// Vendor attached to the MAC address entry, if present.
    pub fn vendor(&self) -> Option<&str> {
        self.address_of("mac").and_then(|a| a.vendor.as_deref())
    }

    /// Extract the first hostname, if present.
    pub fn hostname(&self) -> Option<&str> {
        self.hostnames
            .as_ref()
            .and_then(|hn| hn.hostnames.first())
            .map(|h| h.name.as_str())
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
            .as_ref()
            .and_then(|s| s.state.as_deref())
            .map(DeviceStatus::from_state)
            .unwrap_or_default()
    }

    /// Port ids in state `open`, in document order.
    pub fn open_ports(&self) -> Vec<u16> {
        self.ports
            .iter()
            .flat_map(|p| p.ports.iter())
            .filter(|p| p.state.as_ref().is_some_and(|s| s.state == "open"))
            .map(|p| p.port_id)
            .collect()
    }

    pub fn to_device(&self) -> DeviceRecord {
        let or_unknown = |v: Option<&str>| v.unwrap_or(UNKNOWN).to_string();
        DeviceRecord {
            ip: or_unknown(self.ipv4()),
            hostname: or_unknown(self.hostname()),
            vendor: or_unknown(self.vendor()),
            mac: or_unknown(self.mac()),
            status: self.status(),
            open_ports: self.open_ports(),
        }
    }
}

/// Confirm the first element of the document is `<nmaprun>`.
fn check_root(xml: &[u8]) -> Result<(), ParseError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return if e.name().as_ref() == b"nmaprun" {
                    Ok(())
                } else {
                    Err(ParseError::MissingRoot)
                };
            }
            Ok(Event::Eof) => return Err(ParseError::MissingRoot),
            Ok(_) => {}
            Err(e) => return Err(ParseError::Malformed(e.to_string())),
        }
        buf.clear();
    }
}

/// Parse nmap XML bytes into a structured `NmapRun`.
pub fn parse_nmap_xml(xml: &[u8]) -> Result<NmapRun, ParseError> {
    check_root(xml)?;
    quick_xml::de::from_reader(xml).map_err(|e| ParseError::Malformed(format!("{e}")))
}

/// Parse nmap XML bytes straight into normalized device records.
pub fn parse_devices(xml: &[u8]) -> Result<Vec<DeviceRecord>, ParseError> {
    let run = parse_nmap_xml(xml)?;
    Ok(run.hosts.iter().map(NmapHost::to_device).collect())
}

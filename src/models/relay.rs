// Monitored relay node, sourced from static configuration

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Relay {
    /// Stable identifier used in storage keys.
    pub key: String,
    /// Connection address of the node.
    pub url: String,
    /// Human label used in reports.
    pub name: String,
}

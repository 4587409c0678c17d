// ── Runtime console configuration ──
//
// These types describe *how* to reach the console API and how list
// views behave. They never touch disk; the CLI (or `staffdesk-config`)
// builds a `ConsoleConfig` and hands it in.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use staffdesk_api::TransportConfig;
use url::Url;

/// Per-subscription revalidation knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeOptions {
    /// Keep showing the previous key's data while a new key loads.
    pub keep_previous_data: bool,
    /// Refetch silently when the application regains focus.
    pub revalidate_on_focus: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            keep_previous_data: true,
            revalidate_on_focus: false,
        }
    }
}

/// Configuration for one console API.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// API root (e.g., `https://hr.example.com/`).
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Page size for new list controllers.
    pub default_page_size: u32,
    /// Page size the accumulator requests.
    pub accumulator_page_size: u32,
    pub subscribe: SubscribeOptions,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl ConsoleConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            default_page_size: 10,
            accumulator_page_size: 50,
            subscribe: SubscribeOptions::default(),
            headers: BTreeMap::new(),
        }
    }

    /// Transport settings derived from this config.
    pub fn transport(&self) -> TransportConfig {
        self.headers.iter().fold(
            TransportConfig::default().with_timeout(self.timeout),
            |transport, (name, value)| transport.with_header(name, value),
        )
    }
}

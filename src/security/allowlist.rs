//! Relay target allow-listing.

use std::collections::HashSet;

/// Hosts the relay front-end may forward to. Matching is exact and
/// case-insensitive on the host, ignoring any port in the header value.
#[derive(Debug)]
pub struct HostAllowlist {
    hosts: HashSet<String>,
}

impl HostAllowlist {
    pub fn new(entries: &[String]) -> Self {
        let hosts = entries
            .iter()
            .map(|entry| normalize(entry))
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { hosts }
    }

    pub fn permits(&self, host: &str) -> bool {
        self.hosts.contains(&normalize(host))
    }
}

fn normalize(host: &str) -> String {
    let trimmed = host.trim();
    let without_port = trimmed.rsplit_once(':').map_or(trimmed, |(head, tail)| {
        if tail.chars().all(|c| c.is_ascii_digit()) {
            head
        } else {
            trimmed
        }
    });
    without_port.to_ascii_lowercase()
}

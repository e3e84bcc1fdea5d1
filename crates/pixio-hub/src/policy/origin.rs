//! Origin allow-list for WebSocket upgrades.
//!
//! An empty list accepts every origin. A configured list requires an exact
//! match on the `Origin` header; requests without the header are refused.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: HashSet<String>,
}

impl OriginPolicy {
    pub fn from_config(raw: &[String]) -> Self {
        Self {
            allowed: raw
                .iter()
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn allows(&self, origin: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        match origin {
            Some(o) => self.allowed.contains(o.trim_end_matches('/')),
            None => false,
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Base URL for the global coverage deployment
pub const GLOBAL_BASE_URL: &str = "https://g.api.soracom.io/v1";

/// Base URL for the Japan coverage deployment
pub const JAPAN_BASE_URL: &str = "https://api.soracom.io/v1";

/// Selector prefix that picks the global deployment
const GLOBAL_SELECTOR_PREFIX: &str = "g";

/// Which API deployment a session talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    #[default]
    Global,
    Japan,
}

impl Coverage {
    /// Resolve a coverage selector. Anything starting with "g" is global,
    /// everything else (including an empty selector) is Japan.
    pub fn from_selector(selector: &str) -> Self {
        if selector.starts_with(GLOBAL_SELECTOR_PREFIX) {
            Coverage::Global
        } else {
            Coverage::Japan
        }
    }

    /// Short selector code, the inverse of `from_selector`
    pub fn selector(&self) -> &'static str {
        match self {
            Coverage::Global => "g",
            Coverage::Japan => "jp",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Coverage::Global => "Global",
            Coverage::Japan => "Japan",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Coverage::Global => Coverage::Japan,
            Coverage::Japan => Coverage::Global,
        }
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Base URLs for both deployments. Overridable for staging or tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub global: String,
    pub japan: String,
}

impl Endpoints {
    pub fn new(global: impl Into<String>, japan: impl Into<String>) -> Self {
        Self {
            global: trim_base(global.into()),
            japan: trim_base(japan.into()),
        }
    }

    pub fn base_url(&self, coverage: Coverage) -> &str {
        match coverage {
            Coverage::Global => &self.global,
            Coverage::Japan => &self.japan,
        }
    }

    /// Join a base URL and an API path such as "/auth"
    pub fn url(&self, coverage: Coverage, path: &str) -> String {
        format!("{}{}", self.base_url(coverage), path)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(GLOBAL_BASE_URL, JAPAN_BASE_URL)
    }
}

fn trim_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

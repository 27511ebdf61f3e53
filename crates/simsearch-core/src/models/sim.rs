use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag key that carries the SIM's display name
pub const NAME_TAG: &str = "name";

/// A provisioned SIM card as returned by `/query/sims` and `/sims/{simId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sim {
    #[serde(rename = "simId")]
    pub sim_id: String,
    #[serde(rename = "primaryImsi", default)]
    pub primary_imsi: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "speedClass", default)]
    pub speed_class: String,
    #[serde(rename = "type", default)]
    pub sim_type: String,
    /// Profiles keyed by ICCID
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default)]
    pub tags: SimTags,
    #[serde(rename = "sessionStatus", default)]
    pub session_status: Option<SessionStatus>,
}

impl Sim {
    pub fn display_name(&self) -> &str {
        if self.tags.name.is_empty() {
            "-"
        } else {
            &self.tags.name
        }
    }

    pub fn is_online(&self) -> bool {
        self.session_status.as_ref().map(|s| s.online).unwrap_or(false)
    }

    pub fn online_str(&self) -> &'static str {
        match self.session_status {
            Some(ref s) if s.online => "online",
            Some(_) => "offline",
            None => "-",
        }
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.session_status
            .as_ref()
            .and_then(|s| s.ue_ip_address.as_deref())
    }

    /// The profile holding the primary IMSI, if any
    pub fn primary_profile(&self) -> Option<&Profile> {
        self.profiles
            .values()
            .find(|p| p.primary_imsi == self.primary_imsi)
            .or_else(|| self.profiles.values().next())
    }
}

/// SIM tags: `name` is always present (possibly empty), all other keys
/// are kept in `extra` in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTags {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl SimTags {
    /// All tags as (key, value) pairs, `name` first
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((NAME_TAG, self.name.as_str()))
            .filter(|(_, v)| !v.is_empty())
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key == NAME_TAG {
            Some(self.name.as_str()).filter(|n| !n.is_empty())
        } else {
            self.extra.get(key).map(|v| v.as_str())
        }
    }

    pub fn len(&self) -> usize {
        self.extra.len() + usize::from(!self.name.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// "key: value" pairs joined for a single table cell
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub iccid: String,
    #[serde(rename = "otaSupported", default)]
    pub ota_supported: bool,
    #[serde(rename = "primaryImsi", default)]
    pub primary_imsi: String,
    /// Subscribers keyed by IMSI
    #[serde(default)]
    pub subscribers: BTreeMap<String, Subscriber>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    #[serde(default)]
    pub imsi: String,
    #[serde(default)]
    pub msisdn: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub subscription: String,
    #[serde(default)]
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub data: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub voice: bool,
}

impl Capabilities {
    pub fn display(&self) -> String {
        let names: Vec<&str> = [("data", self.data), ("sms", self.sms), ("voice", self.voice)]
            .into_iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(name, _)| name)
            .collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join("/")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(default)]
    pub online: bool,
    #[serde(rename = "ueIpAddress", default)]
    pub ue_ip_address: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIM_JSON: &str = r#"{
        "simId": "8981100000000000000",
        "primaryImsi": "295050000000001",
        "status": "active",
        "speedClass": "s1.standard",
        "type": "sim",
        "operatorId": "OP0012345678",
        "profiles": {
            "8981100000000000000": {
                "iccid": "8981100000000000000",
                "otaSupported": true,
                "primaryImsi": "295050000000001",
                "subscribers": {
                    "295050000000001": {
                        "imsi": "295050000000001",
                        "msisdn": "423600000001",
                        "status": "active",
                        "subscription": "plan01s",
                        "capabilities": {"data": true, "sms": true, "voice": false}
                    }
                }
            }
        },
        "tags": {"name": "gateway-01", "site": "osaka", "rack": "b2"},
        "sessionStatus": {
            "online": true,
            "ueIpAddress": "10.128.0.10",
            "subscription": "plan01s",
            "imei": "350000000000000"
        }
    }"#;

    #[test]
    fn test_parse_sim() {
        let sim: Sim = serde_json::from_str(SIM_JSON).expect("Failed to parse sim test JSON");
        assert_eq!(sim.sim_id, "8981100000000000000");
        assert_eq!(sim.primary_imsi, "295050000000001");
        assert_eq!(sim.status, "active");
        assert_eq!(sim.speed_class, "s1.standard");
        assert_eq!(sim.sim_type, "sim");
        assert_eq!(sim.display_name(), "gateway-01");
        assert!(sim.is_online());
        assert_eq!(sim.online_str(), "online");
        assert_eq!(sim.ip_address(), Some("10.128.0.10"));

        let profile = sim.primary_profile().expect("primary profile");
        assert!(profile.ota_supported);
        let subscriber = &profile.subscribers["295050000000001"];
        assert_eq!(subscriber.msisdn, "423600000001");
        assert_eq!(subscriber.capabilities.display(), "data/sms");
    }

    #[test]
    fn test_tags_name_is_separate_from_extra() {
        let sim: Sim = serde_json::from_str(SIM_JSON).expect("Failed to parse sim test JSON");
        assert_eq!(sim.tags.name, "gateway-01");
        assert!(!sim.tags.extra.contains_key("name"));
        assert_eq!(sim.tags.get("site"), Some("osaka"));
        assert_eq!(sim.tags.get("name"), Some("gateway-01"));
        assert_eq!(sim.tags.len(), 3);

        let keys: Vec<&str> = sim.tags.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "rack", "site"]);
        assert_eq!(sim.tags.summary(), "name: gateway-01, rack: b2, site: osaka");
    }

    #[test]
    fn test_minimal_sim_with_null_session() {
        let json = r#"{"simId": "abc", "sessionStatus": null}"#;
        let sim: Sim = serde_json::from_str(json).expect("Failed to parse minimal sim");
        assert_eq!(sim.sim_id, "abc");
        assert_eq!(sim.display_name(), "-");
        assert!(!sim.is_online());
        assert_eq!(sim.online_str(), "-");
        assert!(sim.tags.is_empty());
        assert!(sim.primary_profile().is_none());
    }

    #[test]
    fn test_offline_sim() {
        let json = r#"{"simId": "abc", "sessionStatus": {"online": false}}"#;
        let sim: Sim = serde_json::from_str(json).expect("Failed to parse offline sim");
        assert_eq!(sim.online_str(), "offline");
        assert_eq!(sim.ip_address(), None);
    }

    #[test]
    fn test_serialize_keeps_wire_names() {
        let sim: Sim = serde_json::from_str(SIM_JSON).expect("Failed to parse sim test JSON");
        let value = serde_json::to_value(&sim).expect("serialize");
        assert_eq!(value["simId"], "8981100000000000000");
        assert_eq!(value["type"], "sim");
        assert_eq!(value["tags"]["name"], "gateway-01");
        assert_eq!(value["tags"]["site"], "osaka");
    }
}

//! Configuration schema offered to the host UI.

use serde_json::{json, Value};

use crate::config::PluginConfig;
use crate::constants::{paths, DEFAULT_SEND_RATE_SECS, MAX_SEND_RATE_SECS};

/// Switch paths worth offering: known `electrical.switches.*.state` paths
/// plus any path the current configuration already uses. Sorted, unique.
pub fn candidate_paths(available: &[String], current: Option<&PluginConfig>) -> Vec<String> {
    let mut candidates: Vec<String> = available
        .iter()
        .filter(|p| p.starts_with(paths::SWITCH_PREFIX) && p.ends_with(paths::STATE_SUFFIX))
        .cloned()
        .collect();

    if let Some(config) = current {
        candidates.extend(config.switch_paths().map(str::to_string));
    }

    candidates.sort();
    candidates.dedup();
    candidates
}

/// JSON schema describing [`PluginConfig`].
pub fn config_schema(available: &[String], current: Option<&PluginConfig>) -> Value {
    let candidates = candidate_paths(available, current);

    let mut switch_item = json!({
        "title": "Switch Path",
        "type": "string"
    });
    if !candidates.is_empty() {
        switch_item["enum"] = json!(candidates);
    }

    json!({
        "type": "object",
        "properties": {
            "banks": {
                "title": "Banks",
                "type": "array",
                "description": "N2K bank instances to emulate",
                "items": {
                    "type": "object",
                    "properties": {
                        "instance": {
                            "title": "N2K Bank Instance",
                            "type": "number",
                            "default": 0
                        },
                        "sendRate": {
                            "title": "Send Rate",
                            "type": "number",
                            "description": "Rate (in seconds) to send to N2K (set to 0 to not send updates)",
                            "default": DEFAULT_SEND_RATE_SECS,
                            "minimum": 0,
                            "maximum": MAX_SEND_RATE_SECS
                        },
                        "switches": {
                            "type": "array",
                            "title": "Switches",
                            "items": switch_item
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BankConfig;

    #[test]
    fn test_candidates_filtered_and_merged() {
        let available = vec![
            "electrical.switches.b.state".to_string(),
            "electrical.switches.a.state".to_string(),
            "electrical.switches.a.dimmingLevel".to_string(),
            "navigation.position".to_string(),
        ];
        let config = PluginConfig {
            banks: vec![BankConfig::new(
                0,
                vec![
                    "electrical.switches.a.state".to_string(),
                    "electrical.switches.z.state".to_string(),
                ],
            )],
        };

        assert_eq!(
            candidate_paths(&available, Some(&config)),
            vec![
                "electrical.switches.a.state".to_string(),
                "electrical.switches.b.state".to_string(),
                "electrical.switches.z.state".to_string(),
            ]
        );
    }

    #[test]
    fn test_schema_enum_only_when_candidates() {
        let schema = config_schema(&[], None);
        let item = &schema["properties"]["banks"]["items"]["properties"]["switches"]["items"];
        assert_eq!(item["type"], "string");
        assert!(item.get("enum").is_none());

        let schema = config_schema(&["electrical.switches.x.state".to_string()], None);
        let item = &schema["properties"]["banks"]["items"]["properties"]["switches"]["items"];
        assert_eq!(item["enum"], json!(["electrical.switches.x.state"]));
    }

    #[test]
    fn test_schema_defaults() {
        let schema = config_schema(&[], None);
        let props = &schema["properties"]["banks"]["items"]["properties"];
        assert_eq!(props["instance"]["default"], 0);
        assert_eq!(props["sendRate"]["default"], 15.0);
        assert_eq!(props["sendRate"]["maximum"], 86_400.0);
    }
}

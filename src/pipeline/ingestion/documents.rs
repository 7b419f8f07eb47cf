use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::CompanyKey;

/// Research stage summary: run metadata plus per-company research entries.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResearchEnrichment {
    pub metadata: serde_json::Value,
    pub companies: serde_json::Value,
}

impl ResearchEnrichment {
    pub fn company_count(&self) -> usize {
        match &self.companies {
            serde_json::Value::Array(items) => items.len(),
            serde_json::Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    /// Research entry for one company; entries are keyed by id or carry `company_id`.
    pub fn company(&self, company_id: &str) -> Option<&serde_json::Value> {
        let wanted = CompanyKey::new(company_id);
        match &self.companies {
            serde_json::Value::Object(map) => map
                .iter()
                .find(|(id, _)| CompanyKey::new(id) == wanted)
                .map(|(_, entry)| entry),
            serde_json::Value::Array(items) => items.iter().find(|entry| {
                entry
                    .get("company_id")
                    .and_then(|id| match id {
                        serde_json::Value::String(s) => Some(CompanyKey::new(s)),
                        serde_json::Value::Number(n) => Some(CompanyKey::new(&n.to_string())),
                        _ => None,
                    })
                    .is_some_and(|key| key == wanted)
            }),
            _ => None,
        }
    }
}

/// Channel definitions; the document must carry a top-level `channels` key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelsConfig {
    pub channels: serde_yaml::Value,
    #[serde(flatten)]
    pub settings: BTreeMap<String, serde_yaml::Value>,
}

impl ChannelsConfig {
    pub fn len(&self) -> usize {
        match &self.channels {
            serde_yaml::Value::Mapping(map) => map.len(),
            serde_yaml::Value::Sequence(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channel identifiers: mapping keys, or the `id`/`name` of list entries.
    pub fn channel_ids(&self) -> Vec<String> {
        match &self.channels {
            serde_yaml::Value::Mapping(map) => map
                .keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect(),
            serde_yaml::Value::Sequence(items) => items
                .iter()
                .filter_map(|item| {
                    item.get("id")
                        .or_else(|| item.get("name"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

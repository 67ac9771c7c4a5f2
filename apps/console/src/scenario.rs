use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use host::{Document, DomEvent};
use serde::Deserialize;
use shared::domain::NodeId;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub elements: Vec<ElementSpec>,
    pub events: Vec<EventSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementSpec {
    pub id: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Id of an element declared earlier; the body when absent.
    pub parent: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub value: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventSpec {
    pub kind: String,
    pub target: Option<String>,
    pub key: Option<String>,
    #[serde(default = "default_cancelable")]
    pub cancelable: bool,
}

fn default_tag() -> String {
    "div".to_string()
}

fn default_cancelable() -> bool {
    true
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid scenario '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Builds the declared elements into `document`, in declaration order.
    pub fn build(&self, document: &Document) -> Result<BTreeMap<String, NodeId>> {
        let mut nodes = BTreeMap::new();
        for element in &self.elements {
            if nodes.contains_key(&element.id) {
                bail!("element '{}' declared twice", element.id);
            }
            let parent = match &element.parent {
                Some(parent) => *nodes
                    .get(parent)
                    .with_context(|| format!("element '{}' names unknown parent '{parent}'", element.id))?,
                None => document.body(),
            };

            let node = document.create_element(&element.tag);
            document.set_attribute(node, "id", element.id.as_str());
            for (name, value) in &element.attributes {
                document.set_attribute(node, name, value.as_str());
            }
            if let Some(value) = &element.value {
                document.set_value(node, value.as_str());
            }
            if let Some(text) = &element.text {
                document.set_text(node, text.as_str());
            }
            document.append_child(parent, node);
            nodes.insert(element.id.clone(), node);
        }
        Ok(nodes)
    }
}

impl EventSpec {
    pub fn to_event(&self, nodes: &BTreeMap<String, NodeId>) -> Result<DomEvent> {
        let mut event = DomEvent::new(self.kind.as_str()).with_cancelable(self.cancelable);
        if let Some(target) = &self.target {
            let node = nodes
                .get(target)
                .with_context(|| format!("event '{}' targets unknown element '{target}'", self.kind))?;
            event = event.with_target(*node);
        }
        if let Some(key) = &self.key {
            event = event.with_key(key.as_str());
        }
        Ok(event)
    }
}

#[cfg(test)]
#[path = "tests/scenario_tests.rs"]
mod tests;

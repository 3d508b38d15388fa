// JSON renderings of an inventory
//
// Two shapes are supported:
// - the inventory document written by the database sync job:
//   {"groups": [{"name", "hosts": [{"name", "vars"}], "vars"}], "ungrouped": [...]}
// - Ansible-compatible dynamic inventory output:
//   `--list` returns every group plus `_meta.hostvars`
//   `--host <hostname>` returns that host's vars

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use super::{check_name, Host, HostGroup, Inventory};
use crate::output::errors::DrinvError;

/// Inventory document, full fidelity including variables
#[derive(Debug, Default, Deserialize, Serialize)]
struct InventoryDocument {
    #[serde(default)]
    groups: Vec<GroupDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ungrouped: Vec<HostDocument>,
}

#[derive(Debug, Deserialize, Serialize)]
struct GroupDocument {
    name: String,
    #[serde(default)]
    hosts: Vec<HostDocument>,
    #[serde(default)]
    vars: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct HostDocument {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    vars: BTreeMap<String, String>,
}

impl From<&Host> for HostDocument {
    fn from(host: &Host) -> Self {
        HostDocument {
            name: host.name.clone(),
            vars: host.vars.clone(),
        }
    }
}

impl From<HostDocument> for Host {
    fn from(doc: HostDocument) -> Self {
        Host {
            name: doc.name,
            vars: doc.vars,
        }
    }
}

/// Render the inventory as a pretty-printed JSON document
pub fn to_json(inventory: &Inventory) -> Result<String, DrinvError> {
    let doc = InventoryDocument {
        groups: inventory
            .groups()
            .iter()
            .map(|g| GroupDocument {
                name: g.name().to_string(),
                hosts: g.hosts().iter().map(HostDocument::from).collect(),
                vars: g.vars().clone(),
            })
            .collect(),
        ungrouped: inventory
            .ungrouped_hosts()
            .iter()
            .map(HostDocument::from)
            .collect(),
    };

    serde_json::to_string_pretty(&doc).map_err(|e| DrinvError::Inventory {
        message: format!("Failed to render inventory JSON: {}", e),
        suggestion: None,
    })
}

/// Build an inventory from a JSON document. Duplicate host names within a
/// group collapse to their first entry; names the text format cannot hold
/// are rejected.
pub fn from_json(json: &str) -> Result<Inventory, DrinvError> {
    let doc: InventoryDocument = serde_json::from_str(json).map_err(|e| DrinvError::Inventory {
        message: format!("Invalid inventory JSON: {}", e),
        suggestion: Some(format!(
            "JSON parse error at line {}, column {}",
            e.line(),
            e.column()
        )),
    })?;

    let mut inventory = Inventory::new();

    for host in doc.ungrouped {
        inventory.insert_ungrouped_host(host.into())?;
    }

    for group_doc in doc.groups {
        check_name("group", &group_doc.name)?;
        let mut group = HostGroup::new(group_doc.name);
        for (key, value) in group_doc.vars {
            group.set_var(key, value);
        }
        for host in group_doc.hosts {
            group.insert_host(host.into())?;
        }
        inventory.push_group(group);
    }

    Ok(inventory)
}

const ALL_GROUP: &str = "all";
const UNGROUPED_GROUP: &str = "ungrouped";
const META_KEY: &str = "_meta";

/// One `--list` entry, accumulated over every section with the same name
#[derive(Default)]
struct ListEntry<'a> {
    hosts: Vec<&'a str>,
    vars: BTreeMap<String, String>,
}

impl<'a> ListEntry<'a> {
    /// Append unseen hosts; on a variable clash the earlier section wins
    fn merge(&mut self, hosts: &'a [Host], vars: &BTreeMap<String, String>) {
        for host in hosts {
            if !self.hosts.contains(&host.name.as_str()) {
                self.hosts.push(&host.name);
            }
        }
        for (key, value) in vars {
            self.vars.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

/// Variables of every entry for `name`, the first entry winning on a clash
fn merged_host_vars(inventory: &Inventory, name: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    let entries = inventory
        .ungrouped_hosts()
        .iter()
        .chain(inventory.groups().iter().flat_map(|g| g.hosts().iter()))
        .filter(|h| h.name == name);

    for host in entries {
        for (key, value) in &host.vars {
            vars.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    vars
}

/// Ansible `--list` output: one entry per group name, `ungrouped` when it has
/// hosts, `all` with its `children`, and `_meta.hostvars` for hosts that
/// carry variables.
///
/// Sections sharing a name are merged. A section named `ungrouped` merges
/// with the hosts listed before the first header, and one named `all`
/// contributes hosts and vars to the `all` entry. A group named `_meta`
/// cannot be represented and is an error.
pub fn list_json(inventory: &Inventory) -> Result<JsonValue, DrinvError> {
    let mut order: Vec<&str> = Vec::new();
    let mut entries: BTreeMap<&str, ListEntry> = BTreeMap::new();

    for group in inventory.groups() {
        if group.name() == META_KEY {
            return Err(DrinvError::Inventory {
                message: format!("Group name '{}' is reserved in --list output", META_KEY),
                suggestion: Some(format!("Rename the [{}] group", META_KEY)),
            });
        }
        if !entries.contains_key(group.name()) {
            order.push(group.name());
        }
        entries
            .entry(group.name())
            .or_default()
            .merge(group.hosts(), group.vars());
    }

    if !inventory.ungrouped_hosts().is_empty() {
        if !entries.contains_key(UNGROUPED_GROUP) {
            order.push(UNGROUPED_GROUP);
        }
        entries
            .entry(UNGROUPED_GROUP)
            .or_default()
            .merge(inventory.ungrouped_hosts(), &BTreeMap::new());
    }

    let mut out = Map::new();
    let mut children: Vec<&str> = Vec::new();

    for name in order.iter().copied().filter(|n| *n != ALL_GROUP) {
        let entry = &entries[name];
        out.insert(
            name.to_string(),
            json!({ "hosts": entry.hosts, "vars": entry.vars }),
        );
        children.push(name);
    }

    let mut all = json!({ "children": children });
    if let Some(entry) = entries.get(ALL_GROUP) {
        all["hosts"] = json!(entry.hosts);
        all["vars"] = json!(entry.vars);
    }
    out.insert(ALL_GROUP.to_string(), all);

    let mut hostvars = Map::new();
    for name in inventory.host_names() {
        let vars = merged_host_vars(inventory, name);
        if !vars.is_empty() {
            hostvars.insert(name.to_string(), json!(vars));
        }
    }
    out.insert(META_KEY.to_string(), json!({ "hostvars": hostvars }));

    Ok(JsonValue::Object(out))
}

/// Ansible `--host <name>` output: the host's own variables, `{}` if unknown.
/// A host listed more than once gets the union of its entries' variables.
pub fn host_json(inventory: &Inventory, name: &str) -> JsonValue {
    json!(merged_host_vars(inventory, name))
}

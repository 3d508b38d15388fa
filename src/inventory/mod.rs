// Inventory model: groups of hosts and their text format

mod dynamic;
mod groups;
mod lexer;
mod parser;
mod writer;

pub use dynamic::*;
pub use groups::*;
pub use lexer::*;
pub use parser::*;
pub use writer::*;

pub use crate::output::errors::{ParseError, ParseErrorKind};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::output::errors::DrinvError;

/// A single host in the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub vars: BTreeMap<String, String>,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Host {
            name: name.into(),
            vars: BTreeMap::new(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

/// True when `name` lexes as exactly one name token, so it is written and
/// read back unchanged by the text format
pub fn is_valid_name(name: &str) -> bool {
    match lex(name).as_slice() {
        [token, end] => {
            token.is(TokenKind::String) && token.text == name && end.is(TokenKind::EndOfLine)
        }
        _ => false,
    }
}

fn check_name(what: &str, name: &str) -> Result<(), DrinvError> {
    if is_valid_name(name) {
        return Ok(());
    }
    Err(DrinvError::Inventory {
        message: format!("Invalid {} name '{}'", what, name),
        suggestion: Some(
            "Names must be non-empty and contain no whitespace, '[', ']', ':' or '='".to_string(),
        ),
    })
}

/// Append `host` unless a host with the same name is already present
fn insert_unique(hosts: &mut Vec<Host>, host: Host) -> bool {
    if hosts.iter().any(|h| h.name == host.name) {
        return false;
    }
    hosts.push(host);
    true
}

/// A named group of hosts. Host names are unique within a group and keep
/// their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostGroup {
    name: String,
    hosts: Vec<Host>,
    vars: BTreeMap<String, String>,
}

impl HostGroup {
    pub fn new(name: impl Into<String>) -> Self {
        HostGroup {
            name: name.into(),
            hosts: Vec::new(),
            vars: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Add a host by name. Returns false if the name was already present.
    pub fn add_host(&mut self, name: impl Into<String>) -> Result<bool, DrinvError> {
        self.insert_host(Host::new(name))
    }

    /// Add a host with its variables. Returns false (and keeps the existing
    /// entry) if the name was already present.
    pub fn insert_host(&mut self, host: Host) -> Result<bool, DrinvError> {
        check_name("host", &host.name)?;
        Ok(self.push_unique(host))
    }

    /// Insert a host whose name came from a lexed name token
    fn push_unique(&mut self, host: Host) -> bool {
        insert_unique(&mut self.hosts, host)
    }

    pub fn remove_host(&mut self, name: &str) -> Option<Host> {
        let idx = self.hosts.iter().position(|h| h.name == name)?;
        Some(self.hosts.remove(idx))
    }

    pub fn contains_host(&self, name: &str) -> bool {
        self.hosts.iter().any(|h| h.name == name)
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name == name)
    }

    pub fn host_names(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|h| h.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub(crate) fn into_hosts(self) -> Vec<Host> {
        self.hosts
    }
}

/// The complete inventory: hosts listed before any header, then the groups
/// in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    source_path: Option<PathBuf>,
    groups: Vec<HostGroup>,
    ungrouped: Vec<Host>,
}

impl Inventory {
    pub fn new() -> Self {
        Inventory::default()
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Load and parse an inventory file
    pub fn from_file(path: &Path) -> Result<Self, DrinvError> {
        Self::from_file_with(path, &ParseOptions::default())
    }

    /// Load and parse an inventory file with explicit parse options
    pub fn from_file_with(path: &Path, options: &ParseOptions) -> Result<Self, DrinvError> {
        let content = std::fs::read_to_string(path).map_err(|e| DrinvError::Io {
            message: format!("Failed to read inventory file: {}", e),
            path: Some(path.to_path_buf()),
        })?;

        let inventory = parse_with(&content, options).map_err(|e| {
            DrinvError::from(e)
                .with_file(path)
                .with_source(content.as_str())
        })?;

        tracing::info!(
            path = %path.display(),
            groups = inventory.groups.len(),
            ungrouped = inventory.ungrouped.len(),
            "loaded inventory"
        );

        Ok(inventory.with_source_path(path))
    }

    /// Parse inventory text with default options
    pub fn parse_str(content: &str) -> Result<Self, ParseError> {
        parse(content)
    }

    /// Render the inventory in the bracketed text format
    pub fn to_ini_string(&self) -> String {
        serialize(self)
    }

    /// Write the inventory to `path` in the text format.
    ///
    /// The content goes to a temporary file next to `path` which is then
    /// renamed over it, so readers never observe a half-written file.
    pub fn save(&self, path: &Path) -> Result<(), DrinvError> {
        let content = self.to_ini_string();
        write_atomic(path, &content)?;

        tracing::info!(path = %path.display(), bytes = content.len(), "saved inventory");
        Ok(())
    }

    pub fn groups(&self) -> &[HostGroup] {
        &self.groups
    }

    pub fn ungrouped_hosts(&self) -> &[Host] {
        &self.ungrouped
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.ungrouped.is_empty()
    }

    /// First group with the given name
    pub fn group(&self, name: &str) -> Option<&HostGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut HostGroup> {
        self.groups.iter_mut().find(|g| g.name == name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    /// Get the group named `name`, appending an empty one if it does not exist
    pub fn add_group(&mut self, name: &str) -> Result<&mut HostGroup, DrinvError> {
        let idx = match self.groups.iter().position(|g| g.name == name) {
            Some(idx) => idx,
            None => {
                check_name("group", name)?;
                self.groups.push(HostGroup::new(name));
                self.groups.len() - 1
            }
        };
        Ok(&mut self.groups[idx])
    }

    /// Remove the first group named `name`
    pub fn remove_group(&mut self, name: &str) -> Option<HostGroup> {
        let idx = self.groups.iter().position(|g| g.name == name)?;
        Some(self.groups.remove(idx))
    }

    /// Append a group as-is, even if another group has the same name
    pub(crate) fn push_group(&mut self, group: HostGroup) {
        self.groups.push(group);
    }

    /// Add `host` to `group`, creating the group if needed.
    /// Returns false if the group already listed the host.
    pub fn add_host(&mut self, group: &str, host: impl Into<String>) -> Result<bool, DrinvError> {
        let host = Host::new(host);
        check_name("host", &host.name)?;
        self.add_group(group)?.insert_host(host)
    }

    /// Add a host that belongs to no group. Returns false if already listed.
    pub fn add_ungrouped_host(&mut self, name: impl Into<String>) -> Result<bool, DrinvError> {
        self.insert_ungrouped_host(Host::new(name))
    }

    pub fn insert_ungrouped_host(&mut self, host: Host) -> Result<bool, DrinvError> {
        check_name("host", &host.name)?;
        Ok(self.push_ungrouped(host))
    }

    /// Insert an ungrouped host whose name came from a lexed name token
    fn push_ungrouped(&mut self, host: Host) -> bool {
        insert_unique(&mut self.ungrouped, host)
    }

    /// Remove a host from every group and from the ungrouped list.
    /// Returns the number of entries removed.
    pub fn remove_host(&mut self, name: &str) -> usize {
        let mut removed = 0;

        let before = self.ungrouped.len();
        self.ungrouped.retain(|h| h.name != name);
        removed += before - self.ungrouped.len();

        for group in &mut self.groups {
            if group.remove_host(name).is_some() {
                removed += 1;
            }
        }

        removed
    }

    /// Host names of the first group called `name`, in file order
    pub fn hosts_in_group(&self, name: &str) -> Option<Vec<&str>> {
        self.group(name).map(|g| g.host_names().collect())
    }

    /// Every distinct host name, in order of first appearance
    pub fn host_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all = self
            .ungrouped
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.hosts.iter()));

        for host in all {
            if !names.contains(&host.name.as_str()) {
                names.push(&host.name);
            }
        }
        names
    }

    /// Names of the groups that list `host`
    pub fn groups_of_host(&self, host: &str) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| g.contains_host(host))
            .map(|g| g.name.as_str())
            .collect()
    }

    /// First occurrence of a host, ungrouped hosts first
    pub fn host(&self, name: &str) -> Option<&Host> {
        self.ungrouped
            .iter()
            .find(|h| h.name == name)
            .or_else(|| self.groups.iter().find_map(|g| g.host(name)))
    }
}

/// Write `content` to `path` through a sibling temporary file and a rename
pub fn write_atomic(path: &Path, content: &str) -> Result<(), DrinvError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| DrinvError::Io {
            message: "Inventory path has no file name".to_string(),
            path: Some(path.to_path_buf()),
        })?;

    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    std::fs::write(&tmp_path, content).map_err(|e| DrinvError::Io {
        message: format!("Failed to write inventory file: {}", e),
        path: Some(tmp_path.clone()),
    })?;

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        DrinvError::Io {
            message: format!("Failed to replace inventory file: {}", e),
            path: Some(path.to_path_buf()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_inventory() -> Inventory {
        let mut inv = Inventory::new();
        inv.add_ungrouped_host("bastion").unwrap();
        inv.add_host("web", "web1").unwrap();
        inv.add_host("web", "web2").unwrap();
        inv.add_host("db", "db1").unwrap();
        inv.add_host("db", "web1").unwrap();
        inv
    }

    #[test]
    fn test_add_existing_host_is_noop() {
        let mut inv = create_test_inventory();
        assert!(!inv.add_host("web", "web1").unwrap());
        assert_eq!(inv.group("web").unwrap().len(), 2);
    }

    #[test]
    fn test_add_group_returns_existing() {
        let mut inv = create_test_inventory();
        inv.add_group("web").unwrap().set_var("http_port", "80");
        assert_eq!(inv.groups().len(), 2);
        assert_eq!(
            inv.group("web").unwrap().vars().get("http_port").map(String::as_str),
            Some("80")
        );
    }

    #[test]
    fn test_remove_group() {
        let mut inv = create_test_inventory();
        let removed = inv.remove_group("web").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(inv.group("web").is_none());
        assert!(inv.remove_group("web").is_none());
    }

    #[test]
    fn test_remove_host_everywhere() {
        let mut inv = create_test_inventory();
        assert_eq!(inv.remove_host("web1"), 2);
        assert_eq!(inv.hosts_in_group("web"), Some(vec!["web2"]));
        assert_eq!(inv.hosts_in_group("db"), Some(vec!["db1"]));
        assert_eq!(inv.remove_host("missing"), 0);
    }

    #[test]
    fn test_ungrouped_hosts_are_unique() {
        let mut inv = Inventory::new();
        assert!(inv.add_ungrouped_host("solo").unwrap());
        assert!(!inv.add_ungrouped_host("solo").unwrap());
        assert_eq!(inv.ungrouped_hosts().len(), 1);
    }

    #[test]
    fn test_host_names_are_distinct() {
        let inv = create_test_inventory();
        assert_eq!(inv.host_names(), vec!["bastion", "web1", "web2", "db1"]);
    }

    #[test]
    fn test_groups_of_host() {
        let inv = create_test_inventory();
        assert_eq!(inv.groups_of_host("web1"), vec!["web", "db"]);
        assert!(inv.groups_of_host("bastion").is_empty());
    }

    #[test]
    fn test_host_lookup_keeps_vars() {
        let mut inv = Inventory::new();
        inv.add_group("app")
            .unwrap()
            .insert_host(Host::new("app1").with_var("ansible_user", "deploy"))
            .unwrap();

        assert_eq!(inv.host("app1").unwrap().get_var("ansible_user"), Some("deploy"));
        assert!(inv.host("nope").is_none());
    }

    #[test]
    fn test_insert_host_keeps_first_entry() {
        let mut group = HostGroup::new("app");
        group
            .insert_host(Host::new("app1").with_var("role", "primary"))
            .unwrap();
        assert!(!group
            .insert_host(Host::new("app1").with_var("role", "replica"))
            .unwrap());
        assert_eq!(group.host("app1").unwrap().get_var("role"), Some("primary"));
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("web1"));
        assert!(is_valid_name("db-01.example.com"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("db 01"));
        assert!(!is_valid_name(" web1"));
        assert!(!is_valid_name("a]b"));
        assert!(!is_valid_name("[web]"));
        assert!(!is_valid_name("web:children"));
        assert!(!is_valid_name("ansible_host=10.0.0.1"));
        assert!(!is_valid_name("web1\nweb2"));
    }

    #[test]
    fn test_add_host_rejects_names_the_format_cannot_hold() {
        let mut inv = create_test_inventory();
        let before = inv.to_ini_string();

        for bad in ["", "db 01", "a]b"] {
            let err = inv.add_host("web", bad).unwrap_err();
            assert!(matches!(err, DrinvError::Inventory { .. }), "{:?}", bad);
            assert!(inv.add_ungrouped_host(bad).is_err());
            assert!(inv.add_group(bad).is_err());
        }

        // A bad host name must not create its group as a side effect
        assert!(inv.add_host("new", "db 01").is_err());
        assert!(inv.group("new").is_none());
        // Nor may a bad group name be created to hold a good host
        assert!(inv.add_host("a]b", "ok").is_err());

        assert_eq!(inv.to_ini_string(), before);
        assert_eq!(
            parse(&inv.to_ini_string()).unwrap().to_ini_string(),
            before
        );
    }

    #[test]
    fn test_group_insert_host_rejects_invalid_name() {
        let mut group = HostGroup::new("app");
        assert!(group.add_host("").is_err());
        assert!(group.insert_host(Host::new("app 1")).is_err());
        assert!(group.is_empty());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");

        let inv = create_test_inventory();
        inv.save(&path).unwrap();

        let loaded = Inventory::from_file(&path).unwrap();
        assert_eq!(loaded.source_path(), Some(path.as_path()));
        assert_eq!(loaded.to_ini_string(), inv.to_ini_string());
        assert!(!dir.path().join(".hosts.tmp").exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Inventory::from_file(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, DrinvError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_file_reports_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        std::fs::write(&path, "[web]\nweb1 extra\n").unwrap();

        let err = Inventory::from_file(&path).unwrap_err();
        let parse_err = err.parse_error().unwrap();
        assert_eq!(parse_err.token.text, "extra");
        assert!(matches!(err, DrinvError::Parse { file: Some(_), source: Some(_), .. }));
    }
}

// Host pattern matching and filtering for inventory queries

use regex::Regex;

use super::Inventory;

/// Which hosts a query selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Every host in the inventory
    All,
    /// Hosts listed before the first group header
    Ungrouped,
    /// A group name, or a host name when no such group exists
    Name(String),
    /// Glob over group and host names (`*` and `?`)
    Wildcard(String),
    /// Union of comma-separated patterns
    Union(Vec<HostPattern>),
}

/// Parse a host pattern string into a HostPattern
pub fn parse_host_pattern(pattern: &str) -> HostPattern {
    let pattern = pattern.trim();

    if pattern.contains(',') {
        let parts: Vec<HostPattern> = pattern
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(parse_host_pattern)
            .collect();

        return match parts.len() {
            0 => HostPattern::All,
            1 => parts.into_iter().next().unwrap_or(HostPattern::All),
            _ => HostPattern::Union(parts),
        };
    }

    match pattern {
        "" | "all" | "*" => HostPattern::All,
        "ungrouped" => HostPattern::Ungrouped,
        p if p.contains('*') || p.contains('?') => HostPattern::Wildcard(p.to_string()),
        p => HostPattern::Name(p.to_string()),
    }
}

/// Compile a `*`/`?` glob into an anchored regex
fn wildcard_regex(glob: &str) -> Option<Regex> {
    let mut re = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

impl Inventory {
    /// Distinct host names matching `pattern`, in order of first appearance
    pub fn select(&self, pattern: &HostPattern) -> Vec<&str> {
        let mut selected: Vec<&str> = Vec::new();
        self.collect_matches(pattern, &mut selected);
        selected
    }

    fn collect_matches<'a>(&'a self, pattern: &HostPattern, out: &mut Vec<&'a str>) {
        let push = |name: &'a str, out: &mut Vec<&'a str>| {
            if !out.contains(&name) {
                out.push(name);
            }
        };

        match pattern {
            HostPattern::All => {
                for name in self.host_names() {
                    push(name, out);
                }
            }
            HostPattern::Ungrouped => {
                for host in self.ungrouped_hosts() {
                    push(host.name.as_str(), out);
                }
            }
            HostPattern::Name(name) => {
                let groups: Vec<_> = self
                    .groups()
                    .iter()
                    .filter(|g| g.name() == name.as_str())
                    .collect();
                if groups.is_empty() {
                    if let Some(host) = self.host(name) {
                        push(host.name.as_str(), out);
                    }
                } else {
                    for host in groups.into_iter().flat_map(|g| g.host_names()) {
                        push(host, out);
                    }
                }
            }
            HostPattern::Wildcard(glob) => {
                let Some(re) = wildcard_regex(glob) else {
                    return;
                };
                for group in self.groups() {
                    if re.is_match(group.name()) {
                        for host in group.host_names() {
                            push(host, out);
                        }
                    }
                }
                for name in self.host_names() {
                    if re.is_match(name) {
                        push(name, out);
                    }
                }
            }
            HostPattern::Union(parts) => {
                for part in parts {
                    self.collect_matches(part, out);
                }
            }
        }
    }
}

/// Filter options for host selection
#[derive(Debug, Clone, Default)]
pub struct HostFilter {
    /// Limit to specific hosts
    pub limit: Option<Vec<String>>,
    /// Exclude specific hosts
    pub exclude: Option<Vec<String>>,
}

impl HostFilter {
    pub fn new() -> Self {
        HostFilter::default()
    }

    pub fn with_limit(mut self, hosts: Vec<String>) -> Self {
        self.limit = Some(hosts);
        self
    }

    pub fn with_exclude(mut self, hosts: Vec<String>) -> Self {
        self.exclude = Some(hosts);
        self
    }

    pub fn apply<'a>(&self, hosts: Vec<&'a str>) -> Vec<&'a str> {
        let mut result = hosts;

        if let Some(ref limit) = self.limit {
            result.retain(|h| limit.iter().any(|l| l.as_str() == *h));
        }

        if let Some(ref exclude) = self.exclude {
            result.retain(|h| !exclude.iter().any(|e| e.as_str() == *h));
        }

        result
    }
}

// Text-format writer for inventories

use super::Inventory;

/// Render an inventory in the bracketed text format.
///
/// Ungrouped hosts come first, one per line, followed by a blank line when
/// groups follow. Each group is written as a `[name]` header, its hosts one
/// per line, and a blank separator line.
///
/// Group and host variables are not written: the format has no syntax for
/// them. Use [`to_json`](super::to_json) when variables must survive.
pub fn serialize(inventory: &Inventory) -> String {
    let mut output = String::new();

    for host in inventory.ungrouped_hosts() {
        output.push_str(&host.name);
        output.push('\n');
    }

    if !inventory.ungrouped_hosts().is_empty() && !inventory.groups().is_empty() {
        output.push('\n');
    }

    for group in inventory.groups() {
        output.push('[');
        output.push_str(group.name());
        output.push_str("]\n");

        for host in group.hosts() {
            output.push_str(&host.name);
            output.push('\n');
        }

        output.push('\n');
    }

    output
}

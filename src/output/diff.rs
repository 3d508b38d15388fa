// Unified diff between an inventory file and its canonical form

use similar::{ChangeTag, TextDiff};

/// Unified diff (3 lines of context) from `current` to `canonical`
pub fn format_check_diff(path_label: &str, current: &str, canonical: &str) -> String {
    let diff = TextDiff::from_lines(current, canonical);
    let formatted_label = format!("{} (formatted)", path_label);

    let mut unified = diff.unified_diff();
    unified.context_radius(3).header(path_label, &formatted_label);
    unified.to_string()
}

/// Count of added and removed lines between two texts
pub fn diff_line_counts(current: &str, canonical: &str) -> (usize, usize) {
    let diff = TextDiff::from_lines(current, canonical);

    let mut additions = 0;
    let mut deletions = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => additions += 1,
            ChangeTag::Delete => deletions += 1,
            ChangeTag::Equal => {}
        }
    }

    (additions, deletions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_diff() {
        let current = "[web]\n  web1\nweb2\n";
        let canonical = "[web]\nweb1\nweb2\n\n";

        let diff = format_check_diff("hosts", current, canonical);

        assert!(diff.contains("--- hosts"));
        assert!(diff.contains("+++ hosts (formatted)"));
        assert!(diff.contains("-  web1"));
        assert!(diff.contains("+web1"));
    }

    #[test]
    fn test_line_counts() {
        let (added, removed) = diff_line_counts("a\nb\n", "a\nc\nd\n");
        assert_eq!((added, removed), (2, 1));
    }

    #[test]
    fn test_no_changes() {
        let text = "[web]\nweb1\n\n";
        assert_eq!(diff_line_counts(text, text), (0, 0));
    }
}

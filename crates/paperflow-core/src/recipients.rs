//! Recipient list parsing

/// Split a comma-separated recipient list.
///
/// Entries are trimmed and empty entries dropped. Duplicates are kept, in input order,
/// since each one becomes its own acknowledgment.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

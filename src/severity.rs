//! severity policy deciding which alerts are forwarded

/// decision for a single alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// forward the alert to pushbullet
    Notify,
    /// take no action
    Ignore,
}

/// Maps a `severity` label to a notify/skip decision, case-insensitively.
/// Alerts without a severity label carry the empty string and fall into the
/// ignore branch.
///
/// WARNING alerts are forwarded. The previous revision logged them as
/// skipped while still sending them; the sending behavior is what operators
/// relied on, so that is what stays.
pub fn action(severity: &str) -> Action {
    match severity.to_uppercase().as_str() {
        "CRITICAL" | "WARNING" => Action::Notify,
        _ => Action::Ignore,
    }
}

//! Redirect target matching.

use url::Url;

/// Where a terminal URL landed relative to the session's redirect targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    Success,
    Cancel,
    Unrecognized,
}

/// True when `url` points at `target`, ignoring query and fragment.
///
/// Scheme and host compare case-insensitively; the port is part of the
/// host identity, with explicit default ports equal to implicit ones. A
/// trailing `/` on the path is not significant.
pub fn matches_target(url: &Url, target: &Url) -> bool {
    url.scheme().eq_ignore_ascii_case(target.scheme())
        && host_of(url) == host_of(target)
        && url.port_or_known_default() == target.port_or_known_default()
        && normalized_path(url) == normalized_path(target)
}

/// Classify a terminal URL against the success and cancel targets.
///
/// Success wins if both targets are identical.
pub fn classify_redirect(url: &Url, success_target: &Url, cancel_target: &Url) -> RedirectKind {
    if matches_target(url, success_target) {
        RedirectKind::Success
    } else if matches_target(url, cancel_target) {
        RedirectKind::Cancel
    } else {
        RedirectKind::Unrecognized
    }
}

/// The `linked_account` query value of a success redirect, if any.
pub fn linked_account_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "linked_account")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn host_of(url: &Url) -> Option<String> {
    url.host_str().map(|host| host.to_ascii_lowercase())
}

fn normalized_path(url: &Url) -> &str {
    url.path().trim_end_matches('/')
}

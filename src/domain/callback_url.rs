//! Callback URL clean-up applied to configured URLs before they enter a field map.
//!
//! Kept apart from signing: the signer hashes whatever it is given.

/// Adds `https://` to a URL that lacks a scheme, removing stray `://`, `//` or `:`
/// prefixes first. Values that already declare a scheme are returned trimmed.
pub fn normalize_url(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() || has_scheme(s) {
        return s.to_string();
    }
    let host = s.trim_start_matches([':', '/']);
    format!("https://{host}")
}

/// Collapses malformed scheme sequences such as `https://://host` or
/// `https://https://host` into a single leading `https://`.
pub fn sanitize_outgoing_url(url: &str) -> String {
    let mut s = url.to_string();
    while s.contains("://://") {
        s = s.replace("://://", "://");
    }

    let mut rest = s.as_str();
    let mut had_scheme = false;
    while let Some(stripped) = strip_http_scheme(rest) {
        rest = stripped;
        had_scheme = true;
    }
    if had_scheme {
        format!("https://{rest}")
    } else {
        s
    }
}

/// Normalizes then sanitizes. The flag reports whether the value changed.
pub fn prepare_callback_url(raw: &str) -> (String, bool) {
    let cleaned = sanitize_outgoing_url(&normalize_url(raw));
    let changed = cleaned != raw;
    (cleaned, changed)
}

fn has_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn strip_http_scheme(s: &str) -> Option<&str> {
    ["https://", "http://"].iter().find_map(|scheme| {
        s.get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| &s[scheme.len()..])
    })
}

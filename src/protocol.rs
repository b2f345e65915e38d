use std::collections::BTreeSet;

/// URI schemes allowed through by [`ProtocolFilter::default`].
pub const DEFAULT_ALLOWED_PROTOCOLS: &[&str] = &[
    "ftp", "http", "https", "irc", "mailto", "news", "nntp", "rtsp", "sftp", "ssh", "tel",
    "telnet", "webcal",
];

/// Allow-list of URI schemes that may survive in a URL-bearing value.
///
/// Any scheme not on the list is treated as dangerous and removed by
/// [`strip`](Self::strip). Scheme names are matched case-insensitively.
///
/// # Examples
///
/// ```
/// use safe_markup::ProtocolFilter;
///
/// let filter = ProtocolFilter::default();
/// assert_eq!(filter.strip("javascript:alert(1)"), "alert(1)");
/// assert_eq!(filter.strip("https://example.com"), "https://example.com");
///
/// let strict = ProtocolFilter::new(["https"]);
/// assert_eq!(strict.strip("http://example.com"), "//example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolFilter {
    allowed: BTreeSet<String>,
}

impl ProtocolFilter {
    /// Creates a filter allowing exactly the given schemes.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|scheme| scheme.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Returns `true` if `scheme` is on the allow-list.
    pub fn allows(&self, scheme: &str) -> bool {
        self.allowed.contains(&scheme.to_ascii_lowercase())
    }

    /// Iterates over the allowed schemes in sorted order.
    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// Removes every disallowed scheme prefix from a URL-shaped string.
    ///
    /// Repeats until nothing changes, so `javascript:javascript:x` is reduced
    /// all the way to `x`. A prefix containing `/`, `?` or `#` is part of a
    /// path, query or fragment and ends the scan. This does not check that
    /// the result is a well-formed URL.
    pub fn strip(&self, uri: &str) -> String {
        let mut rest = uri;
        loop {
            let Some(colon) = rest.find(':') else {
                break;
            };
            if colon == 0 {
                break;
            }
            let scheme = &rest[..colon];
            if scheme.contains(['/', '?', '#']) || self.allows(scheme) {
                break;
            }
            rest = &rest[colon + 1..];
        }
        rest.to_string()
    }
}

impl Default for ProtocolFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_PROTOCOLS)
    }
}

/// Strips dangerous schemes using the default allow-list.
pub fn strip_dangerous_protocols(uri: &str) -> String {
    ProtocolFilter::default().strip(uri)
}

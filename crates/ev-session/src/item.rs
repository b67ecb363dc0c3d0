//! Votable item identity.

use percent_encoding::percent_decode_str;

/// Redirect wrapper the host site puts around external editorial links.
pub const JUMP_PREFIX: &str = "https://atcoder.jp/jump?url=";

/// Recover the true destination of an editorial link.
///
/// Links wrapped in the host's redirect are unwrapped and percent-decoded;
/// anything else is returned unchanged.
pub fn canonicalize_editorial_link(url: &str) -> String {
    match url.strip_prefix(JUMP_PREFIX) {
        Some(encoded) => percent_decode_str(encoded).decode_utf8_lossy().into_owned(),
        None => url.to_string(),
    }
}

/// One editorial link on the page.
///
/// Links that canonicalize to the same URL are the same editorial on the
/// backend, but each occurrence on the page is tracked as its own item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VotableItem {
    raw: String,
    editorial: String,
}

impl VotableItem {
    pub fn from_link(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let editorial = canonicalize_editorial_link(&raw);
        Self { raw, editorial }
    }

    /// Canonical editorial URL, the backend's key for this item.
    pub fn editorial(&self) -> &str {
        &self.editorial
    }

    /// Link as it appeared on the page.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

//! Remote URL canonicalization for `clone` and `web` tags.
//!
//! Clients expect an HTTPS clone URL first. SSH remotes are rewritten to the
//! equivalent HTTPS form, and the original SSH URL is kept as a second clone
//! entry so both transports stay discoverable.

use serde::{Deserialize, Serialize};

const GITHUB_SSH_PREFIX: &str = "git@github.com:";
const HTTPS_SCHEME: &str = "https://";

/// Clone and web URLs derived from a single remote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneUrls {
    /// Canonical HTTPS form first, then the original form if it differs
    pub clone: Vec<String>,
    pub web: Option<String>,
}

/// Rewrite a remote into its HTTPS form.
///
/// Returns `None` when the remote is neither HTTPS nor scp-style SSH.
pub fn to_https(remote: &str) -> Option<String> {
    if remote.starts_with(HTTPS_SCHEME) {
        return Some(remote.to_string());
    }

    if let Some(path) = remote.strip_prefix(GITHUB_SSH_PREFIX) {
        return Some(format!("https://github.com/{path}"));
    }

    let (host, path) = split_scp_like(remote)?;
    Some(format!("https://{host}/{path}"))
}

/// Split `user@host:path` into `(host, path)`
fn split_scp_like(remote: &str) -> Option<(&str, &str)> {
    if remote.contains("://") {
        return None;
    }

    let (authority, path) = remote.split_once(':')?;
    if authority.contains('/') {
        return None;
    }

    let (user, host) = authority.rsplit_once('@')?;
    if user.is_empty() || host.is_empty() || path.is_empty() {
        return None;
    }

    Some((host, path))
}

/// Browsable URL for an HTTPS clone URL: one trailing `.git` removed
pub fn web_url(https_url: &str) -> Option<String> {
    let web = https_url.strip_suffix(".git").unwrap_or(https_url);
    web.starts_with(HTTPS_SCHEME).then(|| web.to_string())
}

/// Expand a remote into the ordered clone URLs and the optional web URL
pub fn canonicalize(remote: &str) -> CloneUrls {
    match to_https(remote) {
        Some(https) => {
            let web = web_url(&https);
            let mut clone = vec![https];
            if clone[0] != remote {
                clone.push(remote.to_string());
            }
            CloneUrls { clone, web }
        }
        None => CloneUrls {
            clone: vec![remote.to_string()],
            web: None,
        },
    }
}

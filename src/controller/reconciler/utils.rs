//! # Utilities
//!
//! Repository URL normalization used when matching Git sources.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// SCP-style Git remote, e.g. `git@github.com:example/repo.git`
static SCP_LIKE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([\w.+-]+)@)?([\w-]+(?:\.[\w-]+)*):(.*)$")
        .expect("Failed to compile SCP-style URL regex - this should never happen")
});

/// Normalize a Git repository URL for equality comparison
///
/// Lowercases and trims the URL and rewrites SCP-style remotes to `ssh://`
/// form. The path loses a trailing `/` and then a trailing `.git`; the
/// query, default ports and the rest of the URL are normalized by
/// [`Url`]. Input that is neither a URL nor an SCP-style remote is returned
/// unchanged.
///
/// ```
/// use argocd_update::controller::reconciler::normalize_git_url;
///
/// assert_eq!(
///     normalize_git_url("https://GitHub.com/Example/Repo.git/"),
///     "https://github.com/example/repo"
/// );
/// assert_eq!(
///     normalize_git_url("git@github.com:example/repo.git"),
///     "ssh://git@github.com/example/repo"
/// );
/// ```
#[must_use]
pub fn normalize_git_url(repo_url: &str) -> String {
    let lowered = repo_url.trim().to_lowercase();

    if lowered.contains("://") {
        return normalize_url(&lowered).unwrap_or_else(|| repo_url.to_string());
    }

    if let Some(caps) = SCP_LIKE_URL.captures(&lowered) {
        let user = caps
            .get(1)
            .map(|u| format!("{}@", u.as_str()))
            .unwrap_or_default();
        let host = &caps[2];
        let path = caps[3].trim_start_matches('/');
        return normalize_url(&format!("ssh://{user}{host}/{path}"))
            .unwrap_or_else(|| repo_url.to_string());
    }

    repo_url.to_string()
}

fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    let path = url.path();
    let path = path.strip_suffix('/').unwrap_or(path);
    let path = path.strip_suffix(".git").unwrap_or(path).to_string();
    url.set_path(&path);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_https_variants() {
        let expected = "https://github.com/example/repo";
        assert_eq!(normalize_git_url("https://github.com/example/repo"), expected);
        assert_eq!(normalize_git_url("https://github.com/example/repo.git"), expected);
        assert_eq!(normalize_git_url("https://github.com/example/repo/"), expected);
        assert_eq!(normalize_git_url(" HTTPS://GitHub.com/Example/Repo.git "), expected);
    }

    #[test]
    fn test_normalize_scp_like() {
        assert_eq!(
            normalize_git_url("git@github.com:example/repo.git"),
            normalize_git_url("ssh://git@github.com/example/repo")
        );
        assert_eq!(
            normalize_git_url("github.com:example/repo"),
            "ssh://github.com/example/repo"
        );
    }

    #[test]
    fn test_normalize_trims_path_only() {
        assert_eq!(
            normalize_git_url("https://github.com/example/repo.git?x=1"),
            "https://github.com/example/repo?x=1"
        );
        assert_eq!(
            normalize_git_url("https://github.com/example/repo/?x=1"),
            normalize_git_url("https://github.com/example/repo?x=1")
        );
    }

    #[test]
    fn test_normalize_drops_default_port() {
        assert_eq!(
            normalize_git_url("https://github.com:443/example/repo.git"),
            normalize_git_url("https://github.com/example/repo")
        );
        assert_ne!(
            normalize_git_url("https://github.com:8443/example/repo"),
            normalize_git_url("https://github.com/example/repo")
        );
    }

    #[test]
    fn test_normalize_distinguishes_repos() {
        assert_ne!(
            normalize_git_url("https://github.com/example/repo"),
            normalize_git_url("https://github.com/example/other")
        );
    }

    #[test]
    fn test_normalize_unparseable_unchanged() {
        assert_eq!(normalize_git_url("Not A URL"), "Not A URL");
        assert_eq!(normalize_git_url(""), "");
        assert_eq!(normalize_git_url("://nothing"), "://nothing");
    }
}

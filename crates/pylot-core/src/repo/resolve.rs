//! Controller-side revision resolution.
//!
//! A symbolic branch or tag is pinned to a concrete commit id before any
//! remote command is built. This avoids the race between resolution and
//! execution that "sync to branch HEAD" would have.

use anyhow::{Context, Result, bail};
use git2::Direction;
use tracing::debug;

/// Resolve a branch, tag, or commit reference against a remote URL.
///
/// A full 40-hex commit id is returned as-is without touching the network.
pub fn resolve_revision(repository: &str, reference: &str) -> Result<String> {
    if is_commit_id(reference) {
        return Ok(reference.to_ascii_lowercase());
    }
    let mut remote = git2::Remote::create_detached(repository)
        .with_context(|| format!("Invalid repository URL: {repository}"))?;
    remote
        .connect(Direction::Fetch)
        .with_context(|| format!("Failed to contact repository: {repository}"))?;
    let refs: Vec<(String, String)> = remote
        .list()
        .context("Failed to list remote references")?
        .iter()
        .map(|head| (head.name().to_string(), head.oid().to_string()))
        .collect();
    match match_reference(&refs, reference) {
        Some(oid) => {
            debug!(%repository, %reference, %oid, "resolved revision");
            Ok(oid)
        }
        None => bail!("Reference '{reference}' not found in {repository}"),
    }
}

fn is_commit_id(reference: &str) -> bool {
    reference.len() == 40 && reference.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Pick the commit id for a symbolic reference from a remote ref listing.
///
/// Peeled tag entries (`refs/tags/<t>^{}`) win over the tag object itself.
fn match_reference(refs: &[(String, String)], reference: &str) -> Option<String> {
    let candidates = [
        format!("refs/heads/{reference}"),
        format!("refs/tags/{reference}^{{}}"),
        format!("refs/tags/{reference}"),
        reference.to_string(),
    ];
    for candidate in &candidates {
        if let Some((_, oid)) = refs.iter().find(|(name, _)| name == candidate) {
            return Some(oid.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<(String, String)> {
        vec![
            ("HEAD".to_string(), "aaa0000000000000000000000000000000000000".to_string()),
            ("refs/heads/master".to_string(), "aaa0000000000000000000000000000000000000".to_string()),
            ("refs/heads/dev".to_string(), "bbb0000000000000000000000000000000000000".to_string()),
            ("refs/tags/v1.2.0".to_string(), "ccc0000000000000000000000000000000000000".to_string()),
            ("refs/tags/v1.2.0^{}".to_string(), "ddd0000000000000000000000000000000000000".to_string()),
        ]
    }

    #[test]
    fn branches_resolve_to_their_head() {
        assert_eq!(
            match_reference(&listing(), "dev").as_deref(),
            Some("bbb0000000000000000000000000000000000000")
        );
    }

    #[test]
    fn peeled_tags_win_over_the_tag_object() {
        assert_eq!(
            match_reference(&listing(), "v1.2.0").as_deref(),
            Some("ddd0000000000000000000000000000000000000")
        );
    }

    #[test]
    fn head_is_matched_verbatim() {
        assert_eq!(
            match_reference(&listing(), "HEAD").as_deref(),
            Some("aaa0000000000000000000000000000000000000")
        );
    }

    #[test]
    fn unknown_references_do_not_match() {
        assert!(match_reference(&listing(), "release").is_none());
    }

    #[test]
    fn full_commit_ids_skip_the_listing() {
        assert!(is_commit_id("0123456789abcdef0123456789ABCDEF01234567"));
        assert!(!is_commit_id("master"));
        assert!(!is_commit_id("0123456"));
    }
}

use nostr::{Kind, Tag, TagKind, Timestamp};
use std::borrow::Cow;

use crate::types::*;
use crate::url;

pub const KIND_GIT_REPO_ANNOUNCEMENT: u16 = 30617;

/// Source of `created_at` values
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock frozen at a Unix time in seconds
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from(self.0)
    }
}

/// Repository announcement before signing
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementDraft {
    pub kind: Kind,
    pub created_at: Timestamp,
    pub tags: Vec<Tag>,
    pub content: String,
}

impl AnnouncementDraft {
    /// Tags as plain string rows, in order
    pub fn tag_rows(&self) -> Vec<Vec<String>> {
        self.tags.iter().map(|tag| tag.as_slice().to_vec()).collect()
    }
}

fn custom_tag(name: &'static str, value: impl Into<String>) -> Tag {
    Tag::custom(TagKind::Custom(Cow::Borrowed(name)), vec![value.into()])
}

/// Build repository announcement event (NIP-34 compatible)
///
/// Tag order is fixed: `d`, `name`, `HEAD`, then `clone` and `web` when a
/// remote is known, then one tag per branch head.
pub fn build_announcement(facts: &RepositoryFacts, clock: &dyn Clock) -> AnnouncementDraft {
    let mut tags = vec![
        Tag::identifier(&facts.name),
        custom_tag("name", &facts.name),
        custom_tag(
            "HEAD",
            format!("ref: refs/heads/{branch}", branch = facts.current_branch),
        ),
    ];

    if let Some(remote) = &facts.remote_url {
        let urls = url::canonicalize(remote);
        for clone_url in urls.clone {
            tags.push(custom_tag("clone", clone_url));
        }
        if let Some(web) = urls.web {
            tags.push(custom_tag("web", web));
        }
    }

    for branch in &facts.branch_refs {
        tags.push(Tag::custom(
            TagKind::Custom(Cow::Owned(branch.name.clone())),
            vec![branch.commit.clone()],
        ));
    }

    let content = format!(
        "Latest commit: {subject}",
        subject = facts.commit_subject.as_deref().unwrap_or_default()
    );

    AnnouncementDraft {
        kind: Kind::from(KIND_GIT_REPO_ANNOUNCEMENT),
        created_at: clock.now(),
        tags,
        content,
    }
}

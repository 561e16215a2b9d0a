use anyhow::{Context, Result, anyhow, bail};
use git2::Repository;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::HookError;
use crate::types::*;

pub const DEFAULT_BRANCH: &str = "main";
pub const UNKNOWN_REPO_NAME: &str = "unknown";
pub const ORIGIN: &str = "origin";

const HEADS_PREFIX: &str = "refs/heads/";

/// Read-only access to the facts an announcement is built from
pub trait FactSource {
    fn repo_root(&self) -> Result<PathBuf>;
    fn remote_url(&self, name: &str) -> Result<String>;
    fn current_branch_name(&self) -> Result<String>;
    fn last_commit_subject(&self) -> Result<String>;
    /// Local branch heads as `(refs/heads/<name>, commit)` in discovery order
    fn branch_heads(&self) -> Result<Vec<BranchRef>>;
}

/// Facts read from a local git repository
pub struct GitFacts {
    repo: std::result::Result<Repository, git2::Error>,
}

impl GitFacts {
    /// Find the repository containing `path`.
    ///
    /// A failed lookup is kept and reported by [`FactSource::repo_root`].
    pub fn discover(path: &Path) -> Self {
        Self {
            repo: Repository::discover(path),
        }
    }

    fn repo(&self) -> Result<&Repository> {
        self.repo
            .as_ref()
            .map_err(|e| anyhow!("Not a git repository: {}", e.message()))
    }
}

impl FactSource for GitFacts {
    fn repo_root(&self) -> Result<PathBuf> {
        let repo = self.repo()?;
        let workdir = repo
            .workdir()
            .context("Repository has no working directory")?;
        Ok(workdir.to_path_buf())
    }

    fn remote_url(&self, name: &str) -> Result<String> {
        let remote = self.repo()?.find_remote(name)?;
        let url = remote
            .url()
            .with_context(|| format!("Remote {name} has no usable URL"))?;
        Ok(url.to_string())
    }

    fn current_branch_name(&self) -> Result<String> {
        // Read the symbolic ref directly so an unborn branch still has a name
        let head = self.repo()?.find_reference("HEAD")?;
        let Some(target) = head.symbolic_target() else {
            bail!("HEAD is detached");
        };
        Ok(target.strip_prefix(HEADS_PREFIX).unwrap_or(target).to_string())
    }

    fn last_commit_subject(&self) -> Result<String> {
        let commit = self.repo()?.head()?.peel_to_commit()?;
        let subject = commit.summary().context("Commit has no readable subject")?;
        Ok(subject.to_string())
    }

    fn branch_heads(&self) -> Result<Vec<BranchRef>> {
        let repo = self.repo()?;
        let mut heads = Vec::new();

        for reference in repo.references_glob("refs/heads/*")? {
            let reference = match reference {
                Ok(reference) => reference,
                Err(e) => {
                    debug!("Skipping unreadable reference: {}", e.message());
                    continue;
                }
            };
            if let Some(name) = reference.name()
                && let Some(target) = reference.target()
            {
                heads.push(BranchRef::new(name, target.to_string()));
            }
        }

        Ok(heads)
    }
}

/// Facts held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticFacts {
    pub root: Option<PathBuf>,
    pub origin_url: Option<String>,
    pub current_branch: Option<String>,
    pub commit_subject: Option<String>,
    pub branch_heads: Vec<BranchRef>,
}

impl FactSource for StaticFacts {
    fn repo_root(&self) -> Result<PathBuf> {
        self.root.clone().context("Not a git repository")
    }

    fn remote_url(&self, name: &str) -> Result<String> {
        match (&self.origin_url, name) {
            (Some(url), ORIGIN) => Ok(url.clone()),
            _ => bail!("Remote {name} not found"),
        }
    }

    fn current_branch_name(&self) -> Result<String> {
        self.current_branch.clone().context("HEAD is detached")
    }

    fn last_commit_subject(&self) -> Result<String> {
        self.commit_subject.clone().context("No commits yet")
    }

    fn branch_heads(&self) -> Result<Vec<BranchRef>> {
        Ok(self.branch_heads.clone())
    }
}

/// Gather repository facts, degrading anything optional to a default.
///
/// Only the repository root is required: without it there is no stable
/// identifier for the `d` tag.
pub fn collect_facts(source: &dyn FactSource) -> Result<RepositoryFacts, HookError> {
    let root = source
        .repo_root()
        .map_err(|e| HookError::Precondition(format!("{e:#}")))?;

    let name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(UNKNOWN_REPO_NAME)
        .to_string();

    let remote_url = optional("remote URL", source.remote_url(ORIGIN));
    let current_branch = optional("current branch", source.current_branch_name())
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
    let commit_subject = optional("commit subject", source.last_commit_subject());
    let branch_refs = optional("branch heads", source.branch_heads()).unwrap_or_default();

    debug!(
        "Collected facts for {name}: branch {current_branch}, {} branch head(s)",
        branch_refs.len()
    );

    Ok(RepositoryFacts {
        name,
        remote_url,
        current_branch,
        commit_subject,
        branch_refs,
    })
}

fn optional<T>(what: &str, fact: Result<T>) -> Option<T> {
    match fact {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{what} unavailable: {e:#}");
            None
        }
    }
}

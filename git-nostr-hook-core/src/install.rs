use anyhow::{Context, Result, bail};
use git2::{Config, ErrorCode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const HOOK_NAME: &str = "post-commit";
pub const HOOKS_PATH_KEY: &str = "core.hooksPath";

const HOOK_MARKER: &str = "# Installed by git-nostr-hook";

/// Where the global hook lives
#[derive(Debug, Clone)]
pub struct HookPaths {
    pub hooks_dir: PathBuf,
}

impl HookPaths {
    pub fn new(hooks_dir: impl Into<PathBuf>) -> Self {
        Self {
            hooks_dir: hooks_dir.into(),
        }
    }

    /// `~/.git-hooks`
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(Self::new(home.join(".git-hooks")))
    }

    pub fn hook_file(&self) -> PathBuf {
        self.hooks_dir.join(HOOK_NAME)
    }
}

/// What `uninstall` actually changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UninstallSummary {
    pub removed_hook: bool,
    pub unset_hooks_path: bool,
}

/// Shell script run by git after every commit.
///
/// Publishing must never make a commit look failed, so the exit status is
/// swallowed.
pub fn hook_script() -> String {
    format!("#!/bin/sh\n{HOOK_MARKER}\ngit-nostr-hook run || true\n")
}

/// Global git config, created at `~/.gitconfig` if it does not exist yet
pub fn open_global_config() -> Result<Config> {
    let path = match Config::find_global() {
        Ok(path) => path,
        Err(_) => dirs::home_dir()
            .context("Failed to get home directory")?
            .join(".gitconfig"),
    };
    Config::open(&path).with_context(|| format!("Failed to open git config at {path:?}"))
}

/// Write the post-commit hook and point `core.hooksPath` at it
pub fn install(paths: &HookPaths, config: &mut Config) -> Result<PathBuf> {
    fs::create_dir_all(&paths.hooks_dir)
        .with_context(|| format!("Failed to create directory {:?}", paths.hooks_dir))?;

    let hook_file = paths.hook_file();
    if is_foreign_hook(&hook_file)? {
        bail!(
            "{} already exists and was not installed by git-nostr-hook; move it aside first",
            hook_file.display()
        );
    }
    fs::write(&hook_file, hook_script())
        .with_context(|| format!("Failed to write hook to {hook_file:?}"))?;
    make_executable(&hook_file)?;
    debug!("Wrote hook script to {}", hook_file.display());

    let hooks_dir = paths.hooks_dir.to_string_lossy();
    config
        .set_str(HOOKS_PATH_KEY, &hooks_dir)
        .with_context(|| format!("Failed to set {HOOKS_PATH_KEY}"))?;

    Ok(hook_file)
}

/// Remove the hook and unset `core.hooksPath` if it still points at it.
///
/// Running it twice, or before any install, is not an error.
pub fn uninstall(paths: &HookPaths, config: &mut Config) -> Result<UninstallSummary> {
    let hook_file = paths.hook_file();
    let removed_hook = if !hook_file.exists() {
        false
    } else if is_foreign_hook(&hook_file)? {
        warn!(
            "Leaving {} alone, it was not installed by git-nostr-hook",
            hook_file.display()
        );
        false
    } else {
        fs::remove_file(&hook_file)
            .with_context(|| format!("Failed to remove hook {hook_file:?}"))?;
        true
    };

    let unset_hooks_path = match config.get_string(HOOKS_PATH_KEY) {
        Ok(current) if Path::new(&current) == paths.hooks_dir => {
            config
                .remove(HOOKS_PATH_KEY)
                .with_context(|| format!("Failed to unset {HOOKS_PATH_KEY}"))?;
            true
        }
        Ok(current) => {
            warn!("Leaving {HOOKS_PATH_KEY} alone, it points at {current}");
            false
        }
        Err(e) if e.code() == ErrorCode::NotFound => false,
        Err(e) => {
            return Err(anyhow::Error::from(e).context(format!("Failed to read {HOOKS_PATH_KEY}")));
        }
    };

    Ok(UninstallSummary {
        removed_hook,
        unset_hooks_path,
    })
}

/// An existing hook without our marker line
fn is_foreign_hook(path: &Path) -> Result<bool> {
    match fs::read_to_string(path) {
        Ok(script) => Ok(!script.lines().any(|line| line == HOOK_MARKER)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        // Not UTF-8, so not a script we wrote
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Ok(true),
        Err(e) => Err(anyhow::Error::from(e).context(format!("Failed to read hook {path:?}"))),
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to make {path:?} executable"))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

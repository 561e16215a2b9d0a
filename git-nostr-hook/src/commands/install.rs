use anyhow::Result;
use git_nostr_hook_core::PRIVKEY_KEY;
use git_nostr_hook_core::install::{self, HOOKS_PATH_KEY, HookPaths};

pub fn handle_install_command() -> Result<()> {
    println!("Installing git-nostr-hook...\n");

    let paths = HookPaths::default_location()?;
    let mut config = install::open_global_config()?;
    let hook_file = install::install(&paths, &mut config)?;

    println!("✓ Installed {hook}", hook = hook_file.display());
    println!(
        "✓ Set global {HOOKS_PATH_KEY} to {dir}",
        dir = paths.hooks_dir.display()
    );

    println!("\n✅ Installation complete!\n");
    println!("Next steps:");
    println!("  1. Set your Nostr private key:");
    println!("     git config --global {PRIVKEY_KEY} <64-char-hex-key>\n");
    println!("  2. Make a commit in any repo to test!");
    Ok(())
}

pub fn handle_uninstall_command() -> Result<()> {
    println!("Uninstalling git-nostr-hook...\n");

    let paths = HookPaths::default_location()?;
    let mut config = install::open_global_config()?;
    let summary = install::uninstall(&paths, &mut config)?;

    if summary.removed_hook {
        println!("✓ Removed {hook}", hook = paths.hook_file().display());
    }
    if summary.unset_hooks_path {
        println!("✓ Unset global {HOOKS_PATH_KEY}");
    }

    println!("\n✅ Uninstalled successfully!");
    Ok(())
}

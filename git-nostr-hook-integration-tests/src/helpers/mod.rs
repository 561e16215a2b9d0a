pub mod assertions;
pub mod relay_verification;
pub mod runner;
pub mod setup;
pub mod types;

pub use assertions::*;
pub use relay_verification::*;
pub use runner::*;
pub use setup::*;
pub use types::*;

use colored::*;
use std::future::Future;

/// Run one test case and print its ✓/✗ line
pub async fn record<F>(name: &str, test: F, passed: &mut usize, failed: &mut usize)
where
    F: Future<Output = anyhow::Result<()>>,
{
    match test.await {
        Ok(()) => {
            println!("  {check} {name}", check = "✓".green());
            *passed += 1;
        }
        Err(e) => {
            println!(
                "  {cross} {name}: {error}",
                cross = "✗".red(),
                error = e
            );
            *failed += 1;
        }
    }
}

//! Init Config Command

use std::path::Path;

use anyhow::{bail, Result};

use blogapp_e2e::SuiteConfig;

use crate::output::print_success;

pub fn execute(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    SuiteConfig::default().save(path)?;
    print_success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}

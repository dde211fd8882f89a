//! `fmm install` command implementation.
//!
//! Downloads the requested mods and their required dependencies into the
//! mods directory. Nothing is enabled and mod-list.json is left untouched.

use super::{resolve_and_fetch, CommandContext};
use fmm_core::error::FmmResult;
use fmm_core::ModIdent;

/// Execute the `fmm install` command
pub async fn execute(mods: &[ModIdent], ctx: &CommandContext) -> FmmResult<()> {
    let mut registry = ctx.load_registry()?;

    let fetched = resolve_and_fetch(&mut registry, mods, ctx).await?;

    if fetched.downloaded == 0 && !ctx.dry_run {
        ctx.output.info(&format!(
            "All {} resolved mods are already installed",
            fetched.available.len()
        ));
    }

    Ok(())
}

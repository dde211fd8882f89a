//! `fmm enable` command implementation.
//!
//! Resolves the requested mods, downloads releases that are missing locally,
//! enables every resolved release and saves mod-list.json.

use super::{resolve_and_fetch, CommandContext};
use fmm_core::error::FmmResult;
use fmm_core::ModIdent;

/// Execute the `fmm enable` command
pub async fn execute(mods: &[ModIdent], ignore_deps: bool, ctx: &CommandContext) -> FmmResult<()> {
    let mut registry = ctx.load_registry()?;

    let idents = if ignore_deps {
        mods.to_vec()
    } else {
        resolve_and_fetch(&mut registry, mods, ctx).await?.available
    };

    for ident in &idents {
        match registry.enable(ident) {
            Ok(Some(version)) => ctx
                .output
                .success(&format!("Enabled {} v{}", ident.name, version)),
            Ok(None) => ctx
                .output
                .info(&format!("{} is already enabled", ident.name)),
            Err(e) if e.is_recoverable() => ctx.report(&e),
            Err(e) => return Err(e),
        }
    }

    registry.save()?;
    if ctx.dry_run {
        ctx.output.info("Dry run, mod-list.json not written");
    }

    Ok(())
}

/// Execute `fmm enable --all`: the newest release of every installed mod
pub async fn execute_all(ctx: &CommandContext) -> FmmResult<()> {
    let mut registry = ctx.load_registry()?;

    let count = registry.enable_all();
    ctx.output.success(&format!("Enabled {} mods", count));

    registry.save()
}

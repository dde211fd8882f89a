//! `fmm remove` command implementation.
//!
//! Deletes release artifacts from the mods directory. A removed release that
//! was enabled leaves its mod disabled.

use super::CommandContext;
use fmm_core::error::FmmResult;
use fmm_core::ModIdent;

/// Execute the `fmm remove` command
pub async fn execute(mods: &[ModIdent], ctx: &CommandContext) -> FmmResult<()> {
    let mut registry = ctx.load_registry()?;

    for ident in mods {
        match registry.remove_release(ident) {
            Ok(release) => {
                let verb = if ctx.dry_run { "Would remove" } else { "Removed" };
                ctx.output
                    .success(&format!("{} {} v{}", verb, release.name, release.version));
            },
            Err(e) if e.is_recoverable() => ctx.report(&e),
            Err(e) => return Err(e),
        }
    }

    registry.save()
}

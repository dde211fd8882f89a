//! `fmm disable` command implementation.

use super::CommandContext;
use fmm_core::error::FmmResult;
use fmm_core::ModIdent;

/// Execute the `fmm disable` command
///
/// Without mods every mod except the internal ones is disabled, or every mod
/// at all with `include_internal`. A version in an identifier is ignored:
/// a mod has at most one enabled release.
pub async fn execute(mods: &[ModIdent], include_internal: bool, ctx: &CommandContext) -> FmmResult<()> {
    let mut registry = ctx.load_registry()?;

    if mods.is_empty() {
        let count = registry.disable_all(include_internal);
        ctx.output.success(&format!("Disabled {} mods", count));
    } else {
        for ident in mods {
            match registry.disable(&ident.name) {
                Ok(()) => ctx.output.success(&format!("Disabled {}", ident.name)),
                Err(e) if e.is_recoverable() => ctx.report(&e),
                Err(e) => return Err(e),
            }
        }
    }

    registry.save()
}

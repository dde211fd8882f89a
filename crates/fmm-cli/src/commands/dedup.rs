//! `fmm dedup` command implementation.

use super::CommandContext;
use fmm_core::error::FmmResult;

/// Execute the `fmm dedup` command
pub async fn execute(ctx: &CommandContext) -> FmmResult<()> {
    let mut registry = ctx.load_registry()?;

    let removed = registry.dedup()?;
    if removed.is_empty() {
        ctx.output.info("No outdated archives found");
        return Ok(());
    }

    let verb = if ctx.dry_run { "Would remove" } else { "Removed" };
    for release in &removed {
        ctx.output
            .success(&format!("{} {} v{}", verb, release.name, release.version));
    }

    // enabled releases may have moved to the surviving archive
    registry.save()
}

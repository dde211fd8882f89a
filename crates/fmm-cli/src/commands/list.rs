//! `fmm list` command implementation.

use super::CommandContext;
use crate::output::colors::ColorSupport;
use fmm_core::error::FmmResult;
use fmm_core::Package;

/// Execute the `fmm list` command
pub async fn execute(ctx: &CommandContext) -> FmmResult<()> {
    let registry = ctx.load_registry()?;

    if registry.is_empty() {
        ctx.output.info("No mods installed");
        return Ok(());
    }

    for package in registry.packages() {
        let line = format_package(package, registry.is_internal(&package.name), ctx.output.colors());
        ctx.output.print(&line);
    }

    Ok(())
}

/// One line per package: name, releases oldest first, enabled marker
pub fn format_package(package: &Package, internal: bool, colors: &ColorSupport) -> String {
    let versions = package
        .releases()
        .iter()
        .map(|release| {
            let version = release.version.to_string();
            if package.enabled() == Some(release.version) {
                colors.green(&format!("*{}", version))
            } else {
                colors.dim(&version)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut line = format!("{} {}", colors.bold(&package.name), versions);
    if internal {
        line.push_str(&colors.dim(" (internal)"));
    }
    line
}

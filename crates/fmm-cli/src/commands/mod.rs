//! Command implementations and dispatch logic.
//!
//! Each command is an async function over a shared [`CommandContext`].
//! Recoverable errors are printed and counted on the context; anything else
//! is returned and aborts the run.

use camino::{Utf8Path, Utf8PathBuf};
use fmm_config::{Config, ConfigLoader};
use fmm_core::error::{FmmError, FmmResult};
use fmm_core::ModIdent;
use fmm_portal::{Credentials, PortalClient, RetryConfig};
use fmm_registry::{read_release, PackageSources, Registry, RegistryOptions};
use fmm_resolver::{Catalog, Fallback, LocalCatalog, Resolver};
use std::cell::Cell;
use tracing::{debug, info};

pub mod dedup;
pub mod disable;
pub mod enable;
pub mod install;
pub mod list;
pub mod remove;

#[cfg(test)]
mod tests;

use crate::{output::OutputHandler, Commands, GlobalArgs};

/// Shared context for all commands
pub struct CommandContext {
    pub config: Config,
    pub dry_run: bool,
    pub output: OutputHandler,
    errors: Cell<usize>,
}

impl CommandContext {
    /// Load configuration for the current directory
    pub async fn new(args: &GlobalArgs) -> FmmResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| FmmError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| FmmError::ConfigValidation {
            field: "cwd".to_string(),
            reason: e.to_string(),
        })?;

        let config = ConfigLoader::new(cwd)
            .load(args.config.as_deref().map(Utf8Path::new), &args.config_overrides())
            .await?;
        debug!("Configuration sources: {:?}", config.sources);

        Ok(Self::with_config(config, args.dry_run, OutputHandler::new()))
    }

    pub fn with_config(config: Config, dry_run: bool, output: OutputHandler) -> Self {
        Self {
            config,
            dry_run,
            output,
            errors: Cell::new(0),
        }
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            base_package: self.config.base_package.clone(),
            internal_packages: self.config.internal_packages.clone(),
            save: !self.dry_run,
        }
    }

    /// Scan the game and mods directories and apply mod-list.json
    ///
    /// The game directory is only checked when the mods directory is derived
    /// from it.
    pub fn load_registry(&self) -> FmmResult<Registry> {
        if !self.config.explicit_mods_dir {
            self.config.validate_game_dir()?;
        }

        let mods_dir = &self.config.mods_dir;
        if !mods_dir.is_dir() {
            std::fs::create_dir_all(mods_dir)
                .map_err(|e| FmmError::io(format!("Failed to create {}", mods_dir), e))?;
        }

        let sources = PackageSources {
            internal: self
                .config
                .internal_sources()
                .into_iter()
                .map(Utf8PathBuf::into_std_path_buf)
                .collect(),
            user: mods_dir.as_std_path().to_path_buf(),
        };

        let mut registry = Registry::load(&sources, self.registry_options())?;
        let mod_list = registry.mod_list_path();
        registry.load_enabled_state(&mod_list)?;
        Ok(registry)
    }

    /// Portal client using the configured URL and credentials
    pub fn portal_client(&self) -> FmmResult<PortalClient> {
        let credentials = self
            .config
            .credentials()
            .map(|(username, token)| Credentials {
                username: username.to_string(),
                token: token.to_string(),
            });

        PortalClient::with_config(
            self.config.portal_url.clone(),
            credentials,
            RetryConfig::default(),
        )
    }

    /// Print a recoverable error and remember that one occurred
    pub fn report(&self, error: &FmmError) {
        self.output.error(error);
        self.errors.set(self.errors.get() + 1);
    }

    /// Number of recoverable errors reported so far
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> FmmResult<()> {
    match command {
        Commands::Enable {
            all: true, ..
        } => enable::execute_all(ctx).await,
        Commands::Enable {
            mods, ignore_deps, ..
        } => {
            info!("Enabling {} mods (ignore deps: {})", mods.len(), ignore_deps);
            enable::execute(&mods, ignore_deps, ctx).await
        },
        Commands::Disable {
            mods,
            include_internal,
        } => {
            info!("Disabling {} mods", mods.len());
            disable::execute(&mods, include_internal, ctx).await
        },
        Commands::Install { mods } => {
            info!("Installing {} mods", mods.len());
            install::execute(&mods, ctx).await
        },
        Commands::Remove { mods } => {
            info!("Removing {} mods", mods.len());
            remove::execute(&mods, ctx).await
        },
        Commands::Dedup => dedup::execute(ctx).await,
        Commands::List => list::execute(ctx).await,
    }
}

/// Outcome of [`resolve_and_fetch`]
#[derive(Debug, Default)]
pub struct Fetched {
    /// Resolved identities that are available locally
    pub available: Vec<ModIdent>,
    /// Releases downloaded during this run
    pub downloaded: usize,
}

/// Resolve `requested` and make every resolved release available locally
///
/// Releases only the portal has are downloaded into the mods directory and
/// added to `registry`. Failed branches, failed downloads and conflicts are
/// reported.
pub async fn resolve_and_fetch(
    registry: &mut Registry,
    requested: &[ModIdent],
    ctx: &CommandContext,
) -> FmmResult<Fetched> {
    let portal = ctx.portal_client()?;
    let mut available = Vec::new();
    let mut downloaded = Vec::new();

    {
        let resolver = Resolver::new(Fallback::new(LocalCatalog::new(registry), &portal))
            .with_base_package(&ctx.config.base_package);
        let resolution = resolver.resolve(requested).await;

        for (_, error) in &resolution.failures {
            ctx.report(error);
        }
        for conflict in &resolution.conflicts {
            ctx.output.warn(&conflict.to_string());
        }

        for release in &resolution.packages {
            if release.is_local() {
                available.push(release.ident());
                continue;
            }

            if ctx.dry_run {
                ctx.output
                    .info(&format!("Would download {} v{}", release.name, release.version));
                continue;
            }

            match resolver
                .catalog()
                .download_archive(&release.ident(), registry.mods_dir())
                .await
            {
                Ok(path) => downloaded.push(path),
                Err(e) if e.is_recoverable() => ctx.report(&e),
                Err(e) => return Err(e),
            }
        }
    }

    let downloaded_count = downloaded.len();
    for path in downloaded {
        let release = read_release(&path).map_err(|e| FmmError::load(&path, e))?;
        ctx.output.success(&format!(
            "Downloaded {} v{}",
            release.name, release.version
        ));
        available.push(release.ident());
        registry.add_release(release);
    }

    // the resolver never looks up the base package, so keep explicit requests for it
    available.extend(
        requested
            .iter()
            .filter(|ident| ident.name == ctx.config.base_package)
            .cloned(),
    );

    Ok(Fetched {
        available,
        downloaded: downloaded_count,
    })
}

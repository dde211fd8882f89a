//! HTTP client for the mod portal with retry logic

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fmm_core::types::archive_name;
use fmm_core::utils::write_atomic;
use fmm_core::{Dependency, FmmError, ModIdent, Release, VersionReq, DEFAULT_PORTAL_URL};
use reqwest::{Client, ClientBuilder, StatusCode};
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{ModPortalResult, PortalRelease};
use crate::PortalResult;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Download credentials (`service-username` / `service-token`)
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Main HTTP client for mod portal operations
#[derive(Debug, Clone)]
pub struct PortalClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Portal root URL
    base_url: Url,
    /// Needed for downloads only
    credentials: Option<Credentials>,
}

impl PortalClient {
    /// Create a client for the public portal without credentials
    pub fn new() -> PortalResult<Self> {
        let base_url = Url::parse(DEFAULT_PORTAL_URL).map_err(|e| FmmError::ConfigValidation {
            field: "portal_url".to_string(),
            reason: e.to_string(),
        })?;
        Self::with_config(base_url, None, RetryConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(
        base_url: Url,
        credentials: Option<Credentials>,
        retry_config: RetryConfig,
    ) -> PortalResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            // Request timeout
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("fmm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FmmError::network(format!("Failed to create HTTP client: {}", e), e))?;

        Ok(Self {
            client,
            retry_config,
            base_url,
            credentials,
        })
    }

    /// Portal root URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check whether downloads can be authenticated
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Execute HTTP request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> PortalResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = PortalResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                // Only transport failures are worth another attempt
                Err(error @ FmmError::Network { .. })
                    if attempt < self.retry_config.max_retries =>
                {
                    attempt += 1;
                    warn!(
                        "{}; retrying in {:?} ({}/{})",
                        error, delay, attempt, self.retry_config.max_retries
                    );

                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                        ),
                        self.retry_config.max_delay,
                    );
                },
                Err(error) => return Err(error),
            }
        }
    }

    fn endpoint(&self, path: &str) -> PortalResult<Url> {
        self.base_url.join(path).map_err(|e| FmmError::ConfigValidation {
            field: "portal_url".to_string(),
            reason: format!("cannot build URL for '{}': {}", path, e),
        })
    }

    /// Fetch a mod with all its releases, sorted ascending by version
    pub async fn fetch_mod(&self, name: &str) -> PortalResult<ModPortalResult> {
        let url = self.endpoint(&format!("api/mods/{}/full", name))?;
        debug!("Fetching {}", url);

        let body = self
            .with_retry(|| async {
                let response = self.client.get(url.clone()).send().await.map_err(|e| {
                    FmmError::network(format!("Failed to fetch '{}': {}", name, e), e)
                })?;

                match response.status() {
                    StatusCode::OK => response.bytes().await.map_err(|e| {
                        FmmError::network(format!("Failed to read portal response for '{}'", name), e)
                    }),
                    StatusCode::NOT_FOUND => Err(FmmError::PackageNotFound {
                        name: name.to_string(),
                    }),
                    status => Err(FmmError::Network {
                        message: format!("Portal returned status {} for '{}'", status, name),
                        source: None,
                    }),
                }
            })
            .await?;

        // a malformed body is not retried
        let mut result = ModPortalResult::from_slice(name, &body)?;
        result.sort_releases();
        Ok(result)
    }

    /// Newest portal release satisfying a dependency
    pub async fn fetch_release(&self, dependency: &Dependency) -> PortalResult<Release> {
        let result = self.fetch_mod(&dependency.name).await?;

        result
            .matching_release(&dependency.version_req)
            .map(|r| r.to_release(&result.name))
            .ok_or_else(|| FmmError::NoMatchingRelease {
                name: dependency.name.clone(),
                requirement: dependency.version_req.to_string(),
            })
    }

    /// Download the release named by `ident` (newest when unpinned) into `dest_dir`
    pub async fn download(&self, ident: &ModIdent, dest_dir: &Path) -> PortalResult<PathBuf> {
        // fail before any request when downloads cannot be authenticated
        if self.credentials.is_none() {
            return Err(FmmError::MissingCredentials {
                name: ident.name.clone(),
            });
        }

        let result = self.fetch_mod(&ident.name).await?;
        let req = ident.version.map(VersionReq::exact).unwrap_or_default();
        let release = result
            .matching_release(&req)
            .ok_or_else(|| FmmError::NoMatchingRelease {
                name: ident.name.clone(),
                requirement: req.to_string(),
            })?;

        self.download_release(&result.name, release, dest_dir).await
    }

    /// Download one release archive, verify it and store it as `{file_name}` in `dest_dir`
    pub async fn download_release(
        &self,
        name: &str,
        release: &PortalRelease,
        dest_dir: &Path,
    ) -> PortalResult<PathBuf> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| FmmError::MissingCredentials {
                name: name.to_string(),
            })?;

        // the portal controls file_name; never let it escape dest_dir
        if Path::new(&release.file_name).file_name() != Some(OsStr::new(&release.file_name)) {
            return Err(FmmError::FilenameMismatch {
                expected: archive_name(name, &release.version),
                actual: release.file_name.clone(),
            });
        }

        let url = self.endpoint(&release.download_url)?;
        info!("Downloading {} {}", name, release.version);

        let bytes = self
            .with_retry(|| async {
                let response = self
                    .client
                    .get(url.clone())
                    .query(&[
                        ("username", credentials.username.as_str()),
                        ("token", credentials.token.as_str()),
                    ])
                    .send()
                    .await
                    .map_err(|e| {
                        FmmError::network(format!("Failed to download '{}': {}", name, e), e)
                    })?;

                match response.status() {
                    status if status.is_success() => {
                        let bytes = response.bytes().await.map_err(|e| {
                            FmmError::network(format!("Failed to read download of '{}'", name), e)
                        })?;
                        Ok(bytes.to_vec())
                    },
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FmmError::Auth {
                        message: format!(
                            "portal rejected the credentials of '{}' downloading '{}'",
                            credentials.username, name
                        ),
                    }),
                    StatusCode::NOT_FOUND => Err(FmmError::PackageNotFound {
                        name: name.to_string(),
                    }),
                    status => Err(FmmError::Network {
                        message: format!("Portal returned status {} downloading '{}'", status, name),
                        source: None,
                    }),
                }
            })
            .await?;

        if let Some(expected) = &release.sha1 {
            verify_sha1(name, &bytes, expected)?;
        }

        let path = dest_dir.join(&release.file_name);
        write_atomic(&path, &bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        Ok(path)
    }
}

/// Compare the sha1 of `bytes` against the portal's checksum
fn verify_sha1(name: &str, bytes: &[u8], expected: &str) -> PortalResult<()> {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let computed = format!("{:x}", hasher.finalize());

    if !computed.eq_ignore_ascii_case(expected) {
        return Err(FmmError::IntegrityFailure {
            package: name.to_string(),
            expected: expected.to_string(),
            actual: computed,
        });
    }

    Ok(())
}

//! Arduino IDE installation lifecycle
//!
//! An [`Arduino`] owns a single slugged installation. The first operation
//! that needs one resolves the configured version spec against the remote
//! catalog, picks the mirror and binary path for the running platform, and
//! memoizes the result for the lifetime of the instance.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use semver::Version;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::installer::{BinInstaller, InstallOptions};
use crate::mirrors::MirrorTable;
use crate::platform::Platform;
use crate::resolver::{VersionResolver, LATEST};

const USER_AGENT: &str = concat!("arduino-manager/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Constructor options for [`Arduino`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Version spec: `"latest"` or an explicit version like `"1.8.19"`.
    pub version: String,
    /// Base directory under which the slugged install directory is created.
    pub path: PathBuf,
    /// Optional tag appended to the slug, so multiple installations of the
    /// same version can coexist.
    pub tag: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            version: LATEST.to_string(),
            path: PathBuf::from("bin"),
            tag: None,
        }
    }
}

/// Outcome of running the IDE binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for ProcessOutcome {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

struct Ready {
    version: Version,
    platform: Platform,
    installer: BinInstaller,
}

/// Lifecycle controller for one Arduino IDE installation.
pub struct Arduino {
    options: Options,
    table: MirrorTable,
    client: reqwest::Client,
    ready: OnceCell<Ready>,
}

impl Arduino {
    /// Create a controller against the official mirrors.
    pub fn new(options: Options) -> Result<Self> {
        Self::with_table(options, MirrorTable::official())
    }

    /// Create a controller against a custom mirror table. The table is
    /// validated up front.
    pub fn with_table(options: Options, table: MirrorTable) -> Result<Self> {
        table.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            options,
            table,
            client,
            ready: OnceCell::new(),
        })
    }

    /// Ensure the installation exists on disk, downloading and extracting
    /// it if necessary, then remove the splash asset for this platform.
    pub async fn load(&self) -> Result<()> {
        let ready = self.ready().await?;
        ready
            .installer
            .install(&ready.platform, InstallOptions { extract: true, strip: 1 })
            .await?;

        // The IDE shows the splash screen even in command-line mode, so the
        // asset is deleted after extraction. An already-absent file is fine.
        for splash in self.table.splash_for(ready.platform.os) {
            let path = ready.installer.dir().join(&splash.path);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "removed splash asset"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!(version = %ready.version, dir = %ready.installer.dir().display(), "loaded");
        Ok(())
    }

    /// Run the IDE binary with the given arguments and capture its output.
    ///
    /// Does not install the binary; running before [`load`](Self::load)
    /// fails at spawn time.
    pub async fn run<I, S>(&self, args: I) -> Result<ProcessOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let ready = self.ready().await?;
        let binary = ready.installer.binary_path()?;
        let output = tokio::process::Command::new(&binary)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::Process(format!("{}: {}", binary.display(), e)))?;
        Ok(output.into())
    }

    /// Remove the installation from disk. Already absent counts as success.
    pub async fn unload(&self) -> Result<()> {
        let ready = self.ready().await?;
        ready.installer.uninstall().await
    }

    /// Absolute path of the IDE binary. Purely a path computation; only
    /// [`load`](Self::load) guarantees the file exists.
    pub async fn binary_path(&self) -> Result<PathBuf> {
        let ready = self.ready().await?;
        ready.installer.binary_path()
    }

    /// Directory the installation lives in.
    pub async fn install_dir(&self) -> Result<PathBuf> {
        let ready = self.ready().await?;
        Ok(ready.installer.dir().to_path_buf())
    }

    /// Resolve and configure once; concurrent first calls share the same
    /// resolution.
    async fn ready(&self) -> Result<&Ready> {
        self.ready
            .get_or_try_init(|| async {
                let platform = Platform::current()?;
                let resolver =
                    VersionResolver::new(self.client.clone(), self.table.list_url.clone());
                let version = resolver.resolve(&self.options.version).await?;

                let slug = match &self.options.tag {
                    Some(tag) => format!("arduino-{}-{}", version, tag),
                    None => format!("arduino-{}", version),
                };
                let mut installer =
                    BinInstaller::new(self.client.clone(), &self.options.path, &slug);

                // Every mirror is registered; the installer filters by
                // platform itself. Only the current platform's entry decides
                // the binary path.
                for mirror in &self.table.mirrors {
                    installer.add_source(mirror.url(&version), mirror.os, mirror.arch);
                }
                let mirror = self.table.mirror_for(&platform)?;
                installer.use_binary(mirror.binary_path(&version)?);

                debug!(%version, %platform, slug, "controller ready");
                Ok(Ready {
                    version,
                    platform,
                    installer,
                })
            })
            .await
    }
}

//! Archive download and extraction
//!
//! A `BinInstaller` owns one slugged install directory. Every mirror URL is
//! registered as a download source tagged with its OS/architecture; the
//! installer picks the source matching the running platform at install time
//! and is a no-op when the binary is already on disk.

use std::path::{Component, Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::platform::{Arch, Os, Platform};

#[derive(Debug, Clone)]
pub struct DownloadSource {
    pub url: String,
    pub os: Os,
    pub arch: Option<Arch>,
}

#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    /// Extract the downloaded archive into the install directory.
    pub extract: bool,
    /// Leading path components to strip from every archive entry.
    pub strip: usize,
}

#[derive(Debug)]
pub struct BinInstaller {
    client: reqwest::Client,
    dir: PathBuf,
    sources: Vec<DownloadSource>,
    binary: Option<PathBuf>,
}

impl BinInstaller {
    pub fn new(client: reqwest::Client, base: &Path, slug: &str) -> Self {
        Self {
            client,
            dir: base.join(slug),
            sources: Vec::new(),
            binary: None,
        }
    }

    /// Register a download source for the given OS/architecture. `None`
    /// means the source covers every architecture of that OS.
    pub fn add_source(&mut self, url: String, os: Os, arch: Option<Arch>) {
        self.sources.push(DownloadSource { url, os, arch });
    }

    /// Declare which extracted path is the runnable binary.
    pub fn use_binary(&mut self, relative: impl Into<PathBuf>) {
        self.binary = Some(relative.into());
    }

    /// The install directory for this slug.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of the runnable binary. Does not check existence.
    pub fn binary_path(&self) -> Result<PathBuf> {
        let relative = self.binary.as_ref().ok_or_else(|| {
            Error::Configuration("no binary path selected for this platform".to_string())
        })?;
        Ok(self.dir.join(relative))
    }

    /// Download and extract the source matching the platform. A no-op when
    /// the binary is already present.
    pub async fn install(&self, platform: &Platform, opts: InstallOptions) -> Result<()> {
        let binary = self.binary_path()?;
        if binary.exists() {
            debug!(path = %binary.display(), "binary already installed, skipping download");
            return Ok(());
        }

        let source = self
            .sources
            .iter()
            .find(|s| s.os == platform.os && s.arch.map_or(true, |a| a == platform.arch))
            .ok_or_else(|| {
                Error::Configuration(format!("no download source for platform {}", platform))
            })?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let staging = tempfile::tempdir()?;
        let archive = staging.path().join("archive.zip");
        self.download(&source.url, &archive).await?;

        if opts.extract {
            let dest = self.dir.clone();
            let strip = opts.strip;
            tokio::task::spawn_blocking(move || extract_zip(&archive, &dest, strip))
                .await
                .map_err(|e| Error::Archive(format!("extraction task failed: {}", e)))??;
        } else {
            let name = source
                .url
                .rsplit('/')
                .next()
                .unwrap_or("download")
                .to_string();
            tokio::fs::copy(&archive, self.dir.join(name)).await?;
        }

        make_executable(&binary)?;
        info!(dir = %self.dir.display(), "installed");
        Ok(())
    }

    /// Remove the install directory. Already absent counts as success.
    pub async fn uninstall(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                debug!(dir = %self.dir.display(), "removed install directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(url, "downloading archive");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(status, url));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

fn extract_zip(archive: &Path, dest: &Path, strip: usize) -> Result<()> {
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let relative = match entry.enclosed_name().map(Path::to_path_buf) {
            Some(path) => path,
            None => continue,
        };
        let relative = match strip_components(&relative, strip) {
            Some(path) => path,
            None => continue,
        };
        let out = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out)?;
            continue;
        }

        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut target = std::fs::File::create(&out)?;
        std::io::copy(&mut entry, &mut target)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

fn strip_components(path: &Path, strip: usize) -> Option<PathBuf> {
    let stripped: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .skip(strip)
        .collect();
    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    if path.exists() {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Build an in-memory zip archive for tests.
#[cfg(test)]
pub(crate) fn zip_fixture(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write;

    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        let options = zip::write::FileOptions::default().unix_permissions(0o755);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
    buf.into_inner()
}

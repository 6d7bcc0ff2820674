//! Version resolution against the remote catalog

use semver::Version;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::mirrors::MIN_SUPPORTED_VERSION;

/// Sentinel accepted in place of an explicit version.
pub const LATEST: &str = "latest";

/// Resolves a user-supplied version spec (`"latest"` or an explicit
/// version) into a concrete published version.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    client: reqwest::Client,
    list_url: String,
    floor: Version,
}

impl VersionResolver {
    pub fn new(client: reqwest::Client, list_url: String) -> Self {
        // The floor is a compiled-in constant, checked by tests.
        let floor = Version::parse(MIN_SUPPORTED_VERSION).expect("built-in version floor");
        Self {
            client,
            list_url,
            floor,
        }
    }

    /// Resolve a spec to a concrete version.
    ///
    /// Explicit specs are sanitized and floor-checked before any network
    /// traffic, so a malformed or unsupported version never hits the
    /// catalog endpoint.
    pub async fn resolve(&self, spec: &str) -> Result<Version> {
        if spec == LATEST {
            let catalog = self.fetch_catalog().await?;
            let version = catalog.into_iter().last().ok_or_else(|| {
                Error::UnavailableVersion {
                    version: LATEST.to_string(),
                }
            })?;
            self.check_floor(&version)?;
            debug!(%version, "resolved latest version");
            return Ok(version);
        }

        let version = sanitize(spec)?;
        self.check_floor(&version)?;

        let catalog = self.fetch_catalog().await?;
        if !catalog.contains(&version) {
            return Err(Error::UnavailableVersion {
                version: version.to_string(),
            });
        }
        debug!(%version, "resolved explicit version");
        Ok(version)
    }

    fn check_floor(&self, version: &Version) -> Result<()> {
        if *version < self.floor {
            return Err(Error::UnsupportedVersion {
                version: version.to_string(),
                floor: self.floor.to_string(),
            });
        }
        Ok(())
    }

    /// Fetch the comma-separated catalog of published versions.
    async fn fetch_catalog(&self) -> Result<Vec<Version>> {
        let response = self.client.get(&self.list_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(status, &self.list_url));
        }

        let body = response.text().await?;
        let catalog: Vec<Version> = body
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(|entry| match sanitize(entry) {
                Ok(version) => Some(version),
                Err(_) => {
                    warn!(entry, "skipping unparseable catalog entry");
                    None
                }
            })
            .collect();
        debug!(count = catalog.len(), "fetched version catalog");
        Ok(catalog)
    }
}

/// Normalize a raw version token to canonical semver form.
pub fn sanitize(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(stripped).map_err(|_| Error::InvalidVersion {
        version: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(list_url: String) -> VersionResolver {
        VersionResolver::new(reqwest::Client::new(), list_url)
    }

    #[test]
    fn test_sanitize_plain_and_prefixed() {
        assert_eq!(sanitize("1.8.19").unwrap(), Version::new(1, 8, 19));
        assert_eq!(sanitize("v1.8.19").unwrap(), Version::new(1, 8, 19));
        assert_eq!(sanitize("  1.6.0 ").unwrap(), Version::new(1, 6, 0));
    }

    #[test]
    fn test_sanitize_rejects_garbage() {
        for raw in ["", "not-a-version", "🦀", "1.8", "one.two.three"] {
            assert!(matches!(
                sanitize(raw),
                Err(Error::InvalidVersion { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_resolve_latest_takes_last_catalog_entry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/list")
            .with_status(200)
            .with_body("1.0.0,1.5.2,1.6.5,1.8.19")
            .create_async()
            .await;

        let resolved = resolver(format!("{}/list", server.url()))
            .resolve("latest")
            .await
            .unwrap();

        assert_eq!(resolved, Version::new(1, 8, 19));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_explicit_version_in_catalog() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/list")
            .with_status(200)
            .with_body("1.5.2,1.6.5,1.8.19")
            .create_async()
            .await;

        let resolver = resolver(format!("{}/list", server.url()));
        let resolved = resolver.resolve("1.6.5").await.unwrap();
        assert_eq!(resolved, Version::new(1, 6, 5));

        // Stable across repeated calls.
        assert_eq!(resolver.resolve("1.6.5").await.unwrap(), resolved);
    }

    #[tokio::test]
    async fn test_resolve_missing_version_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/list")
            .with_status(200)
            .with_body("1.5.2,1.6.5")
            .create_async()
            .await;

        let result = resolver(format!("{}/list", server.url()))
            .resolve("1.8.19")
            .await;
        assert!(matches!(result, Err(Error::UnavailableVersion { .. })));
    }

    #[tokio::test]
    async fn test_below_floor_fails_without_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/list")
            .with_status(200)
            .with_body("1.0.0,1.5.0,1.5.2")
            .expect(0)
            .create_async()
            .await;

        let result = resolver(format!("{}/list", server.url()))
            .resolve("1.5.0")
            .await;
        match result {
            Err(Error::UnsupportedVersion { version, floor }) => {
                assert_eq!(version, "1.5.0");
                assert_eq!(floor, MIN_SUPPORTED_VERSION);
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_version_fails_without_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/list")
            .with_status(200)
            .with_body("1.5.2")
            .expect(0)
            .create_async()
            .await;

        let result = resolver(format!("{}/list", server.url()))
            .resolve("🦀")
            .await;
        assert!(matches!(result, Err(Error::InvalidVersion { .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_catalog_error_status_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/list")
            .with_status(500)
            .create_async()
            .await;

        let result = resolver(format!("{}/list", server.url()))
            .resolve("latest")
            .await;
        match result {
            Err(err @ Error::Network { .. }) => assert_eq!(err.status(), Some(500)),
            other => panic!("expected Network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_catalog_entries_are_skipped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/list")
            .with_status(200)
            .with_body("1.5.2,garbage,1.6.5,")
            .create_async()
            .await;

        let resolved = resolver(format!("{}/list", server.url()))
            .resolve("latest")
            .await
            .unwrap();
        assert_eq!(resolved, Version::new(1, 6, 5));
    }
}

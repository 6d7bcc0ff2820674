//! Static mirror and splash-screen tables
//!
//! The download mirrors are keyed by OS (and architecture where the mirrors
//! distinguish one), with a `{{version}}` placeholder in every URL template.
//! Historical macOS builds moved the runnable binary inside the archive, so
//! that entry carries an ordered list of version-range variants instead of a
//! single path.

use semver::{Version, VersionReq};

use crate::error::{Error, Result};
use crate::platform::{Arch, Os, Platform};

/// Endpoint returning the comma-separated catalog of published versions.
pub const VERSION_LIST_ENDPOINT: &str = "https://arduino-cli.github.io/arduino-version/list";

/// Oldest release that understands command-line flags.
pub const MIN_SUPPORTED_VERSION: &str = "1.5.2";

const DOWNLOAD_BASE: &str = "https://github.com/arduino-cli/arduino-version/releases/download";

/// Where the runnable binary lives inside an extracted archive.
#[derive(Debug, Clone)]
pub enum BinaryLocation {
    /// Same relative path for every version.
    Fixed(String),
    /// Ordered variants; the first whose range contains the resolved
    /// version wins.
    Versioned(Vec<BinaryVariant>),
}

#[derive(Debug, Clone)]
pub struct BinaryVariant {
    pub path: String,
    pub range: VersionReq,
}

#[derive(Debug, Clone)]
pub struct Mirror {
    pub os: Os,
    /// `None` means the mirror serves every architecture of that OS.
    pub arch: Option<Arch>,
    pub url_template: String,
    pub location: BinaryLocation,
}

impl Mirror {
    /// Pick the binary path for a resolved version. Paths may carry the
    /// same `{{version}}` placeholder as URL templates.
    pub fn binary_path(&self, version: &Version) -> Result<String> {
        let path = match &self.location {
            BinaryLocation::Fixed(path) => path.clone(),
            BinaryLocation::Versioned(variants) => variants
                .iter()
                .find(|v| v.range.matches(version))
                .map(|v| v.path.clone())
                .ok_or_else(|| {
                    Error::Configuration(format!(
                        "no binary variant covers version {} for {}",
                        version, self.os
                    ))
                })?,
        };
        Ok(expand_template(&path, version))
    }

    pub fn url(&self, version: &Version) -> String {
        expand_template(&self.url_template, version)
    }
}

/// Cosmetic file deleted after extraction; the IDE shows it even in
/// command-line mode on these platforms.
#[derive(Debug, Clone)]
pub struct SplashAsset {
    pub os: Os,
    pub path: String,
}

/// Immutable mirror configuration: version-list endpoint, download mirrors
/// and splash assets.
#[derive(Debug, Clone)]
pub struct MirrorTable {
    pub list_url: String,
    pub mirrors: Vec<Mirror>,
    pub splash: Vec<SplashAsset>,
}

impl MirrorTable {
    /// The compiled-in table for the official Arduino IDE mirrors.
    pub fn official() -> Self {
        let template = |suffix: &str| {
            format!(
                "{}/{{{{version}}}}/arduino-{{{{version}}}}-{}.zip",
                DOWNLOAD_BASE, suffix
            )
        };

        MirrorTable {
            list_url: VERSION_LIST_ENDPOINT.to_string(),
            mirrors: vec![
                Mirror {
                    os: Os::Windows,
                    arch: None,
                    url_template: template("windows"),
                    location: BinaryLocation::Fixed("arduino_debug.exe".to_string()),
                },
                Mirror {
                    os: Os::MacOs,
                    arch: None,
                    url_template: template("macosx"),
                    location: BinaryLocation::Versioned(vec![
                        BinaryVariant {
                            path: "Contents/MacOS/Arduino".to_string(),
                            range: VersionReq::parse(">=1.6.0")
                                .expect("built-in version range"),
                        },
                        BinaryVariant {
                            path: "Contents/MacOS/JavaAppLauncher".to_string(),
                            range: VersionReq::parse("<=1.5.8")
                                .expect("built-in version range"),
                        },
                    ]),
                },
                Mirror {
                    os: Os::Linux,
                    arch: Some(Arch::X86),
                    url_template: template("linux32"),
                    location: BinaryLocation::Fixed("arduino".to_string()),
                },
                Mirror {
                    os: Os::Linux,
                    arch: Some(Arch::X64),
                    url_template: template("linux64"),
                    location: BinaryLocation::Fixed("arduino".to_string()),
                },
                Mirror {
                    os: Os::Linux,
                    arch: Some(Arch::Arm),
                    url_template: template("linuxarm"),
                    location: BinaryLocation::Fixed("arduino".to_string()),
                },
            ],
            splash: vec![
                SplashAsset {
                    os: Os::Windows,
                    path: "lib/splash.png".to_string(),
                },
                SplashAsset {
                    os: Os::MacOs,
                    path: "Contents/Java/lib/splash.png".to_string(),
                },
            ],
        }
    }

    /// Reject structurally broken tables up front instead of discovering
    /// the defect halfway through an install.
    pub fn validate(&self) -> Result<()> {
        if self.list_url.is_empty() {
            return Err(Error::Configuration(
                "version list endpoint is empty".to_string(),
            ));
        }
        if self.mirrors.is_empty() {
            return Err(Error::Configuration("mirror table is empty".to_string()));
        }
        for mirror in &self.mirrors {
            if !mirror.url_template.contains("{{version}}") {
                return Err(Error::Configuration(format!(
                    "mirror URL for {} is missing the {{{{version}}}} placeholder: {}",
                    mirror.os, mirror.url_template
                )));
            }
            if let BinaryLocation::Versioned(variants) = &mirror.location {
                if variants.is_empty() {
                    return Err(Error::Configuration(format!(
                        "mirror for {} declares an empty variant list",
                        mirror.os
                    )));
                }
            }
        }
        Ok(())
    }

    /// The mirror whose binary path applies to the given platform.
    pub fn mirror_for(&self, platform: &Platform) -> Result<&Mirror> {
        self.mirrors
            .iter()
            .find(|m| m.os == platform.os && m.arch.map_or(true, |a| a == platform.arch))
            .ok_or_else(|| {
                Error::Configuration(format!("no download mirror for platform {}", platform))
            })
    }

    /// Splash assets applying to the given OS.
    pub fn splash_for(&self, os: Os) -> impl Iterator<Item = &SplashAsset> {
        self.splash.iter().filter(move |s| s.os == os)
    }
}

impl Default for MirrorTable {
    fn default() -> Self {
        Self::official()
    }
}

/// Substitute every `{{version}}` occurrence in a URL template.
pub fn expand_template(template: &str, version: &Version) -> String {
    template.replace("{{version}}", &version.to_string())
}

//! arduino-manager - Download, install and run the Arduino IDE
//!
//! An embeddable controller that resolves a version spec against the
//! published catalog, downloads the matching platform archive from the
//! mirror list, extracts it and exposes the resulting binary:
//!
//! ```no_run
//! use arduino_manager::{Arduino, Options};
//!
//! # async fn example() -> arduino_manager::Result<()> {
//! let arduino = Arduino::new(Options {
//!     version: "1.8.19".to_string(),
//!     ..Options::default()
//! })?;
//!
//! arduino.load().await?;
//! let outcome = arduino.run(["--verify", "sketch.ino"]).await?;
//! println!("exit code: {:?}", outcome.code);
//! arduino.unload().await?;
//! # Ok(())
//! # }
//! ```

mod arduino;
mod error;
mod installer;
mod mirrors;
mod platform;
mod resolver;

pub use arduino::{Arduino, Options, ProcessOutcome};
pub use error::{Error, Result};
pub use installer::{BinInstaller, DownloadSource, InstallOptions};
pub use mirrors::{
    BinaryLocation, BinaryVariant, Mirror, MirrorTable, SplashAsset, MIN_SUPPORTED_VERSION,
    VERSION_LIST_ENDPOINT,
};
pub use platform::{Arch, Os, Platform};
pub use resolver::{sanitize, VersionResolver, LATEST};

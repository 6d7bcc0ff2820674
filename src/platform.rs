//! Runtime OS and architecture detection

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Windows,
    MacOs,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86,
    X64,
    Arm,
    Aarch64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// Detect the running platform.
    pub fn current() -> Result<Self> {
        let os = if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else if cfg!(target_os = "linux") {
            Os::Linux
        } else {
            return Err(Error::Configuration(format!(
                "unsupported operating system: {}",
                std::env::consts::OS
            )));
        };

        let arch = if cfg!(target_arch = "x86_64") {
            Arch::X64
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else if cfg!(target_arch = "arm") {
            Arch::Arm
        } else if cfg!(target_arch = "aarch64") {
            Arch::Aarch64
        } else {
            return Err(Error::Configuration(format!(
                "unsupported architecture: {}",
                std::env::consts::ARCH
            )));
        };

        Ok(Platform { os, arch })
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Os::Windows => "windows",
            Os::MacOs => "macos",
            Os::Linux => "linux",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Arch::X86 => "x86",
            Arch::X64 => "x64",
            Arch::Arm => "arm",
            Arch::Aarch64 => "aarch64",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform_detected() {
        let platform = Platform::current().unwrap();
        assert_eq!(platform.to_string(), format!("{}-{}", platform.os, platform.arch));
    }

    #[test]
    fn test_os_display() {
        assert_eq!(Os::Windows.to_string(), "windows");
        assert_eq!(Os::MacOs.to_string(), "macos");
        assert_eq!(Os::Linux.to_string(), "linux");
    }

    #[test]
    fn test_arch_serialization() {
        let json = serde_json::to_string(&Arch::Aarch64).unwrap();
        assert_eq!(json, "\"aarch64\"");
        let parsed: Arch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Arch::Aarch64);
    }
}

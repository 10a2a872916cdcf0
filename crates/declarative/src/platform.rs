//! Host platform detection and provider dispatch.
//!
//! The platform set is closed: every supported family is a variant of
//! [`Platform`], and anything else maps to `None` ("no provider").

use crate::group::Group;
use std::fmt;

/// Supported host platform families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    /// Every supported platform.
    pub const ALL: [Platform; 3] = [Self::MacOs, Self::Linux, Self::Windows];

    /// Parse a platform identifier.
    ///
    /// Accepts the values of `std::env::consts::OS` plus common aliases.
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "osx" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            "windows" | "win32" => Some(Self::Windows),
            _ => None,
        }
    }

    /// The platform this binary is running on, if supported.
    pub fn current() -> Option<Self> {
        Self::parse(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a platform to its ordered configuration groups.
pub trait Provider {
    fn groups(&self, platform: Platform) -> Vec<Group>;
}

/// Resolve an opaque platform identifier to groups.
///
/// `None` means no provider exists for this host; callers must treat that
/// as fatal before reconciling anything. A provider that returns groups
/// with no items is a different condition, reported per group.
pub fn resolve<P: Provider + ?Sized>(provider: &P, platform_id: &str) -> Option<Vec<Group>> {
    Platform::parse(platform_id).map(|platform| provider.groups(platform))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OnePerPlatform;

    impl Provider for OnePerPlatform {
        fn groups(&self, platform: Platform) -> Vec<Group> {
            vec![Group::new(platform.as_str())]
        }
    }

    #[test]
    fn test_parse_known_and_aliases() {
        assert_eq!(Platform::parse("macos"), Some(Platform::MacOs));
        assert_eq!(Platform::parse("Darwin"), Some(Platform::MacOs));
        assert_eq!(Platform::parse(" linux "), Some(Platform::Linux));
        assert_eq!(Platform::parse("windows"), Some(Platform::Windows));
        assert_eq!(Platform::parse("freebsd"), None);
        assert_eq!(Platform::parse(""), None);
    }

    #[test]
    fn test_round_trip_names() {
        for platform in Platform::ALL {
            assert_eq!(Platform::parse(platform.as_str()), Some(platform));
            assert_eq!(platform.to_string(), platform.as_str());
        }
    }

    #[test]
    fn test_resolve_unknown_platform_is_none() {
        assert!(resolve(&OnePerPlatform, "plan9").is_none());
    }

    #[test]
    fn test_resolve_known_platform() {
        let groups = resolve(&OnePerPlatform, "linux").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name(), "linux");
    }
}

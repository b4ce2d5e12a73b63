//! Build information
//!
//! Compile-time build number and timestamp embedded by `build.rs`.

/// Build number, incremented on each recompilation
pub const BUILD_NUMBER: u64 = match option_env!("FWD_BUILD_NUMBER") {
    Some(s) => match parse_u64(s) {
        Some(n) => n,
        None => 0,
    },
    None => 0,
};

/// Build timestamp in ISO 8601 format
pub const BUILD_TIMESTAMP: &str = match option_env!("FWD_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// str::parse is not const
const fn parse_u64(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut result: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            return None;
        }
        result = result * 10 + (b - b'0') as u64;
        i += 1;
    }
    Some(result)
}

/// The build fields reported by `fwd_status`
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
        }
    }

    fn banner(&self) -> String {
        let rule = "=".repeat(47);
        format!(
            "{rule}\n  Food & Wellness Diary (FWD)\n  Version: {} | Build: {}\n  Compiled: {}\n{rule}",
            self.version, self.build_number, self.build_timestamp
        )
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner() {
    eprintln!("{}", BuildInfo::current().banner());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64("0"), Some(0));
        assert_eq!(parse_u64(""), None);
        assert_eq!(parse_u64("4x"), None);
    }

    #[test]
    fn test_banner() {
        let info = BuildInfo {
            version: "1.2.3",
            build_number: 7,
            build_timestamp: "2025-01-09T12:00:00Z",
        };
        let banner = info.banner();
        assert!(banner.contains("Version: 1.2.3 | Build: 7"));
        assert!(banner.contains("Compiled: 2025-01-09T12:00:00Z"));
        assert_eq!(banner.lines().count(), 5);
    }
}

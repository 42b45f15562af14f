use log::debug;

/// Environment variable that turns the native backend off when set to a false value.
pub const ENABLED_ENV: &str = "NATIVE_FS_ENABLED";

/// Environment variable that overrides the host's path case policy.
pub const CASE_SENSITIVE_ENV: &str = "NATIVE_FS_CASE_SENSITIVE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Case policy of the host filesystem conventions.
    pub fn host() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            CaseSensitivity::Insensitive
        } else {
            CaseSensitivity::Sensitive
        }
    }
}

impl Default for CaseSensitivity {
    fn default() -> Self {
        Self::host()
    }
}

#[derive(Debug, Clone)]
pub struct FsConfig {
    pub enabled: bool,
    pub case_sensitivity: CaseSensitivity,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            case_sensitivity: CaseSensitivity::host(),
        }
    }
}

impl FsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENABLED_ENV) {
            match parse_flag(&value) {
                Some(enabled) => config.enabled = enabled,
                None => debug!("Ignoring unrecognized {}={}", ENABLED_ENV, value),
            }
        }

        if let Some(value) = lookup(CASE_SENSITIVE_ENV) {
            match parse_flag(&value) {
                Some(true) => config.case_sensitivity = CaseSensitivity::Sensitive,
                Some(false) => config.case_sensitivity = CaseSensitivity::Insensitive,
                None => debug!("Ignoring unrecognized {}={}", CASE_SENSITIVE_ENV, value),
            }
        }

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

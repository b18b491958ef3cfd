//! Process-wide defaults (spec 4.13 / 6), threaded explicitly into table
//! construction rather than read implicitly by the core.

use crate::dialect::Dialect;
use std::path::PathBuf;
use std::sync::OnceLock;

/// How to handle a logical (`L`) field byte that is not one of
/// `T/t/Y/y/F/f/N/n/?`/space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalPolicy {
    /// Raise `XbaseError::BadData`.
    Raise,
    /// Treat it as the unknown logical value.
    Unknown,
}

/// Bundle of defaults a caller can override per table at open/create time.
#[derive(Debug, Clone)]
pub struct Config {
    pub default_codepage: &'static str,
    pub default_dialect: Dialect,
    pub default_input_decoding: &'static str,
    pub backup_dir: Option<PathBuf>,
    pub logical_bad_data_policy: LogicalPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_codepage: "ascii",
            default_dialect: Dialect::DBaseIII,
            default_input_decoding: "ascii",
            backup_dir: None,
            logical_bad_data_policy: LogicalPolicy::Raise,
        }
    }
}

static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    /// The process-wide default, set once via [`Config::set_global`]
    /// or falling back to [`Config::default`]. A convenience layer only --
    /// nothing in the core reads this implicitly.
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Install a process-wide default. Must be called before the first
    /// call to [`Config::global`]; later calls are ignored, matching
    /// `OnceLock` semantics.
    pub fn set_global(config: Config) {
        let _ = GLOBAL_CONFIG.set(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_historical_behavior() {
        let cfg = Config::default();
        assert_eq!(cfg.default_codepage, "ascii");
        assert_eq!(cfg.default_dialect, Dialect::DBaseIII);
        assert_eq!(cfg.logical_bad_data_policy, LogicalPolicy::Raise);
        assert!(cfg.backup_dir.is_none());
    }
}

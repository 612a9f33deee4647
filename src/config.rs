//! Where to find the runtime and how to start it.
//!
//! ## Environment Variables
//!
//! - `MONO_REFLECT_LIB`: path to the Mono shared library. When unset, the
//!   platform's usual library names are tried through the system loader.
//! - `MONO_REFLECT_DEBUG`: `"1"` or `"true"` turns on debug symbol loading.
//! - `MONO_REFLECT_LOG`: log filter for the `dump-class` binary.
use std::{env, path::PathBuf};

pub const LIB_ENV: &str = "MONO_REFLECT_LIB";
pub const DEBUG_ENV: &str = "MONO_REFLECT_DEBUG";
pub const LOG_ENV: &str = "MONO_REFLECT_LOG";

#[cfg(target_os = "windows")]
const DEFAULT_LIBRARIES: &[&str] = &["mono-2.0-sgen.dll", "mono-2.0-bdwgc.dll", "mono.dll"];
#[cfg(target_os = "macos")]
const DEFAULT_LIBRARIES: &[&str] = &["libmonosgen-2.0.dylib", "libmono-2.0.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const DEFAULT_LIBRARIES: &[&str] = &["libmonosgen-2.0.so.1", "libmonosgen-2.0.so", "libmono-2.0.so"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Explicit runtime library; takes precedence over the defaults.
    pub library: Option<PathBuf>,
    /// Ask the runtime to load debug symbols for managed code.
    pub debug_symbols: bool,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            library: var(LIB_ENV).filter(|s| !s.is_empty()).map(PathBuf::from),
            debug_symbols: var(DEBUG_ENV)
                .map(|v| matches!(v.as_str(), "1" | "true"))
                .unwrap_or(false),
        }
    }

    /// Libraries to try, in order. An explicit library is the only candidate.
    pub fn library_candidates(&self) -> Vec<PathBuf> {
        match &self.library {
            Some(path) => vec![path.clone()],
            None => DEFAULT_LIBRARIES.iter().map(PathBuf::from).collect(),
        }
    }
}

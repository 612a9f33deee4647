use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonoLoadError {
    #[error("no Mono runtime library found (tried {})", display_paths(.tried))]
    LibraryNotFound { tried: Vec<PathBuf> },

    #[error("failed to load Mono runtime library: {0}")]
    Library(#[from] libloading::Error),

    #[error("Mono runtime library is missing symbol `{name}`: {source}")]
    MissingSymbol {
        name: &'static str,
        source: libloading::Error,
    },

    #[error("JIT initialisation failed: {0}")]
    JitInit(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

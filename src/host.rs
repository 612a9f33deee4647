//! Process-level glue: one-time environment setup and registration of native
//! functions callable from managed code.
use crate::runtime::RuntimeApi;
use parking_lot::Once;
use std::{env, ffi::c_void, path::Path};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// Ask the runtime to load debug symbols for managed code.
    pub debug_symbols: bool,
}

/// The side effects performed by [`core_initialize`].
pub trait HostEnvironment {
    /// Makes libraries next to the host executable loadable.
    fn augment_library_search_path(&self);
    /// Turns on the runtime's debug symbol support. Only effective before
    /// the JIT has started.
    fn enable_debug_symbols(&self, runtime: &dyn RuntimeApi);
}

/// The real process environment.
#[derive(Debug, Default)]
pub struct ProcessEnvironment;

impl HostEnvironment for ProcessEnvironment {
    fn augment_library_search_path(&self) {
        let exe_dir = match env::current_exe() {
            Ok(exe) => exe.parent().map(Path::to_path_buf),
            Err(e) => {
                tracing::warn!(error = %e, "cannot locate host executable");
                None
            }
        };
        let Some(exe_dir) = exe_dir else {
            return;
        };

        if cfg!(windows) {
            // dependent DLLs are resolved through PATH
            let mut paths: Vec<_> = env::var_os("PATH")
                .map(|p| env::split_paths(&p).collect())
                .unwrap_or_default();
            if paths.contains(&exe_dir) {
                return;
            }
            paths.push(exe_dir.clone());
            match env::join_paths(paths) {
                Ok(joined) => {
                    env::set_var("PATH", joined);
                    tracing::debug!(dir = %exe_dir.display(), "appended host directory to PATH");
                }
                Err(e) => tracing::warn!(error = %e, "cannot extend PATH"),
            }
        } else {
            // the dynamic loader reads its search path once at startup
            tracing::debug!(dir = %exe_dir.display(), "library search path left unchanged");
        }
    }

    fn enable_debug_symbols(&self, runtime: &dyn RuntimeApi) {
        runtime.debug_init();
        tracing::debug!("enabled runtime debug symbols");
    }
}

/// Runs environment setup at most once for the lifetime of the guard.
pub struct InitGuard {
    once: Once,
}

impl InitGuard {
    pub const fn new() -> Self {
        Self { once: Once::new() }
    }

    /// Performs setup if nobody has yet. Returns whether this call did it.
    pub fn run(
        &self,
        environment: &dyn HostEnvironment,
        runtime: &dyn RuntimeApi,
        options: &InitOptions,
    ) -> bool {
        let mut ran = false;
        self.once.call_once(|| {
            environment.augment_library_search_path();
            if options.debug_symbols {
                environment.enable_debug_symbols(runtime);
            }
            ran = true;
        });
        if ran {
            tracing::info!(?options, "host environment initialised");
        }
        ran
    }

    pub fn is_done(&self) -> bool {
        self.once.state().done()
    }
}

impl Default for InitGuard {
    fn default() -> Self {
        Self::new()
    }
}

static CORE_INIT: InitGuard = InitGuard::new();

/// Prepares the process for hosting `runtime`. Call it after the runtime
/// library is loaded and before [`MonoApi::jit_init`](crate::MonoApi::jit_init).
/// Only the first call in a process has any effect.
pub fn core_initialize(runtime: &dyn RuntimeApi, options: &InitOptions) -> bool {
    core_initialize_with(&ProcessEnvironment, runtime, options)
}

/// [`core_initialize`] with a caller-supplied environment. Shares the same
/// process-wide guard.
pub fn core_initialize_with(
    environment: &dyn HostEnvironment,
    runtime: &dyn RuntimeApi,
    options: &InitOptions,
) -> bool {
    CORE_INIT.run(environment, runtime, options)
}

pub fn is_initialized() -> bool {
    CORE_INIT.is_done()
}

/// Exposes a native function to managed code as the implementation of the
/// `extern` method `name` (e.g. `"Game.Native::Log"`).
///
/// # Safety
/// `function` must stay valid for the life of the process and match the
/// managed declaration's signature and calling convention.
pub unsafe fn add_internal_call(runtime: &dyn RuntimeApi, name: &str, function: *const c_void) {
    runtime.add_internal_call(name, function);
}

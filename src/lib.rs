//! Handle-based reflection over an embedded Mono runtime.
//!
//! Every reflection concept is a small `Copy` value wrapping one runtime
//! handle ([`types::Class`], [`types::Field`], [`types::Method`],
//! [`value::ObjectRef`], ...). Wrappers borrow the [`runtime::RuntimeApi`]
//! they came from, so they cannot outlive the binding; they never own the
//! underlying metadata or object.
//!
//! ```ignore
//! let mono = MonoApi::load(&RuntimeConfig::from_env())?;
//! let domain = Domain::root(&mono).expect("runtime not started");
//! let image = domain.open_assembly("Game.dll").and_then(|a| a.image()).unwrap();
//! let unit = image.find_class("Game", "Unit").unwrap();
//! for (field, declaring) in unit.fields_upward() {
//!     println!("{}::{:?}", declaring.name().unwrap_or_default(), field.name());
//! }
//! ```
//!
//! Nothing here is thread-safe: wrappers are `!Send` and every call must be
//! made from a thread attached to the runtime.
pub mod config;
pub mod error;
pub mod handle;
pub mod host;
pub mod mono;
pub mod resolve;
pub mod runtime;
pub mod types;
pub mod utils;
pub mod value;

pub use config::RuntimeConfig;
pub use error::MonoLoadError;
pub use handle::{Managed, RawHandle};
pub use mono::MonoApi;
pub use resolve::{Assembly, Domain, Image};
pub use runtime::RuntimeApi;
pub use types::{Class, Field, Method, Property, Type};
pub use value::ObjectRef;

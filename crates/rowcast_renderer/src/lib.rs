//! # ROWCAST Renderer
//!
//! Server-side renderers for per-item UI fragments, projected to a client
//! runtime and wired back to server handlers.
//!
//! ## Architecture
//!
//! ```text
//!                  RendererDescriptor<T>
//!        ┌──────────────┬───────────────┬────────────┐
//!        │ template     │ properties    │ callables  │ namespace
//!        └──────────────┴───────┬───────┴─────┬──────┘
//!                               │             │
//!              DataGenerator ◄──┘             └──► Rendering (per container)
//!        item -> {"rr_<token>_name": ..}           install / dispatch / uninstall
//! ```
//!
//! - **Property Binding Table**: property name -> extractor, written under
//!   the descriptor's namespace into each item payload
//! - **Callable Dispatch Table**: client `(function, item key, args)` ->
//!   server handler for the resolved item
//! - **Rendering**: installs on every attach, uninstalls once on unbind
//!
//! The hosting framework is injected through the traits in [`host`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use rowcast_renderer::RendererDescriptor;
//!
//! let renderer = RendererDescriptor::<Person>::jsx("<b onClick={onClick}>{item.name}</b>")
//!     .with_property("name", |p| p.full_name.clone())?
//!     .with_function("onClick", |p| tracing::info!("clicked {}", p.full_name))?;
//!
//! let rendering = renderer.render(&column, window, "renderer")?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod callables;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod properties;
pub mod rendering;

#[cfg(test)]
mod mock;

pub use callables::{CallableDispatchTable, DispatchOutcome, Handler};
pub use config::RendererConfig;
pub use descriptor::{DataGenerator, RendererDescriptor};
pub use error::{RendererError, RendererResult};
pub use host::{
    AttachListener, AttachNotifier, ChannelCallback, ChannelRegistration, ClientExecutor,
    Container, KeyMapper, Registration, ReturnChannelMap,
};
pub use properties::PropertyBindingTable;
pub use rendering::{BindingState, Rendering};

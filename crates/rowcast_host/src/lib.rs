//! # ROWCAST Host
//!
//! In-memory reference host for the renderer core, plus a simulated client
//! runtime. Together they run the full server ⇄ client loop in one process:
//!
//! ```text
//! SERVER (Host)                                CLIENT (ClientRuntime)
//!   Rendering ── install ──► outbound queue ──► apply()
//!   DataGenerator ─► serialize_items() ───────► render_item()
//!   Host::deliver() ◄──── [fn, key, args] ◄─── invoke()
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let host = Host::new("ROOT-1");
//! let root = host.create_element();
//! host.attach_root(&root)?;
//!
//! let window = KeyWindow::new();
//! let rendering = descriptor.render(&root, window.clone(), "renderer")?;
//!
//! let mut client = ClientRuntime::new();
//! client.sync(&host);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod feed;
pub mod host;
pub mod key_window;
pub mod tree;

pub use client::{ClientRuntime, InstalledRenderer, RenderedItem};
pub use error::{HostError, HostResult};
pub use feed::serialize_items;
pub use host::{Element, Host, Outbound};
pub use key_window::KeyWindow;
pub use tree::ComponentTree;

//! # Renderer Descriptor
//!
//! A client template plus the two binding tables and a namespace. One
//! descriptor can be rendered into many containers; every rendering shares
//! the descriptor's tables and namespace.
//!
//! ```rust,ignore
//! let renderer = RendererDescriptor::<Person>::jsx("<b>{item.name}</b>")
//!     .with_property("name", |p| p.full_name.clone())?
//!     .with_function("onClick", |p| println!("clicked {}", p.full_name))?;
//!
//! let rendering = renderer.render(&column, window, "renderer")?;
//! // ...
//! rendering.unbind();
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};

use rowcast_shared::{Namespace, TemplateMode};

use crate::callables::CallableDispatchTable;
use crate::config::RendererConfig;
use crate::error::{RendererError, RendererResult};
use crate::host::{Container, KeyMapper};
use crate::properties::PropertyBindingTable;
use crate::rendering::Rendering;

/// State shared by a descriptor, its data generators and its renderings.
pub(crate) struct DescriptorInner<T> {
    pub(crate) template_expression: String,
    pub(crate) mode: TemplateMode,
    pub(crate) namespace: Namespace,
    pub(crate) properties: RwLock<PropertyBindingTable<T>>,
    pub(crate) callables: RwLock<CallableDispatchTable<T>>,
}

/// Server-side description of a per-item client renderer.
///
/// Cloning is cheap and yields a handle to the same descriptor.
pub struct RendererDescriptor<T> {
    inner: Arc<DescriptorInner<T>>,
}

impl<T> Clone for RendererDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> RendererDescriptor<T> {
    /// Creates a descriptor with a fresh namespace from the thread RNG.
    #[must_use]
    pub fn new(template_expression: impl Into<String>, mode: TemplateMode) -> Self {
        Self::with_rng(template_expression, mode, &mut rand::thread_rng())
    }

    /// Creates a descriptor whose template uses element-construction calls.
    #[must_use]
    pub fn of(template_expression: impl Into<String>) -> Self {
        Self::new(template_expression, TemplateMode::CreateElement)
    }

    /// Creates a descriptor whose template is markup to transpile.
    #[must_use]
    pub fn jsx(template_expression: impl Into<String>) -> Self {
        Self::new(template_expression, TemplateMode::Jsx)
    }

    /// Creates a descriptor with a namespace drawn from `rng`.
    #[must_use]
    pub fn with_rng<R: Rng + ?Sized>(
        template_expression: impl Into<String>,
        mode: TemplateMode,
        rng: &mut R,
    ) -> Self {
        Self::from_parts(template_expression.into(), mode, Namespace::generate_with(rng))
    }

    /// Creates a descriptor whose namespace follows `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidConfig`] if `config` does not validate.
    pub fn with_config(
        template_expression: impl Into<String>,
        mode: TemplateMode,
        config: &RendererConfig,
    ) -> RendererResult<Self> {
        config.validate()?;
        let namespace = Namespace::with_prefix(
            &config.namespace_prefix,
            config.namespace_token_len,
            &mut rand::thread_rng(),
        );
        Ok(Self::from_parts(template_expression.into(), mode, namespace))
    }

    fn from_parts(template_expression: String, mode: TemplateMode, namespace: Namespace) -> Self {
        Self {
            inner: Arc::new(DescriptorInner {
                template_expression,
                mode,
                namespace,
                properties: RwLock::new(PropertyBindingTable::new()),
                callables: RwLock::new(CallableDispatchTable::new()),
            }),
        }
    }

    /// Binds `property` to a value extracted from each item.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidArgument`] if `property` is empty.
    pub fn bind<V, F>(&self, property: &str, extractor: F) -> RendererResult<()>
    where
        V: Serialize + 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.inner.properties.write().bind(property, extractor)
    }

    /// Registers a callable the client can invoke with arguments.
    ///
    /// Registering after renderings exist only reaches the client on the
    /// next install.
    ///
    /// # Errors
    ///
    /// [`RendererError::InvalidArgument`] for an empty name,
    /// [`RendererError::InvalidFormat`] for a non-alphanumeric one.
    pub fn register<F>(&self, name: &str, handler: F) -> RendererResult<()>
    where
        F: Fn(&T, &[Value]) + Send + Sync + 'static,
    {
        self.inner.callables.write().register(name, handler)
    }

    /// Registers a callable whose handler ignores the client arguments.
    ///
    /// # Errors
    ///
    /// Same as [`RendererDescriptor::register`].
    pub fn register_simple<F>(&self, name: &str, handler: F) -> RendererResult<()>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.callables.write().register_simple(name, handler)
    }

    /// Chainable form of [`RendererDescriptor::bind`].
    ///
    /// # Errors
    ///
    /// Same as [`RendererDescriptor::bind`].
    pub fn with_property<V, F>(self, property: &str, extractor: F) -> RendererResult<Self>
    where
        V: Serialize + 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.bind(property, extractor)?;
        Ok(self)
    }

    /// Chainable form of [`RendererDescriptor::register_simple`].
    ///
    /// # Errors
    ///
    /// Same as [`RendererDescriptor::register`].
    pub fn with_function<F>(self, name: &str, handler: F) -> RendererResult<Self>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register_simple(name, handler)?;
        Ok(self)
    }

    /// Chainable form of [`RendererDescriptor::register`].
    ///
    /// # Errors
    ///
    /// Same as [`RendererDescriptor::register`].
    pub fn with_function_args<F>(self, name: &str, handler: F) -> RendererResult<Self>
    where
        F: Fn(&T, &[Value]) + Send + Sync + 'static,
    {
        self.register(name, handler)?;
        Ok(self)
    }

    /// Client-evaluated template.
    #[must_use]
    pub fn template_expression(&self) -> &str {
        &self.inner.template_expression
    }

    /// How the client builds the template.
    #[must_use]
    pub fn mode(&self) -> TemplateMode {
        self.inner.mode
    }

    /// Namespace of every wire key this descriptor writes.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    /// Bound property names, sorted.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.inner.properties.read().names()
    }

    /// Registered callable names, sorted.
    #[must_use]
    pub fn callable_names(&self) -> Vec<String> {
        self.inner.callables.read().names()
    }

    /// Per-item payload writer for the data layer.
    #[must_use]
    pub fn data_generator(&self) -> DataGenerator<T> {
        DataGenerator {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Starts a live binding of this descriptor on `container`.
    ///
    /// The return channel is registered before anything is installed. If
    /// the container is already attached the install is sent immediately,
    /// otherwise on the first attach.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidArgument`] if `renderer_name` is empty.
    pub fn render<C, K>(
        &self,
        container: &Arc<C>,
        key_mapper: K,
        renderer_name: &str,
    ) -> RendererResult<Rendering<T>>
    where
        C: Container + 'static,
        K: KeyMapper<T> + 'static,
    {
        if renderer_name.is_empty() {
            return Err(RendererError::InvalidArgument(
                "renderer name must not be empty".to_string(),
            ));
        }

        let container: Arc<dyn Container> = Arc::clone(container) as Arc<dyn Container>;
        Ok(Rendering::start(
            Arc::clone(&self.inner),
            container,
            Arc::new(key_mapper),
            renderer_name.to_string(),
        ))
    }
}

impl<T> fmt::Debug for RendererDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererDescriptor")
            .field("template_expression", &self.inner.template_expression)
            .field("mode", &self.inner.mode)
            .field("namespace", &self.inner.namespace)
            .field("properties", &*self.inner.properties.read())
            .field("callables", &*self.inner.callables.read())
            .finish()
    }
}

/// Writes a descriptor's namespaced properties into item payloads.
///
/// Safe to call from several threads at once for different items.
pub struct DataGenerator<T> {
    inner: Arc<DescriptorInner<T>>,
}

impl<T> DataGenerator<T> {
    pub(crate) fn from_inner(inner: Arc<DescriptorInner<T>>) -> Self {
        Self { inner }
    }

    /// Namespace of the written keys.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    /// Merges this descriptor's properties for `item` into `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Serialization`] if a property value cannot
    /// be represented as JSON.
    pub fn generate(&self, item: &T, payload: &mut Map<String, Value>) -> RendererResult<()> {
        // Extractors run unlocked so they may bind on this descriptor.
        let properties = self.inner.properties.read().snapshot();
        properties.generate(&self.inner.namespace, item, payload)
    }

    /// Returns a fresh payload holding only this descriptor's properties.
    ///
    /// # Errors
    ///
    /// Same as [`DataGenerator::generate`].
    pub fn payload_for(&self, item: &T) -> RendererResult<Map<String, Value>> {
        let mut payload = Map::new();
        self.generate(item, &mut payload)?;
        Ok(payload)
    }
}

impl<T> Clone for DataGenerator<T> {
    fn clone(&self) -> Self {
        Self::from_inner(Arc::clone(&self.inner))
    }
}

impl<T> fmt::Debug for DataGenerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGenerator")
            .field("namespace", &self.inner.namespace)
            .finish()
    }
}

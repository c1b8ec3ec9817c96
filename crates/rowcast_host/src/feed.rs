//! Per-item data feed.
//!
//! Builds the wire payload of each visible item: its client key plus the
//! namespaced properties of every renderer shown for it.
//!
//! ```text
//! { "key": "k7",
//!   "rr_ab12cd34ef56ab78_name": "Ada",      <- name column renderer
//!   "rr_90fe1d2c3b4a5968_name": "ADA" }     <- header renderer
//! ```

use serde_json::{Map, Value};

use rowcast_renderer::{DataGenerator, RendererResult};
use rowcast_shared::ITEM_KEY_FIELD;

use crate::key_window::KeyWindow;

/// Tracks `items` in `window` and returns one payload per item, in order.
///
/// # Errors
///
/// Returns the first [`rowcast_renderer::RendererError::Serialization`]
/// raised by a generator. Items already tracked stay in the window.
pub fn serialize_items<T: Clone>(
    generators: &[DataGenerator<T>],
    window: &KeyWindow<T>,
    items: &[T],
) -> RendererResult<Vec<Map<String, Value>>> {
    let mut payloads = Vec::with_capacity(items.len());

    for item in items {
        let key = window.track(item.clone());
        let mut payload = Map::new();
        payload.insert(ITEM_KEY_FIELD.to_string(), Value::String(key.clone()));

        for generator in generators {
            if let Err(e) = generator.generate(item, &mut payload) {
                tracing::warn!("Failed to serialize item {} ({}): {}", key, generator.namespace(), e);
                return Err(e);
            }
        }
        payloads.push(payload);
    }

    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowcast_renderer::{KeyMapper, RendererDescriptor, RendererError};
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Clone, Debug, PartialEq)]
    struct Person {
        full_name: String,
    }

    fn people() -> Vec<Person> {
        ["Ada", "Grace"]
            .into_iter()
            .map(|name| Person {
                full_name: name.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_payload_per_item() {
        let descriptor = RendererDescriptor::<Person>::jsx("<b>{item.name}</b>")
            .with_property("name", |p| p.full_name.clone())
            .unwrap();
        let window = KeyWindow::new();

        let payloads =
            serialize_items(&[descriptor.data_generator()], &window, &people()).unwrap();

        let name_key = descriptor.namespace().key_for("name");
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0][ITEM_KEY_FIELD], json!("k1"));
        assert_eq!(payloads[0][&name_key], json!("Ada"));
        assert_eq!(payloads[1][ITEM_KEY_FIELD], json!("k2"));
        assert_eq!(window.resolve("k2"), Some(people()[1].clone()));
    }

    #[test]
    fn test_generators_merge_into_one_payload() {
        let plain = RendererDescriptor::<Person>::jsx("<b/>")
            .with_property("name", |p| p.full_name.clone())
            .unwrap();
        let loud = RendererDescriptor::<Person>::jsx("<i/>")
            .with_property("name", |p| p.full_name.to_uppercase())
            .unwrap();

        let payloads = serialize_items(
            &[plain.data_generator(), loud.data_generator()],
            &KeyWindow::new(),
            &people()[..1],
        )
        .unwrap();

        assert_eq!(payloads[0].len(), 3);
        assert_eq!(payloads[0][&plain.namespace().key_for("name")], json!("Ada"));
        assert_eq!(payloads[0][&loud.namespace().key_for("name")], json!("ADA"));
    }

    #[test]
    fn test_serialization_failure_reported() {
        let descriptor = RendererDescriptor::<Person>::jsx("<b/>")
            .with_property("bad", |_| HashMap::from([((1, 2), 3)]))
            .unwrap();

        let result = serialize_items(&[descriptor.data_generator()], &KeyWindow::new(), &people());

        assert!(matches!(result, Err(RendererError::Serialization { .. })));
    }
}

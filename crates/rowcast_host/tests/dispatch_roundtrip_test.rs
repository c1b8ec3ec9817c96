//! Integration test for the client -> server dispatch path.
//!
//! Items are fed through a key window, rendered by the simulated client and
//! clicked; the calls travel back through the host's return channels.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use rowcast_host::{serialize_items, ClientRuntime, Element, Host, HostError, KeyWindow};
use rowcast_renderer::{Rendering, RendererDescriptor};
use rowcast_shared::ITEM_KEY_FIELD;

#[derive(Clone, Debug, PartialEq)]
struct Person {
    full_name: String,
    age: u32,
}

type Calls = Arc<Mutex<Vec<(String, String, Vec<Value>)>>>;

fn people() -> Vec<Person> {
    [("Ada", 36), ("Grace", 85), ("Edsger", 72)]
        .into_iter()
        .map(|(name, age)| Person {
            full_name: name.to_string(),
            age,
        })
        .collect()
}

fn descriptor(calls: &Calls) -> RendererDescriptor<Person> {
    let click = Arc::clone(calls);
    let edit = Arc::clone(calls);
    RendererDescriptor::jsx("<b onClick={onClick}>{item.name}</b>")
        .with_property("name", |p: &Person| p.full_name.clone())
        .unwrap()
        .with_property("age", |p: &Person| p.age)
        .unwrap()
        .with_function_args("onClick", move |p: &Person, args: &[Value]| {
            click
                .lock()
                .push(("onClick".to_string(), p.full_name.clone(), args.to_vec()));
        })
        .unwrap()
        .with_function("onEdit", move |p: &Person| {
            edit.lock()
                .push(("onEdit".to_string(), p.full_name.clone(), Vec::new()));
        })
        .unwrap()
}

struct Fixture {
    host: Host,
    column: Arc<Element>,
    window: KeyWindow<Person>,
    descriptor: RendererDescriptor<Person>,
    rendering: Rendering<Person>,
    client: ClientRuntime,
    calls: Calls,
}

fn fixture() -> Fixture {
    let host = Host::new("ROOT-2521314");
    let root = host.create_element();
    let column = host.create_element();
    host.append_child(&root, &column).unwrap();
    host.attach_root(&root).unwrap();

    let calls = Calls::default();
    let window = KeyWindow::new();
    let descriptor = descriptor(&calls);
    let rendering = descriptor.render(&column, window.clone(), "renderer").unwrap();

    let mut client = ClientRuntime::new();
    client.sync(&host);

    Fixture {
        host,
        column,
        window,
        descriptor,
        rendering,
        client,
        calls,
    }
}

#[test]
fn test_click_reaches_handler_for_item() {
    let f = fixture();
    let payloads =
        serialize_items(&[f.descriptor.data_generator()], &f.window, &people()).unwrap();

    let item = f
        .client
        .render_item(f.column.node(), "renderer", &payloads[1])
        .unwrap();
    assert_eq!(item.properties["name"], json!("Grace"));
    assert_eq!(item.properties["age"], json!(85));

    f.client
        .invoke(&f.host, f.column.node(), "renderer", &item.key, "onClick", vec![json!("left")])
        .unwrap();

    assert_eq!(
        *f.calls.lock(),
        vec![("onClick".to_string(), "Grace".to_string(), vec![json!("left")])]
    );
}

#[test]
fn test_event_arguments_are_filtered() {
    let f = fixture();
    let payloads =
        serialize_items(&[f.descriptor.data_generator()], &f.window, &people()).unwrap();
    let key = payloads[0][ITEM_KEY_FIELD].as_str().unwrap().to_string();

    let click = json!({"nativeEvent": {"button": 0}, "type": "click"});
    f.client
        .invoke(
            &f.host,
            f.column.node(),
            "renderer",
            &key,
            "onClick",
            vec![click, json!(3), json!({"row": 0})],
        )
        .unwrap();

    assert_eq!(f.calls.lock()[0].2, vec![json!(3), json!({"row": 0})]);
}

#[test]
fn test_simple_callable_ignores_arguments() {
    let f = fixture();
    let key = f.window.track(people()[2].clone());

    f.client
        .invoke(&f.host, f.column.node(), "renderer", &key, "onEdit", vec![json!("x")])
        .unwrap();

    assert_eq!(
        *f.calls.lock(),
        vec![("onEdit".to_string(), "Edsger".to_string(), Vec::new())]
    );
}

#[test]
fn test_evicted_item_is_noop() {
    let f = fixture();
    let key = f.window.track(people()[0].clone());
    f.window.evict(&key);

    let delivered =
        f.client
            .invoke(&f.host, f.column.node(), "renderer", &key, "onClick", vec![]);

    assert_eq!(delivered, Ok(()));
    assert!(f.calls.lock().is_empty());
}

#[test]
fn test_refresh_makes_old_keys_stale() {
    let f = fixture();
    let first = serialize_items(&[f.descriptor.data_generator()], &f.window, &people()).unwrap();
    f.window.clear();
    let second = serialize_items(&[f.descriptor.data_generator()], &f.window, &people()).unwrap();

    let old_key = first[0][ITEM_KEY_FIELD].as_str().unwrap();
    let new_key = second[0][ITEM_KEY_FIELD].as_str().unwrap();
    assert_ne!(old_key, new_key);

    for key in [old_key, new_key] {
        f.client
            .invoke(&f.host, f.column.node(), "renderer", key, "onClick", vec![])
            .unwrap();
    }
    assert_eq!(f.calls.lock().len(), 1);
}

#[test]
fn test_unknown_function_on_channel_is_noop() {
    let f = fixture();
    let key = f.window.track(people()[0].clone());

    assert!(f.host.deliver(
        f.rendering.channel(),
        &[json!("onDelete"), json!(key), json!([])]
    ));
    assert!(f.host.deliver(f.rendering.channel(), &[json!("onClick")]));
    assert!(f.calls.lock().is_empty());
}

#[test]
fn test_client_rejects_unadvertised_callable() {
    let f = fixture();
    let key = f.window.track(people()[0].clone());

    let result = f
        .client
        .invoke(&f.host, f.column.node(), "renderer", &key, "onDelete", vec![]);

    assert_eq!(result, Err(HostError::UnknownCallable("onDelete".to_string())));
}

#[test]
fn test_latest_handler_wins() {
    let f = fixture();
    let replaced = Calls::default();
    let sink = Arc::clone(&replaced);
    f.descriptor
        .register_simple("onClick", move |p: &Person| {
            sink.lock()
                .push(("onClick".to_string(), p.full_name.clone(), Vec::new()));
        })
        .unwrap();
    let key = f.window.track(people()[0].clone());

    f.client
        .invoke(&f.host, f.column.node(), "renderer", &key, "onClick", vec![])
        .unwrap();

    assert!(f.calls.lock().is_empty());
    assert_eq!(replaced.lock().len(), 1);
}

#[test]
fn test_channel_closed_after_unbind() {
    let mut f = fixture();
    let key = f.window.track(people()[0].clone());
    let channel = f.rendering.channel();

    f.rendering.unbind();
    assert!(!f.host.deliver(channel, &[json!("onClick"), json!(key), json!([])]));

    f.client.sync(&f.host);
    assert!(matches!(
        f.client
            .invoke(&f.host, f.column.node(), "renderer", &key, "onClick", vec![]),
        Err(HostError::NotInstalled { .. })
    ));
    assert!(f.calls.lock().is_empty());
}

#[test]
fn test_dispatch_survives_detach_and_reattach() {
    let f = fixture();
    let key = f.window.track(people()[1].clone());

    f.host.remove(&f.column).unwrap();
    assert!(f.host.deliver(
        f.rendering.channel(),
        &[json!("onEdit"), json!(key.clone()), json!([])]
    ));

    let root = f.host.create_element();
    f.host.attach_root(&root).unwrap();
    f.host.append_child(&root, &f.column).unwrap();
    assert!(f.host.deliver(
        f.rendering.channel(),
        &[json!("onEdit"), json!(key), json!([])]
    ));

    assert_eq!(f.calls.lock().len(), 2);
}

#[test]
#[should_panic(expected = "handler failed")]
fn test_handler_panic_propagates() {
    let f = fixture();
    f.descriptor
        .register_simple("onClick", |_: &Person| panic!("handler failed"))
        .unwrap();
    let key = f.window.track(people()[0].clone());

    f.host
        .deliver(f.rendering.channel(), &[json!("onClick"), json!(key), json!([])]);
}

//! Binder behaviour against a small instrument-like type.

use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::bind::BoundInstance;
use super::*;
use crate::dispatch::{Arguments, Signature};
use crate::protocol::RemoteError;

#[derive(Debug, Default)]
struct Stage {
    position: f64,
    label: Option<String>,
}

impl Proxy for Stage {
    fn surface() -> Surface<Self> {
        Surface::new("Stage")
            .method(
                Method::new("move_by", |stage: &mut Self, args| {
                    let delta: f64 = args.get(0, "delta")?;
                    stage.position += delta;
                    Ok(json!(stage.position))
                })
                .with_signature(Signature::new().required("delta"))
                .with_doc("Moves the stage relative to its position."),
            )
            .method(Method::new("_calibrate", |_: &mut Self, _| Ok(Value::Null)))
            .property(
                Property::new("position").getter(|stage: &Self| Ok(json!(stage.position))),
            )
            .property(
                Property::new("label")
                    .getter(|stage: &Self| Ok(json!(stage.label)))
                    .setter(|stage: &mut Self, value| {
                        let label = serde_json::from_value(value)?;
                        stage.label = Some(label);
                        Ok(())
                    })
                    .deleter(|stage: &mut Self| {
                        stage.label = None;
                        Ok(())
                    }),
            )
    }
}

#[fixture]
fn stage() -> Arc<Mutex<Stage>> {
    Arc::new(Mutex::new(Stage::default()))
}

fn commands(bound: &BoundInstance) -> Vec<&str> {
    bound.members.iter().map(|member| member.entry.name()).collect()
}

#[rstest]
fn binds_public_methods_and_existing_accessors(stage: Arc<Mutex<Stage>>) {
    let bound = bind_instance(&stage, "");
    assert_eq!(bound.class_name, "Stage");
    assert_eq!(
        commands(&bound),
        ["move_by", "get_position", "get_label", "set_label", "del_label"]
    );
}

#[rstest]
fn prefix_applies_to_methods_and_properties(stage: Arc<Mutex<Stage>>) {
    let bound = bind_instance(&stage, "x_");
    assert_eq!(
        commands(&bound),
        ["x_move_by", "get_x_position", "get_x_label", "set_x_label", "del_x_label"]
    );
    let property = bound.members[1].property.as_deref();
    assert_eq!(property, Some("x_position"));
}

#[rstest]
fn invokers_act_on_the_captured_instance(stage: Arc<Mutex<Stage>>) {
    let bound = bind_instance(&stage, "");
    let entry = |name: &str| {
        bound
            .members
            .iter()
            .find(|member| member.entry.name() == name)
            .map(|member| member.entry.clone())
            .expect("bound member")
    };

    entry("move_by")
        .invoke(&Arguments::positional_only([json!(2.5)]))
        .expect("move");
    let position = entry("get_position")
        .invoke(&Arguments::default())
        .expect("get");
    assert_eq!(position, json!(2.5));
    assert!((stage.lock().expect("lock").position - 2.5).abs() < f64::EPSILON);

    entry("set_label")
        .invoke(&Arguments::positional_only([json!("x-axis")]))
        .expect("set");
    assert_eq!(stage.lock().expect("lock").label.as_deref(), Some("x-axis"));
    entry("del_label")
        .invoke(&Arguments::default())
        .expect("delete");
    assert_eq!(stage.lock().expect("lock").label, None);
}

#[rstest]
fn method_signature_is_enforced(stage: Arc<Mutex<Stage>>) {
    let bound = bind_instance(&stage, "");
    let error = bound.members[0]
        .entry
        .invoke(&Arguments::default())
        .expect_err("missing delta");
    assert!(error.is(RemoteError::TYPE_ERROR));
    assert!(error.message.contains("delta"), "{}", error.message);
}

#[rstest]
fn poisoned_instance_reports_a_runtime_error(stage: Arc<Mutex<Stage>>) {
    let poisoner = Arc::clone(&stage);
    let _ = std::thread::spawn(move || {
        let _guard = poisoner.lock().expect("lock");
        panic!("poison");
    })
    .join();

    let bound = bind_instance(&stage, "");
    let error = bound.members[1]
        .entry
        .invoke(&Arguments::default())
        .expect_err("poisoned");
    assert!(error.is(RemoteError::RUNTIME_ERROR));
}

#[test]
fn schema_mirrors_the_bound_surface() {
    let schema = ClassSchema::prefixed::<Stage>("x_");
    assert_eq!(schema.class_name, "Stage");
    let commands: Vec<&str> = schema.members.iter().map(|m| m.command.as_str()).collect();
    assert_eq!(
        commands,
        ["x_move_by", "get_x_position", "get_x_label", "set_x_label", "del_x_label"]
    );
    assert_eq!(schema.properties(), ["x_position", "x_label"]);
    let setter = schema.member("set_x_label").expect("setter");
    assert_eq!(setter.kind, MemberKind::Setter);
    assert_eq!(setter.signature.to_string(), "(value)");
}

//! # Merge Patch Protocol
//!
//! Applies an intended Application change on top of the live object without
//! clobbering fields the Argo CD application controller writes concurrently.
//!
//! The intended (local) object is merged *into* a copy of the live (remote)
//! object fetched at patch time:
//!
//! - map + map: union of keys, keys present on both sides are merged
//!   recursively, keys only present remotely are kept untouched
//! - list + list: merged pairwise by index, extra local elements are
//!   appended, extra remote elements are kept. Reordering or removing
//!   elements cannot be expressed this way.
//! - anything else: the local value wins, including an explicit `null`
//!
//! On top of that, [`merge_application`] replaces `metadata.annotations` and
//! `operation` wholesale and carries `status.operationState` over from the
//! intended object.

use serde_json::{Map, Value};

/// Shape of a JSON value as far as merging is concerned
enum Shape {
    Map(Map<String, Value>),
    Seq(Vec<Value>),
    Scalar(Value),
}

impl From<Value> for Shape {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Shape::Map(map),
            Value::Array(seq) => Shape::Seq(seq),
            other => Shape::Scalar(other),
        }
    }
}

impl From<Shape> for Value {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Map(map) => Value::Object(map),
            Shape::Seq(seq) => Value::Array(seq),
            Shape::Scalar(value) => value,
        }
    }
}

/// Recursively merge `local` into `remote`
#[must_use]
pub fn merge_values(local: Value, remote: Value) -> Value {
    match (Shape::from(local), Shape::from(remote)) {
        (Shape::Map(local), Shape::Map(remote)) => Value::Object(merge_maps(local, remote)),
        (Shape::Seq(local), Shape::Seq(remote)) => Value::Array(merge_seqs(local, remote)),
        (local, _) => merge_scalar(local),
    }
}

fn merge_maps(local: Map<String, Value>, mut remote: Map<String, Value>) -> Map<String, Value> {
    for (key, local_value) in local {
        let merged = match remote.remove(&key) {
            Some(remote_value) => merge_values(local_value, remote_value),
            None => local_value,
        };
        remote.insert(key, merged);
    }
    remote
}

fn merge_seqs(local: Vec<Value>, remote: Vec<Value>) -> Vec<Value> {
    let mut remote = remote.into_iter();
    let mut merged = Vec::with_capacity(local.len().max(remote.len()));
    for local_value in local {
        merged.push(match remote.next() {
            Some(remote_value) => merge_values(local_value, remote_value),
            None => local_value,
        });
    }
    merged.extend(remote);
    merged
}

fn merge_scalar(local: Shape) -> Value {
    local.into()
}

/// Merge function applied to the live Application at patch time
///
/// `local` is the intended object, `remote` the freshly fetched live object.
/// Returns the object that should be written.
///
/// `status.operationState` is only carried over when both sides have a
/// `status`. An Application that Argo CD never reconciled has no `status`
/// at all and is left alone.
#[must_use]
pub fn merge_application(local: &Value, remote: Value) -> Value {
    let Value::Object(mut merged) = remote else {
        return local.clone();
    };

    let annotations = local.pointer("/metadata/annotations").cloned();
    let metadata = merged
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(metadata) = metadata {
        match annotations {
            Some(annotations) => {
                metadata.insert("annotations".to_string(), annotations);
            }
            None => {
                metadata.remove("annotations");
            }
        }
    }

    if let Some(local_spec) = local.get("spec") {
        let remote_spec = merged.remove("spec").unwrap_or(Value::Null);
        merged.insert("spec".to_string(), merge_values(local_spec.clone(), remote_spec));
    }

    match local.get("operation") {
        Some(operation) => {
            merged.insert("operation".to_string(), operation.clone());
        }
        None => {
            merged.remove("operation");
        }
    }

    if let (Some(local_status), Some(Value::Object(remote_status))) =
        (local.get("status"), merged.get_mut("status"))
    {
        match local_status.get("operationState") {
            Some(state) => {
                remote_status.insert("operationState".to_string(), state.clone());
            }
            None => {
                remote_status.remove("operationState");
            }
        }
    }

    Value::Object(merged)
}

/// Compute an RFC 7386 JSON merge patch turning `original` into `modified`
///
/// Keys removed in `modified` become `null`, changed maps are diffed
/// recursively and every other changed value is sent in full.
#[must_use]
pub fn create_merge_patch(original: &Value, modified: &Value) -> Value {
    match (original, modified) {
        (Value::Object(original), Value::Object(modified)) => {
            let mut patch = Map::new();
            for (key, original_value) in original {
                match modified.get(key) {
                    None => {
                        patch.insert(key.clone(), Value::Null);
                    }
                    Some(modified_value) if modified_value != original_value => {
                        patch.insert(
                            key.clone(),
                            create_merge_patch(original_value, modified_value),
                        );
                    }
                    Some(_) => {}
                }
            }
            for (key, modified_value) in modified {
                if !original.contains_key(key) {
                    patch.insert(key.clone(), modified_value.clone());
                }
            }
            Value::Object(patch)
        }
        _ => modified.clone(),
    }
}

//! Activation state machine for objects with an enable switch.
//!
//! # Purpose
//! ClusterMembership is `Disabled` until its activation property is true.
//! While enabled, or while the server runs in maintenance mode, fields marked
//! `locked_while_active` refuse any change of value. Entering `Enabled`
//! is gated by the object's `RequiredWhen` rules, checked on the merged
//! object by the rule pass.
use lumen_schema::{ConfigError, ConfigResult, ErrorKind, ObjectType};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Enabling,
    Disabling,
}

pub fn state_of(object: &ObjectType, properties: &Map<String, Value>) -> ActivationState {
    let enabled = object
        .activation
        .and_then(|flag| properties.get(flag))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if enabled {
        ActivationState::Enabled
    } else {
        ActivationState::Disabled
    }
}

pub fn transition(before: ActivationState, after: ActivationState) -> Transition {
    match (before, after) {
        (ActivationState::Disabled, ActivationState::Enabled) => Transition::Enabling,
        (ActivationState::Enabled, ActivationState::Disabled) => Transition::Disabling,
        _ => Transition::Unchanged,
    }
}

/// Refuse changes to locked fields while the object is enabled or the server
/// is in maintenance mode.
///
/// Compares the committed `before` with the `merged` result, so resubmitting a
/// stored value is never a change. Outside maintenance, a request that
/// disables the object may change locked fields in the same write.
pub fn check_locked(
    object: &ObjectType,
    before: &Map<String, Value>,
    merged: &Map<String, Value>,
    maintenance: bool,
) -> ConfigResult<()> {
    if object.activation.is_none() {
        return Ok(());
    }
    let current = state_of(object, before);
    if current == ActivationState::Disabled && !maintenance {
        return Ok(());
    }
    if !maintenance && transition(current, state_of(object, merged)) == Transition::Disabling {
        return Ok(());
    }
    let locked = object
        .properties
        .iter()
        .filter(|schema| schema.locked_while_active)
        .find(|schema| before.get(schema.name) != merged.get(schema.name));
    match locked {
        Some(schema) => Err(ConfigError::new(
            ErrorKind::MustDisableFirst,
            &[object.name, schema.name],
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_schema::Registry;
    use serde_json::json;

    fn cluster() -> &'static ObjectType {
        Registry::global()
            .lookup("ClusterMembership")
            .expect("cluster")
    }

    fn enabled() -> Map<String, Value> {
        let mut props = cluster().defaults();
        props.insert("EnableClusterMembership".to_string(), json!(true));
        props.insert("ClusterName".to_string(), json!("c1"));
        props.insert("ControlAddress".to_string(), json!("10.0.0.1"));
        props
    }

    fn with(base: &Map<String, Value>, changes: Value) -> Map<String, Value> {
        let mut props = base.clone();
        if let Value::Object(changes) = changes {
            props.extend(changes);
        }
        props
    }

    #[test]
    fn state_follows_activation_flag() {
        let mut props = cluster().defaults();
        assert_eq!(state_of(cluster(), &props), ActivationState::Disabled);
        props.insert("EnableClusterMembership".to_string(), json!(true));
        assert_eq!(state_of(cluster(), &props), ActivationState::Enabled);
    }

    #[test]
    fn cluster_name_locked_while_enabled() {
        let before = enabled();
        let after = with(&before, json!({"ClusterName": "other"}));
        let err = check_locked(cluster(), &before, &after, false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MustDisableFirst);
        assert_eq!(
            err.message,
            "You must disable the object ClusterMembership to update or set configuration item ClusterName."
        );
    }

    #[test]
    fn unchanged_cluster_name_passes_while_enabled() {
        let before = enabled();
        let after = with(&before, json!({"ClusterName": "c1", "DiscoveryTime": 20}));
        assert!(check_locked(cluster(), &before, &after, false).is_ok());
    }

    #[test]
    fn disabling_may_reset_locked_fields() {
        let before = enabled();
        let after = cluster().defaults();
        assert!(check_locked(cluster(), &before, &after, false).is_ok());
        let err = check_locked(cluster(), &before, &after, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MustDisableFirst);
    }

    #[test]
    fn maintenance_locks_even_when_disabled() {
        let before = cluster().defaults();
        let after = with(&before, json!({"ClusterName": "c1"}));
        assert!(check_locked(cluster(), &before, &after, true).is_err());
        assert!(check_locked(cluster(), &before, &before, true).is_ok());
    }

    #[test]
    fn transitions_are_named() {
        assert_eq!(
            transition(ActivationState::Disabled, ActivationState::Enabled),
            Transition::Enabling
        );
        assert_eq!(
            transition(ActivationState::Enabled, ActivationState::Enabled),
            Transition::Unchanged
        );
    }
}

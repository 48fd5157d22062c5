//! Decoding of `POST /configuration` bodies into change batches.
//!
//! # Purpose
//! Resolves object types and separates create/update entries from deletes.
//! Shape errors are reported here, before any schema validation runs.
use lumen_schema::{ConfigError, ConfigResult, ErrorKind, Registry};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEntry {
    Upsert {
        object_type: &'static str,
        name: String,
        properties: Map<String, Value>,
    },
    Delete {
        object_type: &'static str,
        name: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeBatch {
    pub entries: Vec<ChangeEntry>,
}

impl ChangeBatch {
    pub fn single(entry: ChangeEntry) -> Self {
        Self {
            entries: vec![entry],
        }
    }
}

/// Parse a raw request body.
pub fn parse_batch(registry: &Registry, body: &[u8]) -> ConfigResult<ChangeBatch> {
    let root: Value = serde_json::from_slice(body)
        .map_err(|err| ConfigError::new(ErrorKind::MalformedBody, &[err.to_string().as_str()]))?;
    let Value::Object(root) = root else {
        return Err(ConfigError::invalid_request(&root.to_string()));
    };
    if root.is_empty() {
        return Err(ConfigError::invalid_request("{}"));
    }

    let mut batch = ChangeBatch::default();
    for (type_name, body) in root {
        let object = registry
            .lookup(&type_name)
            .ok_or_else(|| ConfigError::invalid_request(&format!("\"{type_name}\"")))?;

        if let Some(instance) = object.singleton {
            match body {
                Value::Object(properties) => batch.entries.push(ChangeEntry::Upsert {
                    object_type: object.name,
                    name: instance.to_string(),
                    properties,
                }),
                Value::Null => batch.entries.push(ChangeEntry::Delete {
                    object_type: object.name,
                    name: instance.to_string(),
                }),
                other => {
                    return Err(ConfigError::invalid_request(&format!(
                        "\"{type_name}\":{other}"
                    )));
                }
            }
            continue;
        }

        let instances = match body {
            Value::Object(instances) if !instances.is_empty() => instances,
            other => {
                return Err(ConfigError::invalid_request(&format!(
                    "\"{type_name}\":{other}"
                )));
            }
        };
        for (name, value) in instances {
            match value {
                Value::Object(properties) => batch.entries.push(ChangeEntry::Upsert {
                    object_type: object.name,
                    name,
                    properties,
                }),
                Value::Null => batch.entries.push(ChangeEntry::Delete {
                    object_type: object.name,
                    name,
                }),
                other => {
                    return Err(ConfigError::invalid_request(&format!(
                        "\"{type_name}\":{{\"{name}\":{other}}}"
                    )));
                }
            }
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ConfigResult<ChangeBatch> {
        parse_batch(Registry::global(), body.as_bytes())
    }

    #[test]
    fn malformed_json_is_rejected_first() {
        let err = parse("{\"Endpoint\":").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedBody);
        assert_eq!(err.status, 400);
    }

    #[test]
    fn null_type_body_is_not_a_delete_all() {
        let err = parse(r#"{"Endpoint":null}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
        assert_eq!(
            err.message,
            "The REST API call: \"Endpoint\":null is not valid."
        );
        let err = parse(r#"{"Endpoint":""}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn null_instance_is_delete() {
        let batch = parse(r#"{"MessageHub":{"H1":null}}"#).expect("batch");
        assert_eq!(
            batch.entries,
            vec![ChangeEntry::Delete {
                object_type: "MessageHub",
                name: "H1".to_string()
            }]
        );
    }

    #[test]
    fn singleton_body_has_no_name_level() {
        let batch = parse(r#"{"LDAP":{"Timeout":20}}"#).expect("batch");
        match &batch.entries[0] {
            ChangeEntry::Upsert {
                object_type,
                name,
                properties,
            } => {
                assert_eq!(*object_type, "LDAP");
                assert_eq!(name, "ldapconfig");
                assert_eq!(properties["Timeout"], 20);
            }
            other => panic!("unexpected entry {other:?}"),
        }
        let batch = parse(r#"{"ClusterMembership":null}"#).expect("batch");
        assert!(matches!(batch.entries[0], ChangeEntry::Delete { .. }));
    }

    #[test]
    fn unknown_type_is_invalid_call() {
        let err = parse(r#"{"Bogus":{"x":{}}}"#).unwrap_err();
        assert_eq!(err.message, "The REST API call: \"Bogus\" is not valid.");
    }

    #[test]
    fn non_object_root_is_invalid_call() {
        assert_eq!(parse("[]").unwrap_err().kind, ErrorKind::InvalidRequest);
        assert_eq!(parse("{}").unwrap_err().kind, ErrorKind::InvalidRequest);
    }
}

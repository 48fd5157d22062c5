//! Cross-property rules evaluated on a merged object.
//!
//! # Purpose
//! Each object type lists its rules as data. They run after every submitted
//! property has been validated and merged over the stored object, so a rule
//! sees the object exactly as it would be committed.
use crate::capability::{BindRequest, CertificateStore, LdapBindVerifier};
use lumen_schema::value::is_unset;
use lumen_schema::{ConfigError, ConfigResult, ErrorKind, ObjectRule, ObjectType};
use serde_json::{Map, Value};

/// Capabilities the rules may consult.
pub struct RuleContext<'a> {
    pub certificates: &'a dyn CertificateStore,
    pub binder: &'a dyn LdapBindVerifier,
}

/// Check every rule of `object` against the merged `properties`.
///
/// `triggers` names the transient properties submitted as `true` on this
/// request.
pub fn check(
    object: &ObjectType,
    properties: &Map<String, Value>,
    triggers: &[&'static str],
    ctx: &RuleContext<'_>,
) -> ConfigResult<()> {
    for rule in &object.rules {
        check_rule(object, rule, properties, triggers, ctx)?;
    }
    Ok(())
}

fn is_set(properties: &Map<String, Value>, name: &str) -> bool {
    properties.get(name).is_some_and(|value| !is_unset(value))
}

fn text<'a>(properties: &'a Map<String, Value>, name: &str) -> &'a str {
    properties.get(name).and_then(Value::as_str).unwrap_or("")
}

fn check_rule(
    object: &ObjectType,
    rule: &ObjectRule,
    properties: &Map<String, Value>,
    triggers: &[&'static str],
    ctx: &RuleContext<'_>,
) -> ConfigResult<()> {
    match rule {
        ObjectRule::OneOf {
            properties: names,
            kind,
        } => {
            if names.iter().any(|name| is_set(properties, name)) {
                return Ok(());
            }
            let err = match kind {
                ErrorKind::MissingFilter => {
                    let listed = names.join(",");
                    ConfigError::new(*kind, &[object.name, listed.as_str()])
                }
                _ => ConfigError::new(*kind, &[]),
            };
            Err(err)
        }
        ObjectRule::RequiresWith {
            property,
            requires,
            kind,
        } => {
            if is_set(properties, property) && !is_set(properties, requires) {
                return Err(ConfigError::new(*kind, &[]));
            }
            Ok(())
        }
        ObjectRule::RequiredWhen {
            when,
            properties: names,
            kind,
        } => {
            let applies = when.iter().all(|(flag, expected)| {
                properties.get(*flag).and_then(Value::as_bool) == Some(*expected)
            });
            if !applies {
                return Ok(());
            }
            match names.iter().find(|name| !is_set(properties, name)) {
                Some(name) if *kind == ErrorKind::InvalidValue => {
                    Err(ConfigError::invalid_value(name, "NULL"))
                }
                Some(name) => Err(ConfigError::new(*kind, &[*name])),
                None => Ok(()),
            }
        }
        ObjectRule::CertificateForScheme {
            url,
            scheme,
            certificate,
        } => {
            let url = text(properties, url);
            let secured = url
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme));
            if !secured {
                return Ok(());
            }
            let name = text(properties, certificate);
            if name.is_empty() || !ctx.certificates.contains(name) {
                return Err(ConfigError::new(ErrorKind::CertificateInvalid, &[]));
            }
            Ok(())
        }
        ObjectRule::VerifyBind { trigger } => {
            if !triggers.contains(trigger) {
                return Ok(());
            }
            let request = BindRequest {
                url: text(properties, "URL").to_string(),
                bind_dn: text(properties, "BindDN").to_string(),
                bind_password: text(properties, "BindPassword").to_string(),
                certificate: text(properties, "Certificate").to_string(),
                timeout_secs: properties
                    .get("Timeout")
                    .and_then(Value::as_i64)
                    .unwrap_or_default(),
            };
            ctx.binder
                .verify(&request)
                .map_err(|detail| ConfigError::new(ErrorKind::BindFailed, &[detail.as_str()]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{DefaultBindVerifier, StaticCertificateStore};
    use lumen_schema::Registry;
    use serde_json::json;

    fn merged(object_type: &str, overrides: Value) -> (&'static ObjectType, Map<String, Value>) {
        let object = Registry::global().lookup(object_type).expect("type");
        let mut props = object.defaults();
        if let Value::Object(overrides) = overrides {
            props.extend(overrides);
        }
        (object, props)
    }

    fn run(
        object: &ObjectType,
        props: &Map<String, Value>,
        triggers: &[&'static str],
    ) -> ConfigResult<()> {
        let certificates = StaticCertificateStore::new(["ldap.pem"]);
        let ctx = RuleContext {
            certificates: &certificates,
            binder: &DefaultBindVerifier,
        };
        check(object, props, triggers, &ctx)
    }

    #[test]
    fn endpoint_with_only_connection_policies_passes() {
        let (object, props) = merged(
            "Endpoint",
            json!({"Port": 1493, "ConnectionPolicies": "CP1", "MessageHub": "H1"}),
        );
        assert!(run(object, &props, &[]).is_ok());
    }

    #[test]
    fn subscription_policy_needs_topic_policy() {
        let (object, props) = merged("Endpoint", json!({"SubscriptionPolicies": "SP1"}));
        let err = run(object, &props, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SubscriptionRequiresTopic);
        let (object, props) = merged(
            "Endpoint",
            json!({"SubscriptionPolicies": "SP1", "TopicPolicies": "TP1"}),
        );
        assert!(run(object, &props, &[]).is_ok());
    }

    #[test]
    fn policy_filter_list_is_comma_joined() {
        let (object, props) = merged("TopicPolicy", json!({"Topic": "*", "ActionList": "Publish"}));
        let err = run(object, &props, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingFilter);
        assert_eq!(
            err.message,
            "The object: TopicPolicy must have one of the properties ClientID,ClientAddress,UserID,GroupID,CommonNames,Protocol specified"
        );
    }

    #[test]
    fn connection_needs_a_server_list() {
        let (object, props) = merged("Connection", json!({"ClientID": "c1"}));
        let err = run(object, &props, &[]).unwrap_err();
        assert_eq!(
            err.message,
            "The object: Connection must have one of the properties MQTTServerList,EventStreamsBrokerList specified"
        );
    }

    #[test]
    fn enabling_cluster_requires_name_and_address() {
        let (object, props) = merged(
            "ClusterMembership",
            json!({"EnableClusterMembership": true, "ClusterName": "c1"}),
        );
        let err = run(object, &props, &[]).unwrap_err();
        assert_eq!(
            err.message,
            "The property value is not valid: Property: ControlAddress Value: \"NULL\"."
        );
    }

    #[test]
    fn unicast_discovery_needs_server_list() {
        let (object, props) = merged(
            "ClusterMembership",
            json!({
                "EnableClusterMembership": true,
                "ClusterName": "c1",
                "ControlAddress": "10.0.0.1",
                "UseMulticastDiscovery": false
            }),
        );
        let err = run(object, &props, &[]).unwrap_err();
        assert!(err.message.contains("DiscoveryServerList"));
    }

    #[test]
    fn ldaps_needs_installed_certificate() {
        let (object, props) = merged(
            "LDAP",
            json!({"URL": "LDAPS://dir.example.com", "Certificate": "missing.pem"}),
        );
        let err = run(object, &props, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CertificateInvalid);
        let (object, props) = merged(
            "LDAP",
            json!({"URL": "ldaps://dir.example.com", "Certificate": "ldap.pem"}),
        );
        assert!(run(object, &props, &[]).is_ok());
    }

    #[test]
    fn enabled_ldap_requires_url() {
        let (object, props) = merged("LDAP", json!({"Enabled": true, "BaseDN": "o=x"}));
        let err = run(object, &props, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequiredMissing);
        assert!(err.message.contains("Property: URL"));
    }

    #[test]
    fn verify_runs_only_when_triggered() {
        let (object, props) = merged(
            "LDAP",
            json!({"URL": "ldap://dir.example.com", "BindDN": "cn=admin"}),
        );
        assert!(run(object, &props, &[]).is_ok());
        let err = run(object, &props, &["Verify"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BindFailed);
    }
}

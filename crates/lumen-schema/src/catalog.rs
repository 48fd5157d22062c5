//! Built-in object type tables.
//!
//! # Purpose
//! Declares every configurable object type: properties, defaults, ranges,
//! references and cross-property rules. Nothing here executes validation.
use crate::error::ErrorKind;
use crate::schema::{ObjectRule, ObjectType, PropertySchema, StringFormat};

pub const MESSAGE_HUB: &str = "MessageHub";
pub const CONNECTION_POLICY: &str = "ConnectionPolicy";
pub const TOPIC_POLICY: &str = "TopicPolicy";
pub const QUEUE_POLICY: &str = "QueuePolicy";
pub const SUBSCRIPTION_POLICY: &str = "SubscriptionPolicy";
pub const ENDPOINT: &str = "Endpoint";
pub const LDAP: &str = "LDAP";
pub const CLUSTER_MEMBERSHIP: &str = "ClusterMembership";
pub const CONNECTION: &str = "Connection";
pub const FORWARDER: &str = "Forwarder";

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_CLIENT_ADDRESSES: usize = 100;
pub const SENSITIVE_MASK: &str = "XXXXXX";

const PROTOCOLS: &[&str] = &["JMS", "MQTT", "AMQP"];
const POLICY_FILTERS: &[&str] = &[
    "ClientID",
    "ClientAddress",
    "UserID",
    "GroupID",
    "CommonNames",
    "Protocol",
];
const MAX_MESSAGES_BEHAVIOR: &[&str] = &["RejectNewMessages", "DiscardOldMessages"];

pub fn builtin_types() -> Vec<ObjectType> {
    vec![
        message_hub(),
        connection_policy(),
        topic_policy(),
        queue_policy(),
        subscription_policy(),
        endpoint(),
        ldap(),
        cluster_membership(),
        connection(),
        forwarder(),
    ]
}

fn description() -> PropertySchema {
    PropertySchema::string("Description", 1024).default_str("")
}

fn policy_filters() -> Vec<PropertySchema> {
    vec![
        PropertySchema::string("ClientID", 1024),
        PropertySchema::formatted("ClientAddress", 16384, StringFormat::ClientAddressList),
        PropertySchema::string("UserID", 1024),
        PropertySchema::string("GroupID", 1024),
        PropertySchema::string("CommonNames", 1024),
        PropertySchema::token_set("Protocol", PROTOCOLS, Some("All")),
    ]
}

fn filter_rule() -> ObjectRule {
    ObjectRule::OneOf {
        properties: POLICY_FILTERS,
        kind: ErrorKind::MissingFilter,
    }
}

fn time_to_live() -> PropertySchema {
    PropertySchema::formatted("MaxMessageTimeToLive", 32, StringFormat::TimeToLive)
        .default_str("unlimited")
}

fn message_hub() -> ObjectType {
    let mut object = ObjectType::named(MESSAGE_HUB);
    object.properties = vec![description()];
    object
}

fn connection_policy() -> ObjectType {
    let mut object = ObjectType::named(CONNECTION_POLICY);
    object.properties = vec![description()];
    object.properties.extend(policy_filters());
    object.properties.extend([
        PropertySchema::boolean("AllowDurable", true),
        PropertySchema::boolean("AllowPersistentMessages", true),
        PropertySchema::enumeration("ExpectedMessageRate", &["Low", "Default", "High", "Max"])
            .default_str("Default"),
        PropertySchema::integer("MaxSessionExpiryInterval", 0, 2_147_483_647).default_int(0),
    ]);
    object.rules = vec![filter_rule()];
    object
}

fn topic_policy() -> ObjectType {
    let mut object = ObjectType::named(TOPIC_POLICY);
    object.properties = vec![
        description(),
        PropertySchema::string("Topic", 65535).required(),
        PropertySchema::token_set("ActionList", &["Publish", "Subscribe"], None).required(),
        PropertySchema::integer("MaxMessages", 1, 20_000_000).default_int(5000),
        PropertySchema::enumeration("MaxMessagesBehavior", MAX_MESSAGES_BEHAVIOR)
            .default_str("RejectNewMessages"),
        time_to_live(),
        PropertySchema::boolean("DisconnectedClientNotification", false),
    ];
    object.properties.extend(policy_filters());
    object.rules = vec![filter_rule()];
    object
}

fn queue_policy() -> ObjectType {
    let mut object = ObjectType::named(QUEUE_POLICY);
    object.properties = vec![
        description(),
        PropertySchema::string("Queue", 65535).required(),
        PropertySchema::token_set("ActionList", &["Send", "Receive", "Browse"], None).required(),
        time_to_live(),
    ];
    object.properties.extend(policy_filters());
    object.rules = vec![filter_rule()];
    object
}

fn subscription_policy() -> ObjectType {
    let mut object = ObjectType::named(SUBSCRIPTION_POLICY);
    object.properties = vec![
        description(),
        PropertySchema::string("Subscription", 65535).required(),
        PropertySchema::token_set("ActionList", &["Receive", "Control"], None).required(),
        PropertySchema::integer("MaxMessages", 1, 20_000_000).default_int(5000),
        PropertySchema::enumeration("MaxMessagesBehavior", MAX_MESSAGES_BEHAVIOR)
            .default_str("RejectNewMessages"),
    ];
    object.properties.extend(policy_filters());
    object.rules = vec![filter_rule()];
    object
}

fn endpoint() -> ObjectType {
    let mut object = ObjectType::named(ENDPOINT);
    object.unknown_property_status = 404;
    object.properties = vec![
        description(),
        PropertySchema::integer("Port", 1, 65535).required(),
        PropertySchema::boolean("Enabled", true),
        PropertySchema::formatted("Interface", 64, StringFormat::Interface)
            .default_str("All")
            .restart_required(),
        PropertySchema::token_set("Protocol", PROTOCOLS, Some("All")).default_str("All"),
        PropertySchema::formatted("MaxMessageSize", 16, StringFormat::ByteSize)
            .default_str("4096KB"),
        PropertySchema::integer("MaxSendSize", 512, 131_072).default_int(16384),
        PropertySchema::boolean("BatchMessages", true),
        PropertySchema::references("ConnectionPolicies", CONNECTION_POLICY).required(),
        PropertySchema::references("TopicPolicies", TOPIC_POLICY),
        PropertySchema::references("QueuePolicies", QUEUE_POLICY),
        PropertySchema::references("SubscriptionPolicies", SUBSCRIPTION_POLICY),
        PropertySchema::reference("MessageHub", MESSAGE_HUB).required(),
    ];
    object.rules = vec![ObjectRule::RequiresWith {
        property: "SubscriptionPolicies",
        requires: "TopicPolicies",
        kind: ErrorKind::SubscriptionRequiresTopic,
    }];
    object
}

fn ldap() -> ObjectType {
    let mut object = ObjectType::singleton(LDAP, "ldapconfig");
    object.reset_on_empty = true;
    object.properties = vec![
        PropertySchema::formatted("URL", 2048, StringFormat::LdapUrl).default_str(""),
        PropertySchema::string("Certificate", 1024).default_str(""),
        PropertySchema::string("BaseDN", 1024).default_str("").required(),
        PropertySchema::string("BindDN", 1024).default_str(""),
        PropertySchema::string("BindPassword", 1024)
            .default_str("")
            .sensitive(),
        PropertySchema::string("UserSuffix", 1024).default_str(""),
        PropertySchema::string("GroupSuffix", 1024).default_str(""),
        PropertySchema::string("UserIdMap", 256).default_str(""),
        PropertySchema::string("GroupIdMap", 256).default_str(""),
        PropertySchema::string("GroupMemberIdMap", 256).default_str(""),
        PropertySchema::boolean("EnableCache", true),
        PropertySchema::integer("CacheTimeout", 1, 60).default_int(10),
        PropertySchema::integer("GroupCacheTimeout", 1, 86400).default_int(300),
        PropertySchema::integer("Timeout", 1, 60).default_int(30),
        PropertySchema::integer("MaxConnections", 1, 100).default_int(100),
        PropertySchema::boolean("IgnoreCase", true),
        PropertySchema::boolean("NestedGroupSearch", false),
        PropertySchema::boolean("Enabled", false),
        PropertySchema::boolean("Verify", false).transient(),
    ];
    object.rules = vec![
        ObjectRule::RequiredWhen {
            when: &[("Enabled", true)],
            properties: &["URL", "BaseDN"],
            kind: ErrorKind::RequiredMissing,
        },
        ObjectRule::CertificateForScheme {
            url: "URL",
            scheme: "ldaps://",
            certificate: "Certificate",
        },
        ObjectRule::VerifyBind { trigger: "Verify" },
    ];
    object
}

fn cluster_membership() -> ObjectType {
    let port = |name: &'static str, default: i64| {
        PropertySchema::integer(name, 1, 65535)
            .default_int(default)
            .restart_required()
    };
    let mut object = ObjectType::singleton(CLUSTER_MEMBERSHIP, "cluster");
    object.activation = Some("EnableClusterMembership");
    object.properties = vec![
        PropertySchema::string("ClusterName", MAX_NAME_LEN)
            .default_str("")
            .locked_while_active()
            .restart_required(),
        PropertySchema::boolean("EnableClusterMembership", false).restart_required(),
        PropertySchema::formatted("ControlAddress", 64, StringFormat::IpAddress)
            .restart_required(),
        PropertySchema::formatted("ControlExternalAddress", 256, StringFormat::Host)
            .restart_required(),
        port("ControlPort", 9104),
        PropertySchema::integer("ControlExternalPort", 1, 65535).restart_required(),
        PropertySchema::formatted("MessagingAddress", 64, StringFormat::IpAddress)
            .restart_required(),
        PropertySchema::formatted("MessagingExternalAddress", 256, StringFormat::Host)
            .restart_required(),
        port("MessagingPort", 9105),
        PropertySchema::integer("MessagingExternalPort", 1, 65535).restart_required(),
        PropertySchema::boolean("MessagingUseTLS", false).restart_required(),
        port("DiscoveryPort", 9106),
        PropertySchema::formatted("DiscoveryServerList", 65535, StringFormat::HostPortList)
            .restart_required(),
        PropertySchema::integer("DiscoveryTime", 1, 2_147_483_647)
            .default_int(10)
            .restart_required(),
        PropertySchema::integer("MulticastDiscoveryTTL", 1, 256)
            .default_int(1)
            .restart_required(),
        PropertySchema::boolean("UseMulticastDiscovery", true).restart_required(),
    ];
    object.rules = vec![
        ObjectRule::RequiredWhen {
            when: &[("EnableClusterMembership", true)],
            properties: &["ClusterName", "ControlAddress"],
            kind: ErrorKind::InvalidValue,
        },
        ObjectRule::RequiredWhen {
            when: &[
                ("EnableClusterMembership", true),
                ("UseMulticastDiscovery", false),
            ],
            properties: &["DiscoveryServerList"],
            kind: ErrorKind::InvalidValue,
        },
    ];
    object
}

fn connection() -> ObjectType {
    let mut object = ObjectType::named(CONNECTION);
    object.type_errors_as_value = true;
    object.omit_null_on_read = true;
    object.variant = Some("EventStreamsBrokerList");
    object.properties = vec![
        PropertySchema::list("MQTTServerList", 16, false),
        PropertySchema::list("EventStreamsBrokerList", 16, false),
        PropertySchema::string("ClientID", 1024).required(),
        PropertySchema::string("Username", 1024),
        PropertySchema::string("Password", 1024).sensitive(),
        PropertySchema::enumeration("TLS", &["TLSv1.1", "TLSv1.2", "TLSv1.3"]),
        PropertySchema::string("Ciphers", 1024),
        PropertySchema::enumeration("Version", &["3.1.1", "5.0"])
            .default_str("5.0")
            .ignored_for_variant(),
        PropertySchema::integer("SessionExpiry", 0, 2_147_483_647).ignored_for_variant(),
        PropertySchema::integer("KeepAlive", 0, 65535).ignored_for_variant(),
        PropertySchema::integer("MaxBatchTimeMS", 1, 60_000)
            .zero_clears()
            .lenient_max(),
        PropertySchema::integer("MaxPacketSize", 1, 268_435_456)
            .zero_clears()
            .lenient_max(),
    ];
    object.rules = vec![ObjectRule::OneOf {
        properties: &["MQTTServerList", "EventStreamsBrokerList"],
        kind: ErrorKind::MissingFilter,
    }];
    object
}

fn forwarder() -> ObjectType {
    let mut object = ObjectType::named(FORWARDER);
    object.type_errors_as_value = true;
    object.omit_null_on_read = true;
    object.properties = vec![
        PropertySchema::reference("Source", CONNECTION).required(),
        PropertySchema::reference("Destination", CONNECTION).required(),
        PropertySchema::list("Topic", 16, true),
        PropertySchema::string("TopicMap", 65535),
        PropertySchema::boolean("Enabled", true),
        PropertySchema::integer("Instances", 1, 99).zero_clears(),
        PropertySchema::integer("SourceQoS", 0, 2),
        PropertySchema::string("Selector", 65535),
    ];
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn type_names_are_unique() {
        let types = builtin_types();
        let mut names: Vec<_> = types.iter().map(|object| object.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), types.len());
    }

    #[test]
    fn every_reference_targets_a_known_type() {
        let types = builtin_types();
        for object in &types {
            for prop in object.reference_properties() {
                let (target, _) = prop.reference_target().expect("reference");
                assert!(
                    types.iter().any(|candidate| candidate.name == target),
                    "{}.{} targets unknown {}",
                    object.name,
                    prop.name,
                    target
                );
            }
        }
    }

    #[test]
    fn singletons_are_never_deletable() {
        for object in builtin_types() {
            if object.is_singleton() {
                assert!(!object.deletable, "{} is deletable", object.name);
            }
        }
    }

    #[test]
    fn cluster_defaults_match_documented_values() {
        let cluster = cluster_membership();
        let defaults = cluster.defaults();
        assert_eq!(defaults["ControlPort"], 9104);
        assert_eq!(defaults["MessagingPort"], 9105);
        assert_eq!(defaults["DiscoveryPort"], 9106);
        assert_eq!(defaults["EnableClusterMembership"], false);
        assert_eq!(defaults["UseMulticastDiscovery"], true);
        assert_eq!(defaults["ControlAddress"], Value::Null);
    }

    #[test]
    fn transient_properties_have_no_default_slot() {
        let defaults = ldap().defaults();
        assert!(!defaults.contains_key("Verify"));
        assert_eq!(defaults["MaxConnections"], 100);
    }
}

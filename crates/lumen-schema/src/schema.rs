//! Declarative schema types.
//!
//! # Purpose
//! Object types and their properties are plain data. The validator,
//! normalizer and the engine's dependency checks are generic over these
//! tables rather than carrying per-type code paths.
use crate::error::ErrorKind;
use serde_json::{Map, Value};

/// Extra syntax enforced on string properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Any,
    /// Bare IPv4 or IPv6 literal. Host names and bracketed forms are refused.
    IpAddress,
    /// Host name or IP literal.
    Host,
    /// `All`, `*` or an IP literal.
    Interface,
    /// `ldap://` or `ldaps://` URL, or empty.
    LdapUrl,
    /// Comma list of `host:port` pairs.
    HostPortList,
    /// Size with an optional `KB`/`MB` suffix.
    ByteSize,
    /// `unlimited` or a positive number of seconds.
    TimeToLive,
    /// Comma list of IPs, `a-b` ranges or `*`.
    ClientAddressList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    String {
        max_len: usize,
        format: StringFormat,
    },
    Integer {
        min: i64,
        max: i64,
        /// When false, values above `max` are stored as submitted.
        max_enforced: bool,
        /// When true, `0` resets the property like `null` does.
        zero_clears: bool,
    },
    Boolean,
    Enum {
        values: &'static [&'static str],
    },
    /// Comma-joined set of case-insensitive tokens.
    TokenSet {
        values: &'static [&'static str],
        aggregate: Option<&'static str>,
    },
    List {
        max_items: usize,
        scalar_coercion: bool,
    },
    Reference {
        target: &'static str,
        multiple: bool,
    },
}

#[derive(Debug, Clone)]
pub struct PropertySchema {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub required: bool,
    pub default: Value,
    /// Write-only. Reads return a fixed mask.
    pub sensitive: bool,
    /// Acts on the request but is never stored.
    pub transient: bool,
    /// Refused while the owning object is active or the server is in maintenance.
    pub locked_while_active: bool,
    /// Changing an existing value needs a server restart to take effect.
    pub restart_required: bool,
    /// Silently dropped when the object's variant discriminator is set.
    pub ignored_for_variant: bool,
}

impl PropertySchema {
    fn with_kind(name: &'static str, kind: PropertyKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Value::Null,
            sensitive: false,
            transient: false,
            locked_while_active: false,
            restart_required: false,
            ignored_for_variant: false,
        }
    }

    pub fn string(name: &'static str, max_len: usize) -> Self {
        Self::with_kind(
            name,
            PropertyKind::String {
                max_len,
                format: StringFormat::Any,
            },
        )
    }

    pub fn formatted(name: &'static str, max_len: usize, format: StringFormat) -> Self {
        Self::with_kind(name, PropertyKind::String { max_len, format })
    }

    pub fn integer(name: &'static str, min: i64, max: i64) -> Self {
        Self::with_kind(
            name,
            PropertyKind::Integer {
                min,
                max,
                max_enforced: true,
                zero_clears: false,
            },
        )
    }

    pub fn boolean(name: &'static str, default: bool) -> Self {
        Self::with_kind(name, PropertyKind::Boolean).default_value(Value::Bool(default))
    }

    pub fn enumeration(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::with_kind(name, PropertyKind::Enum { values })
    }

    pub fn token_set(
        name: &'static str,
        values: &'static [&'static str],
        aggregate: Option<&'static str>,
    ) -> Self {
        Self::with_kind(name, PropertyKind::TokenSet { values, aggregate })
    }

    pub fn list(name: &'static str, max_items: usize, scalar_coercion: bool) -> Self {
        Self::with_kind(
            name,
            PropertyKind::List {
                max_items,
                scalar_coercion,
            },
        )
    }

    pub fn reference(name: &'static str, target: &'static str) -> Self {
        Self::with_kind(
            name,
            PropertyKind::Reference {
                target,
                multiple: false,
            },
        )
    }

    pub fn references(name: &'static str, target: &'static str) -> Self {
        Self::with_kind(
            name,
            PropertyKind::Reference {
                target,
                multiple: true,
            },
        )
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = value;
        self
    }

    pub fn default_str(self, value: &'static str) -> Self {
        self.default_value(Value::String(value.to_string()))
    }

    pub fn default_int(self, value: i64) -> Self {
        self.default_value(Value::from(value))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn locked_while_active(mut self) -> Self {
        self.locked_while_active = true;
        self
    }

    pub fn restart_required(mut self) -> Self {
        self.restart_required = true;
        self
    }

    pub fn ignored_for_variant(mut self) -> Self {
        self.ignored_for_variant = true;
        self
    }

    pub fn lenient_max(mut self) -> Self {
        if let PropertyKind::Integer { max_enforced, .. } = &mut self.kind {
            *max_enforced = false;
        }
        self
    }

    pub fn zero_clears(mut self) -> Self {
        if let PropertyKind::Integer { zero_clears, .. } = &mut self.kind {
            *zero_clears = true;
        }
        self
    }

    /// Target type and multiplicity for reference properties.
    pub fn reference_target(&self) -> Option<(&'static str, bool)> {
        match self.kind {
            PropertyKind::Reference { target, multiple } => Some((target, multiple)),
            _ => None,
        }
    }
}

/// Cross-property invariants checked on the merged object.
#[derive(Debug, Clone)]
pub enum ObjectRule {
    /// At least one of `properties` must hold a value.
    OneOf {
        properties: &'static [&'static str],
        kind: ErrorKind,
    },
    /// `property` may only be set when `requires` is set too.
    RequiresWith {
        property: &'static str,
        requires: &'static str,
        kind: ErrorKind,
    },
    /// When every boolean in `when` matches, each of `properties` must be set.
    RequiredWhen {
        when: &'static [(&'static str, bool)],
        properties: &'static [&'static str],
        kind: ErrorKind,
    },
    /// A URL using `scheme` needs `certificate` to name an installed certificate.
    CertificateForScheme {
        url: &'static str,
        scheme: &'static str,
        certificate: &'static str,
    },
    /// Submitting `trigger: true` runs a bind check against the merged settings.
    VerifyBind { trigger: &'static str },
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: &'static str,
    /// Fixed instance name for singleton types.
    pub singleton: Option<&'static str>,
    pub deletable: bool,
    /// Posting `{}` restores every property to its default.
    pub reset_on_empty: bool,
    /// Boolean property that marks the object active.
    pub activation: Option<&'static str>,
    /// Property whose presence selects the alternate variant.
    pub variant: Option<&'static str>,
    pub unknown_property_status: u16,
    /// Report JSON kind mismatches as value errors.
    pub type_errors_as_value: bool,
    pub omit_null_on_read: bool,
    pub properties: Vec<PropertySchema>,
    pub rules: Vec<ObjectRule>,
}

impl ObjectType {
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            singleton: None,
            deletable: true,
            reset_on_empty: false,
            activation: None,
            variant: None,
            unknown_property_status: 400,
            type_errors_as_value: false,
            omit_null_on_read: false,
            properties: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn singleton(name: &'static str, instance: &'static str) -> Self {
        Self {
            singleton: Some(instance),
            deletable: false,
            ..Self::named(name)
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton.is_some()
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|prop| prop.name == name)
    }

    /// Stored properties with their defaults.
    pub fn defaults(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .filter(|prop| !prop.transient)
            .map(|prop| (prop.name.to_string(), prop.default.clone()))
            .collect()
    }

    pub fn reference_properties(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties
            .iter()
            .filter(|prop| prop.reference_target().is_some())
    }
}

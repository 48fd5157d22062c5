//! Type and range validation for submitted property values.
//!
//! # Purpose
//! Checks one raw JSON value against its property schema and produces an
//! [`Assignment`]. The JSON kind is checked first; range, length, enum and
//! format checks only run on a value of the right kind.
//!
//! # Key invariants
//! - Validation never touches stored state.
//! - `null` on an optional property resets it; on a required one it fails.
//! - Integer fields marked `zero_clears` treat `0` exactly like `null`.
//! - Integer fields with a lenient maximum store values above it unchanged.
use crate::catalog::MAX_CLIENT_ADDRESSES;
use crate::error::{ConfigError, ConfigResult, ErrorKind};
use crate::normalize::{Assignment, canonical_enum, canonical_tokens, reference_names};
use crate::schema::{ObjectType, PropertyKind, PropertySchema, StringFormat};
use crate::value::{json_kind, shown};
use serde_json::Value;
use std::net::IpAddr;

/// The object a property belongs to, for error messages.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub object: &'a ObjectType,
    pub name: &'a str,
}

impl<'a> Subject<'a> {
    pub fn new(object: &'a ObjectType, name: &'a str) -> Self {
        Self { object, name }
    }

    fn type_error(&self, schema: &PropertySchema, raw: &Value) -> ConfigError {
        if self.object.type_errors_as_value {
            return ConfigError::invalid_value(schema.name, &shown(raw));
        }
        ConfigError::new(
            ErrorKind::TypeMismatch,
            &[self.object.name, self.name, schema.name, json_kind(raw)],
        )
    }

    pub fn required_error(&self, schema: &PropertySchema, raw: &Value) -> ConfigError {
        if self.object.type_errors_as_value {
            return ConfigError::invalid_value(schema.name, &shown(raw));
        }
        ConfigError::required(schema.name)
    }
}

/// Validate `raw` for `schema`, returning the value to assign.
pub fn validate(
    subject: &Subject<'_>,
    schema: &PropertySchema,
    raw: &Value,
) -> ConfigResult<Assignment> {
    if raw.is_null() {
        if schema.required {
            return Err(subject.required_error(schema, raw));
        }
        return Ok(Assignment::Reset);
    }

    match &schema.kind {
        PropertyKind::String { max_len, format } => {
            let text = raw.as_str().ok_or_else(|| subject.type_error(schema, raw))?;
            if text.is_empty() {
                return empty_string(subject, schema, raw);
            }
            if text.chars().count() > *max_len {
                return Err(ConfigError::new(
                    ErrorKind::ValueTooLong,
                    &[subject.object.name, schema.name, text],
                ));
            }
            check_format(schema, *format, text).map(|value| Assignment::Set(Value::String(value)))
        }
        PropertyKind::Integer {
            min,
            max,
            max_enforced,
            zero_clears,
        } => {
            if !raw.is_number() {
                return Err(subject.type_error(schema, raw));
            }
            if raw.is_f64() {
                return Err(subject.type_error(schema, raw));
            }
            let number = raw
                .as_i64()
                .ok_or_else(|| ConfigError::invalid_value(schema.name, &shown(raw)))?;
            if number == 0 && *zero_clears {
                return Ok(Assignment::Reset);
            }
            if number < *min || (number > *max && *max_enforced) {
                return Err(ConfigError::invalid_value(schema.name, &shown(raw)));
            }
            Ok(Assignment::Set(Value::from(number)))
        }
        PropertyKind::Boolean => raw
            .as_bool()
            .map(|flag| Assignment::Set(Value::Bool(flag)))
            .ok_or_else(|| subject.type_error(schema, raw)),
        PropertyKind::Enum { values } => {
            let text = raw.as_str().ok_or_else(|| subject.type_error(schema, raw))?;
            if text.is_empty() {
                return empty_string(subject, schema, raw);
            }
            canonical_enum(values, text)
                .map(|value| Assignment::Set(Value::String(value.to_string())))
                .ok_or_else(|| ConfigError::invalid_value(schema.name, text))
        }
        PropertyKind::TokenSet { values, aggregate } => {
            let text = raw.as_str().ok_or_else(|| subject.type_error(schema, raw))?;
            if text.is_empty() {
                return empty_string(subject, schema, raw);
            }
            canonical_tokens(values, *aggregate, text)
                .map(|value| Assignment::Set(Value::String(value)))
                .ok_or_else(|| ConfigError::invalid_value(schema.name, text))
        }
        PropertyKind::List {
            max_items,
            scalar_coercion,
        } => match raw {
            Value::Array(items) => {
                if items.len() > *max_items {
                    return Err(ConfigError::invalid_value(schema.name, &shown(raw)));
                }
                if items.is_empty() {
                    return empty_string(subject, schema, raw);
                }
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(text) if !text.trim().is_empty() => {
                            out.push(Value::String(text.trim().to_string()))
                        }
                        _ => return Err(ConfigError::invalid_value(schema.name, &shown(item))),
                    }
                }
                Ok(Assignment::Set(Value::Array(out)))
            }
            Value::String(text) if *scalar_coercion => {
                if text.trim().is_empty() {
                    return empty_string(subject, schema, raw);
                }
                Ok(Assignment::Set(Value::Array(vec![Value::String(
                    text.trim().to_string(),
                )])))
            }
            _ => Err(subject.type_error(schema, raw)),
        },
        PropertyKind::Reference { multiple, .. } => {
            let text = raw.as_str().ok_or_else(|| subject.type_error(schema, raw))?;
            let names = reference_names(text);
            if names.is_empty() {
                return empty_string(subject, schema, raw);
            }
            if !multiple && names.len() > 1 {
                return Err(ConfigError::invalid_value(schema.name, text));
            }
            Ok(Assignment::Set(Value::String(names.join(","))))
        }
    }
}

// Empty input: an error when required, the default when the default is unset,
// otherwise an explicit empty string.
fn empty_string(
    subject: &Subject<'_>,
    schema: &PropertySchema,
    raw: &Value,
) -> ConfigResult<Assignment> {
    if schema.required {
        return Err(subject.required_error(schema, raw));
    }
    match (&schema.kind, &schema.default) {
        (PropertyKind::String { .. }, Value::String(_)) => {
            Ok(Assignment::Set(Value::String(String::new())))
        }
        _ => Ok(Assignment::Reset),
    }
}

fn check_format(schema: &PropertySchema, format: StringFormat, text: &str) -> ConfigResult<String> {
    let invalid = || ConfigError::invalid_value(schema.name, text);
    match format {
        StringFormat::Any => Ok(text.to_string()),
        StringFormat::IpAddress => text
            .parse::<IpAddr>()
            .map(|addr| addr.to_string())
            .map_err(|_| invalid()),
        StringFormat::Host => {
            if text.parse::<IpAddr>().is_ok() || is_host_name(text) {
                Ok(text.to_string())
            } else {
                Err(invalid())
            }
        }
        StringFormat::Interface => {
            if text.eq_ignore_ascii_case("all") {
                Ok("All".to_string())
            } else if text == "*" {
                Ok(text.to_string())
            } else {
                text.parse::<IpAddr>()
                    .map(|addr| addr.to_string())
                    .map_err(|_| invalid())
            }
        }
        StringFormat::LdapUrl => {
            let lower = text.to_ascii_lowercase();
            let rest = lower
                .strip_prefix("ldap://")
                .or_else(|| lower.strip_prefix("ldaps://"))
                .ok_or_else(invalid)?;
            let host = rest.split(['/', ':']).next().unwrap_or("");
            if host.is_empty() {
                return Err(invalid());
            }
            Ok(text.to_string())
        }
        StringFormat::HostPortList => {
            let mut entries = Vec::new();
            for entry in text.split(',').map(str::trim) {
                let (host, port) = entry.rsplit_once(':').ok_or_else(invalid)?;
                let port: u16 = port.parse().map_err(|_| invalid())?;
                if host.is_empty() || port == 0 {
                    return Err(invalid());
                }
                entries.push(entry.to_string());
            }
            Ok(entries.join(","))
        }
        StringFormat::ByteSize => {
            let upper = text.trim().to_ascii_uppercase();
            let digits = upper
                .strip_suffix("KB")
                .or_else(|| upper.strip_suffix("MB"))
                .unwrap_or(&upper);
            match digits.parse::<u64>() {
                Ok(size) if size > 0 => Ok(upper.clone()),
                _ => Err(invalid()),
            }
        }
        StringFormat::TimeToLive => {
            if text.eq_ignore_ascii_case("unlimited") {
                return Ok("unlimited".to_string());
            }
            match text.trim().parse::<i64>() {
                Ok(seconds) if (1..=2_147_483_647).contains(&seconds) => Ok(seconds.to_string()),
                _ => Err(invalid()),
            }
        }
        StringFormat::ClientAddressList => {
            let entries: Vec<&str> = text.split(',').map(str::trim).collect();
            if entries.len() > MAX_CLIENT_ADDRESSES {
                return Err(ConfigError::new(
                    ErrorKind::TooManyClientAddresses,
                    &[&MAX_CLIENT_ADDRESSES.to_string()],
                ));
            }
            for entry in &entries {
                if !is_client_address(entry) {
                    return Err(ConfigError::invalid_value(schema.name, entry));
                }
            }
            Ok(entries.join(","))
        }
    }
}

fn is_host_name(text: &str) -> bool {
    !text.is_empty()
        && text.len() <= 253
        && text.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        })
}

fn is_client_address(entry: &str) -> bool {
    if entry == "*" {
        return true;
    }
    if let Some((low, high)) = entry.split_once('-') {
        return match (low.trim().parse::<IpAddr>(), high.trim().parse::<IpAddr>()) {
            (Ok(IpAddr::V4(low)), Ok(IpAddr::V4(high))) => low <= high,
            (Ok(IpAddr::V6(low)), Ok(IpAddr::V6(high))) => low <= high,
            _ => false,
        };
    }
    entry.parse::<IpAddr>().is_ok()
}

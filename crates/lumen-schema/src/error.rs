//! Error catalog for configuration requests.
//!
//! # Purpose
//! Every failure category maps to one stable code, a default HTTP status and a
//! message template. The template is interpolated when the error is raised so
//! call sites never format messages by hand.
//!
//! # Key invariants
//! - The same category always carries the same code, whatever the object type.
//! - Templates use positional `{n}` placeholders.
use thiserror::Error;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedBody,
    InvalidRequest,
    UnknownProperty,
    TypeMismatch,
    InvalidValue,
    ValueTooLong,
    NameTooLong,
    RequiredMissing,
    NotFound,
    ReferenceNotFound,
    InUse,
    DeleteNotAllowed,
    MustDisableFirst,
    NameNotUpdatable,
    SubscriptionRequiresTopic,
    MissingFilter,
    TooManyClientAddresses,
    CertificateInvalid,
    BindFailed,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MalformedBody => "CWLNA6001",
            ErrorKind::InvalidRequest => "CWLNA0137",
            ErrorKind::UnknownProperty => "CWLNA0138",
            ErrorKind::TypeMismatch => "CWLNA0127",
            ErrorKind::InvalidValue => "CWLNA0112",
            ErrorKind::ValueTooLong => "CWLNA0144",
            ErrorKind::NameTooLong => "CWLNA0133",
            ErrorKind::RequiredMissing => "CWLNA0134",
            ErrorKind::NotFound | ErrorKind::ReferenceNotFound => "CWLNA0136",
            ErrorKind::InUse => "CWLNA0376",
            ErrorKind::DeleteNotAllowed => "CWLNA0372",
            ErrorKind::MustDisableFirst => "CWLNA0384",
            ErrorKind::NameNotUpdatable => "CWLNA6208",
            ErrorKind::SubscriptionRequiresTopic => "CWLNA0379",
            ErrorKind::MissingFilter => "CWLNA0139",
            ErrorKind::TooManyClientAddresses => "CWLNA0371",
            ErrorKind::CertificateInvalid => "CWLNA0449",
            ErrorKind::BindFailed => "CWLNA0447",
            ErrorKind::Internal => "CWLNA0100",
        }
    }

    /// Default HTTP status. Some object types override it at raise time.
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::NotFound | ErrorKind::ReferenceNotFound => 404,
            ErrorKind::DeleteNotAllowed => 403,
            ErrorKind::Internal => 500,
            _ => 400,
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            ErrorKind::MalformedBody => "Failed to parse administrative request: {0}.",
            ErrorKind::InvalidRequest => "The REST API call: {0} is not valid.",
            ErrorKind::UnknownProperty => {
                "The property name is invalid. Object: {0} Name: {1} Property: {2}"
            }
            ErrorKind::TypeMismatch => {
                "The property type is not valid. Object: {0} Name: {1} Property: {2} Type: {3}."
            }
            ErrorKind::InvalidValue => "The property value is not valid: Property: {0} Value: \"{1}\".",
            ErrorKind::ValueTooLong => {
                "The value that is specified for the property on the configuration object is too long. Object: {0} Property: {1} Value: {2}."
            }
            ErrorKind::NameTooLong => {
                "The name of the configuration object is too long. Object: {0} Property: Name Value: {1}."
            }
            ErrorKind::RequiredMissing => {
                "The value specified for the required property is invalid or null. Property: {0} Value: null."
            }
            ErrorKind::NotFound => "The item or object cannot be found. Type: {0} Name: {1}",
            ErrorKind::ReferenceNotFound => {
                "The item or object cannot be found. Type: {0} Name: {1} Referenced by: {2} {3}"
            }
            ErrorKind::InUse => {
                "The Object: {0}, Name: {1} is still being used by Object: {2}, Name: {3}"
            }
            ErrorKind::DeleteNotAllowed => "Delete is not allowed for {0} object.",
            ErrorKind::MustDisableFirst => {
                "You must disable the object {0} to update or set configuration item {1}."
            }
            ErrorKind::NameNotUpdatable => "Updates to the Name configuration item are not allowed.",
            ErrorKind::SubscriptionRequiresTopic => {
                "If you specify a subscription policy, you must also specify at least one topic policy. The topic policy must grant subscribe authority to the topic that is associated with the subscription name that is specified in the subscription policy. These subscription policies and topic policies must be associated with the same endpoint."
            }
            ErrorKind::MissingFilter => {
                "The object: {0} must have one of the properties {1} specified"
            }
            ErrorKind::TooManyClientAddresses => {
                "The number of client addresses exceeds the maximum number allowed: {0}."
            }
            ErrorKind::CertificateInvalid => {
                "The certificate for LDAP is not valid or does not exist."
            }
            ErrorKind::BindFailed => "Failed to bind with the LDAP server: {0}.",
            ErrorKind::Internal => "An unexpected error occurred: {0}.",
        }
    }
}

/// A raised catalog error with its message already rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {}", .kind.code(), .message)]
pub struct ConfigError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: u16,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn new(kind: ErrorKind, args: &[&str]) -> Self {
        Self {
            kind,
            message: render(kind.template(), args),
            status: kind.status(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn invalid_value(property: &str, shown: &str) -> Self {
        Self::new(ErrorKind::InvalidValue, &[property, shown])
    }

    pub fn required(property: &str) -> Self {
        Self::new(ErrorKind::RequiredMissing, &[property])
    }

    pub fn invalid_request(call: &str) -> Self {
        Self::new(ErrorKind::InvalidRequest, &[call])
    }

    pub fn not_found(object_type: &str, name: &str) -> Self {
        Self::new(ErrorKind::NotFound, &[object_type, name])
    }

    pub fn internal(detail: &str) -> Self {
        Self::new(ErrorKind::Internal, &[detail])
    }
}

/// Outcome codes for accepted changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    Applied,
    RestartPending,
}

impl Acknowledgement {
    pub fn code(self) -> &'static str {
        match self {
            Acknowledgement::Applied => "CWLNA6011",
            Acknowledgement::RestartPending => "CWLNA6168",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Acknowledgement::Applied => {
                "The requested configuration change has completed successfully."
            }
            Acknowledgement::RestartPending => {
                "The server will be restarted to complete the configuration changes."
            }
        }
    }
}

// Substitutes `{n}` with `args[n]`. Inserted text is not rescanned.
fn render(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let slot = tail
            .find('}')
            .and_then(|end| tail[..end].parse::<usize>().ok().map(|idx| (idx, end)));
        match slot {
            Some((idx, end)) => {
                out.push_str(args.get(idx).copied().unwrap_or(""));
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_positional_args() {
        let err = ConfigError::new(
            ErrorKind::TypeMismatch,
            &["Endpoint", "E1", "Port", "JSON_STRING"],
        );
        assert_eq!(
            err.message,
            "The property type is not valid. Object: Endpoint Name: E1 Property: Port Type: JSON_STRING."
        );
        assert_eq!(err.code(), "CWLNA0127");
        assert_eq!(err.status, 400);
    }

    #[test]
    fn inserted_braces_are_not_rescanned() {
        let err = ConfigError::invalid_value("TopicMap", "iot-2/${Topic1*}/{0}");
        assert_eq!(
            err.message,
            "The property value is not valid: Property: TopicMap Value: \"iot-2/${Topic1*}/{0}\"."
        );
    }

    #[test]
    fn not_found_categories_share_code() {
        let missing = ConfigError::not_found("Endpoint", "E1");
        let dangling = ConfigError::new(
            ErrorKind::ReferenceNotFound,
            &["ConnectionPolicy", "CP1", "Endpoint", "E1"],
        );
        assert_eq!(missing.code(), dangling.code());
        assert_eq!(dangling.status, 404);
        assert!(dangling.message.contains("Type: ConnectionPolicy Name: CP1"));
    }

    #[test]
    fn status_override_keeps_code() {
        let err = ConfigError::new(ErrorKind::UnknownProperty, &["Endpoint", "E1", "Bogus"])
            .with_status(404);
        assert_eq!(err.status, 404);
        assert_eq!(err.code(), "CWLNA0138");
        assert_eq!(err.to_string(), format!("CWLNA0138: {}", err.message));
    }
}

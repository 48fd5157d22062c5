//! External collaborators consulted during validation.
//!
//! # Purpose
//! The engine never talks to a TLS keystore or an LDAP server itself. It asks
//! these capabilities, which are injected into the store at construction.
use std::collections::BTreeSet;

/// Installed TLS certificates, by file name.
pub trait CertificateStore: Send + Sync {
    fn contains(&self, name: &str) -> bool;
}

/// Fixed certificate set taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCertificateStore {
    names: BTreeSet<String>,
}

impl StaticCertificateStore {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl CertificateStore for StaticCertificateStore {
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Settings used for an LDAP bind check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindRequest {
    pub url: String,
    pub bind_dn: String,
    pub bind_password: String,
    pub certificate: String,
    pub timeout_secs: i64,
}

pub trait LdapBindVerifier: Send + Sync {
    /// Returns a short failure reason when the bind would not succeed.
    fn verify(&self, request: &BindRequest) -> Result<(), String>;
}

/// Syntactic verifier: the URL names a host, and a bind DN comes with a password.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBindVerifier;

impl LdapBindVerifier for DefaultBindVerifier {
    fn verify(&self, request: &BindRequest) -> Result<(), String> {
        let rest = request
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or("");
        let host = rest.split(['/', ':']).next().unwrap_or("");
        if host.is_empty() {
            return Err(format!("no host in URL {}", request.url));
        }
        if !request.bind_dn.is_empty() && request.bind_password.is_empty() {
            return Err("BindPassword is required when BindDN is set".to_string());
        }
        Ok(())
    }
}

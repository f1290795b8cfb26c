//! Remote store connection settings
//!
//! A [`ServerConfig`] is either fully defined or absent. There is no way to
//! build one with a missing field, so partial configurations can never reach
//! the protocol client.

use std::fmt;

use super::errors::DomainError;

/// Connection parameters for the remote WebDAV store
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    server_uri: String,
    base_path: String,
    user: String,
    password: String,
}

impl ServerConfig {
    /// Creates a server configuration; every field must be non-empty
    pub fn new(
        server_uri: impl Into<String>,
        base_path: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let server_uri = non_empty(server_uri.into(), "server_uri")?;
        let base_path = non_empty(base_path.into(), "base_path")?;
        let user = non_empty(user.into(), "user")?;
        let password = non_empty(password.into(), "password")?;

        Ok(Self {
            server_uri,
            base_path,
            user,
            password,
        })
    }

    /// Builds a configuration from optional parts
    ///
    /// Returns `None` unless all four parts are present and non-empty.
    pub fn from_parts(
        server_uri: Option<String>,
        base_path: Option<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> Option<Self> {
        Self::new(server_uri?, base_path?, user?, password?).ok()
    }

    pub fn server_uri(&self) -> &str {
        &self.server_uri
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("server_uri", &self.server_uri)
            .field("base_path", &self.base_path)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn non_empty(value: String, field: &'static str) -> Result<String, DomainError> {
    if value.trim().is_empty() {
        Err(DomainError::MissingServerSetting(field))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_full_config_is_defined() {
        let cfg = ServerConfig::from_parts(
            some("https://dav.example.com"),
            some("/remote.php/dav/files/alice"),
            some("alice"),
            some("secret"),
        )
        .unwrap();
        assert_eq!(cfg.server_uri(), "https://dav.example.com");
        assert_eq!(cfg.user(), "alice");
    }

    #[test]
    fn test_missing_password_equals_empty_config() {
        let missing_password = ServerConfig::from_parts(
            some("https://dav.example.com"),
            some("/dav"),
            some("alice"),
            None,
        );
        let empty = ServerConfig::from_parts(None, None, None, None);
        assert!(missing_password.is_none());
        assert_eq!(missing_password, empty);
    }

    #[test]
    fn test_blank_field_is_rejected() {
        let err = ServerConfig::new("https://dav.example.com", "/dav", "  ", "pw").unwrap_err();
        assert_eq!(err, DomainError::MissingServerSetting("user"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let cfg = ServerConfig::new("https://dav.example.com", "/dav", "alice", "hunter2").unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}

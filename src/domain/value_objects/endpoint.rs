//! Endpoint value object - where and how to connect
//!
//! - `Protocol` selects the backend (FTP or SFTP) once, at startup
//! - `Endpoint` carries host, port, and credentials
//! - `ConnectionState` tracks a session's lifecycle

use serde::{Deserialize, Serialize};

/// Transfer protocol, taken from the host URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// FTP, optionally upgraded to explicit TLS
    Ftp,
    /// SFTP over SSH
    Sftp,
}

impl Protocol {
    /// Parse a URL scheme (`ftp`, `sftp`); anything else is unsupported
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "ftp" => Some(Protocol::Ftp),
            "sftp" => Some(Protocol::Sftp),
            _ => None,
        }
    }

    /// Port used when the host URL does not name one
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Ftp => 21,
            Protocol::Sftp => 22,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Ftp => "ftp",
            Protocol::Sftp => "sftp",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.scheme())
    }
}

/// A validated remote endpoint
///
/// Built by the configuration layer; the core never sees an endpoint with an
/// empty host or user.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Private key material (PEM/OpenSSH), SFTP only
    pub private_key: Option<String>,
    pub private_key_passphrase: Option<String>,
    /// Explicit TLS, FTP only
    pub secure: bool,
    pub debug: bool,
}

impl Endpoint {
    pub fn new(protocol: Protocol, host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            protocol,
            host: host.into(),
            port: protocol.default_port(),
            user: user.into(),
            password: None,
            private_key: None,
            private_key_passphrase: None,
            secure: false,
            debug: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_private_key(mut self, key: impl Into<String>, passphrase: Option<String>) -> Self {
        self.private_key = Some(key.into());
        self.private_key_passphrase = passphrase;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// `host:port` socket address string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Display form without credentials, e.g. `sftp://deploy@example.com:22`
    pub fn display_name(&self) -> String {
        format!(
            "{}://{}@{}:{}",
            self.protocol, self.user, self.host, self.port
        )
    }
}

// Secrets stay out of debug output.
impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("private_key", &self.private_key.as_ref().map(|_| "***"))
            .field("secure", &self.secure)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Lifecycle of one remote session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

//! Connection configuration.
//!
//! Options resolve once, at construction time: explicit builder values win
//! over `MSSQL_*` environment variables, which win over defaults. The result
//! is an immutable [`ConnectOptions`] passed into
//! [`Connection::connect`](crate::connection::Connection::connect); nothing
//! reads the environment after that.

use std::env;
use std::fmt;

use crate::error::Error;

const ENV_DRIVER: &str = "MSSQL_DRIVER";
const ENV_HOST: &str = "MSSQL_HOST";
const ENV_INSTANCE: &str = "MSSQL_INSTANCE";
const ENV_PORT: &str = "MSSQL_PORT";
const ENV_DATABASE: &str = "MSSQL_DATABASE";
const ENV_USER: &str = "MSSQL_USER";
const ENV_PASSWORD: &str = "MSSQL_PASSWORD";
const ENV_ENCRYPT: &str = "MSSQL_ENCRYPT";
const ENV_TRUST_CERT: &str = "MSSQL_TRUST_SERVER_CERT";

const DEFAULT_DRIVER: &str = "ODBC Driver 18 for SQL Server";
const DEFAULT_HOST: &str = "localhost";

/// Resolved options for establishing one connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub driver: String,
    pub host: String,
    pub instance: Option<String>,
    pub port: Option<u16>,
    pub database: String,
    pub username: String,
    pub password: String,
    pub encrypt: bool,
    pub trust_server_certificate: bool,
}

impl ConnectOptions {
    #[must_use]
    pub fn builder() -> ConnectOptionsBuilder {
        ConnectOptionsBuilder::default()
    }

    /// Resolve options purely from the `MSSQL_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a variable holds an unparseable value
    /// (port, boolean flags).
    pub fn from_env() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Render the ODBC connection-string form handed to the transport.
    #[must_use]
    pub fn odbc_connection_string(&self) -> String {
        self.render(&self.password)
    }

    /// Same as [`ConnectOptions::odbc_connection_string`] but safe to log.
    #[must_use]
    pub fn redacted_connection_string(&self) -> String {
        self.render("<redacted>")
    }

    fn render(&self, password: &str) -> String {
        let mut server = self.host.clone();
        if let Some(instance) = &self.instance {
            server.push('\\');
            server.push_str(instance);
        }
        if let Some(port) = self.port {
            server.push(',');
            server.push_str(&port.to_string());
        }
        format!(
            "Driver={{{}}};Server={};Database={};UID={};PWD={};Encrypt={};TrustServerCertificate={}",
            self.driver.trim_matches(['{', '}']),
            server,
            self.database,
            self.username,
            password,
            yes_no(self.encrypt),
            yes_no(self.trust_server_certificate),
        )
    }
}

// Keep credentials out of logs and error messages.
impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("instance", &self.instance)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("encrypt", &self.encrypt)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .finish()
    }
}

/// Fluent builder for [`ConnectOptions`]. Unset fields fall back to the
/// matching `MSSQL_*` environment variable, then to the default.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptionsBuilder {
    driver: Option<String>,
    host: Option<String>,
    instance: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    encrypt: Option<bool>,
    trust_server_certificate: Option<bool>,
}

impl ConnectOptionsBuilder {
    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = Some(encrypt);
        self
    }

    #[must_use]
    pub fn trust_server_certificate(mut self, trust: bool) -> Self {
        self.trust_server_certificate = Some(trust);
        self
    }

    /// Resolve against the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unparseable environment values.
    pub fn build(self) -> Result<ConnectOptions, Error> {
        self.build_with(|key| env::var(key).ok())
    }

    /// Resolve against an arbitrary variable source. [`Self::build`] uses
    /// the process environment; tests inject their own lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unparseable values from `lookup`.
    pub fn build_with(
        self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ConnectOptions, Error> {
        let port = match self.port {
            Some(p) => Some(p),
            None => lookup(ENV_PORT)
                .map(|raw| {
                    raw.parse::<u16>()
                        .map_err(|_| Error::Config(format!("{ENV_PORT}: {raw:?} is not a port")))
                })
                .transpose()?,
        };
        let encrypt = resolve_flag(self.encrypt, ENV_ENCRYPT, true, &lookup)?;
        let trust = resolve_flag(self.trust_server_certificate, ENV_TRUST_CERT, false, &lookup)?;

        Ok(ConnectOptions {
            driver: self
                .driver
                .or_else(|| lookup(ENV_DRIVER))
                .unwrap_or_else(|| DEFAULT_DRIVER.to_string()),
            host: self
                .host
                .or_else(|| lookup(ENV_HOST))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            instance: self.instance.or_else(|| lookup(ENV_INSTANCE)),
            port,
            database: self
                .database
                .or_else(|| lookup(ENV_DATABASE))
                .unwrap_or_default(),
            username: self
                .username
                .or_else(|| lookup(ENV_USER))
                .unwrap_or_default(),
            password: self
                .password
                .or_else(|| lookup(ENV_PASSWORD))
                .unwrap_or_default(),
            encrypt,
            trust_server_certificate: trust,
        })
    }
}

fn resolve_flag(
    explicit: Option<bool>,
    key: &str,
    default: bool,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<bool, Error> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(Error::Config(format!("{key}: {raw:?} is not a boolean"))),
        },
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

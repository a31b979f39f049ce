use std::sync::Arc;
use std::time::Duration;

use crate::client::{Client, DEFAULT_RECEIVE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use crate::endpoint::NativeEndpoint;

/// Socks5 proxy registered with the endpoint during authorization.
#[derive(Clone, Debug)]
pub struct Socks5Proxy {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub password: String,
}

/// Per-session settings the authorization driver feeds into its commands.
#[derive(Clone, Debug, Default)]
pub(crate) struct Settings {
    pub api_id: i32,
    pub api_hash: String,
    pub phone: String,
    pub system_language_code: String,
    pub system_version: String,
    pub device_model: String,
    pub application_version: String,
    pub files_directory: String,
    pub database_directory: String,
    pub use_file_database: bool,
    pub check_code: String,
    pub password: String,
    pub proxy: Option<Socks5Proxy>,
}

pub struct ClientBuilder {
    settings: Settings,
    request_timeout: Duration,
    receive_timeout: Duration,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }

    pub fn api_id(mut self, api_id: i32) -> Self {
        self.settings.api_id = api_id;
        self
    }

    pub fn api_hash(mut self, api_hash: impl Into<String>) -> Self {
        self.settings.api_hash = api_hash.into();
        self
    }

    pub fn auth_phone(mut self, phone: impl Into<String>) -> Self {
        self.settings.phone = phone.into();
        self
    }

    pub fn system_language_code(mut self, code: impl Into<String>) -> Self {
        self.settings.system_language_code = code.into();
        self
    }

    pub fn system_version(mut self, version: impl Into<String>) -> Self {
        self.settings.system_version = version.into();
        self
    }

    pub fn device_model(mut self, model: impl Into<String>) -> Self {
        self.settings.device_model = model.into();
        self
    }

    pub fn application_version(mut self, version: impl Into<String>) -> Self {
        self.settings.application_version = version.into();
        self
    }

    pub fn files_directory(mut self, dir: impl Into<String>) -> Self {
        self.settings.files_directory = dir.into();
        self
    }

    pub fn database_directory(mut self, dir: impl Into<String>) -> Self {
        self.settings.database_directory = dir.into();
        self
    }

    pub fn use_file_database(mut self, value: bool) -> Self {
        self.settings.use_file_database = value;
        self
    }

    pub fn check_code(mut self, code: impl Into<String>) -> Self {
        self.settings.check_code = code.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.settings.password = password.into();
        self
    }

    pub fn socks5_proxy(
        mut self,
        host: impl Into<String>,
        port: u16,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.settings.proxy = Some(Socks5Proxy {
            host: host.into(),
            port,
            login: login.into(),
            password: password.into(),
        });
        self
    }

    /// How long `send` waits for a correlated reply.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// How long one poll of the endpoint blocks before the update loop
    /// re-checks the closed flag.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Build the client and start its update loop. Must be called from
    /// within a tokio runtime.
    pub fn build(self, endpoint: Arc<dyn NativeEndpoint>) -> Client {
        Client::new(
            endpoint,
            self.settings,
            self.request_timeout,
            self.receive_timeout,
        )
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

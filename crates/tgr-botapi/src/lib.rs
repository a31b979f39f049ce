//! Telegram Bot API client: plain JSON over HTTP, optionally through a
//! socks5 proxy.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use tgr_core::{Error, Result};

const API_URL: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct Bot {
    token: String,
    http: reqwest::Client,
}

#[derive(Clone, Debug)]
pub struct BotBuilder {
    token: String,
    timeout: Duration,
    proxy: Option<Socks5Proxy>,
}

#[derive(Clone, Debug)]
pub struct Socks5Proxy {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub password: String,
}

/// The bot's own identity, from `getMe`.
#[derive(Clone, Debug, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    description: String,
    #[serde(default)]
    error_code: i64,
}

impl BotBuilder {
    pub fn new() -> Self {
        Self {
            token: String::new(),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
        }
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socks5_proxy(
        mut self,
        host: impl Into<String>,
        port: u16,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.proxy = Some(Socks5Proxy {
            host: host.into(),
            port,
            login: login.into(),
            password: password.into(),
        });
        self
    }

    pub fn build(self) -> Result<Bot> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("bot token is required".to_string()));
        }

        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if let Some(proxy) = &self.proxy {
            let url = format!(
                "socks5h://{}:{}@{}:{}",
                proxy.login, proxy.password, proxy.host, proxy.port
            );
            let proxy = reqwest::Proxy::all(&url)
                .map_err(|e| Error::Config(format!("bot proxy setup failed: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("bot http client build failed: {e}")))?;

        Ok(Bot {
            token: self.token,
            http,
        })
    }
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::new()
    }

    pub async fn get_me(&self) -> Result<BotUser> {
        let result = self.call("getMe", json!({})).await?;
        serde_json::from_value(result).map_err(|e| Error::Parse {
            context: "decoding getMe result".to_string(),
            source: e,
        })
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.call("sendMessage", json!({"chat_id": chat_id, "text": text}))
            .await?;
        Ok(())
    }

    pub async fn forward_message(
        &self,
        chat_id: i64,
        from_chat_id: i64,
        message_id: i64,
    ) -> Result<()> {
        self.call(
            "forwardMessage",
            json!({
                "chat_id": chat_id,
                "from_chat_id": from_chat_id,
                "message_id": message_id,
            }),
        )
        .await?;
        Ok(())
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let url = format!("{API_URL}/bot{}/{method}", self.token);
        let response = self
            .http
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|e| Error::BotApi {
                method: method.to_string(),
                reason: format!("transport: {e}"),
            })?;
        let body: ApiResponse = response.json().await.map_err(|e| Error::BotApi {
            method: method.to_string(),
            reason: format!("decode: {e}"),
        })?;
        into_result(method, &params, body)
    }
}

fn into_result(method: &str, params: &Value, body: ApiResponse) -> Result<Value> {
    if !body.ok {
        return Err(Error::BotApi {
            method: method.to_string(),
            reason: format!(
                "code {}: {} (request: {params})",
                body.error_code, body.description
            ),
        });
    }
    Ok(body.result)
}

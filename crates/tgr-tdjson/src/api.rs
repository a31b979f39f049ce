//! High-level calls on top of the request/response façade, plus the
//! authorization driver.

use std::sync::atomic::Ordering;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::warn;

use tgr_core::{Error, Result};

use crate::client::Client;
use crate::commands::{Command, ProxyType, TdlibParameters};
use crate::event::class_types;
use crate::types::{AuthState, Chat, Message, Messages, NewMessageUpdate, User};

/// Upper bound on authorization passes; past this the state is cycling.
const MAX_AUTH_PASSES: usize = 32;

impl Client {
    pub async fn get_auth_state(&self) -> Result<AuthState> {
        let event = self.send(Command::GetAuthorizationState).await?;
        Ok(AuthState::from_type(&event.event_type))
    }

    pub fn set_log_verbosity(&self, verbosity: i64) -> Result<()> {
        self.send_and_forget(Command::SetLogVerbosityLevel {
            new_verbosity_level: verbosity,
        })
    }

    /// Drive authorization until the session is ready.
    ///
    /// Each pass re-queries the state and issues the one command that
    /// satisfies it. A configured proxy is registered exactly once, after
    /// the parameters step is accepted and before any later step runs. Any
    /// step failure aborts the whole sequence unchanged.
    pub async fn authorize(&self) -> Result<()> {
        for _ in 0..MAX_AUTH_PASSES {
            let state = self.get_auth_state().await?;

            if state == AuthState::WaitTdlibParameters {
                self.set_tdlib_parameters().await?;
                continue;
            }

            self.ensure_proxy_added()?;

            match state {
                AuthState::WaitEncryptionKey => self.check_database_encryption_key(None).await?,
                AuthState::WaitPhoneNumber => self.set_authentication_phone_number().await?,
                AuthState::WaitCode => self.check_authentication_code().await?,
                AuthState::WaitPassword => self.check_authentication_password().await?,
                AuthState::Ready => return Ok(()),
                other => {
                    return Err(Error::Auth(format!(
                        "unexpected state: {}",
                        other.as_str()
                    )))
                }
            }
        }
        Err(Error::Auth(format!(
            "state did not settle after {MAX_AUTH_PASSES} passes"
        )))
    }

    pub async fn get_me(&self) -> Result<User> {
        self.send(Command::GetMe).await?.decode()
    }

    pub async fn get_chats(
        &self,
        offset_order: i64,
        offset_chat_id: i64,
        limit: i64,
    ) -> Result<Vec<i64>> {
        #[derive(Deserialize)]
        struct ChatIds {
            #[serde(default)]
            chat_ids: Vec<i64>,
        }

        let event = self
            .send(Command::GetChats {
                offset_order,
                offset_chat_id,
                limit,
            })
            .await?;
        Ok(event.decode::<ChatIds>()?.chat_ids)
    }

    pub async fn get_chat(&self, chat_id: i64) -> Result<Chat> {
        self.send(Command::GetChat { chat_id }).await?.decode()
    }

    pub async fn get_chat_history(
        &self,
        chat_id: i64,
        from_message_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Messages> {
        self.send(Command::GetChatHistory {
            chat_id,
            from_message_id,
            offset,
            limit,
        })
        .await?
        .decode()
    }

    /// Subscribe to `updateNewMessage` and republish each decoded message on
    /// an unbounded stream. An undecodable update is logged and skipped; the
    /// stream keeps going.
    pub fn listen_new_messages(&self) -> Result<mpsc::UnboundedReceiver<Message>> {
        let mut events = self.subscribe(class_types::UPDATE_NEW_MESSAGE)?;
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event.decode::<NewMessageUpdate>() {
                    Ok(update) => {
                        if tx.send(update.message).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("dropping undecodable update: {e}"),
                }
            }
        });
        Ok(rx)
    }

    async fn set_tdlib_parameters(&self) -> Result<()> {
        let s = &self.settings;
        self.send(Command::SetTdlibParameters {
            parameters: TdlibParameters {
                database_directory: s.database_directory.clone(),
                use_test_dc: false,
                files_directory: s.files_directory.clone(),
                use_file_database: s.use_file_database,
                use_chat_info_database: false,
                use_message_database: false,
                use_secret_chats: false,
                api_id: s.api_id,
                api_hash: s.api_hash.clone(),
                system_language_code: s.system_language_code.clone(),
                device_model: s.device_model.clone(),
                system_version: s.system_version.clone(),
                application_version: s.application_version.clone(),
                enable_storage_optimizer: false,
                ignore_file_names: false,
            },
        })
        .await?;
        Ok(())
    }

    fn ensure_proxy_added(&self) -> Result<()> {
        let Some(proxy) = &self.settings.proxy else {
            return Ok(());
        };
        if self.proxy_added.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.send_and_forget(Command::AddProxy {
            server: proxy.host.clone(),
            port: proxy.port,
            enable: true,
            proxy_type: ProxyType::Socks5 {
                username: proxy.login.clone(),
                password: proxy.password.clone(),
            },
        })
    }

    async fn check_database_encryption_key(&self, key: Option<String>) -> Result<()> {
        self.send(Command::CheckDatabaseEncryptionKey {
            encryption_key: key,
        })
        .await?;
        Ok(())
    }

    async fn set_authentication_phone_number(&self) -> Result<()> {
        self.send(Command::SetAuthenticationPhoneNumber {
            phone_number: self.settings.phone.clone(),
            allow_flash_call: false,
            is_current_phone_number: false,
        })
        .await?;
        Ok(())
    }

    async fn check_authentication_code(&self) -> Result<()> {
        self.send(Command::CheckAuthenticationCode {
            code: self.settings.check_code.clone(),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await?;
        Ok(())
    }

    async fn check_authentication_password(&self) -> Result<()> {
        self.send(Command::CheckAuthenticationPassword {
            password: self.settings.password.clone(),
        })
        .await?;
        Ok(())
    }
}

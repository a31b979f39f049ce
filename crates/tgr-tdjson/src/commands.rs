//! Outbound native operations as a closed set of typed commands.
//!
//! Each variant serializes to exactly the wire shape the endpoint accepts; a
//! misspelled field is a compile error instead of a silently ignored no-op.

use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub enum Command {
    GetAuthorizationState,
    SetTdlibParameters {
        parameters: TdlibParameters,
    },
    CheckDatabaseEncryptionKey {
        encryption_key: Option<String>,
    },
    SetAuthenticationPhoneNumber {
        phone_number: String,
        allow_flash_call: bool,
        is_current_phone_number: bool,
    },
    CheckAuthenticationCode {
        code: String,
        first_name: String,
        last_name: String,
    },
    CheckAuthenticationPassword {
        password: String,
    },
    GetMe,
    GetChats {
        offset_order: i64,
        offset_chat_id: i64,
        limit: i64,
    },
    GetChat {
        chat_id: i64,
    },
    GetChatHistory {
        chat_id: i64,
        from_message_id: i64,
        offset: i64,
        limit: i64,
    },
    AddProxy {
        server: String,
        port: u16,
        enable: bool,
        #[serde(rename = "type")]
        proxy_type: ProxyType,
    },
    SetLogVerbosityLevel {
        new_verbosity_level: i64,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "@type")]
pub enum ProxyType {
    #[serde(rename = "proxyTypeSocks5")]
    Socks5 { username: String, password: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "@type", rename = "tdlibParameters")]
pub struct TdlibParameters {
    pub database_directory: String,
    pub use_test_dc: bool,
    pub files_directory: String,
    pub use_file_database: bool,
    pub use_chat_info_database: bool,
    pub use_message_database: bool,
    pub use_secret_chats: bool,
    pub api_id: i32,
    pub api_hash: String,
    pub system_language_code: String,
    pub device_model: String,
    pub system_version: String,
    pub application_version: String,
    pub enable_storage_optimizer: bool,
    pub ignore_file_names: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_commands_carry_only_their_type() {
        assert_eq!(
            serde_json::to_value(Command::GetAuthorizationState).unwrap(),
            json!({"@type": "getAuthorizationState"})
        );
        assert_eq!(
            serde_json::to_value(Command::GetMe).unwrap(),
            json!({"@type": "getMe"})
        );
    }

    #[test]
    fn phone_number_command_matches_the_wire_shape() {
        let cmd = Command::SetAuthenticationPhoneNumber {
            phone_number: "+10000000000".to_string(),
            allow_flash_call: false,
            is_current_phone_number: false,
        };
        assert_eq!(
            serde_json::to_value(cmd).unwrap(),
            json!({
                "@type": "setAuthenticationPhoneNumber",
                "phone_number": "+10000000000",
                "allow_flash_call": false,
                "is_current_phone_number": false,
            })
        );
    }

    #[test]
    fn encryption_key_command_sends_null_for_no_key() {
        let cmd = Command::CheckDatabaseEncryptionKey {
            encryption_key: None,
        };
        assert_eq!(
            serde_json::to_value(cmd).unwrap(),
            json!({"@type": "checkDatabaseEncryptionKey", "encryption_key": null})
        );
    }

    #[test]
    fn tdlib_parameters_nest_with_their_own_type_tag() {
        let cmd = Command::SetTdlibParameters {
            parameters: TdlibParameters {
                database_directory: "/tmp/db".to_string(),
                use_test_dc: false,
                files_directory: "/tmp/files".to_string(),
                use_file_database: true,
                use_chat_info_database: false,
                use_message_database: false,
                use_secret_chats: false,
                api_id: 12345,
                api_hash: "abcdef".to_string(),
                system_language_code: "en".to_string(),
                device_model: "Server".to_string(),
                system_version: "Linux".to_string(),
                application_version: "0.1.0".to_string(),
                enable_storage_optimizer: false,
                ignore_file_names: false,
            },
        };
        assert_eq!(
            serde_json::to_value(cmd).unwrap(),
            json!({
                "@type": "setTdlibParameters",
                "parameters": {
                    "@type": "tdlibParameters",
                    "database_directory": "/tmp/db",
                    "use_test_dc": false,
                    "files_directory": "/tmp/files",
                    "use_file_database": true,
                    "use_chat_info_database": false,
                    "use_message_database": false,
                    "use_secret_chats": false,
                    "api_id": 12345,
                    "api_hash": "abcdef",
                    "system_language_code": "en",
                    "device_model": "Server",
                    "system_version": "Linux",
                    "application_version": "0.1.0",
                    "enable_storage_optimizer": false,
                    "ignore_file_names": false,
                }
            })
        );
    }

    #[test]
    fn add_proxy_nests_socks5_credentials() {
        let cmd = Command::AddProxy {
            server: "127.0.0.1".to_string(),
            port: 1080,
            enable: true,
            proxy_type: ProxyType::Socks5 {
                username: "user".to_string(),
                password: "pass".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(cmd).unwrap(),
            json!({
                "@type": "addProxy",
                "server": "127.0.0.1",
                "port": 1080,
                "enable": true,
                "type": {
                    "@type": "proxyTypeSocks5",
                    "username": "user",
                    "password": "pass",
                }
            })
        );
    }
}

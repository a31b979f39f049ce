use std::sync::Arc;

use anyhow::Context;

use tgr_botapi::Bot;
use tgr_core::config::Config;
use tgr_tdjson::{Client, NativeEndpoint};

mod pipeline;

use pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tgr_core::logging::init("tgr")?;

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load_file(&path).with_context(|| format!("loading {path}"))?;

    let endpoint = native_endpoint()?;
    let client = build_client(&config, endpoint);
    client.set_log_verbosity(1)?;
    client.authorize().await.context("authorization failed")?;

    let bot = build_bot(&config)?;

    let pipeline = Pipeline::new(&config.filter_regex, Arc::new(bot))?;
    pipeline.run(&client).await?;

    client.close().await;
    Ok(())
}

#[cfg(feature = "tdjson")]
fn native_endpoint() -> anyhow::Result<Arc<dyn NativeEndpoint>> {
    Ok(Arc::new(tgr_tdjson::TdJsonEndpoint::create()))
}

#[cfg(not(feature = "tdjson"))]
fn native_endpoint() -> anyhow::Result<Arc<dyn NativeEndpoint>> {
    anyhow::bail!("built without the tdjson backend; rebuild with `--features tdjson`")
}

fn build_client(config: &Config, endpoint: Arc<dyn NativeEndpoint>) -> Client {
    let c = &config.client;
    let mut builder = Client::builder()
        .api_id(c.api_id)
        .api_hash(&c.api_hash)
        .auth_phone(&c.phone)
        .system_language_code(&c.system_language_code)
        .system_version(&c.system_version)
        .device_model(&c.device_model)
        .application_version(&c.application_version)
        .files_directory(&c.files_directory)
        .database_directory(&c.database_directory)
        .use_file_database(c.use_file_database)
        .check_code(&c.check_code)
        .password(&c.password);
    if let Some(proxy) = &c.proxy {
        builder = builder.socks5_proxy(&proxy.host, proxy.port, &proxy.login, &proxy.password);
    }
    builder.build(endpoint)
}

fn build_bot(config: &Config) -> anyhow::Result<Bot> {
    let mut builder = Bot::builder()
        .token(&config.bot.token)
        .timeout(config.bot.timeout());
    // The bot rides the same proxy as the client.
    if let Some(proxy) = &config.client.proxy {
        builder = builder.socks5_proxy(&proxy.host, proxy.port, &proxy.login, &proxy.password);
    }
    Ok(builder.build()?)
}

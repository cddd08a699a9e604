//! Stream Demo - Registry and Data Stream Encoding
//!
//! Resolves a logical model name through the provider registry, streams a
//! reply, and prints each part as a UI data-stream line.
//!
//! Run against the deterministic mocks:
//!   CHATBRIDGE_TEST_MODE=1 cargo run --example stream_demo
//!
//! Run against a local backend speaking the native chunk protocol:
//!   CHATBRIDGE_BACKEND_PROTOCOL=native cargo run --example stream_demo -- chat-model "Hi"
//!
//! Set RUST_LOG=chatbridge_core=debug to see request logging.

use anyhow::Context;
use chatbridge_core::protocol::data_stream::{encode_error, encode_part, DATA_STREAM_HEADER};
use chatbridge_core::providers::CHAT_MODEL;
use chatbridge_core::{AppConfig, ChatRequest, Message, ProviderRegistry};
use futures::StreamExt;
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut args = std::env::args().skip(1);
    let model_name = args.next().unwrap_or_else(|| CHAT_MODEL.to_string());
    let prompt = args.next().unwrap_or_else(|| "Hello!".to_string());

    let config = AppConfig::from_env().context("loading configuration from environment")?;
    let registry = ProviderRegistry::from_config(&config)?;

    println!("\nChatbridge Stream Demo");
    println!("======================");
    println!("Environment: {:?}", config.environment);
    println!("Language models: {}", registry.language_model_names().join(", "));
    println!("Image models: {}", registry.image_model_names().join(", "));
    println!();

    let model = registry.language_model(&model_name)?;
    println!(
        "Streaming from '{}' ({} / {})",
        model_name,
        model.provider(),
        model.model_id()
    );
    println!("{}: {}", DATA_STREAM_HEADER.0, DATA_STREAM_HEADER.1);
    println!();

    let request = ChatRequest::new(vec![Message::user(prompt)]);
    let result = model.do_stream(&request).await?;
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }

    let mut stdout = std::io::stdout();
    let mut stream = result.stream;
    while let Some(part) = stream.next().await {
        let line = match part {
            Ok(part) => encode_part(&part),
            Err(e) => encode_error(&e),
        };
        stdout.write_all(line.as_bytes())?;
        stdout.flush()?;
    }

    Ok(())
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use groundqa_core::config::ModelSettings;
use groundqa_core::traits::LanguageModel;
use groundqa_llm::OpenAiChatModel;

#[test]
fn model_uses_configured_name_and_temperature() {
    let settings = ModelSettings { chat_model: "local-chat".into(), temperature: 0.0, ..ModelSettings::default() };
    let model = OpenAiChatModel::new(&settings);
    assert_eq!(model.model_id(), "local-chat");
    assert_eq!(model.temperature(), 0.0);
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error() {
    let settings = ModelSettings { api_base: Some("http://127.0.0.1:9/v1".into()), ..ModelSettings::default() };
    std::env::set_var("OPENAI_API_KEY", "test-key");
    let model = OpenAiChatModel::new(&settings);
    assert!(model.complete("Hallo").await.is_err());
}

/// Answers every connection with `429 Too Many Requests` and counts them.
async fn rate_limited_server() -> anyhow::Result<(String, Arc<AtomicUsize>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 8192];
            let _ = stream.read(&mut buf).await;
            let body = r#"{"error":{"message":"slow down","type":"rate_limit","param":null,"code":null}}"#;
            let response = format!(
                "HTTP/1.1 429 Too Many Requests\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    Ok((format!("http://{addr}/v1"), hits))
}

#[tokio::test]
async fn rate_limited_request_is_sent_once() -> anyhow::Result<()> {
    let (api_base, hits) = rate_limited_server().await?;
    std::env::set_var("OPENAI_API_KEY", "test-key");
    let model = OpenAiChatModel::new(&ModelSettings { api_base: Some(api_base), ..ModelSettings::default() });
    assert!(model.complete("Hallo").await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

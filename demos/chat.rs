use dotenv::dotenv;
use gigachat::{GigaChatClient, GigaChatConfig, Message};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gigachat=info")),
        )
        .init();

    // Requires GIGACHAT_CREDENTIALS; see GigaChatConfig::from_env for the rest.
    let config = GigaChatConfig::from_env()?;
    let client = GigaChatClient::new(config).await?;

    let messages = vec![
        Message::system("You are a concise assistant."),
        Message::user("Tell me a random interesting fact about space."),
    ];

    match client.send(&messages).await {
        Ok(response) => println!("{}", response.content().unwrap_or_default()),
        Err(e) => println!(
            "Error (last status {}): {}",
            client.last_status_code(),
            e
        ),
    }

    client.shutdown().await;
    Ok(())
}

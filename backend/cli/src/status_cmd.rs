//! `chatrelay status`: report a running server's health.

use anyhow::Result;
use serde_json::Value;

use crate::terminal_output::{paint, BOLD, GREEN, RED, YELLOW};

pub async fn run(base_url: &str) -> Result<()> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let response = match reqwest::get(&url).await {
        Ok(response) => response,
        Err(e) => {
            println!("{} {}: {}", paint(RED, "✗"), base_url, e);
            return Ok(());
        }
    };

    let status = response.status();
    let body: Value = response.json().await?;
    println!("{}", paint(BOLD, &format!("chatrelay at {base_url}")));
    println!("  HTTP status: {status}");
    println!("  Server:      {}", body["status"].as_str().unwrap_or("unknown"));

    let key = if body["api_key_set"].as_bool().unwrap_or(false) {
        paint(GREEN, "set")
    } else {
        paint(YELLOW, "not set")
    };
    println!("  API key:     {key}");
    Ok(())
}

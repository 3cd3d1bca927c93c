//! `chatrelay chat`: a line-based terminal client.
//!
//! Keeps the session cookie across turns so the server sees one
//! conversation. `/clear` resets it and `/quit` exits.

use std::io::Write;

use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

use chatrelay_core::DIAGNOSTIC_PREFIX;

use crate::terminal_output::{paint, Utf8Chunker, CYAN, DIM, RED};

enum Input<'a> {
    Quit,
    Clear,
    Message(&'a str),
    Skip,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Skip,
        "/quit" | "/exit" => Input::Quit,
        "/clear" => Input::Clear,
        message => Input::Message(message),
    }
}

/// Diagnostics are appended to whatever streamed before the failure.
fn reports_failure(reply: &str) -> bool {
    reply.contains(DIAGNOSTIC_PREFIX)
}

pub async fn run(base_url: &str) -> Result<()> {
    let base_url = base_url.trim_end_matches('/');
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .context("failed to build HTTP client")?;

    println!(
        "{}",
        paint(DIM, &format!("Connected to {base_url}. /clear resets, /quit exits."))
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", paint(CYAN, "you>"));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_input(&line) {
            Input::Skip => continue,
            Input::Quit => break,
            Input::Clear => clear(&client, base_url).await?,
            Input::Message(message) => send(&client, base_url, message).await?,
        }
    }
    Ok(())
}

async fn clear(client: &reqwest::Client, base_url: &str) -> Result<()> {
    client
        .post(format!("{base_url}/api/clear"))
        .send()
        .await?
        .error_for_status()?;
    println!("{}", paint(DIM, "History cleared."));
    Ok(())
}

async fn send(client: &reqwest::Client, base_url: &str, message: &str) -> Result<()> {
    let response = client
        .post(format!("{base_url}/api/chat"))
        .json(&json!({ "message": message }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or_default();
        let reason = body["error"].as_str().unwrap_or("request failed");
        println!("{}", paint(RED, &format!("{status}: {reason}")));
        return Ok(());
    }

    let mut stdout = std::io::stdout();
    let mut chunker = Utf8Chunker::default();
    let mut reply = String::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let text = chunker.push(&chunk?);
        write!(stdout, "{text}")?;
        stdout.flush()?;
        reply.push_str(&text);
    }
    let tail = chunker.finish();
    write!(stdout, "{tail}")?;
    reply.push_str(&tail);
    println!();

    if reports_failure(&reply) {
        println!("{}", paint(RED, "(the server reported an error; this turn was not saved)"));
    }
    Ok(())
}

//! One-shot DM heartbeat from the command line
//! Reads the stored API key and prints what the notification badge would show

use moltbook_client::api::MoltbookClient;
use moltbook_client::config::Config;
use moltbook_client::session::{FileTokenStore, TokenStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    println!("Checking Moltbook DM activity...\n");

    // 1. Stored credentials
    println!("1. Loading API key from {}...", config.session.credentials_path.display());
    let store = FileTokenStore::new(&config.session.credentials_path);
    let Some(session) = store.load()? else {
        eprintln!("   ✗ No stored API key");
        eprintln!("   Register in the desktop client first, or set MOLTBOOK_CREDENTIALS");
        return Err(anyhow::anyhow!("not signed in"));
    };
    println!("   ✓ Found {:?}", session);

    // 2. Heartbeat
    println!("\n2. Calling {}/agents/dm/check...", config.api.base_url);
    let client = MoltbookClient::new(&config.api)?;
    let check = match client.dm_check(&session).await {
        Ok(check) => check,
        Err(e) => {
            eprintln!("   ✗ Heartbeat failed ({:?}): {}", e.kind(), e);
            return Err(e.into());
        }
    };

    println!("   ✓ has_activity: {}", check.has_activity);
    println!("   Pending requests: {}", check.requests.count);
    println!("   Unread messages:  {}", check.messages.total_unread);
    if let Some(summary) = &check.summary {
        println!("   Summary: {}", summary);
    }
    println!("\nBadge: {}", check.unread_total());

    Ok(())
}

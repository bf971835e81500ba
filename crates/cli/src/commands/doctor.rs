//! `seriesai doctor` — Diagnose system health.

use seriesai_config::AppConfig;
use seriesai_channels::{AppleScriptChannel, MessagesDb};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("SeriesAI Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `seriesai onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config and re-run.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");

        let client = seriesai_providers::build_from_config(&config);
        match client.provider().health_check().await {
            Ok(true) => println!("  ✅ Completion endpoint reachable ({})", config.api_url),
            Ok(false) => {
                println!("  ❌ Completion endpoint unhealthy ({})", config.api_url);
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Completion endpoint check failed: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ⚠️  No API key — set OPENROUTER_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    if AppleScriptChannel::is_supported() {
        println!("  ✅ iMessage delivery available");
        let db_path = config.relay.db_path();
        match MessagesDb::open_checked(&db_path).await {
            Ok(_) => println!("  ✅ Messages database readable"),
            Err(e) => {
                println!("  ❌ Messages database not readable: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ⚠️  Not macOS — iMessage relay unavailable (chat and serve still work)");
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

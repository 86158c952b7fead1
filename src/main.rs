use std::env;

use dotenvy::dotenv;
use log::info;

use sealed_ledger::{Block, Blockchain, ChainConfig, Result};

// Column width for the side-by-side view
const WIDTH: usize = 84;

fn main() -> Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = ChainConfig::from_env();
    let scenario = env::var("LEDGER_SCENARIO").unwrap_or_else(|_| "tamper".to_string());
    info!("demo scenario={scenario} config={config:?}");

    let mut chain = Blockchain::with_config(&config)?;
    chain.append("First entry in the ledger")?;
    chain.append("Second entry:\nspans a couple\nof lines")?;
    chain.append("Third entry")?;
    chain.append("Fourth entry:\nthe tip of the chain")?;

    let original = chain.clone();

    match scenario.as_str() {
        "edit" => chain.edit_at(2, "Rewritten through the cascade")?,
        "delete" => {
            chain.delete_at(2)?;
        }
        "tamper-timestamp" => {
            let ts = chain.get(2).map(Block::timestamp).unwrap_or_default();
            chain.tamper_timestamp_at(2, ts - 86_400_000)?;
        }
        "purge" => {
            chain.purge()?;
        }
        _ => chain.tamper_at(2, "TAMPERING ATTEMPT !!!")?,
    }

    if env::var("LEDGER_OUTPUT").is_ok_and(|v| v == "json") {
        let out = serde_json::json!({
            "scenario": scenario,
            "original": { "blocks": original.blocks(), "integrity": original.verify() },
            "modified": { "blocks": chain.blocks(), "integrity": chain.verify() },
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        return Ok(());
    }

    println!("{:<WIDTH$}{:<WIDTH$}", "Original chain", "Modified chain");
    println!("{}", "=".repeat(WIDTH * 2));
    print_side_by_side(&original, &chain);
    println!("original: {}", original.verify());
    println!("modified: {}", chain.verify());
    Ok(())
}

fn describe(block: &Block) -> Vec<String> {
    let mut lines = vec![
        format!("position : {}", block.position()),
        format!("hash : {}", block.hash()),
        format!("previous hash : {}", block.previous_hash()),
        format!("timestamp : {}", block.timestamp()),
    ];
    let mut payload = block.payload().lines();
    lines.push(format!("payload : {}", payload.next().unwrap_or_default()));
    lines.extend(payload.map(str::to_string));
    lines
}

fn print_side_by_side(left: &Blockchain, right: &Blockchain) {
    let rows = left.len().max(right.len());
    for i in 0..rows {
        let l = left.get(i).map(describe).unwrap_or_default();
        let r = right.get(i).map(describe).unwrap_or_default();
        for j in 0..l.len().max(r.len()) {
            println!(
                "{:<WIDTH$}{:<WIDTH$}",
                l.get(j).map(String::as_str).unwrap_or(""),
                r.get(j).map(String::as_str).unwrap_or("")
            );
        }
        println!("{}", "-".repeat(WIDTH * 2));
    }
}

//! Prompt history subcommand handlers.

use chrono::Local;

use multiai_config::PromptHistorySettings;
use multiai_core::{HistoryOptions, HistoryStore, PromptRecord};

use crate::cli::HistoryAction;
use crate::cmd_dialog::Loaded;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

const PREVIEW_CHARS: usize = 60;

/// Handle history subcommands.
pub(crate) async fn handle_history_command(action: HistoryAction, loaded: &Loaded) -> CmdResult {
    let settings = &loaded.settings.prompt_history_settings;
    let store =
        HistoryStore::open(HistoryOptions::from_settings(settings, &loaded.config.paths.vault))
            .await?;

    match action {
        HistoryAction::List {
            favorites,
            limit,
            format,
        } => {
            let records = store.search("", favorites).await?;
            print_records(&records[..records.len().min(limit)], settings, &format)
        }
        HistoryAction::Search { query, favorites } => {
            let records = store.search(&query, favorites).await?;
            print_records(&records, settings, "table")
        }
        HistoryAction::Favorite { id } => {
            let favorite = store.toggle_favorite(&id).await?;
            store.flush().await?;
            let state = if favorite { "added to" } else { "removed from" };
            println!("Record {} {} favorites", id, state);
            Ok(())
        }
        HistoryAction::Edit { id, content } => {
            let record = store.edit(&id, content).await?;
            store.flush().await?;
            println!("Record {} updated: {}", record.id, preview(&record.content));
            Ok(())
        }
        HistoryAction::Delete { id } => {
            store.delete(&id).await?;
            store.flush().await?;
            println!("Record {} deleted", id);
            Ok(())
        }
        HistoryAction::Stats { days, top, format } => {
            let stats = store.stats(days, top).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            println!("Total prompts: {}  Favorites: {}", stats.total, stats.favorites);
            println!("\nLast {} days:", days);
            for (day, count) in &stats.daily {
                println!("  {}  {:>4} {}", day, count, "#".repeat((*count).min(50)));
            }
            println!("\nPlatforms:");
            for (host, count) in &stats.platforms {
                println!("  {:<30} {}", host, count);
            }
            println!("\nTop words:");
            for (word, count) in &stats.top_words {
                println!("  {:<20} {}", word, count);
            }
            Ok(())
        }
    }
}

fn print_records(records: &[PromptRecord], settings: &PromptHistorySettings, format: &str) -> CmdResult {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No prompts found.");
        return Ok(());
    }

    for record in records {
        let star = if record.favorite { "*" } else { " " };
        let mut line = format!("{} {:<15}", star, record.id);
        if settings.show_timestamp {
            let when = record.datetime().with_timezone(&Local);
            line.push_str(&format!(" {}", when.format("%Y-%m-%d %H:%M")));
        }
        if settings.show_platform && !record.frames.is_empty() {
            let hosts: Vec<String> = record.frames.iter().map(|f| f.host()).collect();
            line.push_str(&format!(" [{}]", hosts.join(", ")));
        }
        println!("{} {}", line, preview(&record.content));
    }
    Ok(())
}

/// First line of `content`, cut to a fixed number of characters.
fn preview(content: &str) -> String {
    let first = content.lines().next().unwrap_or_default();
    let mut preview: String = first.chars().take(PREVIEW_CHARS).collect();
    if first.chars().count() > PREVIEW_CHARS || content.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}

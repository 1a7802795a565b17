//! The `aieval list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use aieval_providers::{load_config_from, provider_by_name};

pub fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut names: Vec<&str> = config.providers.keys().map(String::as_str).collect();
    if !names.contains(&"mock") {
        names.push("mock");
    }
    names.sort_unstable();

    for name in names {
        if provider_filter.as_deref().is_some_and(|filter| filter != name) {
            continue;
        }

        let provider = match provider_by_name(&config, name) {
            Ok(provider) => provider,
            Err(e) => {
                eprintln!("Skipping {name}: {e:#}");
                continue;
            }
        };

        let default_marker = if name == config.default_provider {
            " (default)"
        } else {
            ""
        };
        println!("Provider: {name}{default_marker}");
        for model in provider.available_models() {
            println!(
                "  {} - {} ({}K context)",
                model.id,
                model.name,
                model.max_context / 1000
            );
        }
        println!();
    }

    if config.providers.is_empty() {
        println!("No providers configured. Run `aieval init` to create a config file.");
    }

    Ok(())
}

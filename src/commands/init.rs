use std::path::Path;

use crate::{InitArgs, config::SignalsConfig};

const CONFIG_FILE: &str = "signals.yaml";
const STARTER_TEMPLATE: &str = include_str!("../../templates/template.html");

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    println!("Initializing project in {}", path.display());

    let config_text = serde_yaml::to_string(&SignalsConfig::default())?;
    write_new(&path.join(CONFIG_FILE), &config_text).await?;

    let template_name = SignalsConfig::default().template;
    write_new(&path.join(template_name), STARTER_TEMPLATE).await?;

    Ok(())
}

/// Write a file unless it already exists.
async fn write_new(path: &Path, contents: &str) -> Result<(), anyhow::Error> {
    if tokio::fs::try_exists(path).await? {
        println!("Skipped existing {}", path.display());
        return Ok(());
    }

    tokio::fs::write(path, contents).await?;
    println!("Created {}", path.display());
    Ok(())
}

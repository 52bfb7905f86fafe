use crate::{CleanArgs, config::SignalsConfig};

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let config = SignalsConfig::load_from_arg(args.config_file.as_deref())?;

    // Delete the generated output folder
    let output_dir = config.output_dir();
    let output_dir = output_dir.canonicalize().unwrap_or(output_dir);
    if output_dir.exists() {
        if args.dry_run {
            println!("Would delete {}", output_dir.display());
        } else {
            tokio::fs::remove_dir_all(&output_dir).await?;
            println!("Deleted {}", output_dir.display());
        }
    } else {
        println!("Nothing to clean at {}", output_dir.display());
    }

    Ok(())
}

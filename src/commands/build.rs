use crate::{
    BuildArgs,
    config::SignalsConfig,
    extract::{CardOutcome, ExtractResult, Extractor},
};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let mut config = SignalsConfig::load_from_arg(args.config_file.as_deref())?;
    apply_overrides(args, &mut config);

    let result = Extractor::new(config).run()?;
    report(&result)
}

/// Print the manifest location and every failed card; error if any card failed.
fn report(result: &ExtractResult) -> Result<(), anyhow::Error> {
    if let Some(manifest) = &result.manifest {
        println!("Manifest: {}", manifest.display());
    }

    let failures: Vec<&CardOutcome> = result.failures().collect();
    for failure in &failures {
        eprintln!("{}", describe_failure(failure));
    }
    if !failures.is_empty() {
        return Err(anyhow::anyhow!(
            "{} of {} card(s) failed",
            failures.len(),
            result.cards_found
        ));
    }

    Ok(())
}

fn describe_failure(outcome: &CardOutcome) -> String {
    format!(
        "Failed: card #{} ({}): {}",
        outcome.index,
        outcome.ticker.as_deref().unwrap_or("unknown"),
        outcome.result.as_ref().err().map(String::as_str).unwrap_or_default()
    )
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(args: &BuildArgs, config: &mut SignalsConfig) {
    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    if let Some(output) = &args.output {
        config.output = Some(output.clone());
    }
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if let Some(template) = &args.template {
        config.template = template.clone();
    }
    if let Some(strategy) = args.strategy {
        config.chart.strategy = strategy;
    }
    config.keep_going |= args.keep_going;
    config.manifest |= args.manifest;
}

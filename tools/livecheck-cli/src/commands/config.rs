//! Print or save the effective configuration.

use livecheck_common::config::AppConfig;

pub fn run(config: &AppConfig, write: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if write {
        let path = config.save()?;
        println!("\nConfig saved to: {}", path.display());
    }

    Ok(())
}

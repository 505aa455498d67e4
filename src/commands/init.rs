use anyhow::{bail, Context, Result};
use finrag::config::Config;
use std::path::PathBuf;

pub fn init_config(path: PathBuf, force: bool) -> Result<()> {
    let config_path = path.join("finrag.toml");
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let toml_content = format!("# finrag configuration\n\n{}", Config::default().to_toml()?);
    std::fs::write(&config_path, toml_content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created configuration file: {}", config_path.display());

    Ok(())
}

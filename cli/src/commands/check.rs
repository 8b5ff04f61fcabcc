use std::path::Path;

use anyhow::{Context, Result};
use flow_defs::FlowConfig;
use gitops::base_branch;

pub fn handle_check(config_path: &Path) -> Result<()> {
    let config = FlowConfig::from_file(config_path)
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    for line in describe(&config) {
        println!("{}", line);
    }
    Ok(())
}

fn describe(config: &FlowConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for app in &config.applications {
        lines.push(format!(
            "{} ({}) -> {}/{}",
            app.name, app.image, app.manifest_owner, app.manifest_name
        ));
        for manifest in &app.manifests {
            let target = if manifest.commit_without_pr {
                "direct commit"
            } else {
                "pull request"
            };
            lines.push(format!(
                "  {}: {} file(s) on {} via {}",
                manifest.env,
                manifest.files.len(),
                base_branch(&config.defaults, app, manifest),
                target
            ));
        }
    }
    lines
}

use anyhow::Result;
use log::debug;

use crate::{
    package::{Action, PackageDb},
    registry::{Trust, VersionRegistry},
    runtime::Runtime,
};

use super::config::{Config, Options};

/// Show detailed information about a package
#[tracing::instrument(skip(runtime, options))]
pub fn show<R: Runtime>(runtime: R, options: Options, name: &str) -> Result<()> {
    debug!("Showing info for {}", name);
    let config = Config::new(runtime, options)?;
    let mut db = config.load_db()?;

    // Offer the same default the status command would pick
    let default_version = match db.package(name) {
        Some(meta) => meta.trustp(db.registry(), true, config.trust),
        None => anyhow::bail!("Package {} is not in the catalog.", name),
    };
    db.set_action(name, Action::NoChange, default_version, false)?;

    for line in render_package(&db, name, config.trust)? {
        println!("{}", line);
    }
    Ok(())
}

pub(crate) fn render_package(db: &PackageDb, name: &str, trust: Trust) -> Result<Vec<String>> {
    let Some(meta) = db.package(name) else {
        anyhow::bail!("Package {} is not in the catalog.", name);
    };
    let registry = db.registry();
    let mut lines = Vec::new();

    lines.push(format!("Package: {}", meta.name()));
    let sdesc = meta.sdesc(registry);
    if !sdesc.is_empty() {
        lines.push(format!("Summary: {}", sdesc));
    }
    let categories = meta.readable_category_list();
    if !categories.is_empty() {
        lines.push(format!("Categories: {}", categories));
    }
    lines.push(format!(
        "Installed: {}",
        meta.installed()
            .map_or("(none)", |id| registry.canonical_version(id))
    ));
    if let Some(default) = meta.trustp(registry, true, trust) {
        lines.push(format!(
            "Default ({}): {}",
            trust,
            registry.canonical_version(default)
        ));
    }

    lines.push(String::new());
    lines.push("Versions:".to_string());
    for id in meta.versions().iter().rev() {
        let Some(version) = registry.get(id) else {
            continue;
        };
        let mut line = format!("  {:<20} [{}]", version.canonical_version, meta.trust_label(id));
        if !version.accessible() {
            line.push_str(" (unavailable)");
        }
        if !version.depends.is_empty() {
            line.push_str(&format!(" requires: {}", version.depends.join(", ")));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push("Actions:".to_string());
    for item in meta.list_actions(registry, db.task()) {
        let marker = if item.selected { '*' } else { ' ' };
        let suffix = if item.enabled { "" } else { " (disabled)" };
        lines.push(format!("  {} {}{}", marker, item.label, suffix));
    }

    if !meta.scripts().is_empty() {
        lines.push(String::new());
        lines.push("Scripts:".to_string());
        for script in meta.scripts() {
            lines.push(format!("  {}", script.path().display()));
        }
    }

    Ok(lines)
}

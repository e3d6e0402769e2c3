use anyhow::Result;
use log::debug;

use crate::{
    package::{ConsoleMessages, PackageDb, dispatch},
    registry::VersionRegistry,
    runtime::Runtime,
    selection::SelectionContext,
};

use super::config::{Config, Options};

/// Resolve the action for every package and print the plan
#[tracing::instrument(skip(runtime, options, selection))]
pub fn status<R: Runtime>(
    runtime: R,
    options: Options,
    selection: &SelectionContext,
    scan: bool,
) -> Result<()> {
    let config = Config::new(runtime, options)?;
    let mut db = config.load_db()?;

    if scan {
        let report = db.scan_downloaded_files(&config.cache(), false)?;
        debug!(
            "Scan pruned {} versions and dropped {} packages",
            report.pruned.len(),
            report.dropped.len()
        );
    }

    let events = db.apply_selection(selection, config.trust);
    db.log_selection_status();
    dispatch(events, &mut ConsoleMessages::new());

    for line in render_status(&db) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per package: name, chosen action, installed version.
pub(crate) fn render_status(db: &PackageDb) -> Vec<String> {
    let registry = db.registry();
    db.packages()
        .map(|meta| {
            let installed = meta
                .installed()
                .map_or("-", |id| registry.canonical_version(id));
            format!(
                "{:<24} {:<12} {}",
                meta.name(),
                meta.action_caption(registry, db.task()),
                installed
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

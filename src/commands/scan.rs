use anyhow::Result;
use log::info;

use crate::{package::ScanReport, runtime::Runtime};

use super::config::{Config, Options};

/// Check the local package directory and report what can no longer be offered
#[tracing::instrument(skip(runtime, options))]
pub fn scan<R: Runtime>(runtime: R, options: Options, mirror: bool) -> Result<()> {
    let config = Config::new(runtime, options)?;
    let mut db = config.load_db()?;
    info!("Scanning {} packages in {}", db.len(), config.local_dir.display());

    let report = db.scan_downloaded_files(&config.cache(), mirror)?;
    for line in render_report(&report) {
        println!("{}", line);
    }
    Ok(())
}

pub(crate) fn render_report(report: &ScanReport) -> Vec<String> {
    if report.pruned.is_empty() {
        return vec!["All versions are available.".to_string()];
    }

    let mut lines: Vec<String> = report
        .pruned
        .iter()
        .map(|p| format!("Unavailable: {} {}", p.package, p.version))
        .collect();
    lines.extend(report.dropped.iter().map(|name| format!("Dropped: {}", name)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PrunedVersion;

    #[test]
    fn test_render_report() {
        assert_eq!(
            render_report(&ScanReport::default()),
            vec!["All versions are available."]
        );

        let report = ScanReport {
            pruned: vec![PrunedVersion {
                package: "vim".into(),
                version: "9.1".into(),
            }],
            dropped: vec!["vim".into()],
        };
        assert_eq!(render_report(&report), vec!["Unavailable: vim 9.1", "Dropped: vim"]);
    }
}

use anyhow::Result;
use photoindex_core::catalog::Catalog;
use photoindex_core::domain::CatalogStats;
use photoindex_core::{LAST_INDEXED_AT_KEY, LAST_ROOT_KEY};

/// Lines of the overview block, without the trailing blank line.
pub(crate) fn overview_lines(
    stats: &CatalogStats,
    last_root: Option<&str>,
    last_indexed_at: Option<&str>,
) -> Vec<String> {
    vec![
        format!(
            "   Photos:     {:>8}        Tags:        {:>8}",
            stats.total_photos, stats.total_tags
        ),
        format!(
            "   Files:      {:>8}        Cameras:     {:>8}",
            stats.total_files, stats.total_cameras
        ),
        format!("   Locations:  {:>8}", stats.total_locations),
        format!("   Originals:  {}", last_root.unwrap_or("never indexed")),
        format!("   Last run:   {}", last_indexed_at.unwrap_or("never")),
    ]
}

pub fn run(catalog: &Catalog) -> Result<()> {
    let stats = catalog.store().stats()?;
    let last_root = catalog.get_config(LAST_ROOT_KEY)?;
    let last_indexed_at = catalog.get_config(LAST_INDEXED_AT_KEY)?;

    println!();
    println!("  Photoindex Status");
    println!("  =================");
    println!();
    for line in overview_lines(&stats, last_root.as_deref(), last_indexed_at.as_deref()) {
        println!("{line}");
    }
    println!();
    println!("  Run 'photoindex ls' to list indexed photos.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_of_empty_catalog() {
        let lines = overview_lines(&CatalogStats::default(), None, None);
        assert!(lines[0].contains("Photos:"));
        assert!(lines[0].ends_with("       0"));
        assert_eq!(lines[3], "   Originals:  never indexed");
        assert_eq!(lines[4], "   Last run:   never");
    }

    #[test]
    fn test_overview_counts() {
        let stats = CatalogStats {
            total_photos: 12,
            total_files: 30,
            total_tags: 7,
            total_cameras: 2,
            total_locations: 3,
        };
        let lines = overview_lines(&stats, Some("/photos"), Some("2026-01-01T00:00:00+00:00"));
        assert!(lines[0].contains("      12"));
        assert!(lines[1].contains("      30"));
        assert_eq!(lines[3], "   Originals:  /photos");
    }
}

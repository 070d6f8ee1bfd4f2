use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use photoindex_core::catalog::Catalog;
use photoindex_core::config::IndexerConfig;
use photoindex_core::probe::FsProbe;
use photoindex_core::{IndexProgress, Indexer};

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.green} {pos:>6} files {prefix:.dim} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn open_indexer(catalog: Catalog, root: &Path, config: IndexerConfig) -> Result<Indexer> {
    Ok(Indexer::new(root, catalog, Arc::new(FsProbe))?.with_config(config)?)
}

pub fn run(catalog: Catalog, root: &Path, config: IndexerConfig) -> Result<()> {
    let mut indexer = open_indexer(catalog, root, config)?;
    println!("  Indexing {}", indexer.root().display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_prefix("Indexing");
    pb.enable_steady_tick(std::time::Duration::from_millis(80));

    let mut summary: Option<String> = None;
    indexer.index_all(Some(&mut |progress| match progress {
        IndexProgress::GroupStart { main, .. } => {
            pb.set_message(main.display().to_string());
        }
        IndexProgress::File { .. } => pb.inc(1),
        IndexProgress::Skipped { .. } | IndexProgress::Failed { .. } => {}
        IndexProgress::Complete {
            indexed,
            added,
            updated,
            failed,
            cancelled,
        } => {
            let mut line = format!(
                "Indexed {indexed} files ({added} added, {updated} updated, {failed} groups failed)"
            );
            if cancelled {
                line.push_str(", cancelled");
            }
            summary = Some(line);
        }
    }))?;

    pb.finish_and_clear();
    if let Some(line) = summary {
        println!("  {line}");
    }
    Ok(())
}

pub fn related(catalog: Catalog, root: &Path, file: &Path, config: IndexerConfig) -> Result<()> {
    let mut indexer = open_indexer(catalog, root, config)?;

    let indexed = indexer.index_related(
        file,
        Some(&mut |progress| match progress {
            IndexProgress::File {
                path,
                role,
                file_type,
                result,
            } => println!("  {result} {role} {file_type} file \"{}\"", path.display()),
            IndexProgress::Skipped { path, reason } => {
                println!("  Skipped {}: {reason}", path.display())
            }
            _ => {}
        }),
    )?;

    if indexed.is_empty() {
        println!("  Nothing indexed.");
    }
    Ok(())
}

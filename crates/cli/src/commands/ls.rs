use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use photoindex_core::catalog::{Catalog, Store};
use photoindex_core::domain::{File, Photo};

/// One rendered row of the photo listing.
#[derive(Debug, PartialEq)]
pub(crate) struct PhotoRow {
    pub(crate) title: String,
    pub(crate) canonical_name: String,
    pub(crate) file_count: usize,
    pub(crate) primary: Option<String>,
    pub(crate) tags: String,
}

pub(crate) fn photo_row(photo: &Photo, files: &[File], tags: &[String]) -> PhotoRow {
    PhotoRow {
        title: photo.title.clone(),
        canonical_name: photo.canonical_name.clone(),
        file_count: files.len(),
        primary: files
            .iter()
            .find(|f| f.primary)
            .map(|f| f.path.display().to_string()),
        tags: tags.join(", "),
    }
}

fn collect_rows(store: &Store<'_>) -> Result<Vec<PhotoRow>> {
    let mut rows = Vec::new();
    for photo in store.list_photos()? {
        let files = store.files_for_photo(photo.id)?;
        let tags: Vec<String> = store
            .tags_for_photo(photo.id)?
            .into_iter()
            .map(|t| t.label)
            .collect();
        rows.push(photo_row(&photo, &files, &tags));
    }
    Ok(rows)
}

pub fn run(catalog: &Catalog) -> Result<()> {
    let rows = collect_rows(&catalog.store())?;
    if rows.is_empty() {
        println!("No photos indexed. Run 'photoindex index <ROOT>' first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Title"),
        Cell::new("Canonical Name"),
        Cell::new("Files"),
        Cell::new("Primary"),
        Cell::new("Tags"),
    ]);

    for row in &rows {
        let primary = match &row.primary {
            Some(path) => Cell::new(path),
            None => Cell::new("\u{2014}").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(&row.title),
            Cell::new(&row.canonical_name).fg(Color::Cyan),
            Cell::new(row.file_count),
            primary,
            Cell::new(&row.tags),
        ]);
    }

    println!("{table}");
    println!("  {} photos", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::DateTime;
    use photoindex_core::domain::FileType;

    use super::*;

    fn file(path: &str, file_type: FileType, primary: bool) -> File {
        File {
            id: 0,
            photo_id: 1,
            path: PathBuf::from(path),
            hash: path.to_string(),
            file_type,
            mime: String::new(),
            orientation: 1,
            width: None,
            height: None,
            aspect_ratio: None,
            primary,
        }
    }

    #[test]
    fn test_photo_row() {
        let ts = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        let mut photo = Photo::new("20200913_122640_UNKNOWN_1A2B3C4D".to_string(), ts, ts);
        photo.title = "Lyon / France / 2020".to_string();
        let files = vec![
            file("IMG_001.RAW", FileType::Raw, false),
            file("IMG_001.JPG", FileType::Jpeg, true),
        ];
        let tags = vec!["lyon".to_string(), "france".to_string()];

        let row = photo_row(&photo, &files, &tags);
        assert_eq!(row.file_count, 2);
        assert_eq!(row.primary.as_deref(), Some("IMG_001.JPG"));
        assert_eq!(row.tags, "lyon, france");
    }

    #[test]
    fn test_collect_rows_from_catalog() {
        let catalog = Catalog::open_in_memory().unwrap();
        let store = catalog.store();
        let ts = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        store
            .insert_photo(&Photo::new("p".to_string(), ts, ts))
            .unwrap();

        let rows = collect_rows(&store).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].primary, None);
        assert_eq!(rows[0].file_count, 0);
    }
}

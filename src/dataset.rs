use std::path::{Component, Path};

use crate::models::{FEATURE_LABELS, RegionFeatures};

/// Columns appended after the feature labels
pub const EXTRA_COLUMNS: [&str; 7] = [
    "specific_class",
    "general_class",
    "filename",
    "x",
    "y",
    "w",
    "h",
];

pub fn dataset_header() -> Vec<&'static str> {
    FEATURE_LABELS.iter().chain(EXTRA_COLUMNS.iter()).copied().collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub features: Vec<f64>,
    /// Name of the image's parent directory
    pub specific_class: String,
    /// First directory below the dataset root
    pub general_class: String,
    pub filename: String,
    pub bbox: [u32; 4],
}

impl DatasetRow {
    pub fn from_path(root: &Path, image_path: &Path, region: &RegionFeatures) -> Self {
        let specific_class = image_path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let general_class = image_path
            .strip_prefix(root)
            .ok()
            .and_then(|rel| {
                let mut parts = rel.components();
                let first = parts.next()?;
                // An image directly in the root has no class directory
                parts.next()?;
                match first {
                    Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                    _ => None,
                }
            })
            .unwrap_or_default();

        let b = region.bbox;
        Self {
            features: region.features.values().to_vec(),
            specific_class,
            general_class,
            filename: image_path.display().to_string(),
            bbox: [b.x, b.y, b.width, b.height],
        }
    }

    /// Row cells, in header order
    pub fn to_record(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|v| v.to_string())
            .chain([
                self.specific_class.clone(),
                self.general_class.clone(),
                self.filename.clone(),
            ])
            .chain(self.bbox.iter().map(|v| v.to_string()))
            .collect()
    }

    /// Comma-separated line; cells containing commas or quotes are quoted
    pub fn to_csv_line(&self) -> String {
        csv_line(self.to_record().iter().map(String::as_str))
    }
}

pub fn csv_line<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells
        .into_iter()
        .map(|cell| {
            if cell.contains([',', '"', '\n']) {
                format!("\"{}\"", cell.replace('"', "\"\""))
            } else {
                cell.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

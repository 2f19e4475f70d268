pub mod date;
pub mod error;
pub mod extension;
pub mod image;
pub mod walker;

use serde::{Deserialize, Serialize};

pub use date::{DateValue, FixedDate, TimeOfDay};
pub use error::InvocationError;
pub use image::{ExifProvider, ImageProvider};
pub use walker::{FileOutcome, FileReport, WalkRoot, WalkSummary, Walker, CORRECTED_FOLDER};

fn default_corrected_folder() -> String {
    CORRECTED_FOLDER.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkOptions {
    /// Folder, `.`, or folder plus wildcard file pattern
    pub root: String,
    pub date: FixedDate,
    #[serde(default = "default_corrected_folder")]
    pub corrected_folder: String,
}

impl WalkOptions {
    pub fn new(root: impl Into<String>, date: FixedDate) -> Self {
        Self {
            root: root.into(),
            date,
            corrected_folder: default_corrected_folder(),
        }
    }

    /// Check the root and the fixed date, in that order.
    pub fn validate(&self) -> Result<WalkRoot, InvocationError> {
        let root = WalkRoot::parse(&self.root);
        if !root.exists() {
            return Err(InvocationError::InvalidPath(self.root.clone()));
        }
        if !self.date.is_valid() {
            return Err(InvocationError::InvalidDate {
                year: self.date.year,
                month: self.date.month,
                day: self.date.day,
            });
        }
        Ok(root)
    }
}

/// Type alias for the per-file progress callback
pub type ReportCallback<'a> = dyn Fn(&FileReport) + 'a;

/// Stamp the fixed date onto every supported image under `options.root`.
pub fn process(
    options: &WalkOptions,
    report: &ReportCallback<'_>,
) -> anyhow::Result<WalkSummary> {
    process_with(&ExifProvider, options, report)
}

/// [`process`] with a caller-supplied image provider.
pub fn process_with<P: ImageProvider>(
    provider: &P,
    options: &WalkOptions,
    report: &ReportCallback<'_>,
) -> anyhow::Result<WalkSummary> {
    let root = options.validate()?;
    tracing::info!(
        "Stamping {} onto images under {}",
        options.date.at_midnight(),
        root.folder().display()
    );
    Walker::new(provider, options.date, &options.corrected_folder, report).walk(&root)
}

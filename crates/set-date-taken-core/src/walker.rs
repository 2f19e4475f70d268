use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local, Timelike};
use filetime::FileTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::date::resolve::{resolve, TimeSource};
use crate::date::{DateValue, FixedDate, TimeOfDay};
use crate::extension;
use crate::image::{DateTag, ImageProvider, TaggedImage};
use crate::ReportCallback;

/// Default name of the output folder created next to each source folder
pub const CORRECTED_FOLDER: &str = "Corrected";

/// Where a walk starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkRoot {
    /// Every entry of the folder, recursing into subfolders
    Directory(PathBuf),
    /// Only entries of `folder` whose names match `pattern` (`*` and `?`
    /// wildcards, case-insensitive). Subfolders are entered only when their
    /// own names match, which in practice means rarely.
    Pattern { folder: PathBuf, pattern: String },
}

impl WalkRoot {
    pub fn parse(input: &str) -> Self {
        let path = Path::new(input);
        if input == "." || path.is_dir() {
            return WalkRoot::Directory(path.to_path_buf());
        }
        let pattern = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folder = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        WalkRoot::Pattern { folder, pattern }
    }

    pub fn folder(&self) -> &Path {
        match self {
            WalkRoot::Directory(dir) => dir,
            WalkRoot::Pattern { folder, .. } => folder,
        }
    }

    /// The folder must exist; a pattern without wildcards must also name an
    /// existing entry, so a mistyped folder is not taken for an empty match.
    pub fn exists(&self) -> bool {
        match self {
            WalkRoot::Directory(dir) => dir.is_dir(),
            WalkRoot::Pattern { folder, pattern } => {
                folder.is_dir() && (has_wildcard(pattern) || folder.join(pattern).exists())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Corrected {
        dest: PathBuf,
        date: DateValue,
        time_source: TimeSource,
    },
    InvalidDate {
        date: DateValue,
    },
    /// Allow-listed, but the container has no room for EXIF date tags
    Unsupported {
        format: String,
    },
    Failed {
        reason: String,
    },
}

/// Progress record for one candidate image.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    pub scanned: u64,
    pub corrected: u64,
    pub invalid_dates: u64,
    #[serde(default)]
    pub unsupported: u64,
    pub failed: u64,
}

enum EntryFilter {
    All,
    Wildcard(Regex),
}

impl EntryFilter {
    fn wildcard(pattern: &str) -> anyhow::Result<Self> {
        if pattern == "*" || pattern == "*.*" {
            return Ok(EntryFilter::All);
        }
        let mut re = String::from("(?i)^");
        for c in pattern.chars() {
            match c {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                _ => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        re.push('$');
        let re = Regex::new(&re)
            .with_context(|| format!("Invalid wildcard pattern {pattern:?}"))?;
        Ok(EntryFilter::Wildcard(re))
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            EntryFilter::All => true,
            EntryFilter::Wildcard(re) => re.is_match(name),
        }
    }
}

struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Depth-first walk stamping the fixed date onto every supported image.
pub struct Walker<'a, P: ImageProvider> {
    provider: &'a P,
    date: FixedDate,
    corrected_folder: &'a str,
    report: &'a ReportCallback<'a>,
    summary: WalkSummary,
}

impl<'a, P: ImageProvider> Walker<'a, P> {
    pub fn new(
        provider: &'a P,
        date: FixedDate,
        corrected_folder: &'a str,
        report: &'a ReportCallback<'a>,
    ) -> Self {
        Self {
            provider,
            date,
            corrected_folder,
            report,
            summary: WalkSummary::default(),
        }
    }

    /// Walk `root`. Only a failure to list the root folder itself is an
    /// error; everything below it is handled per entry.
    pub fn walk(mut self, root: &WalkRoot) -> anyhow::Result<WalkSummary> {
        let filter = match root {
            WalkRoot::Directory(_) => EntryFilter::All,
            WalkRoot::Pattern { pattern, .. } => EntryFilter::wildcard(pattern)?,
        };
        let entries = list_entries(root.folder(), &filter)
            .with_context(|| format!("Listing {}", root.folder().display()))?;
        self.walk_entries(entries, &filter);
        Ok(self.summary)
    }

    fn walk_dir(&mut self, dir: &Path, filter: &EntryFilter) {
        match list_entries(dir, filter) {
            Ok(entries) => self.walk_entries(entries, filter),
            Err(e) => tracing::warn!("Skipping {}: {}", dir.display(), e),
        }
    }

    fn walk_entries(&mut self, entries: Vec<Entry>, filter: &EntryFilter) {
        for entry in entries {
            if entry.name == "." || entry.name == ".." {
                continue;
            }
            if entry.is_dir {
                if is_corrected_dir(&entry.name, self.corrected_folder) {
                    tracing::debug!("Not descending into {}", entry.path.display());
                    continue;
                }
                self.walk_dir(&entry.path, filter);
            } else if extension::is_allowed(&entry.path) {
                let outcome = self.process_file(&entry.path);
                self.record(entry.path, outcome);
            }
        }
    }

    fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        self.summary.scanned += 1;
        match &outcome {
            FileOutcome::Corrected { .. } => self.summary.corrected += 1,
            FileOutcome::InvalidDate { date } => {
                tracing::warn!("Invalid date and time {} for {}", date, path.display());
                self.summary.invalid_dates += 1;
            }
            FileOutcome::Unsupported { format } => {
                tracing::warn!("Unsupported format {} for {}", format, path.display());
                self.summary.unsupported += 1;
            }
            FileOutcome::Failed { reason } => {
                tracing::warn!("Failed to correct {}: {}", path.display(), reason);
                self.summary.failed += 1;
            }
        }
        (self.report)(&FileReport { path, outcome });
    }

    fn process_file(&self, path: &Path) -> FileOutcome {
        let mut image = match self.provider.open(path) {
            Ok(image) => image,
            Err(e) => {
                return FileOutcome::Failed {
                    reason: format!("{e:#}"),
                }
            }
        };

        if !image.has_tag(DateTag::Original) && !image.has_tag(DateTag::Digitized) {
            tracing::debug!("{} has no Date Taken tags", path.display());
        }
        let original = image.read_tag(DateTag::Original);
        let digitized = image.read_tag(DateTag::Digitized);
        let (date, time_source) = resolve(
            self.date,
            original.as_deref(),
            digitized.as_deref(),
            || modified_time(path),
        );
        tracing::debug!("{}: time of day from {:?}", path.display(), time_source);

        if !date.is_valid() {
            return FileOutcome::InvalidDate { date };
        }
        if let Some(format) = image.unsupported_format() {
            return FileOutcome::Unsupported { format };
        }

        let text = date.format_date();
        image.write_tag(DateTag::Original, &text);
        image.write_tag(DateTag::Digitized, &text);

        match self.save(path, &image) {
            Ok(dest) => FileOutcome::Corrected {
                dest,
                date,
                time_source,
            },
            Err(e) => FileOutcome::Failed {
                reason: format!("{e:#}"),
            },
        }
    }

    fn save(&self, path: &Path, image: &P::Image) -> anyhow::Result<PathBuf> {
        let parent = path.parent().unwrap_or(Path::new("."));
        let out_dir = parent.join(self.corrected_folder);
        if !out_dir.is_dir() {
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Creating {}", out_dir.display()))?;
        }
        let name = path
            .file_name()
            .with_context(|| format!("No file name in {}", path.display()))?;
        let dest = out_dir.join(name);
        image.save_as(&dest)?;
        Ok(dest)
    }
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

fn is_corrected_dir(name: &str, corrected_folder: &str) -> bool {
    name.trim_end_matches(['/', '\\']) == corrected_folder
}

/// Entries of `dir` accepted by `filter`, sorted by name.
fn list_entries(dir: &Path, filter: &EntryFilter) -> std::io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !filter.matches(&name) {
            continue;
        }
        entries.push(Entry {
            is_dir: entry.file_type()?.is_dir(),
            path: entry.path(),
            name,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Local time of day of the file's last modification.
pub fn modified_time(path: &Path) -> Option<TimeOfDay> {
    let meta = fs::metadata(path).ok()?;
    let mtime = FileTime::from_last_modification_time(&meta);
    let local = DateTime::from_timestamp(mtime.unix_seconds(), mtime.nanoseconds())?
        .with_timezone(&Local);
    Some(TimeOfDay::new(
        local.hour() as i32,
        local.minute() as i32,
        local.second() as i32,
    ))
}

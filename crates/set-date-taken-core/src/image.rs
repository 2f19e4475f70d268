use std::fs;
use std::io::Cursor;
use std::panic;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use exif::{In, Reader, Tag, Value};
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;

use crate::extension::{self, ImageCodec};

/// The two EXIF date tags the tool rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTag {
    /// DateTimeOriginal (0x9003), the "date taken"
    Original,
    /// DateTimeDigitized (0x9004)
    Digitized,
}

impl DateTag {
    fn exif_tag(self) -> Tag {
        match self {
            DateTag::Original => Tag::DateTimeOriginal,
            DateTag::Digitized => Tag::DateTimeDigitized,
        }
    }

    fn little_exif_tag(self, value: String) -> ExifTag {
        match self {
            DateTag::Original => ExifTag::DateTimeOriginal(value),
            DateTag::Digitized => ExifTag::CreateDate(value),
        }
    }
}

/// Opens images for the walker, which only needs to read a tag, replace it
/// and save the result elsewhere.
pub trait ImageProvider {
    type Image: TaggedImage;

    fn open(&self, path: &Path) -> anyhow::Result<Self::Image>;
}

pub trait TaggedImage {
    fn read_tag(&self, tag: DateTag) -> Option<String>;

    /// Replace (or create) a tag. Nothing is written until [`save_as`].
    ///
    /// [`save_as`]: TaggedImage::save_as
    fn write_tag(&mut self, tag: DateTag, value: &str);

    /// Write the image with its current tags to `dest`. On error no file is
    /// left at `dest`.
    fn save_as(&self, dest: &Path) -> anyhow::Result<()>;

    fn has_tag(&self, tag: DateTag) -> bool {
        self.read_tag(tag).is_some()
    }

    /// Name of the format when it has no place for date tags at all.
    fn unsupported_format(&self) -> Option<String> {
        None
    }
}

/// Reads and writes EXIF date tags of JPEG, PNG and TIFF files.
///
/// Tags are read with `kamadak-exif`, falling back to `little_exif` for
/// containers where only the latter finds them (it stores PNG EXIF in a text
/// chunk), and written with `little_exif`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifProvider;

impl ImageProvider for ExifProvider {
    type Image = ExifImage;

    fn open(&self, path: &Path) -> anyhow::Result<ExifImage> {
        ExifImage::open(path)
    }
}

pub struct ExifImage {
    source: PathBuf,
    bytes: Vec<u8>,
    codec: Option<ImageCodec>,
    original: Option<String>,
    digitized: Option<String>,
    pending: Vec<(DateTag, String)>,
}

impl ExifImage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Reading {}", path.display()))?;

        let (original, digitized) =
            match Reader::new().read_from_container(&mut Cursor::new(&bytes)) {
                Ok(exif) => {
                    let read = |tag: DateTag| {
                        exif.get_field(tag.exif_tag(), In::PRIMARY)
                            .and_then(|field| ascii_value(&field.value))
                    };
                    (read(DateTag::Original), read(DateTag::Digitized))
                }
                Err(e) => {
                    tracing::debug!("No EXIF data in {}: {}", path.display(), e);
                    (None, None)
                }
            };

        let codec = extension::codec_for(path);
        let (original, digitized) = match (original, digitized) {
            (None, None) if codec.is_some_and(ImageCodec::carries_exif) => {
                read_with_little_exif(path)
            }
            tags => tags,
        };

        Ok(Self {
            source: path.to_path_buf(),
            codec,
            bytes,
            original,
            digitized,
            pending: Vec::new(),
        })
    }

    fn write_metadata(&self, dest: &Path) -> anyhow::Result<()> {
        match self.codec {
            Some(codec) if codec.carries_exif() => {}
            Some(codec) => bail!("{} images cannot carry EXIF date tags", codec.name()),
            None => bail!("Unknown image format: {}", self.source.display()),
        }

        fs::write(dest, &self.bytes).with_context(|| format!("Writing {}", dest.display()))?;

        if self.pending.is_empty() {
            return Ok(());
        }

        let mut metadata = match Metadata::new_from_path(dest) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("Starting fresh EXIF block for {}: {}", dest.display(), e);
                Metadata::new()
            }
        };
        for (tag, value) in &self.pending {
            metadata.set_tag(tag.little_exif_tag(value.clone()));
        }
        metadata
            .write_to_file(dest)
            .with_context(|| format!("Writing EXIF metadata to {}", dest.display()))?;

        let written = ExifImage::open(dest)?;
        for (tag, value) in &self.pending {
            if written.read_tag(*tag).as_deref() != Some(value.as_str()) {
                bail!("{:?} date tag did not survive writing {}", tag, dest.display());
            }
        }
        Ok(())
    }
}

impl TaggedImage for ExifImage {
    fn read_tag(&self, tag: DateTag) -> Option<String> {
        if let Some((_, value)) = self.pending.iter().rev().find(|(t, _)| *t == tag) {
            return Some(value.clone());
        }
        match tag {
            DateTag::Original => self.original.clone(),
            DateTag::Digitized => self.digitized.clone(),
        }
    }

    fn write_tag(&mut self, tag: DateTag, value: &str) {
        self.pending.retain(|(t, _)| *t != tag);
        self.pending.push((tag, value.to_string()));
    }

    fn unsupported_format(&self) -> Option<String> {
        match self.codec {
            Some(codec) if codec.carries_exif() => None,
            Some(codec) => Some(codec.name().to_string()),
            None => Some(extension::extension_of(&self.source)),
        }
    }

    fn save_as(&self, dest: &Path) -> anyhow::Result<()> {
        if dest == self.source {
            bail!("Refusing to overwrite source image {}", dest.display());
        }
        let result = self.write_metadata(dest);
        if result.is_err() && dest.exists() {
            fs::remove_file(dest).ok();
        }
        result
    }
}

/// Date tags as little_exif sees them; it panics on some malformed files.
fn read_with_little_exif(path: &Path) -> (Option<String>, Option<String>) {
    let metadata = match panic::catch_unwind(panic::AssertUnwindSafe(|| {
        Metadata::new_from_path(path)
    })) {
        Ok(Ok(m)) => m,
        _ => return (None, None),
    };
    let original = metadata
        .get_tag(&ExifTag::DateTimeOriginal(String::new()))
        .find_map(|tag| match tag {
            ExifTag::DateTimeOriginal(s) => non_blank(s),
            _ => None,
        });
    let digitized = metadata
        .get_tag(&ExifTag::CreateDate(String::new()))
        .find_map(|tag| match tag {
            ExifTag::CreateDate(s) => non_blank(s),
            _ => None,
        });
    (original, digitized)
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim_end_matches('\0');
    (!s.trim().is_empty()).then(|| s.to_string())
}

/// First string of an ASCII field, as stored (no reformatting).
fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(strings) => strings
            .first()
            .and_then(|s| non_blank(&String::from_utf8_lossy(s))),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Minimal valid JPEG with no EXIF data (SOI + APP0 JFIF + EOI).
    pub(crate) fn minimal_jpeg() -> Vec<u8> {
        vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, // APP0 marker
            0x00, 0x10, // Length: 16
            0x4A, 0x46, 0x49, 0x46, 0x00, // "JFIF\0"
            0x01, 0x01, // Version 1.1
            0x00, // Aspect ratio units: none
            0x00, 0x01, // X density: 1
            0x00, 0x01, // Y density: 1
            0x00, 0x00, // No thumbnail
            0xFF, 0xD9, // EOI
        ]
    }

    /// Valid 1x1 RGBA PNG without any metadata chunk.
    fn minimal_png() -> Vec<u8> {
        vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
            0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
            0x1F, 0x15, 0xC4, 0x89,
            0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, // IDAT
            0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01,
            0x0D, 0x0A, 0x2D, 0xB4,
            0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, // IEND
            0xAE, 0x42, 0x60, 0x82,
        ]
    }

    /// Write a JPEG carrying the given DateTimeOriginal.
    pub(crate) fn jpeg_with_original(path: &Path, original: &str) {
        fs::write(path, minimal_jpeg()).unwrap();
        let mut metadata = Metadata::new();
        metadata.set_tag(ExifTag::DateTimeOriginal(original.to_string()));
        metadata.write_to_file(path).unwrap();
    }

    #[test]
    fn test_read_original_raw_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        jpeg_with_original(&path, "2019:05:04 09:15:00");

        let image = ExifProvider.open(&path).unwrap();
        assert_eq!(
            image.read_tag(DateTag::Original).as_deref(),
            Some("2019:05:04 09:15:00")
        );
        assert!(!image.has_tag(DateTag::Digitized));
    }

    #[test]
    fn test_no_exif() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        fs::write(&path, minimal_jpeg()).unwrap();

        let image = ExifProvider.open(&path).unwrap();
        assert_eq!(image.read_tag(DateTag::Original), None);
        assert_eq!(image.read_tag(DateTag::Digitized), None);
    }

    #[test]
    fn test_save_as_writes_both_tags() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.jpg");
        let dest = dir.path().join("b.jpg");
        jpeg_with_original(&src, "2019:05:04 09:15:00");
        let before = fs::read(&src).unwrap();

        let mut image = ExifProvider.open(&src).unwrap();
        image.write_tag(DateTag::Original, "2023:01:10 09:15:00");
        image.write_tag(DateTag::Digitized, "2023:01:10 09:15:00");
        assert_eq!(
            image.read_tag(DateTag::Original).as_deref(),
            Some("2023:01:10 09:15:00")
        );
        image.save_as(&dest).unwrap();

        let saved = ExifProvider.open(&dest).unwrap();
        assert_eq!(
            saved.read_tag(DateTag::Original).as_deref(),
            Some("2023:01:10 09:15:00")
        );
        assert_eq!(
            saved.read_tag(DateTag::Digitized).as_deref(),
            Some("2023:01:10 09:15:00")
        );
        assert_eq!(fs::read(&src).unwrap(), before);
    }

    #[test]
    fn test_png_tags_read_back() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.png");
        let dest = dir.path().join("b.png");
        fs::write(&src, minimal_png()).unwrap();

        let mut image = ExifProvider.open(&src).unwrap();
        assert_eq!(image.unsupported_format(), None);
        image.write_tag(DateTag::Original, "2023:01:10 09:15:00");
        image.write_tag(DateTag::Digitized, "2023:01:10 09:15:00");

        // a successful save must be readable by the same provider
        match image.save_as(&dest) {
            Ok(()) => {
                let saved = ExifProvider.open(&dest).unwrap();
                assert_eq!(
                    saved.read_tag(DateTag::Original).as_deref(),
                    Some("2023:01:10 09:15:00")
                );
                assert_eq!(
                    saved.read_tag(DateTag::Digitized).as_deref(),
                    Some("2023:01:10 09:15:00")
                );
            }
            Err(_) => assert!(!dest.exists()),
        }
        assert_eq!(fs::read(&src).unwrap(), minimal_png());
    }

    #[test]
    fn test_gif_cannot_be_saved() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("anim.gif");
        let dest = dir.path().join("out.gif");
        fs::write(&src, b"GIF89a").unwrap();

        let mut image = ExifProvider.open(&src).unwrap();
        assert_eq!(image.unsupported_format().as_deref(), Some("GIF"));
        image.write_tag(DateTag::Original, "2023:01:10 09:15:00");
        assert!(image.save_as(&dest).is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn test_never_overwrites_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.jpg");
        fs::write(&src, minimal_jpeg()).unwrap();

        let image = ExifProvider.open(&src).unwrap();
        assert!(image.save_as(&src).is_err());
        assert!(src.exists());
    }
}

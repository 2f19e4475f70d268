use std::path::Path;

/// Extensions (lowercase, with dot) whose files are stamped.
pub const ALLOWED_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tif", ".tiff"];

/// Known image extensions and their MIME types
const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    (".bmp", "image/bmp"),
    (".dib", "image/bmp"),
    (".rle", "image/bmp"),
    (".gif", "image/gif"),
    (".jpeg", "image/jpeg"),
    (".jpg", "image/jpeg"),
    (".jpe", "image/jpeg"),
    (".jfif", "image/jpeg"),
    (".png", "image/png"),
    (".tiff", "image/tiff"),
    (".tif", "image/tiff"),
];

/// Image encoders a corrected file can be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCodec {
    Bmp,
    Gif,
    Jpeg,
    Png,
    Tiff,
}

impl ImageCodec {
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/bmp" => Some(Self::Bmp),
            "image/gif" => Some(Self::Gif),
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bmp => "BMP",
            Self::Gif => "GIF",
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Tiff => "TIFF",
        }
    }

    /// Whether the container has a place for EXIF date tags.
    pub fn carries_exif(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Tiff)
    }
}

/// Lowercase extension of a path including the leading dot, or "" if none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

pub fn is_allowed(path: &Path) -> bool {
    let ext = extension_of(path);
    ALLOWED_EXTENSIONS.contains(&ext.as_str())
}

pub fn mime_type(extension: &str) -> Option<&'static str> {
    let ext = extension.to_lowercase();
    EXTENSION_MIME_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Codec for a file, looked up through its extension's MIME type.
pub fn codec_for(path: &Path) -> Option<ImageCodec> {
    mime_type(&extension_of(path)).and_then(ImageCodec::from_mime_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_case_insensitive() {
        assert!(is_allowed(Path::new("a/IMG_0001.JPG")));
        assert!(is_allowed(Path::new("scan.Tiff")));
        assert!(is_allowed(Path::new("x.bmp")));
        assert!(!is_allowed(Path::new("notes.txt")));
        assert!(!is_allowed(Path::new("photo.jfif")));
        assert!(!is_allowed(Path::new("README")));
    }

    #[test]
    fn test_codec_lookup() {
        assert_eq!(mime_type(".JPE"), Some("image/jpeg"));
        assert_eq!(codec_for(Path::new("a.jpeg")), Some(ImageCodec::Jpeg));
        assert_eq!(codec_for(Path::new("a.rle")), Some(ImageCodec::Bmp));
        assert_eq!(codec_for(Path::new("a.tif")), Some(ImageCodec::Tiff));
        assert_eq!(codec_for(Path::new("a.webp")), None);
        assert!(ImageCodec::Png.carries_exif());
        assert!(!ImageCodec::Gif.carries_exif());
        assert_eq!(codec_for(Path::new("scan.BMP")).map(ImageCodec::name), Some("BMP"));
    }
}

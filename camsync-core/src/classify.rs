//! Media type classification.
//!
//! Video files are recognized by guessing a MIME type from the file extension
//! and accepting every `video/*` type. No file contents are read.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("mp4", "video/mp4"),
        ("m4v", "video/x-m4v"),
        ("mov", "video/quicktime"),
        ("qt", "video/quicktime"),
        ("avi", "video/x-msvideo"),
        ("mkv", "video/x-matroska"),
        ("webm", "video/webm"),
        ("mpeg", "video/mpeg"),
        ("mpg", "video/mpeg"),
        ("mpe", "video/mpeg"),
        ("m1v", "video/mpeg"),
        ("mpa", "video/mpeg"),
        ("ts", "video/mp2t"),
        ("wmv", "video/x-ms-wmv"),
        ("flv", "video/x-flv"),
        ("3gp", "video/3gpp"),
        ("ogv", "video/ogg"),
        ("movie", "video/x-sgi-movie"),
        ("json", "application/json"),
        ("toml", "application/toml"),
        ("txt", "text/plain"),
        ("csv", "text/csv"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("wav", "audio/x-wav"),
        ("mp3", "audio/mpeg"),
    ])
});

/// Guesses a MIME type from the file extension (case-insensitive).
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MIME_TYPES.get(ext.as_str()).copied()
}

/// True when the path's guessed MIME type is a video type.
pub fn is_video_file(path: &Path) -> bool {
    guess_mime_type(path).is_some_and(|mime| mime.starts_with("video/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extensions() {
        assert!(is_video_file(Path::new("cam1.mp4")));
        assert!(is_video_file(Path::new("/x/cam1.MOV")));
        assert!(is_video_file(Path::new("clip.avi")));
    }

    #[test]
    fn test_non_video_files() {
        assert!(!is_video_file(Path::new("Calib_board.toml")));
        assert!(!is_video_file(Path::new("board.png")));
        assert!(!is_video_file(Path::new("audio.wav")));
        assert!(!is_video_file(Path::new("noext")));
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("a.mkv")), Some("video/x-matroska"));
        assert_eq!(guess_mime_type(Path::new("a.unknown")), None);
    }
}

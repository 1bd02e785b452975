//! Source directory scanning and the names derived from source files.

use mediakeep_core::constants::{
    FRAME_FILE_SUFFIX, PROVISION_KEY_PREFIX, PROVISION_LAST_NAME, PROVISION_USERNAME_SUFFIX,
};
use mediakeep_core::AppError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    /// File name without the extension.
    pub stem: String,
    /// Lowercased, without the dot.
    pub extension: String,
}

impl SourceFile {
    fn from_path(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let stem = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            path,
            file_name,
            stem,
            extension,
        })
    }

    /// Path of the frame image a video needs next to it.
    pub fn frame_path(&self) -> PathBuf {
        self.path
            .with_file_name(format!("{}{}", self.stem, FRAME_FILE_SUFFIX))
    }

    pub fn frame_file_name(&self) -> String {
        format!("{}{}", self.stem, FRAME_FILE_SUFFIX)
    }
}

/// Regular files in `dir` whose extension is in `extensions`, sorted by name.
///
/// An unreadable directory is an error. Entries that cannot be inspected are skipped.
pub async fn scan_dir(dir: &Path, extensions: &[&str]) -> Result<Vec<SourceFile>, AppError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        AppError::InvalidInput(format!("cannot read directory {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        match entry.file_type().await {
            Ok(kind) if kind.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(error = %e, path = %entry.path().display(), "Skipping unreadable entry");
                continue;
            }
        }
        let Some(file) = SourceFile::from_path(entry.path()) else {
            continue;
        };
        if extensions.contains(&file.extension.as_str()) {
            files.push(file);
        }
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        return !(c.is_ascii_alphanumeric() || c == '_');
    }
    if c.is_alphanumeric() {
        return false;
    }
    c.is_whitespace()
}

/// Capitalize the first letter of every word. Letters, digits and `_` continue a
/// word; any other ASCII character starts a new one. The rest is left as is.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev = ' ';
    for c in s.chars() {
        if is_word_separator(prev) {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev = c;
    }
    out
}

/// Names of the user provisioned from an avatar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

impl UserIdentity {
    pub fn derive(file: &SourceFile, email_domain: &str) -> Self {
        let first_name = title_case(&file.stem);
        let username = format!("{}{}", first_name.to_lowercase(), PROVISION_USERNAME_SUFFIX);
        let email = format!("{}@{}", username, email_domain);
        Self {
            first_name,
            last_name: PROVISION_LAST_NAME.to_string(),
            username,
            email,
        }
    }
}

/// Natural key stored on a provisioned video.
pub fn provision_key(file: &SourceFile) -> String {
    format!("{}{}", PROVISION_KEY_PREFIX, file.file_name)
}

/// Upload content type for a source file; `fallback` for anything unrecognised.
pub fn content_type_for(extension: &str, fallback: &'static str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediakeep_core::constants::{AVATAR_EXTENSIONS, VIDEO_EXTENSIONS};

    fn source(name: &str) -> SourceFile {
        SourceFile::from_path(PathBuf::from("/data").join(name)).unwrap()
    }

    #[test]
    fn title_case_splits_on_punctuation_only() {
        assert_eq!(title_case("alice"), "Alice");
        assert_eq!(title_case("mary-jane smith"), "Mary-Jane Smith");
        assert_eq!(title_case("snake_case"), "Snake_case");
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case("2fast"), "2fast");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn derives_provisioned_identity() {
        let identity = UserIdentity::derive(&source("alice.png"), "seeder.com");
        assert_eq!(identity.first_name, "Alice");
        assert_eq!(identity.last_name, "Seeder");
        assert_eq!(identity.username, "alice_seeder");
        assert_eq!(identity.email, "alice_seeder@seeder.com");
    }

    #[test]
    fn extension_is_lowercased() {
        let file = source("Clip.MP4");
        assert_eq!(file.extension, "mp4");
        assert_eq!(file.stem, "Clip");
        assert_eq!(file.frame_file_name(), "Clip_thumbnail.jpg");
        assert_eq!(file.frame_path(), PathBuf::from("/data/Clip_thumbnail.jpg"));
        assert_eq!(provision_key(&file), "seed:Clip.MP4");
    }

    #[test]
    fn content_types_fall_back() {
        assert_eq!(content_type_for("png", "image/jpeg"), "image/png");
        assert_eq!(content_type_for("webm", "video/mp4"), "video/mp4");
    }

    #[tokio::test]
    async fn scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.mp4", "noext"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.png")).unwrap();

        let avatars = scan_dir(dir.path(), AVATAR_EXTENSIONS).await.unwrap();
        let names: Vec<_> = avatars.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);

        let videos = scan_dir(dir.path(), VIDEO_EXTENSIONS).await.unwrap();
        assert_eq!(videos.len(), 1);
    }

    #[tokio::test]
    async fn scan_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = scan_dir(&dir.path().join("missing"), AVATAR_EXTENSIONS).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}

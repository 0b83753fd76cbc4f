use crate::config::ConfigurationError;
use crate::constants::VIDEO_EXTENSIONS;
use std::path::Path;

#[derive(Clone)]
pub struct ValidationService;

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    pub fn has_video_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// A source must be an existing file with an allowed container extension.
    pub fn validate_source(&self, path: &Path) -> Result<(), ConfigurationError> {
        if !self.has_video_extension(path) {
            return Err(ConfigurationError::UnsupportedSource {
                path: path.display().to_string(),
            });
        }

        if !path.is_file() {
            return Err(ConfigurationError::InvalidSource {
                path: path.display().to_string(),
            });
        }

        Ok(())
    }

    /// Checks a compression request before anything is built or spawned.
    pub fn validate_request<'a>(
        &self,
        source: Option<&'a Path>,
        output_folder: Option<&Path>,
    ) -> Result<&'a Path, ConfigurationError> {
        let source = source.ok_or(ConfigurationError::NoSourceSelected)?;
        output_folder.ok_or(ConfigurationError::MissingOutputFolder)?;
        Ok(source)
    }
}

impl Default for ValidationService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extension_allow_list() {
        let validation = ValidationService::new();
        assert!(validation.has_video_extension(Path::new("/a/clip.mp4")));
        assert!(validation.has_video_extension(Path::new("/a/clip.MOV")));
        assert!(validation.has_video_extension(Path::new("/a/clip.mkv")));
        assert!(validation.has_video_extension(Path::new("/a/clip.avi")));
        assert!(!validation.has_video_extension(Path::new("/a/clip.webm")));
        assert!(!validation.has_video_extension(Path::new("/a/notes.txt")));
        assert!(!validation.has_video_extension(Path::new("/a/no_extension")));
    }

    #[test]
    fn test_validate_source() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("clip.mkv");
        std::fs::write(&video, b"not really a video").unwrap();
        let text = dir.path().join("clip.txt");
        std::fs::write(&text, b"text").unwrap();

        let validation = ValidationService::new();
        assert!(validation.validate_source(&video).is_ok());
        assert!(matches!(
            validation.validate_source(&text),
            Err(ConfigurationError::UnsupportedSource { .. })
        ));
        assert!(matches!(
            validation.validate_source(&dir.path().join("missing.mp4")),
            Err(ConfigurationError::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_validate_request() {
        let validation = ValidationService::new();
        let source = Path::new("/videos/clip.mp4");
        let folder = Path::new("/videos/out");

        assert_eq!(
            validation.validate_request(None, Some(folder)),
            Err(ConfigurationError::NoSourceSelected)
        );
        assert_eq!(
            validation.validate_request(Some(source), None),
            Err(ConfigurationError::MissingOutputFolder)
        );
        assert_eq!(validation.validate_request(Some(source), Some(folder)), Ok(source));
    }
}

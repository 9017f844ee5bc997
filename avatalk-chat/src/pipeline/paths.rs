//! Well-known artifact locations under the service root

use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Fixed handoff paths between stages
///
/// Intermediate files stay at stable locations so they can be inspected or
/// fed back into a stage by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    root: PathBuf,
    default_reference: PathBuf,
}

impl PipelinePaths {
    pub const INPUT_AUDIO: &'static str = "static/audios/input.wav";
    pub const TRANSCRIPT: &'static str = "static/text/input.txt";
    pub const REPLY: &'static str = "static/text/output.txt";
    pub const CLONED_AUDIO: &'static str = "static/audios/tts_output.wav";
    pub const VIDEO_DIR: &'static str = "static/videos";
    pub const SENTINEL_VIDEO: &'static str = "static/videos/chat_response.mp4";
    pub const DEFAULT_REFERENCE: &'static str =
        "voice_clone/CosyVoice-main/asset/zero_shot_prompt.wav";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_reference: PathBuf::from(Self::DEFAULT_REFERENCE),
        }
    }

    /// Override the default reference voice (relative paths join the root)
    pub fn with_default_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_reference = path.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative path onto the root; absolute paths pass through
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn input_audio(&self) -> PathBuf {
        self.resolve(Self::INPUT_AUDIO)
    }

    pub fn transcript(&self) -> PathBuf {
        self.resolve(Self::TRANSCRIPT)
    }

    pub fn reply(&self) -> PathBuf {
        self.resolve(Self::REPLY)
    }

    pub fn cloned_audio(&self) -> PathBuf {
        self.resolve(Self::CLONED_AUDIO)
    }

    /// Degraded outcome; always returned instead of an error
    pub fn sentinel_video(&self) -> PathBuf {
        self.resolve(Self::SENTINEL_VIDEO)
    }

    pub fn default_reference(&self) -> PathBuf {
        self.resolve(&self.default_reference)
    }

    /// Fresh, run-specific output video path
    pub fn fresh_video(&self) -> PathBuf {
        self.resolve(Self::VIDEO_DIR)
            .join(format!("chat_{}.mp4", Uuid::new_v4().simple()))
    }

    /// Requested reference voice if it exists, else the default reference
    ///
    /// The request may only name a file below the root: absolute paths and
    /// `..` components are refused.
    pub fn reference_voice(&self, requested: Option<&str>) -> PathBuf {
        match requested.map(str::trim).filter(|r| !r.is_empty()) {
            Some(requested) if !is_confined(Path::new(requested)) => {
                tracing::warn!(
                    requested,
                    "Reference voice outside the root refused, using default reference"
                );
                self.default_reference()
            }
            Some(requested) => {
                let path = self.resolve(requested);
                if path.is_file() {
                    path
                } else {
                    tracing::warn!(
                        path = %path.display(),
                        "Reference voice not found, using default reference"
                    );
                    self.default_reference()
                }
            }
            None => self.default_reference(),
        }
    }
}

fn is_confined(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_paths_under_root() {
        let paths = PipelinePaths::new("/srv/avatalk");
        assert_eq!(paths.input_audio(), PathBuf::from("/srv/avatalk/static/audios/input.wav"));
        assert_eq!(
            paths.sentinel_video(),
            PathBuf::from("/srv/avatalk/static/videos/chat_response.mp4")
        );
    }

    #[test]
    fn test_fresh_video_is_unique_and_not_sentinel() {
        let paths = PipelinePaths::new("/srv/avatalk");
        let a = paths.fresh_video();
        let b = paths.fresh_video();

        assert_ne!(a, b);
        assert_ne!(a, paths.sentinel_video());
        assert!(a.starts_with("/srv/avatalk/static/videos"));
    }

    #[test]
    fn test_reference_voice_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::new(dir.path());

        assert_eq!(paths.reference_voice(None), paths.default_reference());
        assert_eq!(paths.reference_voice(Some("missing.wav")), paths.default_reference());

        std::fs::write(dir.path().join("mine.wav"), b"RIFF").unwrap();
        assert_eq!(paths.reference_voice(Some("mine.wav")), dir.path().join("mine.wav"));
    }

    #[test]
    fn test_reference_voice_outside_root_refused() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(root.join("voices")).unwrap();
        std::fs::write(dir.path().join("secret.wav"), b"RIFF").unwrap();
        let outside = dir.path().join("secret.wav");
        let paths = PipelinePaths::new(&root);

        assert_eq!(
            paths.reference_voice(Some(outside.to_str().unwrap())),
            paths.default_reference()
        );
        assert_eq!(paths.reference_voice(Some("../secret.wav")), paths.default_reference());
        assert_eq!(
            paths.reference_voice(Some("voices/../../secret.wav")),
            paths.default_reference()
        );
        assert_eq!(paths.reference_voice(Some("/etc/passwd")), paths.default_reference());

        std::fs::write(root.join("voices/mine.wav"), b"RIFF").unwrap();
        assert_eq!(
            paths.reference_voice(Some("./voices/mine.wav")),
            root.join("./voices/mine.wav")
        );
    }
}

//! TalkingGaussian talking-head renderer via its synthesis script
//!
//! Invocation:
//! `python <script> -S <dataset> -M <checkpoint> --use_train --audio <wav>
//!  --audio_extractor <extractor> --output <video>`
//! run inside the script's directory. `GPU<n>` device choices are exported as
//! `CUDA_VISIBLE_DEVICES=<n>`.

use super::{EngineError, RenderJob, VideoRenderer};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct TalkingGaussianConfig {
    /// Service root; relative paths below resolve against it
    pub root: PathBuf,
    pub python: String,
    /// Synthesis script, e.g. `TalkingGaussian/synthesize_fuse.py`
    pub script: PathBuf,
}

pub struct TalkingGaussianRenderer {
    config: TalkingGaussianConfig,
}

impl TalkingGaussianRenderer {
    pub fn new(config: TalkingGaussianConfig) -> Self {
        Self { config }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.root.join(path)
        }
    }

    fn build_args(&self, script: &Path, job: &RenderJob, audio: &Path, output: &Path) -> Vec<String> {
        vec![
            script.display().to_string(),
            "-S".to_string(),
            self.resolve(Path::new(&job.dataset_path)).display().to_string(),
            "-M".to_string(),
            self.resolve(Path::new(&job.checkpoint)).display().to_string(),
            "--use_train".to_string(),
            "--audio".to_string(),
            audio.display().to_string(),
            "--audio_extractor".to_string(),
            job.feature_extractor.clone(),
            "--output".to_string(),
            output.display().to_string(),
        ]
    }
}

/// `GPU1` → `1`; anything else (e.g. `CPU`) selects no GPU
pub fn cuda_device(choice: &str) -> Option<String> {
    let index = choice.trim().strip_prefix("GPU")?;
    index.parse::<u32>().ok().map(|n| n.to_string())
}

#[async_trait]
impl VideoRenderer for TalkingGaussianRenderer {
    async fn render(&self, job: &RenderJob) -> Result<PathBuf, EngineError> {
        let script = self.resolve(&self.config.script);
        if !script.exists() {
            return Err(EngineError::MissingInput(format!(
                "{} script {}",
                job.model_name,
                script.display()
            )));
        }

        let audio = self.resolve(&job.reference_audio);
        if !audio.exists() {
            return Err(EngineError::MissingInput(format!("driving audio {}", audio.display())));
        }

        let output = self.resolve(&job.output_path);
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let cwd = script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.root.clone());
        let args = self.build_args(&script, job, &audio, &output);
        let device = cuda_device(&job.device);

        tracing::debug!(
            model = %job.model_name,
            args = ?args,
            cuda_visible_devices = ?device,
            "Running video render"
        );

        let result = tokio::task::spawn_blocking({
            let python = self.config.python.clone();
            move || {
                let mut command = Command::new(python);
                command
                    .args(&args)
                    .current_dir(cwd)
                    .env("CUDA_VISIBLE_DEVICES", device.unwrap_or_default());
                command.output()
            }
        })
        .await
        .map_err(|e| EngineError::Process(format!("Task join error: {}", e)))?
        .map_err(|e| EngineError::Process(e.to_string()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(EngineError::Process(format!(
                "Exit code: {:?}, stderr: {}",
                result.status.code(),
                stderr.trim()
            )));
        }

        if !output.exists() {
            return Err(EngineError::NoOutput(output.display().to_string()));
        }

        tracing::info!(video = %output.display(), "Video render completed");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> RenderJob {
        RenderJob {
            model_name: "TalkingGaussian".to_string(),
            checkpoint: "output/talking_May".to_string(),
            reference_audio: PathBuf::from("static/audios/tts_output.wav"),
            dataset_path: "data/May".to_string(),
            device: "GPU0".to_string(),
            feature_extractor: "deepspeech".to_string(),
            output_path: PathBuf::from("static/videos/chat_1.mp4"),
        }
    }

    #[test]
    fn test_cuda_device_mapping() {
        assert_eq!(cuda_device("GPU0"), Some("0".to_string()));
        assert_eq!(cuda_device("GPU3"), Some("3".to_string()));
        assert_eq!(cuda_device("CPU"), None);
        assert_eq!(cuda_device("GPUx"), None);
    }

    #[test]
    fn test_args_resolve_against_root() {
        let renderer = TalkingGaussianRenderer::new(TalkingGaussianConfig {
            root: PathBuf::from("/srv/avatalk"),
            python: "python".to_string(),
            script: PathBuf::from("TalkingGaussian/synthesize_fuse.py"),
        });
        let args = renderer.build_args(
            Path::new("/srv/avatalk/TalkingGaussian/synthesize_fuse.py"),
            &job(),
            Path::new("/srv/avatalk/static/audios/tts_output.wav"),
            Path::new("/srv/avatalk/static/videos/chat_1.mp4"),
        );

        assert_eq!(args[2], "/srv/avatalk/data/May");
        assert_eq!(args[4], "/srv/avatalk/output/talking_May");
        assert!(args.contains(&"--use_train".to_string()));
        assert_eq!(args.last().unwrap(), "/srv/avatalk/static/videos/chat_1.mp4");
    }

    #[tokio::test]
    async fn test_missing_script_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TalkingGaussianRenderer::new(TalkingGaussianConfig {
            root: dir.path().to_path_buf(),
            python: "python".to_string(),
            script: PathBuf::from("TalkingGaussian/synthesize_fuse.py"),
        });

        let err = renderer.render(&job()).await.unwrap_err();
        assert!(matches!(err, EngineError::MissingInput(_)));
    }
}

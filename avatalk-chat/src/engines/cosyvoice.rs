//! CosyVoice zero-shot voice cloning via its Python test script
//!
//! The script writes `<output_file>` (possibly with an index suffix) into a
//! `test_result/` directory beside itself. After a successful run the newest
//! matching WAV there is copied to the job's output path.
//!
//! Recovering the artifact by scanning a shared directory assumes a single
//! clone in flight per output name.

use super::{CloneJob, EngineError, VoiceCloner};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::SystemTime;

/// Characters of the reply reused as the prompt transcript
const PROMPT_TEXT_CHARS: usize = 50;

const RESULT_DIR: &str = "test_result";

/// CosyVoice installation layout
#[derive(Debug, Clone)]
pub struct CosyVoiceConfig {
    /// Service root; relative paths below resolve against it
    pub root: PathBuf,
    /// Python interpreter
    pub python: String,
    /// Pretrained model directory
    pub model_dir: PathBuf,
    /// Candidate script locations, first existing wins
    pub scripts: Vec<PathBuf>,
    /// Result directory used when the script directory has none
    pub fallback_result_dir: PathBuf,
}

pub struct CosyVoiceCloner {
    config: CosyVoiceConfig,
}

impl CosyVoiceCloner {
    pub fn new(config: CosyVoiceConfig) -> Self {
        Self { config }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.root.join(path)
        }
    }

    fn find_script(&self) -> Option<PathBuf> {
        self.config
            .scripts
            .iter()
            .map(|s| self.resolve(s))
            .find(|s| s.exists())
    }
}

/// `<base_name>*.wav` files in `dir` with their modification times
fn matching_wavs(dir: &Path, base_name: &str) -> std::io::Result<Vec<(PathBuf, SystemTime)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(base_name) || !name.ends_with(".wav") {
            continue;
        }
        found.push((entry.path(), entry.metadata()?.modified()?));
    }

    Ok(found)
}

/// Newest matching WAV in `dir` that was created or rewritten since `before`
fn newest_new_wav(
    dir: &Path,
    base_name: &str,
    before: &[(PathBuf, SystemTime)],
) -> std::io::Result<Option<PathBuf>> {
    let newest = matching_wavs(dir, base_name)?
        .into_iter()
        .filter(|candidate| !before.contains(candidate))
        .max_by_key(|(_, modified)| *modified);

    Ok(newest.map(|(path, _)| path))
}

/// Script outcome plus the WAV it produced, if any
struct ScriptRun {
    output: Output,
    result_dir: PathBuf,
    generated: Option<PathBuf>,
}

#[async_trait]
impl VoiceCloner for CosyVoiceCloner {
    async fn clone_voice(&self, job: &CloneJob) -> Result<Option<PathBuf>, EngineError> {
        let model_dir = self.resolve(&self.config.model_dir);
        if !model_dir.exists() {
            return Err(EngineError::MissingInput(format!(
                "CosyVoice model directory {}",
                model_dir.display()
            )));
        }

        let reference = self.resolve(&job.reference_audio);
        if !reference.exists() {
            return Err(EngineError::MissingInput(format!(
                "reference audio {}",
                reference.display()
            )));
        }

        let script = self.find_script().ok_or_else(|| {
            EngineError::MissingInput("CosyVoice script (test_cosyvoice.py)".to_string())
        })?;
        let script_dir = script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.root.clone());

        let output_path = self.resolve(&job.output_path);
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let output_name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| EngineError::MissingInput("output file name".to_string()))?;

        let prompt_text: String = job.text.chars().take(PROMPT_TEXT_CHARS).collect();
        let args = vec![
            script.display().to_string(),
            "--model_dir".to_string(),
            model_dir.display().to_string(),
            "--prompt_wav".to_string(),
            reference.display().to_string(),
            "--prompt_text".to_string(),
            prompt_text,
            "--tts_text".to_string(),
            job.text.clone(),
            "--language".to_string(),
            job.language.clone(),
            "--output_file".to_string(),
            output_name,
        ];

        tracing::debug!(
            python = %self.config.python,
            args = ?args,
            cwd = %script_dir.display(),
            "Running CosyVoice"
        );

        let base_name = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let beside_script = script_dir.join(RESULT_DIR);
        let fallback_dir = self.resolve(&self.config.fallback_result_dir);

        let run = tokio::task::spawn_blocking({
            let python = self.config.python.clone();
            let cwd = script_dir.clone();
            move || -> std::io::Result<ScriptRun> {
                let mut before = matching_wavs(&beside_script, &base_name)?;
                before.extend(matching_wavs(&fallback_dir, &base_name)?);

                let output = Command::new(python).args(&args).current_dir(cwd).output()?;
                if !output.status.success() {
                    return Ok(ScriptRun {
                        output,
                        result_dir: beside_script,
                        generated: None,
                    });
                }

                // The script creates its result directory on first use
                let result_dir = if beside_script.exists() {
                    beside_script
                } else {
                    fallback_dir
                };
                let generated = newest_new_wav(&result_dir, &base_name, &before)?;
                Ok(ScriptRun {
                    output,
                    result_dir,
                    generated,
                })
            }
        })
        .await
        .map_err(|e| EngineError::Process(format!("Task join error: {}", e)))?
        .map_err(|e| EngineError::Process(e.to_string()))?;

        if !run.output.status.success() {
            let stderr = String::from_utf8_lossy(&run.output.stderr);
            return Err(EngineError::Process(format!(
                "Exit code: {:?}, stderr: {}",
                run.output.status.code(),
                stderr.trim()
            )));
        }

        match run.generated {
            Some(generated) => {
                tokio::fs::copy(&generated, &output_path).await?;
                tracing::info!(
                    generated = %generated.display(),
                    output = %output_path.display(),
                    "Voice clone completed"
                );
                Ok(Some(output_path))
            }
            None => {
                tracing::warn!(
                    dir = %run.result_dir.display(),
                    "CosyVoice exited cleanly but wrote no new WAV"
                );
                Ok(None)
            }
        }
    }
}

//! In-process engine doubles that count their calls

use async_trait::async_trait;
use avatalk_chat::engines::{
    ChatBackend, ChatRequest, CloneJob, EngineError, RenderJob, SpeechRecognizer, VideoRenderer,
    VoiceCloner,
};
use avatalk_chat::providers::ProviderProfile;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    /// Engine raises
    Fail,
    /// Engine reports success without an artifact
    NoOutput,
}

pub struct MockRecognizer {
    pub text: String,
    pub behavior: Behavior,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            behavior: Behavior::Succeed,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn recognize(&self, _audio: &Path, _locale: &str) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(self.text.clone()),
            Behavior::Fail => Err(EngineError::Request("asr unreachable".to_string())),
            Behavior::NoOutput => Ok(String::new()),
        }
    }
}

pub struct MockChat {
    pub reply: String,
    pub behavior: Behavior,
    calls: AtomicUsize,
    /// Backend name of every profile the mock was called with
    seen: Mutex<Vec<String>>,
}

impl MockChat {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            behavior: Behavior::Succeed,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn backends_seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockChat {
    async fn complete(
        &self,
        profile: &ProviderProfile,
        _request: &ChatRequest,
    ) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(profile.name().to_string());
        match self.behavior {
            Behavior::Succeed => Ok(self.reply.clone()),
            Behavior::Fail => Err(EngineError::Status {
                status: 401,
                body: "invalid api key".to_string(),
            }),
            Behavior::NoOutput => Ok("   ".to_string()),
        }
    }
}

pub struct MockCloner {
    pub behavior: Behavior,
    calls: AtomicUsize,
    last_job: Mutex<Option<CloneJob>>,
}

impl MockCloner {
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Succeed,
            calls: AtomicUsize::new(0),
            last_job: Mutex::new(None),
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_job(&self) -> Option<CloneJob> {
        self.last_job.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoiceCloner for MockCloner {
    async fn clone_voice(&self, job: &CloneJob) -> Result<Option<PathBuf>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_job.lock().unwrap() = Some(job.clone());
        match self.behavior {
            Behavior::Succeed => {
                super::generate_test_wav(&job.output_path, 0.1)
                    .map_err(|e| EngineError::Process(e.to_string()))?;
                Ok(Some(job.output_path.clone()))
            }
            Behavior::Fail => Err(EngineError::Process("exit status 1".to_string())),
            Behavior::NoOutput => Ok(None),
        }
    }
}

pub struct MockRenderer {
    pub behavior: Behavior,
    calls: AtomicUsize,
    last_job: Mutex<Option<RenderJob>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Succeed,
            calls: AtomicUsize::new(0),
            last_job: Mutex::new(None),
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_job(&self) -> Option<RenderJob> {
        self.last_job.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoRenderer for MockRenderer {
    async fn render(&self, job: &RenderJob) -> Result<PathBuf, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_job.lock().unwrap() = Some(job.clone());
        match self.behavior {
            Behavior::Succeed => {
                if let Some(parent) = job.output_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&job.output_path, b"\x00\x00\x00\x18ftypmp42")?;
                Ok(job.output_path.clone())
            }
            Behavior::Fail => Err(EngineError::Process("CUDA out of memory".to_string())),
            Behavior::NoOutput => Ok(job.output_path.clone()),
        }
    }
}

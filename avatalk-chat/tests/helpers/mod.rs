//! Test Helper Utilities
//!
//! Shared utilities for testing avatalk-chat

#![allow(dead_code)]

pub mod audio_generator;
pub mod mock_engines;

pub use audio_generator::generate_test_wav;
pub use mock_engines::{Behavior, MockChat, MockCloner, MockRecognizer, MockRenderer};

use avatalk_chat::pipeline::{Engines, PipelineController, PipelinePaths};
use avatalk_chat::providers::{Backend, ConfigSource, ProviderProfile, ProviderRegistry};
use std::sync::Arc;
use tempfile::TempDir;

/// Registry where every backend has a real-looking key
pub fn ready_registry() -> ProviderRegistry {
    Backend::ALL.into_iter().fold(ProviderRegistry::builtin(), |registry, backend| {
        registry.with_profile(ProviderProfile {
            api_key: Some(format!("{}-test-secret-0001", backend)),
            ..ProviderProfile::builtin(backend)
        })
    })
}

/// Sandboxed service root plus counting engines
pub struct TestRig {
    pub root: TempDir,
    pub recognizer: Arc<MockRecognizer>,
    pub chat: Arc<MockChat>,
    pub cloner: Arc<MockCloner>,
    pub renderer: Arc<MockRenderer>,
    pub providers: Arc<dyn ConfigSource>,
}

impl TestRig {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            recognizer: Arc::new(MockRecognizer::new("你好")),
            chat: Arc::new(MockChat::new("你好，很高兴见到你！")),
            cloner: Arc::new(MockCloner::new()),
            renderer: Arc::new(MockRenderer::new()),
            providers: Arc::new(ready_registry()),
        }
    }

    pub fn with_recognizer(mut self, recognizer: MockRecognizer) -> Self {
        self.recognizer = Arc::new(recognizer);
        self
    }

    pub fn with_chat(mut self, chat: MockChat) -> Self {
        self.chat = Arc::new(chat);
        self
    }

    pub fn with_cloner(mut self, cloner: MockCloner) -> Self {
        self.cloner = Arc::new(cloner);
        self
    }

    pub fn with_renderer(mut self, renderer: MockRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn with_providers(mut self, providers: impl ConfigSource + 'static) -> Self {
        self.providers = Arc::new(providers);
        self
    }

    pub fn paths(&self) -> PipelinePaths {
        PipelinePaths::new(self.root.path())
    }

    /// Recorded input and default reference voice in place
    pub fn with_fixtures(self) -> Self {
        let paths = self.paths();
        generate_test_wav(&paths.input_audio(), 0.5).unwrap();
        generate_test_wav(&paths.default_reference(), 0.5).unwrap();
        self
    }

    pub fn engines(&self) -> Engines {
        Engines {
            recognizer: self.recognizer.clone(),
            providers: self.providers.clone(),
            chat: self.chat.clone(),
            cloner: self.cloner.clone(),
            renderer: self.renderer.clone(),
        }
    }

    pub fn controller(&self) -> PipelineController {
        PipelineController::new(self.paths(), self.engines())
    }

    pub fn total_engine_calls(&self) -> usize {
        self.recognizer.calls() + self.chat.calls() + self.cloner.calls() + self.renderer.calls()
    }
}

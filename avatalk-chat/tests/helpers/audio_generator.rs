//! WAV fixture generator

use std::path::{Path, PathBuf};

/// Write a short mono 16 kHz tone, creating parent directories
pub fn generate_test_wav(path: &Path, duration_seconds: f64) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (duration_seconds * spec.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / spec.sample_rate as f32;
        let sample = 0.3 * (2.0 * std::f32::consts::PI * 220.0 * t).sin() * i16::MAX as f32;
        writer.write_sample(sample as i16)?;
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

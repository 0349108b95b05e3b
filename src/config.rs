use std::path::PathBuf;

use clap::Parser;

use crate::preprocess::ChannelOrder;

/// Runtime configuration. Every flag can also come from the environment
/// (or a `.env` file loaded at startup).
#[derive(Debug, Clone, Parser)]
#[command(name = "tumor-classifier", about = "Brain tumor MRI classification service")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "CLASSIFIER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "CLASSIFIER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path to the ONNX model artifact
    #[arg(long, env = "CLASSIFIER_MODEL_PATH", default_value = "VecTorium.onnx")]
    pub model_path: PathBuf,

    /// Directory for staged uploads (defaults to the OS temp dir)
    #[arg(long, env = "CLASSIFIER_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Channel order of the tensor fed to the model
    #[arg(long, env = "CLASSIFIER_CHANNEL_ORDER", value_enum, default_value_t = ChannelOrder::Bgr)]
    pub channel_order: ChannelOrder,

    /// JPEG quality of the preview image
    #[arg(
        long,
        env = "CLASSIFIER_JPEG_QUALITY",
        default_value_t = 95,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub jpeg_quality: u8,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "CLASSIFIER_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Number of HTTP worker threads (actix default when unset)
    #[arg(long, env = "CLASSIFIER_WORKERS")]
    pub workers: Option<usize>,
}

/// Per-request pipeline settings shared with handlers.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub upload_dir: PathBuf,
    pub channel_order: ChannelOrder,
    pub jpeg_quality: u8,
    pub max_upload_bytes: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            upload_dir: std::env::temp_dir(),
            channel_order: ChannelOrder::default(),
            jpeg_quality: 95,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            upload_dir: self
                .upload_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            channel_order: self.channel_order,
            jpeg_quality: self.jpeg_quality,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

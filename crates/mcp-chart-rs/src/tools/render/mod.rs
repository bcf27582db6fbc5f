//! Chart Render Adapter.
//!
//! PNG output is rasterised with `plotters` into an in-memory RGB buffer and
//! encoded with `image`; HTML output is a Chart.js fragment. Every failure is
//! folded into [`RenderResult::Failure`].

mod color;
mod html;
mod raster;

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::tools::validate::ChartRequest;

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Html,
}

/// Where a rendered PNG ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PngOutput {
    Bytes(Vec<u8>),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    Png(PngOutput),
    Html(String),
    Failure(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0}")]
    Data(String),

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to serialize chart configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to save chart to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub struct ChartRenderer {
    output_dir: PathBuf,
}

impl ChartRenderer {
    /// `output_dir` receives PNG files when saving is requested; it is created on demand.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn render(
        &self,
        request: &ChartRequest,
        format: OutputFormat,
        save_to_file: bool,
    ) -> RenderResult {
        let result = match format {
            OutputFormat::Html => html::render_html(request).map(RenderResult::Html),
            OutputFormat::Png => self
                .render_png(request, save_to_file)
                .await
                .map(RenderResult::Png),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(kind = %request.kind, error = %e, "Chart rendering failed");
            RenderResult::Failure(e.to_string())
        })
    }

    async fn render_png(
        &self,
        request: &ChartRequest,
        save_to_file: bool,
    ) -> Result<PngOutput, RenderError> {
        let owned = request.clone();
        let bytes = tokio::task::spawn_blocking(move || raster::render_png(&owned)).await??;

        if !save_to_file {
            return Ok(PngOutput::Bytes(bytes));
        }
        let path = self.save(&bytes).await?;
        tracing::info!(path = %path.display(), "Saved chart");
        Ok(PngOutput::File(path))
    }

    async fn save(&self, bytes: &[u8]) -> Result<PathBuf, RenderError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| RenderError::Save {
                path: self.output_dir.clone(),
                source,
            })?;

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let suffix = Uuid::new_v4().simple().to_string();
        let path = self
            .output_dir
            .join(format!("chart-{stamp}-{}.png", &suffix[..8]));

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| RenderError::Save {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

//! Export background fill.

use screenverse_project_model::project::Background;
use screenverse_project_model::viewport::{cover_rect, Rect};

use crate::media::{Canvas, ImageLoader, LoadedImage, Rgba};

/// A background resolved once before the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedBackground {
    /// Transparent.
    Clear,
    Solid(Rgba),
    Image(LoadedImage),
}

impl PreparedBackground {
    /// Resolve `background`, loading its image if it has one.
    ///
    /// A failed image load is not an export failure: the background
    /// degrades to transparent and the export proceeds.
    pub async fn prepare(background: &Background, loader: &dyn ImageLoader) -> Self {
        match background {
            Background::None => Self::Clear,
            Background::Black => Self::Solid(Rgba::BLACK),
            Background::White => Self::Solid(Rgba::WHITE),
            Background::Preset { .. } | Background::Custom { .. } => {
                let Some(source) = background.image_source() else {
                    return Self::Clear;
                };
                match loader.load(&source).await {
                    Ok(image) if image.width > 0 && image.height > 0 => Self::Image(image),
                    Ok(image) => {
                        tracing::warn!(
                            source = %source,
                            width = image.width,
                            height = image.height,
                            "Background image is empty, exporting with transparent background"
                        );
                        Self::Clear
                    }
                    Err(err) => {
                        tracing::warn!(
                            source = %source,
                            error = %err,
                            "Background image failed to load, exporting with transparent background"
                        );
                        Self::Clear
                    }
                }
            }
        }
    }

    /// Paint the full canvas.
    pub fn paint(&self, canvas: &mut dyn Canvas) {
        match self {
            Self::Clear => canvas.clear(),
            Self::Solid(color) => canvas.fill(*color),
            Self::Image(image) => {
                let (w, h) = canvas.size();
                canvas.clear();
                let dst = cover_rect(
                    image.width as f64,
                    image.height as f64,
                    Rect::sized(w as f64, h as f64),
                );
                canvas.draw_image(image, dst);
            }
        }
    }
}

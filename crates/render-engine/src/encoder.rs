//! Encoder sink: streaming recorders and container selection.

use async_trait::async_trait;

use screenverse_common::error::{ScreenverseError, ScreenverseResult};

use crate::media::MediaStream;

/// Container every recorder host is required to support.
pub const FALLBACK_MIME_TYPE: &str = "video/webm";

/// Options passed when creating a recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderOptions {
    pub mime_type: String,
    pub video_bitrate_bps: u64,
}

/// A streaming encoder attached to a [`MediaStream`].
///
/// Encoded chunks accumulate while recording; [`Recorder::stop`] flushes the
/// container and hands back every chunk in order.
#[async_trait]
pub trait Recorder: Send {
    fn start(&mut self) -> ScreenverseResult<()>;

    fn pause(&mut self) -> ScreenverseResult<()>;

    fn resume(&mut self) -> ScreenverseResult<()>;

    fn mime_type(&self) -> &str;

    /// Stop recording and wait for the final chunk.
    async fn stop(&mut self) -> ScreenverseResult<Vec<Vec<u8>>>;
}

/// Creates recorders and answers codec support queries.
pub trait RecorderFactory: Send + Sync {
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// A host with no usable encoder for `stream` reports
    /// [`ScreenverseError::Unsupported`].
    fn create(
        &self,
        stream: &MediaStream,
        options: RecorderOptions,
    ) -> ScreenverseResult<Box<dyn Recorder>>;
}

/// First supported entry of `preferences`, else [`FALLBACK_MIME_TYPE`].
pub fn select_mime_type(factory: &dyn RecorderFactory, preferences: &[String]) -> String {
    preferences
        .iter()
        .find(|mime| factory.is_type_supported(mime))
        .cloned()
        .unwrap_or_else(|| {
            tracing::debug!(?preferences, "No preferred container supported, using fallback");
            FALLBACK_MIME_TYPE.to_string()
        })
}

/// A finished encoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedOutput {
    pub mime_type: String,
    pub data: Vec<u8>,
    pub chunk_count: usize,
}

impl EncodedOutput {
    /// Concatenate recorder chunks, ignoring empty ones.
    ///
    /// No data at all means the codec or stream never came up; that is an
    /// [`ScreenverseError::EmptyExport`].
    pub fn assemble(chunks: Vec<Vec<u8>>, mime_type: &str) -> ScreenverseResult<Self> {
        let chunks: Vec<Vec<u8>> = chunks.into_iter().filter(|c| !c.is_empty()).collect();
        if chunks.is_empty() {
            return Err(ScreenverseError::empty_export(format!(
                "recorder produced no {mime_type} data"
            )));
        }
        let chunk_count = chunks.len();
        Ok(Self {
            mime_type: mime_type.to_string(),
            data: chunks.concat(),
            chunk_count,
        })
    }
}

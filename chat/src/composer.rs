//! The composer is the pending-input state machine: the text the user is typing and at most
//! one staged image.
//!
//! # Attachments
//!
//! [`Composer::attach`] runs the attachment pipeline and updates the staged image. A rejected
//! attachment (wrong type or unreadable) clears whatever was staged before; text is never
//! touched by attachment handling.
//!
//! # Submission
//!
//! [`Composer::draft`] returns what would be sent, or `None` when the trimmed text is empty and
//! no image is staged. The session appends the user message and then calls [`Composer::reset`],
//! which clears text, staged image and the auto-sizing state in one step. A rejected submission
//! leaves the composer as it was.

use crate::attachment::AttachError;
use crate::attachment::FileSource;
use crate::attachment::PASTED_IMAGE_LABEL;
use crate::attachment::display_name;
use crate::attachment::encode_image;
use crate::clipboard_paste::ClipboardPayload;

/// Upper bound for the auto-sized input height, in text rows.
pub const MAX_INPUT_ROWS: u16 = 6;

/// An image that passed validation and has been encoded, waiting for the next submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub data_url: String,
    pub name: String,
}

/// Snapshot of the composer taken at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Draft {
    pub(crate) text: String,
    pub(crate) image_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct Composer {
    text: String,
    pending_image: Option<StagedImage>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the whole input buffer.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Append to the input buffer (typing or a plain-text paste).
    pub fn insert_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn pending_image(&self) -> Option<&StagedImage> {
        self.pending_image.as_ref()
    }

    /// True when a submit would be rejected.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.pending_image.is_none()
    }

    /// Auto-sized input height: one row per line, clamped to `1..=MAX_INPUT_ROWS`.
    pub fn desired_rows(&self) -> u16 {
        let lines = self.text.split('\n').count();
        u16::try_from(lines)
            .unwrap_or(u16::MAX)
            .clamp(1, MAX_INPUT_ROWS)
    }

    /// Drop the staged image, if any.
    pub fn remove_image(&mut self) {
        if let Some(image) = self.pending_image.take() {
            tracing::debug!("cleared staged image {}", image.name);
        }
    }

    /// Validate, encode and stage `file`.
    ///
    /// The display name falls back to `fallback_name`, then to a generic label. On error the
    /// previously staged image is cleared as well.
    pub async fn attach<F: FileSource>(
        &mut self,
        file: &F,
        fallback_name: Option<&str>,
    ) -> Result<(), AttachError> {
        match encode_image(file).await {
            Ok(data_url) => {
                let name = display_name(file, fallback_name);
                tracing::info!("attached image {name} ({} bytes encoded)", data_url.len());
                self.pending_image = Some(StagedImage { data_url, name });
                Ok(())
            }
            Err(err) => {
                tracing::info!("attachment rejected: {err}");
                self.remove_image();
                Err(err)
            }
        }
    }

    /// Handle a paste event. Returns `Ok(false)` when the payload holds no image, which is a
    /// no-op rather than an error.
    pub async fn attach_from_clipboard<F: FileSource>(
        &mut self,
        payload: ClipboardPayload<F>,
    ) -> Result<bool, AttachError> {
        let Some(file) = payload.into_image() else {
            return Ok(false);
        };
        self.attach(&file, Some(PASTED_IMAGE_LABEL)).await?;
        Ok(true)
    }

    /// Clear text, staged image and auto-sizing state.
    pub fn reset(&mut self) {
        self.text.clear();
        self.pending_image = None;
    }

    pub(crate) fn draft(&self) -> Option<Draft> {
        if self.is_empty() {
            return None;
        }
        Some(Draft {
            text: self.text.trim().to_string(),
            image_url: self
                .pending_image
                .as_ref()
                .map(|image| image.data_url.clone()),
        })
    }
}

//! Texture-backed previews for staged images, plus loading of dropped files.

use anyhow::{Result, anyhow};
use detect_core::{FileDescriptor, PreviewProvider};
use eframe::egui;

/// Longest edge of a preview texture in pixels.
const PREVIEW_MAX: u32 = 512;

/// Uploads a downscaled copy of each staged image as an egui texture. The
/// texture is freed when its [`egui::TextureHandle`] is dropped, which happens
/// when the staged file is replaced or cleared.
pub struct TexturePreviewProvider {
    ctx: egui::Context,
    seq: u64,
}

impl TexturePreviewProvider {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx, seq: 0 }
    }
}

impl PreviewProvider for TexturePreviewProvider {
    type Preview = egui::TextureHandle;

    fn acquire(&mut self, file: &FileDescriptor) -> Option<egui::TextureHandle> {
        match image::load_from_memory(&file.content) {
            Ok(img) => {
                let thumb = img.thumbnail(PREVIEW_MAX, PREVIEW_MAX).to_rgba8();
                let (w, h) = thumb.dimensions();
                let size = [w as usize, h as usize];
                let pixels = thumb.into_raw();
                let color = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
                self.seq += 1;
                let name = format!("preview:{}:{}", self.seq, file.name);
                Some(
                    self.ctx
                        .load_texture(name, color, egui::TextureOptions::LINEAR),
                )
            }
            Err(e) => {
                tracing::warn!("no preview for {}: {}", file.name, e);
                None
            }
        }
    }
}

/// Converts an OS drop into a file descriptor, reading from disk when the
/// platform only hands over a path.
pub fn descriptor_from_dropped(file: &egui::DroppedFile) -> Result<FileDescriptor> {
    if let Some(bytes) = &file.bytes {
        let name = if file.name.is_empty() {
            file.path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "dropped-file".to_string())
        } else {
            file.name.clone()
        };
        return Ok(FileDescriptor::from_bytes(name, &file.mime, bytes.clone()));
    }
    match &file.path {
        Some(path) => FileDescriptor::from_path(path),
        None => Err(anyhow!("drop carried neither bytes nor a path")),
    }
}

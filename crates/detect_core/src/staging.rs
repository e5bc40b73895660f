//! Single-file staging area with drag state and scoped preview resources.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// MIME type used when nothing better can be guessed.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// A file chosen by the user, either through the picker or a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub content: Arc<[u8]>,
}

impl FileDescriptor {
    /// Builds a descriptor from in-memory bytes; the MIME type is guessed from
    /// the file name when `mime_type` is empty.
    pub fn from_bytes(name: impl Into<String>, mime_type: &str, content: Arc<[u8]>) -> Self {
        let name = name.into();
        let mime_type = if mime_type.trim().is_empty() {
            guess_mime(&name)
        } else {
            mime_type.to_string()
        };
        Self {
            size_bytes: content.len() as u64,
            name,
            mime_type,
            content,
        }
    }

    /// Reads a file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_bytes(name, "", Arc::from(bytes)))
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Guesses a MIME type from a file name's extension.
pub fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}

/// Creates preview resources for staged image files.
///
/// The returned value is owned by the staged file; dropping it must release
/// whatever was acquired.
pub trait PreviewProvider {
    type Preview;

    fn acquire(&mut self, file: &FileDescriptor) -> Option<Self::Preview>;
}

/// Provider for hosts that do not render previews.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreview;

impl PreviewProvider for NoPreview {
    type Preview = ();

    fn acquire(&mut self, _file: &FileDescriptor) -> Option<()> {
        None
    }
}

/// The currently staged file together with its preview.
#[derive(Debug)]
pub struct StagedFile<V> {
    file: FileDescriptor,
    preview: Option<V>,
}

impl<V> StagedFile<V> {
    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    pub fn preview(&self) -> Option<&V> {
        self.preview.as_ref()
    }
}

/// Holds at most one staged file and the drag-active flag.
pub struct FileStagingArea<P: PreviewProvider> {
    provider: P,
    staged: Option<StagedFile<P::Preview>>,
    drag_active: bool,
}

impl<P: PreviewProvider> FileStagingArea<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            staged: None,
            drag_active: false,
        }
    }

    /// Stages `file`, replacing any previous one. No type or size checks are
    /// made; non-image files are staged without a preview.
    pub fn select_file(&mut self, file: FileDescriptor) {
        // release the old preview before acquiring a new one
        self.staged = None;
        self.drag_active = false;
        let preview = if file.is_image() {
            self.provider.acquire(&file)
        } else {
            None
        };
        tracing::debug!(
            "staged {} ({} bytes, {})",
            file.name,
            file.size_bytes,
            file.mime_type
        );
        self.staged = Some(StagedFile { file, preview });
    }

    pub fn clear(&mut self) {
        if let Some(old) = self.staged.take() {
            tracing::debug!("cleared staged file {}", old.file.name);
        }
    }

    pub fn drag_enter(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_over(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    /// Handles a drop: stages the first file of the payload and ignores the
    /// rest. Returns whether a file was staged.
    pub fn drop_files<I>(&mut self, files: I) -> bool
    where
        I: IntoIterator<Item = FileDescriptor>,
    {
        self.drag_active = false;
        match files.into_iter().next() {
            Some(first) => {
                self.select_file(first);
                true
            }
            None => false,
        }
    }

    pub fn staged(&self) -> Option<&StagedFile<P::Preview>> {
        self.staged.as_ref()
    }

    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn has_preview(&self) -> bool {
        self.staged.as_ref().is_some_and(|s| s.preview.is_some())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Preview that tracks how many instances are alive.
    pub(crate) struct CountedPreview(Rc<Cell<usize>>);

    impl Drop for CountedPreview {
        fn drop(&mut self) {
            self.0.set(self.0.get() - 1);
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingProvider {
        pub(crate) live: Rc<Cell<usize>>,
    }

    impl PreviewProvider for CountingProvider {
        type Preview = CountedPreview;

        fn acquire(&mut self, _file: &FileDescriptor) -> Option<CountedPreview> {
            self.live.set(self.live.get() + 1);
            Some(CountedPreview(self.live.clone()))
        }
    }

    pub(crate) fn jpeg(name: &str, size: usize) -> FileDescriptor {
        FileDescriptor::from_bytes(name, "image/jpeg", Arc::from(vec![0u8; size]))
    }

    fn area() -> (FileStagingArea<CountingProvider>, Rc<Cell<usize>>) {
        let provider = CountingProvider::default();
        let live = provider.live.clone();
        (FileStagingArea::new(provider), live)
    }

    #[test]
    fn replacing_a_file_releases_the_previous_preview() {
        let (mut area, live) = area();
        area.select_file(jpeg("a.jpg", 10));
        assert_eq!(live.get(), 1);
        area.select_file(jpeg("b.jpg", 10));
        assert_eq!(live.get(), 1);
        assert_eq!(area.staged().map(|s| s.file().name.as_str()), Some("b.jpg"));
        area.clear();
        assert_eq!(live.get(), 0);
        assert!(area.staged().is_none());
    }

    #[test]
    fn non_image_is_staged_without_preview() {
        let (mut area, live) = area();
        area.select_file(FileDescriptor::from_bytes(
            "notes.txt",
            "",
            Arc::from(b"hello".to_vec()),
        ));
        let staged = area.staged().expect("file staged");
        assert_eq!(staged.file().mime_type, "text/plain");
        assert!(staged.preview().is_none());
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn drag_flag_follows_enter_over_leave() {
        let (mut area, _) = area();
        area.drag_enter();
        assert!(area.drag_active());
        area.drag_leave();
        assert!(!area.drag_active());
        area.drag_over();
        assert!(area.drag_active());
        area.select_file(jpeg("a.jpg", 1));
        assert!(!area.drag_active());
    }

    #[test]
    fn multi_file_drop_stages_only_the_first() {
        let (mut area, live) = area();
        area.drag_enter();
        let staged = area.drop_files(vec![jpeg("first.jpg", 1), jpeg("second.jpg", 1)]);
        assert!(staged);
        assert!(!area.drag_active());
        assert_eq!(
            area.staged().map(|s| s.file().name.as_str()),
            Some("first.jpg")
        );
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn empty_drop_leaves_staged_file_in_place() {
        let (mut area, _) = area();
        area.select_file(jpeg("keep.jpg", 1));
        area.drag_over();
        assert!(!area.drop_files(Vec::new()));
        assert!(!area.drag_active());
        assert_eq!(area.staged().map(|s| s.file().name.as_str()), Some("keep.jpg"));
    }

    #[test]
    fn from_path_reads_bytes_and_guesses_type() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("scan.PNG");
        fs::write(&path, [1u8, 2, 3])?;
        let file = FileDescriptor::from_path(&path)?;
        assert_eq!(file.name, "scan.PNG");
        assert_eq!(file.size_bytes, 3);
        assert_eq!(file.mime_type, "image/png");
        Ok(())
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(guess_mime("blob"), FALLBACK_MIME);
    }
}

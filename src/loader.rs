use sedekah_qr_common::{DecodeError, FileSource, ImageLoader, SelectedFile};

/// Reads selected files from disk, or hands over in-memory bytes as is
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl ImageLoader for FileLoader {
    async fn load(&self, file: &SelectedFile) -> Result<Vec<u8>, DecodeError> {
        match &file.source {
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?),
            FileSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }
}

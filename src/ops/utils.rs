//! Shared helpers for storage operations.

use std::path::Path;

use bytes::BytesMut;
use futures::StreamExt;
use futures::stream;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::backend::UploadBody;

/// Bytes read from a local file per upload chunk.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Object name for an uploaded file: the last path component.
pub(crate) fn object_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Stream the remaining content of `file` in fixed-size chunks.
pub(crate) fn file_chunks(file: File) -> UploadBody {
    stream::try_unfold(file, |mut file| async move {
        let mut chunk = BytesMut::with_capacity(UPLOAD_CHUNK_SIZE);
        while chunk.len() < UPLOAD_CHUNK_SIZE {
            if file.read_buf(&mut chunk).await? == 0 {
                break;
            }
        }
        let next = (!chunk.is_empty()).then(|| (chunk.freeze(), file));
        Ok::<_, std::io::Error>(next)
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name() {
        assert_eq!(
            object_name(Path::new("/tmp/upload/report.pdf")),
            Some("report.pdf".to_string())
        );
        assert_eq!(object_name(Path::new("notes.txt")), Some("notes.txt".to_string()));
        assert_eq!(object_name(Path::new("/")), None);
        assert_eq!(object_name(Path::new("dir/..")), None);
    }

    #[tokio::test]
    async fn test_file_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let data: Vec<u8> = (0..(UPLOAD_CHUNK_SIZE * 2 + 7)).map(|i| (i % 13) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let chunks: Vec<_> = file_chunks(File::open(&path).await.unwrap())
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(
            chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
            vec![UPLOAD_CHUNK_SIZE, UPLOAD_CHUNK_SIZE, 7]
        );
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_file_chunks_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let chunks: Vec<_> = file_chunks(File::open(&path).await.unwrap()).collect().await;
        assert!(chunks.is_empty());
    }
}

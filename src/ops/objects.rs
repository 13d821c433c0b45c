//! Object transfer and deletion.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use super::CloudieOperations;
use super::utils::{file_chunks, object_name};
use crate::callback::Callback;
use crate::error::OpResult;
use crate::model::{Container, StoredObject};

impl CloudieOperations {
    /// Upload each regular file in `files` under its base name, then re-list
    /// the container.
    ///
    /// Missing paths and anything that is not a regular file are skipped.
    pub async fn create_stored_objects(
        &self,
        container: &Container,
        files: &[PathBuf],
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;

        for path in files {
            let is_file = tokio::fs::metadata(path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            let name = match object_name(path) {
                Some(name) if is_file => name,
                _ => {
                    trace!(path = %path.display(), "skipping upload entry");
                    continue;
                }
            };

            let file = File::open(path).await?;
            debug!(container = %container.name, object = %name, "uploading object");
            account
                .upload_object(&container.name, &name, file_chunks(file))
                .await?;
        }

        self.reload_container(&*account, container, callback).await?;
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    pub async fn delete_stored_objects(
        &self,
        container: &Container,
        objects: &[StoredObject],
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;

        for object in objects {
            debug!(container = %container.name, object = %object.name, "deleting object");
            account.delete_object(&container.name, &object.name).await?;
            callback.on_stored_object_deleted(container, object);
        }

        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    /// Stream the content of `object` into `target`, chunk by chunk.
    pub async fn download_stored_object(
        &self,
        container: &Container,
        object: &StoredObject,
        target: &Path,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;
        let mut chunks = account.download_object(&container.name, &object.name).await?;

        let mut file = File::create(target).await?;
        let mut written = 0u64;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        debug!(
            container = %container.name,
            object = %object.name,
            target = %target.display(),
            size = written,
            "downloaded object"
        );

        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    pub async fn refresh_stored_objects(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;
        self.reload_container(&*account, container, callback).await?;
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    /// Fetch the metadata of `object` and emit the updated snapshot.
    pub async fn get_object_metadata(
        &self,
        object: &StoredObject,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;
        let metadata = account
            .object_metadata(&object.container, &object.name)
            .await?;

        callback.on_stored_object_update(&object.clone().with_metadata(metadata));
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }
}

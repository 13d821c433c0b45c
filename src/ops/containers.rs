//! Container lifecycle.

use tracing::debug;

use super::CloudieOperations;
use crate::callback::Callback;
use crate::error::OpResult;
use crate::model::{Container, ContainerSpecification};

impl CloudieOperations {
    /// Create the container described by `spec`.
    ///
    /// A name that already exists is left untouched, including its
    /// visibility, but the container list is still re-emitted.
    pub async fn create_container(
        &self,
        spec: Option<&ContainerSpecification>,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let Some(spec) = spec else {
            return Ok(());
        };
        let account = self.account().await?;

        let existing = account.container(spec.name()).await?;
        if existing.exists {
            debug!(container = spec.name(), "container already exists");
        } else {
            debug!(
                container = spec.name(),
                visibility = ?spec.visibility(),
                "creating container"
            );
            account.create_container(spec.name()).await?;
            account
                .set_container_visibility(spec.name(), spec.visibility())
                .await?;
        }

        self.emit_containers(&*account, callback).await?;
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    pub async fn delete_container(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;
        debug!(container = %container.name, "deleting container");

        account.delete_container(&container.name).await?;

        self.emit_containers(&*account, callback).await?;
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    /// Delete every object in `container`, then re-list it.
    pub async fn empty_container(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;
        let objects = self.eager_fetch_stored_objects(&*account, container).await?;
        debug!(container = %container.name, count = objects.len(), "emptying container");

        for object in &objects {
            account.delete_object(&container.name, &object.name).await?;
            callback.on_number_of_calls(account.number_of_calls());
        }

        self.reload_container(&*account, container, callback).await?;
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    /// Delete every object in `container`, then the container itself.
    pub async fn purge_container(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;
        let objects = self.eager_fetch_stored_objects(&*account, container).await?;
        debug!(container = %container.name, count = objects.len(), "purging container");

        for object in &objects {
            account.delete_object(&container.name, &object.name).await?;
            callback.on_number_of_calls(account.number_of_calls());
        }
        account.delete_container(&container.name).await?;

        self.emit_containers(&*account, callback).await?;
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    pub async fn refresh_containers(&self, callback: &dyn Callback) -> OpResult<()> {
        let account = self.account().await?;
        self.emit_containers(&*account, callback).await?;
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }

    /// Fetch the metadata of `container` and emit the updated snapshot.
    pub async fn get_container_metadata(
        &self,
        container: &Container,
        callback: &dyn Callback,
    ) -> OpResult<()> {
        let account = self.account().await?;
        let metadata = account.container_metadata(&container.name).await?;
        debug!(container = %container.name, entries = metadata.len(), "fetched container metadata");

        callback.on_container_update(&container.clone().with_metadata(metadata));
        callback.on_number_of_calls(account.number_of_calls());
        Ok(())
    }
}

//! Paged listings.
//!
//! Two protocols share the same cursor mechanics:
//!
//! - eager fetch: collect every page into one ordered list before anything
//!   is reported, used where a complete snapshot is needed;
//! - container reload: stream an object listing to the callback one page at
//!   a time.
//!
//! Both end on the first empty page. Backends may return fewer entries than
//! requested, so a short page says nothing about what is left.

use tracing::debug;

use super::CloudieOperations;
use crate::backend::Account;
use crate::callback::Callback;
use crate::error::CommandResult;
use crate::model::{Container, PageCursor, StoredObject};

impl CloudieOperations {
    /// All containers of the account, in listing order.
    pub(crate) async fn eager_fetch_containers(
        &self,
        account: &dyn Account,
    ) -> CommandResult<Vec<Container>> {
        let page_size = self.config.page_size;
        let mut containers = Vec::new();
        let mut cursor = PageCursor::start();

        loop {
            let page = account.list_containers(&cursor, page_size).await?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = PageCursor::after(last.name.as_str());
            containers.extend(page);
        }

        debug!(count = containers.len(), "fetched containers");
        Ok(containers)
    }

    /// All objects of `container`, in listing order.
    pub(crate) async fn eager_fetch_stored_objects(
        &self,
        account: &dyn Account,
        container: &Container,
    ) -> CommandResult<Vec<StoredObject>> {
        let page_size = self.config.page_size;
        let mut objects = Vec::new();
        let mut cursor = PageCursor::start();

        loop {
            let page = account
                .list_objects(&container.name, "", &cursor, page_size)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = PageCursor::after(last.name.as_str());
            objects.extend(page);
        }

        debug!(container = %container.name, count = objects.len(), "fetched objects");
        Ok(objects)
    }

    /// Stream the object listing of `container` to `callback`.
    ///
    /// Emits `on_new_stored_objects` once, then one `on_append_stored_objects`
    /// per non-empty page. The listing ends when a page comes back empty; a
    /// full page is never assumed to be the last one.
    pub(crate) async fn reload_container(
        &self,
        account: &dyn Account,
        container: &Container,
        callback: &dyn Callback,
    ) -> CommandResult<()> {
        callback.on_new_stored_objects();

        let mut cursor = PageCursor::start();
        let mut page_index = 0;
        loop {
            let page = account
                .list_objects(&container.name, "", &cursor, self.config.page_size)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = PageCursor::after(last.name.as_str());

            debug!(
                container = %container.name,
                page = page_index,
                count = page.len(),
                "appending object page"
            );
            callback.on_append_stored_objects(container, page_index, &page);
            page_index += 1;
        }
        Ok(())
    }

    /// Report the complete container list.
    pub(crate) async fn emit_containers(
        &self,
        account: &dyn Account,
        callback: &dyn Callback,
    ) -> CommandResult<()> {
        let containers = self.eager_fetch_containers(account).await?;
        callback.on_update_containers(&containers);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::callback::{CallbackEvent, ChannelCallback};
    use crate::model::Visibility;
    use crate::ops::testing::{CappedBackend, drain, logged_in, logged_in_to};

    fn seed(backend: &MemoryBackend, container: &str, count: usize) {
        backend.seed_container(container, Visibility::Private);
        for i in 0..count {
            backend.seed_object(container, &format!("obj-{:05}", i), vec![0u8; 4]);
        }
    }

    fn appended(events: &[CallbackEvent]) -> Vec<(usize, Vec<String>)> {
        events
            .iter()
            .filter_map(|event| match event {
                CallbackEvent::AppendStoredObjects { page, objects, .. } => {
                    Some((*page, objects.iter().map(|o| o.name.clone()).collect()))
                }
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_reload_splits_into_pages() {
        let backend = MemoryBackend::new();
        seed(&backend, "docs", 10);
        let ops = logged_in(&backend, 4).await;
        let account = ops.account().await.unwrap();
        let (callback, mut rx) = ChannelCallback::new();

        ops.reload_container(&*account, &Container::absent("docs"), &callback)
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events[0], CallbackEvent::NewStoredObjects);
        let pages = appended(&events);
        assert_eq!(
            pages.iter().map(|(page, objects)| (*page, objects.len())).collect::<Vec<_>>(),
            vec![(0, 4), (1, 4), (2, 2)]
        );
        let names: Vec<String> = pages.into_iter().flat_map(|(_, names)| names).collect();
        assert_eq!(names, backend.object_names("docs"));
        // 3 non-empty pages plus the empty one that ends the listing.
        assert_eq!(account.number_of_calls(), 1 + 4);
    }

    #[tokio::test]
    async fn test_reload_exact_multiple_of_page_size() {
        let backend = MemoryBackend::new();
        seed(&backend, "docs", 8);
        let ops = logged_in(&backend, 4).await;
        let account = ops.account().await.unwrap();
        let (callback, mut rx) = ChannelCallback::new();

        ops.reload_container(&*account, &Container::absent("docs"), &callback)
            .await
            .unwrap();

        let pages = appended(&drain(&mut rx));
        assert_eq!(
            pages.iter().map(|(page, objects)| (*page, objects.len())).collect::<Vec<_>>(),
            vec![(0, 4), (1, 4)]
        );
        assert_eq!(account.number_of_calls(), 1 + 3);
    }

    #[tokio::test]
    async fn test_reload_empty_container() {
        let backend = MemoryBackend::new();
        seed(&backend, "empty", 0);
        let ops = logged_in(&backend, 9999).await;
        let account = ops.account().await.unwrap();
        let (callback, mut rx) = ChannelCallback::new();

        ops.reload_container(&*account, &Container::absent("empty"), &callback)
            .await
            .unwrap();

        assert_eq!(drain(&mut rx), vec![CallbackEvent::NewStoredObjects]);
    }

    #[tokio::test]
    async fn test_reload_full_last_page_ends_on_empty_page() {
        let backend = MemoryBackend::new();
        seed(&backend, "big", 9999);
        let ops = logged_in(&backend, 9999).await;
        let account = ops.account().await.unwrap();
        let (callback, mut rx) = ChannelCallback::new();

        ops.reload_container(&*account, &Container::absent("big"), &callback)
            .await
            .unwrap();

        let pages = appended(&drain(&mut rx));
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].0, 0);
        assert_eq!(pages[0].1.len(), 9999);
        let listings = backend
            .journal()
            .iter()
            .filter(|entry| *entry == "GET /big")
            .count();
        assert_eq!(listings, 2);
    }

    #[tokio::test]
    async fn test_eager_fetch_concatenates_pages() {
        let backend = MemoryBackend::new();
        seed(&backend, "docs", 7);
        for name in ["a", "b", "c", "d", "e"] {
            backend.seed_container(name, Visibility::Public);
        }
        let ops = logged_in(&backend, 3).await;
        let account = ops.account().await.unwrap();

        let objects = ops
            .eager_fetch_stored_objects(&*account, &Container::absent("docs"))
            .await
            .unwrap();
        assert_eq!(
            objects.iter().map(|o| o.name.clone()).collect::<Vec<_>>(),
            backend.object_names("docs")
        );

        let containers = ops.eager_fetch_containers(&*account).await.unwrap();
        assert_eq!(
            containers.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c", "d", "docs", "e"]
        );
    }

    #[tokio::test]
    async fn test_eager_fetch_keeps_going_after_short_pages() {
        let inner = MemoryBackend::new();
        seed(&inner, "docs", 12);
        for i in 0..7 {
            inner.seed_container(&format!("c{}", i), Visibility::Private);
        }
        let ops = logged_in_to(
            CappedBackend {
                inner: inner.clone(),
                cap: 5,
            },
            10,
        )
        .await;
        let account = ops.account().await.unwrap();

        let objects = ops
            .eager_fetch_stored_objects(&*account, &Container::absent("docs"))
            .await
            .unwrap();
        assert_eq!(objects.len(), 12);
        assert_eq!(
            objects.iter().map(|o| o.name.clone()).collect::<Vec<_>>(),
            inner.object_names("docs")
        );

        let containers = ops.eager_fetch_containers(&*account).await.unwrap();
        assert_eq!(containers.len(), 8);
    }

    #[tokio::test]
    async fn test_eager_fetch_missing_container() {
        let backend = MemoryBackend::new();
        let ops = logged_in(&backend, 10).await;
        let account = ops.account().await.unwrap();

        let err = ops
            .eager_fetch_stored_objects(&*account, &Container::absent("nope"))
            .await
            .unwrap_err();
        assert_eq!(err, crate::error::CommandError::NotFound("nope".to_string()));
    }
}

//! Container and stored-object snapshots.
//!
//! Everything here is an immutable value returned by the backend. Operations
//! never patch a snapshot in place; they fetch again and hand the consumer a
//! replacement.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// User metadata attached to a container or object.
pub type Metadata = BTreeMap<String, String>;

/// Read access granted to anonymous users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Only the account may read
    Private,
    /// Anyone may read through the public URL
    Public,
}

impl Visibility {
    /// Map a "private container" flag as entered by the user.
    pub fn from_private_flag(private: bool) -> Self {
        if private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn is_public(&self) -> bool {
        *self == Visibility::Public
    }
}

/// A named collection of objects within an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Container name (unique within the account)
    pub name: String,
    /// Public or private read access
    pub visibility: Visibility,
    /// Whether the container existed when the snapshot was taken
    pub exists: bool,
    /// Number of objects reported by the backend
    pub object_count: u64,
    /// Total bytes stored in the container
    pub bytes_used: u64,
    /// Metadata, only present after an explicit fetch
    pub metadata: Option<Metadata>,
}

impl Container {
    /// Snapshot of a container that does not exist (yet).
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Private,
            exists: false,
            object_count: 0,
            bytes_used: 0,
            metadata: None,
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility.is_public()
    }

    /// Check if metadata has been fetched for this snapshot.
    ///
    /// A fetched but empty map still counts as known.
    pub fn metadata_known(&self) -> bool {
        self.metadata.is_some()
    }

    /// Replacement snapshot carrying freshly fetched metadata.
    pub fn with_metadata(self, metadata: Metadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..self
        }
    }
}

/// A named blob held inside exactly one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Name of the owning container
    pub container: String,
    /// Object name (unique within the container)
    pub name: String,
    /// Content length in bytes
    pub content_length: u64,
    /// MIME type reported by the backend
    pub content_type: String,
    /// Metadata, only present after an explicit fetch
    pub metadata: Option<Metadata>,
    /// Public URL, only set when the container is public
    pub public_url: Option<String>,
}

impl StoredObject {
    pub fn metadata_known(&self) -> bool {
        self.metadata.is_some()
    }

    /// Replacement snapshot carrying freshly fetched metadata.
    pub fn with_metadata(self, metadata: Metadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..self
        }
    }
}

/// Intent to create a container.
///
/// Two specifications are equal when their names are equal, regardless of
/// the requested visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpecification {
    name: String,
    private: bool,
}

impl ContainerSpecification {
    pub fn new(name: impl Into<String>, private: bool) -> Self {
        Self {
            name: name.into(),
            private,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from_private_flag(self.private)
    }
}

impl PartialEq for ContainerSpecification {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ContainerSpecification {}

impl Hash for ContainerSpecification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Continuation token for paged listings.
///
/// Holds the name of the last item of the previous page; listings resume
/// strictly after it. The start cursor is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor(Option<String>);

impl PageCursor {
    /// Cursor for the first page.
    pub fn start() -> Self {
        Self(None)
    }

    /// Cursor resuming after the given name.
    pub fn after(name: impl Into<String>) -> Self {
        Self(Some(name.into()))
    }

    /// The marker to send to the backend, `None` for the first page.
    pub fn marker(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }

    /// Whether `name` lies past this cursor.
    pub fn admits(&self, name: &str) -> bool {
        match self.marker() {
            Some(marker) => name > marker,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_specification_equality_by_name() {
        let private = ContainerSpecification::new("photos", true);
        let public = ContainerSpecification::new("photos", false);
        assert_eq!(private, public);
        assert_ne!(private, ContainerSpecification::new("videos", true));

        let mut set = HashSet::new();
        set.insert(private);
        assert!(!set.insert(public));
    }

    #[test]
    fn test_specification_visibility() {
        assert_eq!(
            ContainerSpecification::new("a", true).visibility(),
            Visibility::Private
        );
        assert_eq!(
            ContainerSpecification::new("a", false).visibility(),
            Visibility::Public
        );
    }

    #[test]
    fn test_metadata_known_is_distinct_from_empty() {
        let container = Container::absent("docs");
        assert!(!container.metadata_known());

        let fetched = container.with_metadata(Metadata::new());
        assert!(fetched.metadata_known());
        assert_eq!(fetched.metadata, Some(Metadata::new()));
    }

    #[test]
    fn test_page_cursor() {
        let start = PageCursor::start();
        assert!(start.is_start());
        assert_eq!(start.marker(), None);
        assert!(start.admits(""));

        let cursor = PageCursor::after("b.txt");
        assert_eq!(cursor.marker(), Some("b.txt"));
        assert!(!cursor.admits("a.txt"));
        assert!(!cursor.admits("b.txt"));
        assert!(cursor.admits("c.txt"));
    }
}

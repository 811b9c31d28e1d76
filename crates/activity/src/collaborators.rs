// crates/activity/src/collaborators.rs
//! External collaborators the Feed Reader and title generator depend on
//! but never implement: who may read a scope, what an actor's display
//! name is, the folder hierarchy, and the current URL of an uploaded
//! image. Each is a trait with a test-double implementation; a real
//! deployment supplies its own adapter over the host application's own
//! tables.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use uuid::Uuid;

/// The three scopes a permission check can be requested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceScope {
    Project,
    Folder,
    Element,
}

/// The accessible set a permission oracle resolves a caller's read grant
/// to. `All` matches the source system's "unrestricted" grant; a project
/// feed query only needs to know "is every id in this array accessible",
/// so `Ids` lets the oracle answer that without the caller re-deriving
/// the full set from a raw SQL subquery — activity-db's `ActivityScope`
/// still issues the actual containment filter against whichever ids are
/// relevant to the scope being queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessibleScope {
    All,
    Ids(HashSet<Uuid>),
}

impl AccessibleScope {
    pub fn contains(&self, id: Uuid) -> bool {
        match self {
            AccessibleScope::All => true,
            AccessibleScope::Ids(ids) => ids.contains(&id),
        }
    }

    pub fn contains_all(&self, ids: &[Uuid]) -> bool {
        ids.iter().all(|id| self.contains(*id))
    }
}

/// `Require(scope, id, actor, READ)` from §4.3: either the actor may read
/// the given resource or the call fails with *forbidden*. Also exposes
/// the accessible-folder/accessible-element sets a project-scoped feed
/// query filters against, and the folder hierarchy a folder-scoped feed
/// query walks.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    async fn require_read(&self, scope: ResourceScope, id: Uuid, actor_id: Uuid) -> Result<(), PermissionError>;

    /// The folders and elements `actor_id` may read within `project_id`,
    /// used to filter a project feed's `affected_folders`/`affected_elements`.
    async fn accessible_folders(&self, project_id: Uuid, actor_id: Uuid) -> Result<AccessibleScope, PermissionError>;

    async fn accessible_elements(&self, project_id: Uuid, actor_id: Uuid) -> Result<AccessibleScope, PermissionError>;

    /// Whether `folder_id` exists at all (not a permission question),
    /// used by `GetFolderFeed`'s existence check.
    async fn folder_exists(&self, folder_id: Uuid) -> Result<bool, PermissionError>;

    async fn element_exists(&self, element_id: Uuid) -> Result<bool, PermissionError>;

    /// The transitive descendant set of `folder_id` (including itself),
    /// computed by a recursive walk over `parent_id` in the source
    /// system's folder table.
    async fn folder_descendants(&self, folder_id: Uuid) -> Result<Vec<Uuid>, PermissionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("forbidden")]
    Forbidden,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Resolves an actor id to the display name title generation embeds
/// (`user = await session.get(User, user_id)` in the source aggregator).
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    async fn display_name(&self, actor_id: Uuid) -> Result<String, ActorDirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ActorDirectoryError {
    #[error("actor {0} not found")]
    NotFound(Uuid),
    #[error("backend error: {0}")]
    Backend(String),
}

/// The current location of an uploaded image, looked up in a single
/// batch by the Feed Reader's image-enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocation {
    pub thumbnail_url: String,
    pub url: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Looks up every id in `ids` at once; ids with no current image
    /// (deleted since upload) are simply absent from the result map, and
    /// the Feed Reader leaves those items untouched.
    async fn locate_many(&self, ids: &[String]) -> Result<HashMap<String, ImageLocation>, ImageStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// An always-permissive, always-resolvable set of test doubles. Useful
/// for integration tests that exercise the Feed Reader's query and
/// enrichment logic without standing up the host application's own
/// permission/user/image services.
pub mod test_doubles {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct AllowAllOracle {
        known_folders: Mutex<HashSet<Uuid>>,
        known_elements: Mutex<HashSet<Uuid>>,
        folder_children: Mutex<HashMap<Uuid, Vec<Uuid>>>,
    }

    impl AllowAllOracle {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn register_folder(&self, id: Uuid) {
            self.known_folders.lock().unwrap().insert(id);
        }

        pub fn register_element(&self, id: Uuid) {
            self.known_elements.lock().unwrap().insert(id);
        }

        pub fn set_children(&self, parent: Uuid, children: Vec<Uuid>) {
            self.folder_children.lock().unwrap().insert(parent, children);
        }
    }

    #[async_trait]
    impl PermissionOracle for AllowAllOracle {
        async fn require_read(&self, _scope: ResourceScope, _id: Uuid, _actor_id: Uuid) -> Result<(), PermissionError> {
            Ok(())
        }

        async fn accessible_folders(&self, _project_id: Uuid, _actor_id: Uuid) -> Result<AccessibleScope, PermissionError> {
            Ok(AccessibleScope::All)
        }

        async fn accessible_elements(&self, _project_id: Uuid, _actor_id: Uuid) -> Result<AccessibleScope, PermissionError> {
            Ok(AccessibleScope::All)
        }

        async fn folder_exists(&self, folder_id: Uuid) -> Result<bool, PermissionError> {
            let known = self.known_folders.lock().unwrap();
            Ok(known.is_empty() || known.contains(&folder_id))
        }

        async fn element_exists(&self, element_id: Uuid) -> Result<bool, PermissionError> {
            let known = self.known_elements.lock().unwrap();
            Ok(known.is_empty() || known.contains(&element_id))
        }

        async fn folder_descendants(&self, folder_id: Uuid) -> Result<Vec<Uuid>, PermissionError> {
            let children = self.folder_children.lock().unwrap();
            let mut result = vec![folder_id];
            let mut frontier = vec![folder_id];
            while let Some(next) = frontier.pop() {
                if let Some(kids) = children.get(&next) {
                    for kid in kids {
                        if !result.contains(kid) {
                            result.push(*kid);
                            frontier.push(*kid);
                        }
                    }
                }
            }
            Ok(result)
        }
    }

    #[derive(Default)]
    pub struct StaticActorDirectory {
        names: Mutex<HashMap<Uuid, String>>,
    }

    impl StaticActorDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_name(&self, actor_id: Uuid, name: impl Into<String>) {
            self.names.lock().unwrap().insert(actor_id, name.into());
        }
    }

    #[async_trait]
    impl ActorDirectory for StaticActorDirectory {
        async fn display_name(&self, actor_id: Uuid) -> Result<String, ActorDirectoryError> {
            match self.names.lock().unwrap().get(&actor_id) {
                Some(name) => Ok(name.clone()),
                None => Ok(format!("Пользователь {actor_id}")),
            }
        }
    }

    #[derive(Default)]
    pub struct StaticImageStore {
        locations: Mutex<HashMap<String, ImageLocation>>,
    }

    impl StaticImageStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_location(&self, id: impl Into<String>, location: ImageLocation) {
            self.locations.lock().unwrap().insert(id.into(), location);
        }
    }

    #[async_trait]
    impl ImageStore for StaticImageStore {
        async fn locate_many(&self, ids: &[String]) -> Result<HashMap<String, ImageLocation>, ImageStoreError> {
            let locations = self.locations.lock().unwrap();
            Ok(ids
                .iter()
                .filter_map(|id| locations.get(id).map(|loc| (id.clone(), loc.clone())))
                .collect())
        }
    }
}

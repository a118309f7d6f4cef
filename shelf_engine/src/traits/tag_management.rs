use crate::{
    db_types::{NewTag, Tag, TagId, TagUpdate},
    traits::TagApiError,
};

/// Behaviour for the shared tag vocabulary. Tag names are globally unique (case-sensitive,
/// per the store's unique index); violations surface as [`TagApiError::DuplicateTagName`].
#[allow(async_fn_in_trait)]
pub trait TagManagement {
    async fn insert_tag(&self, tag: NewTag) -> Result<Tag, TagApiError>;

    async fn fetch_tag(&self, id: TagId) -> Result<Option<Tag>, TagApiError>;

    /// Every tag, ordered by name.
    async fn fetch_all_tags(&self) -> Result<Vec<Tag>, TagApiError>;

    async fn update_tag(&self, id: TagId, update: TagUpdate) -> Result<Option<Tag>, TagApiError>;

    /// Deletes the tag record. Returns false if no such tag existed.
    async fn delete_tag(&self, id: TagId) -> Result<bool, TagApiError>;

    /// Strips the tag from every game that references it, returning the number of links
    /// removed. Issued alongside [`delete_tag`](Self::delete_tag), not atomically with it.
    async fn detach_tag_from_games(&self, id: TagId) -> Result<u64, TagApiError>;
}

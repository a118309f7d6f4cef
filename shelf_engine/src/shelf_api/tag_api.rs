use std::fmt::Debug;

use log::debug;

use crate::{
    access::{authorize, Action},
    db_types::{NewTag, Principal, Tag, TagId, TagUpdate},
    traits::{TagApiError, TagManagement},
};

/// The shared tag vocabulary. Reads are open; writes require any authenticated account.
pub struct TagApi<B> {
    db: B,
}

impl<B: Debug> Debug for TagApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TagApi ({:?})", self.db)
    }
}

impl<B> TagApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> TagApi<B>
where B: TagManagement
{
    pub async fn fetch_all_tags(&self) -> Result<Vec<Tag>, TagApiError> {
        self.db.fetch_all_tags().await
    }

    pub async fn fetch_tag(&self, id: TagId) -> Result<Option<Tag>, TagApiError> {
        self.db.fetch_tag(id).await
    }

    pub async fn create_tag(&self, principal: &Principal, tag: NewTag) -> Result<Tag, TagApiError> {
        authorize(Some(principal), &Action::WriteTag)?;
        let tag = self.db.insert_tag(tag).await?;
        debug!("🏷️ New tag {} ({}) created by {}", tag.name, tag.id, principal.username);
        Ok(tag)
    }

    pub async fn update_tag(
        &self,
        principal: &Principal,
        id: TagId,
        update: TagUpdate,
    ) -> Result<Option<Tag>, TagApiError> {
        authorize(Some(principal), &Action::WriteTag)?;
        self.db.update_tag(id, update).await
    }

    /// Deletes a tag and strips it from every game that carried it. The two operations are
    /// issued concurrently and are not atomic; a crash in between can leave dangling tag
    /// references on games.
    pub async fn delete_tag(&self, principal: &Principal, id: TagId) -> Result<(), TagApiError> {
        authorize(Some(principal), &Action::WriteTag)?;
        let (detached, deleted) = futures::join!(self.db.detach_tag_from_games(id), self.db.delete_tag(id));
        let links = detached.map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
        if !deleted? {
            return Err(TagApiError::TagNotFound);
        }
        debug!("🏷️ Tag {id} deleted; detached from {links} games");
        Ok(())
    }
}

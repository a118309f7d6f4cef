use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::TagId;

/// Client-supplied narrowing filters for game list queries. Each present field adds one AND
/// clause; an absent field omits its clause entirely rather than applying a default. The
/// moderation scope is not part of this type: the service supplies it separately so that a
/// caller can never widen visibility through a query parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameQueryFilter {
    /// Case-insensitive substring match on the title.
    pub search_term: Option<String>,
    /// Matches games where `players.min <= N <= players.max`.
    pub players: Option<i64>,
    /// Matches games tagged with this tag.
    pub tag_id: Option<TagId>,
}

impl GameQueryFilter {
    pub fn with_search_term<S: Into<String>>(mut self, term: S) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_players(mut self, players: i64) -> Self {
        self.players = Some(players);
        self
    }

    pub fn with_tag(mut self, tag_id: TagId) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_none() && self.players.is_none() && self.tag_id.is_none()
    }
}

impl Display for GameQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(term) = &self.search_term {
            write!(f, "search: {term}. ")?;
        }
        if let Some(players) = &self.players {
            write!(f, "players: {players}. ")?;
        }
        if let Some(tag_id) = &self.tag_id {
            write!(f, "tag: {tag_id}. ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_filter_adds_no_clauses() {
        let filter = GameQueryFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.to_string(), "No filters.");
    }

    #[test]
    fn filters_compose() {
        let filter = GameQueryFilter::default().with_search_term("king").with_players(7).with_tag(TagId(3));
        assert!(!filter.is_empty());
        assert_eq!(filter.search_term.as_deref(), Some("king"));
        assert_eq!(filter.players, Some(7));
        assert_eq!(filter.tag_id, Some(TagId(3)));
        assert_eq!(filter.to_string(), "search: king. players: 7. tag: 3. ");
    }
}

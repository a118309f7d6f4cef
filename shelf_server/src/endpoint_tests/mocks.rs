use mockall::mock;
use shelf_engine::{
    access::GameScope,
    db_types::{Game, GameId, GameUpdate, NewGame, NewTag, NewUser, Tag, TagId, TagUpdate, User, UserId, UserUpdate},
    query::GameQueryFilter,
    traits::{GameApiError, GameManagement, TagApiError, TagManagement, UserApiError, UserManagement},
};

mock! {
    pub ShelfDb {}
    impl UserManagement for ShelfDb {
        async fn create_user(&self, user: NewUser) -> Result<User, UserApiError>;
        async fn fetch_user(&self, id: UserId) -> Result<Option<User>, UserApiError>;
        async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, UserApiError>;
        async fn fetch_all_users(&self) -> Result<Vec<User>, UserApiError>;
        async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>, UserApiError>;
        async fn delete_user(&self, id: UserId) -> Result<bool, UserApiError>;
        async fn add_game_to_shelf(&self, user_id: UserId, game_id: GameId) -> Result<(), UserApiError>;
        async fn remove_game_from_shelf(&self, user_id: UserId, game_id: GameId) -> Result<u64, UserApiError>;
    }
    impl GameManagement for ShelfDb {
        async fn insert_game(&self, game: NewGame) -> Result<Game, GameApiError>;
        async fn fetch_game(&self, id: GameId, scope: GameScope) -> Result<Option<Game>, GameApiError>;
        async fn search_games(&self, scope: GameScope, filter: GameQueryFilter) -> Result<Vec<Game>, GameApiError>;
        async fn update_game(&self, id: GameId, update: GameUpdate) -> Result<Option<Game>, GameApiError>;
        async fn delete_game(&self, id: GameId) -> Result<bool, GameApiError>;
        async fn pull_game_from_shelves(&self, id: GameId) -> Result<u64, GameApiError>;
        async fn delete_games_submitted_by(&self, user_id: UserId) -> Result<u64, GameApiError>;
        async fn rebuild_shelves(&self) -> Result<u64, GameApiError>;
        async fn count_games(&self) -> Result<i64, GameApiError>;
    }
    impl TagManagement for ShelfDb {
        async fn insert_tag(&self, tag: NewTag) -> Result<Tag, TagApiError>;
        async fn fetch_tag(&self, id: TagId) -> Result<Option<Tag>, TagApiError>;
        async fn fetch_all_tags(&self) -> Result<Vec<Tag>, TagApiError>;
        async fn update_tag(&self, id: TagId, update: TagUpdate) -> Result<Option<Tag>, TagApiError>;
        async fn delete_tag(&self, id: TagId) -> Result<bool, TagApiError>;
        async fn detach_tag_from_games(&self, id: TagId) -> Result<u64, TagApiError>;
    }
}

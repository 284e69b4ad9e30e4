//! Users and session repositories.

use crate::{
    auth::models::{Session, User, UserTable},
    store::{RecordStore, StoreError},
};

#[derive(Debug, Clone)]
pub(crate) struct FileUsersRepository {
    users: RecordStore<UserTable>,
    session: RecordStore<Session>,
}

impl FileUsersRepository {
    #[must_use]
    pub(crate) fn new(users: RecordStore<UserTable>, session: RecordStore<Session>) -> Self {
        Self { users, session }
    }

    pub(crate) async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.load().await?;

        Ok(users
            .collection()
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    pub(crate) async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.load().await?.get(user_id).cloned())
    }

    /// Inserts `user` unless the username is taken; `false` when it is.
    pub(crate) async fn insert_unique(&self, user: User) -> Result<bool, StoreError> {
        let mut tx = self.users.begin().await?;

        if tx.collection().iter().any(|existing| existing.username == user.username) {
            return Ok(false);
        }

        tx.upsert(user.user_id.clone(), user);
        tx.commit().await?;

        Ok(true)
    }

    pub(crate) async fn session_user(&self) -> Result<Option<User>, StoreError> {
        Ok(self.session.load().await?.0)
    }

    pub(crate) async fn set_session(&self, user: Option<User>) -> Result<(), StoreError> {
        let mut tx = self.session.begin_default().await?;

        *tx = Session(user);
        tx.commit().await?;

        Ok(())
    }
}

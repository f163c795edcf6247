//! Registered users and the `users` collection.

use std::fmt::Display;

use async_trait::async_trait;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, doc, oid::ObjectId},
    options::IndexOptions,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::PasswordHash,
    transaction::{from_unix_millis, to_unix_millis},
};

/// The store-assigned ID of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an ID string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The ID of the user.
    pub id: UserId,
    /// The lowercase email the user logs in with.
    pub email: String,
    /// The name shown in the app.
    pub name: String,
    /// The bcrypt hash of the user's password.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// A user that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The lowercase email the user logs in with.
    pub email: String,
    /// The name shown in the app.
    pub name: String,
    /// The bcrypt hash of the user's password.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

impl NewUser {
    pub(crate) fn into_user(self, id: UserId) -> User {
        User {
            id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            created_at: self.created_at,
        }
    }
}

/// The public view of a [User], safe to send to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    /// The ID of the user.
    pub id: UserId,
    /// The lowercase email the user logs in with.
    pub email: String,
    /// The name shown in the app.
    pub name: String,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

/// Handles the creation and retrieval of users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Get a user by their ID.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user.
    async fn get(&self, id: &UserId) -> Result<User, Error>;

    /// Get a user by their lowercase email.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user.
    async fn get_by_email(&self, email: &str) -> Result<User, Error>;
}

/// The name of the collection users are stored in.
pub const USER_COLLECTION: &str = "users";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    email: String,
    #[serde(default)]
    name: String,
    password_hash: String,
    created_at: bson::DateTime,
}

impl TryFrom<UserDocument> for User {
    type Error = Error;

    fn try_from(document: UserDocument) -> Result<Self, Self::Error> {
        let id = document
            .id
            .ok_or_else(|| Error::Internal("stored user has no _id".to_owned()))?;

        Ok(User {
            id: UserId::new(id.to_hex()),
            email: document.email,
            name: document.name,
            password_hash: PasswordHash::new_unchecked(&document.password_hash),
            created_at: from_unix_millis(document.created_at.timestamp_millis())?,
        })
    }
}

/// Stores users in a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoUserStore {
    collection: Collection<UserDocument>,
}

impl MongoUserStore {
    /// Create a store backed by the `users` collection of `database`.
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(USER_COLLECTION),
        }
    }

    /// Create the unique index on `email` that guards against duplicate accounts.
    pub async fn ensure_indexes(&self) -> Result<(), Error> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;

        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let document = UserDocument {
            id: None,
            email: user.email.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.as_str().to_owned(),
            created_at: bson::DateTime::from_millis(to_unix_millis(user.created_at)),
        };

        let result = self.collection.insert_one(document).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::Internal("inserted user ID is not an ObjectId".to_owned()))?;

        Ok(user.into_user(UserId::new(id.to_hex())))
    }

    async fn get(&self, id: &UserId) -> Result<User, Error> {
        let object_id = ObjectId::parse_str(id.as_str()).map_err(|_| Error::NotFound)?;

        self.collection
            .find_one(doc! { "_id": object_id })
            .await?
            .ok_or(Error::NotFound)?
            .try_into()
    }

    async fn get_by_email(&self, email: &str) -> Result<User, Error> {
        self.collection
            .find_one(doc! { "email": email })
            .await?
            .ok_or(Error::NotFound)?
            .try_into()
    }
}

//! Auth data models.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap};

use crate::store::{Keyed, RecordList, Table};

/// Registered user as stored in the users file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Hex-encoded SHA-256 of the password.
    #[serde(default)]
    pub password: String,
    /// Permission names, stored either as a list or a comma separated string.
    #[serde(default, deserialize_with = "permission_names")]
    pub permissions: Vec<String>,
}

impl User {
    /// Whether the user was granted `permission`.
    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions
            .iter()
            .any(|granted| granted == permission.as_str())
    }
}

impl Keyed for User {
    fn key(&self) -> &str {
        &self.user_id
    }
}

/// Users file document.
pub type UserTable = Table<RecordList<User>>;

/// New registration data.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub permissions: Vec<String>,
}

fn permission_names<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Names {
        List(Vec<String>),
        Joined(String),
    }

    let names = match Names::deserialize(deserializer)? {
        Names::List(names) => names,
        Names::Joined(joined) => joined.split(',').map(str::to_owned).collect(),
    };

    Ok(names
        .into_iter()
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .collect())
}

/// The user an operation runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

impl Caller {
    #[must_use]
    pub fn new(user_id: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin,
        }
    }

    /// Whether the caller may see or change a record owned by `owner`.
    pub fn can_access(&self, owner: &str) -> bool {
        self.is_admin || self.user_id == owner
    }

    /// The user an operation applies to: an admin may act on behalf of
    /// `target`, everyone else always acts on themselves.
    pub fn target(&self, target: Option<&str>) -> String {
        match target {
            Some(target) if self.is_admin => target.to_owned(),
            _ => self.user_id.clone(),
        }
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self::new(user.user_id.clone(), user.is_admin)
    }
}

/// Named permissions checked before each command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ProductView,
    ProductCreate,
    ProductUpdate,
    ProductDelete,
    CartView,
    CartAdd,
    CartRemove,
    CartUpdate,
    OrderView,
    OrderCreate,
    OrderUpdate,
    OrderDelete,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductView => "product:view",
            Self::ProductCreate => "product:create",
            Self::ProductUpdate => "product:update",
            Self::ProductDelete => "product:delete",
            Self::CartView => "cart:view",
            Self::CartAdd => "cart:add",
            Self::CartRemove => "cart:remove",
            Self::CartUpdate => "cart:update",
            Self::OrderView => "order:view",
            Self::OrderCreate => "order:create",
            Self::OrderUpdate => "order:update",
            Self::OrderDelete => "order:delete",
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Session file document: the logged-in user, or `{}` when nobody is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session(pub Option<User>);

impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(user) => user.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

impl<'de> Deserialize<'de> for Session {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            User(Box<User>),
            Empty(serde_json::Value),
        }

        Ok(match Stored::deserialize(deserializer)? {
            Stored::User(user) => Self(Some(*user)),
            Stored::Empty(_) => Self(None),
        })
    }
}

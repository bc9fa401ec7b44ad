//! Strongly-typed value objects used by catalog entities.
//!
//! These wrappers enforce basic invariants (positive identifiers, a closed set
//! of roles, normalized email) so that once a value reaches the coordination
//! layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided email failed format validation.
    #[error("invalid email address")]
    InvalidEmail,
    /// Provided role name is not one of the known roles.
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// Page size must allow at least one item per page.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(try_from = "u32", into = "u32")]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: u32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `u32` backing this identifier.
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<u32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(RecipeId, "Server-assigned identifier of a recipe.");
id_newtype!(UserId, "Server-assigned identifier of a user account.");

/// Account role, ordered by privilege: `Guest < User < Moderator < Admin`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    #[default]
    Guest,
    User,
    Moderator,
    Admin,
}

impl Role {
    /// All roles sorted by name, the order the role picker lists them in.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Guest, Role::Moderator, Role::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::User => "User",
            Role::Guest => "Guest",
        }
    }

    /// Whether this role carries at least the privileges of `other`.
    pub fn at_least(self, other: Role) -> bool {
        self >= other
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Admins and moderators.
    pub fn is_moderator(self) -> bool {
        self.at_least(Role::Moderator)
    }

    /// Any signed-in account that is not a guest.
    pub fn is_user(self) -> bool {
        self.at_least(Role::User)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TypeConstraintError::UnknownRole(s.to_string()))
    }
}

/// The signed-in account looking at the catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewer {
    pub role: Role,
    pub user_id: Option<UserId>,
}

impl Viewer {
    pub fn new(role: Role, user_id: Option<UserId>) -> Self {
        Self { role, user_id }
    }

    pub fn guest() -> Self {
        Self::default()
    }
}

/// Server-side resource exposed as a paginated list.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CollectionName {
    Recipes,
    Users,
}

impl CollectionName {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionName::Recipes => "recipes",
            CollectionName::Users => "users",
        }
    }

    /// Path of the collection relative to the API root.
    pub fn path(self) -> String {
        format!("/{}", self.as_str())
    }

    /// Path of a single member of the collection.
    pub fn member_path(self, id: u32) -> String {
        format!("/{}/{id}", self.as_str())
    }
}

impl Display for CollectionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trims and lower-cases an email, rejecting malformed addresses.
pub fn normalize_email<S: Into<String>>(email: S) -> Result<String, TypeConstraintError> {
    let normalized = email.into().trim().to_lowercase();
    if normalized.validate_email() {
        Ok(normalized)
    } else {
        Err(TypeConstraintError::InvalidEmail)
    }
}

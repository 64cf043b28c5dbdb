//! Domain entities and write inputs.
//!
//! GraphQL output fields for the entities live in [`crate::schema`]; the write inputs double as
//! GraphQL input objects.

use async_graphql::{Enum, InputObject, ID};
use uuid::Uuid;

use crate::error::KeyError;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: Uuid,
    pub member_type_id: MemberTypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
}

/// Membership tier. The set of tiers is fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberType {
    pub id: MemberTypeId,
    pub discount: f64,
    pub posts_limit_per_month: i32,
}

#[derive(Enum, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberTypeId {
    Basic,
    Business,
}

impl MemberTypeId {
    pub const ALL: [MemberTypeId; 2] = [MemberTypeId::Basic, MemberTypeId::Business];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberTypeId::Basic => "BASIC",
            MemberTypeId::Business => "BUSINESS",
        }
    }
}

/// Row of the user-to-user join table: `subscriber_id` follows `author_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub subscriber_id: Uuid,
    pub author_id: Uuid,
}

#[derive(InputObject, Debug, Clone)]
pub struct CreateUserInput {
    pub name: String,
    pub balance: f64,
}

#[derive(InputObject, Debug, Clone, Default)]
pub struct ChangeUserInput {
    pub name: Option<String>,
    pub balance: Option<f64>,
}

#[derive(InputObject, Debug, Clone)]
pub struct CreateProfileInput {
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: Uuid,
    pub member_type_id: MemberTypeId,
}

#[derive(InputObject, Debug, Clone, Default)]
pub struct ChangeProfileInput {
    pub is_male: Option<bool>,
    pub year_of_birth: Option<i32>,
    pub member_type_id: Option<MemberTypeId>,
}

#[derive(InputObject, Debug, Clone)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
}

#[derive(InputObject, Debug, Clone, Default)]
pub struct ChangePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl User {
    pub fn apply(&mut self, change: ChangeUserInput) {
        if let Some(name) = change.name {
            self.name = name;
        }
        if let Some(balance) = change.balance {
            self.balance = balance;
        }
    }
}

impl Profile {
    pub fn apply(&mut self, change: ChangeProfileInput) {
        if let Some(is_male) = change.is_male {
            self.is_male = is_male;
        }
        if let Some(year_of_birth) = change.year_of_birth {
            self.year_of_birth = year_of_birth;
        }
        if let Some(member_type_id) = change.member_type_id {
            self.member_type_id = member_type_id;
        }
    }
}

impl Post {
    pub fn apply(&mut self, change: ChangePostInput) {
        if let Some(title) = change.title {
            self.title = title;
        }
        if let Some(content) = change.content {
            self.content = content;
        }
    }
}

/// Reads an entity id argument, rejecting anything that is not a UUID before it reaches a loader.
pub fn parse_id(id: &ID) -> Result<Uuid, KeyError> {
    Uuid::parse_str(id.as_str())
        .map_err(|e| KeyError { raw: id.to_string(), reason: e.to_string() })
}

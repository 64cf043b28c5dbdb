//! Output fields of the domain entities.
//!
//! Scalar fields read the entity directly; relationship fields go through the request's
//! [`Loaders`](crate::registry::Loaders) and never touch the store.

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::loaders;
use crate::model::{MemberType, MemberTypeId, Post, Profile, User};

#[Object]
impl User {
    async fn id(&self) -> Uuid {
        self.id
    }

    async fn name(&self) -> &str {
        &self.name
    }

    async fn balance(&self) -> f64 {
        self.balance
    }

    async fn profile(&self, ctx: &Context<'_>) -> Result<Option<Profile>> {
        Ok(loaders(ctx)?.profiles_by_user.load(self.id).await?)
    }

    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        Ok(loaders(ctx)?.posts_by_author.load(self.id).await?.unwrap_or_default())
    }

    /// Authors this user follows.
    async fn user_subscribed_to(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        Ok(loaders(ctx)?.subscribed_to.load(self.id).await?.unwrap_or_default())
    }

    /// Users following this user.
    async fn subscribed_to_user(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        Ok(loaders(ctx)?.subscribers.load(self.id).await?.unwrap_or_default())
    }
}

#[Object]
impl Profile {
    async fn id(&self) -> Uuid {
        self.id
    }

    async fn is_male(&self) -> bool {
        self.is_male
    }

    async fn year_of_birth(&self) -> i32 {
        self.year_of_birth
    }

    async fn user_id(&self) -> Uuid {
        self.user_id
    }

    async fn member_type_id(&self) -> MemberTypeId {
        self.member_type_id
    }

    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        Ok(loaders(ctx)?.users.load(self.user_id).await?)
    }

    async fn member_type(&self, ctx: &Context<'_>) -> Result<Option<MemberType>> {
        Ok(loaders(ctx)?.member_types.load(self.member_type_id).await?)
    }
}

#[Object]
impl Post {
    async fn id(&self) -> Uuid {
        self.id
    }

    async fn title(&self) -> &str {
        &self.title
    }

    async fn content(&self) -> &str {
        &self.content
    }

    async fn author_id(&self) -> Uuid {
        self.author_id
    }

    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        Ok(loaders(ctx)?.users.load(self.author_id).await?)
    }
}

#[Object]
impl MemberType {
    async fn id(&self) -> MemberTypeId {
        self.id
    }

    async fn discount(&self) -> f64 {
        self.discount
    }

    async fn posts_limit_per_month(&self) -> i32 {
        self.posts_limit_per_month
    }

    async fn profiles(&self, ctx: &Context<'_>) -> Result<Vec<Profile>> {
        Ok(loaders(ctx)?.profiles_by_member_type.load(self.id).await?.unwrap_or_default())
    }
}

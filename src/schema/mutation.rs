use async_graphql::{Context, Object, Result, ID};

use super::{loaders, store};
use crate::model::{
    parse_id, ChangePostInput, ChangeProfileInput, ChangeUserInput, CreatePostInput,
    CreateProfileInput, CreateUserInput, Post, Profile, User,
};

/// Writes go straight to the store. Each one then primes or clears the request's loaders so
/// that fields resolved later in the same request observe it.
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_user(&self, ctx: &Context<'_>, input: CreateUserInput) -> Result<User> {
        let user = store(ctx)?.create_user(input).await?;
        loaders(ctx)?.user_written(&user).await;
        Ok(user)
    }

    async fn change_user(&self, ctx: &Context<'_>, id: ID, input: ChangeUserInput) -> Result<User> {
        let user = store(ctx)?.update_user(parse_id(&id)?, input).await?;
        loaders(ctx)?.user_written(&user).await;
        Ok(user)
    }

    async fn delete_user(&self, ctx: &Context<'_>, id: ID) -> Result<ID> {
        let user_id = parse_id(&id)?;
        store(ctx)?.delete_user(user_id).await?;
        loaders(ctx)?.user_deleted(user_id).await;
        Ok(id)
    }

    async fn create_profile(
        &self,
        ctx: &Context<'_>,
        input: CreateProfileInput,
    ) -> Result<Profile> {
        let profile = store(ctx)?.create_profile(input).await?;
        loaders(ctx)?.profile_written(&profile).await;
        Ok(profile)
    }

    async fn change_profile(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: ChangeProfileInput,
    ) -> Result<Profile> {
        let profile = store(ctx)?.update_profile(parse_id(&id)?, input).await?;
        loaders(ctx)?.profile_written(&profile).await;
        Ok(profile)
    }

    async fn delete_profile(&self, ctx: &Context<'_>, id: ID) -> Result<ID> {
        let profile = store(ctx)?.delete_profile(parse_id(&id)?).await?;
        loaders(ctx)?.profile_deleted(&profile).await;
        Ok(id)
    }

    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        let post = store(ctx)?.create_post(input).await?;
        loaders(ctx)?.posts_changed(post.author_id).await;
        Ok(post)
    }

    async fn change_post(&self, ctx: &Context<'_>, id: ID, input: ChangePostInput) -> Result<Post> {
        let post = store(ctx)?.update_post(parse_id(&id)?, input).await?;
        loaders(ctx)?.posts_changed(post.author_id).await;
        Ok(post)
    }

    async fn delete_post(&self, ctx: &Context<'_>, id: ID) -> Result<ID> {
        let post = store(ctx)?.delete_post(parse_id(&id)?).await?;
        loaders(ctx)?.posts_changed(post.author_id).await;
        Ok(id)
    }

    /// Makes `user_id` follow `author_id` and returns the follower.
    async fn subscribe_to(&self, ctx: &Context<'_>, user_id: ID, author_id: ID) -> Result<User> {
        let (subscriber_id, author_id) = (parse_id(&user_id)?, parse_id(&author_id)?);
        store(ctx)?.subscribe(subscriber_id, author_id).await?;
        let loaders = loaders(ctx)?;
        loaders.subscription_changed(subscriber_id, author_id).await;
        loaders
            .users
            .load(subscriber_id)
            .await?
            .ok_or_else(|| format!("user not found: {subscriber_id}").into())
    }

    async fn unsubscribe_from(&self, ctx: &Context<'_>, user_id: ID, author_id: ID) -> Result<ID> {
        let (subscriber_id, author) = (parse_id(&user_id)?, parse_id(&author_id)?);
        store(ctx)?.unsubscribe(subscriber_id, author).await?;
        loaders(ctx)?.subscription_changed(subscriber_id, author).await;
        Ok(user_id)
    }
}

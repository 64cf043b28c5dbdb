//! GraphQL schema: query and mutation roots over the domain entities.

mod mutation;
mod types;

pub use mutation::MutationRoot;

use async_graphql::{Context, EmptySubscription, Object, Result, Schema, ID};

use crate::config::SchemaConfig;
use crate::model::{parse_id, MemberType, MemberTypeId, Post, Profile, User};
use crate::registry::{Loaders, StoreContext};
use crate::store::{PostFilter, ProfileFilter};

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Builds the schema with the configured depth and complexity limits.
///
/// The store and the per-request [`Loaders`] are not part of the schema; they are attached to
/// each request by the [`RequestHandler`](crate::handler::RequestHandler).
pub fn build_schema(config: &SchemaConfig) -> AppSchema {
    let mut builder =
        Schema::build(QueryRoot, MutationRoot, EmptySubscription).limit_depth(config.max_depth);
    if let Some(max_complexity) = config.max_complexity {
        builder = builder.limit_complexity(max_complexity);
    }
    builder.finish()
}

pub(crate) fn loaders<'a>(ctx: &Context<'a>) -> Result<&'a Loaders> {
    ctx.data::<Loaders>()
}

pub(crate) fn store<'a>(ctx: &Context<'a>) -> Result<&'a StoreContext> {
    ctx.data::<StoreContext>()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let users = store(ctx)?.find_users(None).await?;
        loaders(ctx)?.users.prime_many(users.iter().map(|u| (u.id, u.clone())).collect()).await;
        Ok(users)
    }

    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<Option<User>> {
        let id = parse_id(&id)?;
        Ok(loaders(ctx)?.users.load(id).await?)
    }

    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        Ok(store(ctx)?.find_posts(&PostFilter::default()).await?)
    }

    async fn post(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Post>> {
        let id = parse_id(&id)?;
        let filter = PostFilter { ids: Some(vec![id]), ..Default::default() };
        Ok(store(ctx)?.find_posts(&filter).await?.into_iter().next())
    }

    async fn profiles(&self, ctx: &Context<'_>) -> Result<Vec<Profile>> {
        Ok(store(ctx)?.find_profiles(&ProfileFilter::default()).await?)
    }

    async fn profile(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Profile>> {
        let id = parse_id(&id)?;
        let filter = ProfileFilter { ids: Some(vec![id]), ..Default::default() };
        Ok(store(ctx)?.find_profiles(&filter).await?.into_iter().next())
    }

    async fn member_types(&self, ctx: &Context<'_>) -> Result<Vec<MemberType>> {
        let member_types = store(ctx)?.find_member_types(None).await?;
        loaders(ctx)?
            .member_types
            .prime_many(member_types.iter().map(|m| (m.id, m.clone())).collect())
            .await;
        Ok(member_types)
    }

    async fn member_type(&self, ctx: &Context<'_>, id: MemberTypeId) -> Result<Option<MemberType>> {
        Ok(loaders(ctx)?.member_types.load(id).await?)
    }
}

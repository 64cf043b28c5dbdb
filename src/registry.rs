//! Per-request set of relationship loaders.
//!
//! Each loader pairs a [`BatchFunction`] with the shared store handle. Three fan-out shapes occur:
//!
//! * by primary key: at most one value per key, absent when nothing matched
//!   ([`UserById`], [`ProfileByUserId`], [`MemberTypeById`]);
//! * by foreign key group: a vec per key, empty when nothing matched ([`PostsByAuthorId`],
//!   [`ProfilesByMemberType`]);
//! * through the subscription join table: one filtered join-table query and one user query per
//!   batch, partitioned per key in memory ([`SubscribedTo`], [`Subscribers`]).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::batch_function::{group_by, index_by, BatchFunction};
use crate::config::LoaderConfig;
use crate::error::{StoreError, StoreResult};
use crate::loader::Loader;
use crate::model::{MemberType, MemberTypeId, Post, Profile, Subscription, User};
use crate::store::{DataStore, PostFilter, ProfileFilter, SubscriptionFilter};

/// Store handle every batch function runs against.
pub type StoreContext = Arc<dyn DataStore>;

pub struct UserById;

#[async_trait]
impl BatchFunction<Uuid, User> for UserById {
    type Context = StoreContext;
    type Error = StoreError;

    async fn load(keys: &[Uuid], store: &StoreContext) -> StoreResult<Vec<(Uuid, User)>> {
        let users = store.find_users(Some(keys)).await?;
        Ok(index_by(users, |u| u.id))
    }
}

pub struct ProfileByUserId;

#[async_trait]
impl BatchFunction<Uuid, Profile> for ProfileByUserId {
    type Context = StoreContext;
    type Error = StoreError;

    async fn load(keys: &[Uuid], store: &StoreContext) -> StoreResult<Vec<(Uuid, Profile)>> {
        let filter = ProfileFilter { user_ids: Some(keys.to_vec()), ..Default::default() };
        let profiles = store.find_profiles(&filter).await?;
        Ok(index_by(profiles, |p| p.user_id))
    }
}

pub struct MemberTypeById;

#[async_trait]
impl BatchFunction<MemberTypeId, MemberType> for MemberTypeById {
    type Context = StoreContext;
    type Error = StoreError;

    async fn load(
        keys: &[MemberTypeId],
        store: &StoreContext,
    ) -> StoreResult<Vec<(MemberTypeId, MemberType)>> {
        let member_types = store.find_member_types(Some(keys)).await?;
        Ok(index_by(member_types, |m| m.id))
    }
}

pub struct PostsByAuthorId;

#[async_trait]
impl BatchFunction<Uuid, Vec<Post>> for PostsByAuthorId {
    type Context = StoreContext;
    type Error = StoreError;

    async fn load(keys: &[Uuid], store: &StoreContext) -> StoreResult<Vec<(Uuid, Vec<Post>)>> {
        let filter = PostFilter { author_ids: Some(keys.to_vec()), ..Default::default() };
        let posts = store.find_posts(&filter).await?;
        Ok(group_by(keys, posts, |p| p.author_id))
    }
}

pub struct ProfilesByMemberType;

#[async_trait]
impl BatchFunction<MemberTypeId, Vec<Profile>> for ProfilesByMemberType {
    type Context = StoreContext;
    type Error = StoreError;

    async fn load(
        keys: &[MemberTypeId],
        store: &StoreContext,
    ) -> StoreResult<Vec<(MemberTypeId, Vec<Profile>)>> {
        let filter = ProfileFilter { member_type_ids: Some(keys.to_vec()), ..Default::default() };
        let profiles = store.find_profiles(&filter).await?;
        Ok(group_by(keys, profiles, |p| p.member_type_id))
    }
}

/// Subscriber id to the authors that user follows.
pub struct SubscribedTo;

#[async_trait]
impl BatchFunction<Uuid, Vec<User>> for SubscribedTo {
    type Context = StoreContext;
    type Error = StoreError;

    async fn load(keys: &[Uuid], store: &StoreContext) -> StoreResult<Vec<(Uuid, Vec<User>)>> {
        let filter =
            SubscriptionFilter { subscriber_ids: Some(keys.to_vec()), ..Default::default() };
        let rows = store.find_subscriptions(&filter).await?;
        join_users(&**store, keys, rows, |s| s.subscriber_id, |s| s.author_id).await
    }
}

/// Author id to the users following that author.
pub struct Subscribers;

#[async_trait]
impl BatchFunction<Uuid, Vec<User>> for Subscribers {
    type Context = StoreContext;
    type Error = StoreError;

    async fn load(keys: &[Uuid], store: &StoreContext) -> StoreResult<Vec<(Uuid, Vec<User>)>> {
        let filter = SubscriptionFilter { author_ids: Some(keys.to_vec()), ..Default::default() };
        let rows = store.find_subscriptions(&filter).await?;
        join_users(&**store, keys, rows, |s| s.author_id, |s| s.subscriber_id).await
    }
}

/// Resolves the far side of each join row with a single user query and groups the users under
/// the near-side key.
async fn join_users(
    store: &dyn DataStore,
    keys: &[Uuid],
    rows: Vec<Subscription>,
    near: fn(&Subscription) -> Uuid,
    far: fn(&Subscription) -> Uuid,
) -> StoreResult<Vec<(Uuid, Vec<User>)>> {
    let mut far_ids = rows.iter().map(far).collect::<Vec<_>>();
    far_ids.sort();
    far_ids.dedup();
    let users: HashMap<Uuid, User> = if far_ids.is_empty() {
        HashMap::new()
    } else {
        store.find_users(Some(far_ids.as_slice())).await?.into_iter().map(|u| (u.id, u)).collect()
    };
    tracing::debug!(rows = rows.len(), users = users.len(), "joined subscriptions");

    Ok(group_by(keys, rows, near)
        .into_iter()
        .map(|(key, rows)| {
            let linked = rows.iter().filter_map(|row| users.get(&far(row)).cloned()).collect();
            (key, linked)
        })
        .collect())
}

/// One loader per relationship, created fresh for every GraphQL request.
///
/// Resolvers reach related data only through these loaders, which collapses per-object fan-out
/// into one query per relationship per execution frame. Nothing here is shared between requests.
pub struct Loaders {
    pub users: Loader<Uuid, User>,
    pub profiles_by_user: Loader<Uuid, Profile>,
    pub posts_by_author: Loader<Uuid, Vec<Post>>,
    pub member_types: Loader<MemberTypeId, MemberType>,
    pub profiles_by_member_type: Loader<MemberTypeId, Vec<Profile>>,
    pub subscribed_to: Loader<Uuid, Vec<User>>,
    pub subscribers: Loader<Uuid, Vec<User>>,
}

impl Loaders {
    /// Spawns one worker per loader on the current tokio runtime.
    pub fn new(store: StoreContext, config: &LoaderConfig) -> Self {
        Self {
            users: Loader::with_config(UserById, store.clone(), config.clone()),
            profiles_by_user: Loader::with_config(ProfileByUserId, store.clone(), config.clone()),
            posts_by_author: Loader::with_config(PostsByAuthorId, store.clone(), config.clone()),
            member_types: Loader::with_config(MemberTypeById, store.clone(), config.clone()),
            profiles_by_member_type: Loader::with_config(
                ProfilesByMemberType,
                store.clone(),
                config.clone(),
            ),
            subscribed_to: Loader::with_config(SubscribedTo, store.clone(), config.clone()),
            subscribers: Loader::with_config(Subscribers, store, config.clone()),
        }
    }

    /// Makes a written user visible to later loads of this request.
    pub async fn user_written(&self, user: &User) {
        self.users.prime(user.id, user.clone()).await;
        // Join lists embed user values.
        self.subscribed_to.clear_all().await;
        self.subscribers.clear_all().await;
    }

    /// Forgets everything hanging off a deleted user.
    pub async fn user_deleted(&self, id: Uuid) {
        self.users.clear(id).await;
        self.profiles_by_user.clear(id).await;
        self.posts_by_author.clear(id).await;
        self.profiles_by_member_type.clear_all().await;
        self.subscribed_to.clear_all().await;
        self.subscribers.clear_all().await;
    }

    pub async fn profile_written(&self, profile: &Profile) {
        self.profiles_by_user.prime(profile.user_id, profile.clone()).await;
        self.profiles_by_member_type.clear_all().await;
    }

    pub async fn profile_deleted(&self, profile: &Profile) {
        self.profiles_by_user.clear(profile.user_id).await;
        self.profiles_by_member_type.clear_all().await;
    }

    pub async fn posts_changed(&self, author_id: Uuid) {
        self.posts_by_author.clear(author_id).await;
    }

    pub async fn subscription_changed(&self, subscriber_id: Uuid, author_id: Uuid) {
        self.subscribed_to.clear(subscriber_id).await;
        self.subscribers.clear(author_id).await;
    }
}

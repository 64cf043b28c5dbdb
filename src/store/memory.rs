//! In-memory storage implementation for demos and tests.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tracing::instrument;
use uuid::Uuid;

use super::{DataStore, PostFilter, ProfileFilter, SubscriptionFilter};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    ChangePostInput, ChangeProfileInput, ChangeUserInput, CreatePostInput, CreateProfileInput,
    CreateUserInput, MemberType, MemberTypeId, Post, Profile, Subscription, User,
};

/// In-memory implementation of DataStore.
///
/// Reads are linear scans over the table being queried. `profile_by_user` is the unique index
/// enforcing one profile per user.
#[derive(Debug)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    profiles: DashMap<Uuid, Profile>,
    profile_by_user: DashMap<Uuid, Uuid>,
    posts: DashMap<Uuid, Post>,
    member_types: DashMap<MemberTypeId, MemberType>,
    subscriptions: DashSet<Subscription>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let member_types = DashMap::new();
        member_types.insert(
            MemberTypeId::Basic,
            MemberType { id: MemberTypeId::Basic, discount: 2.3, posts_limit_per_month: 20 },
        );
        member_types.insert(
            MemberTypeId::Business,
            MemberType { id: MemberTypeId::Business, discount: 7.7, posts_limit_per_month: 100 },
        );
        Self {
            users: DashMap::new(),
            profiles: DashMap::new(),
            profile_by_user: DashMap::new(),
            posts: DashMap::new(),
            member_types,
            subscriptions: DashSet::new(),
        }
    }
}

impl MemoryStore {
    /// Creates a store holding only the seeded member types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory data store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn ensure_user(&self, id: Uuid) -> StoreResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(not_found("user", id))
        }
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> StoreError {
    StoreError::NotFound { entity, id: id.to_string() }
}

#[async_trait]
impl DataStore for MemoryStore {
    #[instrument(skip(self))]
    async fn find_users(&self, ids: Option<&[Uuid]>) -> StoreResult<Vec<User>> {
        Ok(match ids {
            Some(ids) => {
                ids.iter().filter_map(|id| self.users.get(id).map(|u| u.clone())).collect()
            }
            None => self.users.iter().map(|u| u.value().clone()).collect(),
        })
    }

    #[instrument(skip(self))]
    async fn find_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| filter.matches(p.value()))
            .map(|p| p.value().clone())
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        Ok(self
            .posts
            .iter()
            .filter(|p| filter.matches(p.value()))
            .map(|p| p.value().clone())
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_member_types(
        &self,
        ids: Option<&[MemberTypeId]>,
    ) -> StoreResult<Vec<MemberType>> {
        let ids = ids.unwrap_or(&MemberTypeId::ALL);
        Ok(ids.iter().filter_map(|id| self.member_types.get(id).map(|m| m.clone())).collect())
    }

    #[instrument(skip(self))]
    async fn find_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> StoreResult<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| filter.matches(s.key()))
            .map(|s| *s.key())
            .collect())
    }

    #[instrument(skip(self))]
    async fn create_user(&self, input: CreateUserInput) -> StoreResult<User> {
        let user = User { id: Uuid::new_v4(), name: input.name, balance: input.balance };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn update_user(&self, id: Uuid, change: ChangeUserInput) -> StoreResult<User> {
        let mut user = self.users.get_mut(&id).ok_or_else(|| not_found("user", id))?;
        user.apply(change);
        Ok(user.clone())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.users.remove(&id).ok_or_else(|| not_found("user", id))?;
        if let Some((_, profile_id)) = self.profile_by_user.remove(&id) {
            self.profiles.remove(&profile_id);
        }
        self.posts.retain(|_, post| post.author_id != id);
        self.subscriptions.retain(|s| s.subscriber_id != id && s.author_id != id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_profile(&self, input: CreateProfileInput) -> StoreResult<Profile> {
        self.ensure_user(input.user_id)?;
        if !self.member_types.contains_key(&input.member_type_id) {
            return Err(not_found("member type", input.member_type_id.as_str()));
        }
        let profile = Profile {
            id: Uuid::new_v4(),
            is_male: input.is_male,
            year_of_birth: input.year_of_birth,
            user_id: input.user_id,
            member_type_id: input.member_type_id,
        };
        match self.profile_by_user.entry(input.user_id) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict(format!(
                    "user {} already has a profile",
                    input.user_id
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(profile.id);
            }
        }
        self.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    #[instrument(skip(self))]
    async fn update_profile(&self, id: Uuid, change: ChangeProfileInput) -> StoreResult<Profile> {
        if let Some(member_type_id) = change.member_type_id {
            if !self.member_types.contains_key(&member_type_id) {
                return Err(not_found("member type", member_type_id.as_str()));
            }
        }
        let mut profile = self.profiles.get_mut(&id).ok_or_else(|| not_found("profile", id))?;
        profile.apply(change);
        Ok(profile.clone())
    }

    #[instrument(skip(self))]
    async fn delete_profile(&self, id: Uuid) -> StoreResult<Profile> {
        let (_, profile) = self.profiles.remove(&id).ok_or_else(|| not_found("profile", id))?;
        self.profile_by_user.remove(&profile.user_id);
        Ok(profile)
    }

    #[instrument(skip(self))]
    async fn create_post(&self, input: CreatePostInput) -> StoreResult<Post> {
        self.ensure_user(input.author_id)?;
        let post = Post {
            id: Uuid::new_v4(),
            title: input.title,
            content: input.content,
            author_id: input.author_id,
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    #[instrument(skip(self))]
    async fn update_post(&self, id: Uuid, change: ChangePostInput) -> StoreResult<Post> {
        let mut post = self.posts.get_mut(&id).ok_or_else(|| not_found("post", id))?;
        post.apply(change);
        Ok(post.clone())
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: Uuid) -> StoreResult<Post> {
        let (_, post) = self.posts.remove(&id).ok_or_else(|| not_found("post", id))?;
        Ok(post)
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        self.ensure_user(subscriber_id)?;
        self.ensure_user(author_id)?;
        self.subscriptions.insert(Subscription { subscriber_id, author_id });
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unsubscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        self.subscriptions
            .remove(&Subscription { subscriber_id, author_id })
            .map(|_| ())
            .ok_or_else(|| {
                StoreError::NotFound {
                    entity: "subscription",
                    id: format!("{subscriber_id}->{author_id}"),
                }
            })
    }
}

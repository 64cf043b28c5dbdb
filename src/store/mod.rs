//! DataStore trait definition.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::model::{
    ChangePostInput, ChangeProfileInput, ChangeUserInput, CreatePostInput, CreateProfileInput,
    CreateUserInput, MemberType, MemberTypeId, Post, Profile, Subscription, User,
};

/// Filter for reading profiles. Unset fields match everything; set fields are ANDed.
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    pub ids: Option<Vec<Uuid>>,
    pub user_ids: Option<Vec<Uuid>>,
    pub member_type_ids: Option<Vec<MemberTypeId>>,
}

/// Filter for reading posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub ids: Option<Vec<Uuid>>,
    pub author_ids: Option<Vec<Uuid>>,
}

/// Filter for reading subscription rows.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub subscriber_ids: Option<Vec<Uuid>>,
    pub author_ids: Option<Vec<Uuid>>,
}

pub(crate) fn matches<T: PartialEq>(allowed: &Option<Vec<T>>, value: &T) -> bool {
    allowed.as_ref().map_or(true, |allowed| allowed.contains(value))
}

impl ProfileFilter {
    pub fn matches(&self, profile: &Profile) -> bool {
        matches(&self.ids, &profile.id)
            && matches(&self.user_ids, &profile.user_id)
            && matches(&self.member_type_ids, &profile.member_type_id)
    }
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        matches(&self.ids, &post.id) && matches(&self.author_ids, &post.author_id)
    }
}

impl SubscriptionFilter {
    pub fn matches(&self, subscription: &Subscription) -> bool {
        matches(&self.subscriber_ids, &subscription.subscriber_id)
            && matches(&self.author_ids, &subscription.author_id)
    }
}

/// Persistence interface behind the resolvers and batch functions.
///
/// Every `find_*` call is one query against the backing store; batch functions issue a constant
/// number of them per batch. Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    // Reads

    /// Users with the given ids, or all users when `ids` is `None`. Order is unspecified.
    async fn find_users(&self, ids: Option<&[Uuid]>) -> StoreResult<Vec<User>>;

    async fn find_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>>;

    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>>;

    async fn find_member_types(&self, ids: Option<&[MemberTypeId]>) -> StoreResult<Vec<MemberType>>;

    async fn find_subscriptions(&self, filter: &SubscriptionFilter)
        -> StoreResult<Vec<Subscription>>;

    // Writes

    async fn create_user(&self, input: CreateUserInput) -> StoreResult<User>;

    async fn update_user(&self, id: Uuid, change: ChangeUserInput) -> StoreResult<User>;

    /// Deletes the user together with its profile, posts and subscription rows.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    /// Fails with a conflict if the user already has a profile.
    async fn create_profile(&self, input: CreateProfileInput) -> StoreResult<Profile>;

    async fn update_profile(&self, id: Uuid, change: ChangeProfileInput) -> StoreResult<Profile>;

    async fn delete_profile(&self, id: Uuid) -> StoreResult<Profile>;

    async fn create_post(&self, input: CreatePostInput) -> StoreResult<Post>;

    async fn update_post(&self, id: Uuid, change: ChangePostInput) -> StoreResult<Post>;

    async fn delete_post(&self, id: Uuid) -> StoreResult<Post>;

    /// Records that `subscriber_id` follows `author_id`. Idempotent.
    async fn subscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()>;

    async fn unsubscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()>;
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use batchgraph::model::{
    ChangePostInput, ChangeProfileInput, ChangeUserInput, CreatePostInput, CreateProfileInput,
    CreateUserInput, MemberType, MemberTypeId, Post, Profile, Subscription, User,
};
use batchgraph::store::{DataStore, MemoryStore, PostFilter, ProfileFilter, SubscriptionFilter};
use batchgraph::{StoreError, StoreResult};
use uuid::Uuid;

/// Number of read queries issued against each table.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Calls {
    pub users: usize,
    pub profiles: usize,
    pub posts: usize,
    pub member_types: usize,
    pub subscriptions: usize,
}

/// `MemoryStore` that counts read queries and can be told to fail post reads.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    users: AtomicUsize,
    profiles: AtomicUsize,
    posts: AtomicUsize,
    member_types: AtomicUsize,
    subscriptions: AtomicUsize,
    pub fail_posts: AtomicBool,
}

impl CountingStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Calls {
        Calls {
            users: self.users.load(Ordering::SeqCst),
            profiles: self.profiles.load(Ordering::SeqCst),
            posts: self.posts.load(Ordering::SeqCst),
            member_types: self.member_types.load(Ordering::SeqCst),
            subscriptions: self.subscriptions.load(Ordering::SeqCst),
        }
    }

    pub async fn user(&self, name: &str) -> User {
        self.inner
            .create_user(CreateUserInput { name: name.to_owned(), balance: 10.0 })
            .await
            .unwrap()
    }

    pub async fn profile(&self, user: &User, member_type_id: MemberTypeId) -> Profile {
        self.inner
            .create_profile(CreateProfileInput {
                is_male: false,
                year_of_birth: 1990,
                user_id: user.id,
                member_type_id,
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, title: &str) -> Post {
        self.inner
            .create_post(CreatePostInput {
                title: title.to_owned(),
                content: format!("{title} content"),
                author_id: author.id,
            })
            .await
            .unwrap()
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

#[async_trait]
impl DataStore for CountingStore {
    async fn find_users(&self, ids: Option<&[Uuid]>) -> StoreResult<Vec<User>> {
        bump(&self.users);
        self.inner.find_users(ids).await
    }

    async fn find_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>> {
        bump(&self.profiles);
        self.inner.find_profiles(filter).await
    }

    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        bump(&self.posts);
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("posts table offline".to_owned()));
        }
        self.inner.find_posts(filter).await
    }

    async fn find_member_types(
        &self,
        ids: Option<&[MemberTypeId]>,
    ) -> StoreResult<Vec<MemberType>> {
        bump(&self.member_types);
        self.inner.find_member_types(ids).await
    }

    async fn find_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> StoreResult<Vec<Subscription>> {
        bump(&self.subscriptions);
        self.inner.find_subscriptions(filter).await
    }

    async fn create_user(&self, input: CreateUserInput) -> StoreResult<User> {
        self.inner.create_user(input).await
    }

    async fn update_user(&self, id: Uuid, change: ChangeUserInput) -> StoreResult<User> {
        self.inner.update_user(id, change).await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_user(id).await
    }

    async fn create_profile(&self, input: CreateProfileInput) -> StoreResult<Profile> {
        self.inner.create_profile(input).await
    }

    async fn update_profile(&self, id: Uuid, change: ChangeProfileInput) -> StoreResult<Profile> {
        self.inner.update_profile(id, change).await
    }

    async fn delete_profile(&self, id: Uuid) -> StoreResult<Profile> {
        self.inner.delete_profile(id).await
    }

    async fn create_post(&self, input: CreatePostInput) -> StoreResult<Post> {
        self.inner.create_post(input).await
    }

    async fn update_post(&self, id: Uuid, change: ChangePostInput) -> StoreResult<Post> {
        self.inner.update_post(id, change).await
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<Post> {
        self.inner.delete_post(id).await
    }

    async fn subscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        self.inner.subscribe(subscriber_id, author_id).await
    }

    async fn unsubscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        self.inner.unsubscribe(subscriber_id, author_id).await
    }
}

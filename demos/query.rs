//! Seeds an in-memory store and runs one nested query against it.
//!
//! Run with `RUST_LOG=batchgraph=debug` to watch each loader issue a single batch.

use batchgraph::model::{CreatePostInput, CreateProfileInput, CreateUserInput, MemberTypeId};
use batchgraph::store::{DataStore, MemoryStore};
use batchgraph::{RequestHandler, StoreResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> StoreResult<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(env_filter).with(fmt::layer().with_target(true)).init();

    let store = MemoryStore::new_shared();
    let mut previous = None;
    let people = [
        ("ann", MemberTypeId::Basic),
        ("bob", MemberTypeId::Business),
        ("cid", MemberTypeId::Basic),
    ];
    for (name, member_type_id) in people {
        let user = store
            .create_user(CreateUserInput { name: name.to_owned(), balance: 100.0 })
            .await?;
        store
            .create_profile(CreateProfileInput {
                is_male: false,
                year_of_birth: 1990,
                user_id: user.id,
                member_type_id,
            })
            .await?;
        store
            .create_post(CreatePostInput {
                title: format!("{name}'s first post"),
                content: "hello".to_owned(),
                author_id: user.id,
            })
            .await?;
        if let Some(previous) = previous {
            store.subscribe(user.id, previous).await?;
        }
        previous = Some(user.id);
    }

    let handler = RequestHandler::new(store);
    let response = handler
        .execute(
            "{ users { name profile { memberType { discount } } posts { title } \
               userSubscribedTo { name } } }",
        )
        .await;

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(%e, "response not serializable"),
    }
    Ok(())
}

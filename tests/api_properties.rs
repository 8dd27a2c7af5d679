//! End-to-end properties of the graph/content/conversation/notification
//! core, exercised against a real Postgres.
//!
//! These tests need `DATABASE_URL` pointing at a scratch database and are
//! ignored by default:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/chirp_test cargo test -- --ignored
//! ```

use chirp_backend::db;
use chirp_backend::error::AppError;
use chirp_backend::models::NotificationKind;
use chirp_backend::services::{
    ContentService, ConversationService, IdentityService, ReadStateService, SocialGraphService,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch db");
    db::init_pool(&url).await.expect("connect + migrate")
}

async fn new_user(pool: &PgPool) -> Uuid {
    let tag = Uuid::new_v4().simple().to_string();
    IdentityService::new(pool.clone())
        .create_user(
            &format!("user_{tag}"),
            &format!("{tag}@example.com"),
            "$argon2id$test$not-a-real-hash",
            "Test",
            "User",
        )
        .await
        .expect("create user")
        .id
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn follow_toggle_is_symmetric_with_period_two() {
    let pool = pool().await;
    let graph = SocialGraphService::new(pool.clone());
    let a = new_user(&pool).await;
    let b = new_user(&pool).await;

    let outcome = graph.follow_toggle(a, b).await.unwrap();
    assert!(outcome.followed);
    assert!(outcome.actor.following.contains(&b));
    assert!(outcome.target.followers.contains(&a));

    let outcome = graph.follow_toggle(a, b).await.unwrap();
    assert!(!outcome.followed);
    assert!(!outcome.actor.following.contains(&b));
    assert!(!outcome.target.followers.contains(&a));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn self_follow_is_rejected() {
    let pool = pool().await;
    let a = new_user(&pool).await;
    let err = SocialGraphService::new(pool.clone())
        .follow_toggle(a, a)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SelfReference(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn follow_notifies_once_and_only_recipient_can_open() {
    let pool = pool().await;
    let a = new_user(&pool).await;
    let b = new_user(&pool).await;

    SocialGraphService::new(pool.clone())
        .follow_toggle(a, b)
        .await
        .unwrap();

    let read_state = ReadStateService::new(pool.clone());
    let unread = read_state.unread_notifications(b).await.unwrap();
    let follows: Vec<_> = unread
        .iter()
        .filter(|n| n.notification.kind == NotificationKind::Follow && n.notification.from_user == a)
        .collect();
    assert_eq!(follows.len(), 1);
    assert!(!follows[0].notification.opened);

    let id = follows[0].notification.id;
    let err = read_state.open_notification(a, id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let opened = read_state.open_notification(b, id).await.unwrap();
    assert!(opened.opened);
    assert!(read_state
        .unread_notifications(b)
        .await
        .unwrap()
        .iter()
        .all(|n| n.notification.id != id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn like_toggle_has_period_two_and_self_like_stays_silent() {
    let pool = pool().await;
    let content = ContentService::new(pool.clone());
    let author = new_user(&pool).await;

    let post = content.create_post(author, "hello world", vec![]).await.unwrap();

    let liked = content.toggle_like(author, post.id).await.unwrap();
    assert_eq!(liked.likes, vec![author]);

    let unliked = content.toggle_like(author, post.id).await.unwrap();
    assert!(unliked.likes.is_empty());

    // Author liked their own post: no notification appended.
    let unread = ReadStateService::new(pool.clone())
        .unread_notifications(author)
        .await
        .unwrap();
    assert!(unread
        .iter()
        .all(|n| n.notification.kind != NotificationKind::Like));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_retweet_is_rejected() {
    let pool = pool().await;
    let content = ContentService::new(pool.clone());
    let author = new_user(&pool).await;
    let resharer = new_user(&pool).await;

    let post = content.create_post(author, "original", vec![]).await.unwrap();

    content.retweet(resharer, post.id).await.unwrap();
    let err = content.retweet(resharer, post.id).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateAction(_)));

    let view = content.get_post(post.id).await.unwrap();
    assert_eq!(
        view.retweet_users.iter().filter(|&&u| u == resharer).count(),
        1
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn empty_post_without_images_is_rejected() {
    let pool = pool().await;
    let author = new_user(&pool).await;
    let err = ContentService::new(pool.clone())
        .create_post(author, "   ", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn first_message_lazily_creates_exactly_one_direct_chat() {
    let pool = pool().await;
    let conversations = ConversationService::new(pool.clone());
    let a = new_user(&pool).await;
    let b = new_user(&pool).await;

    let first = conversations.send_to_target(a, b, "hi").await.unwrap();
    let second = conversations.send_to_target(a, b, "again").await.unwrap();
    assert_eq!(first.chat_id, second.chat_id);

    // Sender is always in the read set.
    assert!(first.read_by.contains(&a));

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chats
         WHERE NOT is_group AND user_a = LEAST($1, $2) AND user_b = GREATEST($1, $2)",
    )
    .bind(a)
    .bind(b)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn get_chat_marks_messages_read_and_unread_shrinks() {
    let pool = pool().await;
    let conversations = ConversationService::new(pool.clone());
    let read_state = ReadStateService::new(pool.clone());
    let a = new_user(&pool).await;
    let b = new_user(&pool).await;

    let message = conversations.send_to_target(a, b, "ping").await.unwrap();
    let chat_id = message.chat_id;

    let before = read_state.unread_messages(b).await.unwrap();
    assert!(before.messages.iter().any(|m| m.id == message.id));

    let chat = conversations.get_chat(b, chat_id).await.unwrap();
    assert!(chat.last_message.unwrap().read_by.contains(&b));

    let after = read_state.unread_messages(b).await.unwrap();
    assert!(after.messages.iter().all(|m| m.chat_id != chat_id));
    assert!(after.count <= before.count);

    // Outsiders can't tell the chat exists.
    let outsider = new_user(&pool).await;
    let err = conversations.get_chat(outsider, chat_id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn failed_add_users_batch_changes_nothing() {
    let pool = pool().await;
    let conversations = ConversationService::new(pool.clone());
    let a = new_user(&pool).await;
    let b = new_user(&pool).await;
    let c = new_user(&pool).await;

    let chat = conversations
        .create_group_chat(a, vec![b], Some("team".into()))
        .await
        .unwrap();

    // C is valid but B is already a member: the whole batch fails.
    let err = conversations
        .add_users(a, chat.id, vec![c, b])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let members: Vec<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM chat_members WHERE chat_id = $1")
            .bind(chat.id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(members.len(), 2);
    assert!(!members.contains(&c));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn message_fanout_reaches_everyone_but_the_sender() {
    let pool = pool().await;
    let conversations = ConversationService::new(pool.clone());
    let read_state = ReadStateService::new(pool.clone());
    let a = new_user(&pool).await;
    let b = new_user(&pool).await;
    let c = new_user(&pool).await;

    let chat = conversations
        .create_group_chat(a, vec![b, c], None)
        .await
        .unwrap();
    conversations.send_message(a, chat.id, "hello").await.unwrap();

    for member in [b, c] {
        let unread = read_state.unread_notifications(member).await.unwrap();
        assert!(unread
            .iter()
            .any(|n| n.notification.kind == NotificationKind::NewMessage
                && n.notification.from_user == a));
    }

    let own = read_state.unread_notifications(a).await.unwrap();
    assert!(own
        .iter()
        .all(|n| n.notification.kind != NotificationKind::NewMessage
            || n.notification.from_user != a));
}

use actix_web::web;
use serde::Serialize;

pub mod chats;
pub mod notifications;
pub mod posts;
pub mod users;

/// Wire shape of every success response: `{ "data": ... }`
#[derive(Debug, Serialize)]
pub struct Data<T: Serialize> {
    pub data: T,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Fixed paths are registered ahead of their `{id}` siblings.
    cfg.service(users::register)
        .service(users::login)
        .service(users::me)
        .service(users::newsfeed)
        .service(users::search)
        .service(users::profile)
        .service(users::follow)
        .service(posts::new_post)
        .service(posts::search)
        .service(posts::like)
        .service(posts::comment)
        .service(posts::retweet)
        .service(posts::delete_post)
        .service(chats::new_chat)
        .service(chats::inbox)
        .service(chats::unread_messages)
        .service(chats::send_message)
        .service(chats::get_chat)
        .service(chats::add_users)
        .service(chats::last_message)
        .service(chats::leave_chat)
        .service(chats::update_title)
        .service(chats::delete_message)
        .service(notifications::unread)
        .service(notifications::open);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_wraps_payload_under_data() {
        let body = serde_json::to_value(Data { data: vec![1, 2, 3] }).unwrap();
        assert_eq!(body, serde_json::json!({ "data": [1, 2, 3] }));
    }
}

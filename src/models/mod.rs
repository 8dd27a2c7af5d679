pub mod chat;
pub mod message;
pub mod notification;
pub mod post;
pub mod user;

pub use chat::{Chat, ChatView};
pub use message::MessageView;
pub use notification::{Notification, NotificationKind, NotificationRef, ResolvedNotification};
pub use post::PostView;
pub use user::{ProfileWithEdges, UserAccount, UserProfile};

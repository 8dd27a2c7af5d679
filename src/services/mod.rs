pub mod content;
pub mod conversation;
pub mod identity;
pub mod notifications;
pub mod read_state;
pub mod social_graph;

pub use content::ContentService;
pub use conversation::ConversationService;
pub use identity::IdentityService;
pub use notifications::NotificationWriter;
pub use read_state::ReadStateService;
pub use social_graph::SocialGraphService;

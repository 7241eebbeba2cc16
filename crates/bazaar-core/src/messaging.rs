//! Direct messages and channel chat.

use chrono::Utc;
use uuid::Uuid;

use bazaar_types::models::{ChatMessage, Message, MessageKind};

use crate::capability::{self, Action};
use crate::error::{MarketError, Result};
use crate::Marketplace;

impl Marketplace {
    /// Appends a new unread message. Plain chat is open to everyone;
    /// typed kinds (info, warning, system, notification) are staff-issued.
    pub fn send_message(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        content: &str,
        kind: MessageKind,
    ) -> Result<Message> {
        let sender = self.require_user(from_id)?;
        self.require_user(to_id)?;
        if content.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("content"));
        }
        if kind != MessageKind::Chat && !capability::allows(sender.role, Action::SendTypedMessage) {
            return Err(MarketError::AccessDenied);
        }

        let message = Message {
            id: Uuid::new_v4(),
            from_id,
            to_id,
            content: content.to_string(),
            kind,
            read: false,
            created_at: Utc::now(),
        };
        self.db.insert_message(&message)?;
        Ok(message)
    }

    /// Messages addressed to the user, newest first.
    pub fn inbox(&self, user_id: Uuid) -> Result<Vec<Message>> {
        Ok(self.db.inbox(user_id)?)
    }

    /// Idempotent: a message reads as `read` after the first call and
    /// marking it again changes nothing.
    pub fn mark_read(&self, message_id: Uuid) -> Result<()> {
        if !self.db.mark_read(message_id)? {
            return Err(MarketError::NotFound("message"));
        }
        Ok(())
    }

    pub fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self.db.unread_count(user_id)?)
    }

    /// Appends to the channel's broadcast log. Channels are free-form
    /// names; no size cap.
    pub fn post_chat(&self, user_id: Uuid, channel: &str, content: &str) -> Result<ChatMessage> {
        self.require_user(user_id)?;
        if content.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("content"));
        }
        if channel.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("channel"));
        }

        let message = ChatMessage {
            id: Uuid::new_v4(),
            user_id,
            content: content.to_string(),
            channel: channel.to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_chat_message(&message)?;
        Ok(message)
    }

    /// The channel's log, oldest first.
    pub fn channel_log(&self, channel: &str) -> Result<Vec<ChatMessage>> {
        Ok(self.db.channel_log(channel)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_db::OWNER_USER_ID;
    use bazaar_types::api::RegisterRequest;
    use bazaar_types::models::Role;

    fn user(store: &mut Marketplace, name: &str) -> Uuid {
        let req = RegisterRequest {
            username: name.to_string(),
            email: format!("{name}@x.com"),
            password: "pw123456".to_string(),
            confirm_password: "pw123456".to_string(),
            role: Role::User,
        };
        let code = store.request_register_otp(&req).unwrap();
        store.register(req, &code).unwrap().id
    }

    #[test]
    fn messages_arrive_unread_and_mark_read_is_idempotent() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");
        let b = user(&mut store, "b");

        let sent = store.send_message(a, b, "hi there", MessageKind::Chat).unwrap();
        assert!(!sent.read);
        assert_eq!(store.unread_count(b).unwrap(), 1);

        store.mark_read(sent.id).unwrap();
        store.mark_read(sent.id).unwrap();
        assert!(store.inbox(b).unwrap()[0].read);
        assert_eq!(store.unread_count(b).unwrap(), 0);
    }

    #[test]
    fn typed_messages_are_staff_only() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");
        let b = user(&mut store, "b");

        assert!(matches!(
            store.send_message(a, b, "be warned", MessageKind::Warning),
            Err(MarketError::AccessDenied)
        ));
        store
            .send_message(OWNER_USER_ID, b, "be warned", MessageKind::Warning)
            .unwrap();
    }

    #[test]
    fn inbox_is_newest_first() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");
        let b = user(&mut store, "b");

        store.send_message(a, b, "first", MessageKind::Chat).unwrap();
        store.send_message(a, b, "second", MessageKind::Chat).unwrap();

        let inbox = store.inbox(b).unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox[0].created_at >= inbox[1].created_at);
    }

    #[test]
    fn channel_logs_are_ordered_and_separate() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");

        store.post_chat(a, "general", "hello").unwrap();
        store.post_chat(a, "general", "again").unwrap();
        store.post_chat(a, "off-topic", "elsewhere").unwrap();

        let general = store.channel_log("general").unwrap();
        assert_eq!(general.len(), 2);
        assert_eq!(general[0].content, "hello");
        assert_eq!(store.channel_log("off-topic").unwrap().len(), 1);
        assert!(store.channel_log("showcase").unwrap().is_empty());
    }

    #[test]
    fn empty_content_is_rejected() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");
        let b = user(&mut store, "b");

        assert!(matches!(
            store.send_message(a, b, "   ", MessageKind::Chat),
            Err(MarketError::MissingRequiredField("content"))
        ));
        assert!(matches!(
            store.post_chat(a, "general", ""),
            Err(MarketError::MissingRequiredField("content"))
        ));
    }
}

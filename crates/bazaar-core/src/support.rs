//! Support tickets: open conversations between a user and a staff member
//! or creator.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use bazaar_types::models::{SupportTicket, TicketStatus};

use crate::capability::{self, Action};
use crate::error::{MarketError, Result};
use crate::Marketplace;

impl Marketplace {
    /// Opens a ticket toward the target, or returns the existing open
    /// ticket between the same pair instead of creating a duplicate.
    pub fn open_ticket(&self, user_id: Uuid, target_id: Uuid, subject: &str) -> Result<SupportTicket> {
        self.require_user(user_id)?;
        self.require_user(target_id)?;
        if subject.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("subject"));
        }

        if let Some(existing) = self.db.find_open_ticket(user_id, target_id)? {
            return Ok(existing);
        }

        let ticket = SupportTicket {
            id: Uuid::new_v4(),
            user_id,
            target_id,
            subject: subject.to_string(),
            status: TicketStatus::Open,
            messages: vec![],
            created_at: Utc::now(),
        };
        self.db.insert_ticket(&ticket)?;
        info!(subject = %ticket.subject, "support ticket opened");
        Ok(ticket)
    }

    /// Appends to the ticket conversation. Only participants (or staff)
    /// may post, and only while the ticket is open.
    pub fn post_to_ticket(&self, user_id: Uuid, ticket_id: Uuid, content: &str) -> Result<SupportTicket> {
        let sender = self.require_user(user_id)?;
        let ticket = self.require_ticket(ticket_id)?;
        if content.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("content"));
        }
        let participant = user_id == ticket.user_id || user_id == ticket.target_id;
        if !participant && !capability::allows(sender.role, Action::ManageAnyTicket) {
            return Err(MarketError::AccessDenied);
        }
        if ticket.status != TicketStatus::Open {
            return Err(MarketError::TicketClosed);
        }

        self.db
            .append_ticket_message(ticket_id, user_id, content, Utc::now())?;
        self.require_ticket(ticket_id)
    }

    /// Marks an open ticket resolved. Terminal; there is no re-open.
    pub fn resolve_ticket(&self, actor_id: Uuid, ticket_id: Uuid) -> Result<SupportTicket> {
        self.transition_ticket(actor_id, ticket_id, TicketStatus::Resolved)
    }

    /// Closes an open ticket. Terminal; there is no re-open.
    pub fn close_ticket(&self, actor_id: Uuid, ticket_id: Uuid) -> Result<SupportTicket> {
        self.transition_ticket(actor_id, ticket_id, TicketStatus::Closed)
    }

    fn transition_ticket(
        &self,
        actor_id: Uuid,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket> {
        let actor = self.require_user(actor_id)?;
        let ticket = self.require_ticket(ticket_id)?;
        let participant = actor_id == ticket.user_id || actor_id == ticket.target_id;
        if !participant && !capability::allows(actor.role, Action::ManageAnyTicket) {
            return Err(MarketError::AccessDenied);
        }
        if ticket.status != TicketStatus::Open {
            return Err(MarketError::TicketClosed);
        }

        self.db.set_ticket_status(ticket_id, status)?;
        info!(subject = %ticket.subject, status = status.as_str(), "ticket transitioned");
        self.require_ticket(ticket_id)
    }

    /// Tickets the user participates in, as opener or target.
    pub fn tickets_for(&self, user_id: Uuid) -> Result<Vec<SupportTicket>> {
        Ok(self.db.tickets_for_user(user_id)?)
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
    fn open_ticket_reuses_the_existing_open_one() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");

        let first = store.open_ticket(a, OWNER_USER_ID, "Need help").unwrap();
        let second = store.open_ticket(a, OWNER_USER_ID, "Different subject").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.subject, "Need help");

        store.close_ticket(a, first.id).unwrap();
        let third = store.open_ticket(a, OWNER_USER_ID, "New issue").unwrap();
        assert_ne!(first.id, third.id);
    }

    #[test]
    fn conversation_appends_while_open_only() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");

        let ticket = store.open_ticket(a, OWNER_USER_ID, "Need help").unwrap();
        let after = store.post_to_ticket(a, ticket.id, "first message").unwrap();
        let after = store
            .post_to_ticket(OWNER_USER_ID, after.id, "staff reply")
            .unwrap();
        assert_eq!(after.messages.len(), 2);
        assert_eq!(after.messages[0].content, "first message");

        store.resolve_ticket(OWNER_USER_ID, ticket.id).unwrap();
        assert!(matches!(
            store.post_to_ticket(a, ticket.id, "too late"),
            Err(MarketError::TicketClosed)
        ));
    }

    #[test]
    fn outsiders_cannot_touch_a_ticket() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");
        let b = user(&mut store, "b");
        let stranger = user(&mut store, "stranger");

        let ticket = store.open_ticket(a, b, "Between us").unwrap();
        assert!(matches!(
            store.post_to_ticket(stranger, ticket.id, "hello"),
            Err(MarketError::AccessDenied)
        ));
        assert!(matches!(
            store.close_ticket(stranger, ticket.id),
            Err(MarketError::AccessDenied)
        ));

        // staff may step in
        store
            .post_to_ticket(OWNER_USER_ID, ticket.id, "moderating")
            .unwrap();
    }

    #[test]
    fn resolved_tickets_cannot_transition_again() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");

        let ticket = store.open_ticket(a, OWNER_USER_ID, "Need help").unwrap();
        let resolved = store.resolve_ticket(a, ticket.id).unwrap();
        assert_eq!(resolved.status, TicketStatus::Resolved);

        assert!(matches!(
            store.close_ticket(a, ticket.id),
            Err(MarketError::TicketClosed)
        ));
    }

    #[test]
    fn tickets_for_lists_both_directions() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");
        let b = user(&mut store, "b");

        store.open_ticket(a, b, "From a").unwrap();
        store.open_ticket(b, a, "From b").unwrap();

        assert_eq!(store.tickets_for(a).unwrap().len(), 2);
        assert_eq!(store.tickets_for(b).unwrap().len(), 2);
        assert!(store.tickets_for(OWNER_USER_ID).unwrap().is_empty());
    }
}

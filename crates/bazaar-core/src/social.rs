//! The follow graph, user tags, and admin account provisioning.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use bazaar_db::TAG_ADMIN;
use bazaar_types::models::{Role, Tag, User, UserProfile};

use crate::capability::{self, Action};
use crate::error::{MarketError, Result};
use crate::Marketplace;

impl Marketplace {
    /// Adds the follow edge; both the follower's `following` and the
    /// target's `followers` views reflect it. Idempotent.
    pub fn follow(&self, follower_id: Uuid, target_id: Uuid) -> Result<()> {
        if follower_id == target_id {
            return Err(MarketError::AccessDenied);
        }
        self.require_user(follower_id)?;
        self.require_user(target_id)?;
        self.db.add_follow(follower_id, target_id)?;
        Ok(())
    }

    pub fn unfollow(&self, follower_id: Uuid, target_id: Uuid) -> Result<()> {
        self.require_user(follower_id)?;
        self.require_user(target_id)?;
        self.db.remove_follow(follower_id, target_id)?;
        Ok(())
    }

    pub fn create_tag(
        &self,
        actor_id: Uuid,
        name: &str,
        color: &str,
        text_color: &str,
        icon: Option<&str>,
    ) -> Result<Tag> {
        let actor = self.require_user(actor_id)?;
        if !capability::allows(actor.role, Action::ManageTags) {
            return Err(MarketError::AccessDenied);
        }
        if name.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("name"));
        }

        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: color.to_string(),
            text_color: text_color.to_string(),
            icon: icon.map(str::to_string),
            created_by: actor_id,
        };
        self.db.insert_tag(&tag)?;
        info!(name = %tag.name, "tag created");
        Ok(tag)
    }

    pub fn delete_tag(&self, actor_id: Uuid, tag_id: Uuid) -> Result<()> {
        let actor = self.require_user(actor_id)?;
        if !capability::allows(actor.role, Action::ManageTags) {
            return Err(MarketError::AccessDenied);
        }
        if !self.db.delete_tag(tag_id)? {
            return Err(MarketError::NotFound("tag"));
        }
        Ok(())
    }

    /// Toggle a tag on a user: assigns when absent, removes when present.
    /// Returns true when the tag ended up assigned.
    pub fn assign_tag(&self, actor_id: Uuid, user_id: Uuid, tag_id: Uuid) -> Result<bool> {
        let actor = self.require_user(actor_id)?;
        if !capability::allows(actor.role, Action::ManageTags) {
            return Err(MarketError::AccessDenied);
        }
        self.require_user(user_id)?;
        self.db
            .get_tag(tag_id)?
            .ok_or(MarketError::NotFound("tag"))?;

        Ok(self.db.toggle_user_tag(user_id, tag_id)?)
    }

    /// Owner-only: provision an admin account. Admins start offline with
    /// the ADMIN tag and sign in themselves later.
    pub fn create_admin(
        &self,
        actor_id: Uuid,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        let actor = self.require_user(actor_id)?;
        if !capability::allows(actor.role, Action::CreateAdmin) {
            return Err(MarketError::AccessDenied);
        }
        if username.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("username"));
        }
        if email.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("email"));
        }
        if password.len() < 6 {
            return Err(MarketError::WeakPassword);
        }
        if self.db.get_user_by_username(username)?.is_some() {
            return Err(MarketError::DuplicateUsername);
        }
        if self.db.get_user_by_email(email)?.is_some() {
            return Err(MarketError::DuplicateEmail);
        }

        let now = Utc::now();
        let admin = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Admin,
            profile: UserProfile {
                display_name: username.to_string(),
                ..UserProfile::default()
            },
            tags: vec![TAG_ADMIN],
            following: vec![],
            followers: vec![],
            purchased_assets: vec![],
            balance: 0.0,
            join_date: now,
            last_seen: now,
            is_online: false,
            blacklisted_by: vec![],
            customer_of: vec![],
        };
        self.db.create_user(&admin)?;

        info!(username = %admin.username, "admin account created");
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_db::{OWNER_USER_ID, TAG_COMMUNITY};
    use bazaar_types::api::RegisterRequest;

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
    fn follow_round_trip_restores_both_sides() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");
        let b = user(&mut store, "b");

        store.follow(a, b).unwrap();
        assert_eq!(store.user(a).unwrap().following, vec![b]);
        assert_eq!(store.user(b).unwrap().followers, vec![a]);

        store.unfollow(a, b).unwrap();
        assert!(store.user(a).unwrap().following.is_empty());
        assert!(store.user(b).unwrap().followers.is_empty());
    }

    #[test]
    fn self_follow_is_rejected() {
        let mut store = Marketplace::open().unwrap();
        let a = user(&mut store, "a");
        assert!(matches!(store.follow(a, a), Err(MarketError::AccessDenied)));
    }

    #[test]
    fn tag_toggle_twice_restores_original_set() {
        let mut store = Marketplace::open().unwrap();
        let target = user(&mut store, "target");
        let before = store.user(target).unwrap().tags;

        assert!(store.assign_tag(OWNER_USER_ID, target, TAG_COMMUNITY).unwrap());
        assert!(!store.assign_tag(OWNER_USER_ID, target, TAG_COMMUNITY).unwrap());
        assert_eq!(store.user(target).unwrap().tags, before);
    }

    #[test]
    fn tag_management_is_admin_gated() {
        let mut store = Marketplace::open().unwrap();
        let nobody = user(&mut store, "nobody");
        let target = user(&mut store, "target");

        assert!(matches!(
            store.assign_tag(nobody, target, TAG_COMMUNITY),
            Err(MarketError::AccessDenied)
        ));
        assert!(matches!(
            store.create_tag(nobody, "VIP", "#fff", "#000", None),
            Err(MarketError::AccessDenied)
        ));
    }

    #[test]
    fn created_tags_can_be_assigned_and_deleted() {
        let mut store = Marketplace::open().unwrap();
        let target = user(&mut store, "target");

        let tag = store
            .create_tag(OWNER_USER_ID, "VIP", "#ffffff", "#000000", Some("star"))
            .unwrap();
        assert!(store.assign_tag(OWNER_USER_ID, target, tag.id).unwrap());

        store.delete_tag(OWNER_USER_ID, tag.id).unwrap();
        assert!(!store.user(target).unwrap().tags.contains(&tag.id));
        assert!(matches!(
            store.delete_tag(OWNER_USER_ID, tag.id),
            Err(MarketError::NotFound("tag"))
        ));
    }

    #[test]
    fn admins_are_provisioned_by_the_owner_only() {
        let mut store = Marketplace::open().unwrap();
        let nobody = user(&mut store, "nobody");

        assert!(matches!(
            store.create_admin(nobody, "mod", "mod@x.com", "pw123456"),
            Err(MarketError::AccessDenied)
        ));

        let admin = store
            .create_admin(OWNER_USER_ID, "mod", "mod@x.com", "pw123456")
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.tags, vec![TAG_ADMIN]);
        assert!(!admin.is_online);

        // admins can moderate but not mint further admins
        assert!(matches!(
            store.create_admin(admin.id, "mod2", "mod2@x.com", "pw123456"),
            Err(MarketError::AccessDenied)
        ));
    }
}

//! Account lifecycle: registration, login, password flows, profile edits.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use bazaar_db::TAG_NEW_MEMBER;
use bazaar_types::api::RegisterRequest;
use bazaar_types::models::{Role, User, UserProfile};

use crate::error::{MarketError, Result};
use crate::otp::OtpPurpose;
use crate::Marketplace;

const MIN_PASSWORD_LEN: usize = 6;

impl Marketplace {
    /// First registration step: validate the form and issue a verification
    /// code for the email address.
    pub fn request_register_otp(&mut self, req: &RegisterRequest) -> Result<String> {
        self.validate_registration(req)?;
        Ok(self.issue_otp_at(OtpPurpose::Register, &req.email, Utc::now()))
    }

    /// Second step: re-validate, check the code, create the account and make
    /// it the session user. New accounts start with zero balance, a default
    /// profile, and the "New Member" tag.
    pub fn register(&mut self, req: RegisterRequest, otp: &str) -> Result<User> {
        self.register_at(req, otp, Utc::now())
    }

    pub(crate) fn register_at(
        &mut self,
        req: RegisterRequest,
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<User> {
        self.validate_registration(&req)?;
        self.verify_otp_at(OtpPurpose::Register, otp, now)?;

        let user = User {
            id: Uuid::new_v4(),
            username: req.username.clone(),
            email: req.email,
            password: req.password,
            role: req.role,
            profile: UserProfile {
                display_name: req.username,
                ..UserProfile::default()
            },
            tags: vec![TAG_NEW_MEMBER],
            following: vec![],
            followers: vec![],
            purchased_assets: vec![],
            balance: 0.0,
            join_date: now,
            last_seen: now,
            is_online: true,
            blacklisted_by: vec![],
            customer_of: vec![],
        };
        self.db.create_user(&user)?;
        self.session = Some(user.id);

        info!(username = %user.username, role = user.role.as_str(), "account created");
        Ok(user)
    }

    fn validate_registration(&self, req: &RegisterRequest) -> Result<()> {
        if req.username.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("username"));
        }
        if req.email.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("email"));
        }
        if req.password.is_empty() {
            return Err(MarketError::MissingRequiredField("password"));
        }
        if req.password != req.confirm_password {
            return Err(MarketError::PasswordMismatch);
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(MarketError::WeakPassword);
        }
        // Admin and owner accounts are provisioned, never self-registered.
        if !matches!(req.role, Role::User | Role::Creator) {
            return Err(MarketError::AccessDenied);
        }
        if self.db.get_user_by_username(&req.username)?.is_some() {
            return Err(MarketError::DuplicateUsername);
        }
        if self.db.get_user_by_email(&req.email)?.is_some() {
            return Err(MarketError::DuplicateEmail);
        }
        Ok(())
    }

    /// The identifier may be a username or an email address; both it and
    /// the password are matched exactly, case-sensitive.
    pub fn login(&mut self, identifier: &str, password: &str) -> Result<User> {
        let user = self
            .db
            .get_user_by_identifier(identifier)?
            .ok_or(MarketError::InvalidCredentials)?;
        if user.password != password {
            return Err(MarketError::InvalidCredentials);
        }

        self.db.set_online(user.id, true, Utc::now())?;
        self.session = Some(user.id);

        info!(username = %user.username, "signed in");
        self.require_user(user.id)
    }

    /// Clears the session user. `is_online` intentionally stays set until
    /// the next login refreshes it; nothing observes the flag in between.
    pub fn logout(&mut self) {
        self.session = None;
    }

    pub fn request_reset_otp(&mut self, email: &str) -> Result<String> {
        if self.db.get_user_by_email(email)?.is_none() {
            return Err(MarketError::EmailNotFound);
        }
        Ok(self.issue_otp_at(OtpPurpose::PasswordReset, email, Utc::now()))
    }

    /// Overwrites the password for the account matching `email` once the
    /// code checks out.
    pub fn reset_password(&mut self, email: &str, otp: &str, new_password: &str) -> Result<()> {
        let user = self
            .db
            .get_user_by_email(email)?
            .ok_or(MarketError::EmailNotFound)?;
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(MarketError::WeakPassword);
        }
        self.verify_otp_at(OtpPurpose::PasswordReset, otp, Utc::now())?;

        self.db.update_password(user.id, new_password)?;
        info!(username = %user.username, "password reset");
        Ok(())
    }

    pub fn change_password(&self, user_id: Uuid, current: &str, new_password: &str) -> Result<()> {
        let user = self.require_user(user_id)?;
        if user.password != current {
            return Err(MarketError::InvalidCredentials);
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(MarketError::WeakPassword);
        }
        self.db.update_password(user_id, new_password)?;
        Ok(())
    }

    pub fn update_profile(&self, user_id: Uuid, profile: UserProfile) -> Result<User> {
        self.require_user(user_id)?;
        self.db.update_profile(user_id, &profile)?;
        self.require_user(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "pw123456".to_string(),
            confirm_password: "pw123456".to_string(),
            role: Role::User,
        }
    }

    fn register(store: &mut Marketplace, username: &str, email: &str) -> User {
        let req = request(username, email);
        let code = store.request_register_otp(&req).unwrap();
        store.register(req, &code).unwrap()
    }

    #[test]
    fn register_creates_session_user_with_defaults() {
        let mut store = Marketplace::open().unwrap();
        let user = register(&mut store, "mira", "mira@x.com");

        assert_eq!(store.session_user(), Some(user.id));
        assert_eq!(user.balance, 0.0);
        assert_eq!(user.tags, vec![TAG_NEW_MEMBER]);
        assert_eq!(user.profile.display_name, "mira");
        assert!(user.is_online);
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut store = Marketplace::open().unwrap();
        register(&mut store, "mira", "mira@x.com");

        let err = store
            .request_register_otp(&request("mira", "other@x.com"))
            .unwrap_err();
        assert!(matches!(err, MarketError::DuplicateUsername));

        let err = store
            .request_register_otp(&request("other", "mira@x.com"))
            .unwrap_err();
        assert!(matches!(err, MarketError::DuplicateEmail));
    }

    #[test]
    fn register_validates_password() {
        let mut store = Marketplace::open().unwrap();

        let mut req = request("mira", "mira@x.com");
        req.confirm_password = "different".to_string();
        assert!(matches!(
            store.request_register_otp(&req),
            Err(MarketError::PasswordMismatch)
        ));

        let mut req = request("mira", "mira@x.com");
        req.password = "short".to_string();
        req.confirm_password = "short".to_string();
        assert!(matches!(
            store.request_register_otp(&req),
            Err(MarketError::WeakPassword)
        ));
    }

    #[test]
    fn register_rejects_privileged_roles() {
        let mut store = Marketplace::open().unwrap();
        let mut req = request("mira", "mira@x.com");
        req.role = Role::Admin;
        assert!(matches!(
            store.request_register_otp(&req),
            Err(MarketError::AccessDenied)
        ));
    }

    #[test]
    fn register_requires_the_issued_code() {
        let mut store = Marketplace::open().unwrap();
        let req = request("mira", "mira@x.com");
        store.request_register_otp(&req).unwrap();

        let err = store.register(req, "not-the-code").unwrap_err();
        assert!(matches!(err, MarketError::InvalidOtp));
        assert!(store.session_user().is_none());
    }

    #[test]
    fn login_by_username_or_email_sets_presence() {
        let mut store = Marketplace::open().unwrap();
        let user = register(&mut store, "mira", "mira@x.com");
        store.logout();

        let by_name = store.login("mira", "pw123456").unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(by_name.is_online);
        store.logout();

        let by_email = store.login("mira@x.com", "pw123456").unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(store.session_user(), Some(user.id));
    }

    #[test]
    fn login_rejects_bad_credentials() {
        let mut store = Marketplace::open().unwrap();
        register(&mut store, "mira", "mira@x.com");
        store.logout();

        assert!(matches!(
            store.login("mira", "wrong-password"),
            Err(MarketError::InvalidCredentials)
        ));
        assert!(matches!(
            store.login("ghost", "pw123456"),
            Err(MarketError::InvalidCredentials)
        ));
        assert!(store.session_user().is_none());
    }

    #[test]
    fn logout_clears_session_but_not_presence() {
        let mut store = Marketplace::open().unwrap();
        let user = register(&mut store, "mira", "mira@x.com");

        store.logout();
        assert!(store.session_user().is_none());
        assert!(store.user(user.id).unwrap().is_online);
    }

    #[test]
    fn reset_password_round_trip() {
        let mut store = Marketplace::open().unwrap();
        register(&mut store, "mira", "mira@x.com");
        store.logout();

        assert!(matches!(
            store.request_reset_otp("ghost@x.com"),
            Err(MarketError::EmailNotFound)
        ));

        let code = store.request_reset_otp("mira@x.com").unwrap();
        store
            .reset_password("mira@x.com", &code, "brand-new-pw")
            .unwrap();

        assert!(store.login("mira", "pw123456").is_err());
        store.login("mira", "brand-new-pw").unwrap();
    }

    #[test]
    fn change_password_verifies_current() {
        let mut store = Marketplace::open().unwrap();
        let user = register(&mut store, "mira", "mira@x.com");

        assert!(matches!(
            store.change_password(user.id, "wrong", "new-password"),
            Err(MarketError::InvalidCredentials)
        ));
        store
            .change_password(user.id, "pw123456", "new-password")
            .unwrap();
        assert_eq!(store.user(user.id).unwrap().password, "new-password");
    }

    #[test]
    fn update_profile_replaces_the_whole_profile() {
        let mut store = Marketplace::open().unwrap();
        let user = register(&mut store, "mira", "mira@x.com");

        let profile = UserProfile {
            display_name: "Mira".to_string(),
            bio: "3D artist".to_string(),
            ..UserProfile::default()
        };
        let updated = store.update_profile(user.id, profile).unwrap();
        assert_eq!(updated.profile.bio, "3D artist");
    }
}

//! Account rows and the id-relation tables hydrated into [`User`].

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use bazaar_types::models::{Role, User, UserProfile};

use crate::{Database, col_enum, col_json, col_ts, col_uuid};

impl Database {
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO users
                     (id, username, email, password, role, profile, balance, join_date, last_seen, is_online)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    user.password,
                    user.role.as_str(),
                    serde_json::to_string(&user.profile)?,
                    user.balance,
                    user.join_date.to_rfc3339(),
                    user.last_seen.to_rfc3339(),
                    user.is_online,
                ],
            )?;
            for tag_id in &user.tags {
                tx.execute(
                    "INSERT OR IGNORE INTO user_tags (user_id, tag_id) VALUES (?1, ?2)",
                    params![user.id.to_string(), tag_id.to_string()],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, username, email, password, role, profile, balance, join_date, last_seen, is_online FROM users WHERE id = ?1", &id.to_string())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "SELECT id, username, email, password, role, profile, balance, join_date, last_seen, is_online FROM users WHERE username = ?1", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "SELECT id, username, email, password, role, profile, balance, join_date, last_seen, is_online FROM users WHERE email = ?1", email))
    }

    /// Login lookup: the identifier may be a username or an email address.
    pub fn get_user_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT id, username, email, password, role, profile, balance, join_date, last_seen, is_online FROM users WHERE username = ?1 OR email = ?1",
                identifier,
            )
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM users ORDER BY join_date ASC")?;
            let ids = stmt
                .query_map([], |row| col_uuid(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut users = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(user) =
                    query_user(conn, "SELECT id, username, email, password, role, profile, balance, join_date, last_seen, is_online FROM users WHERE id = ?1", &id.to_string())?
                {
                    users.push(user);
                }
            }
            Ok(users)
        })
    }

    pub fn update_password(&self, id: Uuid, password: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password = ?2 WHERE id = ?1",
                params![id.to_string(), password],
            )?;
            Ok(())
        })
    }

    pub fn update_profile(&self, id: Uuid, profile: &UserProfile) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET profile = ?2 WHERE id = ?1",
                params![id.to_string(), serde_json::to_string(profile)?],
            )?;
            Ok(())
        })
    }

    pub fn set_online(&self, id: Uuid, online: bool, last_seen: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET is_online = ?2, last_seen = ?3 WHERE id = ?1",
                params![id.to_string(), online, last_seen.to_rfc3339()],
            )?;
            Ok(())
        })
    }

    // -- Social graph --

    /// Records the follow edge. One row carries both directions, so the
    /// following/followers symmetry cannot drift.
    pub fn add_follow(&self, follower: Uuid, followed: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                params![follower.to_string(), followed.to_string()],
            )?;
            Ok(())
        })
    }

    pub fn remove_follow(&self, follower: Uuid, followed: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                params![follower.to_string(), followed.to_string()],
            )?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, sql: &str, param: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(sql)?;

    let base = stmt
        .query_row([param], |row| {
            Ok(UserBase {
                id: col_uuid(row, 0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                role: col_enum(row, 4, Role::parse, "role")?,
                profile: col_json(row, 5)?,
                balance: row.get(6)?,
                join_date: col_ts(row, 7)?,
                last_seen: col_ts(row, 8)?,
                is_online: row.get(9)?,
            })
        })
        .optional()?;

    let Some(base) = base else {
        return Ok(None);
    };
    let id = base.id.to_string();

    Ok(Some(User {
        id: base.id,
        username: base.username,
        email: base.email,
        password: base.password,
        role: base.role,
        profile: base.profile,
        tags: id_list(
            conn,
            "SELECT tag_id FROM user_tags WHERE user_id = ?1",
            &id,
        )?,
        following: id_list(
            conn,
            "SELECT followed_id FROM follows WHERE follower_id = ?1",
            &id,
        )?,
        followers: id_list(
            conn,
            "SELECT follower_id FROM follows WHERE followed_id = ?1",
            &id,
        )?,
        purchased_assets: id_list(
            conn,
            "SELECT asset_id FROM purchases WHERE user_id = ?1",
            &id,
        )?,
        balance: base.balance,
        join_date: base.join_date,
        last_seen: base.last_seen,
        is_online: base.is_online,
        blacklisted_by: id_list(
            conn,
            "SELECT by_user_id FROM blacklists WHERE user_id = ?1",
            &id,
        )?,
        customer_of: id_list(
            conn,
            "SELECT creator_id FROM customer_of WHERE user_id = ?1",
            &id,
        )?,
    }))
}

struct UserBase {
    id: Uuid,
    username: String,
    email: String,
    password: String,
    role: Role,
    profile: UserProfile,
    balance: f64,
    join_date: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    is_online: bool,
}

fn id_list(conn: &Connection, sql: &str, id: &str) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([id], |row| col_uuid(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_types::models::Role;

    fn test_user(name: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password: "pw123456".to_string(),
            role: Role::User,
            profile: UserProfile::default(),
            tags: vec![],
            following: vec![],
            followers: vec![],
            purchased_assets: vec![],
            balance: 0.0,
            join_date: now,
            last_seen: now,
            is_online: false,
            blacklisted_by: vec![],
            customer_of: vec![],
        }
    }

    #[test]
    fn create_and_fetch_by_identifier() {
        let db = Database::open_in_memory().unwrap();
        let user = test_user("mira");
        db.create_user(&user).unwrap();

        let by_name = db.get_user_by_identifier("mira").unwrap().unwrap();
        let by_email = db.get_user_by_identifier("mira@example.com").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);
        assert!(db.get_user_by_identifier("nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_a_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&test_user("dup")).unwrap();

        let mut clone = test_user("dup");
        clone.email = "other@example.com".to_string();
        assert!(db.create_user(&clone).is_err());
    }

    #[test]
    fn follow_edges_hydrate_both_sides() {
        let db = Database::open_in_memory().unwrap();
        let a = test_user("a");
        let b = test_user("b");
        db.create_user(&a).unwrap();
        db.create_user(&b).unwrap();

        db.add_follow(a.id, b.id).unwrap();
        assert_eq!(db.get_user(a.id).unwrap().unwrap().following, vec![b.id]);
        assert_eq!(db.get_user(b.id).unwrap().unwrap().followers, vec![a.id]);

        db.remove_follow(a.id, b.id).unwrap();
        assert!(db.get_user(a.id).unwrap().unwrap().following.is_empty());
        assert!(db.get_user(b.id).unwrap().unwrap().followers.is_empty());
    }
}

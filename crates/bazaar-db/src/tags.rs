//! Tag records and the user/tag assignment relation.

use anyhow::Result;
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use bazaar_types::models::Tag;

use crate::{Database, col_uuid};

impl Database {
    pub fn insert_tag(&self, tag: &Tag) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tags (id, name, color, text_color, icon, created_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    tag.id.to_string(),
                    tag.name,
                    tag.color,
                    tag.text_color,
                    tag.icon,
                    tag.created_by.to_string(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_tag(&self, id: Uuid) -> Result<Option<Tag>> {
        self.with_conn(|conn| {
            let tag = conn
                .query_row(
                    "SELECT id, name, color, text_color, icon, created_by
                     FROM tags WHERE id = ?1",
                    [id.to_string()],
                    row_to_tag,
                )
                .optional()?;
            Ok(tag)
        })
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, color, text_color, icon, created_by FROM tags ORDER BY name ASC",
            )?;
            let tags = stmt
                .query_map([], row_to_tag)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tags)
        })
    }

    /// Deleting a tag unassigns it everywhere via FK cascade.
    pub fn delete_tag(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM tags WHERE id = ?1", [id.to_string()])?;
            Ok(affected > 0)
        })
    }

    /// Toggle a tag assignment: removes if present, assigns if not.
    /// Returns true when the tag was assigned, false when it was removed.
    pub fn toggle_user_tag(&self, user_id: Uuid, tag_id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM user_tags WHERE user_id = ?1 AND tag_id = ?2",
                    params![user_id.to_string(), tag_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                conn.execute(
                    "DELETE FROM user_tags WHERE user_id = ?1 AND tag_id = ?2",
                    params![user_id.to_string(), tag_id.to_string()],
                )?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO user_tags (user_id, tag_id) VALUES (?1, ?2)",
                    params![user_id.to_string(), tag_id.to_string()],
                )?;
                Ok(true)
            }
        })
    }
}

fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: col_uuid(row, 0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        text_color: row.get(3)?,
        icon: row.get(4)?,
        created_by: col_uuid(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OWNER_USER_ID, TAG_COMMUNITY};

    #[test]
    fn toggle_assignment_round_trips() {
        let db = Database::open_in_memory().unwrap();

        assert!(db.toggle_user_tag(OWNER_USER_ID, TAG_COMMUNITY).unwrap());
        let tags = db.get_user(OWNER_USER_ID).unwrap().unwrap().tags;
        assert!(tags.contains(&TAG_COMMUNITY));

        assert!(!db.toggle_user_tag(OWNER_USER_ID, TAG_COMMUNITY).unwrap());
        let tags = db.get_user(OWNER_USER_ID).unwrap().unwrap().tags;
        assert!(!tags.contains(&TAG_COMMUNITY));
    }

    #[test]
    fn delete_tag_unassigns_it() {
        let db = Database::open_in_memory().unwrap();
        db.toggle_user_tag(OWNER_USER_ID, TAG_COMMUNITY).unwrap();

        assert!(db.delete_tag(TAG_COMMUNITY).unwrap());
        let tags = db.get_user(OWNER_USER_ID).unwrap().unwrap().tags;
        assert!(!tags.contains(&TAG_COMMUNITY));
    }
}

//! Catalog rows, ratings, and the purchase transaction.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use bazaar_types::api::{CatalogFilter, PriceFilter, SortBy};
use bazaar_types::models::{Asset, AssetStatus, Rating};

use crate::{Database, col_enum, col_json, col_ts, col_uuid};

const ASSET_COLUMNS: &str = "id, title, description, category, tags, creator_id, price, is_free, \
     download_count, rating, rating_count, status, reject_reason, created_at, \
     file_size, thumbnail, images";

impl Database {
    pub fn insert_asset(&self, asset: &Asset) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO assets
                     (id, title, description, category, tags, creator_id, price, is_free,
                      download_count, rating, rating_count, status, reject_reason, created_at,
                      file_size, thumbnail, images)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    asset.id.to_string(),
                    asset.title,
                    asset.description,
                    asset.category,
                    serde_json::to_string(&asset.tags)?,
                    asset.creator_id.to_string(),
                    asset.price,
                    asset.is_free,
                    asset.download_count,
                    asset.rating,
                    asset.rating_count,
                    asset.status.as_str(),
                    asset.reject_reason,
                    asset.created_at.to_rfc3339(),
                    asset.file_size,
                    asset.thumbnail,
                    serde_json::to_string(&asset.images)?,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_asset(&self, id: Uuid) -> Result<Option<Asset>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let asset = stmt
                .query_row([id.to_string()], row_to_asset)
                .optional()?;

            match asset {
                Some(mut asset) => {
                    let mut ratings = ratings_for_assets(conn, &[asset.id.to_string()])?;
                    asset.ratings = ratings.remove(&asset.id.to_string()).unwrap_or_default();
                    Ok(Some(asset))
                }
                None => Ok(None),
            }
        })
    }

    /// The public catalog view: approved assets only, filtered and sorted
    /// per the caller's query. Deterministic for a given collection state.
    pub fn list_approved(&self, filter: &CatalogFilter) -> Result<Vec<Asset>> {
        let mut sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE status = 'approved'");
        let mut bind: Vec<String> = Vec::new();

        if let Some(query) = filter.query.as_deref().filter(|q| !q.is_empty()) {
            bind.push(format!("%{}%", query.to_lowercase()));
            let n = bind.len();
            sql.push_str(&format!(
                " AND (LOWER(title) LIKE ?{n} OR LOWER(description) LIKE ?{n})"
            ));
        }
        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            bind.push(category.to_string());
            sql.push_str(&format!(" AND category = ?{}", bind.len()));
        }
        match filter.price {
            PriceFilter::All => {}
            PriceFilter::Free => sql.push_str(" AND is_free = 1"),
            PriceFilter::Paid => sql.push_str(" AND is_free = 0"),
        }
        sql.push_str(match filter.sort {
            SortBy::Newest => " ORDER BY created_at DESC",
            SortBy::Popular => " ORDER BY download_count DESC",
            SortBy::Rating => " ORDER BY rating DESC",
        });

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
                bind.iter().map(|p| p as &dyn rusqlite::types::ToSql).collect();
            let assets = stmt
                .query_map(bind_refs.as_slice(), row_to_asset)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            attach_ratings(conn, assets)
        })
    }

    pub fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Asset>> {
        self.list_where("creator_id = ?1 ORDER BY created_at DESC", &creator_id.to_string())
    }

    /// The moderation queue, oldest submission first.
    pub fn list_pending(&self) -> Result<Vec<Asset>> {
        self.list_where("status = ?1 ORDER BY created_at ASC", "pending")
    }

    fn list_where(&self, clause: &str, param: &str) -> Result<Vec<Asset>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE {clause}");
            let mut stmt = conn.prepare(&sql)?;
            let assets = stmt
                .query_map([param], row_to_asset)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            attach_ratings(conn, assets)
        })
    }

    /// Upsert one user's rating and recompute the stored aggregate in the
    /// same transaction. This is the only place `rating`/`rating_count`
    /// are ever written.
    pub fn upsert_rating(
        &self,
        asset_id: Uuid,
        user_id: Uuid,
        score: u8,
        comment: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO ratings (asset_id, user_id, score, comment) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(asset_id, user_id)
                 DO UPDATE SET score = excluded.score, comment = excluded.comment",
                params![asset_id.to_string(), user_id.to_string(), score, comment],
            )?;
            tx.execute(
                "UPDATE assets SET
                     rating = COALESCE((SELECT AVG(score) FROM ratings WHERE asset_id = ?1), 0),
                     rating_count = (SELECT COUNT(*) FROM ratings WHERE asset_id = ?1)
                 WHERE id = ?1",
                params![asset_id.to_string()],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn increment_download(&self, id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE assets SET download_count = download_count + 1 WHERE id = ?1",
                [id.to_string()],
            )?;
            Ok(())
        })
    }

    pub fn set_status(
        &self,
        id: Uuid,
        status: AssetStatus,
        reject_reason: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE assets SET status = ?2, reject_reason = ?3 WHERE id = ?1",
                params![id.to_string(), status.as_str(), reject_reason],
            )?;
            Ok(())
        })
    }

    /// Removes the asset. Rating and purchase rows go with it via FK
    /// cascade; settled balances stay as they are.
    pub fn delete_asset(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM assets WHERE id = ?1", [id.to_string()])?;
            Ok(affected > 0)
        })
    }

    // -- Purchases --

    /// Applies a settled purchase in one transaction: debit the buyer,
    /// credit the creator, record the purchase and the customer edge.
    /// Amounts are decided by the caller; this only moves them.
    pub fn record_purchase(
        &self,
        buyer_id: Uuid,
        creator_id: Uuid,
        asset_id: Uuid,
        debit: f64,
        credit: f64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE users SET balance = balance - ?2 WHERE id = ?1",
                params![buyer_id.to_string(), debit],
            )?;
            tx.execute(
                "UPDATE users SET balance = balance + ?2 WHERE id = ?1",
                params![creator_id.to_string(), credit],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO purchases (user_id, asset_id) VALUES (?1, ?2)",
                params![buyer_id.to_string(), asset_id.to_string()],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO customer_of (user_id, creator_id) VALUES (?1, ?2)",
                params![buyer_id.to_string(), creator_id.to_string()],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn has_purchased(&self, user_id: Uuid, asset_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM purchases WHERE user_id = ?1 AND asset_id = ?2",
                    params![user_id.to_string(), asset_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}

fn row_to_asset(row: &rusqlite::Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: col_uuid(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        tags: col_json(row, 4)?,
        creator_id: col_uuid(row, 5)?,
        price: row.get(6)?,
        is_free: row.get(7)?,
        download_count: row.get(8)?,
        rating: row.get(9)?,
        rating_count: row.get(10)?,
        ratings: Vec::new(),
        status: col_enum(row, 11, AssetStatus::parse, "asset status")?,
        reject_reason: row.get(12)?,
        created_at: col_ts(row, 13)?,
        file_size: row.get(14)?,
        thumbnail: row.get(15)?,
        images: col_json(row, 16)?,
    })
}

fn attach_ratings(conn: &Connection, mut assets: Vec<Asset>) -> Result<Vec<Asset>> {
    let ids: Vec<String> = assets.iter().map(|a| a.id.to_string()).collect();
    let mut ratings = ratings_for_assets(conn, &ids)?;
    for asset in &mut assets {
        asset.ratings = ratings.remove(&asset.id.to_string()).unwrap_or_default();
    }
    Ok(assets)
}

/// Batch-fetch ratings for a set of asset ids and group them, so list
/// views cost two queries instead of N+1.
fn ratings_for_assets(
    conn: &Connection,
    asset_ids: &[String],
) -> Result<HashMap<String, Vec<Rating>>> {
    if asset_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=asset_ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT asset_id, user_id, score, comment FROM ratings WHERE asset_id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let bind: Vec<&dyn rusqlite::types::ToSql> = asset_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut grouped: HashMap<String, Vec<Rating>> = HashMap::new();
    let rows = stmt.query_map(bind.as_slice(), |row| {
        let asset_id: String = row.get(0)?;
        let rating = Rating {
            user_id: col_uuid(row, 1)?,
            score: row.get(2)?,
            comment: row.get(3)?,
        };
        Ok((asset_id, rating))
    })?;
    for row in rows {
        let (asset_id, rating) = row?;
        grouped.entry(asset_id).or_default().push(rating);
    }

    Ok(grouped)
}

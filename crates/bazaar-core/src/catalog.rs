//! Catalog browsing, uploads, moderation, and transactions.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use bazaar_types::api::{CatalogFilter, ModerationDecision, UploadRequest};
use bazaar_types::models::{Asset, AssetStatus, Role};

use crate::capability::{self, Action};
use crate::error::{MarketError, Result};
use crate::Marketplace;

/// Share of every paid purchase withheld by the platform. It is not
/// credited to any account.
pub const COMMISSION_RATE: f64 = 0.10;

impl Marketplace {
    /// The public catalog: approved assets only, filtered and sorted per
    /// the request.
    pub fn browse(&self, filter: &CatalogFilter) -> Result<Vec<Asset>> {
        Ok(self.db.list_approved(filter)?)
    }

    /// Everything a creator has submitted, regardless of status.
    pub fn assets_of(&self, creator_id: Uuid) -> Result<Vec<Asset>> {
        Ok(self.db.list_by_creator(creator_id)?)
    }

    /// The moderation queue.
    pub fn pending_assets(&self, actor_id: Uuid) -> Result<Vec<Asset>> {
        let actor = self.require_user(actor_id)?;
        if !capability::allows(actor.role, Action::ModerateAsset) {
            return Err(MarketError::AccessDenied);
        }
        Ok(self.db.list_pending()?)
    }

    /// Owner uploads go live immediately; everything else enters the
    /// moderation queue as `pending`.
    pub fn upload(&self, creator_id: Uuid, req: UploadRequest) -> Result<Asset> {
        let creator = self.require_user(creator_id)?;
        if !capability::allows(creator.role, Action::UploadAsset) {
            return Err(MarketError::AccessDenied);
        }
        if req.title.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("title"));
        }
        if req.description.trim().is_empty() {
            return Err(MarketError::MissingRequiredField("description"));
        }

        let status = if creator.role == Role::Owner {
            AssetStatus::Approved
        } else {
            AssetStatus::Pending
        };
        let asset = Asset {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            category: req.category,
            tags: req.tags,
            creator_id,
            // is_free wins over whatever price the form carried
            price: if req.is_free { 0.0 } else { req.price.max(0.0) },
            is_free: req.is_free,
            download_count: 0,
            rating: 0.0,
            rating_count: 0,
            ratings: vec![],
            status,
            reject_reason: None,
            created_at: Utc::now(),
            file_size: req.file_size,
            thumbnail: req.thumbnail,
            images: req.images,
        };
        self.db.insert_asset(&asset)?;

        info!(title = %asset.title, status = status.as_str(), "asset uploaded");
        Ok(asset)
    }

    /// Settle a paid purchase: debit the buyer the full price, credit the
    /// creator the price minus commission, record the purchase and the
    /// customer relation. Free assets bypass purchasing entirely.
    pub fn purchase(&self, buyer_id: Uuid, asset_id: Uuid) -> Result<()> {
        let asset = self.require_asset(asset_id)?;
        if asset.is_free {
            return Ok(());
        }

        let buyer = self.require_user(buyer_id)?;
        if buyer.balance < asset.price {
            return Err(MarketError::InsufficientBalance);
        }

        let credit = asset.price * (1.0 - COMMISSION_RATE);
        self.db
            .record_purchase(buyer_id, asset.creator_id, asset_id, asset.price, credit)?;

        info!(buyer = %buyer.username, title = %asset.title, price = asset.price, "asset purchased");
        Ok(())
    }

    /// Counts one download. Paid assets require a prior purchase.
    pub fn download(&self, user_id: Uuid, asset_id: Uuid) -> Result<()> {
        let asset = self.require_asset(asset_id)?;
        self.require_user(user_id)?;
        if !asset.is_free && !self.db.has_purchased(user_id, asset_id)? {
            return Err(MarketError::AccessDenied);
        }
        self.db.increment_download(asset_id)?;
        Ok(())
    }

    /// Upsert the user's rating for the asset and recompute the stored
    /// average and count. Returns the updated asset.
    pub fn rate(&self, user_id: Uuid, asset_id: Uuid, score: u8, comment: &str) -> Result<Asset> {
        if !(1..=5).contains(&score) {
            return Err(MarketError::InvalidScore);
        }
        self.require_user(user_id)?;
        self.require_asset(asset_id)?;

        self.db.upsert_rating(asset_id, user_id, score, comment)?;
        self.require_asset(asset_id)
    }

    /// Review a pending submission. Approved and rejected are terminal:
    /// re-moderation is not supported.
    pub fn moderate(
        &self,
        actor_id: Uuid,
        asset_id: Uuid,
        decision: ModerationDecision,
    ) -> Result<Asset> {
        let actor = self.require_user(actor_id)?;
        if !capability::allows(actor.role, Action::ModerateAsset) {
            return Err(MarketError::AccessDenied);
        }
        let asset = self.require_asset(asset_id)?;
        if asset.status != AssetStatus::Pending {
            return Err(MarketError::AlreadyModerated);
        }

        match &decision {
            ModerationDecision::Approve => {
                self.db.set_status(asset_id, AssetStatus::Approved, None)?;
            }
            ModerationDecision::Reject { reason } => {
                self.db
                    .set_status(asset_id, AssetStatus::Rejected, reason.as_deref())?;
            }
        }

        info!(title = %asset.title, ?decision, moderator = %actor.username, "submission reviewed");
        self.require_asset(asset_id)
    }

    /// Removal is open to the asset's creator and to admins. Rating and
    /// purchase rows are cleaned up with the asset.
    pub fn delete_asset(&self, actor_id: Uuid, asset_id: Uuid) -> Result<()> {
        let actor = self.require_user(actor_id)?;
        let asset = self.require_asset(asset_id)?;
        if actor.id != asset.creator_id && !capability::allows(actor.role, Action::DeleteAnyAsset) {
            return Err(MarketError::AccessDenied);
        }

        self.db.delete_asset(asset_id)?;
        info!(title = %asset.title, "asset deleted");
        Ok(())
    }
}

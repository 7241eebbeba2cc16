//! Sample catalog used by the demo walkthrough.

use anyhow::Result;

use bazaar_core::Marketplace;
use bazaar_db::OWNER_USER_ID;
use bazaar_types::api::UploadRequest;

struct SampleAsset {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    tags: &'static [&'static str],
    price: f64,
    file_size: &'static str,
}

const SAMPLE_ASSETS: &[SampleAsset] = &[
    SampleAsset {
        title: "Low Poly City Pack",
        description: "Complete low poly city environment with buildings, roads, vehicles, and props.",
        category: "Environment",
        tags: &["low-poly", "city", "buildings"],
        price: 0.0,
        file_size: "12.5 MB",
    },
    SampleAsset {
        title: "Fantasy Sword Collection",
        description: "A collection of 20 unique fantasy swords with custom animations and VFX.",
        category: "Weapons",
        tags: &["fantasy", "swords", "animated"],
        price: 250.0,
        file_size: "8.3 MB",
    },
    SampleAsset {
        title: "Modern UI Kit",
        description: "Professional UI kit with buttons, frames, and menus. Fully customizable.",
        category: "UI",
        tags: &["ui", "modern", "clean"],
        price: 0.0,
        file_size: "3.1 MB",
    },
    SampleAsset {
        title: "Advanced Combat System",
        description: "Full combat system with combo attacks, blocking, dodging, and special abilities.",
        category: "Scripts",
        tags: &["combat", "system", "pvp"],
        price: 500.0,
        file_size: "1.8 MB",
    },
    SampleAsset {
        title: "Nature Environment Pack",
        description: "Trees, rocks, grass, flowers, and terrain textures for outdoor environments.",
        category: "Environment",
        tags: &["nature", "trees", "terrain"],
        price: 150.0,
        file_size: "25.6 MB",
    },
    SampleAsset {
        title: "Character Animation Pack",
        description: "Over 50 character animations including idle, walk, run, jump, and emotes.",
        category: "Animations",
        tags: &["animation", "character", "emotes"],
        price: 0.0,
        file_size: "5.2 MB",
    },
];

/// Publish the sample catalog as the owner, whose uploads go live
/// without review.
pub fn sample_catalog(store: &Marketplace) -> Result<()> {
    for sample in SAMPLE_ASSETS {
        store.upload(
            OWNER_USER_ID,
            UploadRequest {
                title: sample.title.to_string(),
                description: sample.description.to_string(),
                category: sample.category.to_string(),
                tags: sample.tags.iter().map(|t| t.to_string()).collect(),
                price: sample.price,
                is_free: sample.price == 0.0,
                file_size: sample.file_size.to_string(),
                thumbnail: String::new(),
                images: vec![],
            },
        )?;
    }
    Ok(())
}

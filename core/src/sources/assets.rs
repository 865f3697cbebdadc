use std::path::Path;

/// Static images published as-is.
#[derive(Debug, Clone, Default)]
pub struct OverlayAssets {
    pub commander_tag: Option<Vec<u8>>,
    pub catmander_tag: Option<Vec<u8>>,
    pub combat_icon: Option<Vec<u8>>,
    /// Shown until the first season standing resolves
    pub rank_icon: Option<Vec<u8>>,
}

impl OverlayAssets {
    /// Load `commander.png`, `catmander.png`, `combat.png` and `pvp_rank.png`
    /// from `dir`. Missing files leave the matching asset empty.
    pub async fn load_from_dir(dir: &Path) -> Self {
        Self {
            commander_tag: read_asset(dir, "commander.png").await,
            catmander_tag: read_asset(dir, "catmander.png").await,
            combat_icon: read_asset(dir, "combat.png").await,
            rank_icon: read_asset(dir, "pvp_rank.png").await,
        }
    }
}

async fn read_asset(dir: &Path, file: &str) -> Option<Vec<u8>> {
    let path = dir.join(file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Asset not loaded");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_load_from_dir_reads_present_files() {
        let dir = std::env::temp_dir().join(format!("stream-out-assets-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("combat.png"), [7u8]).await.unwrap();
        tokio::fs::write(dir.join("pvp_rank.png"), [9u8, 9]).await.unwrap();

        let assets = OverlayAssets::load_from_dir(&dir).await;
        assert_eq!(assets.combat_icon, Some(vec![7]));
        assert_eq!(assets.rank_icon, Some(vec![9, 9]));
        assert!(assets.commander_tag.is_none());
        assert!(assets.catmander_tag.is_none());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}

//! Priority-based lookup across the local, test and official registries

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use idepack_core::{IoContext, PackageMetadata, PathLayout, Settings};

use crate::error::{RepoError, Result, parse_url};
use crate::http::HttpClient;
use crate::registry::{Registry, RegistryTier};

/// A registry entry chosen by resolution, never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPack {
    pub meta: PackageMetadata,
    pub source: RegistryTier,
    /// Install directory, or the development checkout for linked packs
    pub install_path: PathBuf,
    pub installed: bool,
}

impl ResolvedPack {
    /// Linked packs are used in place and never downloaded
    pub fn is_linked(&self) -> bool {
        self.source == RegistryTier::Local && self.meta.local_path.is_some()
    }
}

pub struct RegistryResolver {
    layout: PathLayout,
    registries: BTreeMap<RegistryTier, Registry>,
}

impl RegistryResolver {
    /// Load all three tiers; absent tier files count as empty
    pub fn load(layout: &PathLayout) -> Result<Self> {
        let mut registries = BTreeMap::new();
        for tier in RegistryTier::PRIORITY {
            let registry = Registry::load(&tier.file(layout))?;
            tracing::debug!(tier = %tier, packs = registry.len(), "loaded registry");
            registries.insert(tier, registry);
        }
        Ok(Self {
            layout: layout.clone(),
            registries,
        })
    }

    /// First hit in local, then test, then official
    pub fn resolve_pack(&self, name: &str) -> Result<ResolvedPack> {
        RegistryTier::PRIORITY
            .iter()
            .find_map(|tier| {
                self.registries
                    .get(tier)
                    .and_then(|r| r.get(name))
                    .map(|meta| self.resolved(meta, *tier))
            })
            .ok_or_else(|| RepoError::PackNotFound {
                name: name.to_string(),
            })
    }

    /// Union of all tiers, de-duplicated by priority, sorted by name
    pub fn list_all_packs(&self) -> Vec<ResolvedPack> {
        let mut seen: BTreeMap<&str, ResolvedPack> = BTreeMap::new();
        for tier in RegistryTier::PRIORITY {
            let Some(registry) = self.registries.get(&tier) else {
                continue;
            };
            for (name, meta) in &registry.packs {
                seen.entry(name.as_str())
                    .or_insert_with(|| self.resolved(meta, tier));
            }
        }
        seen.into_values().collect()
    }

    /// Case-insensitive substring match on name and description
    pub fn search(&self, query: &str) -> Vec<ResolvedPack> {
        let query = query.to_lowercase();
        self.list_all_packs()
            .into_iter()
            .filter(|p| {
                p.meta.name.to_lowercase().contains(&query)
                    || p.meta.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    fn resolved(&self, meta: &PackageMetadata, source: RegistryTier) -> ResolvedPack {
        let install_path = match (&meta.local_path, source) {
            (Some(path), RegistryTier::Local) => path.clone(),
            _ => self.layout.install_dir(&meta.name),
        };
        let installed = install_path.is_dir();
        ResolvedPack {
            meta: meta.clone(),
            source,
            install_path,
            installed,
        }
    }

    /// Refresh the official registry from `settings.registry_url`
    ///
    /// The document is validated before it replaces the cached file.
    /// Returns the number of packs in the new registry.
    pub async fn update_official(&mut self, http: &HttpClient, settings: &Settings) -> Result<usize> {
        let mut url = parse_url(&settings.registry_url)?;
        url.query_pairs_mut()
            .append_pair("t", &chrono::Utc::now().timestamp().to_string());

        tracing::info!(url = %settings.registry_url, "updating official registry");
        let data = http.get_bytes(url.as_str()).await?;
        let registry = Registry::from_slice(&data, &settings.registry_url)?;

        let path = RegistryTier::Official.file(&self.layout);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).io_context("create directory", parent)?;
        }
        std::fs::write(&path, &data).io_context("write", &path)?;

        let count = registry.len();
        self.registries.insert(RegistryTier::Official, registry);
        Ok(count)
    }

    // ========================================================================
    // Local development links
    // ========================================================================

    /// Point resolution of a package at a development checkout
    pub fn link_pack(&mut self, dir: &Path) -> Result<PackageMetadata> {
        let dir = dir.canonicalize().io_context("resolve", dir)?;
        let mut meta = PackageMetadata::load(&dir)?;
        let now = chrono::Utc::now().to_rfc3339();
        meta.local_path = Some(dir);
        meta.linked_at = Some(now.clone());

        let local = self.local_mut();
        local.packs.insert(meta.name.clone(), meta.clone());
        local.updated_at = Some(now);
        self.save_local()?;

        tracing::info!(name = %meta.name, "linked development pack");
        Ok(meta)
    }

    pub fn unlink_pack(&mut self, name: &str) -> Result<PackageMetadata> {
        let removed = self
            .local_mut()
            .packs
            .remove(name)
            .ok_or_else(|| RepoError::NotLinked {
                name: name.to_string(),
            })?;
        self.local_mut().updated_at = Some(chrono::Utc::now().to_rfc3339());
        self.save_local()?;
        Ok(removed)
    }

    /// Remove every link, returning how many were removed
    pub fn unlink_all(&mut self) -> Result<usize> {
        let local = self.local_mut();
        let count = local.packs.len();
        local.packs.clear();
        local.updated_at = Some(chrono::Utc::now().to_rfc3339());
        self.save_local()?;
        Ok(count)
    }

    pub fn list_linked(&self) -> Vec<&PackageMetadata> {
        self.registries
            .get(&RegistryTier::Local)
            .map(|r| r.packs.values().collect())
            .unwrap_or_default()
    }

    fn local_mut(&mut self) -> &mut Registry {
        self.registries
            .entry(RegistryTier::Local)
            .or_insert_with(Registry::new)
    }

    fn save_local(&self) -> Result<()> {
        match self.registries.get(&RegistryTier::Local) {
            Some(registry) => registry.save(&RegistryTier::Local.file(&self.layout)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_tier(layout: &PathLayout, tier: RegistryTier, body: &str) {
        std::fs::create_dir_all(layout.registry_dir()).unwrap();
        std::fs::write(tier.file(layout), body).unwrap();
    }

    fn three_tier_layout(dir: &TempDir) -> PathLayout {
        let layout = PathLayout::with_root(dir.path());
        write_tier(
            &layout,
            RegistryTier::Local,
            r#"{"version": "1", "packs": {"docs": {"version": "9.0.0-dev", "description": "local"}}}"#,
        );
        write_tier(
            &layout,
            RegistryTier::Test,
            r#"{"version": "1", "packs": {
                "docs": {"version": "1.1.0", "description": "test"},
                "lint": {"version": "0.2.0", "description": "Lint rules"}}}"#,
        );
        write_tier(
            &layout,
            RegistryTier::Official,
            r#"{"version": "1", "packages": [
                {"name": "docs", "version": "1.0.0", "description": "official"},
                {"name": "flutter", "version": "2.0.0", "description": "Flutter widgets"}]}"#,
        );
        layout
    }

    #[test]
    fn test_local_tier_wins() {
        let dir = TempDir::new().unwrap();
        let resolver = RegistryResolver::load(&three_tier_layout(&dir)).unwrap();

        let pack = resolver.resolve_pack("docs").unwrap();
        assert_eq!(pack.source, RegistryTier::Local);
        assert_eq!(pack.meta.description, "local");
        assert!(!pack.installed);

        let lint = resolver.resolve_pack("lint").unwrap();
        assert_eq!(lint.source, RegistryTier::Test);
    }

    #[test]
    fn test_not_found_in_any_tier() {
        let dir = TempDir::new().unwrap();
        let resolver = RegistryResolver::load(&three_tier_layout(&dir)).unwrap();
        assert!(matches!(
            resolver.resolve_pack("nope").unwrap_err(),
            RepoError::PackNotFound { .. }
        ));
    }

    #[test]
    fn test_missing_tiers_are_empty() {
        let dir = TempDir::new().unwrap();
        let resolver = RegistryResolver::load(&PathLayout::with_root(dir.path())).unwrap();
        assert!(resolver.list_all_packs().is_empty());
    }

    #[test]
    fn test_list_all_masks_lower_tiers() {
        let dir = TempDir::new().unwrap();
        let resolver = RegistryResolver::load(&three_tier_layout(&dir)).unwrap();

        let all = resolver.list_all_packs();
        let summary: Vec<_> = all
            .iter()
            .map(|p| (p.meta.name.as_str(), p.source))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("docs", RegistryTier::Local),
                ("flutter", RegistryTier::Official),
                ("lint", RegistryTier::Test),
            ]
        );
    }

    #[test]
    fn test_search_name_and_description() {
        let dir = TempDir::new().unwrap();
        let resolver = RegistryResolver::load(&three_tier_layout(&dir)).unwrap();

        let hits: Vec<_> = resolver
            .search("WIDGET")
            .into_iter()
            .map(|p| p.meta.name)
            .collect();
        assert_eq!(hits, vec!["flutter"]);
        assert_eq!(resolver.search("lint").len(), 1);
    }

    #[test]
    fn test_link_and_unlink() {
        let dir = TempDir::new().unwrap();
        let layout = PathLayout::with_root(dir.path().join("home"));
        let pack_dir = dir.path().join("my-pack");
        std::fs::create_dir_all(&pack_dir).unwrap();
        std::fs::write(
            pack_dir.join("package.json"),
            r#"{"name": "mine", "version": "0.1.0", "rules": ["a.md"]}"#,
        )
        .unwrap();

        let mut resolver = RegistryResolver::load(&layout).unwrap();
        let meta = resolver.link_pack(&pack_dir).unwrap();
        assert_eq!(meta.name, "mine");
        assert!(meta.linked_at.is_some());

        // persisted and visible after reload
        let reloaded = RegistryResolver::load(&layout).unwrap();
        let pack = reloaded.resolve_pack("mine").unwrap();
        assert!(pack.is_linked());
        assert!(pack.installed);
        assert_eq!(pack.install_path, pack_dir.canonicalize().unwrap());
        assert_eq!(reloaded.list_linked().len(), 1);

        resolver.unlink_pack("mine").unwrap();
        assert!(matches!(
            resolver.unlink_pack("mine").unwrap_err(),
            RepoError::NotLinked { .. }
        ));
        let reloaded = RegistryResolver::load(&layout).unwrap();
        assert!(reloaded.resolve_pack("mine").is_err());
    }

    #[test]
    fn test_unlink_all() {
        let dir = TempDir::new().unwrap();
        let layout = three_tier_layout(&dir);
        let mut resolver = RegistryResolver::load(&layout).unwrap();

        assert_eq!(resolver.unlink_all().unwrap(), 1);
        assert!(resolver.list_linked().is_empty());
        // lower tier shows through again
        assert_eq!(
            resolver.resolve_pack("docs").unwrap().source,
            RegistryTier::Test
        );
    }

    #[tokio::test]
    async fn test_update_official_busts_cache_and_reloads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/registry.json"))
            .and(query_param_is_missing("t"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/registry.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"version": "1", "packages": [{"name": "fresh", "version": "1.0.0"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let layout = PathLayout::with_root(dir.path());
        let settings = Settings {
            registry_url: format!("{}/registry.json", server.uri()),
            ..Settings::default()
        };
        let http = HttpClient::new(&settings).unwrap();

        let mut resolver = RegistryResolver::load(&layout).unwrap();
        assert_eq!(resolver.update_official(&http, &settings).await.unwrap(), 1);
        assert_eq!(
            resolver.resolve_pack("fresh").unwrap().source,
            RegistryTier::Official
        );
        assert!(RegistryTier::Official.file(&layout).is_file());
    }

    #[tokio::test]
    async fn test_update_official_keeps_cache_on_bad_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let layout = PathLayout::with_root(dir.path());
        write_tier(
            &layout,
            RegistryTier::Official,
            r#"{"version": "1", "packs": {"old": {"version": "1.0.0"}}}"#,
        );
        let settings = Settings {
            registry_url: format!("{}/registry.json", server.uri()),
            ..Settings::default()
        };
        let http = HttpClient::new(&settings).unwrap();

        let mut resolver = RegistryResolver::load(&layout).unwrap();
        let err = resolver.update_official(&http, &settings).await.unwrap_err();
        assert!(matches!(err, RepoError::InvalidRegistry { .. }));
        assert!(resolver.resolve_pack("old").is_ok());
        let on_disk = std::fs::read_to_string(RegistryTier::Official.file(&layout)).unwrap();
        assert!(on_disk.contains("old"));
    }
}

//! Memoized access to the loaded artifacts.
//!
//! Each artifact is loaded at most once per cache window; repeated reads inside the
//! window return the same `Arc`. [`DataAccess::invalidate_all`] drops every cached
//! artifact in one step, forcing the next read back to disk.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::{Availability, ScoredTable, Table};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::loaders;
use crate::pipeline::ingestion::{ChannelsConfig, ResearchEnrichment};
use crate::pipeline::paths::DataRoot;
use crate::pipeline::processing::ExclusionConfig;
use crate::pipeline::storage::TtlCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    Companies,
    Buildings,
    ScoredCompanies,
    Penetration,
    Contacts,
    ResearchEnrichment,
    Channels,
    Exclusions,
    ChurnPredictions,
    CompanyResearch,
}

impl ArtifactKey {
    pub fn name(self) -> &'static str {
        match self {
            ArtifactKey::Companies => "companies",
            ArtifactKey::Buildings => "buildings",
            ArtifactKey::ScoredCompanies => "scored_companies",
            ArtifactKey::Penetration => "penetration",
            ArtifactKey::Contacts => "contact_summary",
            ArtifactKey::ResearchEnrichment => "research_enrichment",
            ArtifactKey::Channels => "channels",
            ArtifactKey::Exclusions => "exclusions",
            ArtifactKey::ChurnPredictions => "churn_predictions",
            ArtifactKey::CompanyResearch => "company_research",
        }
    }
}

#[derive(Clone)]
enum CachedArtifact {
    Table(Arc<Table>),
    Scored(Arc<ScoredTable>),
    Optional(Arc<Availability<Table>>),
    Research(Arc<ResearchEnrichment>),
    Channels(Arc<ChannelsConfig>),
    Exclusions(Arc<ExclusionConfig>),
}

impl CachedArtifact {
    /// Same loaded value, not merely equal contents.
    fn is_same(&self, other: &CachedArtifact) -> bool {
        match (self, other) {
            (CachedArtifact::Table(a), CachedArtifact::Table(b)) => Arc::ptr_eq(a, b),
            (CachedArtifact::Scored(a), CachedArtifact::Scored(b)) => Arc::ptr_eq(a, b),
            (CachedArtifact::Optional(a), CachedArtifact::Optional(b)) => Arc::ptr_eq(a, b),
            (CachedArtifact::Research(a), CachedArtifact::Research(b)) => Arc::ptr_eq(a, b),
            (CachedArtifact::Channels(a), CachedArtifact::Channels(b)) => Arc::ptr_eq(a, b),
            (CachedArtifact::Exclusions(a), CachedArtifact::Exclusions(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A cached artifact and the inputs it was derived from.
///
/// A derived entry is only served while every input is still the cached generation;
/// after an input reloads the entry counts as a miss.
#[derive(Clone)]
struct CacheEntry {
    artifact: CachedArtifact,
    inputs: Vec<CachedArtifact>,
}

impl CacheEntry {
    fn built_from(&self, inputs: &[CachedArtifact]) -> bool {
        self.inputs.len() == inputs.len()
            && self.inputs.iter().zip(inputs).all(|(a, b)| a.is_same(b))
    }
}

/// Companies, buildings and scored companies built from one companies generation.
#[derive(Debug, Clone)]
pub struct CoreDatasets {
    pub companies: Arc<Table>,
    pub buildings: Arc<Table>,
    pub scored: Arc<ScoredTable>,
}

pub struct DataAccess {
    root: DataRoot,
    cache: TtlCache<ArtifactKey, CacheEntry>,
}

impl DataAccess {
    pub fn new(root: DataRoot, ttl: Duration) -> Self {
        let cache = TtlCache::new(ttl);
        debug!(ttl_secs = cache.ttl().as_secs_f64(), "Artifact cache created");
        Self { root, cache }
    }

    pub fn root(&self) -> &DataRoot {
        &self.root
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached artifact.
    pub fn invalidate_all(&mut self) {
        let dropped = self.cache.invalidate_all();
        info!(dropped = dropped, "Artifact cache invalidated");
        metrics::cache::invalidated();
    }

    pub fn companies(&mut self) -> Result<Arc<Table>> {
        self.cached(
            ArtifactKey::Companies,
            Vec::new(),
            |a| match a {
                CachedArtifact::Table(t) => Some(Arc::clone(t)),
                _ => None,
            },
            CachedArtifact::Table,
            |access| loaders::load_companies(&access.root),
        )
    }

    /// Buildings, orphan-filtered against the cached companies.
    pub fn buildings(&mut self) -> Result<Arc<Table>> {
        let companies = self.companies()?;
        self.buildings_from(companies)
    }

    /// Scored companies, filtered, re-ranked and merged with building counts.
    pub fn scored_companies(&mut self) -> Result<Arc<ScoredTable>> {
        let companies = self.companies()?;
        self.scored_from(companies)
    }

    /// The three core datasets, guaranteed to share one companies generation.
    pub fn core_datasets(&mut self) -> Result<CoreDatasets> {
        let companies = self.companies()?;
        let scored = self.scored_from(Arc::clone(&companies))?;
        let buildings = self.buildings_from(Arc::clone(&companies))?;
        Ok(CoreDatasets {
            companies,
            buildings,
            scored,
        })
    }

    fn buildings_from(&mut self, companies: Arc<Table>) -> Result<Arc<Table>> {
        self.cached(
            ArtifactKey::Buildings,
            vec![CachedArtifact::Table(Arc::clone(&companies))],
            |a| match a {
                CachedArtifact::Table(t) => Some(Arc::clone(t)),
                _ => None,
            },
            CachedArtifact::Table,
            move |access| loaders::load_buildings(&access.root, &companies),
        )
    }

    fn scored_from(&mut self, companies: Arc<Table>) -> Result<Arc<ScoredTable>> {
        let exclusions = self.exclusions();
        self.cached(
            ArtifactKey::ScoredCompanies,
            vec![
                CachedArtifact::Table(Arc::clone(&companies)),
                CachedArtifact::Exclusions(Arc::clone(&exclusions)),
            ],
            |a| match a {
                CachedArtifact::Scored(t) => Some(Arc::clone(t)),
                _ => None,
            },
            CachedArtifact::Scored,
            move |access| loaders::load_scored_companies(&access.root, &companies, &exclusions),
        )
    }

    pub fn penetration(&mut self) -> Result<Arc<Table>> {
        self.cached(
            ArtifactKey::Penetration,
            Vec::new(),
            |a| match a {
                CachedArtifact::Table(t) => Some(Arc::clone(t)),
                _ => None,
            },
            CachedArtifact::Table,
            |access| loaders::load_penetration(&access.root),
        )
    }

    pub fn contacts(&mut self) -> Result<Arc<Table>> {
        self.cached(
            ArtifactKey::Contacts,
            Vec::new(),
            |a| match a {
                CachedArtifact::Table(t) => Some(Arc::clone(t)),
                _ => None,
            },
            CachedArtifact::Table,
            |access| loaders::load_contacts(&access.root),
        )
    }

    pub fn research_enrichment(&mut self) -> Result<Arc<ResearchEnrichment>> {
        self.cached(
            ArtifactKey::ResearchEnrichment,
            Vec::new(),
            |a| match a {
                CachedArtifact::Research(r) => Some(Arc::clone(r)),
                _ => None,
            },
            CachedArtifact::Research,
            |access| loaders::load_research_enrichment(&access.root),
        )
    }

    pub fn channels(&mut self) -> Result<Arc<ChannelsConfig>> {
        self.cached(
            ArtifactKey::Channels,
            Vec::new(),
            |a| match a {
                CachedArtifact::Channels(c) => Some(Arc::clone(c)),
                _ => None,
            },
            CachedArtifact::Channels,
            |access| loaders::load_channels(&access.root),
        )
    }

    /// Industry exclusions; never fails.
    pub fn exclusions(&mut self) -> Arc<ExclusionConfig> {
        let loaded = self.cached(
            ArtifactKey::Exclusions,
            Vec::new(),
            |a| match a {
                CachedArtifact::Exclusions(e) => Some(Arc::clone(e)),
                _ => None,
            },
            CachedArtifact::Exclusions,
            |access| Ok(loaders::load_exclusions(&access.root)),
        );
        loaded.unwrap_or_default()
    }

    pub fn churn_predictions(&mut self) -> Arc<Availability<Table>> {
        self.optional(ArtifactKey::ChurnPredictions, loaders::load_churn_predictions)
    }

    pub fn company_research(&mut self) -> Arc<Availability<Table>> {
        self.optional(ArtifactKey::CompanyResearch, loaders::load_company_research)
    }

    /// Per-company research documents are read on demand and never cached.
    pub fn research_document(&self, company_id: &str) -> Option<serde_json::Value> {
        loaders::load_research_document(&self.root, company_id)
    }

    fn optional(
        &mut self,
        key: ArtifactKey,
        load: fn(&DataRoot) -> Availability<Table>,
    ) -> Arc<Availability<Table>> {
        let loaded = self.cached(
            key,
            Vec::new(),
            |a| match a {
                CachedArtifact::Optional(o) => Some(Arc::clone(o)),
                _ => None,
            },
            CachedArtifact::Optional,
            |access| Ok(load(&access.root)),
        );
        loaded.unwrap_or_else(|e| Arc::new(Availability::Unavailable(e.to_string())))
    }

    fn cached<T, L>(
        &mut self,
        key: ArtifactKey,
        inputs: Vec<CachedArtifact>,
        extract: fn(&CachedArtifact) -> Option<Arc<T>>,
        wrap: fn(Arc<T>) -> CachedArtifact,
        load: L,
    ) -> Result<Arc<T>>
    where
        L: FnOnce(&mut Self) -> Result<T>,
    {
        let hit = self
            .cache
            .get(&key)
            .filter(|entry| entry.built_from(&inputs))
            .and_then(|entry| extract(&entry.artifact));
        if let Some(hit) = hit {
            debug!(artifact = key.name(), "Artifact cache hit");
            metrics::cache::hit(key.name());
            return Ok(hit);
        }

        metrics::cache::miss(key.name());
        let value = Arc::new(load(self)?);
        self.cache.insert(
            key,
            CacheEntry {
                artifact: wrap(Arc::clone(&value)),
                inputs,
            },
        );
        Ok(value)
    }
}

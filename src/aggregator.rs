use crate::bundled;
use crate::domain::Conference;
use crate::error::Result;
use crate::normalize::normalize_rows;
use crate::sources::{extract_rows, HttpFetcher, SourceDescriptor, SourceFetcher, SourceRegistry};
use crate::storage::{Library, Storage};
use crate::topics::{augment_topics, infer_source_topics};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Outcome of a refresh across every configured source.
#[derive(Debug, Default)]
pub struct RefreshResult {
    /// Rows collected after normalization, before deduplication.
    pub total_conferences: usize,
    pub sources_fetched: usize,
    pub errors: Vec<String>,
}

/// Merges bundled, user and remote conferences into one deduplicated list.
pub struct Aggregator<S: Storage> {
    library: Library<S>,
    bundled: Vec<Conference>,
}

impl<S: Storage> Aggregator<S> {
    /// Aggregator over the dataset compiled into the binary.
    pub fn new(library: Library<S>) -> Result<Self> {
        Ok(Self::with_bundled(library, bundled::conferences()?))
    }

    pub fn with_bundled(library: Library<S>, bundled: Vec<Conference>) -> Self {
        Self { library, bundled }
    }

    pub fn library(&self) -> &Library<S> {
        &self.library
    }

    /// Bundled, then user, then remote; the first record seen for each
    /// identity key wins.
    pub fn load(&self) -> Vec<Conference> {
        let user = self.library.load_user_conferences();
        let remote = self.library.load_remote_conferences();
        debug!(
            "Merging {} bundled, {} user, {} remote conferences",
            self.bundled.len(),
            user.len(),
            remote.len()
        );
        dedupe(self.bundled.iter().cloned().chain(user).chain(remote))
    }

    /// Append a conference to the persisted user list.
    pub fn add_user_conference(&self, conference: Conference) -> Result<()> {
        let mut existing = self.library.load_user_conferences();
        info!("Adding user conference {}", conference.name);
        existing.push(conference);
        self.library.save_user_conferences(&existing)
    }

    /// Refresh over HTTP with the given per-source timeout.
    pub fn refresh(&self, timeout: Duration, user_agent: &str) -> Result<RefreshResult> {
        let fetcher = HttpFetcher::new(timeout, user_agent)?;
        self.refresh_with(&fetcher)
    }

    /// Fetch every source in order and replace the remote cache with what
    /// was collected. A failing source is skipped and reported in
    /// [`RefreshResult::errors`]; only persisting the cache can fail the call.
    #[instrument(skip_all)]
    pub fn refresh_with(&self, fetcher: &dyn SourceFetcher) -> Result<RefreshResult> {
        let entries = SourceRegistry::new(&self.library).ensure_seeded();
        let mut result = RefreshResult::default();
        let mut collected = Vec::new();

        for entry in &entries {
            let Some(source) = entry.descriptor() else {
                warn!("Skipping unsupported source {}", entry);
                continue;
            };
            match collect_source(fetcher, source) {
                Ok(rows) => {
                    info!("Collected {} conferences from {}", rows.len(), source);
                    result.sources_fetched += 1;
                    collected.extend(rows);
                }
                Err(e) => {
                    warn!("Skipping source {}: {}", source, e);
                    result.errors.push(format!("{source}: {e}"));
                }
            }
        }

        result.total_conferences = collected.len();
        self.library.save_remote_conferences(&collected)?;
        info!(
            "Refresh finished: {} conferences from {}/{} sources",
            result.total_conferences,
            result.sources_fetched,
            entries.len()
        );
        Ok(result)
    }
}

fn collect_source(fetcher: &dyn SourceFetcher, source: &SourceDescriptor) -> Result<Vec<Conference>> {
    let rows = extract_rows(fetcher.fetch(source)?)?;
    let source_topics = infer_source_topics(&source.basename());
    let mut conferences = normalize_rows(&rows);
    for conference in &mut conferences {
        augment_topics(conference, &source_topics);
    }
    Ok(conferences)
}

/// Keep the first conference for each identity key, preserving order.
pub fn dedupe(conferences: impl IntoIterator<Item = Conference>) -> Vec<Conference> {
    let mut seen = HashSet::new();
    conferences
        .into_iter()
        .filter(|c| seen.insert(c.identity_key()))
        .collect()
}

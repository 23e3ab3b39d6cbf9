use anyhow::Result;
use indicatif::ProgressBar;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::browser::{Driver, Navigator};
use crate::db;
use crate::error::RecordError;
use crate::fetch::{fetch_publications, fetch_roster, PageSource};
use crate::names::{self, PersonName};
use crate::parser::roster::RosterEntry;
use crate::settings::PublicationPolicy;

pub struct CrawlOptions {
    pub roster_url: String,
    pub limit: Option<usize>,
    pub policy: PublicationPolicy,
}

/// Counts returned after a crawl.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    pub rows: usize,
    pub added: usize,
    pub existing: usize,
    pub malformed: usize,
    pub failed: usize,
    pub publications: usize,
}

/// Walks the roster once, in page order, on a single thread. Owns the
/// browser session; it is closed when the crawl ends, on error paths too.
pub struct Crawler<'c, D: Driver, S: PageSource> {
    conn: &'c Connection,
    navigator: Navigator<D>,
    source: S,
    options: CrawlOptions,
    progress: ProgressBar,
}

impl<'c, D: Driver, S: PageSource> Crawler<'c, D, S> {
    pub fn new(
        conn: &'c Connection,
        navigator: Navigator<D>,
        source: S,
        options: CrawlOptions,
        progress: ProgressBar,
    ) -> Self {
        Self {
            conn,
            navigator,
            source,
            options,
            progress,
        }
    }

    /// Store and browser failures abort the crawl; anything else only
    /// abandons the current record.
    pub fn run(mut self) -> Result<CrawlStats> {
        let mut roster = fetch_roster(&self.source, &self.options.roster_url)?;
        if let Some(n) = self.options.limit {
            roster.truncate(n);
        }

        let mut stats = CrawlStats {
            rows: roster.len(),
            ..Default::default()
        };
        self.progress.set_length(roster.len() as u64);

        for entry in &roster {
            self.process_entry(entry, &mut stats)?;
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        self.navigator.close();
        info!(
            "Crawled {} rows ({} added, {} existing, {} malformed, {} failed), {} publications",
            stats.rows, stats.added, stats.existing, stats.malformed, stats.failed, stats.publications
        );
        Ok(stats)
    }

    fn process_entry(&mut self, entry: &RosterEntry, stats: &mut CrawlStats) -> Result<()> {
        debug!(name = %entry.name, href = ?entry.href, "roster row");
        let name = match names::tokenize(&entry.name) {
            Ok(name) => name,
            Err(e) => {
                self.progress
                    .suspend(|| warn!("Skipping name with unexpected format: {}", e.raw));
                stats.malformed += 1;
                return Ok(());
            }
        };

        let (staff_id, created) = db::find_or_create_staff(self.conn, &name)?;
        if created {
            stats.added += 1;
            self.progress
                .suspend(|| info!("Added employee: {}, ID: {}", name, staff_id));
        } else {
            stats.existing += 1;
            self.progress.suspend(|| {
                info!(
                    "Employee {} {} already exists in the database.",
                    name.first_name, name.last_name
                )
            });
            if self.options.policy == PublicationPolicy::SkipExisting {
                return Ok(());
            }
        }

        let titles = match self.collect_publications(&name) {
            Ok(titles) => titles,
            Err(e) => {
                stats.failed += 1;
                let state = self.navigator.state();
                self.progress.suspend(|| {
                    warn!(?state, "Failed to process employee {}: {}", entry.name, e)
                });
                self.navigator.recover()?;
                return Ok(());
            }
        };

        self.progress.suspend(|| {
            for title in &titles {
                info!("Found publication: {}", title);
            }
        });
        stats.publications += if created {
            db::insert_publications(self.conn, staff_id, &titles)?
        } else {
            db::insert_new_publications(self.conn, staff_id, &titles)?
        };

        if let Err(e) = self.navigator.return_to_roster() {
            self.progress
                .suspend(|| warn!("Return to roster failed after {}: {}", name, e));
            self.navigator.recover()?;
        }
        Ok(())
    }

    fn collect_publications(&mut self, name: &PersonName) -> Result<Vec<String>, RecordError> {
        let url = self.navigator.open_publications(&name.last_name)?;
        Ok(fetch_publications(&self.source, &url)?)
    }
}

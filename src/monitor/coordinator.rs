//! Monitor coordinator - one complete watch run
//!
//! A run is strictly sequential:
//! 1. Fetch every configured page (a failed page does not stop the others)
//! 2. Extract each fetched page and merge the contributions in page order
//! 3. Load the previous state (unreadable state counts as a first run)
//! 4. Reconcile and render the notification, if any
//! 5. Notify (failures are logged, never fatal)
//! 6. Persist the new snapshot, unless every page failed

use crate::config::Config;
use crate::extract::{extract_page, merge_pages, ListingExtractor, RecordExtractor};
use crate::fetcher::{PageFetcher, PageSource};
use crate::monitor::report::{NotificationStatus, RunOutcome, RunReport};
use crate::notify::{notifier_from_env, Notifier};
use crate::reconcile::{reconcile, render, render_failure, MessageOptions};
use crate::storage::{load_or_reset, open_store, StateStore};
use crate::{Snapshot, WatchError};

/// Runs the fetch → extract → reconcile → notify → persist pipeline
pub struct Monitor {
    source: Box<dyn PageSource>,
    extractor: Box<dyn RecordExtractor>,
    store: Box<dyn StateStore>,
    notifier: Box<dyn Notifier>,
    pages: Vec<u32>,
    message: MessageOptions,
    notify_on_failure: bool,
    dry_run: bool,
}

impl Monitor {
    /// Creates a monitor from its capabilities
    ///
    /// # Arguments
    ///
    /// * `source` - Where listing pages come from
    /// * `extractor` - How page text becomes room records
    /// * `store` - Where the last snapshot lives
    /// * `notifier` - Where change messages go
    /// * `pages` - Page indexes fetched on every run, in merge order
    /// * `message` - Title, link and listing limit for rendered messages
    pub fn new(
        source: Box<dyn PageSource>,
        extractor: Box<dyn RecordExtractor>,
        store: Box<dyn StateStore>,
        notifier: Box<dyn Notifier>,
        pages: Vec<u32>,
        message: MessageOptions,
    ) -> Self {
        Self {
            source,
            extractor,
            store,
            notifier,
            pages,
            message,
            notify_on_failure: false,
            dry_run: false,
        }
    }

    /// Builds the production monitor for a validated configuration
    ///
    /// Uses the HTTP page fetcher, the JSON/HTML listing extractor, the
    /// configured state backend and the notifier credentials found in the
    /// environment.
    pub fn from_config(config: &Config) -> Result<Self, WatchError> {
        let source = PageFetcher::new(&config.target, &config.fetcher)?;
        let store = open_store(config)?;
        let notifier = notifier_from_env(&config.notify)?;
        let message = MessageOptions::from_config(&config.notify, config.target.property_link());

        tracing::debug!(
            "Monitoring property {} (pages {:?}) with {} notifier",
            config.target.property_id,
            config.target.page_indexes,
            notifier.name()
        );

        Ok(Self::new(
            Box::new(source),
            Box::new(ListingExtractor),
            store,
            notifier,
            config.target.page_indexes.clone(),
            message,
        )
        .with_failure_reports(config.notify.notify_on_failure))
    }

    /// Also notify when every page failed
    pub fn with_failure_reports(mut self, enabled: bool) -> Self {
        self.notify_on_failure = enabled;
        self
    }

    /// Skip notification and persistence; reconciliation still runs
    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// The state store this monitor reads and writes
    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// Performs one complete run
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - At least one page was observed; state was persisted
    ///   (unless dry run)
    /// * `Err(WatchError::AllPagesFailed)` - Nothing was observed; state untouched
    /// * `Err(WatchError::Storage)` - The new snapshot could not be written
    pub async fn run(&mut self) -> Result<RunReport, WatchError> {
        tracing::info!("Fetching {} listing page(s)", self.pages.len());
        let fetched = self.source.fetch_pages(&self.pages).await;

        let mut contributions = Vec::with_capacity(fetched.len());
        let mut failed_pages = Vec::new();

        for page in fetched {
            let body = match page.result {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        "Page {} failed after {} attempt(s): {}",
                        page.index,
                        page.attempts,
                        e
                    );
                    failed_pages.push(page.index);
                    continue;
                }
            };

            match extract_page(self.extractor.as_ref(), &body) {
                Ok(contribution) => {
                    tracing::debug!(
                        "Page {}: {} room(s) via {} extractor",
                        page.index,
                        contribution.len(),
                        self.extractor.name()
                    );
                    contributions.push(contribution);
                }
                Err(e) => {
                    tracing::warn!("Page {} could not be decoded: {}", page.index, e);
                    failed_pages.push(page.index);
                }
            }
        }

        if contributions.is_empty() {
            tracing::error!("All pages failed; keeping last known state");
            if self.notify_on_failure && !self.dry_run {
                let text = render_failure(&failed_pages, &self.message);
                if let NotificationStatus::Failed { error } =
                    deliver(self.notifier.as_ref(), &text).await
                {
                    tracing::debug!("Failure report was not delivered: {}", error);
                }
            }
            return Err(WatchError::AllPagesFailed {
                pages: failed_pages,
            });
        }

        let current = merge_pages(contributions);
        let previous = load_or_reset(self.store.as_ref());
        let reconciliation = reconcile(&previous, &current);
        let message = render(&reconciliation, &self.message);

        let notification = match &message {
            None => NotificationStatus::NotNeeded,
            Some(_) if self.dry_run => NotificationStatus::Suppressed,
            Some(text) => deliver(self.notifier.as_ref(), text).await,
        };

        let persisted = if self.dry_run {
            tracing::info!("Dry run: not saving snapshot of {} room(s)", current.len());
            false
        } else {
            self.persist(&current)?;
            true
        };

        let report = RunReport {
            pages_requested: self.pages.len(),
            failed_pages,
            rooms_observed: current.len(),
            outcome: RunOutcome::from(&reconciliation),
            message,
            notification,
            persisted,
        };

        if report.is_partial() {
            tracing::warn!("Run completed with failed pages: {}", report);
        } else {
            tracing::info!("Run completed: {}", report);
        }
        Ok(report)
    }

    fn persist(&mut self, snapshot: &Snapshot) -> Result<(), WatchError> {
        self.store.save(snapshot).map_err(|e| {
            tracing::error!("Failed to save state to {}: {}", self.store.describe(), e);
            WatchError::from(e)
        })?;
        tracing::debug!(
            "Saved {} room(s) to {}",
            snapshot.len(),
            self.store.describe()
        );
        Ok(())
    }
}

/// Sends `text`, absorbing failures into the returned status
///
/// Takes the notifier alone: `Monitor` is not `Sync`, and the run future
/// must stay `Send`.
async fn deliver(notifier: &dyn Notifier, text: &str) -> NotificationStatus {
    match notifier.notify(text).await {
        Ok(()) => NotificationStatus::Sent {
            transport: notifier.name(),
        },
        Err(e) => {
            tracing::error!("Notification via {} failed: {}", notifier.name(), e);
            NotificationStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}

//! Interactive navigation from the roster to a staff member's publication list.
//!
//! The publication list has no stable URL reachable from the roster, so it is
//! reached by replaying the site's clicks in a real browser:
//!
//! ```text
//! AtRoster --click last name--> OnStaffDetail --click full record--> OnPublicationList
//!     ^                                                                   |
//!     +------------------------- back, back ------------------------------+
//! ```
//!
//! Any failed step leaves the navigator `Failed`; [`Navigator::recover`]
//! brings it back to `AtRoster` before the next record.

pub mod chrome;
#[cfg(test)]
pub mod fake;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::NavError;
use crate::parser::publications::TABLE_CLASS;

/// Present once the roster table has rendered.
pub const ROSTER_MARKER: &str = "table";

/// Browser operations the navigator needs. Waits are bounded by `timeout`
/// and report expiry as [`NavError::Timeout`].
pub trait Driver {
    fn goto(&mut self, url: &str) -> Result<(), NavError>;
    /// Wait for a link whose visible text contains `text`, then click it.
    fn click_link(&mut self, text: &str, timeout: Duration) -> Result<(), NavError>;
    /// Wait for an element matching a CSS selector.
    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), NavError>;
    /// Step back in history and wait until the URL changes.
    fn back(&mut self, timeout: Duration) -> Result<(), NavError>;
    fn current_url(&self) -> Result<String, NavError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    AtRoster,
    OnStaffDetail,
    OnPublicationList,
    /// `depth` counts the pages navigated past the roster before the failure.
    Failed { depth: u8 },
}

impl NavState {
    fn depth(self) -> u8 {
        match self {
            NavState::AtRoster => 0,
            NavState::OnStaffDetail => 1,
            NavState::OnPublicationList => 2,
            NavState::Failed { depth } => depth,
        }
    }
}

pub struct Navigator<D: Driver> {
    driver: D,
    state: NavState,
    roster_url: String,
    full_record_label: String,
    timeout: Duration,
}

impl<D: Driver> Navigator<D> {
    /// Load the roster and wait for its table.
    pub fn open(
        mut driver: D,
        roster_url: &str,
        full_record_label: &str,
        timeout: Duration,
    ) -> Result<Self, NavError> {
        info!("Opening roster in browser: {}", roster_url);
        driver.goto(roster_url)?;
        driver.wait_for(ROSTER_MARKER, timeout)?;
        // Compare later against the URL as the browser reports it.
        let roster_url = driver.current_url()?;

        Ok(Self {
            driver,
            state: NavState::AtRoster,
            roster_url,
            full_record_label: full_record_label.to_string(),
            timeout,
        })
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Click through to the publication list of the staff member whose link
    /// contains `last_name`, returning the list's URL.
    pub fn open_publications(&mut self, last_name: &str) -> Result<String, NavError> {
        self.expect(NavState::AtRoster)?;

        if let Err(e) = self.driver.click_link(last_name, self.timeout) {
            return Err(self.fail(0, e));
        }
        self.state = NavState::OnStaffDetail;

        if let Err(e) = self.driver.click_link(&self.full_record_label, self.timeout) {
            return Err(self.fail(1, e));
        }
        let marker = format!(".{TABLE_CLASS}");
        if let Err(e) = self.driver.wait_for(&marker, self.timeout) {
            return Err(self.fail(2, e));
        }
        self.state = NavState::OnPublicationList;

        let url = self.driver.current_url().map_err(|e| self.fail(2, e))?;
        debug!(%url, "publication list reached");
        Ok(url)
    }

    /// Undo both forward steps and wait for the roster table.
    pub fn return_to_roster(&mut self) -> Result<(), NavError> {
        self.expect(NavState::OnPublicationList)?;

        self.driver.back(self.timeout).map_err(|e| self.fail(2, e))?;
        self.driver.back(self.timeout).map_err(|e| self.fail(1, e))?;
        self.driver
            .wait_for(ROSTER_MARKER, self.timeout)
            .map_err(|e| self.fail(0, e))?;

        // The publication page has a table too; only the URL tells them apart.
        let url = self.driver.current_url().map_err(|e| self.fail(0, e))?;
        if url != self.roster_url {
            let err = NavError::WrongPage {
                expected: self.roster_url.clone(),
                actual: url,
            };
            return Err(self.fail(2, err));
        }

        self.state = NavState::AtRoster;
        Ok(())
    }

    /// Bring the browser back to the roster from any state.
    ///
    /// Steps back once if the roster was left, then checks that the browser
    /// shows the roster URL with its table. Otherwise the roster URL is
    /// loaded directly. [`NavError::Lost`] means the roster is unreachable.
    pub fn recover(&mut self) -> Result<(), NavError> {
        let depth = self.state.depth();
        if self.state == NavState::AtRoster {
            return Ok(());
        }
        self.state = NavState::Failed { depth };

        if depth > 0 {
            if let Err(e) = self.driver.back(self.timeout) {
                warn!("Back navigation failed during recovery: {}", e);
            }
        }
        if self.shows_roster() {
            self.state = NavState::AtRoster;
            return Ok(());
        }

        warn!("Browser is not on the roster after stepping back, reloading it");
        self.driver
            .goto(&self.roster_url)
            .and_then(|()| self.driver.wait_for(ROSTER_MARKER, self.timeout))
            .map_err(|e| NavError::Lost(e.to_string()))?;
        self.state = NavState::AtRoster;
        Ok(())
    }

    /// End the browser session.
    pub fn close(self) {
        info!(state = ?self.state, "Closing browser session");
        drop(self.driver);
    }

    fn shows_roster(&mut self) -> bool {
        let on_roster_url = self
            .driver
            .current_url()
            .is_ok_and(|url| url == self.roster_url);
        on_roster_url && self.driver.wait_for(ROSTER_MARKER, self.timeout).is_ok()
    }

    fn expect(&self, expected: NavState) -> Result<(), NavError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(NavError::OutOfStep {
                expected,
                actual: self.state,
            })
        }
    }

    fn fail(&mut self, depth: u8, err: NavError) -> NavError {
        debug!(from = ?self.state, depth, "navigation failed: {}", err);
        self.state = NavState::Failed { depth };
        err
    }
}

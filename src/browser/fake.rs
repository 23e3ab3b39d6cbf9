//! Scripted in-memory browser for navigator and crawler tests.

use std::collections::HashMap;
use std::time::Duration;

use super::Driver;
use crate::error::NavError;

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    /// Selectors that resolve on this page.
    markers: Vec<String>,
    /// (visible text, target URL)
    links: Vec<(String, String)>,
}

impl FakePage {
    pub fn new(markers: &[&str]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_string()).collect(),
            links: Vec::new(),
        }
    }

    pub fn link(mut self, text: &str, target: &str) -> Self {
        self.links.push((text.to_string(), target.to_string()));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    pages: HashMap<String, FakePage>,
    history: Vec<String>,
    pub backs: usize,
    /// Accept `back` without moving, like a browser whose traversal never started.
    pub stall_back: bool,
    pub gotos: usize,
}

impl FakeDriver {
    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Strip every marker from a page so waits on it time out.
    pub fn break_page(&mut self, url: &str) {
        if let Some(page) = self.pages.get_mut(url) {
            page.markers.clear();
        }
    }

    fn current(&self) -> Option<&FakePage> {
        self.history.last().and_then(|url| self.pages.get(url))
    }
}

fn timeout(what: String, after: Duration) -> NavError {
    NavError::Timeout { what, after }
}

impl Driver for FakeDriver {
    fn goto(&mut self, url: &str) -> Result<(), NavError> {
        self.gotos += 1;
        self.history.push(url.to_string());
        Ok(())
    }

    fn click_link(&mut self, text: &str, after: Duration) -> Result<(), NavError> {
        let target = self
            .current()
            .and_then(|page| page.links.iter().find(|(label, _)| label.contains(text)))
            .map(|(_, target)| target.clone())
            .ok_or_else(|| timeout(format!("link containing {:?}", text), after))?;
        self.history.push(target);
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, after: Duration) -> Result<(), NavError> {
        match self.current() {
            Some(page) if page.markers.iter().any(|m| m == selector) => Ok(()),
            _ => Err(timeout(format!("element {:?}", selector), after)),
        }
    }

    fn back(&mut self, _timeout: Duration) -> Result<(), NavError> {
        self.backs += 1;
        if !self.stall_back && self.history.len() > 1 {
            self.history.pop();
        }
        Ok(())
    }

    fn current_url(&self) -> Result<String, NavError> {
        self.history
            .last()
            .cloned()
            .ok_or_else(|| NavError::Browser("no page loaded".into()))
    }
}

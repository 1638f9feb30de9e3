//! Scripted in-memory rate-history site implementing `PageDriver`.
//!
//! Models the parts of the real page the engine relies on: a search form, a
//! result table split into pages, a rejected message that replaces the table
//! when the site refuses an action, and a pagination widget. Rejections are
//! scripted per search, per "next" target page and per page-link click.

#![allow(dead_code)]

use async_trait::async_trait;
use boc_fx::{ClickOptions, DriverError, DriverResult, Locator, PageDriver, SiteLayout};
use std::collections::{HashMap, VecDeque};

pub const ROWS_PER_PAGE: usize = 2;

pub const HEADER: [&str; 7] = [
    "Currency Name",
    "Buying Rate",
    "Cash Buying Rate",
    "Selling Rate",
    "Cash Selling Rate",
    "Middle Rate",
    "Pub Time",
];

/// Which page links the pagination widget renders.
#[derive(Debug, Clone)]
pub enum Links {
    /// The same labels whatever page is shown.
    Fixed(Vec<u32>),
    /// Pages within `radius` of the displayed one.
    Window(u32),
}

/// Something the engine did to the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    Navigate,
    Search { accepted: bool },
    Next { target: u32, accepted: bool },
    Link { page: u32, accepted: bool },
    Rows { currency: String, page: u32 },
}

pub struct SimSite {
    layout: SiteLayout,
    currencies: Vec<String>,
    pages: HashMap<String, u32>,
    links: Links,
    resume_page: u32,
    missing_page_count: bool,

    search_rejections: HashMap<String, u32>,
    advance_script: HashMap<u32, VecDeque<bool>>,
    link_script: HashMap<u32, VecDeque<bool>>,
    always_reject_search: bool,
    resubmit_rejections: u32,

    loaded: bool,
    fields: HashMap<String, String>,
    selected_field: Option<String>,
    currency: Option<String>,
    shown: Option<String>,
    page: u32,
    rejected: bool,
    nav_rejected: bool,

    pub events: Vec<SimEvent>,
}

impl SimSite {
    pub fn new() -> Self {
        Self {
            layout: SiteLayout::default(),
            currencies: Vec::new(),
            pages: HashMap::new(),
            links: Links::Window(2),
            resume_page: 1,
            missing_page_count: false,
            search_rejections: HashMap::new(),
            advance_script: HashMap::new(),
            link_script: HashMap::new(),
            always_reject_search: false,
            resubmit_rejections: 0,
            loaded: false,
            fields: HashMap::new(),
            selected_field: None,
            currency: None,
            shown: None,
            page: 0,
            rejected: false,
            nav_rejected: false,
            events: Vec::new(),
        }
    }

    /// Offer a currency with `pages` result pages (0 = no records).
    pub fn currency(mut self, code: &str, pages: u32) -> Self {
        self.currencies.push(code.to_string());
        self.pages.insert(code.to_string(), pages);
        self
    }

    pub fn links(mut self, links: Links) -> Self {
        self.links = links;
        self
    }

    /// Page shown once a rejected page change is cleared by resubmitting.
    pub fn resume_page(mut self, page: u32) -> Self {
        self.resume_page = page;
        self
    }

    pub fn without_page_count(mut self) -> Self {
        self.missing_page_count = true;
        self
    }

    pub fn reject_search(mut self, currency: &str, times: u32) -> Self {
        self.search_rejections.insert(currency.to_string(), times);
        self
    }

    pub fn reject_every_search(mut self) -> Self {
        self.always_reject_search = true;
        self
    }

    /// Reject the next `times` searches resubmitted to clear a rejected page change.
    pub fn reject_resubmits(mut self, times: u32) -> Self {
        self.resubmit_rejections = times;
        self
    }

    /// Reject the next `times` "next" clicks that would land on `target`.
    pub fn reject_advance(self, target: u32, times: u32) -> Self {
        self.advance_pattern(target, &vec![true; times as usize])
    }

    /// Outcome of successive "next" clicks landing on `target` (true = rejected).
    /// Clicks beyond the pattern are accepted.
    pub fn advance_pattern(mut self, target: u32, pattern: &[bool]) -> Self {
        self.advance_script
            .entry(target)
            .or_default()
            .extend(pattern.iter().copied());
        self
    }

    pub fn reject_link(mut self, page: u32, times: u32) -> Self {
        self.link_script
            .entry(page)
            .or_default()
            .extend(std::iter::repeat(true).take(times as usize));
        self
    }

    pub fn field(&self, selector: &str) -> Option<&str> {
        self.fields.get(selector).map(String::as_str)
    }

    pub fn current_page(&self) -> u32 {
        self.page
    }

    /// Pages whose rows were read for `currency`, in order.
    pub fn extracted_pages(&self, currency: &str) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Rows { currency: c, page } if c == currency => Some(*page),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn expected_cells(currency: &str, page: u32) -> Vec<String> {
        let mut cells = Vec::new();
        for row in 0..ROWS_PER_PAGE {
            for col in 0..HEADER.len() {
                cells.push(format!("{currency}-p{page}-r{row}-c{col}"));
            }
        }
        cells
    }

    fn total(&self) -> u32 {
        self.shown
            .as_ref()
            .and_then(|c| self.pages.get(c))
            .copied()
            .unwrap_or(0)
    }

    fn showing_results(&self) -> bool {
        self.shown.is_some()
    }

    fn rendered_links(&self) -> Vec<u32> {
        if !self.showing_results() || self.rejected {
            return Vec::new();
        }
        match &self.links {
            Links::Fixed(pages) => pages.clone(),
            Links::Window(radius) => {
                let lo = self.page.saturating_sub(*radius).max(1);
                let hi = (self.page + radius).min(self.total());
                (lo..=hi).collect()
            }
        }
    }

    fn link_page(&self, selector: &str) -> Option<u32> {
        let prefix = format!("span[class='{}'] a[onclick*='(", self.layout.page_links_class);
        let rest = selector.strip_prefix(&prefix)?;
        let (page, rest) = rest.split_once(',')?;
        let (total, _) = rest.split_once(')')?;
        let total: u32 = total.parse().ok()?;
        if total != self.total() {
            return None;
        }
        page.parse().ok()
    }

    fn present(&self, locator: &Locator) -> bool {
        if !self.loaded {
            return false;
        }
        let layout = &self.layout;
        if *locator == layout.content_marker() {
            return self.showing_results();
        }
        if *locator == layout.page_links_container() {
            return self.showing_results() && !self.rejected && self.total() > 1;
        }
        match locator {
            Locator::Css(css) if *css == layout.next_page_button => {
                self.showing_results() && !self.rejected && self.page < self.total()
            }
            Locator::Css(css) => match self.link_page(css) {
                Some(page) => self.rendered_links().contains(&page),
                None => [
                    &layout.start_date_input,
                    &layout.end_date_input,
                    &layout.currency_select,
                    &layout.search_button,
                ]
                .contains(&css),
            },
            Locator::XPath(_) => false,
        }
    }

    fn search(&mut self) {
        let currency = self.currency.clone();
        self.shown = currency.clone();

        let scripted = match currency.as_ref().and_then(|c| self.search_rejections.get_mut(c)) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        };
        let resubmit = self.nav_rejected && self.resubmit_rejections > 0;
        if resubmit {
            self.resubmit_rejections -= 1;
        }
        let accepted = !(scripted || resubmit || self.always_reject_search);
        self.events.push(SimEvent::Search { accepted });

        if !accepted {
            self.rejected = true;
            return;
        }
        self.page = if self.nav_rejected { self.resume_page } else { 1 };
        self.rejected = false;
        self.nav_rejected = false;
    }

    fn navigation_rejected(&mut self) {
        self.rejected = true;
        self.nav_rejected = true;
    }
}

/// Whether the next scripted click on `key` is rejected.
fn consume(script: &mut HashMap<u32, VecDeque<bool>>, key: u32) -> bool {
    script
        .get_mut(&key)
        .and_then(VecDeque::pop_front)
        .unwrap_or(false)
}

#[async_trait]
impl PageDriver for SimSite {
    async fn navigate(&mut self, _url: &str) -> DriverResult<()> {
        self.loaded = true;
        self.shown = None;
        self.page = 0;
        self.rejected = false;
        self.nav_rejected = false;
        self.events.push(SimEvent::Navigate);
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator) -> DriverResult<()> {
        if self.present(locator) {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                locator: locator.clone(),
                timeout_ms: 0,
            })
        }
    }

    async fn click(&mut self, selector: &str, options: ClickOptions) -> DriverResult<()> {
        let locator = Locator::css(selector.to_string());
        if !self.present(&locator) {
            return Err(DriverError::ElementNotFound { locator });
        }

        if selector == self.layout.search_button {
            self.search();
        } else if selector == self.layout.next_page_button {
            let target = self.page + 1;
            let accepted = !consume(&mut self.advance_script, target);
            self.events.push(SimEvent::Next { target, accepted });
            if accepted {
                self.page = target;
            } else {
                self.navigation_rejected();
            }
        } else if let Some(page) = self.link_page(selector) {
            let accepted = !consume(&mut self.link_script, page);
            self.events.push(SimEvent::Link { page, accepted });
            if accepted {
                self.page = page;
            } else {
                self.navigation_rejected();
            }
        } else {
            self.selected_field = (options.click_count >= 3).then(|| selector.to_string());
        }
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> DriverResult<()> {
        let replace = self.selected_field.as_deref() == Some(selector);
        let value = self.fields.entry(selector.to_string()).or_default();
        if replace {
            value.clear();
        }
        value.push_str(text);
        self.selected_field = None;
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> DriverResult<()> {
        if selector != self.layout.currency_select || !self.currencies.iter().any(|c| c == value) {
            return Err(DriverError::ElementNotFound {
                locator: Locator::css(selector.to_string()),
            });
        }
        self.currency = Some(value.to_string());
        Ok(())
    }

    async fn extract_text(&mut self, locator: &Locator) -> DriverResult<Vec<String>> {
        let layout = self.layout.clone();
        if !self.showing_results() {
            return Ok(Vec::new());
        }
        let no_data = self.total() == 0;

        if *locator == layout.rejected_marker() {
            return Ok(if self.rejected {
                vec![layout.rejected_text.clone()]
            } else {
                Vec::new()
            });
        }
        if *locator == layout.no_records_marker() {
            return Ok(if !self.rejected && no_data {
                vec![layout.no_records_text.clone()]
            } else {
                Vec::new()
            });
        }
        if *locator == layout.row_cells() {
            if self.rejected {
                return Ok(vec![layout.rejected_text.clone()]);
            }
            if no_data {
                return Ok(vec![layout.no_records_text.clone()]);
            }
            let currency = self.shown.clone().unwrap_or_default();
            self.events.push(SimEvent::Rows {
                currency: currency.clone(),
                page: self.page,
            });
            return Ok(Self::expected_cells(&currency, self.page));
        }
        if *locator == layout.header_cells() {
            return Ok(if self.rejected || no_data {
                Vec::new()
            } else {
                HEADER.iter().map(|h| h.to_string()).collect()
            });
        }
        if *locator == layout.page_count() {
            return Ok(if self.rejected || no_data || self.missing_page_count {
                Vec::new()
            } else {
                vec![self.total().to_string()]
            });
        }
        if *locator == layout.page_links() {
            return Ok(self
                .rendered_links()
                .iter()
                .map(|p| p.to_string())
                .collect());
        }
        Ok(Vec::new())
    }

    async fn extract_property(
        &mut self,
        locator: &Locator,
        property: &str,
    ) -> DriverResult<Vec<String>> {
        if self.loaded && *locator == self.layout.currency_options() && property == "value" {
            Ok(self.currencies.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

//! Selectors and marker texts of the rate-history search page.
//!
//! The defaults describe the English search page of the Bank of China
//! foreign exchange rate history. Marker texts are compared exactly, typos
//! included, because that is what the site renders.

use crate::driver::Locator;
use serde::{Deserialize, Serialize};

/// Number of cells in one result row.
pub const COLUMN_COUNT: usize = 7;

/// Everything the engine needs to know about the page's markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    pub url: String,
    pub start_date_input: String,
    pub end_date_input: String,
    pub currency_select: String,
    pub search_button: String,
    /// Class shared by result cells and by the rejected / no-records messages.
    pub cell_class: String,
    pub header_class: String,
    pub rejected_text: String,
    pub no_records_text: String,
    pub page_count_class: String,
    pub next_page_button: String,
    pub page_links_class: String,
    pub columns: usize,
    /// Single line written for a currency without records.
    pub no_data_sentinel: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            url: "https://srh.bankofchina.com/search/whpj/searchen.jsp".to_string(),
            start_date_input: "input[type='text'][name='erectDate']".to_string(),
            end_date_input: "input[type='text'][name='nothing']".to_string(),
            currency_select: "#pjname".to_string(),
            search_button: "input[type='button'][value='search']".to_string(),
            cell_class: "hui12_20".to_string(),
            header_class: "lan12_hover".to_string(),
            rejected_text: "soryy,wrong search word submit,please check your search word!"
                .to_string(),
            no_records_text: "sorry, no records！".to_string(),
            page_count_class: "nav_pagenum".to_string(),
            next_page_button: "span[class='wcm_pointer nav_go_next']".to_string(),
            page_links_class: "nav_page".to_string(),
            columns: COLUMN_COUNT,
            no_data_sentinel: "No records!".to_string(),
        }
    }
}

impl SiteLayout {
    /// Present on every rendered result page, whatever the outcome.
    pub fn content_marker(&self) -> Locator {
        Locator::css(format!(".{}", self.cell_class))
    }

    pub fn rejected_marker(&self) -> Locator {
        self.cell_with_text(&self.rejected_text)
    }

    pub fn no_records_marker(&self) -> Locator {
        self.cell_with_text(&self.no_records_text)
    }

    pub fn row_cells(&self) -> Locator {
        Locator::xpath(format!("//td[@class=\"{}\"]", self.cell_class))
    }

    pub fn header_cells(&self) -> Locator {
        Locator::xpath(format!("//td[@class=\"{}\"][text()]", self.header_class))
    }

    pub fn page_count(&self) -> Locator {
        Locator::xpath(format!("//span[@class=\"{}\"]", self.page_count_class))
    }

    pub fn page_links_container(&self) -> Locator {
        Locator::css(format!(".{}", self.page_links_class))
    }

    pub fn page_links(&self) -> Locator {
        Locator::xpath(format!("//span[@class=\"{}\"]/a", self.page_links_class))
    }

    /// CSS selector of the numbered link whose click handler encodes `(page,total)`.
    pub fn page_link(&self, page: u32, total: u32) -> String {
        format!(
            "span[class='{}'] a[onclick*='({page},{total})']",
            self.page_links_class
        )
    }

    /// Options of the currency `<select>`, skipping the leading placeholder.
    pub fn currency_options(&self) -> Locator {
        Locator::xpath(format!(
            "//select[@id=\"{}\"]/option[position()>1]",
            self.currency_select.trim_start_matches('#')
        ))
    }

    fn cell_with_text(&self, text: &str) -> Locator {
        Locator::xpath(format!(
            "//td[@class=\"{}\"][text()=\"{}\"]",
            self.cell_class, text
        ))
    }
}

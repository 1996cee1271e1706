//! Tunables shared by the driver, extractor and crawler crates.
//!
//! Every struct deserializes with `#[serde(default)]` so partial YAML
//! documents only need to name what they change.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// CSS selectors for the directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// Row container elements.
    pub row: String,
    pub english_name: String,
    pub chinese_name: String,
    pub title: String,
    pub department: String,
    pub email: String,
    /// Control inside a row that opens the detail context.
    pub more_button: String,
    /// Optional "next page" control for paginated listings.
    pub next_page: Option<String>,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row: ".el-table__row".into(),
            english_name: ".el-table_1_column_1 .word-adjuest".into(),
            chinese_name: ".el-table_1_column_2 .word-adjuest".into(),
            title: ".el-table_1_column_3 .word-adjuest".into(),
            department: ".el-table_1_column_4 .word-adjuest".into(),
            email: ".el-table_1_column_5 .email-text".into(),
            more_button: ".el-button.el-button--text.more-btn".into(),
            next_page: None,
        }
    }
}

/// CSS selectors for a detail page.
///
/// `tab_control` and `tab_panel` are templates; `{index}` is replaced with the
/// zero-based tab index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    /// Waited for after the context opens; signals the page has rendered.
    pub ready: String,
    pub icon_text: String,
    pub degree_line: String,
    pub overview: String,
    pub tab: String,
    pub tab_control: String,
    pub tab_panel: String,
    pub interest_item: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            ready: ".card-object-wrap".into(),
            icon_text: ".card-object-wrap .icon-text".into(),
            degree_line: ".degree-detail p".into(),
            overview: ".overview-div".into(),
            tab: ".el-tabs__nav.is-top.is-stretch .el-tabs__item.is-top".into(),
            tab_control: "#tab-{index}".into(),
            tab_panel: "#pane-{index}".into(),
            interest_item: "p.content".into(),
        }
    }
}

impl DetailSelectors {
    pub fn tab_control_for(&self, index: usize) -> String {
        self.tab_control.replace("{index}", &index.to_string())
    }

    pub fn tab_panel_for(&self, index: usize) -> String {
        self.tab_panel.replace("{index}", &index.to_string())
    }

    /// Selector matching the research-interest items of tab `index`.
    pub fn interest_items_for(&self, index: usize) -> String {
        format!("{} {}", self.tab_panel_for(index), self.interest_item)
    }
}

/// Upper bounds for every blocking browser operation, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub page_load_ms: u64,
    pub context_open_ms: u64,
    pub content_ms: u64,
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load_ms: 10_000,
            context_open_ms: 5_000,
            content_ms: 5_000,
            poll_ms: 200,
        }
    }
}

impl Timeouts {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }
    pub fn context_open(&self) -> Duration {
        Duration::from_millis(self.context_open_ms)
    }
    pub fn content(&self) -> Duration {
        Duration::from_millis(self.content_ms)
    }
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

/// Bounded retry for navigation and context opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff_ms: 500,
        }
    }
}

/// Optional jittered pause between rows. `max_ms == 0` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Parameters of the age estimate derived from a graduate year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeHeuristic {
    /// Assumed age at graduation.
    pub graduation_age: i32,
    /// Year the estimate is computed for; the current year when unset.
    pub reference_year: Option<i32>,
}

impl Default for AgeHeuristic {
    fn default() -> Self {
        Self {
            graduation_age: 23,
            reference_year: None,
        }
    }
}

impl AgeHeuristic {
    /// Fix `reference_year` to the current calendar year if it is unset.
    pub fn resolved(self) -> Self {
        Self {
            reference_year: Some(
                self.reference_year
                    .unwrap_or_else(|| chrono::Local::now().year()),
            ),
            ..self
        }
    }

    /// `None` when the arithmetic does not fit in an `i32`.
    pub fn estimate_age(&self, graduate_year: u32) -> Option<i32> {
        let reference = self
            .reference_year
            .unwrap_or_else(|| chrono::Local::now().year());
        let year = i32::try_from(graduate_year).ok()?;
        reference.checked_add(self.graduation_age)?.checked_sub(year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

/// How to reach and launch the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub kind: BrowserKind,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            kind: BrowserKind::Chrome,
            headless: true,
            window_width: 1366,
            window_height: 900,
            user_agent: None,
        }
    }
}

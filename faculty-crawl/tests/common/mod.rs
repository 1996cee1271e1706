#![allow(dead_code)]

use async_trait::async_trait;
use faculty_common::{
    AgeHeuristic, RetryPolicy, SessionError, SessionResult, Timeouts, TriggerRef,
};
use faculty_crawl::CrawlSettings;
use faculty_drivers::{BrowsingSession, ContextHandle};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DIRECTORY_URL: &str = "https://faculty.example.edu/";
pub const NEXT_PAGE: &str = ".btn-next";

/// Fast, deterministic settings for scripted crawls.
pub fn settings() -> CrawlSettings {
    let mut settings = CrawlSettings::new(DIRECTORY_URL);
    settings.retry = RetryPolicy {
        attempts: 2,
        backoff_ms: 0,
    };
    settings.timeouts = Timeouts {
        page_load_ms: 50,
        context_open_ms: 50,
        content_ms: 50,
        poll_ms: 5,
    };
    settings.age = AgeHeuristic {
        graduation_age: 23,
        reference_year: Some(2023),
    };
    settings
}

/// One listing row: English name, Chinese name, whether it has a "more" control.
pub struct Row<'a>(pub &'a str, pub &'a str, pub bool);

pub fn listing_page(rows: &[Row<'_>]) -> String {
    let body: String = rows
        .iter()
        .map(|Row(en, zh, more)| {
            let button = if *more {
                r#"<button class="el-button el-button--text more-btn">More</button>"#
            } else {
                ""
            };
            let slug = en.to_lowercase().replace(' ', ".");
            format!(
                r#"<tr class="el-table__row">
                     <td class="el-table_1_column_1"><span class="word-adjuest">{en}</span></td>
                     <td class="el-table_1_column_2"><span class="word-adjuest">{zh}</span></td>
                     <td class="el-table_1_column_3"><span class="word-adjuest">Professor</span></td>
                     <td class="el-table_1_column_4"><span class="word-adjuest">Test Thrust</span></td>
                     <td class="el-table_1_column_5"><span class="email-text">{slug}@list.example.edu</span></td>
                     <td class="el-table_1_column_6">{button}</td>
                   </tr>"#
            )
        })
        .collect();
    format!("<html><body><table><tbody>{body}</tbody></table></body></html>")
}

/// Detail page content; `before` is the source until the last tab is clicked.
#[derive(Debug, Clone)]
pub struct DetailPage {
    pub url: String,
    pub before: String,
    pub after: String,
    /// Reloads needed before the ready selector matches; `None` never matches.
    pub ready_after: Option<usize>,
}

impl DetailPage {
    pub fn new(key: &str, degrees: &[&str], tabs: usize, interests: &[&str]) -> Self {
        let slug = key.to_lowercase().replace(' ', "-");
        Self {
            url: format!("{DIRECTORY_URL}profile/{slug}"),
            before: detail_html(&slug, degrees, tabs, &[]),
            after: detail_html(&slug, degrees, tabs, interests),
            ready_after: Some(0),
        }
    }

    pub fn ready_after(mut self, reloads: usize) -> Self {
        self.ready_after = Some(reloads);
        self
    }

    pub fn never_ready(mut self) -> Self {
        self.ready_after = None;
        self
    }
}

fn detail_html(slug: &str, degrees: &[&str], tabs: usize, interests: &[&str]) -> String {
    let degree_lines: String = degrees.iter().map(|d| format!("<p>{d}</p>")).collect();
    let tab_items: String = (0..tabs)
        .map(|i| format!(r#"<div id="tab-{i}" class="el-tabs__item is-top">Tab {i}</div>"#))
        .collect();
    let items: String = interests
        .iter()
        .map(|s| format!(r#"<p class="content">{s}</p>"#))
        .collect();
    let overview = format!("Overview of {slug}.");
    let panes: String = if tabs == 0 {
        format!(r#"<div class="overview-div">{overview}</div>"#)
    } else {
        (0..tabs)
            .map(|i| {
                let inner = match (i == 0, i == tabs - 1) {
                    (true, true) => format!("{overview}{items}"),
                    (true, false) => overview.clone(),
                    (false, true) => items.clone(),
                    (false, false) => String::new(),
                };
                format!(r#"<div id="pane-{i}"><div class="overview-div">{inner}</div></div>"#)
            })
            .collect()
    };
    format!(
        r#"<html><body>
             <div class="card-object-wrap">
               <span class="icon-text">{slug}@detail.example.edu</span>
               <span class="icon-text">Room {slug}</span>
               <a class="icon-text" href="https://{slug}.example.edu">Homepage</a>
             </div>
             <div class="degree-detail">{degree_lines}</div>
             <div class="el-tabs__nav is-top is-stretch">{tab_items}</div>
             {panes}
           </body></html>"#
    )
}

/// How `open_child_context` misbehaves for a given row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The trigger is clicked but no context ever appears.
    ContextTimeout,
    /// The browser dies when the trigger is clicked.
    Fatal,
    /// The row's control cannot be located in the listing.
    TriggerMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Active {
    Primary,
    Child,
}

/// In-memory browsing session playing back scripted pages.
pub struct ScriptedSession {
    primary: ContextHandle,
    pages: Vec<String>,
    page: usize,
    details: HashMap<String, DetailPage>,
    failures: HashMap<String, Failure>,
    active: Active,
    child: Option<(ContextHandle, String)>,
    tab_clicked: bool,
    child_reloads: usize,
    dead: bool,
    cancel_after: Option<(usize, CancellationToken)>,
    /// Row keys in the order their triggers were activated.
    pub opened: Vec<String>,
    /// Largest number of simultaneously open child contexts.
    pub max_children: usize,
    /// Navigations attempted in the primary context.
    pub navigations: usize,
    /// Row keys of every detail-context reload.
    pub reloads: Vec<String>,
}

impl ScriptedSession {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            primary: ContextHandle::new(),
            pages,
            page: 0,
            details: HashMap::new(),
            failures: HashMap::new(),
            active: Active::Primary,
            child: None,
            tab_clicked: false,
            child_reloads: 0,
            dead: false,
            cancel_after: None,
            opened: Vec::new(),
            max_children: 0,
            navigations: 0,
            reloads: Vec::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, page: DetailPage) -> Self {
        self.details.insert(key.to_string(), page);
        self
    }

    pub fn failing(mut self, key: &str, failure: Failure) -> Self {
        self.failures.insert(key.to_string(), failure);
        self
    }

    /// Cancel `token` once `n` detail contexts have been requested.
    pub fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    fn alive(&self) -> SessionResult<()> {
        if self.dead {
            Err(SessionError::Fatal("browser crashed".into()))
        } else {
            Ok(())
        }
    }

    fn child_page(&self) -> SessionResult<&DetailPage> {
        let (_, key) = self
            .child
            .as_ref()
            .ok_or_else(|| SessionError::Command("no child context".into()))?;
        self.details
            .get(key)
            .ok_or_else(|| SessionError::Command(format!("no page scripted for {key}")))
    }

    fn child_ready(&self) -> SessionResult<bool> {
        let page = self.child_page()?;
        Ok(page
            .ready_after
            .is_some_and(|needed| self.child_reloads >= needed))
    }
}

#[async_trait]
impl BrowsingSession for ScriptedSession {
    fn primary_context(&self) -> ContextHandle {
        self.primary.clone()
    }

    async fn navigate(
        &mut self,
        url: &str,
        _ready_selector: &str,
        timeout: Duration,
    ) -> SessionResult<()> {
        self.alive()?;
        if self.active == Active::Primary {
            self.navigations += 1;
        }
        match self.active {
            Active::Child => {
                self.tab_clicked = false;
                self.child_reloads += 1;
                if let Some((_, key)) = &self.child {
                    self.reloads.push(key.clone());
                }
                if self.child_ready()? {
                    Ok(())
                } else {
                    Err(SessionError::NavigationTimeout {
                        url: url.to_string(),
                        waited_ms: timeout.as_millis() as u64,
                    })
                }
            }
            Active::Primary if url == DIRECTORY_URL && !self.pages.is_empty() => {
                self.page = 0;
                Ok(())
            }
            Active::Primary => Err(SessionError::NavigationTimeout {
                url: url.to_string(),
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> SessionResult<bool> {
        self.alive()?;
        match self.active {
            Active::Primary => Ok(true),
            Active::Child => self.child_ready(),
        }
    }

    async fn click(&mut self, selector: &str) -> SessionResult<bool> {
        self.alive()?;
        match self.active {
            Active::Primary if selector == NEXT_PAGE => {
                if self.page + 1 < self.pages.len() {
                    self.page += 1;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Active::Primary => Ok(false),
            Active::Child => {
                let id = selector.trim_start_matches('#');
                let exists = self.child_page()?.before.contains(&format!("id=\"{id}\""));
                self.tab_clicked |= exists;
                Ok(exists)
            }
        }
    }

    async fn page_source(&mut self) -> SessionResult<String> {
        self.alive()?;
        match self.active {
            Active::Primary => Ok(self.pages.get(self.page).cloned().unwrap_or_default()),
            Active::Child => {
                let page = self.child_page()?;
                Ok(if self.tab_clicked {
                    page.after.clone()
                } else {
                    page.before.clone()
                })
            }
        }
    }

    async fn current_url(&mut self) -> SessionResult<String> {
        self.alive()?;
        match self.active {
            Active::Primary => Ok(DIRECTORY_URL.to_string()),
            Active::Child if self.child_ready()? => Ok(self.child_page()?.url.clone()),
            Active::Child => Ok("about:blank".to_string()),
        }
    }

    async fn open_child_context(
        &mut self,
        trigger: &TriggerRef,
        timeout: Duration,
    ) -> SessionResult<ContextHandle> {
        self.alive()?;
        if self.active != Active::Primary {
            return Err(SessionError::Command("trigger activated outside primary".into()));
        }
        let key = trigger.row_key.as_str().to_string();
        let listing = self.pages.get(self.page).cloned().unwrap_or_default();
        if !listing.contains(&format!(">{key}<")) {
            return Err(SessionError::TriggerNotFound(key));
        }

        self.opened.push(key.clone());
        if let Some((n, token)) = &self.cancel_after {
            if self.opened.len() >= *n {
                token.cancel();
            }
        }

        match self.failures.get(&key) {
            Some(Failure::Fatal) => {
                self.dead = true;
                return Err(SessionError::Fatal("browser crashed".into()));
            }
            Some(Failure::TriggerMissing) => return Err(SessionError::TriggerNotFound(key)),
            Some(Failure::ContextTimeout) => {
                return Err(SessionError::ContextNotOpened {
                    row: key,
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            None => {}
        }
        if !self.details.contains_key(&key) {
            return Err(SessionError::ContextNotOpened {
                row: key,
                waited_ms: timeout.as_millis() as u64,
            });
        }

        let open = if self.child.is_some() { 2 } else { 1 };
        self.max_children = self.max_children.max(open);
        let handle = ContextHandle::new();
        self.child = Some((handle.clone(), key));
        self.tab_clicked = false;
        self.child_reloads = 0;
        Ok(handle)
    }

    async fn switch_to(&mut self, context: &ContextHandle) -> SessionResult<()> {
        self.alive()?;
        if *context == self.primary {
            self.active = Active::Primary;
            return Ok(());
        }
        match &self.child {
            Some((handle, _)) if handle == context => {
                self.active = Active::Child;
                Ok(())
            }
            _ => Err(SessionError::Command(format!("unknown context {context}"))),
        }
    }

    async fn close_context(&mut self, context: &ContextHandle) -> SessionResult<()> {
        self.alive()?;
        if matches!(&self.child, Some((handle, _)) if handle == context) {
            self.child = None;
        }
        Ok(())
    }

    async fn restore_primary(&mut self) -> SessionResult<()> {
        self.alive()?;
        self.child = None;
        self.tab_clicked = false;
        self.active = Active::Primary;
        Ok(())
    }
}

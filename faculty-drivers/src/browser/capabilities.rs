use faculty_common::{BrowserKind, BrowserSettings};
use serde_json::json;
use webdriver::capabilities::Capabilities;

/// Command-line arguments for the configured browser.
pub fn browser_arguments(settings: &BrowserSettings) -> Vec<String> {
    match settings.kind {
        BrowserKind::Chrome => {
            let mut args = vec![
                "--disable-dev-shm-usage".to_string(),
                "--no-sandbox".to_string(),
                "--disable-extensions".to_string(),
                format!(
                    "--window-size={},{}",
                    settings.window_width, settings.window_height
                ),
            ];
            if let Some(ua) = &settings.user_agent {
                args.push(format!("--user-agent={ua}"));
            }
            if settings.headless {
                args.push("--headless=new".to_string());
                args.push("--disable-gpu".to_string());
            }
            args
        }
        BrowserKind::Firefox => {
            let mut args = vec![
                format!("--width={}", settings.window_width),
                format!("--height={}", settings.window_height),
            ];
            if settings.headless {
                args.push("-headless".to_string());
            }
            args
        }
    }
}

/// W3C capabilities requesting a normal page-load strategy.
pub fn build_capabilities(settings: &BrowserSettings) -> Capabilities {
    let mut caps = Capabilities::new();
    let args = browser_arguments(settings);
    caps.insert("pageLoadStrategy".to_string(), json!("normal"));

    match settings.kind {
        BrowserKind::Chrome => {
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
        BrowserKind::Firefox => {
            let mut opts = json!({ "args": args });
            if let Some(ua) = &settings.user_agent {
                opts["prefs"] = json!({ "general.useragent.override": ua });
            }
            caps.insert("moz:firefoxOptions".to_string(), opts);
        }
    }
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_chrome_gets_headless_flag() {
        let settings = BrowserSettings::default();
        let args = browser_arguments(&settings);
        assert!(args.iter().any(|a| a.starts_with("--headless")));
        assert!(args.contains(&"--window-size=1366,900".to_string()));

        let caps = build_capabilities(&settings);
        assert!(caps.contains_key("goog:chromeOptions"));
    }

    #[test]
    fn firefox_options_carry_user_agent() {
        let settings = BrowserSettings {
            kind: BrowserKind::Firefox,
            headless: false,
            user_agent: Some("crawler/1.0".into()),
            ..BrowserSettings::default()
        };
        assert!(!browser_arguments(&settings).contains(&"-headless".to_string()));

        let caps = build_capabilities(&settings);
        let opts = &caps["moz:firefoxOptions"];
        assert_eq!(opts["prefs"]["general.useragent.override"], "crawler/1.0");
    }
}

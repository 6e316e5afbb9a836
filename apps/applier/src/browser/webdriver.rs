//! W3C WebDriver client (chromedriver, geckodriver, Selenium) over reqwest.
//!
//! Only the handful of endpoints the bot needs are wrapped: session
//! create/delete, navigation, element lookup, typing, clicking and
//! synchronous script execution. Everything page-specific lives in
//! `scripts`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::scripts;
use super::{BrowserError, ControlIntent, ExitChoice, FormDriver, JobBoard};
use crate::form::descriptor::{FieldAction, FieldDescriptor, FieldKind};

const LOGIN_URL: &str = "https://www.linkedin.com/login";
const JOB_SEARCH_URL: &str = "https://www.linkedin.com/jobs/search/";
/// Post-login URL fragments that mean the login went through.
const LOGGED_IN_MARKERS: [&str; 3] = ["feed", "mynetwork", "/in/"];
/// W3C key for element references in responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735da5ad5f";

const SHORT_PAUSE: Duration = Duration::from_millis(500);
const DROPDOWN_PAUSE: Duration = Duration::from_millis(700);
const PAGE_PAUSE: Duration = Duration::from_secs(2);
const LOGIN_PAUSE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// One live browser session.
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
    credentials: LoginCredentials,
}

impl WebDriverSession {
    /// Creates a new browser session on the WebDriver server at `url`.
    pub async fn connect(
        url: &str,
        headless: bool,
        credentials: LoginCredentials,
    ) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let base_url = url.trim_end_matches('/').to_string();

        let response = client
            .post(format!("{base_url}/session"))
            .json(&session_capabilities(headless))
            .send()
            .await?;
        let value = decode_response(response).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Session("WebDriver returned no session id".to_string()))?
            .to_string();

        info!(%session_id, headless, "WebDriver session created");
        Ok(Self {
            client,
            base_url,
            session_id,
            credentials,
        })
    }

    pub async fn close(&self) -> Result<(), BrowserError> {
        let response = self
            .client
            .delete(format!("{}/session/{}", self.base_url, self.session_id))
            .send()
            .await?;
        decode_response(response).await?;
        debug!(session_id = %self.session_id, "WebDriver session closed");
        Ok(())
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        decode_response(request.send().await?).await
    }

    pub async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/url", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Script(format!("current url: {value}")))
    }

    pub async fn find_element(&self, css: &str) -> Result<String, BrowserError> {
        let value = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": css })),
            )
            .await?;
        element_id(&value).ok_or_else(|| BrowserError::NotFound(css.to_string()))
    }

    async fn clear(&self, element: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, &format!("/element/{element}/clear"), Some(json!({})))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &str, text: &str) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &format!("/element/{element}/value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn click(&self, element: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, &format!("/element/{element}/click"), Some(json!({})))
            .await?;
        Ok(())
    }

    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, BrowserError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn execute_bool(&self, script: &str, args: Vec<Value>) -> Result<bool, BrowserError> {
        let value = self.execute(script, args).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn type_into(&self, handle: &str, text: &str) -> Result<(), BrowserError> {
        let element = self.find_element(&scripts::handle_selector(handle)).await?;
        self.clear(&element).await?;
        self.send_keys(&element, text).await?;
        self.execute(&scripts::dispatch_change(), vec![json!(handle)])
            .await?;
        Ok(())
    }

    async fn upload(&self, handle: &str, path: &Path) -> Result<(), BrowserError> {
        let element = self.find_element(&scripts::handle_selector(handle)).await?;
        self.send_keys(&element, &path.to_string_lossy()).await
    }
}

fn session_capabilities(headless: bool) -> Value {
    let mut args = vec![
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--window-size=1920,1080",
    ];
    if headless {
        args.push("--headless=new");
    }
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args },
                "timeouts": { "script": 30_000, "pageLoad": 60_000 }
            }
        }
    })
}

/// Unwraps `{"value": ...}`, turning W3C error bodies into `BrowserError`.
async fn decode_response(response: reqwest::Response) -> Result<Value, BrowserError> {
    let status = response.status();
    let body: WireResponse = response.json().await?;
    if status.is_success() {
        Ok(body.value)
    } else {
        Err(protocol_error(status.as_u16(), body.value))
    }
}

fn protocol_error(status: u16, value: Value) -> BrowserError {
    match serde_json::from_value::<WireError>(value) {
        Ok(err) if err.error == "no such element" => BrowserError::NotFound(err.message),
        Ok(err) => BrowserError::Protocol {
            status,
            error: err.error,
            message: err.message,
        },
        Err(_) => BrowserError::Protocol {
            status,
            error: "unknown error".to_string(),
            message: String::new(),
        },
    }
}

fn element_id(value: &Value) -> Option<String> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Easy Apply only, posted in the last week.
fn search_url(keyword: &str, location: &str) -> Result<Url, BrowserError> {
    Url::parse_with_params(
        JOB_SEARCH_URL,
        &[
            ("keywords", keyword),
            ("location", location),
            ("f_AL", "true"),
            ("f_TPR", "r604800"),
        ],
    )
    .map_err(|e| BrowserError::Session(format!("invalid search url: {e}")))
}

fn is_logged_in(url: &str) -> bool {
    LOGGED_IN_MARKERS.iter().any(|m| url.contains(m))
}

fn string_list(value: Value) -> Result<Vec<String>, BrowserError> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other).map_err(|e| BrowserError::Script(e.to_string())),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FormDriver
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl FormDriver for WebDriverSession {
    async fn find_fields(&self) -> Result<Vec<FieldDescriptor>, BrowserError> {
        let value = self.execute(&scripts::scan_fields(), Vec::new()).await?;
        serde_json::from_value(value).map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn apply_value(
        &self,
        field: &FieldDescriptor,
        action: &FieldAction,
    ) -> Result<(), BrowserError> {
        match action {
            FieldAction::Type(text) => self.type_into(&field.handle, text).await?,
            FieldAction::Select { index, text } => {
                let selected = self
                    .execute_bool(
                        &scripts::select_option(),
                        vec![json!(field.handle), json!(index)],
                    )
                    .await?;
                if !selected {
                    return Err(BrowserError::NotFound(format!(
                        "option '{text}' in '{}'",
                        field.label
                    )));
                }
            }
            FieldAction::Check => {
                if !field.checked {
                    let element = self
                        .find_element(&scripts::handle_selector(&field.handle))
                        .await?;
                    self.click(&element).await?;
                }
            }
            FieldAction::Upload(path) => self.upload(&field.handle, path).await?,
        }
        sleep(SHORT_PAUSE).await;
        Ok(())
    }

    async fn load_options(&self, field: &FieldDescriptor) -> Result<Vec<String>, BrowserError> {
        let native = self
            .execute(&scripts::load_options(), vec![json!(field.handle)])
            .await?;
        if field.kind == FieldKind::Dropdown && !native.is_null() {
            return string_list(native);
        }
        sleep(DROPDOWN_PAUSE).await;
        let rendered = self.execute(&scripts::rendered_options(), Vec::new()).await?;
        string_list(rendered)
    }

    async fn read_validation_errors(&self) -> Result<Vec<String>, BrowserError> {
        let value = self.execute(&scripts::validation_errors(), Vec::new()).await?;
        string_list(value)
    }

    async fn click_control(&self, intent: ControlIntent) -> Result<(), BrowserError> {
        let clicked = self
            .execute_bool(&scripts::click_control(), vec![json!(intent.button_text())])
            .await?;
        if !clicked {
            return Err(BrowserError::NotFound(format!("{intent:?} button")));
        }
        sleep(PAGE_PAUSE).await;
        Ok(())
    }

    async fn is_application_complete(&self) -> Result<bool, BrowserError> {
        self.execute_bool(&scripts::application_complete(), Vec::new())
            .await
    }

    async fn has_pending_fields(&self) -> Result<bool, BrowserError> {
        self.execute_bool(&scripts::pending_fields(), Vec::new()).await
    }

    async fn exit_prompt_visible(&self) -> Result<bool, BrowserError> {
        self.execute_bool(&scripts::exit_prompt_visible(), Vec::new())
            .await
    }

    async fn resolve_exit_prompt(&self, choice: ExitChoice) -> Result<(), BrowserError> {
        let resolved = self
            .execute_bool(&scripts::resolve_exit_prompt(), vec![json!(choice.label())])
            .await?;
        if !resolved {
            return Err(BrowserError::NotFound(format!("'{}' exit option", choice.label())));
        }
        sleep(SHORT_PAUSE).await;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// JobBoard
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl JobBoard for WebDriverSession {
    async fn establish_session(&self) -> Result<(), BrowserError> {
        self.navigate(LOGIN_URL).await?;
        sleep(PAGE_PAUSE).await;

        let login_failed = |e: BrowserError| BrowserError::Session(format!("login form: {e}"));
        let username = self.find_element("#username").await.map_err(login_failed)?;
        self.send_keys(&username, &self.credentials.email).await?;
        let password = self.find_element("#password").await.map_err(login_failed)?;
        self.send_keys(&password, &self.credentials.password).await?;
        let submit = self
            .find_element("button[type='submit']")
            .await
            .map_err(login_failed)?;
        self.click(&submit).await?;
        sleep(LOGIN_PAUSE).await;

        let landed = self.current_url().await?;
        if !is_logged_in(&landed) {
            return Err(BrowserError::Session(format!(
                "login did not complete, browser is at {landed}"
            )));
        }
        info!("Logged in");
        Ok(())
    }

    async fn search(&self, keyword: &str, location: &str) -> Result<(), BrowserError> {
        let url = search_url(keyword, location)?;
        debug!(%url, "Opening job search");
        self.navigate(url.as_str()).await?;
        sleep(PAGE_PAUSE).await;
        Ok(())
    }

    async fn posting_count(&self) -> Result<usize, BrowserError> {
        let value = self.execute(&scripts::posting_count(), Vec::new()).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| BrowserError::Script(format!("posting count: {value}")))
    }

    async fn open_posting(&self, index: usize) -> Result<Option<String>, BrowserError> {
        let card_title = self
            .execute(&scripts::open_posting(), vec![json!(index)])
            .await?;
        sleep(PAGE_PAUSE).await;

        let detail_title = match self.execute(&scripts::detail_title(), Vec::new()).await {
            Ok(value) => value.as_str().map(str::to_string),
            Err(e) => {
                warn!("Could not read posting title: {e}");
                None
            }
        };
        Ok(detail_title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| card_title.as_str().map(str::to_string)))
    }

    async fn open_easy_apply(&self) -> Result<bool, BrowserError> {
        let opened = self
            .execute_bool(&scripts::open_easy_apply(), Vec::new())
            .await?;
        if opened {
            sleep(PAGE_PAUSE).await;
        }
        Ok(opened)
    }

    async fn load_more(&self) -> Result<bool, BrowserError> {
        let before = self.posting_count().await?;
        self.execute(&scripts::scroll_results(), Vec::new()).await?;
        sleep(PAGE_PAUSE).await;
        let after = self.posting_count().await?;
        debug!(before, after, "Scrolled results list");
        Ok(after > before)
    }

    async fn dismiss_overlays(&self) -> Result<(), BrowserError> {
        let closed = self.execute(&scripts::dismiss_overlays(), Vec::new()).await?;
        if closed.as_u64().unwrap_or(0) > 0 {
            sleep(SHORT_PAUSE).await;
            if self.exit_prompt_visible().await.unwrap_or(false) {
                self.resolve_exit_prompt(ExitChoice::Discard).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_terms_and_filters() {
        let url = search_url("rust & go", "São Paulo").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.path(), "/jobs/search/");
        assert!(pairs.contains(&("keywords".into(), "rust & go".into())));
        assert!(pairs.contains(&("location".into(), "São Paulo".into())));
        assert!(pairs.contains(&("f_AL".into(), "true".into())));
        assert!(pairs.contains(&("f_TPR".into(), "r604800".into())));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_login_markers() {
        assert!(is_logged_in("https://www.linkedin.com/feed/"));
        assert!(is_logged_in("https://www.linkedin.com/in/ayesha-khan/"));
        assert!(!is_logged_in("https://www.linkedin.com/checkpoint/challenge/123"));
        assert!(!is_logged_in("https://www.linkedin.com/login"));
    }

    #[test]
    fn test_no_such_element_maps_to_not_found() {
        let err = protocol_error(
            404,
            json!({ "error": "no such element", "message": "Unable to locate #username" }),
        );
        assert!(err.is_not_found());

        let err = protocol_error(
            500,
            json!({ "error": "javascript error", "message": "root is null" }),
        );
        match err {
            BrowserError::Protocol { status, error, message } => {
                assert_eq!(status, 500);
                assert_eq!(error, "javascript error");
                assert_eq!(message, "root is null");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            protocol_error(502, json!("bad gateway")),
            BrowserError::Protocol { status: 502, .. }
        ));
    }

    #[test]
    fn test_element_id_reads_w3c_reference() {
        let value = json!({ ELEMENT_KEY: "abc-123" });
        assert_eq!(element_id(&value).as_deref(), Some("abc-123"));
        assert_eq!(element_id(&json!({})), None);
    }

    #[test]
    fn test_headless_flag_controls_chrome_args() {
        let caps = session_capabilities(true);
        let args = caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));

        let caps = session_capabilities(false);
        let args = caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn test_null_script_result_is_empty_list() {
        assert!(string_list(Value::Null).unwrap().is_empty());
        assert_eq!(
            string_list(json!(["Yes", "No"])).unwrap(),
            vec!["Yes".to_string(), "No".to_string()]
        );
        assert!(string_list(json!(42)).is_err());
    }
}

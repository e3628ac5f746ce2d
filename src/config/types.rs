use serde::Deserialize;

/// Main configuration structure for UR-Watch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

/// The monitored property and the listing endpoint serving it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetConfig {
    /// Room listing endpoint (accepts a form POST)
    pub endpoint: String,

    /// Public property id, e.g. "7080"
    pub property_id: String,

    /// Regional branch code sent as `shisya`
    pub shisya: String,

    /// Property code sent as `danchi`; derived from `property_id` when absent
    #[serde(default)]
    pub danchi: Option<String>,

    /// Page indexes requested on every run, in order
    #[serde(default = "default_page_indexes")]
    pub page_indexes: Vec<u32>,

    /// Human-facing property URL appended to notifications
    #[serde(default)]
    pub link: Option<String>,

    /// Additional form fields sent with every request, in order
    #[serde(default = "default_extra_params")]
    pub extra_params: Vec<(String, String)>,
}

impl TargetConfig {
    /// Returns the `danchi` code, deriving it from the property id if needed
    ///
    /// A four digit id ending in `0` drops the trailing zero (`7080` → `708`);
    /// any other id is used verbatim.
    pub fn danchi_code(&self) -> String {
        if let Some(danchi) = &self.danchi {
            return danchi.clone();
        }
        let id = self.property_id.as_str();
        if id.len() == 4 && id.ends_with('0') {
            id[..3].to_string()
        } else {
            id.to_string()
        }
    }

    /// Returns the human-facing property link
    pub fn property_link(&self) -> String {
        self.link.clone().unwrap_or_else(|| {
            format!(
                "https://www.ur-net.go.jp/chintai/kanto/tokyo/{}_{}.html",
                self.shisya, self.property_id
            )
        })
    }
}

/// HTTP behavior of the page fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetcherConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Delay before the single retry of a transient failure (milliseconds)
    pub retry_backoff_ms: u64,

    pub user_agent: String,
    pub origin: Option<String>,
    pub referer: Option<String>,

    /// Request all pages at once instead of one after another
    pub concurrent: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            retry_backoff_ms: 2000,
            user_agent: format!("ur-watch/{}", env!("CARGO_PKG_VERSION")),
            origin: Some("https://www.ur-net.go.jp".to_string()),
            referer: Some("https://www.ur-net.go.jp/".to_string()),
            concurrent: false,
        }
    }
}

/// Which backend keeps the last snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    #[default]
    Json,
    Sqlite,
}

/// Persisted state location
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StateConfig {
    pub backend: StateBackend,

    /// State file path; defaults to `.state-<property-id>.json`
    pub path: Option<String>,
}

impl StateConfig {
    /// Returns the state path for the given property
    pub fn resolved_path(&self, property_id: &str) -> String {
        self.path.clone().unwrap_or_else(|| match self.backend {
            StateBackend::Json => format!(".state-{}.json", property_id),
            StateBackend::Sqlite => format!(".state-{}.db", property_id),
        })
    }
}

/// Notification transport settings (secrets come from the environment)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NotifyConfig {
    /// Title used in message headers
    pub title: String,

    /// Environment variable holding the API token
    pub token_env: String,

    /// Chat room id; falls back to the `CHATWORK_ROOM_ID` environment variable
    pub room_id: Option<String>,

    pub api_base: String,

    /// Maximum rooms listed per section of a change message
    pub max_listed: usize,

    /// Send a short error report when every page failed
    pub notify_on_failure: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            title: "UR監視".to_string(),
            token_env: "CHATWORK_TOKEN".to_string(),
            room_id: None,
            api_base: "https://api.chatwork.com".to_string(),
            max_listed: 5,
            notify_on_failure: false,
        }
    }
}

/// Local-time window in which the external scheduler's invocations should run
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WindowConfig {
    /// Window start, `HH:MM`
    pub start: String,

    /// Window end, `HH:MM`, inclusive to the end of that minute
    pub end: String,

    pub utc_offset_hours: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: "09:30".to_string(),
            end: "18:59".to_string(),
            utc_offset_hours: 9,
        }
    }
}

fn default_page_indexes() -> Vec<u32> {
    vec![0, 1, 2]
}

fn default_extra_params() -> Vec<(String, String)> {
    [
        ("rent_low", ""),
        ("rent_high", ""),
        ("floorspace_low", ""),
        ("floorspace_high", ""),
        ("shikibetu", "0"),
        ("newBukkenRoom", ""),
        ("orderByField", "0"),
        ("orderBySort", "0"),
        ("sp", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

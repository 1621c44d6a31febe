use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use strum::Display;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub integrity: Integrity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
}

/// What happens to dependent rows when a user or post is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DeletePolicy {
    /// Refuse the delete while anything still references the row.
    #[strum(serialize = "restrict")]
    Restrict,
    /// Remove dependents first, in the same transaction.
    #[strum(serialize = "cascade")]
    Cascade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integrity {
    pub user_delete: DeletePolicy,
    pub post_delete: DeletePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Database {
                url: "social.db".to_string(),
                pool_size: 5,
                busy_timeout_ms: 2000,
            },
            integrity: Integrity {
                user_delete: DeletePolicy::Cascade,
                post_delete: DeletePolicy::Cascade,
            },
        }
    }
}

impl Settings {
    pub fn load() -> &'static Settings {
        SETTINGS.get_or_init(Self::load_from_files)
    }

    fn load_from_files() -> Settings {
        let default_path = Path::new("settings.default.ron");
        let override_path = Path::new("settings.ron");

        let mut settings = if default_path.exists() {
            fs::read_to_string(default_path)
                .ok()
                .and_then(|content| ron::from_str(&content).ok())
                .unwrap_or_default()
        } else {
            Settings::default()
        };

        if override_path.exists() {
            if let Ok(content) = fs::read_to_string(override_path) {
                if let Ok(overrides) = ron::from_str::<Settings>(&content) {
                    settings = overrides;
                }
            }
        }

        settings.with_database_url(std::env::var("DATABASE_URL").ok())
    }

    /// `DATABASE_URL` wins over whatever the RON files say; a blank value is ignored.
    pub fn with_database_url(mut self, url: Option<String>) -> Settings {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.database.url = url;
        }
        self
    }
}

pub fn settings() -> &'static Settings {
    Settings::load()
}

/// Toggles read at startup and passed to every operation that depends on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub reciprocal_tasks: bool,
    pub quality_score: bool,
    pub task_credits: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            reciprocal_tasks: true,
            quality_score: true,
            task_credits: true,
        }
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub db_namespace: String,
    pub db_database: String,
    pub db_password: Option<String>,
    pub db_username: Option<String>,
    pub db_url: String,
    pub reciprocal_tasks_enabled: bool,
    pub quality_score_enabled: bool,
    pub task_credits_enabled: bool,
    pub operator_ids: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let db_namespace = std::env::var("DB_NAMESPACE").unwrap_or("namespace".to_string());
        let db_database = std::env::var("DB_DATABASE").unwrap_or("database".to_string());
        let db_password = std::env::var("DB_PASSWORD").ok();
        let db_username = std::env::var("DB_USERNAME").ok();
        let db_url = std::env::var("DB_URL").unwrap_or("mem://".to_string());

        let reciprocal_tasks_enabled = env_flag("RECIPROCAL_TASKS_ENABLED");
        let quality_score_enabled = env_flag("QUALITY_SCORE_ENABLED");
        let task_credits_enabled = env_flag("TASK_CREDITS_ENABLED");

        let operator_ids = std::env::var("OPERATOR_IDS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        Self {
            db_namespace,
            db_database,
            db_password,
            db_username,
            db_url,
            reciprocal_tasks_enabled,
            quality_score_enabled,
            task_credits_enabled,
            operator_ids,
        }
    }

    pub fn feature_flags(&self) -> FeatureFlags {
        FeatureFlags {
            reciprocal_tasks: self.reciprocal_tasks_enabled,
            quality_score: self.quality_score_enabled,
            task_credits: self.task_credits_enabled,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v))
        .unwrap_or(true)
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

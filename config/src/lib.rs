pub mod paths;
pub mod settings;

pub use paths::PathManager;
pub use settings::Settings;

use directories::BaseDirs;

/// Server used when neither flags, environment nor settings name one.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Load environment variables from .env files.
/// First loads from ~/.env (home directory), then from ./.env (project directory).
/// Call this before parsing CLI args so `env`-backed flags see the values.
pub fn load_env_file() {
    if let Some(dirs) = BaseDirs::new() {
        dotenv::from_path(dirs.home_dir().join(".env")).ok();
    }

    // dotenv never overrides variables that are already set
    dotenv::dotenv().ok();
}

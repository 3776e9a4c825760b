use std::env;

const CONFIG_DIR_ENV_VAR: &str = "POWERSTATION_CONFIG_DIR";

pub fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        eprintln!("Loaded local .env");
    }
    // Also load $POWERSTATION_CONFIG_DIR/.env if it exists
    if let Ok(config_dir) = env::var(CONFIG_DIR_ENV_VAR) {
        let config_dotenv = format!("{config_dir}/.env");
        if dotenv::from_path(&config_dotenv).is_ok() {
            eprintln!("Loaded {config_dotenv}");
        }
    }
}

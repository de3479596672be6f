use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct IntakePaths {
    pub intake_home: PathBuf,
    pub logs_dir: PathBuf,
    pub state_file: PathBuf,
    pub lock_file: PathBuf,
    pub config_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<IntakePaths> {
    let home = required_home_dir()?;
    let intake_home = env_or_default_path("INTAKE_HOME", home.join(".recording-intake"));

    let logs_dir = env_or_default_path("INTAKE_LOGS_DIR", intake_home.join("logs"));
    let state_file =
        env_or_default_path("INTAKE_STATE_FILE", intake_home.join("state/intake_state.json"));
    let lock_file = intake_home.join("intake.lock");
    let config_file = env_or_default_path("INTAKE_CONFIG_PATH", intake_home.join("intake.toml"));

    Ok(IntakePaths {
        intake_home,
        logs_dir,
        state_file,
        lock_file,
        config_file,
    })
}

use std::path::{Path, PathBuf};

use crate::world::tuning::DEFAULT_CLIENT_TIMEOUT_SECS;

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub client_timeout_secs: i64,
    pub spawn_enabled: bool,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: ravenmoor <data-root> [client_timeout_secs]".to_string());
        }

        let root = Path::new(&args[1]).to_path_buf();
        let client_timeout_secs = if args.len() > 2 {
            args[2]
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid client timeout '{}'", args[2]))?
        } else {
            match std::env::var("RAVENMOOR_CLIENT_TIMEOUT_SECS") {
                Ok(value) => match value.trim().parse::<i64>() {
                    Ok(parsed) => parsed,
                    Err(_) => {
                        eprintln!(
                            "ravenmoor: invalid RAVENMOOR_CLIENT_TIMEOUT_SECS '{}', using default",
                            value
                        );
                        DEFAULT_CLIENT_TIMEOUT_SECS
                    }
                },
                Err(_) => DEFAULT_CLIENT_TIMEOUT_SECS,
            }
        };
        if client_timeout_secs <= 0 {
            return Err(format!(
                "client timeout must be positive, got {client_timeout_secs}"
            ));
        }
        let spawn_enabled = match std::env::var("RAVENMOOR_SPAWNS") {
            Ok(value) => !matches!(value.trim(), "0" | "off" | "false"),
            Err(_) => true,
        };
        Ok(Self {
            root,
            client_timeout_secs,
            spawn_enabled,
        })
    }
}

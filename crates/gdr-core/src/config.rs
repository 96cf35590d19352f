use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

const MIB: u64 = 1024 * 1024;

/// Default per-file upload ceiling, kept just under Telegram's 2 GiB hard limit.
pub const DEFAULT_MAX_UPLOAD_MIB: u64 = 1995;

/// Typed configuration, built once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,
    pub telegram_api_url: Option<String>,
    pub upload_timeout: Duration,

    // Downloads
    pub download_root: PathBuf,
    pub gdown_path: PathBuf,
    pub gdown_args: Vec<String>,
    pub fetch_timeout: Option<Duration>,
    pub keep_failed_downloads: bool,

    // Relay
    pub max_upload_bytes: u64,
}

impl Config {
    /// Load from the process environment, seeding it from `.env` when present.
    pub fn load() -> Result<Self> {
        // Existing env vars win over `.env` entries.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;
        let telegram_allowed_users =
            parse_csv_i64("TELEGRAM_ALLOWED_USERS", get("TELEGRAM_ALLOWED_USERS"))?;
        let telegram_api_url = get("TELEGRAM_API_URL");
        let upload_timeout = Duration::from_secs(
            parse_u64("UPLOAD_TIMEOUT_SECS", get("UPLOAD_TIMEOUT_SECS"))?.unwrap_or(900),
        );

        let download_root =
            PathBuf::from(get("DOWNLOAD_DIR").unwrap_or_else(|| "downloads".to_string()));
        let gdown_path = get("GDOWN_PATH")
            .map(PathBuf::from)
            .or_else(|| which_in_path("gdown", lookup("PATH")))
            .unwrap_or_else(|| PathBuf::from("gdown"));
        let gdown_args = get("GDOWN_ARGS")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let fetch_timeout = parse_u64("FETCH_TIMEOUT_SECS", get("FETCH_TIMEOUT_SECS"))?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let keep_failed_downloads =
            parse_bool("KEEP_FAILED_DOWNLOADS", get("KEEP_FAILED_DOWNLOADS"))?.unwrap_or(false);

        let max_upload_mib =
            parse_u64("MAX_UPLOAD_MIB", get("MAX_UPLOAD_MIB"))?.unwrap_or(DEFAULT_MAX_UPLOAD_MIB);
        if max_upload_mib == 0 {
            return Err(Error::Config(
                "MAX_UPLOAD_MIB must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            telegram_api_url,
            upload_timeout,
            download_root,
            gdown_path,
            gdown_args,
            fetch_timeout,
            keep_failed_downloads,
            max_upload_bytes: max_upload_mib.saturating_mul(MIB),
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn parse_u64(key: &str, v: Option<String>) -> Result<Option<u64>> {
    v.map(|s| {
        s.parse::<u64>()
            .map_err(|e| Error::Config(format!("{key}={s:?} is not a valid number: {e}")))
    })
    .transpose()
}

fn parse_bool(key: &str, v: Option<String>) -> Result<Option<bool>> {
    v.map(|s| match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key}={s:?} is not a valid boolean"))),
    })
    .transpose()
}

fn parse_csv_i64(key: &str, v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| Error::Config(format!("{key}: {s:?} is not a user id: {e}")))
        })
        .collect()
}

fn which_in_path(binary: &str, path: Option<String>) -> Option<PathBuf> {
    let path = path?;
    env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable_file(candidate))
}

fn is_executable_file(p: &Path) -> bool {
    if !p.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(md) = std::fs::metadata(p) {
            return (md.permissions().mode() & 0o111) != 0;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cfg_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn token_is_required() {
        let err = cfg_from(&[]).unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("TELEGRAM_BOT_TOKEN")));

        let err = cfg_from(&[("TELEGRAM_BOT_TOKEN", "   ")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn falls_back_to_legacy_token_name() {
        let cfg = cfg_from(&[("BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(cfg.telegram_bot_token, "123:abc");
    }

    #[test]
    fn defaults() {
        let cfg = cfg_from(&[("TELEGRAM_BOT_TOKEN", "t"), ("PATH", "")]).unwrap();
        assert!(cfg.telegram_allowed_users.is_empty());
        assert_eq!(cfg.telegram_api_url, None);
        assert_eq!(cfg.download_root, PathBuf::from("downloads"));
        assert_eq!(cfg.gdown_path, PathBuf::from("gdown"));
        assert!(cfg.gdown_args.is_empty());
        assert_eq!(cfg.fetch_timeout, None);
        assert!(!cfg.keep_failed_downloads);
        assert_eq!(cfg.max_upload_bytes, 1995 * 1024 * 1024);
        assert_eq!(cfg.upload_timeout, Duration::from_secs(900));
    }

    #[test]
    fn overrides() {
        let cfg = cfg_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_ALLOWED_USERS", "1, 2,,3"),
            ("DOWNLOAD_DIR", "/srv/gdr"),
            ("GDOWN_PATH", "/opt/gdown"),
            ("GDOWN_ARGS", "--remaining-ok  --fuzzy"),
            ("FETCH_TIMEOUT_SECS", "60"),
            ("KEEP_FAILED_DOWNLOADS", "yes"),
            ("MAX_UPLOAD_MIB", "49"),
        ])
        .unwrap();
        assert_eq!(cfg.telegram_allowed_users, vec![1, 2, 3]);
        assert_eq!(cfg.download_root, PathBuf::from("/srv/gdr"));
        assert_eq!(cfg.gdown_path, PathBuf::from("/opt/gdown"));
        assert_eq!(cfg.gdown_args, vec!["--remaining-ok", "--fuzzy"]);
        assert_eq!(cfg.fetch_timeout, Some(Duration::from_secs(60)));
        assert!(cfg.keep_failed_downloads);
        assert_eq!(cfg.max_upload_bytes, 49 * 1024 * 1024);
    }

    #[test]
    fn zero_fetch_timeout_means_unbounded() {
        let cfg =
            cfg_from(&[("TELEGRAM_BOT_TOKEN", "t"), ("FETCH_TIMEOUT_SECS", "0")]).unwrap();
        assert_eq!(cfg.fetch_timeout, None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        for (k, v) in [
            ("MAX_UPLOAD_MIB", "lots"),
            ("MAX_UPLOAD_MIB", "0"),
            ("FETCH_TIMEOUT_SECS", "-1"),
            ("KEEP_FAILED_DOWNLOADS", "maybe"),
            ("TELEGRAM_ALLOWED_USERS", "1,bob"),
        ] {
            let err = cfg_from(&[("TELEGRAM_BOT_TOKEN", "t"), (k, v)]).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{k}={v} should fail");
        }
    }
}

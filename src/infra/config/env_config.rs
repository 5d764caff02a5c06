// Environment configuration.
//
// Everything is read from process env (after `.env` is loaded by dotenv in
// main). Parsing goes through a lookup function so tests can feed a plain map
// instead of mutating the real environment.

use crate::core::announcements::BroadcastConfig;
use crate::core::tickets::TicketConfig;
use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_KEEP_ALIVE_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub tickets: TicketConfig,
    pub broadcast: BroadcastConfig,
    pub ban_appeal_url: Option<String>,
    pub keep_alive_port: u16,
    /// Register commands in this guild only (instant updates while developing).
    pub dev_guild_id: Option<u64>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("DISCORD_TOKEN").context(
            "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
        )?;

        let mut tickets = TicketConfig::default();
        if let Some(raw) = get("TICKET_CATEGORY_IDS") {
            tickets.categories = parse_list::<u64>("TICKET_CATEGORY_IDS", &raw)?;
        }
        if let Some(secs) = parse_opt::<u64>("TICKET_IDLE_SECS", get("TICKET_IDLE_SECS"))? {
            tickets.idle_threshold = Duration::from_secs(secs);
        }
        if let Some(secs) =
            parse_opt::<u64>("TICKET_REPLY_WINDOW_SECS", get("TICKET_REPLY_WINDOW_SECS"))?
        {
            tickets.reply_window = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_opt::<u64>("TICKET_GRACE_SECS", get("TICKET_GRACE_SECS"))? {
            tickets.grace_delay = Duration::from_secs(secs);
        }
        if let Some(secs) =
            parse_opt::<u64>("TICKET_SWEEP_INTERVAL_SECS", get("TICKET_SWEEP_INTERVAL_SECS"))?
        {
            if secs == 0 {
                bail!("TICKET_SWEEP_INTERVAL_SECS must be greater than zero");
            }
            tickets.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(raw) = get("TICKET_AFFIRMATIVE_TOKENS") {
            let tokens: Vec<String> = raw
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            if tokens.is_empty() {
                bail!("TICKET_AFFIRMATIVE_TOKENS must contain at least one token");
            }
            tickets.affirmative_tokens = tokens;
        }

        let mut broadcast = BroadcastConfig::default();
        if let Some(ms) =
            parse_opt::<u64>("ANNOUNCE_SEND_INTERVAL_MS", get("ANNOUNCE_SEND_INTERVAL_MS"))?
        {
            broadcast.send_interval = Duration::from_millis(ms);
        }
        if let Some(ms) =
            parse_opt::<u64>("ANNOUNCE_RETRY_DELAY_MS", get("ANNOUNCE_RETRY_DELAY_MS"))?
        {
            broadcast.retry_delay = Duration::from_millis(ms);
        }

        let keep_alive_port = parse_opt::<u16>("KEEP_ALIVE_PORT", get("KEEP_ALIVE_PORT"))?
            .unwrap_or(DEFAULT_KEEP_ALIVE_PORT);
        let dev_guild_id = parse_opt::<u64>("DEV_GUILD_ID", get("DEV_GUILD_ID"))?;

        Ok(Self {
            token,
            tickets,
            broadcast,
            ban_appeal_url: get("BAN_APPEAL_URL"),
            keep_alive_port,
            dev_guild_id,
        })
    }
}

fn parse_opt<T>(key: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {:?}", key, v))
    })
    .transpose()
}

fn parse_list<T>(key: &str, raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>()
                .with_context(|| format!("Invalid entry in {}: {:?}", key, v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<BotConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DISCORD_TOKEN", "abc")]).unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.keep_alive_port, 8080);
        assert!(config.tickets.categories.is_empty());
        assert_eq!(config.tickets.idle_threshold, Duration::from_secs(86400));
        assert_eq!(config.tickets.reply_window, Duration::from_secs(43200));
        assert_eq!(config.tickets.grace_delay, Duration::from_secs(300));
        assert_eq!(config.tickets.affirmative_tokens, vec!["yes", "yepp", "sure"]);
        assert_eq!(config.broadcast.send_interval, Duration::from_millis(500));
        assert_eq!(config.ban_appeal_url, None);
        assert_eq!(config.dev_guild_id, None);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(load(&[]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DISCORD_TOKEN", "abc"),
            ("TICKET_CATEGORY_IDS", "1370906367023382619, 1370769885801615512,"),
            ("TICKET_IDLE_SECS", "3600"),
            ("TICKET_GRACE_SECS", "60"),
            ("TICKET_AFFIRMATIVE_TOKENS", "Ja, OK"),
            ("ANNOUNCE_RETRY_DELAY_MS", "2500"),
            ("KEEP_ALIVE_PORT", "3000"),
            ("BAN_APPEAL_URL", "https://example.com/appeal"),
        ])
        .unwrap();

        assert_eq!(
            config.tickets.categories,
            vec![1370906367023382619, 1370769885801615512]
        );
        assert_eq!(config.tickets.idle_threshold, Duration::from_secs(3600));
        assert_eq!(config.tickets.grace_delay, Duration::from_secs(60));
        assert_eq!(config.tickets.affirmative_tokens, vec!["ja", "ok"]);
        assert_eq!(config.broadcast.retry_delay, Duration::from_millis(2500));
        assert_eq!(config.keep_alive_port, 3000);
        assert_eq!(
            config.ban_appeal_url.as_deref(),
            Some("https://example.com/appeal")
        );
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("TICKET_CATEGORY_IDS", "12,abc")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("KEEP_ALIVE_PORT", "99999")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("TICKET_SWEEP_INTERVAL_SECS", "0")]).is_err());
    }
}

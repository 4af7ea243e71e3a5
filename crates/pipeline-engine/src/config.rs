use anyhow::{anyhow, Context};
use screener_core::normalize_ticker;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WATCHLIST: &[&str] = &[
    "GOOGL", "TSM", "MSFT", "NVDA", "BABA", "JNJ", "SONY", "WMT", "AMZN",
    "JD", "SERV", "AMD", "EH", "NICE", "QBTS", "GE",
];

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_SEC_DELAY_MS: u64 = 200;
const DEFAULT_MARKET_DELAY_MS: u64 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Every stage from the ticker download onwards.
    Full,
    /// Reuse the persisted research-merged table; refresh snapshot and signals.
    WatchlistOnly,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Required for full runs; watchlist-only runs never contact the registry.
    pub sec_user_agent: Option<String>,
    pub output_dir: PathBuf,
    pub watchlist: Vec<String>,
    pub max_tickers: Option<usize>,
    pub sec_request_delay: Duration,
    pub market_request_delay: Duration,
    pub request_timeout: Duration,
    pub mode: RunMode,
}

impl EngineConfig {
    /// Environment (after `.env`) overridden by command-line flags.
    pub fn from_env(args: &[String]) -> anyhow::Result<Self> {
        Self::load(|key| std::env::var(key).ok(), args)
    }

    pub fn load<E>(env: E, args: &[String]) -> anyhow::Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let flag_value = |name: &str| -> Option<&String> {
            args.iter()
                .position(|a| a == name)
                .and_then(|i| args.get(i + 1))
        };

        let mode = if args.iter().any(|a| a == "--watchlist-only") {
            RunMode::WatchlistOnly
        } else {
            RunMode::Full
        };

        let sec_user_agent = env("SEC_USER_AGENT").filter(|v| !v.trim().is_empty());
        if mode == RunMode::Full && sec_user_agent.is_none() {
            return Err(anyhow!("SEC_USER_AGENT must be set (e.g. \"Your Name you@example.com\")"));
        }

        let output_dir = flag_value("--output")
            .cloned()
            .or_else(|| env("OUTPUT_DIR"))
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

        let watchlist = match flag_value("--watchlist").cloned().or_else(|| env("WATCHLIST")) {
            Some(list) => parse_watchlist(&list),
            None => DEFAULT_WATCHLIST.iter().map(|t| t.to_string()).collect(),
        };
        if watchlist.is_empty() {
            return Err(anyhow!("watchlist is empty"));
        }

        let max_tickers = match flag_value("--max-tickers").cloned().or_else(|| env("MAX_TICKERS")) {
            Some(v) => Some(
                v.trim()
                    .parse::<usize>()
                    .with_context(|| format!("invalid max tickers: {:?}", v))?,
            ),
            None => None,
        };

        let millis = |key: &str, default: u64| -> anyhow::Result<Duration> {
            match env(key) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .with_context(|| format!("invalid {}: {:?}", key, v)),
                None => Ok(Duration::from_millis(default)),
            }
        };

        let timeout_secs = match env("REQUEST_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid REQUEST_TIMEOUT_SECS: {:?}", v))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            sec_user_agent,
            output_dir: PathBuf::from(output_dir),
            watchlist,
            max_tickers,
            sec_request_delay: millis("SEC_REQUEST_DELAY_MS", DEFAULT_SEC_DELAY_MS)?,
            market_request_delay: millis("MARKET_REQUEST_DELAY_MS", DEFAULT_MARKET_DELAY_MS)?,
            request_timeout: Duration::from_secs(timeout_secs),
            mode,
        })
    }
}

/// Comma or whitespace separated tickers, upper-cased, duplicates dropped.
pub fn parse_watchlist(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let t = normalize_ticker(t);
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveTime;
use serde::Deserialize;

use vigil_adapters::notify::{
    DiscordConfig, DiscordNotifier, EmailConfig, EmailNotifier, PushNotifier, SlackConfig,
    SlackNotifier, SmsNotifier, TelegramConfig, TelegramNotifier, WebhookConfig, WebhookNotifier,
};
use vigil_core::alert::Severity;
use vigil_core::channel::ChannelKind;
use vigil_core::escalation::{EscalationAction, EscalationPolicy};
use vigil_core::suppression::{SuppressionRule, TimeWindow};
use vigil_ports::outbound::Notifier;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default, rename = "policy")]
    pub policies: Vec<PolicyConfig>,
    #[serde(default, rename = "suppression")]
    pub suppression: Vec<SuppressionConfig>,
    #[serde(default)]
    pub channels: ChannelsConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".into()
}

fn default_poll_interval() -> u64 {
    1
}

fn default_database_url() -> String {
    "sqlite::memory:".into()
}

/// One `[[policy]]` block. Level keys are strings because TOML table
/// keys always are; they parse to the numeric escalation levels.
#[derive(Debug, Deserialize)]
pub struct PolicyConfig {
    pub name: String,
    pub severities: Vec<String>,
    #[serde(default)]
    pub time_thresholds: BTreeMap<String, u64>,
    #[serde(default)]
    pub channels: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
    pub max_escalation_level: u32,
    pub auto_resolve_after: Option<u64>,
}

impl PolicyConfig {
    pub fn build(&self) -> anyhow::Result<EscalationPolicy> {
        let severities = self
            .severities
            .iter()
            .map(|s| s.parse::<Severity>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("policy `{}`", self.name))?;

        let time_thresholds = self
            .time_thresholds
            .iter()
            .map(|(level, secs)| {
                let level: u32 = level
                    .parse()
                    .with_context(|| format!("policy `{}`: bad level key `{level}`", self.name))?;
                Ok((level, *secs))
            })
            .collect::<anyhow::Result<BTreeMap<_, _>>>()?;

        let channels = self
            .channels
            .iter()
            .map(|(level, kinds)| {
                let level: u32 = level
                    .parse()
                    .with_context(|| format!("policy `{}`: bad level key `{level}`", self.name))?;
                let kinds = kinds
                    .iter()
                    .map(|k| k.parse::<ChannelKind>())
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("policy `{}`", self.name))?;
                Ok((level, kinds))
            })
            .collect::<anyhow::Result<BTreeMap<_, _>>>()?;

        let actions = self
            .actions
            .iter()
            .map(|(level, action)| {
                let level: u32 = level
                    .parse()
                    .with_context(|| format!("policy `{}`: bad level key `{level}`", self.name))?;
                let action = action
                    .parse::<EscalationAction>()
                    .with_context(|| format!("policy `{}`", self.name))?;
                Ok((level, action))
            })
            .collect::<anyhow::Result<BTreeMap<_, _>>>()?;

        EscalationPolicy::new(
            self.name.clone(),
            severities,
            time_thresholds,
            channels,
            actions,
            self.max_escalation_level,
            self.auto_resolve_after,
        )
        .with_context(|| format!("policy `{}`", self.name))
    }
}

/// One `[[suppression]]` block. A window needs both bounds; clauses left
/// out of the file are simply not evaluated.
#[derive(Debug, Deserialize)]
pub struct SuppressionConfig {
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub categories: Option<Vec<String>>,
    pub sources: Option<Vec<String>>,
    pub severities: Option<Vec<String>>,
}

impl SuppressionConfig {
    pub fn build(&self) -> anyhow::Result<SuppressionRule> {
        let mut rule = SuppressionRule::new(self.name.clone());
        match (&self.start_time, &self.end_time) {
            (Some(start), Some(end)) => {
                let start = NaiveTime::parse_from_str(start, "%H:%M")
                    .with_context(|| format!("suppression `{}`: bad start_time", self.name))?;
                let end = NaiveTime::parse_from_str(end, "%H:%M")
                    .with_context(|| format!("suppression `{}`: bad end_time", self.name))?;
                rule = rule.with_window(TimeWindow::new(start, end));
            }
            (None, None) => {}
            _ => anyhow::bail!(
                "suppression `{}`: start_time and end_time must be set together",
                self.name
            ),
        }
        if let Some(categories) = &self.categories {
            rule = rule.with_categories(categories.clone());
        }
        if let Some(sources) = &self.sources {
            rule = rule.with_sources(sources.clone());
        }
        if let Some(severities) = &self.severities {
            let severities = severities
                .iter()
                .map(|s| s.parse::<Severity>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("suppression `{}`", self.name))?;
            rule = rule.with_severities(severities);
        }
        Ok(rule)
    }
}

#[derive(Debug, Deserialize)]
pub struct Enabled<T> {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub config: T,
}

#[derive(Debug, Deserialize)]
pub struct EnabledFlag {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChannelsConfig {
    pub email: Option<Enabled<EmailConfig>>,
    pub slack: Option<Enabled<SlackConfig>>,
    pub discord: Option<Enabled<DiscordConfig>>,
    pub telegram: Option<Enabled<TelegramConfig>>,
    pub webhook: Option<Enabled<WebhookConfig>>,
    pub sms: Option<EnabledFlag>,
    pub push: Option<EnabledFlag>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("parsing {}", path.as_ref().display()))?;
        Ok(config)
    }

    pub fn build_policies(&self) -> anyhow::Result<Vec<EscalationPolicy>> {
        self.policies.iter().map(PolicyConfig::build).collect()
    }

    pub fn build_suppression_rules(&self) -> anyhow::Result<Vec<SuppressionRule>> {
        self.suppression.iter().map(SuppressionConfig::build).collect()
    }

    /// Instantiate an adapter per enabled channel. Disabled or absent
    /// channels simply have no adapter; a policy naming one gets a
    /// failed notification record instead of a send.
    pub fn build_notifiers(&self) -> anyhow::Result<HashMap<ChannelKind, Arc<dyn Notifier>>> {
        let mut notifiers: HashMap<ChannelKind, Arc<dyn Notifier>> = HashMap::new();
        if let Some(email) = &self.channels.email {
            if email.enabled {
                let notifier = EmailNotifier::new(email.config.clone())
                    .map_err(|e| anyhow::anyhow!("email channel: {e}"))?;
                notifiers.insert(ChannelKind::Email, Arc::new(notifier));
            }
        }
        if let Some(slack) = &self.channels.slack {
            if slack.enabled {
                notifiers.insert(
                    ChannelKind::Slack,
                    Arc::new(SlackNotifier::new(slack.config.clone())),
                );
            }
        }
        if let Some(discord) = &self.channels.discord {
            if discord.enabled {
                notifiers.insert(
                    ChannelKind::Discord,
                    Arc::new(DiscordNotifier::new(discord.config.clone())),
                );
            }
        }
        if let Some(telegram) = &self.channels.telegram {
            if telegram.enabled {
                notifiers.insert(
                    ChannelKind::Telegram,
                    Arc::new(TelegramNotifier::new(telegram.config.clone())),
                );
            }
        }
        if let Some(webhook) = &self.channels.webhook {
            if webhook.enabled {
                notifiers.insert(
                    ChannelKind::Webhook,
                    Arc::new(WebhookNotifier::new(webhook.config.clone())),
                );
            }
        }
        if self.channels.sms.as_ref().is_some_and(|c| c.enabled) {
            notifiers.insert(ChannelKind::Sms, Arc::new(SmsNotifier));
        }
        if self.channels.push.as_ref().is_some_and(|c| c.enabled) {
            notifiers.insert(ChannelKind::Push, Arc::new(PushNotifier));
        }
        Ok(notifiers)
    }
}

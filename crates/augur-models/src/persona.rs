use serde::{Deserialize, Serialize};

/// Static definition of one analysis style.
///
/// The template is the persona's fixed instruction block. Personas are data:
/// adding one is a config change, not a code change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonaConfig {
    /// Stable identifier recorded on every prediction (e.g. `value_investor`).
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub style: String,
    pub template: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// The three personas the platform ships with.
pub fn default_personas() -> Vec<PersonaConfig> {
    vec![
        PersonaConfig {
            id: "value_investor".to_string(),
            name: "Value Investor".to_string(),
            style: "Warren Buffett".to_string(),
            template: "You are a value investing expert modeled after Warren Buffett.\n\
                       Focus on long-term fundamentals, intrinsic value, and conservative risk management.\n\
                       Analyze: project utility, team credibility, adoption metrics, and market position.\n\
                       Be conservative and focus on established cryptocurrencies."
                .to_string(),
            enabled: true,
        },
        PersonaConfig {
            id: "technical_analyst".to_string(),
            name: "Technical Analyst".to_string(),
            style: "Chart Expert".to_string(),
            template: "You are a technical analysis expert.\n\
                       Focus on: chart patterns, technical indicators (RSI, MACD, Bollinger Bands), \
                       support/resistance levels.\n\
                       Analyze price action, volume patterns, and momentum indicators.\n\
                       Use data-driven technical signals for your predictions."
                .to_string(),
            enabled: true,
        },
        PersonaConfig {
            id: "momentum_trader".to_string(),
            name: "Momentum Trader".to_string(),
            style: "Trend Follower".to_string(),
            template: "You are a momentum trading expert.\n\
                       Focus on: strong trends, volume surges, breaking news impact, social sentiment spikes.\n\
                       Look for rapid price movements and capitalize on momentum.\n\
                       Be aggressive with clear momentum signals, cautious otherwise."
                .to_string(),
            enabled: true,
        },
    ]
}

use augur_models::{PersonaConfig, Timeframe};

/// System prompt shared by every persona when the backend accepts one.
pub const ANALYST_SYSTEM_PROMPT: &str = "You are a cryptocurrency market analyst. \
     You answer with a single JSON object and nothing else. \
     Never invent price data that was not supplied to you.";

/// Output fields every persona must produce, listed in the request body.
fn response_format(timeframe: Timeframe) -> String {
    let example = serde_json::json!({
        "direction": "bullish|bearish|neutral",
        "confidence": "0-100",
        "timeframe": timeframe.as_str(),
        "reasoning": "2-3 sentence explanation",
    });
    // serde_json::Value always serializes
    serde_json::to_string(&example).unwrap_or_default()
}

/// Render the single request sent to the model for one persona, symbol and horizon.
pub fn render_prompt(
    persona: &PersonaConfig,
    symbol: &str,
    market_summary: &str,
    timeframe: Timeframe,
) -> String {
    let style = if persona.style.is_empty() {
        String::new()
    } else {
        format!(" ({})", persona.style)
    };
    format!(
        "Persona: {name}{style}\n\n\
         {template}\n\n\
         Provide predictions in JSON format with:\n\
         - direction: \"bullish\", \"bearish\", or \"neutral\"\n\
         - confidence: 0-100 (your confidence level)\n\
         - timeframe: \"24h\", \"7d\", or \"30d\"\n\
         - reasoning: brief explanation (2-3 sentences)\n\n\
         Cryptocurrency: {symbol}\n\n\
         Recent Market Data:\n{market_summary}\n\n\
         Provide your analysis and prediction for the {timeframe} timeframe.\n\
         Return ONLY a JSON object with the exact format:\n{format}\n",
        name = persona.name,
        template = persona.template.trim(),
        market_summary = market_summary.trim_end(),
        format = response_format(timeframe),
    )
}

use common::models::{MarketScanResult, TechnicalIndicator, TradeSignal};

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

pub fn signal_prompt(signal: &TradeSignal) -> String {
    format!(
        "Analyze the following trading signal for potential risk and validity.\n\n\
         Ticker: {}\n\
         Side: {:?}\n\
         Entry: {}\n\
         Stop Loss: {}\n\
         Relative Volume (RVOL): {}\n\
         Reason: {}\n\
         Catalyst: {}\n\n\
         Provide a concise, 2-sentence analysis. First sentence regarding technical validity \
         based on the reason. Second sentence regarding risk/reward profile.",
        signal.ticker,
        signal.side,
        signal.entry,
        signal.stop,
        or_na(signal.rvol),
        or_na(signal.reason.as_deref()),
        or_na(signal.catalyst.as_deref()),
    )
}

pub fn technical_prompt(data: &TechnicalIndicator) -> String {
    format!(
        "Act as a Chief Technical Strategist at a top hedge fund. Perform an extensive technical \
         analysis and profitability assessment on {ticker} based on the following data:\n\n\
         Current Price: ${price:.2}\n\
         Primary Trend: {trend}\n\
         Momentum (RSI 14): {rsi:.1}\n\
         MACD: Line {line:.2}, Signal {signal:.2}, Hist {hist:.2}\n\
         Moving Averages: EMA(9) ${ema9:.2}, EMA(20) ${ema20:.2}, SMA(200) ${sma200:.2}\n\
         Volatility (ATR): {atr:.2}\n\n\
         Provide a structured, professional report with these exact sections:\n\
         1. **Executive Summary**: directional bias and conviction level.\n\
         2. **Technical Deep Dive**: price vs EMA 9/20, RSI and MACD momentum, structure \
         relative to the 200 SMA.\n\
         3. **Profitability & Risk Strategy**: probability of success, a stop loss at 1.5x ATR \
         and a target for at least 1:2 risk/reward.\n\n\
         Tone: Analytical, decisive, and institutional.",
        ticker = data.ticker,
        price = data.price,
        trend = data.trend.as_str().to_uppercase(),
        rsi = data.rsi_14,
        line = data.macd.line,
        signal = data.macd.signal,
        hist = data.macd.histogram,
        ema9 = data.ema_9,
        ema20 = data.ema_20,
        sma200 = data.sma_200,
        atr = data.atr,
    )
}

pub fn scan_prompt(stock: &MarketScanResult) -> String {
    format!(
        "Analyze this market scanner result for {ticker}.\n\n\
         Data:\n\
         - Price: ${price}\n\
         - Change: {change}%\n\
         - RVOL: {rvol}\n\
         - Pattern: {setup}\n\
         - Sector: {sector}\n\n\
         Is this a high-quality breakout/setup or a likely fakeout?\n\
         Rate it from 1-10 (10 being best).\n\
         Provide a single sentence rationale.\n\n\
         Return JSON format: {{ \"rating\": number, \"reason\": \"string\" }}",
        ticker = stock.ticker,
        price = stock.price,
        change = stock.change_percent,
        rvol = stock.relative_volume,
        setup = stock.setup,
        sector = stock.sector,
    )
}

pub fn headline_prompt(headline: &str) -> String {
    format!(
        "Analyze the sentiment of this financial headline for a trader. Return ONLY \"Bullish\", \
         \"Bearish\", or \"Neutral\" followed by a pipe \"|\" and a 10 word explanation. \
         Headline: \"{headline}\""
    )
}

/// What an automation e-mail is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTrigger {
    PriceLevel,
    NewsEvent,
    PlThreshold,
    TradeClosed,
}

pub fn email_prompt(trigger: AlertTrigger) -> String {
    let context = match trigger {
        AlertTrigger::PlThreshold => "Daily Max Loss Hit",
        _ => "Trade Closed Successfully",
    };
    format!(
        "Write a professional email template for a trader.\n\
         Context: {context}.\n\
         Audience: Myself (The Trader).\n\
         Goal: Encourage discipline and review.\n\
         Return JSON format: {{ \"subject\": \"...\", \"body\": \"...\" }}"
    )
}

pub fn support_prompt(question: &str) -> String {
    format!(
        "You are a helpful customer support agent for \"TradeFlow Pro\", a trading SaaS.\n\
         The user is asking: \"{question}\"\n\n\
         Platform Features:\n\
         - AI Signal Analysis (Pro+)\n\
         - Automated Risk Guardrails\n\
         - Market Scanner\n\
         - Portfolio Forecasting\n\n\
         Provide a concise, friendly, and helpful response. If you don't know, ask them to email \
         support@govelites.com."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::demo::demo_signals;

    #[test]
    fn test_signal_prompt_marks_missing_fields() {
        let mut signal = demo_signals().remove(1);
        signal.catalyst = None;
        let prompt = signal_prompt(&signal);
        assert!(prompt.contains("Ticker: TSLA"));
        assert!(prompt.contains("Catalyst: N/A"));
        assert!(prompt.contains("Relative Volume (RVOL): 1.8"));
    }

    #[test]
    fn test_email_context_follows_trigger() {
        assert!(email_prompt(AlertTrigger::PlThreshold).contains("Daily Max Loss Hit"));
        assert!(email_prompt(AlertTrigger::TradeClosed).contains("Trade Closed Successfully"));
    }
}

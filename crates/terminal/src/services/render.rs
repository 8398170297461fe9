use std::io::{self, Write};

use common::models::{ToastKind, TradingMode, UserSettings};
use policy::credentials::{check_broker_credentials, provider_key_errors};
use policy::{NavEntry, SettingsField, ValidationResult, validate_field};
use session::{AppState, SessionState};

pub fn header(out: &mut impl Write, state: &SessionState) -> io::Result<()> {
    match (&state.app_state, &state.current_user) {
        (AppState::Application, Some(user)) => writeln!(
            out,
            "[{}] {} <{}> plan={}",
            state.current_view, user.name, user.email, user.plan
        ),
        (app_state, _) => writeln!(out, "[{app_state}] type `demo` or `login`"),
    }
}

pub fn nav(out: &mut impl Write, entries: &[NavEntry], state: &SessionState) -> io::Result<()> {
    for entry in entries {
        let marker = if entry.view == state.current_view { ">" } else { " " };
        let lock = if entry.locked { " (locked)" } else { "" };
        writeln!(
            out,
            "{marker} {:<10} {:<22} {:?}{lock}",
            entry.view.as_str().to_lowercase(),
            entry.label,
            entry.section
        )?;
    }
    Ok(())
}

pub fn signals(out: &mut impl Write, state: &SessionState) -> io::Result<()> {
    if state.signals.is_empty() {
        return writeln!(out, "No signals yet.");
    }
    for signal in &state.signals {
        writeln!(
            out,
            "{:<16} {:<6} {:<5?} entry {:>8.2} stop {:>8.2} risk {:>6.2} rvol {:<4} {}",
            signal.id,
            signal.ticker,
            signal.side,
            signal.entry,
            signal.stop,
            signal.risk_per_share(),
            signal.rvol.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
            signal.received_at.format("%H:%M:%S"),
        )?;
        if state.analyzing.contains(&signal.id) {
            writeln!(out, "    analyzing...")?;
        } else if let Some(text) = state.analyses.get(&signal.id) {
            writeln!(out, "    AI: {text}")?;
        }
    }
    Ok(())
}

pub fn settings(
    out: &mut impl Write,
    current: &UserSettings,
    draft: Option<&UserSettings>,
) -> io::Result<()> {
    writeln!(out, "strategy        {}", current.strategy_name)?;
    writeln!(
        out,
        "mode            {} (auto trade {})",
        current.trading_mode(),
        if current.auto_trade_enabled { "on" } else { "off" }
    )?;
    for field in SettingsField::ALL {
        write!(out, "{:<15} {}", field.as_str(), field.value(current))?;
        if let Some(draft) = draft {
            let pending = field.value(draft);
            if pending != field.value(current) {
                write!(out, " -> {pending}")?;
            }
            if let Some(msg) = validate_field(draft, field) {
                write!(out, " ({msg})")?;
            }
        }
        writeln!(out)?;
    }

    for mode in [TradingMode::Paper, TradingMode::Live] {
        let check = check_broker_credentials(&current.api_config, mode);
        let status = if check.success { "ok" } else { "!!" };
        writeln!(out, "broker {:<8} [{status}] {}", mode, check.message)?;
    }
    for message in provider_key_errors(&current.api_config).values() {
        writeln!(out, "provider        [!!] {message}")?;
    }
    Ok(())
}

pub fn validation_errors(out: &mut impl Write, result: &ValidationResult) -> io::Result<()> {
    writeln!(out, "Settings not saved:")?;
    for (field, msg) in result.iter() {
        writeln!(out, "  {field} {msg}")?;
    }
    Ok(())
}

pub fn toast(out: &mut impl Write, state: &SessionState) -> io::Result<()> {
    match &state.toast {
        Some(toast) => {
            let icon = match toast.kind {
                ToastKind::Success => "+",
                ToastKind::Error => "x",
            };
            writeln!(out, "({icon}) {}", toast.message)
        }
        None => writeln!(out, "No notification."),
    }
}

//! Spin Wheel Settlement CLI
//!
//! `spin-wheel demo [ROUNDS]`  run rounds against the configured ledger
//! `spin-wheel verify FILE`    verify a JSON record or JSON-lines ledger

use std::fs;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use spin_wheel::round::PotLimits;
use spin_wheel::{
    GameConfig, LedgerEntry, RoundRecord, RoundVerifier, SpinGame, VerificationReport, VERSION,
};

fn main() -> ExitCode {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {}", e);
    }

    info!("Spin Wheel Settlement v{}", VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        None | Some("demo") => demo(args.get(1).map(String::as_str)),
        Some("verify") => match args.get(1) {
            Some(path) => verify_file(path),
            None => Err(anyhow::anyhow!("usage: spin-wheel verify FILE")),
        },
        Some(other) => Err(anyhow::anyhow!("unknown command {:?} (expected demo or verify)", other)),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run a few rounds with simulated bets and verify each one.
fn demo(rounds: Option<&str>) -> Result<bool> {
    let rounds: u32 = match rounds {
        Some(raw) => raw.parse().with_context(|| format!("invalid round count {:?}", raw))?,
        None => 3,
    };

    let config = GameConfig::from_env().context("loading configuration")?;
    info!(
        "Modulus: {}, house fee: {} bps, ledger: {}",
        config.modulus,
        config.house_fee_bps,
        config
            .ledger_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "in-memory".into())
    );

    let game = SpinGame::from_config(config)?;
    let limits = game.config().pot_limits;
    let mut all_valid = true;

    for _ in 0..rounds {
        let opened = game.open_round(None)?;
        info!("=== Round {} ===", opened.round_id);
        info!("Commitment: {}", opened.commitment);
        info!("Client seed: {}", opened.client_seed);

        let mut pot = game.new_pot();
        for (i, name) in ["alice", "bob", "carol"].iter().enumerate() {
            let amount = demo_bet_amount(&limits, i, opened.round_id);
            if let Err(e) = pot.place_bet((*name).into(), amount) {
                warn!("{} sits out round {}: {}", name, opened.round_id, e);
            }
        }

        if pot.player_count() == 0 {
            warn!("Round {} has no bets, cancelling", opened.round_id);
            game.cancel_round()?;
            continue;
        }

        let record = game.reveal_and_settle(pot.entries())?;
        info!(
            "Winner: {} (draw {}) wins {} of {}",
            record.outcome.winner_participant_id,
            record.outcome.winning_draw,
            record.payout.winner_amount,
            record.payout.pot_total
        );
        info!("Revealed seed: {}", record.outcome.revealed_server_seed);

        let valid = game.verify_round(&record)?;
        if valid {
            info!("VERIFIED: outcome recomputed from public data");
        } else {
            warn!("VERIFICATION FAILED for round {}", record.round_id);
        }
        all_valid &= valid;
    }

    Ok(all_valid)
}

/// Demo stake for one player: grows with seat and round, clamped to the limits.
fn demo_bet_amount(limits: &PotLimits, seat: usize, round_id: u64) -> u64 {
    let multiplier = (seat as u64 + 1).saturating_mul(round_id % 3 + 1);
    limits
        .min_bet
        .checked_mul(multiplier)
        .unwrap_or(limits.max_bet)
        .min(limits.max_bet)
}

/// Verify a single JSON record, or every settled and cancelled round in a
/// JSON-lines ledger.
fn verify_file(path: &str) -> Result<bool> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;

    let entries: Vec<LedgerEntry> = match RoundRecord::from_json(contents.trim()) {
        Ok(record) => vec![LedgerEntry::Settled(record)],
        Err(_) => contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("{}: line {}", path, n + 1))
            })
            .collect::<Result<_>>()?,
    };

    let mut records = Vec::new();
    let mut all_valid = true;
    for entry in entries {
        match entry {
            LedgerEntry::Settled(record) => records.push(record),
            LedgerEntry::Cancelled(cancelled) => {
                let valid = RoundVerifier::verify_cancellation(&cancelled)
                    .with_context(|| format!("round {}", cancelled.round_id))?;
                if valid {
                    info!("Round {}: CANCELLED, seed opens commitment", cancelled.round_id);
                } else {
                    warn!(
                        "Round {}: CANCELLED with a seed that does not open its commitment",
                        cancelled.round_id
                    );
                    all_valid = false;
                }
            }
            LedgerEntry::Opened(_) => {}
        }
    }

    if records.is_empty() {
        bail!("{} contains no settled rounds", path);
    }

    for record in &records {
        let report = RoundVerifier::inspect_record(record)
            .with_context(|| format!("round {}", record.round_id))?;
        match &report {
            VerificationReport::Valid => {
                info!(
                    "Round {}: VALID (winner {})",
                    record.round_id, record.outcome.winner_participant_id
                );
            }
            other => {
                warn!("Round {}: INVALID {:?}", record.round_id, other);
                all_valid = false;
            }
        }
    }

    info!("Verified {} round(s)", records.len());
    Ok(all_valid)
}

/// FreeBets Live — Bet View
/// Sleduje jeden bet: foreground snapshot + tichý background refresh,
/// změnu výplaty ukáže jako diff a pak ji převezme.
/// Enter = ruční reload (po chybě se sám neobnoví).
///
/// Spuštění:
///   cargo run --bin bet-view -- <bet_id>

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use bet_diff::DiffTrend;
use bet_model::{bet_display_name, bet_type_label, Bet};
use bet_store::{now_ms, BetViewErrorKind, TimeLeft, ViewAction, ViewController, ViewState};
use dotenv::dotenv;
use freebets_live::config::{bet_id_from, Config};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cfg = Config::from_env().context("invalid FREEBETS_* configuration")?;
    let bet_id = bet_id_from(env::args().skip(1), |k| env::var(k).ok())?;

    info!("=== FreeBets Live — Bet View #{} ===", bet_id);

    let ctl = ViewController::spawn(Arc::new(cfg.gateway()), cfg.controller_options());
    let mut state_rx = ctl.subscribe();

    ctl.dispatch(ViewAction::SetBetId(bet_id)).await;
    ctl.dispatch(ViewAction::LoadBet).await;

    let mut shown: Option<Bet> = None;
    let mut background_seen: Option<Bet> = None;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => {
                        let action = ViewAction::manual_reload(&state_rx.borrow());
                        info!("manual reload ({:?})", action);
                        ctl.dispatch(action).await;
                    }
                    // EOF or no terminal: keep watching without manual reload
                    _ => stdin_open = false,
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let st = state_rx.borrow_and_update().clone();

                if st.is_expired() {
                    warn!("{}", BetViewErrorKind::NotFound.message());
                    break;
                }
                if let Some(err) = st.error {
                    warn!("{} (Enter = retry)", err.message());
                    continue;
                }
                if let Some(err) = st.error_background {
                    warn!("background refresh: {} (Enter = retry)", err.message());
                }

                if st.bet != shown {
                    shown = st.bet.clone();
                    background_seen = st.bet_background.clone();
                    print_bet(&st);
                    continue;
                }

                if st.bet_background != background_seen {
                    background_seen = st.bet_background.clone();
                    if let Some(diff) = st.bet_diff() {
                        let trend = diff.trend();
                        info!("🔄 {}", trend.title());
                        if trend != DiffTrend::Unchanged {
                            info!(
                                "   {} (min {:+.2} / avg {:+.2} / max {:+.2})",
                                trend.body(),
                                diff.min_reward_diff,
                                diff.avg_reward_diff,
                                diff.max_reward_diff
                            );
                        }
                        if !diff.is_zero() {
                            ctl.dispatch(ViewAction::SwapToForeground).await;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_bet(st: &ViewState) {
    let Some(bet) = st.bet.as_ref() else { return };
    let b = bet.info();
    let next = match st.next_refresh_ts {
        Some(ts) if st.countdown_enabled() => TimeLeft::display(ts.saturating_sub(now_ms()), "now"),
        _ => "OFF".to_string(),
    };

    info!("🎯 #{} {} — {}", b.id, bet_display_name(bet), bet_type_label(&b.bet_type));
    info!("   cost ${:.2}, odds {:.2}", b.cost, b.predicted_odds);
    info!("   payout min ${:.2} / avg ${:.2} / max ${:.2}", b.min_reward, b.avg_reward, b.max_reward);
    if let Bet::Multi(m) = bet {
        for sub in &m.sub_bets {
            info!("   ├ {} R{} ({} mtp)", sub.race.track_code.to_uppercase(), sub.race.race_number, sub.race.mtp);
        }
    }
    info!("   next refresh in {}", next);
}

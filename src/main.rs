/// FreeBets Live — Bet Watch
///
/// Co dělá:
///   1. Načte seznam free betů z backendu (filtry z FREEBETS_* env)
///   2. Po uplynutí next_refresh_ts seznam automaticky obnoví
///   3. Stav vystavuje přes HTTP (GET /health, /state, /bets)
///   4. POST /reload = ruční reload (po chybě se sám neobnoví)
///
/// Spuštění:
///   cargo run --bin bet-watch

use std::env;
use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use bet_model::{bet_display_name, bet_type_label};
use bet_store::{now_ms, IndexAction, IndexController, IndexState, TimeLeft};
use dotenv::dotenv;
use freebets_live::config::Config;
use freebets_live::state_http::start_http_server;
use tokio::sync::mpsc;
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

    info!("=== FreeBets Live — Bet Watch ===");
    info!("API: {}", cfg.api_url);
    info!("Tracks: {}", if cfg.default_params.track_codes.is_empty() {
        "all".to_string()
    } else {
        cfg.default_params.track_codes.join(",")
    });
    info!("Logs: {}", cfg.log_dir.display());

    // Single instance lock
    let lock_file_path = env::temp_dir().join("freebets_bet_watch.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of bet-watch is already running! Exiting.");
            return Ok(());
        }
    };

    let gateway = Arc::new(cfg.gateway());
    let ctl = IndexController::spawn(gateway, cfg.default_params.clone(), cfg.controller_options());
    let mut state_rx = ctl.subscribe();

    let (reload_tx, mut reload_rx) = mpsc::channel::<()>(1);
    {
        let state = ctl.subscribe();
        let bind = cfg.http_bind;
        tokio::spawn(async move {
            if let Err(e) = start_http_server(bind, state, reload_tx).await {
                warn!("http server stopped: {:#}", e);
            }
        });
    }

    ctl.dispatch(IndexAction::LoadBets).await;

    let mut last_error = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C, shutting down");
                break;
            }
            Some(()) = reload_rx.recv() => {
                info!("manual reload");
                last_error = None;
                ctl.dispatch(IndexAction::LoadBets).await;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    warn!("index controller stopped");
                    break;
                }
                let st = state_rx.borrow_and_update().clone();
                if st.loading {
                    continue;
                }
                if st.error.is_some() && st.error == last_error {
                    continue;
                }
                last_error = st.error;
                print_summary(&st);
            }
        }
    }

    Ok(())
}

fn print_summary(st: &IndexState) {
    if let Some(err) = st.error {
        warn!("{} ({})", err.message(), err.as_str());
        return;
    }

    let bets = st.visible_bets_for_params();
    let next = match st.next_refresh_ts {
        Some(ts) if st.countdown_refresh_enabled => TimeLeft::display(ts.saturating_sub(now_ms()), "now"),
        _ => "OFF".to_string(),
    };
    info!("📋 {} bets, next refresh in {}", bets.len(), next);
    for bet in bets.iter().take(20) {
        let b = bet.info();
        info!(
            "  #{:<6} {:<24} {:<12} avg ${:.2} (min ${:.2} / max ${:.2})",
            b.id,
            bet_display_name(bet),
            bet_type_label(&b.bet_type),
            b.avg_reward,
            b.min_reward,
            b.max_reward
        );
    }
}

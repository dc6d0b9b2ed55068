use std::sync::Arc;
use std::time::Duration;

use bet_gateway::testkit::{list_body, multi_bet_json, single_bet_json, view_body, FakeApi};
use bet_gateway::BetGateway;
use bet_model::{bet_display_name, BetSearchParams};
use bet_store::{
    now_ms, BetViewErrorKind, BetsErrorKind, ControllerOptions, IndexAction, IndexController, ViewAction,
    ViewController,
};
use tokio::sync::watch;

/// Path-only route: matches whatever query the refreshed params produce
const BETS: &str = "/api/v1/bets";

fn options(dir: &tempfile::TempDir) -> ControllerOptions {
    ControllerOptions {
        tick:    Duration::from_millis(20),
        log_dir: dir.path().to_path_buf(),
    }
}

fn gateway(api: &FakeApi) -> Arc<BetGateway> {
    Arc::new(BetGateway::new(&api.base_url(), Duration::from_secs(5)))
}

async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, pred: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    let seen = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("state never matched")
        .expect("controller stopped");
    let value = (*seen).clone();
    value
}

fn far_future() -> i64 {
    now_ms() + 3_600_000
}

// ── Index ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn kee_and_cd_are_requested_and_shown() {
    let api = FakeApi::start().await;
    api.route(
        "/api/v1/bets?skip=0&limit=2000&track_codes=kee,cd",
        200,
        list_body(
            vec![
                single_bet_json(1, "kee", Some(2_000), (1.0, 2.0, 3.0)),
                single_bet_json(2, "cd", Some(1_000), (1.0, 2.0, 3.0)),
            ],
            vec![],
            &["kee", "cd"],
            Some(far_future()),
        ),
    );
    let dir = tempfile::tempdir().unwrap();
    let defaults = BetSearchParams::with_track_codes(vec!["kee".into(), "cd".into()]);
    let ctl = IndexController::spawn(gateway(&api), defaults, options(&dir));
    let mut rx = ctl.subscribe();

    assert!(ctl.dispatch(IndexAction::LoadBets).await);
    let st = wait_until(&mut rx, |s| !s.loading && s.current_bet_list.len() == 2).await;

    assert_eq!(api.requests(), vec!["/api/v1/bets?skip=0&limit=2000&track_codes=kee,cd"]);
    assert!(st.error.is_none());
    assert!(st.countdown_refresh_enabled);
    let names: Vec<String> = st.visible_bets_for_params().iter().map(bet_display_name).collect();
    assert_eq!(names, vec!["CD", "KEE"]);
}

#[tokio::test]
async fn empty_result_is_no_bets_with_defaults_restored() {
    let api = FakeApi::start().await;
    api.route(BETS, 200, list_body(vec![], vec![], &["kee"], Some(far_future())));
    let dir = tempfile::tempdir().unwrap();
    let ctl = IndexController::spawn(gateway(&api), BetSearchParams::default(), options(&dir));
    let mut rx = ctl.subscribe();

    let narrowed = BetSearchParams { bet_types: Some(vec!["BetType.SHOW_BET".into()]), ..BetSearchParams::default() };
    ctl.dispatch(IndexAction::SetBetSearchParams(narrowed)).await;
    let st = wait_until(&mut rx, |s| s.error.is_some()).await;

    assert_eq!(st.error, Some(BetsErrorKind::NoBets));
    assert_eq!(st.next_refresh_ts, None);
    assert!(!st.countdown_refresh_enabled);
    assert_eq!(st.current_bet_search_params, BetSearchParams::default());
}

#[tokio::test]
async fn server_error_keeps_params() {
    let api = FakeApi::start().await;
    api.route(BETS, 500, r#"{"detail":"boom"}"#);
    let dir = tempfile::tempdir().unwrap();
    let ctl = IndexController::spawn(gateway(&api), BetSearchParams::default(), options(&dir));
    let mut rx = ctl.subscribe();

    let params = BetSearchParams::with_track_codes(vec!["sa".into()]);
    ctl.dispatch(IndexAction::SetBetSearchParams(params.clone())).await;
    let st = wait_until(&mut rx, |s| s.error.is_some()).await;

    assert_eq!(st.error, Some(BetsErrorKind::ResponseError));
    assert_eq!(st.current_bet_search_params, params);
    assert!(!st.loading);
}

#[tokio::test]
async fn latest_params_win_over_slow_response() {
    let api = FakeApi::start().await;
    api.route_delayed(
        "/api/v1/bets?skip=0&limit=2000&track_codes=kee",
        200,
        list_body(vec![single_bet_json(1, "kee", None, (1.0, 1.0, 1.0))], vec![], &["kee", "cd"], Some(far_future())),
        Duration::from_millis(400),
    );
    api.route(
        "/api/v1/bets?skip=0&limit=2000&track_codes=cd",
        200,
        list_body(vec![single_bet_json(2, "cd", None, (1.0, 1.0, 1.0))], vec![], &["kee", "cd"], Some(far_future())),
    );
    let dir = tempfile::tempdir().unwrap();
    let ctl = IndexController::spawn(gateway(&api), BetSearchParams::default(), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(IndexAction::SetBetSearchParams(BetSearchParams::with_track_codes(vec!["kee".into()]))).await;
    ctl.dispatch(IndexAction::SetBetSearchParams(BetSearchParams::with_track_codes(vec!["cd".into()]))).await;
    wait_until(&mut rx, |s| !s.loading && !s.current_bet_list.is_empty()).await;

    // long enough for the slow kee response to have arrived if it were going to land
    tokio::time::sleep(Duration::from_millis(600)).await;
    let st = ctl.snapshot();
    let ids: Vec<i64> = st.current_bet_list.to_bets().iter().map(|b| b.id()).collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn refresh_fires_once_when_countdown_elapses() {
    let api = FakeApi::start().await;
    api.route(BETS, 200, list_body(
        vec![single_bet_json(1, "kee", None, (1.0, 1.0, 1.0))],
        vec![],
        &["kee"],
        Some(now_ms() + 300),
    ));
    let dir = tempfile::tempdir().unwrap();
    let ctl = IndexController::spawn(gateway(&api), BetSearchParams::default(), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(IndexAction::LoadBets).await;
    wait_until(&mut rx, |s| !s.loading && s.error.is_none() && !s.current_bet_list.is_empty()).await;

    // the refreshed list points far ahead, nothing else may fire
    api.route(BETS, 200, list_body(
        vec![single_bet_json(1, "kee", None, (1.0, 1.0, 1.0))],
        vec![],
        &["kee"],
        Some(far_future()),
    ));
    tokio::time::sleep(Duration::from_millis(900)).await;

    assert_eq!(api.requests().len(), 2);
    let st = ctl.snapshot();
    assert!(st.countdown_refresh_enabled);
    assert!(st.next_refresh_ts.unwrap() > now_ms());
}

#[tokio::test]
async fn paused_countdown_does_not_refresh() {
    let api = FakeApi::start().await;
    api.route(BETS, 200, list_body(
        vec![single_bet_json(1, "kee", None, (1.0, 1.0, 1.0))],
        vec![],
        &["kee"],
        Some(now_ms() + 200),
    ));
    let dir = tempfile::tempdir().unwrap();
    let ctl = IndexController::spawn(gateway(&api), BetSearchParams::default(), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(IndexAction::LoadBets).await;
    wait_until(&mut rx, |s| !s.loading && !s.current_bet_list.is_empty()).await;
    ctl.dispatch(IndexAction::SetCountdownRefreshEnabled(false)).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(api.requests().len(), 1);
    assert!(!ctl.snapshot().countdown_refresh_enabled);
}

// ── Bet view ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn expired_bet_is_not_found_and_never_refreshed() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctl = ViewController::spawn(gateway(&api), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(ViewAction::SetBetId("999".into())).await;
    ctl.dispatch(ViewAction::LoadBet).await;
    let st = wait_until(&mut rx, |s| s.error.is_some()).await;

    assert_eq!(st.error, Some(BetViewErrorKind::NotFound));
    assert_eq!(st.next_refresh_ts, None);
    assert!(st.bet_diff().is_none());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(api.requests(), vec!["/api/v1/bets/999"]);
}

#[tokio::test]
async fn background_refresh_keeps_foreground_and_exposes_diff() {
    let api = FakeApi::start().await;
    api.route(
        "/api/v1/bets/7",
        200,
        view_body(single_bet_json(7, "kee", Some(1_000), (1.0, 2.0, 3.0)), "single", now_ms() + 200),
    );
    let dir = tempfile::tempdir().unwrap();
    let ctl = ViewController::spawn(gateway(&api), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(ViewAction::SetBetId("7".into())).await;
    ctl.dispatch(ViewAction::LoadBet).await;
    let st = wait_until(&mut rx, |s| s.bet.is_some()).await;
    assert!(st.bet_diff().unwrap().is_zero());

    api.route(
        "/api/v1/bets/7",
        200,
        view_body(single_bet_json(7, "kee", Some(1_000), (1.0, 2.5, 3.0)), "single", far_future()),
    );
    let st = wait_until(&mut rx, |s| {
        s.bet_background.as_ref().map(|b| b.info().avg_reward) == Some(2.5)
    }).await;

    assert_eq!(st.bet.as_ref().unwrap().info().avg_reward, 2.0);
    assert_eq!(st.bet_diff().unwrap().avg_reward_diff, 0.5);
    assert!(st.countdown_enabled());

    ctl.dispatch(ViewAction::SwapToForeground).await;
    let st = wait_until(&mut rx, |s| s.bet.as_ref().map(|b| b.info().avg_reward) == Some(2.5)).await;
    assert!(st.bet_diff().unwrap().is_zero());
}

#[tokio::test]
async fn multi_bet_view_decodes_by_result_type() {
    let api = FakeApi::start().await;
    let multi = multi_bet_json(
        42,
        vec![
            single_bet_json(1, "kee", Some(2_000), (1.0, 1.0, 1.0)),
            single_bet_json(2, "cd", Some(1_000), (1.0, 1.0, 1.0)),
        ],
        (2.0, 3.0, 4.0),
    );
    api.route("/api/v1/bets/42", 200, view_body(multi, "multi", far_future()));
    let dir = tempfile::tempdir().unwrap();
    let ctl = ViewController::spawn(gateway(&api), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(ViewAction::SetBetId("42".into())).await;
    ctl.dispatch(ViewAction::LoadBet).await;
    let st = wait_until(&mut rx, |s| s.bet.is_some()).await;

    assert_eq!(st.bet_meta_type(), Some(bet_model::BetKind::Multi));
    assert_eq!(bet_display_name(st.bet.as_ref().unwrap()), "(MULTI) KEE | CD");
}

#[tokio::test]
async fn events_are_written_to_the_log_dir() {
    let api = FakeApi::start().await;
    api.route("/api/v1/bets/5", 200, view_body(single_bet_json(5, "kee", None, (1.0, 1.0, 1.0)), "single", far_future()));
    let dir = tempfile::tempdir().unwrap();
    let ctl = ViewController::spawn(gateway(&api), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(ViewAction::SetBetId("5".into())).await;
    ctl.dispatch(ViewAction::LoadBet).await;
    wait_until(&mut rx, |s| s.bet.is_some()).await;

    let file = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
    let content = std::fs::read_to_string(file).unwrap();
    let ev: serde_json::Value = serde_json::from_str(content.lines().last().unwrap()).unwrap();
    assert_eq!(ev["event"], "BET_LOADED");
    assert_eq!(ev["lane"], "foreground");
    assert_eq!(ev["bet_id"], 5);
}

#[tokio::test]
async fn late_refresh_of_previous_bet_never_reaches_the_new_view() {
    let api = FakeApi::start().await;
    api.route("/api/v1/bets/7", 200, view_body(single_bet_json(7, "kee", None, (1.0, 2.0, 3.0)), "single", far_future()));
    api.route("/api/v1/bets/8", 200, view_body(single_bet_json(8, "cd", None, (1.0, 5.0, 9.0)), "single", far_future()));
    let dir = tempfile::tempdir().unwrap();
    let ctl = ViewController::spawn(gateway(&api), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(ViewAction::SetBetId("7".into())).await;
    ctl.dispatch(ViewAction::LoadBet).await;
    wait_until(&mut rx, |s| s.bet.is_some()).await;

    api.route_delayed(
        "/api/v1/bets/7",
        200,
        view_body(single_bet_json(7, "kee", None, (1.0, 2.0, 3.0)), "single", far_future()),
        Duration::from_millis(300),
    );
    ctl.dispatch(ViewAction::LoadBetBackground).await;
    ctl.dispatch(ViewAction::SetBetId("8".into())).await;
    ctl.dispatch(ViewAction::LoadBet).await;
    wait_until(&mut rx, |s| s.bet.as_ref().map(|b| b.id()) == Some(8)).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    ctl.dispatch(ViewAction::SwapToForeground).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let st = ctl.snapshot();
    assert_eq!(st.bet_id.as_deref(), Some("8"));
    assert_eq!(st.bet.as_ref().map(|b| b.id()), Some(8));
    assert_eq!(st.bet_background.as_ref().map(|b| b.id()), Some(8));
    assert!(!st.loading_background);
    assert!(st.bet_diff().unwrap().is_zero());
}

#[tokio::test]
async fn reload_after_error_recovers() {
    let api = FakeApi::start().await;
    api.route(BETS, 503, "unavailable");
    let dir = tempfile::tempdir().unwrap();
    let ctl = IndexController::spawn(gateway(&api), BetSearchParams::default(), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(IndexAction::LoadBets).await;
    wait_until(&mut rx, |s| s.error == Some(BetsErrorKind::ResponseError)).await;

    api.route(BETS, 200, list_body(
        vec![single_bet_json(1, "kee", None, (1.0, 1.0, 1.0))],
        vec![],
        &["kee"],
        Some(far_future()),
    ));
    ctl.dispatch(IndexAction::LoadBets).await;
    let st = wait_until(&mut rx, |s| !s.loading && s.error.is_none() && !s.current_bet_list.is_empty()).await;
    assert!(st.countdown_refresh_enabled);
}

// ── Teardown ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dropped_index_controller_never_refreshes() {
    let api = FakeApi::start().await;
    api.route(BETS, 200, list_body(
        vec![single_bet_json(1, "kee", None, (1.0, 1.0, 1.0))],
        vec![],
        &["kee"],
        Some(now_ms() + 200),
    ));
    let dir = tempfile::tempdir().unwrap();
    let ctl = IndexController::spawn(gateway(&api), BetSearchParams::default(), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(IndexAction::LoadBets).await;
    wait_until(&mut rx, |s| !s.loading && !s.current_bet_list.is_empty()).await;
    drop(ctl);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(api.requests().len(), 1);
    assert!(rx.has_changed().is_err());
}

#[tokio::test]
async fn dropped_view_controller_never_refreshes() {
    let api = FakeApi::start().await;
    api.route("/api/v1/bets/7", 200, view_body(single_bet_json(7, "kee", None, (1.0, 2.0, 3.0)), "single", now_ms() + 200));
    let dir = tempfile::tempdir().unwrap();
    let ctl = ViewController::spawn(gateway(&api), options(&dir));
    let mut rx = ctl.subscribe();

    ctl.dispatch(ViewAction::SetBetId("7".into())).await;
    ctl.dispatch(ViewAction::LoadBet).await;
    wait_until(&mut rx, |s| s.bet.is_some()).await;
    drop(ctl);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(api.requests(), vec!["/api/v1/bets/7"]);
}

/// FreeBets Live — sdílené části binárek
///   config      env konfigurace (FREEBETS_*)
///   state_http  read-only HTTP nad stavem indexu (GET /health, /state, /bets)

pub mod config;
pub mod state_http;

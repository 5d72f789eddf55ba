//! Back-test engines and the workbench session that drives them
//!
//! Two engines implement [`BacktestEngine`](crate::common::traits::BacktestEngine):
//! [`BacktestRestClient`] talks to a remote engine over HTTP and
//! [`LocalSimulator`] replays snapshots in-process.

pub mod messages;
pub mod rest;
pub mod simulator;
pub mod workbench;

pub use rest::BacktestRestClient;
pub use simulator::{is_main_race_market, LocalSimulator};
pub use workbench::{RunReport, Workbench, SUMMARY_TOLERANCE};

pub mod audit;
pub mod calendar;
pub mod config;
pub mod ledger;
pub mod matcher;
pub mod namer;
pub mod paths;
pub mod pipeline;
pub mod resolve;
pub mod schedule;
pub mod state;
pub mod store;
pub mod util;
pub mod warn;

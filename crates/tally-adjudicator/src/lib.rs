//! Tally Adjudication Layer
//!
//! Settlement and dispute resolution for payment channels: a pluggable
//! custodial ledger, the adjudicator state machine that registers signed
//! states and releases holdings, a polling event subscription, and the
//! funding coordinator that brings a channel to its agreed opening balance.

pub mod adjudicator;
pub mod cancel;
pub mod config;
pub mod error;
pub mod events;
pub mod funder;
pub mod holdings;
pub mod ledger;
pub mod memory;
pub mod subscription;
pub mod timeout;

pub use adjudicator::Adjudicator;
pub use cancel::CancelToken;
pub use config::PollConfig;
pub use error::AdjudicatorError;
pub use events::ChannelEvent;
pub use funder::{Funder, FundingRequest};
pub use holdings::AssetHolder;
pub use ledger::{Ledger, LedgerError};
pub use memory::MemoryLedger;
pub use subscription::EventSubscription;
pub use timeout::Timeout;

//! PIN/CAN retry handling for PACE channel establishment
//!
//! The eID PIN has three attempts. After the second wrong PIN it is
//! suspended and the card access number (CAN) must be entered before the
//! last attempt; after the third it is blocked and only the PUK helps.
//!
//! [`transition`] is the pure state machine over [`PinSession`].
//! [`PinFlow`] drives it against a [`PaceChannel`] and a [`PinUi`], one
//! [`PinFlow::step`] per dialog submission.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]

mod config;
mod error;
mod flow;
mod machine;
mod state;

pub use config::PinFlowConfig;
pub use error::PinError;
pub use flow::{EacContext, PaceChannel, PinFlow, PinUi, StepResult};
pub use machine::{
    Action, ChannelResponse, EstablishOutcome, Event, Exit, Prompt, PromptMessage, transition,
};
pub use state::{
    CaptureMode, Credentials, InputError, PasswordKind, PinSession, PinStatus, Secret,
};

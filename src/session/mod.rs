//! Voice chat session
//!
//! A session moves through INIT, IDLE, RECORDING and REVIEW, driven by a
//! single primary control:
//! - `machine` holds the pure transition function
//! - `controller` carries out the side effects a transition asks for
//! - `affordances` derives what the controls look like in each state

mod affordances;
mod controller;
mod machine;
mod session;
mod view;

pub use affordances::Affordances;
pub use controller::{Dispatch, SessionController};
pub use machine::{step, Effect, Event, Outcome, PrimaryAction, SessionState, Step};
pub use session::Session;
pub use view::SessionView;

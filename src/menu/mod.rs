//! Menu engine: the USSD dialog as a closed state machine.
//!
//! Two regimes share one enum of states: an unregistered caller walks the
//! registration wizard, a registered caller navigates the main menu. The
//! regime is decided per callback from the registration lookup.

pub mod machine;
pub mod prompts;
pub mod state;

pub use machine::{NameError, Step, Transition, complete_registration, show_opportunities, step};
pub use state::{MenuState, Regime};

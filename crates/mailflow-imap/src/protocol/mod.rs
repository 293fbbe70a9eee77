//! Connection-level protocol state.
//!
//! [`ConnectionState`] is the RFC 9051 section 3 state machine, with an
//! explicit table of which states each command may be issued from
//! ([`StateSet`]) and the [`Transition`] a completed command applies.
//! [`Transmit`] is the encoded form of a command handed to the writer.

mod state;
mod transmit;

pub use state::{ConnectionState, SelectedState, StateKind, StateSet, Transition};
pub(crate) use state::absorb_status;
pub use transmit::Transmit;

//! Overlay text model
//!
//! - `KeySequence`: accumulated symbols with repeat collapsing
//! - `Presenter`: consumer task that feeds the sequence and owns the
//!   idle-hide timer

mod presenter;
mod sequence;

pub use presenter::{Presenter, PresenterCommand};
pub use sequence::KeySequence;

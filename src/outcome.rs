//! What a view command ended in

use log::{error, warn};

use crate::error::Error;
use crate::notice::Notifier;

/// Result of a view command. Failures have already been logged and shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action went through and the view was reloaded
    Done,
    /// The user declined a confirmation; nothing was sent
    Declined,
    /// Input was rejected before anything was sent
    Rejected,
    /// The store call failed; the view is unchanged
    Failed,
    /// No session; the presentation layer should show sign-in
    SignInRequired,
}

impl Outcome {
    pub fn is_done(self) -> bool {
        self == Outcome::Done
    }
}

/// Log `err`, show a notice and map it to an outcome.
///
/// Validation failures show their own message; store failures show `message`.
pub(crate) fn report(notifier: &dyn Notifier, message: &str, err: Error) -> Outcome {
    match err {
        Error::NotSignedIn => {
            warn!("{}: not signed in", message);
            Outcome::SignInRequired
        }
        Error::NoCustomerSelected => {
            warn!("{}: no customer selected", message);
            notifier.error("Please select a customer first.");
            Outcome::Rejected
        }
        Error::Validation(ref reason) => {
            warn!("{}: {}", message, reason);
            notifier.error(reason);
            Outcome::Rejected
        }
        err => {
            error!("{}: {}", message, err);
            notifier.error(message);
            Outcome::Failed
        }
    }
}

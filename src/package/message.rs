//! First-install notices and the events that surface them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A notice shown to the user the first time a package is picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMessage {
    pub id: String,
    pub text: String,
}

impl PackageMessage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Side effects produced by action selection, dispatched by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageEvent {
    ShowMessage {
        package: String,
        message: PackageMessage,
    },
}

/// Presentation of package messages.
///
/// Implementations must suppress duplicates: the same message may be
/// requested every time its package is picked.
#[cfg_attr(test, mockall::automock)]
pub trait MessageDisplay {
    /// Returns true if the message was displayed by this call.
    fn show_once(&mut self, package: &str, message: &PackageMessage) -> bool;
}

/// Send every event to `display`, returning how many messages were shown.
pub fn dispatch<D: MessageDisplay + ?Sized>(
    events: impl IntoIterator<Item = PackageEvent>,
    display: &mut D,
) -> usize {
    events
        .into_iter()
        .filter(|event| match event {
            PackageEvent::ShowMessage { package, message } => display.show_once(package, message),
        })
        .count()
}

/// Prints each message id at most once to stdout.
#[derive(Debug, Default)]
pub struct ConsoleMessages {
    shown: HashSet<String>,
}

impl ConsoleMessages {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageDisplay for ConsoleMessages {
    fn show_once(&mut self, package: &str, message: &PackageMessage) -> bool {
        if !self.shown.insert(message.id.clone()) {
            return false;
        }
        println!("Note for {}: {}", package, message.text);
        true
    }
}

//! The admin PIN gate.
//!
//! Switches the kiosk between the visitor view and the staff view. The PIN is
//! a shared constant and all kiosk data is readable on the device anyway, so
//! this only hides the admin tools from casual visitors.

use tracing::{info, warn};

use crate::error::{Error, Result};

/// PIN used when the configuration does not set one.
pub const DEFAULT_ADMIN_PIN: &str = "2468";

/// Longest PIN input accepted; extra digits are dropped.
pub const MAX_PIN_INPUT_LEN: usize = 6;

/// Keep only ASCII digits and cap the length, as the PIN keypad does.
#[must_use]
pub fn sanitize_pin_input(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(MAX_PIN_INPUT_LEN)
        .collect()
}

/// Tracks whether admin mode is unlocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGate {
    pin: String,
    unlocked: bool,
}

impl AdminGate {
    /// Create a locked gate for `pin`.
    #[must_use]
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            unlocked: false,
        }
    }

    /// Whether admin mode is active.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.unlocked
    }

    /// Try to unlock with raw keypad input.
    ///
    /// The input is sanitized first, then compared exactly against the PIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncorrectPin`] on mismatch; the gate state is
    /// unchanged.
    pub fn submit(&mut self, raw: &str) -> Result<()> {
        let entered = sanitize_pin_input(raw);
        if entered == self.pin {
            self.unlocked = true;
            info!("Admin mode unlocked");
            Ok(())
        } else {
            warn!("Rejected admin PIN attempt");
            Err(Error::IncorrectPin)
        }
    }

    /// Leave admin mode.
    pub fn lock(&mut self) {
        if self.unlocked {
            info!("Admin mode locked");
        }
        self.unlocked = false;
    }

    /// Refuse `action` unless admin mode is active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AdminRequired`] while locked.
    pub fn require(&self, action: &'static str) -> Result<()> {
        if self.unlocked {
            Ok(())
        } else {
            Err(Error::AdminRequired { action })
        }
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_PIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_pin_input() {
        assert_eq!(sanitize_pin_input("24-68"), "2468");
        assert_eq!(sanitize_pin_input(" 2468\n"), "2468");
        assert_eq!(sanitize_pin_input("123456789"), "123456");
        assert_eq!(sanitize_pin_input("abcd"), "");
    }

    #[test]
    fn test_starts_locked() {
        assert!(!AdminGate::default().is_admin());
    }

    #[test]
    fn test_correct_pin_unlocks() {
        let mut gate = AdminGate::default();
        gate.submit("2468").unwrap();
        assert!(gate.is_admin());
    }

    #[test]
    fn test_wrong_pin_keeps_locked() {
        let mut gate = AdminGate::default();
        for attempt in ["", "1234", "24680", "246", "8642"] {
            let err = gate.submit(attempt).unwrap_err();
            assert!(err.is_incorrect_pin());
            assert!(!gate.is_admin());
        }
    }

    #[test]
    fn test_wrong_pin_does_not_relock() {
        let mut gate = AdminGate::default();
        gate.submit("2468").unwrap();
        assert!(gate.submit("0000").is_err());
        assert!(gate.is_admin());
    }

    #[test]
    fn test_custom_pin() {
        let mut gate = AdminGate::new("1357");
        assert!(gate.submit("2468").is_err());
        gate.submit("1357").unwrap();
        assert!(gate.is_admin());
    }

    #[test]
    fn test_lock() {
        let mut gate = AdminGate::default();
        gate.submit("2468").unwrap();
        gate.lock();
        assert!(!gate.is_admin());
    }

    #[test]
    fn test_require() {
        let mut gate = AdminGate::default();
        assert!(matches!(
            gate.require("export"),
            Err(Error::AdminRequired { action: "export" })
        ));
        gate.submit("2468").unwrap();
        assert!(gate.require("export").is_ok());
    }
}

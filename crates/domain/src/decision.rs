//! Poker decisions returned by the oracle and the table commands they map to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Action keyword the oracle may choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PokerAction {
    Raise,
    Call,
    Check,
    Fold,
}

impl fmt::Display for PokerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            PokerAction::Raise => "RAISE",
            PokerAction::Call => "CALL",
            PokerAction::Check => "CHECK",
            PokerAction::Fold => "FOLD",
        };
        f.write_str(word)
    }
}

/// A validated oracle decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDecision {
    pub action: PokerAction,
    /// Raw amount as returned; only meaningful for `Raise`.
    pub amount: Option<f64>,
    pub reason: String,
}

impl ActionDecision {
    /// Raise amount in whole chips, if the decision carries a usable one.
    ///
    /// Fractions are floored; non-finite or sub-one amounts are unusable.
    pub fn raise_amount(&self) -> Option<u64> {
        if self.action != PokerAction::Raise {
            return None;
        }
        let amount = self.amount?;
        if !amount.is_finite() || amount < 1.0 || amount > u64::MAX as f64 {
            return None;
        }
        Some(amount.floor() as u64)
    }
}

/// The command the bot submits for its turn.
///
/// CALL is covered by the server's check command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCommand {
    Fold,
    Check,
    Raise(u64),
}

impl TableCommand {
    /// Map an optional decision to a command. No decision, or a raise without
    /// a usable amount, is a fold.
    pub fn from_decision(decision: Option<&ActionDecision>) -> Self {
        let Some(decision) = decision else {
            return TableCommand::Fold;
        };
        match decision.action {
            PokerAction::Fold => TableCommand::Fold,
            PokerAction::Check | PokerAction::Call => TableCommand::Check,
            PokerAction::Raise => decision
                .raise_amount()
                .map(TableCommand::Raise)
                .unwrap_or(TableCommand::Fold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(action: PokerAction, amount: Option<f64>) -> ActionDecision {
        ActionDecision {
            action,
            amount,
            reason: "test".into(),
        }
    }

    #[test]
    fn no_decision_is_a_fold() {
        assert_eq!(TableCommand::from_decision(None), TableCommand::Fold);
    }

    #[test]
    fn call_and_check_both_check() {
        let call = decision(PokerAction::Call, None);
        let check = decision(PokerAction::Check, Some(30.0));
        assert_eq!(TableCommand::from_decision(Some(&call)), TableCommand::Check);
        assert_eq!(TableCommand::from_decision(Some(&check)), TableCommand::Check);
    }

    #[test]
    fn raise_needs_a_usable_amount() {
        let raise = decision(PokerAction::Raise, Some(50.0));
        assert_eq!(TableCommand::from_decision(Some(&raise)), TableCommand::Raise(50));

        for bad in [None, Some(0.0), Some(-5.0), Some(0.5), Some(f64::NAN), Some(f64::INFINITY)] {
            let raise = decision(PokerAction::Raise, bad);
            assert_eq!(
                TableCommand::from_decision(Some(&raise)),
                TableCommand::Fold,
                "amount {bad:?} should fold"
            );
        }
    }

    #[test]
    fn fractional_raise_is_floored() {
        let raise = decision(PokerAction::Raise, Some(75.9));
        assert_eq!(raise.raise_amount(), Some(75));
    }

    #[test]
    fn amount_is_ignored_for_non_raise() {
        assert_eq!(decision(PokerAction::Call, Some(20.0)).raise_amount(), None);
    }
}

use log::debug;

use crate::errors::LedgerError;

pub const UNIT: u64 = 1_000_000_000; // One value unit (in smallest denomination)

/// The single pooled value account behind the ledger. Seed funds, premiums
/// and oracle registration fees flow in; passenger withdrawals flow out.
/// Crediting an insuree only moves a liability inside the escrow, so the
/// pool balance is the reconciliation point for value conservation.
pub struct Treasury {
    balance: u64,
}

impl Treasury {
    pub fn new() -> Self {
        Treasury { balance: 0 }
    }

    pub fn deposit(&mut self, amount: u64) {
        self.balance += amount;
        debug!("Treasury deposit of {} (balance {})", amount, self.balance);
    }

    pub fn withdraw(&mut self, amount: u64) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                provided: self.balance,
                required: amount,
            });
        }
        self.balance -= amount;
        debug!("Treasury withdrawal of {} (balance {})", amount, self.balance);
        Ok(())
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }
}

impl Default for Treasury {
    fn default() -> Self {
        Treasury::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawals_cannot_exceed_balance() {
        let mut treasury = Treasury::new();
        treasury.deposit(5 * UNIT);
        treasury.withdraw(3 * UNIT).unwrap();
        assert_eq!(treasury.balance(), 2 * UNIT);
        assert!(treasury.withdraw(3 * UNIT).is_err());
        assert_eq!(treasury.balance(), 2 * UNIT);
    }
}

use {
    crate::{
        boundary::{Ledger, LedgerError, Transfer},
        primitives::{Address, U256},
    },
    std::{collections::HashMap, sync::Mutex},
};

/// Balances kept in a single map behind a single lock, which makes every
/// batch atomic and totally ordered.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<Address, U256>>,
}

impl InMemoryLedger {
    /// Credits `amount` to `account` out of thin air.
    pub fn deposit(&self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(account).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(account))?;
        Ok(())
    }

    /// Sum of all balances. Transfers never change it.
    pub fn total_supply(&self) -> U256 {
        self.balances
            .lock()
            .unwrap()
            .values()
            .fold(U256::ZERO, |acc, balance| acc.saturating_add(*balance))
    }
}

impl Ledger for InMemoryLedger {
    fn balance(&self, account: Address) -> U256 {
        self.balances
            .lock()
            .unwrap()
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    fn apply(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let mut balances = self.balances.lock().unwrap();
        // Stage all changes on the touched accounts and only commit once the
        // whole batch went through.
        let mut staged: HashMap<Address, U256> = HashMap::new();
        for transfer in transfers {
            let from = *staged
                .entry(transfer.from)
                .or_insert_with(|| balances.get(&transfer.from).copied().unwrap_or_default());
            let debited = from
                .checked_sub(transfer.amount)
                .ok_or(LedgerError::InsufficientFunds {
                    account: transfer.from,
                    available: from,
                    required: transfer.amount,
                })?;
            staged.insert(transfer.from, debited);

            let to = *staged
                .entry(transfer.to)
                .or_insert_with(|| balances.get(&transfer.to).copied().unwrap_or_default());
            let credited = to
                .checked_add(transfer.amount)
                .ok_or(LedgerError::Overflow(transfer.to))?;
            staged.insert(transfer.to, credited);
        }
        balances.extend(staged);
        Ok(())
    }
}

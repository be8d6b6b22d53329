use super::model::{PaymentMethod, Transaction, TransactionStatus};
use serde::{Deserialize, Serialize};

/// Insertion-ordered transactions, most recent first.
///
/// Entries are only ever added; settled entries are never rewritten.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn prepend(&mut self, transaction: Transaction) {
        self.transactions.insert(0, transaction);
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|tx| tx.id == id)
    }

    /// Applies `mutate` to a non-terminal transaction in place.
    ///
    /// Returns the updated transaction, or `None` when the id is unknown or
    /// the transaction is already settled.
    pub fn update<F>(&mut self, id: &str, mutate: F) -> Option<&Transaction>
    where
        F: FnOnce(&mut Transaction),
    {
        let tx = self.get_mut(id)?;
        if tx.is_terminal() {
            return None;
        }
        mutate(tx);
        Some(tx)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| tx.status.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// In-flight card transactions count against the recharge cap.
    pub fn in_flight(&self, method: PaymentMethod) -> usize {
        self.transactions
            .iter()
            .filter(|tx| tx.method == Some(method) && tx.status == TransactionStatus::Processing)
            .count()
    }

    /// Adds transactions known elsewhere but missing here, keeping the
    /// most-recent-first order by creation time. Returns how many were added.
    pub fn merge(&mut self, other: &Ledger) -> usize {
        let mut added = 0;
        for tx in &other.transactions {
            if self.get(&tx.id).is_none() {
                self.transactions.push(tx.clone());
                added += 1;
            }
        }
        if added > 0 {
            self.transactions
                .sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        added
    }
}

use crate::transaction::Transaction;
use ahash::AHashMap;

/// Interned item identifier.
pub type ItemId = u32;

/// A frequent itemset over interned items, ids in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequentSet {
    pub items: Vec<ItemId>,
    pub count: usize,
}

/// Transactions as sorted rows of interned item ids.
///
/// Items are interned in first-seen order, so ids are stable for a given
/// input order.
#[derive(Debug, Default)]
pub struct TransactionMatrix {
    items: Vec<String>,
    index: AHashMap<String, ItemId>,
    rows: Vec<Vec<ItemId>>,
}

impl TransactionMatrix {
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut matrix = Self::default();
        for transaction in transactions {
            let mut row: Vec<ItemId> = transaction
                .items
                .iter()
                .map(|item| matrix.intern(item))
                .collect();
            row.sort_unstable();
            row.dedup();
            matrix.rows.push(row);
        }
        matrix
    }

    fn intern(&mut self, item: &str) -> ItemId {
        if let Some(&id) = self.index.get(item) {
            return id;
        }
        let id = self.items.len() as ItemId;
        self.items.push(item.to_string());
        self.index.insert(item.to_string(), id);
        id
    }

    pub fn rows(&self) -> &[Vec<ItemId>] {
        &self.rows
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn item(&self, id: ItemId) -> &str {
        self.items.get(id as usize).map(String::as_str).unwrap_or("")
    }

    pub fn id_of(&self, item: &str) -> Option<ItemId> {
        self.index.get(item).copied()
    }

    /// Support count of every single item, indexed by id.
    pub fn item_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.items.len()];
        for row in &self.rows {
            for &id in row {
                counts[id as usize] += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_first_seen_and_rows_are_sorted() {
        let transactions = vec![
            Transaction::from_items("1", ["b", "a"]),
            Transaction::from_items("2", ["c", "b"]),
        ];
        let matrix = TransactionMatrix::from_transactions(&transactions);
        assert_eq!(matrix.id_of("b"), Some(0));
        assert_eq!(matrix.id_of("a"), Some(1));
        assert_eq!(matrix.rows()[0], vec![0, 1]);
        assert_eq!(matrix.rows()[1], vec![0, 2]);
        assert_eq!(matrix.item_counts(), vec![2, 1, 1]);
        assert_eq!(matrix.item(2), "c");
    }
}

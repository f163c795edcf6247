use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;

use crate::{
    Error,
    auth::{NewUser, User, UserId, UserStore},
    transaction::{
        NewTransaction, SortOrder, Transaction, TransactionFilter, TransactionId,
        TransactionQuery, TransactionStore, parse_object_id,
    },
};

fn next_id(counter: &AtomicU64) -> String {
    format!("{:024x}", counter.fetch_add(1, Ordering::Relaxed) + 1)
}

#[derive(Default)]
pub(crate) struct InMemoryTransactionStore {
    transactions: Mutex<Vec<Transaction>>,
    ids: AtomicU64,
}

impl InMemoryTransactionStore {
    pub(crate) fn with_transactions(transactions: Vec<NewTransaction>) -> Self {
        let store = Self::default();
        {
            let mut stored = store.transactions.lock().unwrap();
            for transaction in transactions {
                stored.push(transaction.into_transaction(TransactionId::new(next_id(&store.ids))));
            }
        }
        store
    }

    pub(crate) fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let transaction = transaction.into_transaction(TransactionId::new(next_id(&self.ids)));
        self.transactions.lock().unwrap().push(transaction.clone());

        Ok(transaction)
    }

    async fn insert_many(&self, transactions: Vec<NewTransaction>) -> Result<u64, Error> {
        let count = transactions.len() as u64;
        let mut stored = self.transactions.lock().unwrap();
        for transaction in transactions {
            stored.push(transaction.into_transaction(TransactionId::new(next_id(&self.ids))));
        }

        Ok(count)
    }

    async fn get(&self, id: &TransactionId) -> Result<Transaction, Error> {
        parse_object_id(id)?;

        self.transactions
            .lock()
            .unwrap()
            .iter()
            .find(|transaction| &transaction.id == id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|transaction| query.filter.matches(transaction))
            .cloned()
            .collect();

        transactions.sort_by(|a, b| {
            let by_date = match query.sort {
                SortOrder::Ascending => a.date.cmp(&b.date),
                SortOrder::Descending => b.date.cmp(&a.date),
            };
            by_date.then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });

        Ok(transactions
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit.map_or(usize::MAX, |limit| limit as usize))
            .collect())
    }

    async fn count(&self, filter: &TransactionFilter) -> Result<u64, Error> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|transaction| filter.matches(transaction))
            .count() as u64)
    }

    async fn categories(&self) -> Result<Vec<String>, Error> {
        let mut categories: Vec<String> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .map(|transaction| transaction.category.clone())
            .filter(|category| !category.is_empty())
            .collect();
        categories.sort();
        categories.dedup();

        Ok(categories)
    }

    async fn delete_all(&self) -> Result<u64, Error> {
        let mut stored = self.transactions.lock().unwrap();
        let count = stored.len() as u64;
        stored.clear();

        Ok(count)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    ids: AtomicU64,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(Error::DuplicateEmail);
        }

        let user = user.into_user(UserId::new(next_id(&self.ids)));
        users.push(user.clone());

        Ok(user)
    }

    async fn get(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| &user.id == id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, Error> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(Error::NotFound)
    }
}

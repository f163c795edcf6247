//! Persistence for transactions in the `transactions` collection.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Bson, Document, doc, oid::ObjectId},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    transaction::{
        NewTransaction, Transaction, TransactionFilter, TransactionId, TransactionQuery,
        core::{from_unix_millis, to_unix_millis},
        query::SortOrder,
    },
};

/// Handles the creation and retrieval of transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Create a new transaction in the store.
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Insert many transactions at once, returning how many were inserted.
    ///
    /// An empty list is a no-op.
    async fn insert_many(&self, transactions: Vec<NewTransaction>) -> Result<u64, Error>;

    /// Retrieve a transaction from the store.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no transaction has the ID `id`.
    async fn get(&self, id: &TransactionId) -> Result<Transaction, Error>;

    /// Retrieve transactions from the store in the way defined by `query`.
    async fn query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error>;

    /// Count the transactions that match `filter`.
    async fn count(&self, filter: &TransactionFilter) -> Result<u64, Error>;

    /// The distinct, non-empty category labels in alphabetical order.
    async fn categories(&self) -> Result<Vec<String>, Error>;

    /// Delete every transaction, returning how many were deleted.
    async fn delete_all(&self) -> Result<u64, Error>;
}

/// The name of the collection transactions are stored in.
pub const TRANSACTION_COLLECTION: &str = "transactions";

/// The document shape of a transaction in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransactionDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    amount: f64,
    #[serde(default)]
    category: String,
    date: bson::DateTime,
    #[serde(default)]
    description: String,
}

impl From<&NewTransaction> for TransactionDocument {
    fn from(transaction: &NewTransaction) -> Self {
        Self {
            id: None,
            amount: transaction.amount,
            category: transaction.category.clone(),
            date: bson::DateTime::from_millis(to_unix_millis(transaction.date)),
            description: transaction.description.clone(),
        }
    }
}

impl TryFrom<TransactionDocument> for Transaction {
    type Error = Error;

    fn try_from(document: TransactionDocument) -> Result<Self, Self::Error> {
        let id = document
            .id
            .ok_or_else(|| Error::Internal("stored transaction has no _id".to_owned()))?;

        Ok(Transaction {
            id: TransactionId::new(id.to_hex()),
            amount: document.amount,
            category: document.category,
            date: from_unix_millis(document.date.timestamp_millis())?,
            description: document.description,
        })
    }
}

/// Stores transactions in a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoTransactionStore {
    collection: Collection<TransactionDocument>,
}

impl MongoTransactionStore {
    /// Create a store backed by the `transactions` collection of `database`.
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(TRANSACTION_COLLECTION),
        }
    }

    /// Create the index that backs date ordered queries.
    ///
    /// Creating an index that already exists is a no-op on the server.
    pub async fn ensure_indexes(&self) -> Result<(), Error> {
        let index = IndexModel::builder().keys(doc! { "date": -1 }).build();
        self.collection.create_index(index).await?;

        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MongoTransactionStore {
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let result = self
            .collection
            .insert_one(TransactionDocument::from(&transaction))
            .await?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::Internal("inserted transaction ID is not an ObjectId".to_owned()))?;

        Ok(transaction.into_transaction(TransactionId::new(id.to_hex())))
    }

    async fn insert_many(&self, transactions: Vec<NewTransaction>) -> Result<u64, Error> {
        if transactions.is_empty() {
            return Ok(0);
        }

        let documents: Vec<TransactionDocument> =
            transactions.iter().map(TransactionDocument::from).collect();
        let result = self.collection.insert_many(documents).await?;

        Ok(result.inserted_ids.len() as u64)
    }

    async fn get(&self, id: &TransactionId) -> Result<Transaction, Error> {
        let object_id = parse_object_id(id)?;

        self.collection
            .find_one(doc! { "_id": object_id })
            .await?
            .ok_or(Error::NotFound)?
            .try_into()
    }

    async fn query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let direction = match query.sort {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        };

        let mut find = self
            .collection
            .find(filter_document(&query.filter))
            .sort(doc! { "date": direction, "_id": -1 })
            .skip(query.skip);

        if let Some(limit) = query.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<TransactionDocument> = find.await?.try_collect().await?;

        documents.into_iter().map(Transaction::try_from).collect()
    }

    async fn count(&self, filter: &TransactionFilter) -> Result<u64, Error> {
        Ok(self
            .collection
            .count_documents(filter_document(filter))
            .await?)
    }

    async fn categories(&self) -> Result<Vec<String>, Error> {
        let values = self.collection.distinct("category", doc! {}).await?;

        let mut categories: Vec<String> = values
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(category) if !category.is_empty() => Some(category),
                _ => None,
            })
            .collect();
        categories.sort();

        Ok(categories)
    }

    async fn delete_all(&self) -> Result<u64, Error> {
        let result = self.collection.delete_many(doc! {}).await?;

        Ok(result.deleted_count)
    }
}

/// Parse a transaction ID as the 24 digit hex form of an [ObjectId].
///
/// # Errors
/// Returns [Error::Validation] if `id` is not an [ObjectId].
pub(crate) fn parse_object_id(id: &TransactionId) -> Result<ObjectId, Error> {
    ObjectId::parse_str(id.as_str())
        .map_err(|_| Error::Validation(format!("\"{id}\" is not a valid transaction ID")))
}

/// Translate a [TransactionFilter] into a MongoDB query document.
fn filter_document(filter: &TransactionFilter) -> Document {
    let mut document = Document::new();

    if let Some(category) = &filter.category {
        document.insert("category", category.as_str());
    }

    let mut date_range = Document::new();
    if let Some(from) = filter.from {
        date_range.insert("$gte", bson::DateTime::from_millis(to_unix_millis(from)));
    }
    if let Some(to) = filter.to {
        date_range.insert("$lte", bson::DateTime::from_millis(to_unix_millis(to)));
    }
    if !date_range.is_empty() {
        document.insert("date", date_range);
    }

    if let Some(search) = &filter.search {
        document.insert(
            "description",
            doc! { "$regex": escape_regex(search), "$options": "i" },
        );
    }

    document
}

/// Escape the characters that have a special meaning in a regular expression.
fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for character in text.chars() {
        if "\\^$.|?*+()[]{}".contains(character) {
            escaped.push('\\');
        }
        escaped.push(character);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{self, doc};
    use time::macros::datetime;

    use crate::transaction::{
        TransactionFilter,
        TransactionId,
        store::{escape_regex, filter_document, parse_object_id},
    };

    #[test]
    fn empty_filter_matches_all_documents() {
        assert_eq!(filter_document(&TransactionFilter::default()), doc! {});
    }

    #[test]
    fn filter_document_combines_conditions() {
        let filter = TransactionFilter {
            category: Some("Food".to_owned()),
            from: Some(datetime!(2024-01-01 00:00 UTC)),
            to: None,
            search: Some("a.b".to_owned()),
        };

        let want = doc! {
            "category": "Food",
            "date": { "$gte": bson::DateTime::from_millis(1_704_067_200_000) },
            "description": { "$regex": "a\\.b", "$options": "i" },
        };

        assert_eq!(filter_document(&filter), want);
    }

    #[test]
    fn transaction_ids_must_be_object_ids() {
        assert!(parse_object_id(&TransactionId::new("65a4f1c2e4b0a1b2c3d4e5f6")).is_ok());

        for id in ["", "1", "not-an-id", "65a4f1c2e4b0a1b2c3d4e5fz"] {
            assert!(
                matches!(
                    parse_object_id(&TransactionId::new(id)),
                    Err(crate::Error::Validation(_))
                ),
                "want validation error for {id:?}"
            );
        }
    }

    #[test]
    fn escapes_regex_metacharacters() {
        assert_eq!(escape_regex("($5.00) coffee?"), "\\(\\$5\\.00\\) coffee\\?");
        assert_eq!(escape_regex("plain"), "plain");
    }
}

use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod days;
mod expenses;
mod registry;
mod statistics;

/// Default upper bound for `PageRequest::limit`.
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// The transaction handle is passed explicitly to every helper called from the
/// block; nothing reads it from ambient state. `?` inside the block ends the
/// block, not the caller, so the rollback branch sees every failure.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = async { $body }.await;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                $tx.rollback().await?;
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    max_page_size: u64,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    max_page_size: u64,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Cap for requested page sizes (values below 1 are treated as 1).
    pub fn max_page_size(mut self, max_page_size: u64) -> EngineBuilder {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            max_page_size: self.max_page_size,
        })
    }
}

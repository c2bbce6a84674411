pub mod util;

pub mod config;
pub mod context;
pub mod events;
pub mod models;
pub mod schema;

use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::PoolError;
use diesel_async::AsyncPgConnection;

use util::db_util::{log_server_error, EngineError, ERROR_DB_CONNECTION};

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

pub async fn establish_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder().build(manager).await
}

pub async fn get_connection<'a>(
    pool: &'a DbPool,
    location: &'static str,
) -> Result<DbConnection<'a>, EngineError> {
    pool.get()
        .await
        .map_err(|e| log_server_error(e, location, ERROR_DB_CONNECTION))
}

pub trait Ext<R>: Sized {
    fn tap_mut(mut self, f: impl FnOnce(&mut Self) -> R) -> Self {
        f(&mut self);
        self
    }

    fn tap(self, f: impl FnOnce(&Self) -> R) -> Self {
        f(&self);
        self
    }
}

impl<T, R> Ext<R> for T {}

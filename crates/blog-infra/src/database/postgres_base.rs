use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel};

use blog_core::error::RepoError;

/// PostgreSQL repository over one entity, sharing the pooled connection.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: Arc<DbConn>,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self {
            db: db.into(),
            _entity: PhantomData,
        }
    }

    /// Update the row if it exists, insert it otherwise.
    pub(crate) async fn upsert(&self, active_model: E::ActiveModel) -> Result<E::Model, RepoError>
    where
        E::Model: IntoActiveModel<E::ActiveModel>,
        E::ActiveModel: ActiveModelTrait<Entity = E> + Send + Sync,
    {
        match E::update(active_model.clone()).exec(self.db.as_ref()).await {
            Ok(model) => Ok(model),
            Err(DbErr::RecordNotUpdated) => E::insert(active_model)
                .exec_with_returning(self.db.as_ref())
                .await
                .map_err(write_error),
            Err(e) => Err(write_error(e)),
        }
    }
}

pub(crate) fn query_error(e: DbErr) -> RepoError {
    match e {
        DbErr::Conn(err) => RepoError::Connection(err.to_string()),
        DbErr::ConnectionAcquire(err) => RepoError::Connection(err.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

fn write_error(e: DbErr) -> RepoError {
    let err_str = e.to_string();
    if err_str.contains("duplicate") || err_str.contains("unique") {
        RepoError::Constraint("Entity already exists".to_string())
    } else if err_str.contains("foreign key") {
        RepoError::Constraint("Referenced entity does not exist".to_string())
    } else {
        query_error(e)
    }
}

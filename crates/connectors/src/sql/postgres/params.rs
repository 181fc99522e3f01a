use tokio_postgres::types::ToSql;

/// One bound parameter with its concrete Rust type erased.
pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn new<T>(value: T) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        PgParam(Box::new(value))
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    pub fn new(params: Vec<PgParam>) -> Self {
        Self { params }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}

use crate::{
    connectors::destination::DestinationStore,
    error::DestinationError,
    load::{Written, required},
};
use model::records::row::Row;

#[derive(Debug, Clone, PartialEq)]
pub struct SetLoader {
    pub value: String,
}

impl SetLoader {
    pub(crate) async fn write(
        &self,
        row: &Row,
        key: &str,
        destination: &dyn DestinationStore,
    ) -> Result<Written, DestinationError> {
        let member = match required(row, &self.value) {
            Ok(member) => member,
            Err(reason) => return Ok(Written::Skipped(reason)),
        };
        destination.set_add(key, &member).await?;
        Ok(Written::Loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        load::{LoadStrategy, test_support::row},
        memory::MemoryDestination,
    };
    use model::core::value::Value;

    #[tokio::test]
    async fn repeated_members_collapse() {
        let dest = MemoryDestination::new();
        let strategy = LoadStrategy::Set(SetLoader { value: "tag".into() });
        let rows = vec![
            row(&[("tag", Value::from("red"))]),
            row(&[("tag", Value::from("red"))]),
            row(&[("tag", Value::from("blue"))]),
        ];

        let stats = strategy.apply(&rows, "tags", &dest).await.unwrap();
        assert_eq!(stats.loaded, 3);
        assert_eq!(dest.set("tags"), vec!["blue", "red"]);

        // Loading the same batch again changes nothing.
        strategy.apply(&rows, "tags", &dest).await.unwrap();
        assert_eq!(dest.set("tags"), vec!["blue", "red"]);
    }
}

//! Export local entries as a data pack.
//!
//! The output is a JSON array of the stored payloads ordered by name, so it
//! can be fed straight back to `put` or `load`.

use serde_json::Value;
use std::path::Path;

use crate::database::Database;
use crate::error::Result;
use crate::models::SortOrder;
use crate::store::Store;

/// All local payloads, optionally of exactly `at_type`.
pub async fn export_local<S: Store + ?Sized>(store: &S, at_type: Option<&str>) -> Result<Value> {
    let page = store.list_local(at_type, 0, i64::MAX, SortOrder::Asc).await?;
    Ok(Value::Array(page.items))
}

/// Write the export to `output`, or to stdout when `None`.
pub async fn run_export(db: &Database, at_type: Option<&str>, output: Option<&Path>) -> Result<()> {
    let pack = export_local(db.store(), at_type).await?;
    let json = serde_json::to_string_pretty(&pack)?;
    let count = pack.as_array().map_or(0, Vec::len);

    match output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            eprintln!("exported {} entries to {}", count, path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local;
    use crate::store::InMemoryStore;
    use crate::validate::verify_input_data;
    use serde_json::json;

    #[tokio::test]
    async fn test_export_is_a_valid_pack() {
        let store = InMemoryStore::new();
        local::put(
            &store,
            &json!([
                {"@id": "b", "@type": "Person", "name": "Bea"},
                {"@id": "a", "@type": "Person", "name": "Al", "description": "first"},
                {"@id": "x", "@type": "Place", "name": "Xanadu"}
            ]),
        )
        .await
        .unwrap();

        let pack = export_local(&store, Some("Person")).await.unwrap();
        let entries = verify_input_data(&pack).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Al", "Bea"]);
    }
}

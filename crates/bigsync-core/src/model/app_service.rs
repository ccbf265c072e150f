//! iApp application services: template-driven object bundles.
//!
//! An app service is declared by naming a template and feeding it variables
//! and tables; the device expands those into the underlying objects. The
//! engine manages the service instance itself, never the expansion.

use serde::{Deserialize, Serialize};

use crate::model::common::Identified;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct IAppVariable {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct IAppTable {
    pub name: String,
    #[serde(default)]
    pub column_names: Vec<String>,
    /// Row values, positionally matching `column_names`.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AppService {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    /// Template full path, e.g. `/Common/f5.http`.
    pub template: String,
    /// Variables, kept sorted by name.
    #[serde(default)]
    pub variables: Vec<IAppVariable>,
    /// Tables, kept sorted by name; row order within a table is preserved.
    #[serde(default)]
    pub tables: Vec<IAppTable>,
}

impl AppService {
    pub fn normalize(&mut self) {
        self.variables.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        self.tables.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    }
}

impl Identified for AppService {
    fn name(&self) -> &str {
        &self.name
    }
    fn partition(&self) -> &str {
        &self.partition
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn variables_sort_but_table_rows_keep_order() {
        let mut app: AppService = serde_json::from_str(
            r#"{
                "name": "shop",
                "template": "/Common/f5.http",
                "variables": [
                    { "name": "b_var", "value": "2" },
                    { "name": "a_var", "value": "1" }
                ],
                "tables": [{
                    "name": "pool__members",
                    "columnNames": ["addr", "port"],
                    "rows": [["10.0.0.2", "80"], ["10.0.0.1", "80"]]
                }]
            }"#,
        )
        .unwrap();
        app.normalize();

        assert_eq!(app.variables[0].name, "a_var");
        assert_eq!(app.tables[0].rows[0][0], "10.0.0.2");
    }
}

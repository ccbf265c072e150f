//! iRules: TCL snippets attached to virtual servers.

use serde::{Deserialize, Serialize};

use crate::model::common::Identified;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct IRule {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    /// The TCL body, compared verbatim: whitespace changes are changes.
    pub definition: String,
}

impl Identified for IRule {
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
    fn definition_is_compared_verbatim() {
        let a: IRule = serde_json::from_str(
            r#"{ "name": "redirect", "definition": "when HTTP_REQUEST {\n  HTTP::redirect https://[HTTP::host][HTTP::uri]\n}" }"#,
        )
        .unwrap();
        let mut b = a.clone();
        assert_eq!(a, b);

        b.definition.push('\n');
        assert_ne!(a, b);
    }
}

//! JSON renderer: the serialized `SchemaDiff`, pretty-printed.

use capdiff_core::SchemaDiff;

pub fn render(diff: &SchemaDiff) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(diff)
}

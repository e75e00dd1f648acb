//! Module with the handlers for listing available operations and resources.

use pixl::{Operation, Processor};
use serde_json::Value as Json;


/// List all operations together with their parameter names.
pub fn list_operations() -> Json {
    let operations: Vec<_> = Operation::iter_variants()
        .map(|op| json!({"name": op.name(), "params": op.params()}))
        .collect();
    Json::Array(operations)
}

/// List all available font names.
///
/// An unreadable font directory is reported as having no fonts.
pub fn list_fonts(processor: &Processor) -> Json {
    debug!("Listing all available fonts...");
    let fonts = processor.font_names().unwrap_or_else(|e| {
        error!("Failed to list fonts: {}", e);
        vec![]
    });
    debug!("{} font(s) found", fonts.len());
    json!(fonts)
}

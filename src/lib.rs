pub mod ast;
pub mod compiler;
pub mod directive;
pub mod error;
pub mod layout;
pub mod lexer;
pub mod naming;
pub mod parser;
pub mod types;

use wasm_bindgen::prelude::*;

pub use compiler::compile;
pub use error::{Error, ErrorKind};
pub use layout::{Column, ColumnType, DbType, Layout, Relation, RelationKind, Table};

/// Compile subgraph schema text into its table layout.
pub fn parse(source: &str) -> Result<Layout, Error> {
    let document = parser::parse_document(source)?;
    compile(&document)
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Compile schema text and return the layout as a plain JS object
#[wasm_bindgen(js_name = "parseSchema")]
pub fn parse_schema(source: &str) -> Result<JsValue, String> {
    let layout = parse(source).map_err(|e| e.to_string())?;
    let json = layout.to_json().map_err(|e| e.to_string())?;
    js_sys::JSON::parse(&json).map_err(|e| format!("{:?}", e))
}

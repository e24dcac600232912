//! WebAssembly bindings for pegmark
//!
//! JavaScript-friendly wrappers around [`MarkupScanner`]. Only compiled when
//! targeting wasm32.

#![cfg(target_arch = "wasm32")]

use crate::{Document, GrammarSource, MarkupScanner, ParserCache, ScanOptions};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

// Set panic hook for better error messages in browser
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

// Use smaller allocator for WASM
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Result type for JavaScript interop
#[wasm_bindgen]
#[derive(Debug)]
pub struct ScanOutput {
    success: bool,
    output: String,
    error: Option<String>,
}

#[wasm_bindgen]
impl ScanOutput {
    #[wasm_bindgen(getter)]
    pub fn success(&self) -> bool {
        self.success
    }

    #[wasm_bindgen(getter)]
    pub fn output(&self) -> String {
        self.output.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.error.clone()
    }
}

impl ScanOutput {
    fn failed(error: String) -> Self {
        ScanOutput {
            success: false,
            output: String::new(),
            error: Some(error),
        }
    }
}

/// WASM-friendly scanner
#[wasm_bindgen]
pub struct WasmScanner {
    scanner: MarkupScanner,
}

#[wasm_bindgen]
impl WasmScanner {
    /// Compile a grammar. `options` is a plain object of string values,
    /// e.g. `{ completeMatch: "true" }`, or `undefined`.
    #[wasm_bindgen(constructor)]
    pub fn new(grammar: &str, options: JsValue) -> Result<WasmScanner, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        set_panic_hook();

        let map: HashMap<String, String> = if options.is_undefined() || options.is_null() {
            HashMap::new()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?
        };
        let options = ScanOptions::from_map(map);

        // A browser has no grammar files; the text itself is the source
        let scanner = MarkupScanner::with_cache(
            &GrammarSource::text(grammar),
            options,
            ParserCache::shared(),
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(WasmScanner { scanner })
    }

    /// Scan an XML document and return it with markup added
    pub fn scan(&self, xml: &str) -> ScanOutput {
        let mut document = match Document::from_xml(xml) {
            Ok(document) => document,
            Err(e) => return ScanOutput::failed(e.to_string()),
        };
        match self.scanner.scan(&mut document) {
            Ok(()) => ScanOutput {
                success: true,
                output: document.to_xml(),
                error: None,
            },
            Err(e) => ScanOutput::failed(e.to_string()),
        }
    }

    /// Scan plain text wrapped in a `wrapper` element
    pub fn scan_text(&self, text: &str) -> ScanOutput {
        let mut document = Document::from_text(text);
        match self.scanner.scan(&mut document) {
            Ok(()) => ScanOutput {
                success: true,
                output: document.to_xml(),
                error: None,
            },
            Err(e) => ScanOutput::failed(e.to_string()),
        }
    }
}

/// Convenience function: compile and scan in one step
#[wasm_bindgen]
pub fn scan_xml(grammar: &str, xml: &str, options: JsValue) -> ScanOutput {
    match WasmScanner::new(grammar, options) {
        Ok(scanner) => scanner.scan(xml),
        Err(e) => ScanOutput::failed(e.as_string().unwrap_or_else(|| format!("{:?}", e))),
    }
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

//! FFI interface for C/C++ callers
//!
//! Records are described at runtime with a [`Schema`]; requests and results
//! cross the boundary as JSON strings.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use scraper::Html;
use serde::Deserialize;

use crate::config::Config;
use crate::mapper::Engine;
use crate::schema::Schema;
use crate::selection::Selection;
use crate::tag;

/// Result struct returned to C/C++
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// What `pagemap_extract` should map
#[derive(Debug, Deserialize)]
pub struct ExtractionRequest {
    #[serde(default)]
    pub config: Option<Config>,
    pub schema: Schema,
}

/// Map HTML into a JSON object shaped by the request's schema.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON-serialized ExtractionRequest (null-terminated)
///
/// # Returns
/// ExtractionResultFFI with either json_ptr set (success) or error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn pagemap_extract(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ExtractionResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };

    let request_str = match read_c_str(request_json, "Request JSON") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    let request: ExtractionRequest = match serde_json::from_str(request_str) {
        Ok(r) => r,
        Err(e) => {
            return make_error_result(&format!("Failed to parse request JSON: {}", e));
        }
    };

    match extract(html, &request) {
        Ok(json) => make_json_result(json),
        Err(msg) => make_error_result(&msg),
    }
}

/// Parse a single tag expression and return its parts as JSON,
/// `{"selector": ..., "function": ..., "arguments": [...]}`.
///
/// # Safety
/// - `expression` and `separator` must be valid null-terminated C strings;
///   a null `separator` means `->`
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn pagemap_parse_tag(
    expression: *const c_char,
    separator: *const c_char,
) -> ExtractionResultFFI {
    let expression = match read_c_str(expression, "Expression") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };
    let separator = if separator.is_null() {
        crate::config::DEFAULT_FUNCTION_SEPARATOR
    } else {
        match read_c_str(separator, "Separator") {
            Ok(s) => s,
            Err(msg) => return make_error_result(&msg),
        }
    };

    let parsed = match tag::parse(expression, separator) {
        Ok(parsed) => parsed,
        Err(e) => return make_error_result(&e.to_string()),
    };
    match serde_json::to_string(&parsed) {
        Ok(json) => make_json_result(json),
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free an ExtractionResultFFI returned by this module
///
/// # Safety
/// - `result` must have been returned by `pagemap_extract` or `pagemap_parse_tag`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn extract(html: &str, request: &ExtractionRequest) -> Result<String, String> {
    let engine = match &request.config {
        Some(config) => Engine::with_config(config.clone()).map_err(|e| e.to_string())?,
        None => Engine::new(),
    };

    let document = Html::parse_document(html);
    let mapped = engine
        .map_schema(&request.schema, &Selection::document(&document))
        .map_err(|e| e.to_string())?;

    serde_json::to_string(&mapped).map_err(|e| format!("Failed to serialize result: {}", e))
}

unsafe fn read_html<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn read_c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} is null", what));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 in {}", what.to_lowercase()))
}

fn make_json_result(json: String) -> ExtractionResultFFI {
    match CString::new(json) {
        Ok(cstr) => ExtractionResultFFI {
            json_ptr: cstr.into_raw(),
            error_ptr: ptr::null_mut(),
        },
        Err(_) => make_error_result("Result JSON contains null bytes"),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HTML: &str = r#"
        <html>
        <head><title>Shop</title></head>
        <body>
            <div class="item" data-price="3">Apple</div>
            <div class="item" data-price="x">Pear</div>
        </body>
        </html>
    "#;

    fn take(result: ExtractionResultFFI) -> Result<String, String> {
        let out = unsafe {
            if result.json_ptr.is_null() {
                Err(CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned())
            } else {
                Ok(CStr::from_ptr(result.json_ptr).to_string_lossy().into_owned())
            }
        };
        unsafe { free_extraction_result(result) };
        out
    }

    fn run(request: serde_json::Value) -> Result<serde_json::Value, String> {
        let request = CString::new(request.to_string()).unwrap();
        let result = unsafe {
            pagemap_extract(HTML.as_ptr() as *const c_char, HTML.len(), request.as_ptr())
        };
        take(result).map(|json| serde_json::from_str(&json).unwrap())
    }

    #[test]
    fn test_extract() {
        let out = run(json!({
            "schema": {"fields": [
                {"name": "title", "expr": "title", "kind": "string"},
                {"name": "items", "expr": ".item", "kind": {"list": {"record": {"fields": [
                    {"name": "name", "expr": "->text()", "kind": "string"},
                    {"name": "price", "expr": "->attr(data-price)", "kind": "int"}
                ]}}}}
            ]}
        }))
        .unwrap();

        assert_eq!(
            out,
            json!({
                "title": "Shop",
                "items": [
                    {"name": "Apple", "price": 3},
                    {"name": "Pear", "price": 0}
                ]
            })
        );
    }

    #[test]
    fn test_extract_strict_config_reports_field() {
        let err = run(json!({
            "config": {"strict_cast": true},
            "schema": {"fields": [
                {"name": "prices", "expr": ".item->eachAttr(data-price)", "kind": {"list": "int"}}
            ]}
        }))
        .unwrap_err();
        assert!(err.starts_with("tag=`.item->eachAttr(data-price)`"), "{}", err);
    }

    #[test]
    fn test_extract_bad_requests() {
        let err = run(json!({"schema": {"fields": [{"name": "a"}]}})).unwrap_err();
        assert!(err.starts_with("Failed to parse request JSON"), "{}", err);

        let err = run(json!({
            "config": {"function_separator": ""},
            "schema": {"fields": []}
        }))
        .unwrap_err();
        assert!(err.starts_with("invalid configuration"), "{}", err);

        let result = unsafe { pagemap_extract(HTML.as_ptr() as *const c_char, HTML.len(), ptr::null()) };
        assert_eq!(take(result).unwrap_err(), "Request JSON is null");
    }

    #[test]
    fn test_parse_tag() {
        let expression = CString::new(".nav a->attr(href, '#')").unwrap();
        let result = unsafe { pagemap_parse_tag(expression.as_ptr(), ptr::null()) };
        let parsed: serde_json::Value = serde_json::from_str(&take(result).unwrap()).unwrap();
        assert_eq!(
            parsed,
            json!({"selector": ".nav a", "function": "attr", "arguments": ["href", "#"]})
        );

        let broken = CString::new("a->attr('x)").unwrap();
        let result = unsafe { pagemap_parse_tag(broken.as_ptr(), ptr::null()) };
        assert!(take(result).unwrap_err().contains("quote not closed"));
    }
}

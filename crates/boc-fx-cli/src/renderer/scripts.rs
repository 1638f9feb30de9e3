//! JavaScript snippets evaluated in the driven tab.
//!
//! Every caller-supplied string goes through [`sanitize_js_string`] and is
//! embedded in a single-quoted literal.

use boc_fx::Locator;

/// Escape a string for embedding in a JS string literal.
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}

/// Expression evaluating to an array of every element matching `locator`.
fn nodes_expr(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => format!(
            "Array.from(document.querySelectorAll('{}'))",
            sanitize_js_string(selector)
        ),
        Locator::XPath(expr) => format!(
            r#"(() => {{
                const snap = document.evaluate('{}', document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                const out = [];
                for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i));
                return out;
            }})()"#,
            sanitize_js_string(expr)
        ),
    }
}

/// Whether at least one element matches.
pub fn exists(locator: &Locator) -> String {
    format!("{}.length > 0", nodes_expr(locator))
}

/// `property` of every matching element, as strings.
pub fn read_property(locator: &Locator, property: &str) -> String {
    format!(
        "{}.map(el => {{ const v = el['{}']; return v == null ? '' : String(v); }})",
        nodes_expr(locator),
        sanitize_js_string(property)
    )
}

/// Select the whole content of a text field. Evaluates to false when it is missing.
pub fn select_contents(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (!el) return false;
            el.focus();
            if (typeof el.select === 'function') el.select();
            return true;
        }})()"#,
        sanitize_js_string(selector)
    )
}

/// Choose an option of a `<select>` and fire `change`. Evaluates to false when
/// the select or the option is missing.
pub fn select_option(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (!el) return false;
            const value = '{}';
            if (!Array.from(el.options).some(o => o.value === value)) return false;
            el.value = value;
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        sanitize_js_string(selector),
        sanitize_js_string(value)
    )
}

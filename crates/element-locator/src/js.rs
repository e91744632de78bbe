//! Compilation of locators into in-page JavaScript expressions.
//!
//! Every expression is a self-contained IIFE returning a plain object with a
//! `status` field, suitable for `Runtime.evaluate` with `returnByValue`.
//! Embedded strings go through `serde_json::to_string`, which yields valid
//! JavaScript string literals, so selectors containing quotes compile intact.

use crate::types::Locator;

const VISIBLE_HELPER: &str = "    const visible = (el) => {\n        if (!el || !(el instanceof Element)) { return false; }\n        const rect = el.getBoundingClientRect();\n        if (rect.width <= 0 || rect.height <= 0) { return false; }\n        const style = window.getComputedStyle(el);\n        return style.visibility !== 'hidden' && style.display !== 'none';\n    };";

const HIT_HELPER: &str = "    const hit = (el) => {\n        const rect = el.getBoundingClientRect();\n        return { status: 'found', x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 };\n    };";

/// Elements considered when matching by visible text.
const TEXT_POOL_SELECTOR: &str =
    "a, button, span, div, label, p, td, th, li, h1, h2, h3, h4, h5, h6, legend, summary, [role]";

/// Escape a Rust string into a JavaScript string literal.
pub fn js_string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""))
}

/// Expression probing for the first visible element matched by `locator`.
///
/// Evaluates to `{ status: 'found', x, y }` with the element's viewport
/// center, or `{ status: 'not-found' }`.
pub fn probe_expression(locator: &Locator) -> String {
    format!(
        "(() => {{\n{visible}\n{hit}\n{candidates}\n    for (const el of candidates) {{\n        if (visible(el)) {{ return hit(el); }}\n    }}\n    return {{ status: 'not-found' }};\n}})()",
        visible = VISIBLE_HELPER,
        hit = HIT_HELPER,
        candidates = candidates_snippet(locator),
    )
}

/// Expression focusing the first visible match and selecting its current
/// content so a subsequent `Input.insertText` replaces instead of appends.
///
/// Evaluates to `{ status: 'focused' }` or `{ status: 'not-found' }`.
pub fn focus_expression(locator: &Locator) -> String {
    format!(
        "(() => {{\n{visible}\n{candidates}\n    for (const el of candidates) {{\n        if (!visible(el)) {{ continue; }}\n        el.scrollIntoView({{ block: 'center', inline: 'center' }});\n        if (typeof el.focus === 'function') {{ el.focus(); }}\n        if (typeof el.select === 'function') {{ try {{ el.select(); }} catch (err) {{}} }}\n        return {{ status: 'focused' }};\n    }}\n    return {{ status: 'not-found' }};\n}})()",
        visible = VISIBLE_HELPER,
        candidates = candidates_snippet(locator),
    )
}

/// Expression selecting `option` on the first visible `<select>` match,
/// matching option labels first and raw values second, then firing the
/// `input` and `change` events frameworks listen for.
///
/// Evaluates to `{ status: 'selected' }`, `{ status: 'option-missing' }` or
/// `{ status: 'not-found' }`.
pub fn select_option_expression(locator: &Locator, option: &str) -> String {
    format!(
        "(() => {{\n{visible}\n{candidates}\n    const wanted = {option};\n    for (const el of candidates) {{\n        if (!visible(el)) {{ continue; }}\n        const options = Array.from(el.options || []);\n        let match = options.find((opt) => opt.text.trim() === wanted);\n        if (!match) {{ match = options.find((opt) => opt.value === wanted); }}\n        if (!match) {{ return {{ status: 'option-missing' }}; }}\n        el.value = match.value;\n        el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n        el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n        return {{ status: 'selected' }};\n    }}\n    return {{ status: 'not-found' }};\n}})()",
        visible = VISIBLE_HELPER,
        candidates = candidates_snippet(locator),
        option = js_string_literal(option),
    )
}

/// Snippet binding `candidates` to the elements the strategy considers, in
/// document order.
fn candidates_snippet(locator: &Locator) -> String {
    match locator {
        Locator::Css { selector } => format!(
            "    let candidates;\n    try {{\n        candidates = Array.from(document.querySelectorAll({lit}));\n    }} catch (err) {{\n        return {{ status: 'not-found' }};\n    }}",
            lit = js_string_literal(selector),
        ),
        Locator::Text { content, exact } => format!(
            "    const needle = {lit};\n    const pool = Array.from(document.querySelectorAll({pool}));\n    const matched = pool.filter((el) => {{\n        const text = (el.textContent || '').trim();\n        return {exact} ? text === needle : text.includes(needle);\n    }});\n    const candidates = matched.filter((el) => !matched.some((other) => other !== el && el.contains(other)));",
            lit = js_string_literal(content),
            pool = js_string_literal(TEXT_POOL_SELECTOR),
            exact = exact,
        ),
        Locator::Role { role, name } => {
            let name_literal = match name {
                Some(name) => js_string_literal(name),
                None => String::from("null"),
            };
            format!(
                "    const wantedName = {name};\n    const accessibleName = (el) => {{\n        const label = el.getAttribute('aria-label');\n        if (label) {{ return label.trim(); }}\n        if (el.tagName === 'INPUT' && el.value) {{ return String(el.value).trim(); }}\n        return (el.textContent || el.getAttribute('title') || '').trim();\n    }};\n    const matchesName = (el) => wantedName === null\n        || accessibleName(el).toLowerCase().includes(wantedName.toLowerCase());\n    let candidates;\n    try {{\n        candidates = Array.from(document.querySelectorAll({pool})).filter(matchesName);\n    }} catch (err) {{\n        return {{ status: 'not-found' }};\n    }}",
                name = name_literal,
                pool = js_string_literal(&role_pool_selector(role)),
            )
        }
    }
}

/// Selector covering the explicit `[role=…]` form plus the native elements
/// that carry the role implicitly.
fn role_pool_selector(role: &str) -> String {
    let implicit = match role {
        "button" => "button, input[type=\"button\"], input[type=\"submit\"]",
        "link" => "a[href]",
        "checkbox" => "input[type=\"checkbox\"]",
        "radio" => "input[type=\"radio\"]",
        "combobox" => "select",
        "textbox" => {
            "input:not([type]), input[type=\"text\"], input[type=\"email\"], input[type=\"password\"], input[type=\"search\"], input[type=\"tel\"], textarea"
        }
        "option" => "option",
        "heading" => "h1, h2, h3, h4, h5, h6",
        _ => "",
    };
    if implicit.is_empty() {
        format!("[role=\"{role}\"]")
    } else {
        format!("[role=\"{role}\"], {implicit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_escapes_embedded_quotes() {
        let literal = js_string_literal(r#"input[type="email"]"#);
        assert_eq!(literal, r#""input[type=\"email\"]""#);
    }

    #[test]
    fn expressions_are_self_contained_iifes() {
        let locator = Locator::css("button[type=\"submit\"]");
        for expr in [
            probe_expression(&locator),
            focus_expression(&locator),
            select_option_expression(&locator, "Provider"),
        ] {
            assert!(expr.starts_with("(() => {"), "missing IIFE prelude: {expr}");
            assert!(expr.ends_with("})()"), "missing IIFE invocation: {expr}");
        }
    }

    #[test]
    fn css_probe_embeds_escaped_selector() {
        let expr = probe_expression(&Locator::css(r#"input[type="email"]"#));
        assert!(expr.contains(r#"querySelectorAll("input[type=\"email\"]")"#));
        assert!(expr.contains("status: 'not-found'"));
    }

    #[test]
    fn text_probe_carries_needle_and_exactness() {
        let substring = probe_expression(&Locator::text("Create"));
        assert!(substring.contains(r#"const needle = "Create";"#));
        assert!(substring.contains("false ? text === needle : text.includes(needle)"));

        let exact = probe_expression(&Locator::text_exact("Settings"));
        assert!(exact.contains("true ? text === needle : text.includes(needle)"));
    }

    #[test]
    fn text_probe_prefers_innermost_match() {
        let expr = probe_expression(&Locator::text("Scheduling"));
        assert!(expr.contains("el.contains(other)"));
    }

    #[test]
    fn role_pool_covers_implicit_elements() {
        let button = probe_expression(&Locator::role_named("button", "Save"));
        assert!(button.contains("input[type=\\\"submit\\\"]"));

        let link = probe_expression(&Locator::role("link"));
        assert!(link.contains("a[href]"));

        let custom = probe_expression(&Locator::role("tab"));
        assert!(custom.contains("[role=\\\"tab\\\"]"));
        assert!(!custom.contains("a[href]"));
    }

    #[test]
    fn role_name_filter_is_case_insensitive_containment() {
        let expr = probe_expression(&Locator::role_named("button", "View Availability"));
        assert!(expr.contains(r#"const wantedName = "View Availability";"#));
        assert!(expr.contains("toLowerCase().includes(wantedName.toLowerCase())"));
    }

    #[test]
    fn focus_expression_selects_existing_content() {
        let expr = focus_expression(&Locator::css("input[name=\"firstName\"]"));
        assert!(expr.contains("el.focus()"));
        assert!(expr.contains("el.select()"));
        assert!(expr.contains("status: 'focused'"));
    }

    #[test]
    fn select_expression_matches_label_before_value() {
        let expr = select_option_expression(&Locator::css("select[name=\"role\"]"), "Provider");
        let label_idx = expr
            .find("opt.text.trim() === wanted")
            .expect("label match present");
        let value_idx = expr.find("opt.value === wanted").expect("value match present");
        assert!(label_idx < value_idx);
        assert!(expr.contains("status: 'option-missing'"));
        assert!(expr.contains("new Event('change', { bubbles: true })"));
    }
}

//! Low-level `{{name}}` placeholder extraction, shared by system and user
//! template rendering.

/// Extracts every `{{name}}` placeholder reference from a template string,
/// in order of first appearance (duplicates included).
///
/// Tracks brace depth rather than using a naive regex scan so a `{{` that
/// immediately precedes a reference does not get misread as part of it.
pub(crate) fn extract_variable_refs(template: &str) -> Vec<String> {
    let mut vars = Vec::new();
    let mut chars = template.chars().peekable();
    let mut in_var = false;
    let mut current_var = String::new();
    let mut brace_count = 0;

    while let Some(ch) = chars.next() {
        if ch == '{' {
            if chars.peek() == Some(&'{') {
                chars.next(); // consume second brace
                in_var = true;
                brace_count = 2;
                current_var.clear();
            }
        } else if ch == '}' && in_var {
            if chars.peek() == Some(&'}') {
                chars.next(); // consume second brace
                brace_count -= 2;
                if brace_count == 0 {
                    in_var = false;
                    if !current_var.is_empty() {
                        vars.push(current_var.trim().to_owned());
                        current_var.clear();
                    }
                }
            }
        } else if in_var {
            current_var.push(ch);
        }
    }

    vars
}

/// Substitutes every `{{name}}` occurrence of a declared variable with its
/// value. Placeholders not present in `values` are left untouched by the
/// caller's choice of `values` contents (callers fill in `""` explicitly
/// for record fields that are absent).
pub(crate) fn substitute(template: &str, values: &std::collections::HashMap<String, String>) -> String {
    let mut result = template.to_owned();
    for name in extract_variable_refs(template) {
        if let Some(value) = values.get(&name) {
            let placeholder = format!("{{{{{name}}}}}");
            result = result.replace(&placeholder, value);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn extracts_variable_refs() {
        let template = "Hello {{name}}, you are {{age}} years old. {{greeting}}";
        let vars = extract_variable_refs(template);
        assert_eq!(vars.len(), 3);
        assert!(vars.contains(&"name".to_owned()));
        assert!(vars.contains(&"age".to_owned()));
        assert!(vars.contains(&"greeting".to_owned()));
    }

    #[test]
    fn handles_nested_braces() {
        let template = "Code: {{code}}";
        let vars = extract_variable_refs(template);
        assert_eq!(vars, vec!["code"]);
    }

    #[test]
    fn substitutes_known_values_and_leaves_rest() {
        let mut values = HashMap::new();
        values.insert("name".to_owned(), "World".to_owned());
        let rendered = substitute("Hello {{name}}! {{unset}}", &values);
        assert_eq!(rendered, "Hello World! {{unset}}");
    }
}

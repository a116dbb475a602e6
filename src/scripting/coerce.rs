//! Turning script tokens into typed tool arguments

use serde_json::{Map, Number, Value};

use crate::mcp::ToolDescriptor;

/// Convert a token to the JSON type its schema declares
///
/// Anything that does not parse as the declared type is passed through as a
/// string and left for the server to reject.
pub fn coerce(token: &str, declared: Option<&str>) -> Value {
    let raw = || Value::String(token.to_string());

    match declared {
        Some("integer") => token.parse::<i64>().map(Value::from).unwrap_or_else(|_| raw()),
        Some("number") => token
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(raw),
        Some("boolean") => match token.to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => raw(),
        },
        Some("object") | Some("array") => serde_json::from_str(token).unwrap_or_else(|_| raw()),
        _ => raw(),
    }
}

/// Bind script tokens to a tool's declared input properties
///
/// `key:value` tokens whose key is a declared property bind that property.
/// Every other token fills the next unbound property in lexicographic order.
/// Returns the arguments and any positional tokens left without a property.
pub fn build_arguments(tool: &ToolDescriptor, tokens: &[String]) -> (Map<String, Value>, Vec<String>) {
    let mut args = Map::new();
    let Some(properties) = tool.properties() else {
        return (args, tokens.to_vec());
    };

    let mut positional = Vec::new();
    for token in tokens {
        match token.split_once(':') {
            Some((key, value)) if properties.contains_key(key) => {
                args.insert(key.to_string(), coerce(value, tool.property_type(key)));
            }
            _ => positional.push(token),
        }
    }

    let mut names: Vec<&String> = properties.keys().collect();
    names.sort();
    let mut unbound = names.into_iter().filter(|name| !args.contains_key(name.as_str()));

    let mut surplus = Vec::new();
    let mut bound = Vec::new();
    for token in positional {
        match unbound.next() {
            Some(name) => bound.push((name.clone(), coerce(token, tool.property_type(name)))),
            None => surplus.push(token.clone()),
        }
    }
    args.extend(bound);

    (args, surplus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(schema: Value) -> ToolDescriptor {
        ToolDescriptor {
            name: "t".to_string(),
            input_schema: Some(schema),
            ..Default::default()
        }
    }

    #[test]
    fn test_coerce() {
        let cases = [
            ("123", Some("integer"), json!(123)),
            ("12.34", Some("number"), json!(12.34)),
            ("true", Some("boolean"), json!(true)),
            ("FALSE", Some("boolean"), json!(false)),
            ("1", Some("boolean"), json!(true)),
            ("0", Some("boolean"), json!(false)),
            ("yes", Some("boolean"), json!("yes")),
            ("some string", Some("string"), json!("some string")),
            ("123", Some("string"), json!("123")),
            ("123", None, json!("123")),
            ("not-a-number", Some("integer"), json!("not-a-number")),
            ("1.5", Some("integer"), json!("1.5")),
            ("NaN", Some("number"), json!("NaN")),
            ("{\"a\":1}", Some("object"), json!({"a": 1})),
            ("[1,2]", Some("array"), json!([1, 2])),
            ("[broken", Some("array"), json!("[broken")),
        ];

        for (token, declared, expected) in cases {
            assert_eq!(coerce(token, declared), expected, "{} as {:?}", token, declared);
        }
    }

    #[test]
    fn test_positional_binding_is_lexicographic() {
        let tool = tool(json!({
            "type": "object",
            "properties": {"b": {"type": "integer"}, "a": {"type": "integer"}}
        }));
        let tokens = vec!["2".to_string(), "3".to_string()];

        let (args, surplus) = build_arguments(&tool, &tokens);
        assert_eq!(Value::Object(args), json!({"a": 2, "b": 3}));
        assert!(surplus.is_empty());
    }

    #[test]
    fn test_named_binding_wins() {
        let tool = tool(json!({
            "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}, "c": {"type": "string"}}
        }));
        let tokens: Vec<String> = ["x", "b:7", "y"].iter().map(|s| s.to_string()).collect();

        let (args, _) = build_arguments(&tool, &tokens);
        assert_eq!(Value::Object(args), json!({"a": "x", "b": 7, "c": "y"}));
    }

    #[test]
    fn test_unknown_key_is_positional() {
        let tool = tool(json!({"properties": {"url": {"type": "string"}}}));
        let tokens = vec!["http://example.com".to_string()];

        let (args, _) = build_arguments(&tool, &tokens);
        assert_eq!(args["url"], json!("http://example.com"));
    }

    #[test]
    fn test_surplus_tokens_reported() {
        let tool = tool(json!({"properties": {"message": {"type": "string"}}}));
        let tokens = vec!["hi".to_string(), "extra".to_string()];

        let (args, surplus) = build_arguments(&tool, &tokens);
        assert_eq!(args.len(), 1);
        assert_eq!(surplus, vec!["extra".to_string()]);
    }

    #[test]
    fn test_no_schema_binds_nothing() {
        let tool = ToolDescriptor {
            name: "t".to_string(),
            ..Default::default()
        };
        let (args, surplus) = build_arguments(&tool, &["a".to_string()]);
        assert!(args.is_empty());
        assert_eq!(surplus.len(), 1);
    }
}

//! Markup helpers for a page head.

use super::arg;
use crate::error::FunctionError;
use crate::escape::escape_html;
use crate::value::Value;

/// A single string argument, or each item of a list argument.
fn each(value: &Value) -> Vec<String> {
    match value {
        Value::List(items) => items.iter().map(Value::to_string).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

fn attr(value: &str) -> String {
    escape_html(value).into_owned()
}

pub(super) fn charset(args: &[Value]) -> Result<Value, FunctionError> {
    let charset = match arg(args, 0) {
        Value::Null => "utf-8".to_string(),
        other => other.to_string(),
    };
    Ok(format!(r#"<meta charset="{}">"#, attr(&charset)).into())
}

pub(super) fn css(args: &[Value]) -> Result<Value, FunctionError> {
    let links: Vec<String> = each(arg(args, 0))
        .iter()
        .map(|path| format!(r#"<link href="{}" rel="stylesheet">"#, attr(path)))
        .collect();
    Ok(links.join("\n").into())
}

pub(super) fn favicon(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(format!(
        r#"<link href="{}" rel="shortcut icon">"#,
        attr(&arg(args, 0).to_string())
    )
    .into())
}

pub(super) fn http_equiv(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(format!(
        r#"<meta http-equiv="{}" content="{}">"#,
        attr(&arg(args, 0).to_string()),
        attr(&arg(args, 1).to_string())
    )
    .into())
}

pub(super) fn meta_description(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(format!(
        r#"<meta name="description" content="{}">"#,
        attr(&arg(args, 0).to_string())
    )
    .into())
}

pub(super) fn meta_keywords(args: &[Value]) -> Result<Value, FunctionError> {
    let keywords = each(arg(args, 0)).join(",");
    Ok(format!(r#"<meta name="keywords" content="{}">"#, attr(&keywords)).into())
}

pub(super) fn page_title(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(format!("<title>{}</title>", attr(&arg(args, 0).to_string())).into())
}

pub(super) fn script(args: &[Value]) -> Result<Value, FunctionError> {
    let kind = match arg(args, 1) {
        Value::Null => "text/javascript".to_string(),
        other => other.to_string(),
    };
    let tags: Vec<String> = each(arg(args, 0))
        .iter()
        .map(|path| {
            format!(
                r#"<script type="{}" src="{}"></script>"#,
                attr(&kind),
                attr(path)
            )
        })
        .collect();
    Ok(tags.join("\n").into())
}

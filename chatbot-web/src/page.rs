//! The single page of the app.

pub const TITLE: &str = "Chatbot Demo With OpenAI API";
pub const INPUT_LABEL: &str = "Search the topic u want";

/// Escape text for use in HTML element content and double-quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the form, pre-filled with `question`, and the answer when there is one.
pub fn render(question: &str, answer: Option<&str>) -> String {
    let answer = answer
        .map(|answer| format!("<div class=\"answer\">{}</div>\n", escape_html(answer)))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 46rem; margin: 3rem auto; padding: 0 1rem; }}
input {{ width: 100%; padding: 0.5rem; font-size: 1rem; box-sizing: border-box; }}
.answer {{ margin-top: 1.5rem; white-space: pre-wrap; line-height: 1.5; }}
</style>
</head>
<body>
<h1>{title}</h1>
<form method="get" action="/">
<label for="question">{label}</label>
<input id="question" name="question" type="text" value="{question}" autofocus>
</form>
{answer}</body>
</html>
"#,
        title = TITLE,
        label = INPUT_LABEL,
        question = escape_html(question),
        answer = answer,
    )
}

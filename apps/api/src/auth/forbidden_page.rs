use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

/// Renders the access-denied page returned for every refused login.
pub(super) fn forbidden_response(username: Option<&str>) -> Response {
    (StatusCode::FORBIDDEN, Html(render(username))).into_response()
}

fn render(username: Option<&str>) -> String {
    let greeting = match username.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!(
            "<p>Sorry {}, you do not have access to this application.</p>",
            escape_html(name)
        ),
        None => "<p>You do not have access to this application.</p>".to_owned(),
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>403 Forbidden</title>\n</head>\n<body>\n<h1>Access denied</h1>\n{greeting}\n<p>Ask your administrator to assign you an operator or sysadmin role, then <a href=\"/login/\">sign in again</a>.</p>\n</body>\n</html>\n"
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(character),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::{forbidden_response, render};

    #[test]
    fn username_is_escaped() {
        let page = render(Some("<script>alert('x')</script>"));

        assert!(page.contains("Sorry &lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn blank_username_uses_generic_greeting() {
        assert!(render(Some("  ")).contains("<p>You do not have access"));
        assert!(render(None).contains("<p>You do not have access"));
    }

    #[test]
    fn response_is_forbidden() {
        assert_eq!(forbidden_response(None).status(), StatusCode::FORBIDDEN);
    }
}

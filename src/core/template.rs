use handlebars::Handlebars;
use serde::Serialize;

const TEMPLATES: [(&str, &str); 7] = [
    ("layout", include_str!("../../templates/layout.hbs")),
    ("field_errors", include_str!("../../templates/field_errors.hbs")),
    ("register", include_str!("../../templates/register.hbs")),
    ("login", include_str!("../../templates/login.hbs")),
    ("users", include_str!("../../templates/users.hbs")),
    ("user", include_str!("../../templates/user.hbs")),
    ("feedback_form", include_str!("../../templates/feedback_form.hbs")),
];

/// Registry with every page template and partial compiled in.
pub fn init_templates() -> anyhow::Result<Handlebars<'static>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(false);
    for (name, source) in TEMPLATES {
        registry.register_template_string(name, source)?;
    }
    Ok(registry)
}

pub fn render<T: Serialize>(
    registry: &Handlebars<'static>,
    name: &str,
    data: &T,
) -> anyhow::Result<String> {
    Ok(registry.render(name, data)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_login_with_errors_and_flashes() {
        let registry = init_templates().unwrap();
        let html = render(
            &registry,
            "login",
            &json!({
                "current_user": null,
                "flashes": [{"category": "danger", "message": "You're going to need to login first!"}],
                "form": {"username": "alice"},
                "errors": {"username": ["Incorrect Username or Password."]},
            }),
        )
        .unwrap();
        assert!(html.contains("<title>Login | Feedback</title>"));
        assert!(html.contains("alert-danger"));
        assert!(html.contains("going to need to login first!"));
        assert!(html.contains("value=\"alice\""));
        assert!(html.contains("Incorrect Username or Password."));
        assert!(html.contains("href=\"/register\""));
    }

    #[test]
    fn test_render_escapes_user_content() {
        let registry = init_templates().unwrap();
        let html = render(
            &registry,
            "user",
            &json!({
                "current_user": "alice",
                "flashes": [],
                "is_owner": true,
                "user": {
                    "username": "alice",
                    "email": "alice@local.com",
                    "first_name": "Alice",
                    "last_name": "Liddell",
                    "feedback": [{"id": 7, "title": "<script>x</script>", "content": "hi"}]
                },
            }),
        )
        .unwrap();
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("/feedback/7/update"));
        assert!(html.contains("Delete account"));
    }

    #[test]
    fn test_render_profile_of_other_user() {
        let registry = init_templates().unwrap();
        let html = render(
            &registry,
            "user",
            &json!({
                "current_user": "bob",
                "flashes": [],
                "is_owner": false,
                "user": {
                    "username": "alice",
                    "email": "alice@local.com",
                    "first_name": "Alice",
                    "last_name": "Liddell",
                    "feedback": [{"id": 7, "title": "Great app", "content": "hi"}]
                },
            }),
        )
        .unwrap();
        assert!(html.contains("Great app"));
        assert!(!html.contains("/feedback/7/update"));
        assert!(!html.contains("Delete account"));
    }
}

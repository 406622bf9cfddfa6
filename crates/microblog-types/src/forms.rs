use serde::Deserialize;

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors collected from one form submission, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Messages for a single field, for rendering next to its input.
    pub fn for_field(&self, field: &str) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl RegisterForm {
    /// Trims both fields and checks them. Username uniqueness is left to the
    /// store's UNIQUE constraint.
    pub fn validate(&mut self) -> Result<(), FormErrors> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();

        let mut errors = FormErrors::default();
        let len = self.username.chars().count();
        if len == 0 {
            errors.push("username", "This field is required.");
        } else if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
            errors.push(
                "username",
                format!("Field must be between {USERNAME_MIN} and {USERNAME_MAX} characters long."),
            );
        }

        if self.email.is_empty() {
            errors.push("email", "This field is required.");
        } else if !is_valid_email(&self.email) {
            errors.push("email", "Invalid email address.");
        }

        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Username of the author. Empty means "the first registered user".
    #[serde(default)]
    pub author: String,
}

impl PostForm {
    pub fn validate(&mut self) -> Result<(), FormErrors> {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        self.author = self.author.trim().to_string();

        let mut errors = FormErrors::default();
        if self.title.is_empty() {
            errors.push("title", "This field is required.");
        }
        if self.content.is_empty() {
            errors.push("content", "This field is required.");
        }
        errors.into_result()
    }

    pub fn author(&self) -> Option<&str> {
        if self.author.is_empty() { None } else { Some(&self.author) }
    }
}

/// Structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_form_trims_and_accepts() {
        let mut form = RegisterForm {
            username: "  alice ".into(),
            email: "alice@example.com".into(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.username, "alice");
    }

    #[test]
    fn register_form_rejects_short_username_and_bad_email() {
        let mut form = RegisterForm {
            username: "a".into(),
            email: "not-an-email".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.for_field("username").count(), 1);
        assert_eq!(errors.for_field("email").collect::<Vec<_>>(), vec!["Invalid email address."]);
    }

    #[test]
    fn register_form_rejects_long_username() {
        let mut form = RegisterForm {
            username: "x".repeat(USERNAME_MAX + 1),
            email: "x@example.com".into(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn post_form_requires_title_and_content() {
        let mut form = PostForm {
            title: "   ".into(),
            content: String::new(),
            author: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.0.len(), 2);
        assert_eq!(form.author(), None);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a.b@mail.example.org"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b..com"));
    }
}

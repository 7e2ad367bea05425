use crate::models::Role;
use std::{fmt, sync::Arc};

/// Credential
///
/// One login entry. The constructors are the only way to build one, which keeps the
/// "student id present iff role = Student" rule true for every entry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    email: String,
    password: String,
    role: Role,
    student_id: Option<i32>,
}

impl Credential {
    pub fn admin(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role: Role::Admin,
            student_id: None,
        }
    }

    pub fn student(email: impl Into<String>, password: impl Into<String>, student_id: i32) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role: Role::Student,
            student_id: Some(student_id),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn student_id(&self) -> Option<i32> {
        self.student_id
    }

    /// Case-insensitive email, exact password.
    fn matches(&self, email: &str, password: &str) -> bool {
        self.email.eq_ignore_ascii_case(email) && self.password == password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("student_id", &self.student_id)
            .finish()
    }
}

/// CredentialTable
///
/// The fixed, read-only login table injected into the application state at startup. Cloning
/// shares the same allocation.
#[derive(Clone, Debug)]
pub struct CredentialTable {
    entries: Arc<[Credential]>,
}

impl CredentialTable {
    pub fn new(entries: Vec<Credential>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// Returns the entry matching both the email (ignoring ASCII case) and the password.
    pub fn find(&self, email: &str, password: &str) -> Option<&Credential> {
        self.entries
            .iter()
            .find(|credential| credential.matches(email, password))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CredentialTable {
    /// The built-in accounts: one administrator and two students bound to student rows 1
    /// and 2 of the seeded data.
    fn default() -> Self {
        Self::new(vec![
            Credential::admin("admin@dkit.ie", "Admin123!"),
            Credential::student("student00128@dkit.ie", "Student123!", 1),
            Credential::student("student12345@dkit.ie", "Student123!", 2),
        ])
    }
}

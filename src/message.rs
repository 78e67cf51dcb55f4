/// Who authored a transcript entry. `App` entries are notices rendered in
/// the transcript but never sent to the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    App,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn app(content: impl Into<String>) -> Self {
        Self::new(Role::App, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

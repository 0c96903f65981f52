use crate::model::User;

/// Identity provider failure: a cancelled or rejected sign-in. Retryable at
/// the UI boundary, never retried automatically.
#[derive(Debug, Clone)]
pub struct AuthError {
    pub message: String,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthError {}

type AuthHandler = Box<dyn FnMut(Option<&User>)>;

/// Mock identity provider standing in for a hosted auth SDK.
///
/// Owned by the application state and handed to consumers explicitly; there
/// is no process-wide current user. Subscribers are called once at
/// subscription time with the current state, then on every sign-in and
/// sign-out.
pub struct AuthService {
    current: Option<User>,
    subscribers: Vec<(u64, AuthHandler)>,
    next_token: u64,
}

impl AuthService {
    pub fn new() -> Self {
        Self {
            current: None,
            subscribers: Vec::new(),
            next_token: 0,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn sign_in(&mut self) -> Result<User, AuthError> {
        let user = User {
            uid: "12345-mock-google-uid".to_string(),
            display_name: Some("Thu Duyen".to_string()),
            email: Some("thuduyen98@example.com".to_string()),
            photo_url: Some("https://picsum.photos/seed/user/100/100".to_string()),
        };
        self.current = Some(user.clone());
        self.notify();
        Ok(user)
    }

    pub fn sign_out(&mut self) {
        self.current = None;
        self.notify();
    }

    /// Registers a state-change handler and fires it immediately with the
    /// current state. Returns a token for `unsubscribe`.
    #[allow(dead_code)]
    pub fn on_auth_change(&mut self, mut handler: AuthHandler) -> u64 {
        handler(self.current.as_ref());
        let token = self.next_token;
        self.next_token += 1;
        self.subscribers.push((token, handler));
        token
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&mut self, token: u64) {
        self.subscribers.retain(|(t, _)| *t != token);
    }

    fn notify(&mut self) {
        let current = self.current.clone();
        for (_, handler) in &mut self.subscribers {
            handler(current.as_ref());
        }
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}

use super::role::Role;

const MASK_FCGI_KEEP_CONN: u8 = 0x01;

/// The body of a FastCGI `FCGI_BEGIN_REQUEST` record
///
/// The client sends one to start every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeginRequest {
    role: Role,
    flags: u8,
}

impl BeginRequest {
    pub fn new(role: Role, keep_alive: bool) -> Self {
        let flags = if keep_alive { MASK_FCGI_KEEP_CONN } else { 0 };
        Self { role, flags }
    }

    /// Asks for a responder and tells the application to leave the connection open afterwards
    pub fn responder() -> Self {
        Self::new(Role::Responder, true)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn keep_alive(&self) -> bool {
        self.flags & MASK_FCGI_KEEP_CONN == MASK_FCGI_KEEP_CONN
    }

    pub fn to_record_bytes(&self) -> [u8; 8] {
        let [role_1, role_0] = self.role.to_record_bytes();
        [role_1, role_0, self.flags, 0, 0, 0, 0, 0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responder_body() {
        let begin = BeginRequest::responder();
        assert!(begin.keep_alive());
        assert_eq!(begin.to_record_bytes(), [0x00, 0x01, 0x01, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn without_keep_alive() {
        let begin = BeginRequest::new(Role::Filter, false);
        assert!(!begin.keep_alive());
        assert_eq!(begin.to_record_bytes(), [0x00, 0x03, 0x00, 0, 0, 0, 0, 0]);
    }
}

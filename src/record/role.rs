/// The role a FastCGI application plays for a request
///
/// Requests sent by this crate always ask for [`Role::Responder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Responder,
    Authorizer,
    Filter,
}

impl Role {
    pub fn id(&self) -> u16 {
        match self {
            Self::Responder => 1,
            Self::Authorizer => 2,
            Self::Filter => 3,
        }
    }

    pub fn to_record_bytes(&self) -> [u8; 2] {
        self.id().to_be_bytes()
    }
}

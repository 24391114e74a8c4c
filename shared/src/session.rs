use serde::{Serialize, Deserialize};

use crate::poll_state::PollState;

/// A signed-in viewer, as issued by the external auth layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Explicit per-viewer context: who is looking, and the poll aggregate
/// they are looking at. Threaded through the reconciler and resolver
/// instead of ambient globals.
#[derive(Debug, Default)]
pub struct ViewerSession {
    pub identity: Option<Identity>,
    pub poll: PollState,
}

impl ViewerSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            poll: PollState::default(),
        }
    }
}

// Backend-specific Rocket implementation
#[cfg(feature = "backend")]
mod backend_impl {
    use super::Identity;
    use rocket::http::Status;
    use rocket::request::{FromRequest, Outcome};
    use rocket::Request;

    #[rocket::async_trait]
    impl<'r> FromRequest<'r> for Identity {
        type Error = ();

        async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
            let headers = req.headers();
            let (Some(uid), Some(email)) =
                (headers.get_one("X-User-Id"), headers.get_one("X-User-Email"))
            else {
                return Outcome::Error((Status::Unauthorized, ()));
            };

            Outcome::Success(Identity {
                uid: uid.to_string(),
                email: email.to_string(),
                display_name: headers.get_one("X-User-Name").map(str::to_string),
            })
        }
    }
}

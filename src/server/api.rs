//! Wire request and response types
//!
//! The wire contract matches the original web clients: form-encoded or JSON
//! request fields, and a JSON body of `{errNo, errMsg, data?: {type, sdp}}`
//! where `errNo == 0` signals success. Errors travel in-band with HTTP 200.

use serde::{Deserialize, Serialize};

use crate::error::SignalingError;
use crate::negotiate::SdpPayload;
use crate::registry::{Role, SessionKey};

/// Coerce a 0/1 media intent field into a boolean
///
/// The clients send "0"/"1" strings in form bodies; JSON callers may send
/// booleans or numbers. An absent field means the kind is not wanted.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct FlagVisitor;

    impl<'de> serde::de::Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a 0/1 flag as bool, number, or string")
        }

        fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<bool, E> {
            Ok(!matches!(v, "" | "0" | "false"))
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// Fields of a push or pull create request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateParams {
    #[serde(default)]
    pub uid: String,

    #[serde(default, rename = "streamName")]
    pub stream_name: String,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub audio: bool,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub video: bool,

    /// Present and non-empty means the client originates the offer
    #[serde(default)]
    pub sdp: String,
}

impl CreateParams {
    /// Validate the identity fields and build the session key
    pub fn key(&self, role: Role) -> Result<SessionKey, SignalingError> {
        validate_identity(&self.uid, &self.stream_name)?;
        Ok(SessionKey::new(&self.uid, &self.stream_name, role))
    }

    /// The client's SDP offer, if the request carries one
    pub fn client_offer(&self) -> Option<String> {
        if self.sdp.is_empty() {
            None
        } else {
            Some(self.sdp.clone())
        }
    }
}

/// Fields of a sendanswer request
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerParams {
    #[serde(default)]
    pub uid: String,

    #[serde(default, rename = "streamName")]
    pub stream_name: String,

    #[serde(default)]
    pub answer: String,

    /// "push" or "pull": which of the caller's sessions the answer targets
    #[serde(default, rename = "type")]
    pub session_type: String,
}

impl AnswerParams {
    /// Validate all fields and build the session key
    pub fn key(&self) -> Result<SessionKey, SignalingError> {
        validate_identity(&self.uid, &self.stream_name)?;

        if self.answer.is_empty() {
            return Err(SignalingError::Validation("answer is null".into()));
        }

        let role = Role::parse(&self.session_type).ok_or_else(|| {
            SignalingError::Validation(format!(
                "type must be \"push\" or \"pull\", got \"{}\"",
                self.session_type
            ))
        })?;

        Ok(SessionKey::new(&self.uid, &self.stream_name, role))
    }
}

/// Fields of a stoppush or stoppull request
#[derive(Debug, Clone, Deserialize)]
pub struct StopParams {
    #[serde(default)]
    pub uid: String,

    #[serde(default, rename = "streamName")]
    pub stream_name: String,
}

impl StopParams {
    /// Validate the identity fields and build the session key
    pub fn key(&self, role: Role) -> Result<SessionKey, SignalingError> {
        validate_identity(&self.uid, &self.stream_name)?;
        Ok(SessionKey::new(&self.uid, &self.stream_name, role))
    }
}

fn validate_identity(uid: &str, stream_name: &str) -> Result<(), SignalingError> {
    if uid.is_empty() {
        return Err(SignalingError::Validation("uid is null".into()));
    }
    if stream_name.is_empty() {
        return Err(SignalingError::Validation("streamName is null".into()));
    }
    Ok(())
}

/// SDP blob in a success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdpData {
    /// "offer" or "answer"
    #[serde(rename = "type")]
    pub kind: String,
    pub sdp: String,
}

/// Response body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(rename = "errNo")]
    pub err_no: i32,

    #[serde(rename = "errMsg")]
    pub err_msg: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SdpData>,
}

impl ApiResponse {
    /// Success with no payload
    pub fn ok() -> Self {
        Self {
            err_no: 0,
            err_msg: "success".into(),
            data: None,
        }
    }

    /// Success carrying an SDP blob
    pub fn with_sdp(payload: &SdpPayload) -> Self {
        Self {
            err_no: 0,
            err_msg: "success".into(),
            data: Some(SdpData {
                kind: payload.kind.as_str().into(),
                sdp: payload.sdp.clone(),
            }),
        }
    }

    /// Failure with the error's stable code and message
    pub fn from_error(err: &SignalingError) -> Self {
        Self {
            err_no: err.err_no(),
            err_msg: err.to_string(),
            data: None,
        }
    }
}

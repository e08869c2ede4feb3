use csr_model::{PromptScope, UserResponse};
use csr_wire::{Decoder, Encoder, WireError};

/// Which family of detection a prompt concerns, selecting the dialog
/// layout the UI helper renders (`CS_*` vs `WP_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptDomain {
    Content,
    Url,
}

fn encode_domain(enc: &mut Encoder, domain: PromptDomain) {
    enc.i32(match domain {
        PromptDomain::Content => 0,
        PromptDomain::Url => 1,
    });
}

fn decode_domain(dec: &mut Decoder<'_>) -> Result<PromptDomain, WireError> {
    match dec.i32()? {
        0 => Ok(PromptDomain::Content),
        1 => Ok(PromptDomain::Url),
        other => Err(WireError::protocol(format!("invalid prompt domain discriminant {other}"))),
    }
}

fn encode_scope(enc: &mut Encoder, scope: PromptScope) {
    enc.i32(match scope {
        PromptScope::Ask => 0,
        PromptScope::Notify => 1,
    });
}

fn decode_scope(dec: &mut Decoder<'_>) -> Result<PromptScope, WireError> {
    match dec.i32()? {
        0 => Ok(PromptScope::Ask),
        1 => Ok(PromptScope::Notify),
        other => Err(WireError::protocol(format!("invalid prompt scope discriminant {other}"))),
    }
}

/// One outstanding prompt, addressed to the UI helper over its own socket.
///
/// `subject` is the `target_name` for a content prompt or the URL for a web
/// prompt; `message` is the caller-supplied `popup_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub domain: PromptDomain,
    pub scope: PromptScope,
    pub subject: String,
    pub message: String,
}

impl PromptRequest {
    pub fn new(domain: PromptDomain, scope: PromptScope, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            domain,
            scope,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        encode_domain(&mut enc, self.domain);
        encode_scope(&mut enc, self.scope);
        enc.string(&self.subject);
        enc.string(&self.message);
        enc.into_payload()
    }
}

pub(crate) fn decode_request(dec: &mut Decoder<'_>) -> Result<PromptRequest, WireError> {
    Ok(PromptRequest {
        domain: decode_domain(dec)?,
        scope: decode_scope(dec)?,
        subject: dec.string()?,
        message: dec.string()?,
    })
}

pub(crate) fn encode_response(enc: &mut Encoder, response: UserResponse) {
    enc.i32(match response {
        UserResponse::NotAsked => 0,
        UserResponse::Remove => 1,
        UserResponse::ProcessingAllowed => 2,
        UserResponse::ProcessingDisallowed => 3,
    });
}

pub(crate) fn decode_response(dec: &mut Decoder<'_>) -> Result<UserResponse, WireError> {
    match dec.i32()? {
        0 => Ok(UserResponse::NotAsked),
        1 => Ok(UserResponse::Remove),
        2 => Ok(UserResponse::ProcessingAllowed),
        3 => Ok(UserResponse::ProcessingDisallowed),
        other => Err(WireError::protocol(format!("invalid user response discriminant {other}"))),
    }
}

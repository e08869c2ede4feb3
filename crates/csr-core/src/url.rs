//! URL-risk logic. Stateless: no history row is ever written for a URL
//! verdict.

use csr_engine::{ScopedContext, WebEngineHandle};
use csr_model::{EngineId, Risk, UrlContext, UrlVerdict, UserResponse};
use csr_prompt::{PromptClient, PromptDomain, PromptRequest};
use csr_store::Store;

use crate::engine_state::ensure_enabled;
use crate::error::Result;

/// `check_url` (C11), bound to one loaded web engine.
pub struct UrlScreening<'a, E: WebEngineHandle + ?Sized> {
    store: &'a Store,
    engine: &'a E,
    prompt: &'a PromptClient,
}

impl<'a, E: WebEngineHandle + ?Sized> UrlScreening<'a, E> {
    pub fn new(store: &'a Store, engine: &'a E, prompt: &'a PromptClient) -> Self {
        Self { store, engine, prompt }
    }

    /// Unverified/low pass straight through; medium prompts allow/deny;
    /// high notifies with confirm mapped to deny.
    pub fn check_url(&self, ctx: &UrlContext, url: &str) -> Result<UrlVerdict> {
        ensure_enabled(self.store, EngineId::Web)?;

        let scoped = ScopedContext::acquire(self.engine)?;
        let mut verdict = match self.engine.check_url(scoped.handle(), url)? {
            Some(v) => v,
            None => UrlVerdict::new(Risk::Unverified, ""),
        };

        if UrlVerdict::is_passthrough(verdict.risk) {
            verdict.user_response = UserResponse::NotAsked;
            return Ok(verdict);
        }

        if !ctx.ask_user {
            verdict.user_response = UserResponse::NotAsked;
            return Ok(verdict);
        }

        let scope = match verdict.risk {
            Risk::Medium => csr_model::PromptScope::Ask,
            Risk::High => csr_model::PromptScope::Notify,
            Risk::Unverified | Risk::Low => unreachable!("passthrough risks return above"),
        };
        let req = PromptRequest::new(PromptDomain::Url, scope, url, ctx.popup_message.clone());
        verdict.user_response = self.prompt.request_blocking(&req)?;
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csr_engine::mock::MockEngine;

    fn setup() -> (Store, MockEngine, PromptClient) {
        (Store::in_memory().unwrap(), MockEngine::web(), PromptClient::new("/nonexistent/prompt.sock"))
    }

    #[test]
    fn unverified_url_passes_through_without_asking() {
        let (store, engine, prompt) = setup();
        let screening = UrlScreening::new(&store, &engine, &prompt);
        let ctx = UrlContext::new(true, "");

        let verdict = screening.check_url(&ctx, "http://unknown.example").unwrap();
        assert_eq!(verdict.risk, Risk::Unverified);
        assert_eq!(verdict.user_response, UserResponse::NotAsked);
    }

    #[test]
    fn low_risk_passes_through() {
        let (store, engine, prompt) = setup();
        engine.script_url("http://low.example", UrlVerdict::new(Risk::Low, "http://low.example/detail"));
        let screening = UrlScreening::new(&store, &engine, &prompt);
        let ctx = UrlContext::new(true, "");

        let verdict = screening.check_url(&ctx, "http://low.example").unwrap();
        assert_eq!(verdict.user_response, UserResponse::NotAsked);
    }

    #[test]
    fn medium_risk_without_ask_user_is_not_asked() {
        let (store, engine, prompt) = setup();
        engine.script_url("http://risky.example", UrlVerdict::new(Risk::Medium, "http://risky.example/detail"));
        let screening = UrlScreening::new(&store, &engine, &prompt);
        let ctx = UrlContext::new(false, "");

        let verdict = screening.check_url(&ctx, "http://risky.example").unwrap();
        assert_eq!(verdict.risk, Risk::Medium);
        assert_eq!(verdict.user_response, UserResponse::NotAsked);
    }

    #[test]
    fn disabled_web_engine_is_rejected_before_invoking_it() {
        let (store, engine, prompt) = setup();
        crate::engine_state::set_state(&store, EngineId::Web, false).unwrap();
        let screening = UrlScreening::new(&store, &engine, &prompt);
        let ctx = UrlContext::new(false, "");

        let err = screening.check_url(&ctx, "http://example.com").unwrap_err();
        assert!(matches!(err, crate::error::CsrError::EngineDisabled));
    }
}

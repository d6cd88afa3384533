// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Storage permission gate.
//!
//! Every dispatched operation first asks a [`PermissionService`] for the
//! storage capability and waits for the answer. The wait has no timeout and
//! a denial is final for that call: there is no automatic re-prompt, the
//! host has to send the request again.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// The capability guarding all disk access.
pub const STORAGE_CAPABILITY: &str = "storage";

/// Answer to a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAnswer {
    AllowForever,
    DenyOnce,
    DenyForever,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("permission prompt unavailable: {0}")]
    Transport(String),
}

/// Source of permission answers, typically backed by an OS prompt.
pub trait PermissionService: Send + Sync {
    fn request(
        &self,
        capability: &'static str,
    ) -> impl Future<Output = Result<PermissionAnswer, PermissionError>> + Send;
}

/// Outcome of one gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Granted,
    Denied { forever: bool, message: String },
}

impl Resolution {
    pub fn is_granted(&self) -> bool {
        matches!(self, Resolution::Granted)
    }
}

pub struct PermissionGate<P> {
    service: P,
    capability: &'static str,
}

impl<P: PermissionService> PermissionGate<P> {
    pub fn new(service: P) -> Self {
        Self {
            service,
            capability: STORAGE_CAPABILITY,
        }
    }

    /// Request the capability and wait for the answer.
    ///
    /// Transport failures resolve as denied with the underlying error text.
    pub async fn check(&self) -> Resolution {
        let capability = self.capability;
        match self.service.request(capability).await {
            Ok(PermissionAnswer::AllowForever) => {
                debug!("{capability} permission granted");
                Resolution::Granted
            }
            Ok(PermissionAnswer::DenyOnce) => Resolution::Denied {
                forever: false,
                message: format!("{capability} permission denied"),
            },
            Ok(PermissionAnswer::DenyForever) => Resolution::Denied {
                forever: true,
                message: format!("{capability} permission permanently denied"),
            },
            Err(e) => Resolution::Denied {
                forever: false,
                message: format!("{capability} permission request failed: {e}"),
            },
        }
    }
}

/// Answers every request the same way.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions(pub PermissionAnswer);

impl StaticPermissions {
    pub fn granted() -> Self {
        Self(PermissionAnswer::AllowForever)
    }
}

impl PermissionService for StaticPermissions {
    async fn request(&self, _capability: &'static str) -> Result<PermissionAnswer, PermissionError> {
        Ok(self.0)
    }
}

/// A pending prompt handed to whoever answers permission requests.
#[derive(Debug)]
pub struct PermissionPrompt {
    pub capability: &'static str,
    reply: oneshot::Sender<PermissionAnswer>,
}

impl PermissionPrompt {
    /// Deliver the answer. Returns `false` if the requester went away.
    pub fn answer(self, answer: PermissionAnswer) -> bool {
        self.reply.send(answer).is_ok()
    }
}

/// Forwards each request as a [`PermissionPrompt`] and waits for its answer.
#[derive(Debug, Clone)]
pub struct PromptPermissions {
    prompts: mpsc::Sender<PermissionPrompt>,
}

impl PromptPermissions {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<PermissionPrompt>) {
        let (prompts, rx) = mpsc::channel(buffer);
        (Self { prompts }, rx)
    }
}

impl PermissionService for PromptPermissions {
    async fn request(&self, capability: &'static str) -> Result<PermissionAnswer, PermissionError> {
        let (reply, answer) = oneshot::channel();
        self.prompts
            .send(PermissionPrompt { capability, reply })
            .await
            .map_err(|_| PermissionError::Transport("no prompt handler".to_string()))?;
        answer
            .await
            .map_err(|_| PermissionError::Transport("prompt dismissed without answer".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PermissionAnswer::AllowForever, true, false)]
    #[case(PermissionAnswer::DenyOnce, false, false)]
    #[case(PermissionAnswer::DenyForever, false, true)]
    #[tokio::test]
    async fn test_static_answers(
        #[case] answer: PermissionAnswer,
        #[case] granted: bool,
        #[case] forever: bool,
    ) {
        let gate = PermissionGate::new(StaticPermissions(answer));
        let resolution = gate.check().await;
        assert_eq!(resolution.is_granted(), granted);
        if let Resolution::Denied { forever: f, .. } = resolution {
            assert_eq!(f, forever);
        }
    }

    #[tokio::test]
    async fn test_prompt_answer_arrives_later() {
        let (service, mut prompts) = PromptPermissions::channel(1);
        let gate = PermissionGate::new(service);

        let answerer = tokio::spawn(async move {
            let prompt = prompts.recv().await.unwrap();
            assert_eq!(prompt.capability, STORAGE_CAPABILITY);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            assert!(prompt.answer(PermissionAnswer::AllowForever));
        });

        assert_eq!(gate.check().await, Resolution::Granted);
        answerer.await.unwrap();
    }

    #[tokio::test]
    async fn test_dismissed_prompt_is_denied() {
        let (service, mut prompts) = PromptPermissions::channel(1);
        let gate = PermissionGate::new(service);

        let answerer = tokio::spawn(async move {
            drop(prompts.recv().await.unwrap());
        });

        match gate.check().await {
            Resolution::Denied { forever, message } => {
                assert!(!forever);
                assert!(message.contains("dismissed"), "got {message}");
            }
            Resolution::Granted => panic!("dismissed prompt must not grant"),
        }
        answerer.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_prompt_handler_is_denied() {
        let (service, prompts) = PromptPermissions::channel(1);
        drop(prompts);
        let gate = PermissionGate::new(service);
        assert!(!gate.check().await.is_granted());
    }
}

//! Fallback sequencing across candidate models

use std::future::Future;

use log::{debug, info, warn};

use crate::error::Error;
use crate::providers::ProviderReply;

/// Result of trying one candidate
#[derive(Debug)]
pub enum AttemptOutcome
{   Success(ProviderReply)
  , Failure(Error)
}

impl From<Result<ProviderReply, Error>> for AttemptOutcome
{   fn from(result: Result<ProviderReply, Error>) -> Self
    {   match result.and_then(ProviderReply::into_result)
        {   Ok(reply) => AttemptOutcome::Success(reply)
          , Err(e) => AttemptOutcome::Failure(e)
        }
    }
}

/// Ordered candidate models for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverSequence
{   models: Vec<String>
}

impl FailoverSequence
{   /// Create a new failover sequence. Blank and repeated names are
    /// dropped, first occurrence wins.
    pub fn new<I, S>(models: I) -> Self
    where I: IntoIterator<Item = S>
        , S: Into<String>
    {   let mut sequence = FailoverSequence { models: Vec::new() };
        for model in models
        {   sequence.push(model.into());
        }
        debug!(
          "Creating failover sequence with {} models",
          sequence.models.len()
        );
        sequence
    }

    /// Put `model` in front of the configured candidates
    pub fn with_preferred(self, model: impl Into<String>) -> Self
    {   let mut sequence = FailoverSequence { models: Vec::new() };
        sequence.push(model.into());
        for model in self.models
        {   sequence.push(model);
        }
        sequence
    }

    pub fn models(&self) -> &[String]
    {   &self.models
    }

    fn push(&mut self, model: String)
    {   let model = model.trim();
        if !model.is_empty() && !self.models.iter().any(|m| m == model)
        {   self.models.push(model.to_string());
        }
    }

    /// Invoke each candidate in order and return the first success.
    ///
    /// A lone candidate's failure is returned as is. With more than
    /// one candidate, exhausting the list yields [`Error::Exhausted`]
    /// carrying the last failure and every attempt.
    pub async fn run<F, Fut>(
      &self
    , mut invoke: F
    ) -> Result<ProviderReply, Error>
    where F: FnMut(String) -> Fut
        , Fut: Future<Output = Result<ProviderReply, Error>>
    {   let mut attempts = Vec::new();
        let mut last = None;

        for (index, model) in self.models.iter().enumerate()
        {   debug!(
              "Trying candidate {}/{}: {}",
              index + 1, self.models.len(), model
            );
            match AttemptOutcome::from(invoke(model.clone()).await)
            {   AttemptOutcome::Success(reply) => {
                  if index > 0
                  {   info!(
                        "Model {} answered after {} failed attempt(s)",
                        model, index
                      );
                  }
                  return Ok(reply);
                }
              , AttemptOutcome::Failure(e) => {
                  warn!("Model {} failed: {}", model, e);
                  attempts.push(e.attempt(model));
                  last = Some(e);
                }
            }
        }

        match last
        {   None => Err(Error::InvalidConfiguration(
              "no candidate models configured".to_string()
            ))
          , Some(e) if attempts.len() == 1 => Err(e)
          , Some(e) => Err(Error::Exhausted
            {   last: Box::new(e)
              , attempts
            })
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn ok(model: &str) -> Result<ProviderReply, Error>
    {   Ok(ProviderReply
        {   model: model.to_string()
          , status: 200
          , body: json!({"model": model})
        })
    }

    fn failed(model: &str, status: u16) -> Result<ProviderReply, Error>
    {   Ok(ProviderReply
        {   model: model.to_string()
          , status
          , body: json!({"error": {"code": status, "message": model}})
        })
    }

    #[test]
    fn dedups_and_prefers()
    {   let sequence = FailoverSequence::new(["a", " b ", "", "a", "c"])
          .with_preferred("c");
        assert_eq!(sequence.models(), &["c", "a", "b"]);
    }

    #[tokio::test]
    async fn first_success_stops_the_scan()
    {   let calls = RefCell::new(Vec::new());
        let sequence = FailoverSequence::new(["a", "b", "c"]);
        let reply = sequence.run(|model| {
          calls.borrow_mut().push(model.clone());
          let result = if model == "a" { failed(&model, 404) } else { ok(&model) };
          async move { result }
        }).await.unwrap();

        assert_eq!(reply.model, "b");
        assert_eq!(*calls.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn transport_errors_fall_through()
    {   let sequence = FailoverSequence::new(["a", "b"]);
        let reply = sequence.run(|model| {
          let result = if model == "a"
          {   Err(Error::HttpError("connection refused".into()))
          } else
          {   ok(&model)
          };
          async move { result }
        }).await.unwrap();
        assert_eq!(reply.model, "b");
    }

    #[tokio::test]
    async fn exhausted_reports_last_failure()
    {   let sequence = FailoverSequence::new(["a", "b", "c"]);
        let err = sequence.run(|model| {
          let status = if model == "c" { 429 } else { 404 };
          let result = failed(&model, status);
          async move { result }
        }).await.unwrap_err();

        match err
        {   Error::Exhausted { last, attempts } => {
              assert_eq!(last.status().as_u16(), 429);
              let tried: Vec<_>
                = attempts.iter().map(|a| a.model.as_str()).collect();
              assert_eq!(tried, vec!["a", "b", "c"]);
            }
          , other => panic!("unexpected error: {:?}", other)
        }
    }

    #[tokio::test]
    async fn single_candidate_failure_is_returned_as_is()
    {   let sequence = FailoverSequence::new(["only"]);
        let err = sequence.run(|model| {
          let result = failed(&model, 404);
          async move { result }
        }).await.unwrap_err();
        assert!(matches!(err, Error::ApiError { status: 404, .. }));
    }

    #[tokio::test]
    async fn empty_sequence_is_a_configuration_error()
    {   let sequence = FailoverSequence::new(Vec::<String>::new());
        let err = sequence.run(|model| {
          let result = ok(&model);
          async move { result }
        }).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }
}

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use crate::llm::{Generation, GenerationRequest, LlmError};

/// Upper bound on the number of recorded requests, older ones are dropped first.
pub const MAX_RECORDED_REQUESTS: usize = 32;

/// An in-process language model.
///
/// Echoes the last user message unless responses were queued with [MockLlm::push_response].
/// The most recent requests are kept for later inspection.
#[derive(Debug, Default)]
pub struct MockLlm {
    requests: Mutex<VecDeque<GenerationRequest>>,
    responses: Mutex<VecDeque<String>>,
    failing: AtomicBool,
}

impl MockLlm {
    pub fn generate(&self, request: GenerationRequest) -> Result<Generation, LlmError> {
        let echo = format!("Mock response for: {}", request.last_user_message().unwrap_or_default());
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        if requests.len() == MAX_RECORDED_REQUESTS {
            requests.pop_front();
        }
        requests.push_back(request);
        drop(requests);

        if self.failing.load(Ordering::Acquire) {
            return Err(LlmError::Unavailable("Mock backend set to fail".into()));
        }

        let content = self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(echo);

        Ok(Generation { content, usage: None })
    }

    /// Queue a response to be returned by the next generation.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).push_back(response.into());
    }

    /// Make all following generations fail with [LlmError::Unavailable].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// The most recent requests, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_and_records() {
        let mock = MockLlm::default();
        let out = mock.generate(GenerationRequest::with_system("system", "Attack the goblin")).unwrap();
        assert_eq!(out.content, "Mock response for: Attack the goblin");

        mock.push_response("The goblin flees");
        assert_eq!(mock.generate(GenerationRequest::prompt("x")).unwrap().content, "The goblin flees");

        mock.set_failing(true);
        assert!(mock.generate(GenerationRequest::prompt("y")).is_err());
        assert_eq!(mock.requests().len(), 3);
    }

    #[test]
    fn only_recent_requests_are_kept() {
        let mock = MockLlm::default();
        for i in 0..MAX_RECORDED_REQUESTS + 5 {
            mock.generate(GenerationRequest::prompt(format!("Request {i}"))).unwrap();
        }

        let requests = mock.requests();
        assert_eq!(requests.len(), MAX_RECORDED_REQUESTS);
        assert_eq!(requests[0].last_user_message(), Some("Request 5"));
        assert_eq!(requests.last().and_then(|r| r.last_user_message()), Some(format!("Request {}", MAX_RECORDED_REQUESTS + 4)).as_deref());
    }
}

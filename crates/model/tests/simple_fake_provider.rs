use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use chatllm_model::{
    ErrorKind, PromptMessage, ReplyProvider, ReplyProviderError, ReplyRequest,
};
use tokio::time::sleep;

#[derive(Debug)]
struct FakeProviderError(ErrorKind);

impl Display for FakeProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeProviderError {}

impl ReplyProviderError for FakeProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

struct FakeProvider;

impl ReplyProvider for FakeProvider {
    type Error = FakeProviderError;

    fn generate(
        &self,
        req: &ReplyRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let input = req.latest_user_text().map(ToString::to_string);
        async move {
            sleep(Duration::from_millis(1)).await;
            match input {
                Some(input) => Ok(format!("You said {input}")),
                None => Err(FakeProviderError(ErrorKind::Rejected)),
            }
        }
    }
}

#[tokio::test]
async fn test_generate() {
    let provider = FakeProvider;
    let req = ReplyRequest {
        messages: vec![
            PromptMessage::System("Be nice.".to_string()),
            PromptMessage::User("Good morning".to_string()),
            PromptMessage::Assistant("You said Good morning".to_string()),
            PromptMessage::User("Good night".to_string()),
        ],
    };
    let reply = provider.generate(&req).await.unwrap();
    assert_eq!(reply, "You said Good night");
    assert_eq!(req.system_prompt(), Some("Be nice."));
}

#[tokio::test]
async fn test_error() {
    let provider = FakeProvider;
    let req = ReplyRequest {
        messages: vec![PromptMessage::System("Be nice.".to_string())],
    };
    let err = provider.generate(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);
}

#[test]
fn test_request_wire_shape() {
    let req = ReplyRequest {
        messages: vec![PromptMessage::User("hi".to_string())],
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "messages": [{ "role": "user", "content": "hi" }]
        })
    );
}

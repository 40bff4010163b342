use snapcal_core::extract::{ExtractError, Extractor, ImagePayload, SubmitExtraction};
use snapcal_core::session::{CapturedImage, ReviewSession, SessionPhase};
use snapcal_core::{DEFAULT_TITLE, normalize};

const FLYER_RESPONSE: &str = r#"```json
[
  {"title":"Farmers Market","startDateTime":"2025-06-07T08:00:00","endDateTime":"2025-06-07T13:00:00","location":"Town Square","description":"Fresh produce","recurrence":"RRULE:FREQ=WEEKLY;INTERVAL=1"},
  {"title":"","startDateTime":"2025-06-07T19:30:00","endDateTime":"","location":"","description":"","recurrence":""},
  {"title":"Cleanup Day","startDateTime":"","endDateTime":"","location":"Riverbank","description":"","recurrence":""}
]
```"#;

struct CannedTransport {
    response: Result<&'static str, &'static str>,
}

impl SubmitExtraction for CannedTransport {
    async fn submit(&self, _: &ImagePayload, prompt: &str) -> Result<String, ExtractError> {
        assert!(
            prompt.contains("startDateTime"),
            "orchestrator must pass the instruction prompt through"
        );
        match self.response {
            Ok(text) => Ok(text.to_string()),
            Err(message) => Err(ExtractError::ExtractionFailed(message.to_string())),
        }
    }
}

fn flyer_image() -> ImagePayload {
    ImagePayload::from_bytes(b"\x89PNG\r\n", "image/png")
}

#[tokio::test]
async fn extraction_to_review_walkthrough() {
    let extractor = Extractor::with_transport(CannedTransport {
        response: Ok(FLYER_RESPONSE),
    });

    let candidates = extractor.extract(&flyer_image()).await.expect("extract");
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[1].title, DEFAULT_TITLE);

    let mut session = ReviewSession::new();
    let generation = session
        .capture(CapturedImage {
            bytes: b"\x89PNG\r\n".to_vec(),
            mime_type: "image/png".to_string(),
        })
        .expect("capture");
    session.extraction_succeeded(generation, candidates);

    // Front card carries the weekly market; its link has dates and recurrence.
    let url = session.begin_commit().expect("front commit link");
    assert!(url.contains("text=Farmers%20Market"));
    assert!(url.contains("dates="));
    assert!(url.contains("recur=RRULE%3AFREQ%3DWEEKLY%3BINTERVAL%3D1"));
    session.finish_commit();

    // Second card: untitled and open-ended; link still well-formed, end
    // defaulted to one hour after start.
    let url = session.begin_commit().expect("second commit link");
    assert!(url.contains("text=Untitled%20Event"));
    assert!(url.contains("dates="));
    session.finish_commit();

    // Third card: no dates at all. The link omits the dates parameter.
    let url = session.begin_commit().expect("third commit link");
    assert!(url.contains("location=Riverbank"));
    assert!(!url.contains("dates="));
    session.finish_commit();

    assert!(session.all_processed());
}

#[tokio::test]
async fn transport_failure_reaches_failed_state_with_message() {
    let extractor = Extractor::with_transport(CannedTransport {
        response: Err("relay error: 429"),
    });

    let outcome = extractor.extract(&flyer_image()).await;
    let message = match outcome {
        Err(ExtractError::ExtractionFailed(message)) => message,
        other => panic!("expected ExtractionFailed, got {other:?}"),
    };

    let mut session = ReviewSession::new();
    let generation = session
        .capture(CapturedImage {
            bytes: vec![0],
            mime_type: "image/png".to_string(),
        })
        .expect("capture");
    session.extraction_failed(generation, message);

    assert_eq!(session.phase(), SessionPhase::Failed);
    assert_eq!(session.error_message(), Some("relay error: 429"));
}

#[test]
fn relay_may_return_pre_normalized_json() {
    // A relay that normalizes server-side sends a plain JSON array; the
    // same normalizer accepts it unchanged.
    let candidates = normalize("[{\"title\":\"Relay Event\"}]").expect("normalize");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "Relay Event");
}

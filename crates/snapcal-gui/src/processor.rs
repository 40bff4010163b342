//! Spawns extraction requests from the GUI onto the bridge runtime.

use tokio::sync::mpsc;

use snapcal_core::RuntimePreferences;
use snapcal_core::extract::{Extractor, ImagePayload};
use snapcal_core::session::CapturedImage;

use crate::async_bridge::{AsyncBridge, ExtractionOutcome};

/// Start one extraction for the captured image.
///
/// Transport construction happens up front so a configuration problem
/// (missing key, blank relay URL) fails before anything is spawned.
pub fn start_extraction(
    bridge: &AsyncBridge,
    prefs: &RuntimePreferences,
    generation: u64,
    image: &CapturedImage,
) -> Result<mpsc::UnboundedReceiver<ExtractionOutcome>, String> {
    let extractor = Extractor::from_preferences(prefs).map_err(|err| err.to_string())?;
    let payload = ImagePayload::from_bytes(&image.bytes, image.mime_type.clone());

    let (tx, rx) = mpsc::unbounded_channel();

    bridge.runtime().spawn(async move {
        let result = extractor
            .extract(&payload)
            .await
            .map_err(|err| err.to_string());
        let _ = tx.send(ExtractionOutcome { generation, result });
    });

    Ok(rx)
}

use axum::response::sse::Event;
use serde::Serialize;

/// Chunk size for the typing-effect `delta` events.
const DELTA_CHUNK_CHARS: usize = 12;

/// Build a named SSE event carrying a JSON payload. Serialization of our
/// own types cannot fail; an empty event is the harmless worst case.
pub fn json_event(name: &'static str, data: &impl Serialize) -> Event {
    match Event::default().event(name).json_data(data) {
        Ok(event) => event,
        Err(err) => {
            tracing::error!(event = name, error = %err, "failed to encode SSE event");
            Event::default().event(name).data("null")
        }
    }
}

/// Split assistant text into small chunks on char boundaries, one `delta`
/// event each, for the client-side typing effect.
pub fn delta_events(text: &str) -> Vec<Event> {
    chunk_text(text, DELTA_CHUNK_CHARS)
        .into_iter()
        .map(|chunk| json_event("delta", &chunk))
        .collect()
}

fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_splits_on_char_boundaries() {
        let chunks = chunk_text("hello wörld, this is a test", 12);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 12);
        assert_eq!(chunks.join(""), "hello wörld, this is a test");
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 12).is_empty());
    }

    #[test]
    fn test_delta_events_count() {
        assert_eq!(delta_events("exactly twelve!!").len(), 2);
    }
}

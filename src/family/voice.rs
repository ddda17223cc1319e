use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Source of spoken item names.
#[async_trait]
pub trait VoiceInput: Send + Sync {
  /// Listen once. An empty string means nothing was heard.
  async fn listen(&self) -> String;
}

/// Voice input that replays a fixed list of phrases in order
pub struct ScriptedVoice {
  phrases: Vec<String>,
  next: AtomicUsize,
  delay: Duration,
}

impl ScriptedVoice {
  pub fn new(phrases: Vec<String>) -> Self {
    Self {
      phrases,
      next: AtomicUsize::new(0),
      delay: Duration::ZERO,
    }
  }

  /// Pause before each result, like a recogniser waiting for silence.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }
}

impl Default for ScriptedVoice {
  fn default() -> Self {
    Self::new(
      ["Milk", "Buy eggs", "A loaf of bread", "Apples", "Don't forget soy sauce"]
        .into_iter()
        .map(String::from)
        .collect(),
    )
  }
}

#[async_trait]
impl VoiceInput for ScriptedVoice {
  async fn listen(&self) -> String {
    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }
    if self.phrases.is_empty() {
      return String::new();
    }
    let index = self.next.fetch_add(1, Ordering::Relaxed) % self.phrases.len();
    let heard = self.phrases[index].clone();
    debug!(%heard, "voice input");
    heard
  }
}

use crate::family::{Item, User};
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for presence refresh and heartbeats
  Tick,
  /// New snapshot of the active list
  List(Vec<Item>),
  /// New snapshot of the bought history
  History(Vec<Item>),
  /// Members re-fetched with fresh presence
  Members(Vec<User>),
}

/// Event handler that merges terminal input, a tick timer and forwarded
/// repository streams into one queue
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Read key presses from the terminal, ticking at `tick_rate`
  pub fn new(tick_rate: Duration) -> Self {
    let handler = Self::detached(tick_rate);

    // Spawn terminal event reader
    let key_tx = handler.tx.clone();
    tokio::spawn(async move {
      let mut reader = EventStream::new();
      while let Some(Ok(evt)) = reader.next().await {
        if let CrosstermEvent::Key(key) = evt {
          // Windows reports releases too
          if key.kind != KeyEventKind::Press {
            continue;
          }
          if key_tx.send(Event::Key(key)).is_err() {
            break;
          }
        }
      }
    });

    handler
  }

  /// Ticks and forwarded streams only, without a terminal
  pub fn detached(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    let tick_tx = tx.clone();
    tokio::spawn(async move {
      let mut interval = tokio::time::interval(tick_rate);
      interval.tick().await;
      loop {
        interval.tick().await;
        if tick_tx.send(Event::Tick).is_err() {
          break;
        }
      }
    });

    Self { tx, rx }
  }

  /// Forward every value of `stream` into the queue, wrapped by `wrap`.
  ///
  /// Abort the returned handle to stop forwarding.
  pub fn forward<S, T>(&self, stream: S, wrap: fn(T) -> Event) -> JoinHandle<()>
  where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
  {
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let mut stream = std::pin::pin!(stream);
      while let Some(value) = stream.next().await {
        if tx.send(wrap(value)).is_err() {
          break;
        }
      }
    })
  }

  /// Get a sender for async tasks to send events
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

use crate::commands::{self, Action, AddArgs, FilterArgs};
use crate::config::{BackendKind, Config};
use crate::event::{Event, EventHandler};
use crate::family::catalog;
use crate::family::mock::MockBackend;
use crate::family::rest::RestBackend;
use crate::family::{
  Family, FamilyDirectory, NewItem, Notifier, RemoteStore, ScriptedVoice, SyncRepository, User,
  ValidationError, VoiceInput,
};
use crate::ui;
use crate::ui::components::{categories_in, CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::StatusMessage;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{
  CreateFamilyForm, HelpView, HistoryView, JoinFamilyForm, MembersView, ShoppingListView,
};
use chrono::Duration as ChronoDuration;
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const SUGGESTION_LIMIT: usize = 8;
const FIRST_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Which view fills the content area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  List,
  History,
  Members,
  Help,
}

/// The backend seams, all served by one concrete backend
struct Backend {
  store: Arc<dyn RemoteStore>,
  directory: Arc<dyn FamilyDirectory>,
  notifier: Arc<dyn Notifier>,
  label: String,
}

impl Backend {
  fn new<B>(backend: Arc<B>, label: impl Into<String>) -> Self
  where
    B: RemoteStore + FamilyDirectory + Notifier + 'static,
  {
    Self {
      store: backend.clone(),
      directory: backend.clone(),
      notifier: backend,
      label: label.into(),
    }
  }
}

/// The family the app is signed into
struct Session {
  family: Family,
  user: User,
  /// Forwarding tasks for the list and history streams
  subscriptions: Vec<JoinHandle<()>>,
}

impl Drop for Session {
  fn drop(&mut self) {
    for handle in &self.subscriptions {
      handle.abort();
    }
  }
}

/// Main application state
pub struct App {
  config: Config,
  backend: Backend,
  repo: SyncRepository,
  voice: Arc<dyn VoiceInput>,

  session: Option<Session>,
  screen: Screen,
  list: ShoppingListView,
  history: HistoryView,
  members_view: MembersView,
  help: HelpView,
  command: CommandInput,
  status: Option<StatusMessage>,

  /// Family code to join on start
  auto_join: Option<String>,
  /// Hint shown on start when the mock backend was seeded
  demo_code: Option<String>,
  members_fetched: Option<Instant>,

  should_quit: bool,
}

impl App {
  pub async fn new(config: Config, auto_join: Option<String>) -> Result<Self> {
    let window = ChronoDuration::from_std(config.presence.window())?;
    let mut demo_code = None;

    let backend = match config.backend.kind {
      BackendKind::Mock => {
        let mock = MockBackend::new()
          .with_latency(config.backend.latency())
          .with_presence_window(window);
        for (op, mode) in &config.backend.failures {
          warn!(?op, ?mode, "mock backend will fail this operation");
          mock.fail(*op, *mode);
        }
        if config.backend.seed_demo {
          let family = mock.seed_demo();
          info!(family = %family.name, code = %family.code, "seeded demo family");
          demo_code = Some(family.code);
        }
        Backend::new(Arc::new(mock), "mock")
      }
      BackendKind::Rest => {
        let url = config
          .backend
          .url
          .clone()
          .ok_or_else(|| eyre!("backend.url is required for the rest backend"))?;
        let api_key = Config::get_api_key()?;
        let rest = RestBackend::new(&url, &api_key)?.with_presence_window(window);
        Backend::new(Arc::new(rest), url)
      }
    };

    let voice = ScriptedVoice::default().with_delay(config.backend.latency());
    let mut app = Self::with_backend(config, backend, Arc::new(voice));
    app.auto_join = auto_join;
    app.demo_code = demo_code;
    Ok(app)
  }

  fn with_backend(config: Config, backend: Backend, voice: Arc<dyn VoiceInput>) -> Self {
    let repo = SyncRepository::new(backend.store.clone(), backend.notifier.clone());
    Self {
      config,
      backend,
      repo,
      voice,
      session: None,
      screen: Screen::List,
      list: ShoppingListView::new(),
      history: HistoryView::new(),
      members_view: MembersView::new(),
      help: HelpView,
      command: CommandInput::new(),
      status: None,
      auto_join: None,
      demo_code: None,
      members_fetched: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let events = EventHandler::new(self.config.presence.refresh());
    let result = self.run_with(&mut terminal, events).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
  }

  async fn run_with<B>(&mut self, terminal: &mut Terminal<B>, mut events: EventHandler) -> Result<()>
  where
    B: ratatui::backend::Backend,
  {
    self.start(&events).await;

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event, &events).await,
        None => break,
      }
    }

    self.session = None;
    info!("app closed");
    Ok(())
  }

  async fn start(&mut self, events: &EventHandler) {
    if let Some(code) = self.auto_join.take() {
      self.join(code, None, events).await;
    } else if let Some(code) = &self.demo_code {
      let hint = format!("Demo family ready. Type :join {} as <nickname>, or ? for help.", code);
      self.info(hint);
    } else {
      self.info("Create a family with :create <name>, or :join <code>. ? shows help.");
    }
  }

  // Accessors for drawing

  pub fn view(&self) -> &dyn View {
    match self.screen {
      Screen::List => &self.list,
      Screen::History => &self.history,
      Screen::Members => &self.members_view,
      Screen::Help => &self.help,
    }
  }

  pub fn view_mut(&mut self) -> &mut dyn View {
    match self.screen {
      Screen::List => &mut self.list,
      Screen::History => &mut self.history,
      Screen::Members => &mut self.members_view,
      Screen::Help => &mut self.help,
    }
  }

  pub fn family(&self) -> Option<&Family> {
    self.session.as_ref().map(|s| &s.family)
  }

  pub fn members(&self) -> &[User] {
    self.list.members()
  }

  pub fn backend_label(&self) -> &str {
    &self.backend.label
  }

  pub fn status(&self) -> Option<&StatusMessage> {
    self.status.as_ref()
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  // Events

  async fn handle_event(&mut self, event: Event, events: &EventHandler) {
    match event {
      Event::Key(key) => self.handle_key(key, events).await,
      Event::Tick => self.refresh_presence_if_stale(events),
      Event::List(items) => self.list.set_items(items),
      Event::History(items) => self.history.set_items(items),
      Event::Members(members) => self.set_members(members),
    }
  }

  async fn handle_key(&mut self, key: KeyEvent, events: &EventHandler) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      self.should_quit = true;
      return;
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(line)) => {
        self.status = None;
        self.handle_line(&line, events).await;
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    self.status = None;
    match self.view_mut().handle_key(key) {
      ViewAction::None => {}
      ViewAction::Toggle(item_id) => self.toggle_id(&item_id).await,
      ViewAction::Delete(item_id) => self.remove_id(&item_id).await,
      ViewAction::ClearCompleted => self.clear_completed().await,
      ViewAction::Refresh => self.refresh().await,
      ViewAction::Voice => self.voice().await,
      ViewAction::Prompt(text) => self.command.activate_with(text),
      ViewAction::NotHandled => self.handle_global_key(key).await,
    }
  }

  /// Keys that work on every screen
  async fn handle_global_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Tab => {
        self.screen = match self.screen {
          Screen::List => Screen::History,
          _ => Screen::List,
        };
      }
      KeyCode::Esc => self.screen = Screen::List,
      KeyCode::Char('?') => self.screen = Screen::Help,
      KeyCode::Char('m') => self.show_members().await,
      _ => {}
    }
  }

  async fn handle_line(&mut self, line: &str, events: &EventHandler) {
    match commands::parse(line) {
      Ok(Some(action)) => self.dispatch(action, events).await,
      Ok(None) => {}
      Err(e) => self.error(e.to_string()),
    }
  }

  async fn dispatch(&mut self, action: Action, events: &EventHandler) {
    match action {
      Action::Create {
        family_name,
        nickname,
      } => self.create(family_name, nickname, events).await,
      Action::Join { code, nickname } => self.join(code, nickname, events).await,
      Action::List => self.screen = Screen::List,
      Action::History => self.screen = Screen::History,
      Action::Add(args) => self.add(args).await,
      Action::Done(reference) => self.toggle(&reference).await,
      Action::Remove(reference) => self.remove(&reference).await,
      Action::Clear => self.clear_completed().await,
      Action::Voice => self.voice().await,
      Action::Refresh => self.refresh().await,
      Action::Filter(filter) => self.filter(filter),
      Action::Members => self.show_members().await,
      Action::Suggest(prefix) => {
        let names = catalog::suggest(&prefix, SUGGESTION_LIMIT);
        if names.is_empty() {
          self.info(format!("No suggestions for '{}'", prefix));
        } else {
          self.info(names.join(", "));
        }
      }
      Action::Help => self.screen = Screen::Help,
      Action::Quit => self.should_quit = true,
    }
  }

  // Family

  fn nickname(&self, given: Option<String>) -> String {
    given
      .or_else(|| self.config.profile.nickname.clone())
      .unwrap_or_default()
  }

  async fn create(&mut self, family_name: String, nickname: Option<String>, events: &EventHandler) {
    let form = CreateFamilyForm {
      family_name,
      nickname: self.nickname(nickname),
      avatar: self.config.profile.avatar.clone(),
    };
    if let Err(e) = form.validate() {
      return self.report_validation(e);
    }

    match self
      .backend
      .directory
      .create_family(&form.family_name, &form.nickname, &form.avatar)
      .await
    {
      Ok((family, user)) => {
        let message = format!("Created {}. Others can join with code {}.", family.name, family.code);
        self.enter_family(family, user, events).await;
        self.info(message);
      }
      Err(e) => {
        warn!(error = %e, "create family failed");
        self.error(format!("could not create family: {}", e));
      }
    }
  }

  async fn join(&mut self, code: String, nickname: Option<String>, events: &EventHandler) {
    let form = JoinFamilyForm {
      code: code.trim().to_string(),
      nickname: self.nickname(nickname),
      avatar: self.config.profile.avatar.clone(),
    };
    if let Err(e) = form.validate() {
      return self.report_validation(e);
    }

    match self
      .backend
      .directory
      .join_family(&form.code, &form.nickname, &form.avatar)
      .await
    {
      Ok((family, user)) => {
        let message = format!("Joined {} as {}.", family.name, user.nickname);
        self.enter_family(family, user, events).await;
        self.info(message);
      }
      Err(e) => {
        warn!(code = %form.code, error = %e, "join family failed");
        self.error(format!("could not join family {}: {}", form.code, e));
      }
    }
  }

  /// Switch to `family`, dropping everything cached for the previous one.
  ///
  /// Returns once the first load from the backend has finished, so it
  /// cannot overwrite items added right after.
  async fn enter_family(&mut self, family: Family, user: User, events: &EventHandler) {
    self.session = None;
    self.repo.reset();

    self.list = ShoppingListView::new();
    self.history = HistoryView::new();
    self.members_view = MembersView::new();
    self.members_view.set_me(user.id.clone());
    self.set_members(family.members.clone());
    self.screen = Screen::List;

    let seen = self.repo.refresh_count();
    let subscriptions = vec![
      events.forward(self.repo.get_active_list(&family.id), Event::List),
      events.forward(self.repo.get_completed_items(&family.id), Event::History),
    ];
    let family_id = family.id.clone();
    info!(%family_id, user_id = %user.id, "entered family");
    self.session = Some(Session {
      family,
      user,
      subscriptions,
    });

    if tokio::time::timeout(FIRST_LOAD_TIMEOUT, self.repo.refreshed_since(seen))
      .await
      .is_err()
    {
      warn!(%family_id, "first load still running, continuing with the cached list");
    }
  }

  fn set_members(&mut self, members: Vec<User>) {
    self.members_fetched = Some(Instant::now());
    if let Some(session) = &mut self.session {
      session.family.members = members.clone();
    }
    self.list.set_members(members.clone());
    self.history.set_members(members.clone());
    self.members_view.set_members(members);
  }

  fn refresh_presence_if_stale(&mut self, events: &EventHandler) {
    let Some(session) = &self.session else {
      return;
    };
    let stale = self
      .members_fetched
      .map_or(true, |at| at.elapsed() >= self.config.presence.refresh());
    if !stale {
      return;
    }
    // Avoid stacking requests while one is in flight.
    self.members_fetched = Some(Instant::now());

    let directory = Arc::clone(&self.backend.directory);
    let family_id = session.family.id.clone();
    let user_id = session.user.id.clone();
    let tx = events.sender();
    tokio::spawn(async move {
      if let Err(e) = directory.heartbeat(&family_id, &user_id).await {
        warn!(%family_id, error = %e, "heartbeat failed");
      }
      match directory.members_with_status(&family_id).await {
        Ok(members) => {
          let _ = tx.send(Event::Members(members));
        }
        Err(e) => warn!(%family_id, error = %e, "presence refresh failed"),
      }
    });
  }

  async fn show_members(&mut self) {
    let Some(family_id) = self.family_id() else {
      return self.need_family();
    };

    match self.backend.directory.members_with_status(&family_id).await {
      Ok(members) => {
        self.set_members(members);
        self.screen = Screen::Members;
      }
      Err(e) => {
        warn!(%family_id, error = %e, "members fetch failed");
        self.error(format!("could not load members: {}", e));
      }
    }
  }

  // Items

  async fn add(&mut self, args: AddArgs) {
    let Some(session) = &self.session else {
      return self.need_family();
    };
    let family_id = session.family.id.clone();
    let new_item = NewItem {
      category: args.category,
      quantity: args.quantity,
      unit: args.unit,
      location: args.location,
      ..NewItem::new(args.name, session.user.id.clone())
        .with_priority(args.priority)
        .with_added_by_name(session.user.nickname.clone())
    };

    match self.repo.add_item(&family_id, new_item).await {
      Ok(added) => self.report(added.outcome.problem()),
      Err(e) => self.report_validation(e),
    }
  }

  async fn voice(&mut self) {
    if self.session.is_none() {
      return self.need_family();
    }

    let heard = self.voice.listen().await;
    let heard = heard.trim();
    if heard.is_empty() {
      return self.info("Didn't catch that.");
    }
    // A sync problem from the add replaces this message
    self.info(format!("Heard \"{}\"", heard));
    self
      .add(AddArgs {
        name: heard.to_string(),
        ..AddArgs::default()
      })
      .await;
  }

  async fn toggle(&mut self, reference: &str) {
    match self.view().resolve(reference) {
      Some(item_id) => self.toggle_id(&item_id).await,
      None => self.no_such_item(reference),
    }
  }

  async fn toggle_id(&mut self, item_id: &str) {
    let Some(family_id) = self.family_id() else {
      return self.need_family();
    };
    let outcome = self.repo.toggle_completed(&family_id, item_id).await;
    self.report(outcome.problem());
  }

  async fn remove(&mut self, reference: &str) {
    match self.view().resolve(reference) {
      Some(item_id) => self.remove_id(&item_id).await,
      None => self.no_such_item(reference),
    }
  }

  async fn remove_id(&mut self, item_id: &str) {
    let Some(family_id) = self.family_id() else {
      return self.need_family();
    };
    let outcome = self.repo.delete_item(&family_id, item_id).await;
    self.report(outcome.problem());
  }

  async fn clear_completed(&mut self) {
    let Some(family_id) = self.family_id() else {
      return self.need_family();
    };
    let report = self.repo.clear_completed_from_active_list(&family_id).await;
    if report.failed > 0 {
      return self.report(Some(format!(
        "{} of {} bought items could not be cleared",
        report.failed,
        report.failed + report.archived
      )));
    }
    self.list.clear_error();
    self.info(format!("Cleared {} bought items.", report.archived));
  }

  async fn refresh(&mut self) {
    let Some(family_id) = self.family_id() else {
      return self.need_family();
    };
    match self.repo.refresh(&family_id).await {
      Ok(count) => {
        self.list.clear_error();
        self.info(format!("Fetched {} items.", count));
      }
      Err(e) => self.report(Some(format!("refresh failed: {}", e))),
    }
  }

  fn filter(&mut self, filter: FilterArgs) {
    match filter {
      FilterArgs::Clear => self.list.filters.clear(),
      FilterArgs::Category(category) => {
        let in_use = categories_in(self.list.items());
        if self.list.filters.toggle_category(&category) && !in_use.contains(&category) {
          let hint = if in_use.is_empty() {
            "none".to_string()
          } else {
            in_use.join(", ")
          };
          self.info(format!("Nothing in '{}' yet. Categories on the list: {}", category, hint));
        }
      }
      FilterArgs::Priority(priority) => {
        self.list.filters.toggle_priority(priority);
      }
      FilterArgs::Member(name) => {
        let Some(member_id) = self.list.find_member(&name).map(|m| m.id.clone()) else {
          return self.error(format!("no member named '{}'", name));
        };
        self.list.filters.toggle_member(&member_id);
      }
    }
    self.screen = Screen::List;
  }

  // Status

  fn family_id(&self) -> Option<String> {
    self.session.as_ref().map(|s| s.family.id.clone())
  }

  fn info(&mut self, text: impl Into<String>) {
    self.status = Some(StatusMessage::info(text));
  }

  fn error(&mut self, text: impl Into<String>) {
    self.status = Some(StatusMessage::error(text));
  }

  /// Show and remember a sync problem, or clear the last one.
  fn report(&mut self, problem: Option<String>) {
    match problem {
      Some(problem) => {
        self.list.set_error(problem.clone());
        self.error(problem);
      }
      None => self.list.clear_error(),
    }
  }

  fn report_validation(&mut self, error: ValidationError) {
    self.error(error.to_string());
  }

  fn need_family(&mut self) {
    self.error("create or join a family first");
  }

  fn no_such_item(&mut self, reference: &str) {
    self.error(format!("no item '{}' on this screen", reference));
  }
}

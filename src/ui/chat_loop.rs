//! Main chat event loop.
//!
//! The loop owns the terminal lifecycle and the [`App`] state, polls
//! crossterm input on a 50 ms cadence, and drains the request and
//! highlight-timer channels in between. The outbound request itself runs on
//! a spawned task (see [`RequestDispatcher`]); the busy flag in the app is
//! the only thing preventing a second overlapping submission, so no locks
//! are needed anywhere.

use std::{error::Error, io, time::Duration};

use ratatui::crossterm::{
    cursor::Show,
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::debug;

use crate::auth::access_token_from_env;
use crate::core::app::{App, HighlightPulse, SessionContext};
use crate::core::request::{RequestDispatcher, RequestParams};
use crate::ui::renderer::{max_scroll_offset, render, transcript_row_count};
use crate::utils::input::sanitize_single_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Username,
    Draft,
}

impl Focus {
    fn toggled(self) -> Self {
        match self {
            Focus::Username => Focus::Draft,
            Focus::Draft => Focus::Username,
        }
    }
}

/// Presentation-only state: which field has focus and where the transcript
/// pane is scrolled to. Session state lives in [`App`].
pub struct ChatViewState {
    pub focus: Focus,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub markdown_enabled: bool,
}

/// What the key handler asks the loop to do next.
#[derive(Debug)]
enum KeyAction {
    Continue,
    Quit,
    Dispatch(RequestParams),
}

/// Restores the terminal when dropped, so early returns from the event loop
/// never strand the user in raw mode on the alternate screen.
struct TerminalRestore;

impl Drop for TerminalRestore {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            DisableMouseCapture,
            DisableBracketedPaste,
            LeaveAlternateScreen,
            Show
        );
    }
}

fn setup_terminal(
) -> Result<(Terminal<CrosstermBackend<io::Stdout>>, TerminalRestore), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        EnableMouseCapture
    )
    .inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;
    // From here on the guard owns cleanup, including the error paths below.
    let restore = TerminalRestore;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok((terminal, restore))
}

pub async fn run_chat(
    endpoint: String,
    username: String,
    markdown_enabled: bool,
) -> Result<(), Box<dyn Error>> {
    // Cookies stay enabled so the worker can establish a session across
    // exchanges, mirroring a credentialed browser client.
    let client = reqwest::Client::builder().cookie_store(true).build()?;
    let session = SessionContext {
        client,
        endpoint,
        access_token: access_token_from_env(),
    };
    let mut app = App::new(session, username);
    let mut view = ChatViewState {
        focus: if app.input.username.trim().is_empty() {
            Focus::Username
        } else {
            Focus::Draft
        },
        scroll_offset: 0,
        auto_scroll: true,
        markdown_enabled,
    };

    let (dispatcher, mut gateway_rx) = RequestDispatcher::new();
    let (highlight_tx, mut highlight_rx) = mpsc::unbounded_channel::<u64>();

    let (mut terminal, _restore) = setup_terminal()?;

    debug!(endpoint = %app.endpoint(), "entering chat loop");

    loop {
        terminal.draw(|f| render(f, &app, &view))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    // Scrolling needs the terminal size for clamping, so it
                    // is handled here rather than in `handle_key`.
                    KeyCode::Up => scroll_up(&mut app, &mut view, &terminal, 1),
                    KeyCode::Down => scroll_down(&mut app, &mut view, &terminal, 1),
                    _ => match handle_key(&mut app, &mut view, key) {
                        KeyAction::Quit => break Ok(()),
                        KeyAction::Dispatch(params) => {
                            dispatcher.spawn(params);
                            view.auto_scroll = true;
                        }
                        KeyAction::Continue => {}
                    },
                },
                Event::Paste(text) => {
                    focused_field(&mut app, view.focus).push_str(&sanitize_single_line(&text));
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => scroll_up(&mut app, &mut view, &terminal, 3),
                    MouseEventKind::ScrollDown => scroll_down(&mut app, &mut view, &terminal, 3),
                    _ => {}
                },
                _ => {}
            }
        }

        while let Ok((gateway_event, request_id)) = gateway_rx.try_recv() {
            if let Some(pulse) = app.on_gateway_event(gateway_event, request_id) {
                schedule_highlight_revert(&highlight_tx, pulse);
            }
        }

        while let Ok(generation) = highlight_rx.try_recv() {
            app.on_highlight_elapsed(generation);
        }
    }
}

fn handle_key(app: &mut App, view: &mut ChatViewState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Enter => {
            // Enter on a filled username field just moves on to the message.
            if view.focus == Focus::Username && !app.input.username.trim().is_empty() {
                view.focus = Focus::Draft;
                return KeyAction::Continue;
            }
            match app.submit() {
                Some(params) => KeyAction::Dispatch(params),
                None => KeyAction::Continue,
            }
        }
        KeyCode::Esc => {
            app.cancel_draft();
            KeyAction::Continue
        }
        KeyCode::Tab | KeyCode::BackTab => {
            view.focus = view.focus.toggled();
            KeyAction::Continue
        }
        KeyCode::Backspace => {
            focused_field(app, view.focus).pop();
            KeyAction::Continue
        }
        KeyCode::Char(c) => {
            let sanitized = sanitize_single_line(&c.to_string());
            focused_field(app, view.focus).push_str(&sanitized);
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn focused_field(app: &mut App, focus: Focus) -> &mut String {
    match focus {
        Focus::Username => &mut app.input.username,
        Focus::Draft => &mut app.input.draft,
    }
}

/// Fire-and-forget revert timer for one highlight pulse. The generation in
/// the pulse lets the app drop reverts that were superseded by a newer
/// change.
fn schedule_highlight_revert(tx: &mpsc::UnboundedSender<u64>, pulse: HighlightPulse) {
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(pulse.duration).await;
        let _ = tx.send(pulse.generation);
    });
}

/// Width and height of the transcript pane's scrollable region. Scrolling
/// works in post-wrap rows, so both dimensions matter for the bounds.
fn transcript_pane<B: ratatui::backend::Backend>(app: &App, terminal: &Terminal<B>) -> (u16, u16) {
    let size = terminal.size().unwrap_or_default();
    let gateway_height = if app.gateway.info().is_known() { 3 } else { 0 };
    // Two bordered input fields plus the transcript title row.
    (size.width, size.height.saturating_sub(gateway_height + 6 + 1))
}

fn scroll_up<B: ratatui::backend::Backend>(
    app: &mut App,
    view: &mut ChatViewState,
    terminal: &Terminal<B>,
    amount: u16,
) {
    let (width, height) = transcript_pane(app, terminal);
    if view.auto_scroll {
        // Leaving auto-scroll starts from the bottom, not from a stale offset.
        let total = transcript_row_count(app, view.markdown_enabled, width);
        view.scroll_offset = max_scroll_offset(total, height);
    }
    view.auto_scroll = false;
    view.scroll_offset = view.scroll_offset.saturating_sub(amount);
}

fn scroll_down<B: ratatui::backend::Backend>(
    app: &mut App,
    view: &mut ChatViewState,
    terminal: &Terminal<B>,
    amount: u16,
) {
    let (width, height) = transcript_pane(app, terminal);
    let max = max_scroll_offset(transcript_row_count(app, view.markdown_enabled, width), height);
    view.scroll_offset = view.scroll_offset.saturating_add(amount).min(max);
    if view.scroll_offset >= max {
        view.auto_scroll = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app(username: &str) -> App {
        let session = SessionContext {
            client: reqwest::Client::new(),
            endpoint: "http://localhost/".to_string(),
            access_token: None,
        };
        App::new(session, username.to_string())
    }

    fn test_view(focus: Focus) -> ChatViewState {
        ChatViewState {
            focus,
            scroll_offset: 0,
            auto_scroll: true,
            markdown_enabled: true,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_fills_the_focused_field() {
        let mut app = test_app("alice");
        let mut view = test_view(Focus::Draft);

        for c in "hi".chars() {
            handle_key(&mut app, &mut view, press(KeyCode::Char(c)));
        }
        assert_eq!(app.input.draft, "hi");
        assert_eq!(app.input.username, "alice");

        view.focus = Focus::Username;
        handle_key(&mut app, &mut view, press(KeyCode::Char('!')));
        assert_eq!(app.input.username, "alice!");
    }

    #[test]
    fn escape_clears_the_draft_only() {
        let mut app = test_app("alice");
        let mut view = test_view(Focus::Draft);
        app.input.draft = "half-typed".to_string();

        handle_key(&mut app, &mut view, press(KeyCode::Esc));
        assert!(app.input.draft.is_empty());
        assert_eq!(app.input.username, "alice");
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn enter_dispatches_when_the_gate_permits() {
        let mut app = test_app("alice");
        let mut view = test_view(Focus::Draft);
        app.input.draft = "hello".to_string();

        match handle_key(&mut app, &mut view, press(KeyCode::Enter)) {
            KeyAction::Dispatch(params) => {
                assert_eq!(params.prompt, "hello");
                assert_eq!(params.username, "alice");
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
        assert!(app.input.busy);

        // A second Enter while busy must not dispatch again.
        app.input.draft = "again".to_string();
        assert!(matches!(
            handle_key(&mut app, &mut view, press(KeyCode::Enter)),
            KeyAction::Continue
        ));
        assert_eq!(app.transcript.len(), 1);
    }

    #[test]
    fn enter_without_username_does_not_dispatch() {
        let mut app = test_app("");
        let mut view = test_view(Focus::Draft);
        app.input.draft = "hello".to_string();

        assert!(matches!(
            handle_key(&mut app, &mut view, press(KeyCode::Enter)),
            KeyAction::Continue
        ));
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn enter_on_a_filled_username_moves_focus_to_the_draft() {
        let mut app = test_app("alice");
        let mut view = test_view(Focus::Username);

        handle_key(&mut app, &mut view, press(KeyCode::Enter));
        assert_eq!(view.focus, Focus::Draft);
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn tab_toggles_focus() {
        let mut app = test_app("alice");
        let mut view = test_view(Focus::Draft);

        handle_key(&mut app, &mut view, press(KeyCode::Tab));
        assert_eq!(view.focus, Focus::Username);
        handle_key(&mut app, &mut view, press(KeyCode::Tab));
        assert_eq!(view.focus, Focus::Draft);
    }

    #[test]
    fn leaving_auto_scroll_uses_wrapped_row_bounds() {
        let mut app = test_app("alice");
        app.transcript.push(crate::core::message::Message::user(
            "word ".repeat(60).trim_end().to_string(),
        ));
        let mut view = test_view(Focus::Draft);
        view.markdown_enabled = false;
        let terminal = Terminal::new(ratatui::backend::TestBackend::new(20, 16)).unwrap();

        scroll_up(&mut app, &mut view, &terminal, 1);

        let (width, height) = transcript_pane(&app, &terminal);
        let max = max_scroll_offset(transcript_row_count(&app, false, width), height);
        assert!(!view.auto_scroll);
        assert_eq!(view.scroll_offset, max - 1);
        // Two logical lines would leave nothing to scroll; the wrapped rows do.
        assert!(max > 0);
    }

    #[test]
    fn scrolling_back_down_restores_auto_scroll() {
        let mut app = test_app("alice");
        app.transcript.push(crate::core::message::Message::user(
            "word ".repeat(60).trim_end().to_string(),
        ));
        let mut view = test_view(Focus::Draft);
        view.markdown_enabled = false;
        let terminal = Terminal::new(ratatui::backend::TestBackend::new(20, 16)).unwrap();

        scroll_up(&mut app, &mut view, &terminal, 3);
        assert!(!view.auto_scroll);
        scroll_down(&mut app, &mut view, &terminal, 3);
        assert!(view.auto_scroll);
    }

    #[test]
    fn terminal_restore_is_safe_without_a_tty() {
        // Dropping the guard outside raw mode must not panic.
        drop(TerminalRestore);
    }

    #[test]
    fn ctrl_c_quits() {
        let mut app = test_app("alice");
        let mut view = test_view(Focus::Draft);
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(
            handle_key(&mut app, &mut view, key),
            KeyAction::Quit
        ));
    }
}

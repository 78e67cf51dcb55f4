use std::io;
use std::time::Duration;

use clap::Parser;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::layout::Size;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{error, info};

use parley::api::ApiError;
use parley::app::{App, ChatDispatch, View};
use parley::config::Config;
use parley::logging;
use parley::ui;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "A full-screen terminal chat client with a local account gate")]
#[command(long_about = "Parley is a full-screen terminal chat client. A single local account \
gates the chat view: the first run asks you to register, later runs ask you to log in.\n\n\
Configuration is read from 'config.properties' in the working directory:\n\
  apiUrl    Base endpoint of an OpenAI-compatible API\n\
  apiKey    Bearer credential sent with every request\n\n\
Controls:\n\
  Tab               Switch between form fields\n\
  Enter             Submit the form / send the message\n\
  Up/Down/Mouse     Scroll through chat history\n\
  Ctrl+C            Quit\n\n\
Type 'exit' in the chat view to quit.")]
struct Args {
    #[arg(
        short,
        long,
        default_value = "openrouter/auto",
        help = "Completion model id sent with each request"
    )]
    model: String,
}

type CompletionSender = mpsc::UnboundedSender<(u64, Result<String, ApiError>)>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "configuration load failed");
            eprintln!("Error loading configuration: {err}");
            std::process::exit(1);
        }
    };
    info!(endpoint = %config.api_url, model = %args.model, "starting parley");

    let mut app = App::new(&config, args.model);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    // Completions come back from background send tasks tagged with their
    // turn id; the loop drains them between redraws.
    let (tx, mut rx) = mpsc::unbounded_channel();

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.modifiers.contains(KeyModifiers::CONTROL) {
                        if key.code == KeyCode::Char('c') {
                            info!("quit from keyboard");
                            break;
                        }
                    } else {
                        handle_key(app, key, &tx, terminal.size()?);
                    }
                }
                Event::Mouse(mouse) if app.view == View::Chat => {
                    let (width, height) = transcript_area(terminal.size()?);
                    match mouse.kind {
                        MouseEventKind::ScrollUp => app.scroll_up(3, width, height),
                        MouseEventKind::ScrollDown => app.scroll_down(3, width, height),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        while let Ok((turn_id, result)) = rx.try_recv() {
            app.complete_turn(turn_id, result);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &CompletionSender, size: Size) {
    match app.view {
        View::Register | View::Login => handle_auth_key(app, key.code),
        View::Chat => handle_chat_key(app, key.code, tx, size),
    }
}

fn handle_auth_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => app.form.next_field(),
        KeyCode::Enter => match app.view {
            View::Register => app.submit_register(),
            View::Login => app.submit_login(),
            View::Chat => {}
        },
        KeyCode::Char(c) => app.form.push_char(c),
        KeyCode::Backspace => app.form.backspace(),
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, code: KeyCode, tx: &CompletionSender, size: Size) {
    let (width, height) = transcript_area(size);
    match code {
        KeyCode::Enter => {
            if let Some(dispatch) = app.submit_chat_input() {
                spawn_send(app, dispatch, tx);
            }
        }
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Up => app.scroll_up(1, width, height),
        KeyCode::Down => app.scroll_down(1, width, height),
        _ => {}
    }
}

/// Run the send off the UI loop; the result is delivered back over the
/// channel. Closing the receiver on shutdown just drops the completion.
fn spawn_send(app: &App, dispatch: ChatDispatch, tx: &CompletionSender) {
    let client = app.chat.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.send(&dispatch.prompt).await;
        let _ = tx.send((dispatch.turn_id, result));
    });
}

fn transcript_area(size: Size) -> (u16, u16) {
    // Three rows of input box, one title row above the transcript.
    (size.width, size.height.saturating_sub(3).saturating_sub(1))
}

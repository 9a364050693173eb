use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use phoneshop::config::{ClientConfig, ConfigError};
use phoneshop::net::api::{ApiClient, ApiError, ShopApi};
use phoneshop::net::token::TokenStore;
use phoneshop::net::types::{PhoneFilters, PhoneId};
use phoneshop::services::auth::{AuthError, AuthService};
use phoneshop::services::session::{SessionController, SessionError};
use phoneshop::state::comparison::Toggle;
use phoneshop::view;
use tokio::io::{AsyncBufReadExt, BufReader};


#[derive(Debug, thiserror::Error)]
enum ShellError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "phoneshop", about = "Chat with the phone shopping assistant")]
struct Cli {
    /// Backend base URL.
    #[arg(long, env = "PHONESHOP_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token from a previous login.
    #[arg(long, env = "PHONESHOP_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check backend health.
    Ping,
    /// Interactive chat session (default).
    Chat,
    /// List phones from the catalog.
    Phones(PhonesArgs),
    /// Show one phone with its full comparison sheet.
    Phone { id: PhoneId },
    /// List catalog brands.
    Brands,
    /// List saved conversations, or the turns of one conversation.
    History { conversation_id: Option<i64> },
}

#[derive(Args, Debug)]
struct PhonesArgs {
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    min_price: Option<f64>,
    #[arg(long)]
    max_price: Option<f64>,
    #[arg(long)]
    min_ram: Option<u32>,
    #[arg(long)]
    min_storage: Option<u32>,
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

#[tokio::main]
async fn main() -> Result<(), ShellError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.base_url.as_deref() {
        config = config.with_base_url(url)?;
    }
    let tokens = TokenStore::with_token(cli.token.or_else(|| config.token.clone()));
    let api = Arc::new(ApiClient::new(&config, tokens.clone())?);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Ping => {
            api.health().await?;
            println!("ok");
            Ok(())
        }
        Command::Chat => run_chat(api, tokens).await,
        Command::Phones(args) => {
            let filters = PhoneFilters {
                brand: args.brand,
                min_price: args.min_price,
                max_price: args.max_price,
                min_ram: args.min_ram,
                min_storage: args.min_storage,
                limit: Some(args.limit),
            };
            for phone in api.list_phones(&filters).await? {
                println!("{}", view::render_phone_card(&phone, false));
            }
            Ok(())
        }
        Command::Phone { id } => {
            let phone = api.get_phone(id).await?;
            println!("{}", view::render_phone_card(&phone, false));
            if let Some(description) = phone.description.as_deref() {
                println!("{description}");
            }
            println!("{}", view::render_comparison(&[&phone]));
            Ok(())
        }
        Command::Brands => {
            println!("{}", api.list_brands().await?.join("\n"));
            Ok(())
        }
        Command::History { conversation_id: None } => {
            println!("{}", view::render_conversation_list(&api.list_conversations().await?));
            Ok(())
        }
        Command::History { conversation_id: Some(id) } => {
            for turn in api.conversation_messages(id).await? {
                println!("You: {}\nAssistant: {}\n", turn.user_message, turn.ai_response);
            }
            Ok(())
        }
    }
}

// =============================================================================
// INTERACTIVE SHELL
// =============================================================================

/// One line of interactive input.
#[derive(Debug, PartialEq)]
enum Input {
    Say(String),
    Login { email: String, password: String },
    Register { email: String, password: String, full_name: String },
    Logout,
    Toggle(PhoneId),
    Remove(PhoneId),
    Compare,
    Show,
    Hide,
    Recommendations,
    History,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

const HELP: &str = "\
Type a question to chat, or a command:
  /login <email> <password>
  /register <email> <password> <full name>
  /logout
  /select <id>    add or remove a phone from the comparison
  /remove <id>    remove a phone from the comparison
  /compare        compare the selected phones (2 or 3)
  /show, /hide    open or close the comparison table
  /recs           show current recommendations
  /history        list saved conversations
  /quit";

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Say(line.to_owned());
    };
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();
    match (name, rest.as_slice()) {
        ("login", [email, password]) => {
            Input::Login { email: (*email).to_owned(), password: (*password).to_owned() }
        }
        ("register", [email, password, name @ ..]) if !name.is_empty() => Input::Register {
            email: (*email).to_owned(),
            password: (*password).to_owned(),
            full_name: name.join(" "),
        },
        ("logout", []) => Input::Logout,
        ("select", [id]) => id.parse().map_or_else(|_| invalid_id(id), Input::Toggle),
        ("remove", [id]) => id.parse().map_or_else(|_| invalid_id(id), Input::Remove),
        ("compare", []) => Input::Compare,
        ("show", []) => Input::Show,
        ("hide", []) => Input::Hide,
        ("recs", []) => Input::Recommendations,
        ("history", []) => Input::History,
        ("help", _) => Input::Help,
        ("quit" | "exit", []) => Input::Quit,
        _ => Input::Invalid(format!("unknown command: /{command}")),
    }
}

fn invalid_id(raw: &str) -> Input {
    Input::Invalid(format!("not a phone id: {raw}"))
}

/// One-line failure text, noting when the same request may succeed later.
fn describe_api_error(e: &ApiError) -> String {
    if e.retryable() { format!("{e} (temporary, try again shortly)") } else { e.to_string() }
}

fn describe_auth_error(e: &AuthError) -> String {
    match e {
        AuthError::Api(api) => describe_api_error(api),
        other => other.to_string(),
    }
}

struct Shell {
    api: Arc<ApiClient>,
    auth: AuthService<ApiClient>,
    session: SessionController<ApiClient>,
    last_printed: u64,
    last_reveal: u64,
}

impl Shell {
    /// Print messages appended since the last call, then any newly revealed comparison.
    fn flush(&mut self) {
        let state = self.session.snapshot();
        for message in state.messages.as_slice() {
            if message.id > self.last_printed {
                println!("{}", view::render_message(message));
                self.last_printed = message.id;
            }
        }
        if state.comparison_reveal_seq != self.last_reveal {
            self.last_reveal = state.comparison_reveal_seq;
            println!("{}", view::render_comparison(&state.selected_phones()));
        }
    }

    fn status(&self) {
        let auth = self.auth.state();
        println!("{}", view::render_status(&self.session.snapshot(), auth.display_name()));
    }

    async fn start(&mut self) {
        self.auth.restore().await;
        self.session
            .initialize(self.auth.is_authenticated())
            .await;
        self.status();
        if !self.auth.is_authenticated() {
            println!("Sign in to continue: /login <email> <password> (or /register to create an account)");
        }
        self.flush();
    }

    /// Sign-out path shared by `/logout` and rejected credentials.
    async fn signed_out(&mut self) {
        self.session.reset();
        self.last_printed = 0;
        self.last_reveal = 0;
        self.session.initialize(false).await;
        self.status();
    }

    async fn handle_session_result<T>(&mut self, result: Result<T, SessionError>) {
        match result {
            Err(SessionError::Unauthorized) => {
                self.flush();
                self.auth.handle_unauthorized();
                println!("! {}", SessionError::Unauthorized);
                self.signed_out().await;
            }
            Err(e) => println!("! {e}"),
            Ok(_) => {}
        }
    }

    /// Returns `false` when the user asked to quit.
    async fn handle(&mut self, input: Input) -> bool {
        let needs_auth = matches!(
            input,
            Input::Say(_) | Input::Toggle(_) | Input::Remove(_) | Input::Compare | Input::Show | Input::History
        );
        if needs_auth && !self.auth.is_authenticated() {
            println!("! please sign in first: /login <email> <password>");
            return true;
        }

        match input {
            Input::Empty => {}
            Input::Quit => return false,
            Input::Help => println!("{HELP}"),
            Input::Invalid(reason) => println!("! {reason}"),
            Input::Say(text) => {
                let result = self.session.submit_user_message(&text).await;
                self.handle_session_result(result).await;
                if !self.session.snapshot().recommendations.is_empty() {
                    println!("{}", view::render_recommendations(&self.session.snapshot()));
                }
            }
            Input::Login { email, password } => match self.auth.login(&email, &password).await {
                Ok(user) => {
                    println!("Signed in as {}", user.display_name());
                    self.session.initialize(true).await;
                    self.status();
                }
                Err(e) => println!("! {}", describe_auth_error(&e)),
            },
            Input::Register { email, password, full_name } => {
                match self.auth.register(&email, &password, &full_name).await {
                    Ok(_) => println!("Account created. Sign in with /login {email} <password>"),
                    Err(e) => println!("! {}", describe_auth_error(&e)),
                }
            }
            Input::Logout => {
                self.auth.logout();
                self.signed_out().await;
            }
            Input::Toggle(id) => match self.session.toggle_comparison_member(id) {
                Ok(Toggle::Added) => println!("Added #{id} to comparison"),
                Ok(Toggle::Removed) => println!("Removed #{id} from comparison"),
                Err(e) => println!("! {e}"),
            },
            Input::Remove(id) => {
                if !self.session.remove_comparison_member(id) {
                    println!("#{id} was not selected");
                }
            }
            Input::Compare => {
                let result = self.session.compare_selected().await;
                self.handle_session_result(result).await;
            }
            Input::Show => {
                if self.session.show_comparison() {
                    println!("{}", view::render_comparison(&self.session.snapshot().selected_phones()));
                } else {
                    println!("! no phones selected for comparison");
                }
            }
            Input::Hide => self.session.hide_comparison(),
            Input::Recommendations => println!("{}", view::render_recommendations(&self.session.snapshot())),
            Input::History => match self.api.list_conversations().await {
                Ok(list) => println!("{}", view::render_conversation_list(&list)),
                Err(ApiError::Unauthorized) => self.handle_session_result::<()>(Err(SessionError::Unauthorized)).await,
                Err(e) => println!("! {}", describe_api_error(&e)),
            },
        }
        self.flush();
        true
    }
}

async fn run_chat(api: Arc<ApiClient>, tokens: TokenStore) -> Result<(), ShellError> {
    let mut shell = Shell {
        auth: AuthService::new(Arc::clone(&api), tokens),
        session: SessionController::new(Arc::clone(&api), api.base_url()),
        api,
        last_printed: 0,
        last_reveal: 0,
    };
    shell.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !shell.handle(parse_input(&line)).await {
            break;
        }
    }
    Ok(())
}

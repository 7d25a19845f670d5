//! Command-line surface: argument definitions and the handler for each
//! command.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use booktrack_core::state::{sign_in, sign_out, sign_up};
use booktrack_core::{ApiClient, Book, BookFields, BookFilters, BookList, Config, ProfileView};

#[derive(Debug, Parser)]
#[command(name = "booktrack", version, about = "Track the books you read")]
pub struct Cli {
    /// Also write logs to a daily file in the cache directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login {
        /// Defaults to the last username used
        username: Option<String>,
    },
    /// Create an account
    Register { username: String, email: String },
    /// Forget the stored session
    Logout,
    /// Show the API endpoint and whether a session is stored
    Status,
    /// Show the logged-in user's profile
    Profile,
    /// Manage books
    #[command(subcommand)]
    Books(BooksCommand),
}

#[derive(Debug, Subcommand)]
pub enum BooksCommand {
    /// List books, optionally filtered (e.g. --filter genre=Fantasy)
    List {
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Show one book
    Get { id: String },
    /// Add a book
    Add(NewBookArgs),
    /// Change a book; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: EditBookArgs,
    },
    /// Delete a book
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct NewBookArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    genre: String,
    #[arg(long)]
    description: String,
}

#[derive(Debug, Args)]
pub struct EditBookArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

impl EditBookArgs {
    fn apply_to(self, mut fields: BookFields) -> BookFields {
        if let Some(title) = self.title {
            fields.title = title;
        }
        if let Some(author) = self.author {
            fields.author = author;
        }
        if let Some(genre) = self.genre {
            fields.genre = genre;
        }
        if let Some(description) = self.description {
            fields.description = description;
        }
        fields
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn build_client(config: &Config) -> Result<ApiClient> {
    let session = Arc::new(config.open_session()?);
    let base_url = config.api_base_url();
    debug!(base_url = %base_url, "Using API");
    ApiClient::with_base_url(&base_url, session)
}

pub async fn run(command: Command, config: &mut Config) -> Result<()> {
    let client = build_client(config)?;

    match command {
        Command::Login { username } => login(&client, config, username).await,
        Command::Register { username, email } => {
            let password = rpassword::prompt_password("Password: ")
                .context("Failed to read password")?;
            let registration = sign_up(&client, &username, &password, &email).await?;
            match registration.message {
                Some(message) => println!("{}", message),
                None => println!("Registration successful. Please log in."),
            }
            Ok(())
        }
        Command::Logout => {
            sign_out(client.session());
            println!("Logged out.");
            Ok(())
        }
        Command::Status => {
            println!("API:     {}", client.base_url());
            let state = if client.session().is_logged_in() {
                "logged in"
            } else {
                "logged out"
            };
            println!("Session: {}", state);
            Ok(())
        }
        Command::Profile => show_profile(&client).await,
        Command::Books(books) => run_books(&client, books).await,
    }
}

async fn login(client: &ApiClient, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    sign_in(client, &username, &password).await?;

    config.last_username = Some(username.clone());
    config.save()?;
    println!("Logged in as {}.", username);
    Ok(())
}

async fn show_profile(client: &ApiClient) -> Result<()> {
    let mut view = ProfileView::new();
    view.load(client).await?;
    match view.user() {
        Some(user) => {
            println!("Username: {}", user.username);
            println!("Email:    {}", user.email);
            if let Some(created) = user.created_at {
                println!("Joined:   {}", created.format("%Y-%m-%d"));
            }
        }
        None => println!("No user data available. Log in first."),
    }
    Ok(())
}

async fn run_books(client: &ApiClient, command: BooksCommand) -> Result<()> {
    let mut list = BookList::new();

    match command {
        BooksCommand::List { filters } => {
            let filters: BookFilters = filters.into_iter().collect();
            list.refresh(client, Some(&filters)).await?;
            if list.is_empty() {
                println!("No books yet.");
            }
            for book in list.books() {
                print_book(book);
            }
        }
        BooksCommand::Get { id } => {
            let book = client.get_book(&id).await?;
            print_book(&book);
        }
        BooksCommand::Add(args) => {
            let fields = BookFields::new(args.title, args.author, args.genre, args.description);
            let book = list.submit(client, None, &fields).await?;
            println!("Book added.");
            print_book(&book);
        }
        BooksCommand::Update { id, fields } => {
            let current = client.get_book(&id).await?;
            let fields = fields.apply_to(BookFields::from(&current));
            let book = list.submit(client, Some(&id), &fields).await?;
            println!("Book updated.");
            print_book(&book);
        }
        BooksCommand::Delete { id } => {
            list.delete(client, &id).await?;
            println!("Book deleted.");
        }
    }
    Ok(())
}

fn print_book(book: &Book) {
    println!("{}  [{}]", book.title, book.id);
    println!("  by {} · {}", book.author, book.genre);
    if !book.description.is_empty() {
        println!("  {}", book.description);
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}
